#![allow(dead_code)]
#![allow(deprecated)]

use borsh::BorshDeserialize;
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::system_instruction;
use solana_sdk::{
    clock::Clock,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    sysvar,
    transaction::{Transaction, TransactionError},
};

use wu_pay_escrow::{
    pda::{escrow_addresses, nonce_from_unix_timestamp, EscrowAddresses},
    state::{EscrowState, EscrowWallet},
    EscrowError,
};

// ============================================================================
// TEST PROGRAM ID
// ============================================================================

/// Fixed program ID for testing. Actual deployed program ID is determined by
/// the deployment keypair, not this value.
pub fn test_program_id() -> Pubkey {
    solana_sdk::pubkey!("WuPay11111111111111111111111111111111111111")
}

/// Balances used by the end-to-end scenarios.
pub const SENDER_AIRDROP: u64 = 5_000_000_000;
pub const RECEIVER_AIRDROP: u64 = 1_000_000_000;
pub const GRANT_AMOUNT: u64 = 20_000_000;

// ============================================================================
// TEST HARNESS HELPERS
// ============================================================================

/// Helper: Build a ProgramTest instance with the escrow program
pub fn program_test() -> ProgramTest {
    ProgramTest::new(
        "wu_pay_escrow",
        test_program_id(),
        processor!(wu_pay_escrow::processor::Processor::process),
    )
}

/// Helper: Send a transaction paid by the context payer, returning the result.
///
/// The payer covers fees so that balance assertions on the other signers only
/// see the program's effects. A fresh blockhash keeps repeated instructions
/// from being deduplicated as already processed.
pub async fn try_send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let payer = context.payer.insecure_clone();
    let blockhash = context.get_new_latest_blockhash().await.unwrap();
    let mut all_signers = Vec::with_capacity(signers.len() + 1);
    all_signers.push(&payer);
    for signer in signers {
        if signer.pubkey() != payer.pubkey() {
            all_signers.push(*signer);
        }
    }

    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &all_signers,
        blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

/// Helper: Send a transaction that must succeed
pub async fn send_tx(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) {
    try_send(context, instructions, signers).await.unwrap();
}

/// Helper: Create a fresh keypair funded from the context payer
pub async fn create_user(context: &mut ProgramTestContext, lamports: u64) -> Keypair {
    let user = Keypair::new();
    let payer_pubkey = context.payer.pubkey();
    let fund_ix = system_instruction::transfer(&payer_pubkey, &user.pubkey(), lamports);
    send_tx(context, &[fund_ix], &[]).await;
    user
}

/// Helper: Read an account's lamports (0 when the account does not exist)
pub async fn get_balance(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    context.banks_client.get_balance(address).await.unwrap()
}

/// Helper: Rent reservation the program charges for both escrow accounts
pub async fn reservations(context: &mut ProgramTestContext) -> (u64, u64) {
    let rent = context.banks_client.get_rent().await.unwrap();
    (
        rent.minimum_balance(EscrowState::LEN),
        rent.minimum_balance(EscrowWallet::LEN),
    )
}

/// Helper: Nonce derived from the cluster clock, like a client opening an escrow now
pub async fn clock_nonce(context: &mut ProgramTestContext) -> u64 {
    let clock_account = context
        .banks_client
        .get_account(sysvar::clock::id())
        .await
        .unwrap()
        .unwrap();
    let clock: Clock = bincode::deserialize(&clock_account.data).unwrap();
    nonce_from_unix_timestamp(clock.unix_timestamp)
}

/// Helper: Random nonce for tests that open several escrows
pub fn random_nonce() -> u64 {
    use rand::Rng;
    rand::thread_rng().gen()
}

/// Helper: Read the escrow state, if the account exists
pub async fn read_state(context: &mut ProgramTestContext, address: Pubkey) -> Option<EscrowState> {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .map(|account| EscrowState::try_from_slice(&account.data).unwrap())
}

/// Helper: Check whether an account exists
pub async fn account_exists(context: &mut ProgramTestContext, address: Pubkey) -> bool {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .is_some()
}

// ============================================================================
// TEST ENVIRONMENT
// ============================================================================

/// Test environment with a funded sender/receiver pair and one escrow nonce
pub struct TestEnv {
    pub program_id: Pubkey,
    pub sender: Keypair,
    pub receiver: Keypair,
    pub nonce: u64,
    pub pda: EscrowAddresses,
}

/// Helper: Create a baseline environment used by most tests
pub async fn setup_basic_env(context: &mut ProgramTestContext) -> TestEnv {
    let program_id = test_program_id();
    let sender = create_user(context, SENDER_AIRDROP).await;
    let receiver = create_user(context, RECEIVER_AIRDROP).await;
    let nonce = clock_nonce(context).await;
    let pda = escrow_addresses(&program_id, &sender.pubkey(), &receiver.pubkey(), nonce).unwrap();

    TestEnv {
        program_id,
        sender,
        receiver,
        nonce,
        pda,
    }
}

impl TestEnv {
    pub fn deposit_ix(&self, amount: u64) -> Instruction {
        wu_pay_escrow::instruction::deposit_grant(
            &self.program_id,
            &self.sender.pubkey(),
            &self.receiver.pubkey(),
            self.nonce,
            amount,
        )
        .unwrap()
    }

    pub fn complete_ix(&self, amount: u64) -> Instruction {
        wu_pay_escrow::instruction::complete_grant(
            &self.program_id,
            &self.sender.pubkey(),
            &self.receiver.pubkey(),
            self.nonce,
            amount,
        )
        .unwrap()
    }

    pub fn withdraw_ix(&self, amount: u64) -> Instruction {
        wu_pay_escrow::instruction::withdraw_grant(
            &self.program_id,
            &self.sender.pubkey(),
            &self.receiver.pubkey(),
            self.nonce,
            amount,
        )
        .unwrap()
    }

    pub fn close_ix(&self) -> Instruction {
        wu_pay_escrow::instruction::close_escrow(
            &self.program_id,
            &self.sender.pubkey(),
            &self.receiver.pubkey(),
            self.nonce,
        )
        .unwrap()
    }

    /// Helper: Deposit `amount` and assert success
    pub async fn deposit(&self, context: &mut ProgramTestContext, amount: u64) {
        send_tx(context, &[self.deposit_ix(amount)], &[&self.sender]).await;
    }
}

// ============================================================================
// ERROR CHECKING HELPERS
// ============================================================================

/// Helper: Assert that a transaction failed with the given escrow error code
pub fn assert_escrow_error(result: Result<(), BanksClientError>, expected: EscrowError) {
    let err = result.expect_err("transaction should have failed");
    match err.unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            assert_eq!(
                EscrowError::from_code(code),
                Some(expected),
                "unexpected custom error code {}",
                code
            );
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}
