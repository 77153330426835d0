//! Instruction definitions

#![allow(deprecated)] // system_program id - will migrate when solana_system_interface is stable

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::pda::{escrow_addresses, EscrowAddresses};

/// Every variant takes the same five accounts:
///
/// 0. `[writable, signer]` Sender
/// 1. `[]` Receiver (`[writable]` for `CompleteGrant`)
/// 2. `[writable]` Escrow state (PDA)
/// 3. `[writable]` Escrow wallet (PDA)
/// 4. `[]` System program
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Create the escrow accounts and lock `amount` lamports in the wallet
    DepositGrant {
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
        amount: u64,
    },

    /// Release the escrowed lamports to the receiver
    CompleteGrant {
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
        amount: u64,
    },

    /// Return the escrowed lamports to the sender
    WithdrawGrant {
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
        amount: u64,
    },

    /// Remove both escrow accounts once settled, refunding their rent to the sender
    CloseEscrow {
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
    },
}

/// Wraps `data` with the account list for the given escrow addresses.
pub fn build(
    program_id: &Pubkey,
    sender: &Pubkey,
    receiver: &Pubkey,
    addresses: &EscrowAddresses,
    data: &EscrowInstruction,
) -> Result<Instruction, ProgramError> {
    let receiver_meta = match data {
        EscrowInstruction::CompleteGrant { .. } => AccountMeta::new(*receiver, false),
        EscrowInstruction::DepositGrant { .. }
        | EscrowInstruction::WithdrawGrant { .. }
        | EscrowInstruction::CloseEscrow { .. } => AccountMeta::new_readonly(*receiver, false),
    };

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*sender, true),
            receiver_meta,
            AccountMeta::new(addresses.state, false),
            AccountMeta::new(addresses.wallet, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: data.try_to_vec()?,
    })
}

/// Build a `DepositGrant` instruction for `(sender, receiver, nonce)`.
pub fn deposit_grant(
    program_id: &Pubkey,
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = escrow_addresses(program_id, sender, receiver, nonce)?;
    build(
        program_id,
        sender,
        receiver,
        &addresses,
        &EscrowInstruction::DepositGrant {
            nonce,
            state_bump: addresses.state_bump,
            wallet_bump: addresses.wallet_bump,
            amount,
        },
    )
}

/// Build a `CompleteGrant` instruction for `(sender, receiver, nonce)`.
pub fn complete_grant(
    program_id: &Pubkey,
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = escrow_addresses(program_id, sender, receiver, nonce)?;
    build(
        program_id,
        sender,
        receiver,
        &addresses,
        &EscrowInstruction::CompleteGrant {
            nonce,
            state_bump: addresses.state_bump,
            wallet_bump: addresses.wallet_bump,
            amount,
        },
    )
}

/// Build a `WithdrawGrant` instruction for `(sender, receiver, nonce)`.
pub fn withdraw_grant(
    program_id: &Pubkey,
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = escrow_addresses(program_id, sender, receiver, nonce)?;
    build(
        program_id,
        sender,
        receiver,
        &addresses,
        &EscrowInstruction::WithdrawGrant {
            nonce,
            state_bump: addresses.state_bump,
            wallet_bump: addresses.wallet_bump,
            amount,
        },
    )
}

/// Build a `CloseEscrow` instruction for `(sender, receiver, nonce)`.
pub fn close_escrow(
    program_id: &Pubkey,
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = escrow_addresses(program_id, sender, receiver, nonce)?;
    build(
        program_id,
        sender,
        receiver,
        &addresses,
        &EscrowInstruction::CloseEscrow {
            nonce,
            state_bump: addresses.state_bump,
            wallet_bump: addresses.wallet_bump,
        },
    )
}
