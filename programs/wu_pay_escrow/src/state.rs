//! Account state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::EscrowError;

/// Lifecycle of one escrow instance.
///
/// Uninitialized -> Funded -> Completed | Refunded. Closing removes the account, so
/// there is no closed variant.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowStatus {
    Uninitialized,
    Funded,
    Completed,
    Refunded,
}

/// Terminal fork out of `Funded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Receiver gets the funds.
    Complete,
    /// Sender takes the funds back.
    Withdraw,
}

impl Settlement {
    fn status(self) -> EscrowStatus {
        match self {
            Settlement::Complete => EscrowStatus::Completed,
            Settlement::Withdraw => EscrowStatus::Refunded,
        }
    }
}

/// Durable record of one escrow instance, stored at the `escrow_state` PDA.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EscrowState {
    /// Discriminator for account type
    pub discriminator: [u8; 8],
    /// Funds the escrow and authorizes every later instruction
    pub sender: Pubkey,
    /// Gets the funds when the grant is completed
    pub receiver: Pubkey,
    /// Distinguishes concurrent escrows between the same pair
    pub nonce: u64,
    /// Amount committed at deposit
    pub amount: u64,
    pub status: EscrowStatus,
    /// Bump of the state PDA
    pub state_bump: u8,
    /// Bump of the wallet PDA
    pub wallet_bump: u8,
}

impl EscrowState {
    pub const DISCRIMINATOR: [u8; 8] = [0x57, 0x55, 0x53, 0x54, 0x41, 0x54, 0x45, 0x30]; // "WUSTATE0"
    pub const LEN: usize = 8 + 32 + 32 + 8 + 8 + 1 + 1 + 1; // 91 bytes

    pub fn new(sender: Pubkey, receiver: Pubkey, nonce: u64, state_bump: u8, wallet_bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            sender,
            receiver,
            nonce,
            amount: 0,
            status: EscrowStatus::Uninitialized,
            state_bump,
            wallet_bump,
        }
    }

    /// Uninitialized -> Funded.
    pub fn fund(&mut self, amount: u64) -> Result<(), EscrowError> {
        if amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        match self.status {
            EscrowStatus::Uninitialized => {
                self.amount = amount;
                self.status = EscrowStatus::Funded;
                Ok(())
            }
            EscrowStatus::Funded | EscrowStatus::Completed | EscrowStatus::Refunded => {
                Err(EscrowError::AlreadyFunded)
            }
        }
    }

    /// Funded -> Completed | Refunded. `amount` must repeat the committed amount.
    pub fn settle(&mut self, settlement: Settlement, amount: u64) -> Result<(), EscrowError> {
        match self.status {
            EscrowStatus::Funded => {}
            EscrowStatus::Uninitialized | EscrowStatus::Completed | EscrowStatus::Refunded => {
                return Err(EscrowError::NotFunded)
            }
        }
        if amount != self.amount {
            return Err(EscrowError::AmountMismatch);
        }
        self.status = settlement.status();
        Ok(())
    }

    /// Close is only allowed once the custodied funds have left the wallet.
    pub fn ensure_closable(&self) -> Result<(), EscrowError> {
        match self.status {
            EscrowStatus::Completed | EscrowStatus::Refunded => Ok(()),
            EscrowStatus::Uninitialized | EscrowStatus::Funded => Err(EscrowError::NotSettled),
        }
    }

    /// Checks that `sender` and `receiver` are the participants recorded at deposit.
    pub fn ensure_participants(&self, sender: &Pubkey, receiver: &Pubkey) -> Result<(), EscrowError> {
        if self.sender != *sender || self.receiver != *receiver {
            return Err(EscrowError::Unauthorized);
        }
        Ok(())
    }

    /// Supplied bumps must be the ones recorded at deposit.
    pub fn ensure_bumps(&self, state_bump: u8, wallet_bump: u8) -> Result<(), EscrowError> {
        if self.state_bump != state_bump || self.wallet_bump != wallet_bump {
            return Err(EscrowError::AddressMismatch);
        }
        Ok(())
    }
}

/// Record stored at the `escrow_wallet` PDA. The custodied value is the account's
/// lamports above `reserve`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EscrowWallet {
    /// Discriminator for account type
    pub discriminator: [u8; 8],
    /// Lamports held to keep the account alive, returned to the sender on close
    pub reserve: u64,
}

impl EscrowWallet {
    pub const DISCRIMINATOR: [u8; 8] = [0x57, 0x55, 0x57, 0x41, 0x4c, 0x4c, 0x45, 0x54]; // "WUWALLET"
    pub const LEN: usize = 8 + 8; // discriminator + reserve

    pub fn new(reserve: u64) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            reserve,
        }
    }

    /// Lamports held on behalf of the participants.
    pub fn custodied(&self, lamports: u64) -> Result<u64, EscrowError> {
        lamports
            .checked_sub(self.reserve)
            .ok_or(EscrowError::WalletUnderfunded)
    }
}

/// Seeds for PDA derivation
pub mod seeds {
    pub const STATE_SEED: &[u8] = b"escrow_state";
    pub const WALLET_SEED: &[u8] = b"escrow_wallet";
}
