//! Error types

use solana_program::program_error::ProgramError;
use thiserror::Error;

/// Program error codes. Discriminants are stable: they are the `Custom` codes
/// clients see in failed transactions.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Signer does not match the sender recorded for this escrow")]
    Unauthorized,

    #[error("Escrow already funded")]
    AlreadyFunded,

    #[error("Escrow is not funded")]
    NotFunded,

    #[error("Escrow is not settled")]
    NotSettled,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Amount does not match the escrowed amount")]
    AmountMismatch,

    #[error("Derived address does not match the supplied account")]
    AddressMismatch,

    #[error("No bump produces a valid derived address")]
    DerivationExhausted,

    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Invalid account owner")]
    InvalidAccountOwner,

    #[error("Invalid receiver")]
    InvalidReceiver,

    #[error("Escrow wallet balance is below the escrowed amount")]
    WalletUnderfunded,
}

/// Coarse grouping of [`EscrowError`] codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    InvalidState,
    InvalidAmount,
    AddressMismatch,
    DerivationExhausted,
    InvalidInput,
}

impl EscrowError {
    pub fn kind(self) -> ErrorKind {
        match self {
            EscrowError::Unauthorized => ErrorKind::Unauthorized,
            EscrowError::AlreadyFunded
            | EscrowError::NotFunded
            | EscrowError::NotSettled
            | EscrowError::WalletUnderfunded => ErrorKind::InvalidState,
            EscrowError::InvalidAmount | EscrowError::AmountMismatch => ErrorKind::InvalidAmount,
            EscrowError::AddressMismatch => ErrorKind::AddressMismatch,
            EscrowError::DerivationExhausted => ErrorKind::DerivationExhausted,
            EscrowError::InvalidInstructionData
            | EscrowError::InvalidAccountOwner
            | EscrowError::InvalidReceiver => ErrorKind::InvalidInput,
        }
    }

    /// Maps a `Custom` program error code back to the escrow error it encodes.
    pub fn from_code(code: u32) -> Option<Self> {
        use EscrowError::*;
        const ALL: [EscrowError; 12] = [
            Unauthorized,
            AlreadyFunded,
            NotFunded,
            NotSettled,
            InvalidAmount,
            AmountMismatch,
            AddressMismatch,
            DerivationExhausted,
            InvalidInstructionData,
            InvalidAccountOwner,
            InvalidReceiver,
            WalletUnderfunded,
        ];
        ALL.iter().copied().find(|e| *e as u32 == code)
    }
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
