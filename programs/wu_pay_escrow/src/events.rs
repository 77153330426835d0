//! Event definitions for the escrow program.
//!
//! Events are emitted via solana_program::msg! and can be parsed from transaction logs.

use solana_program::{msg, pubkey::Pubkey};

use crate::state::{EscrowState, Settlement};

/// Emitted when a grant is deposited into a fresh escrow.
pub fn emit_deposited(state: &EscrowState, wallet: &Pubkey, reserve: u64) {
    msg!(
        "EscrowDeposited: sender={}, receiver={}, nonce={}, amount={}, wallet={}, reserve={}",
        state.sender,
        state.receiver,
        state.nonce,
        state.amount,
        wallet,
        reserve
    );
}

/// Emitted when the escrowed lamports leave the wallet.
pub fn emit_settled(state: &EscrowState, settlement: Settlement, destination: &Pubkey, paid: u64) {
    let name = match settlement {
        Settlement::Complete => "EscrowCompleted",
        Settlement::Withdraw => "EscrowWithdrawn",
    };
    msg!(
        "{}: sender={}, receiver={}, nonce={}, destination={}, paid={}",
        name,
        state.sender,
        state.receiver,
        state.nonce,
        destination,
        paid
    );
}

/// Emitted when both escrow accounts are removed.
pub fn emit_closed(state: &EscrowState, refunded: u64) {
    msg!(
        "EscrowClosed: sender={}, receiver={}, nonce={}, status={:?}, refunded={}",
        state.sender,
        state.receiver,
        state.nonce,
        state.status,
        refunded
    );
}
