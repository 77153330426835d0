//! Wu Pay Escrow Program (Native Solana)
//!
//! A sender locks lamports in a program-derived wallet for a named receiver. The
//! grant is later either completed (funds go to the receiver) or withdrawn (funds go
//! back to the sender), after which both escrow accounts can be closed.

pub mod error;
pub mod events;
pub mod instruction;
pub mod pda;
pub mod processor;
pub mod state;
pub mod wallet;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use solana_program;

// Re-export for tests
pub use error::{ErrorKind, EscrowError};
pub use instruction::EscrowInstruction;
pub use pda::{AddressScheme, EscrowAddresses, ProgramDerived};
pub use state::{EscrowState, EscrowStatus, EscrowWallet};
