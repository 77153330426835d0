//! Deterministic escrow addresses
//!
//! Every escrow instance owns two program-derived addresses, one for its state
//! record and one for its wallet. Both are salted with the same
//! `(sender, receiver, nonce)` triple so they always belong to the same escrow.
//!
//! The hash-and-check step is behind [`AddressScheme`] so the bump search and the
//! bump verification do not depend on one platform's key space. [`ProgramDerived`]
//! applies the Solana runtime rules (sha256 + off-curve check) and is what the
//! program uses on-chain.

use solana_program::{hash::hashv, pubkey::Pubkey};

use crate::{error::EscrowError, state::seeds};

/// Domain marker appended to every derivation hash.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Turns a full seed list (bump included) into an address.
pub trait AddressScheme {
    /// Returns `None` when the candidate could be controlled by an external key.
    fn create_address(&self, seeds: &[&[u8]], program_id: &Pubkey) -> Option<Pubkey>;
}

/// Solana program-derived addresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgramDerived;

impl AddressScheme for ProgramDerived {
    fn create_address(&self, seeds: &[&[u8]], program_id: &Pubkey) -> Option<Pubkey> {
        Pubkey::create_program_address(seeds, program_id).ok()
    }
}

/// sha256 keyed derivation with a caller-supplied validity predicate.
///
/// The candidate is `sha256(seeds.. || program_id || PDA_MARKER)`, the same hash the
/// Solana runtime uses; `accepts` decides whether the candidate is outside the
/// externally-ownable key space of the target platform.
pub struct HashedAddress<F> {
    accepts: F,
}

impl<F> HashedAddress<F>
where
    F: Fn(&Pubkey) -> bool,
{
    pub fn new(accepts: F) -> Self {
        Self { accepts }
    }
}

impl<F> AddressScheme for HashedAddress<F>
where
    F: Fn(&Pubkey) -> bool,
{
    fn create_address(&self, seeds: &[&[u8]], program_id: &Pubkey) -> Option<Pubkey> {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 2);
        parts.extend_from_slice(seeds);
        parts.push(program_id.as_ref());
        parts.push(PDA_MARKER);
        let candidate = Pubkey::new_from_array(hashv(&parts).to_bytes());
        if (self.accepts)(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }
}

/// Searches bumps from 255 down and returns the first accepted address.
pub fn derive<S: AddressScheme + ?Sized>(
    scheme: &S,
    label: &[u8],
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), EscrowError> {
    let nonce_bytes = nonce.to_le_bytes();
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let seeds: [&[u8]; 5] = [
            label,
            sender.as_ref(),
            receiver.as_ref(),
            &nonce_bytes,
            &bump_seed,
        ];
        if let Some(address) = scheme.create_address(&seeds, program_id) {
            return Ok((address, bump));
        }
    }
    Err(EscrowError::DerivationExhausted)
}

/// Re-derives with a known bump and checks the result against `expected`.
#[allow(clippy::too_many_arguments)]
pub fn verify<S: AddressScheme + ?Sized>(
    scheme: &S,
    label: &[u8],
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
    bump: u8,
    program_id: &Pubkey,
    expected: &Pubkey,
) -> Result<(), EscrowError> {
    let nonce_bytes = nonce.to_le_bytes();
    let bump_seed = [bump];
    let seeds: [&[u8]; 5] = [
        label,
        sender.as_ref(),
        receiver.as_ref(),
        &nonce_bytes,
        &bump_seed,
    ];
    match scheme.create_address(&seeds, program_id) {
        Some(address) if address == *expected => Ok(()),
        _ => Err(EscrowError::AddressMismatch),
    }
}

/// Both addresses of one escrow instance together with their canonical bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowAddresses {
    pub state: Pubkey,
    pub state_bump: u8,
    pub wallet: Pubkey,
    pub wallet_bump: u8,
}

/// Client entry point: the state and wallet addresses for `(sender, receiver, nonce)`.
pub fn escrow_addresses(
    program_id: &Pubkey,
    sender: &Pubkey,
    receiver: &Pubkey,
    nonce: u64,
) -> Result<EscrowAddresses, EscrowError> {
    let (state, state_bump) = derive(
        &ProgramDerived,
        seeds::STATE_SEED,
        sender,
        receiver,
        nonce,
        program_id,
    )?;
    let (wallet, wallet_bump) = derive(
        &ProgramDerived,
        seeds::WALLET_SEED,
        sender,
        receiver,
        nonce,
        program_id,
    )?;
    Ok(EscrowAddresses {
        state,
        state_bump,
        wallet,
        wallet_bump,
    })
}

/// Nonce for an escrow opened at `unix_timestamp` (seconds). Pre-epoch clocks map to 0.
pub fn nonce_from_unix_timestamp(unix_timestamp: i64) -> u64 {
    u64::try_from(unix_timestamp).unwrap_or(0)
}
