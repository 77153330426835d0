//! Lamport movement and PDA account lifecycle

#![allow(deprecated)] // system_instruction deprecation - will migrate when solana_system_interface is stable

use solana_program::{
    account_info::AccountInfo,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

/// Creates a rent-exempt account of `space` bytes at a PDA, owned by `program_id`.
///
/// Addresses that already hold lamports (someone transferred to the PDA before the
/// deposit) cannot go through `create_account`, so they are topped up, allocated and
/// assigned instead. Returns the account's lamports after creation.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    target: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    program_id: &Pubkey,
    space: usize,
    signer_seeds: &[&[u8]],
) -> Result<u64, ProgramError> {
    let rent = Rent::get()?;
    let required = rent.minimum_balance(space);
    let current = target.lamports();

    if current == 0 {
        invoke_signed(
            &system_instruction::create_account(
                payer.key,
                target.key,
                required,
                space as u64,
                program_id,
            ),
            &[payer.clone(), target.clone(), system_program.clone()],
            &[signer_seeds],
        )?;
    } else {
        let top_up = required.saturating_sub(current);
        if top_up > 0 {
            invoke(
                &system_instruction::transfer(payer.key, target.key, top_up),
                &[payer.clone(), target.clone(), system_program.clone()],
            )?;
        }
        invoke_signed(
            &system_instruction::allocate(target.key, space as u64),
            &[target.clone(), system_program.clone()],
            &[signer_seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(target.key, program_id),
            &[target.clone(), system_program.clone()],
            &[signer_seeds],
        )?;
    }

    Ok(target.lamports())
}

/// Moves lamports out of a program-owned account.
pub fn transfer_lamports(
    from: &AccountInfo,
    to: &AccountInfo,
    amount: u64,
) -> Result<(), ProgramError> {
    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(ProgramError::InsufficientFunds)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(ProgramError::ArithmeticOverflow)?;

    **from.try_borrow_mut_lamports()? = from_balance;
    **to.try_borrow_mut_lamports()? = to_balance;
    Ok(())
}

/// Drains `account` into `destination` and hands it back to the system program
/// with no data. Returns the lamports moved.
pub fn close_account(account: &AccountInfo, destination: &AccountInfo) -> Result<u64, ProgramError> {
    let lamports = account.lamports();
    transfer_lamports(account, destination, lamports)?;

    {
        let mut data = account.try_borrow_mut_data()?;
        data.fill(0);
    }
    account.realloc(0, false)?;
    account.assign(&system_program::id());
    Ok(lamports)
}
