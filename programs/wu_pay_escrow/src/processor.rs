//! Instruction processing

#![allow(deprecated)] // system_instruction deprecation - will migrate when solana_system_interface is stable

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction, system_program,
};

use crate::{
    error::EscrowError,
    events,
    instruction::EscrowInstruction,
    pda::{self, ProgramDerived},
    state::{seeds, EscrowState, EscrowWallet, Settlement},
    wallet,
};

/// The five accounts every escrow instruction takes, in order.
struct EscrowAccounts<'a, 'b> {
    sender: &'a AccountInfo<'b>,
    receiver: &'a AccountInfo<'b>,
    state: &'a AccountInfo<'b>,
    wallet: &'a AccountInfo<'b>,
    system_program: &'a AccountInfo<'b>,
}

impl<'a, 'b> EscrowAccounts<'a, 'b> {
    fn parse(accounts: &'a [AccountInfo<'b>]) -> Result<Self, ProgramError> {
        let account_info_iter = &mut accounts.iter();
        let parsed = Self {
            sender: next_account_info(account_info_iter)?,
            receiver: next_account_info(account_info_iter)?,
            state: next_account_info(account_info_iter)?,
            wallet: next_account_info(account_info_iter)?,
            system_program: next_account_info(account_info_iter)?,
        };

        // Every instruction is authorized by the sender's signature.
        if !parsed.sender.is_signer {
            return Err(EscrowError::Unauthorized.into());
        }
        if *parsed.system_program.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(parsed)
    }
}

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = EscrowInstruction::try_from_slice(instruction_data)
            .map_err(|_| EscrowError::InvalidInstructionData)?;

        match instruction {
            EscrowInstruction::DepositGrant {
                nonce,
                state_bump,
                wallet_bump,
                amount,
            } => {
                msg!("Instruction: DepositGrant - nonce={}", nonce);
                Self::process_deposit(program_id, accounts, nonce, state_bump, wallet_bump, amount)
            }
            EscrowInstruction::CompleteGrant {
                nonce,
                state_bump,
                wallet_bump,
                amount,
            } => {
                msg!("Instruction: CompleteGrant - nonce={}", nonce);
                Self::process_settle(
                    program_id,
                    accounts,
                    Settlement::Complete,
                    nonce,
                    state_bump,
                    wallet_bump,
                    amount,
                )
            }
            EscrowInstruction::WithdrawGrant {
                nonce,
                state_bump,
                wallet_bump,
                amount,
            } => {
                msg!("Instruction: WithdrawGrant - nonce={}", nonce);
                Self::process_settle(
                    program_id,
                    accounts,
                    Settlement::Withdraw,
                    nonce,
                    state_bump,
                    wallet_bump,
                    amount,
                )
            }
            EscrowInstruction::CloseEscrow {
                nonce,
                state_bump,
                wallet_bump,
            } => {
                msg!("Instruction: CloseEscrow - nonce={}", nonce);
                Self::process_close(program_id, accounts, nonce, state_bump, wallet_bump)
            }
        }
    }

    fn process_deposit(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
        amount: u64,
    ) -> ProgramResult {
        let accounts = EscrowAccounts::parse(accounts)?;

        // Validate inputs
        if amount == 0 {
            return Err(EscrowError::InvalidAmount.into());
        }
        if *accounts.receiver.key == Pubkey::default() {
            return Err(EscrowError::InvalidReceiver.into());
        }

        // Only the canonical bumps are accepted, so each triple maps to one escrow.
        let (state_pda, canonical_state_bump) = pda::derive(
            &ProgramDerived,
            seeds::STATE_SEED,
            accounts.sender.key,
            accounts.receiver.key,
            nonce,
            program_id,
        )?;
        if state_pda != *accounts.state.key || canonical_state_bump != state_bump {
            return Err(EscrowError::AddressMismatch.into());
        }
        let (wallet_pda, canonical_wallet_bump) = pda::derive(
            &ProgramDerived,
            seeds::WALLET_SEED,
            accounts.sender.key,
            accounts.receiver.key,
            nonce,
            program_id,
        )?;
        if wallet_pda != *accounts.wallet.key || canonical_wallet_bump != wallet_bump {
            return Err(EscrowError::AddressMismatch.into());
        }

        let existing_state = load_state(accounts.state, program_id)?;
        let mut state = match &existing_state {
            Some(state) => {
                state.ensure_participants(accounts.sender.key, accounts.receiver.key)?;
                state.clone()
            }
            None => EscrowState::new(
                *accounts.sender.key,
                *accounts.receiver.key,
                nonce,
                state_bump,
                wallet_bump,
            ),
        };
        state.fund(amount)?;

        let existing_wallet = load_wallet(accounts.wallet, program_id)?;
        if let Some(existing) = &existing_wallet {
            if existing.custodied(accounts.wallet.lamports())? > 0 {
                return Err(EscrowError::AlreadyFunded.into());
            }
        }

        let nonce_bytes = nonce.to_le_bytes();
        if existing_state.is_none() {
            wallet::create_pda_account(
                accounts.sender,
                accounts.state,
                accounts.system_program,
                program_id,
                EscrowState::LEN,
                &[
                    seeds::STATE_SEED,
                    accounts.sender.key.as_ref(),
                    accounts.receiver.key.as_ref(),
                    &nonce_bytes,
                    &[state_bump],
                ],
            )?;
        }

        let wallet_record = match existing_wallet {
            Some(existing) => existing,
            None => {
                let reserve = wallet::create_pda_account(
                    accounts.sender,
                    accounts.wallet,
                    accounts.system_program,
                    program_id,
                    EscrowWallet::LEN,
                    &[
                        seeds::WALLET_SEED,
                        accounts.sender.key.as_ref(),
                        accounts.receiver.key.as_ref(),
                        &nonce_bytes,
                        &[wallet_bump],
                    ],
                )?;
                EscrowWallet::new(reserve)
            }
        };

        // Lock the grant in the wallet
        invoke(
            &system_instruction::transfer(accounts.sender.key, accounts.wallet.key, amount),
            &[
                accounts.sender.clone(),
                accounts.wallet.clone(),
                accounts.system_program.clone(),
            ],
        )?;

        wallet_record.serialize(&mut &mut accounts.wallet.data.borrow_mut()[..])?;
        state.serialize(&mut &mut accounts.state.data.borrow_mut()[..])?;

        events::emit_deposited(&state, accounts.wallet.key, wallet_record.reserve);
        Ok(())
    }

    fn process_settle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        settlement: Settlement,
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
        amount: u64,
    ) -> ProgramResult {
        let accounts = EscrowAccounts::parse(accounts)?;

        let mut state =
            load_state(accounts.state, program_id)?.ok_or(EscrowError::NotFunded)?;
        Self::check_escrow(program_id, &accounts, &state, nonce, state_bump, wallet_bump)?;
        let wallet_record =
            load_wallet(accounts.wallet, program_id)?.ok_or(EscrowError::NotFunded)?;

        state.settle(settlement, amount)?;

        let destination = match settlement {
            Settlement::Complete => accounts.receiver,
            Settlement::Withdraw => accounts.sender,
        };
        if !destination.is_writable {
            return Err(ProgramError::InvalidArgument);
        }

        // Everything above the reserve leaves the wallet
        let paid = wallet_record.custodied(accounts.wallet.lamports())?;
        if paid < state.amount {
            return Err(EscrowError::WalletUnderfunded.into());
        }
        wallet::transfer_lamports(accounts.wallet, destination, paid)?;

        state.serialize(&mut &mut accounts.state.data.borrow_mut()[..])?;

        events::emit_settled(&state, settlement, destination.key, paid);
        Ok(())
    }

    fn process_close(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
    ) -> ProgramResult {
        let accounts = EscrowAccounts::parse(accounts)?;

        let state = load_state(accounts.state, program_id)?.ok_or(EscrowError::NotSettled)?;
        Self::check_escrow(program_id, &accounts, &state, nonce, state_bump, wallet_bump)?;
        state.ensure_closable()?;

        let mut refunded = 0u64;
        if load_wallet(accounts.wallet, program_id)?.is_some() {
            refunded = wallet::close_account(accounts.wallet, accounts.sender)?;
        }
        refunded = refunded
            .checked_add(wallet::close_account(accounts.state, accounts.sender)?)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        events::emit_closed(&state, refunded);
        Ok(())
    }

    /// Role, bump and address checks shared by every instruction after deposit.
    fn check_escrow(
        program_id: &Pubkey,
        accounts: &EscrowAccounts,
        state: &EscrowState,
        nonce: u64,
        state_bump: u8,
        wallet_bump: u8,
    ) -> ProgramResult {
        state.ensure_participants(accounts.sender.key, accounts.receiver.key)?;
        state.ensure_bumps(state_bump, wallet_bump)?;
        if state.nonce != nonce {
            return Err(EscrowError::AddressMismatch.into());
        }
        pda::verify(
            &ProgramDerived,
            seeds::STATE_SEED,
            accounts.sender.key,
            accounts.receiver.key,
            nonce,
            state_bump,
            program_id,
            accounts.state.key,
        )?;
        pda::verify(
            &ProgramDerived,
            seeds::WALLET_SEED,
            accounts.sender.key,
            accounts.receiver.key,
            nonce,
            wallet_bump,
            program_id,
            accounts.wallet.key,
        )?;
        Ok(())
    }
}

/// Reads the escrow state, or `None` while the PDA has not been created.
fn load_state(account: &AccountInfo, program_id: &Pubkey) -> Result<Option<EscrowState>, ProgramError> {
    if is_absent(account) {
        return Ok(None);
    }
    if account.owner != program_id {
        return Err(EscrowError::InvalidAccountOwner.into());
    }
    let state = EscrowState::try_from_slice(&account.data.borrow())?;
    if state.discriminator != EscrowState::DISCRIMINATOR {
        return Err(ProgramError::InvalidAccountData);
    }
    Ok(Some(state))
}

/// Reads the wallet record, or `None` while the PDA has not been created.
fn load_wallet(account: &AccountInfo, program_id: &Pubkey) -> Result<Option<EscrowWallet>, ProgramError> {
    if is_absent(account) {
        return Ok(None);
    }
    if account.owner != program_id {
        return Err(EscrowError::InvalidAccountOwner.into());
    }
    let record = EscrowWallet::try_from_slice(&account.data.borrow())?;
    if record.discriminator != EscrowWallet::DISCRIMINATOR {
        return Err(ProgramError::InvalidAccountData);
    }
    Ok(Some(record))
}

/// System-owned with no data: never created, or closed. May still hold lamports.
fn is_absent(account: &AccountInfo) -> bool {
    *account.owner == system_program::id() && account.data_is_empty()
}
