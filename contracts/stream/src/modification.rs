//! Two-party consent for changing a live stream's terms.
//!
//! A proposal carries the proposer's consent from the start; the first
//! consent from the other party applies the terms in the same call and
//! deletes the proposal. Proposals expire `MODIFICATION_WINDOW` ticks after
//! they are made.

use soroban_sdk::{log, symbol_short, Address, Env};

use crate::error::ContractError;
use crate::events::{ModificationConsentedEvent, ModificationProposedEvent, StreamModifiedEvent};
use crate::policy;
use crate::settlement::Settlement;
use crate::storage::{self, MODIFICATION_WINDOW};
use crate::types::{ModificationProposal, Stream};
use crate::StreamLedger;

pub struct ModificationProtocol;

impl ModificationProtocol {
    pub fn propose(
        env: &Env,
        caller: &Address,
        stream_id: u64,
        new_duration: Option<u64>,
        additional_amount: Option<i128>,
        new_rate: Option<i128>,
    ) -> Result<(), ContractError> {
        policy::ensure_not_paused(env)?;
        let mut stream = storage::load_stream(env, stream_id)?;
        StreamLedger::require_participant(&stream, caller)?;

        let now = env.ledger().timestamp();
        StreamLedger::activate_if_started(&mut stream, now);
        StreamLedger::ensure_active(env, &stream)?;

        if new_duration.is_none() && additional_amount.is_none() && new_rate.is_none() {
            return Err(ContractError::InvalidParameters);
        }
        if new_duration == Some(0)
            || additional_amount.is_some_and(|amount| amount <= 0)
            || new_rate.is_some_and(|rate| rate <= 0)
        {
            return Err(ContractError::InvalidParameters);
        }
        if let Some(duration) = new_duration {
            stream
                .start_time
                .checked_add(duration)
                .ok_or(ContractError::InvalidParameters)?;
        }

        let expires_at = now
            .checked_add(MODIFICATION_WINDOW)
            .ok_or(ContractError::InvalidParameters)?;
        let from_sender = *caller == stream.sender;

        storage::save_modification(
            env,
            &ModificationProposal {
                stream_id,
                proposer: caller.clone(),
                new_duration,
                new_rate,
                additional_amount,
                sender_consent: from_sender,
                recipient_consent: !from_sender,
                created_at: now,
                expires_at,
            },
        );

        env.events().publish(
            (symbol_short!("mod_prop"), stream_id),
            ModificationProposedEvent {
                stream_id,
                proposer: caller.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    pub fn consent(env: &Env, caller: &Address, stream_id: u64) -> Result<bool, ContractError> {
        policy::ensure_not_paused(env)?;
        let mut stream = storage::load_stream(env, stream_id)?;
        StreamLedger::require_participant(&stream, caller)?;

        let mut proposal =
            storage::load_modification(env, stream_id).ok_or(ContractError::NoActiveProposal)?;

        let now = env.ledger().timestamp();
        if now >= proposal.expires_at {
            log!(env, "modification proposal expired", stream_id, proposal.expires_at);
            return Err(ContractError::ProposalExpired);
        }

        StreamLedger::activate_if_started(&mut stream, now);
        StreamLedger::ensure_active(env, &stream)?;

        if *caller == stream.sender {
            proposal.sender_consent = true;
        } else {
            proposal.recipient_consent = true;
        }

        env.events().publish(
            (symbol_short!("mod_cons"), stream_id),
            ModificationConsentedEvent {
                stream_id,
                party: caller.clone(),
            },
        );

        if !(proposal.sender_consent && proposal.recipient_consent) {
            storage::save_modification(env, &proposal);
            return Ok(false);
        }

        Self::execute(env, stream, &proposal)?;
        Ok(true)
    }

    pub fn withdraw(env: &Env, caller: &Address, stream_id: u64) -> Result<(), ContractError> {
        let stream = storage::load_stream(env, stream_id)?;
        StreamLedger::require_participant(&stream, caller)?;
        if storage::load_modification(env, stream_id).is_none() {
            return Err(ContractError::NoActiveProposal);
        }
        storage::remove_modification(env, stream_id);
        Ok(())
    }

    /// Applies the agreed terms: top-up first, then the new end time and rate.
    fn execute(
        env: &Env,
        mut stream: Stream,
        proposal: &ModificationProposal,
    ) -> Result<(), ContractError> {
        let stream_id = stream.id;
        let mut escrow = storage::load_escrow(env, stream_id)?;

        if let Some(amount) = proposal.additional_amount {
            stream.total_amount = stream
                .total_amount
                .checked_add(amount)
                .ok_or(ContractError::InvalidParameters)?;
            escrow.deposited += amount;
        }
        if let Some(duration) = proposal.new_duration {
            stream.end_time = stream
                .start_time
                .checked_add(duration)
                .ok_or(ContractError::InvalidParameters)?;
        }
        if let Some(rate) = proposal.new_rate {
            stream.rate_per_interval = rate;
        }

        storage::save_stream(env, &stream);
        storage::save_escrow(env, stream_id, &escrow);
        storage::remove_modification(env, stream_id);

        if let Some(amount) = proposal.additional_amount {
            Settlement::for_asset(env, &stream.asset)?.top_up(&stream.sender, amount)?;
        }

        env.events().publish(
            (symbol_short!("modified"), stream_id),
            StreamModifiedEvent {
                stream_id,
                total_amount: stream.total_amount,
                rate_per_interval: stream.rate_per_interval,
                end_time: stream.end_time,
            },
        );
        Ok(())
    }
}
