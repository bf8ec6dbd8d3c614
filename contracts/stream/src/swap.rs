//! Proposal/accept negotiation for switching a stream's asset.
//!
//! Any number of proposals may be open for one stream, but only the first to
//! execute wins; the winner is recorded per stream and every other proposal
//! for that stream is refused from then on.
//!
//! Executing a swap re-points the stream at the new asset and moves its
//! custody along with it: the sender deposits the held balance in the new
//! asset and gets the same number of units of the old asset back. Amounts are
//! not converted at `exchange_rate`; `total_amount` keeps its numeric value in
//! the new asset's units.

use soroban_sdk::{log, symbol_short, Address, Env};

use crate::error::ContractError;
use crate::events::{SwapExecutedEvent, SwapInvalidatedEvent, SwapProposedEvent};
use crate::policy;
use crate::settlement;
use crate::storage;
use crate::types::{AssetRef, Stream, SwapProposal};
use crate::StreamLedger;

pub struct SwapNegotiator;

impl SwapNegotiator {
    pub fn propose(
        env: &Env,
        caller: &Address,
        stream_id: u64,
        from_asset: AssetRef,
        to_asset: AssetRef,
        exchange_rate: i128,
        expires_at: u64,
    ) -> Result<u64, ContractError> {
        policy::ensure_not_paused(env)?;
        let mut stream = storage::load_stream(env, stream_id)?;
        StreamLedger::require_participant(&stream, caller)?;

        let now = env.ledger().timestamp();
        Self::ensure_swappable(env, &mut stream, now)?;

        if from_asset != stream.asset || to_asset == from_asset {
            return Err(ContractError::InvalidParameters);
        }
        if exchange_rate <= 0 || expires_at <= now {
            return Err(ContractError::InvalidParameters);
        }
        policy::ensure_asset_allowed(env, &to_asset)?;

        let swap_id = storage::next_swap_id(env);
        let swap = SwapProposal {
            swap_id,
            stream_id,
            proposer: caller.clone(),
            from_asset,
            to_asset,
            exchange_rate,
            expires_at,
            active: true,
            executed_at: None,
        };
        storage::save_swap(env, &swap);

        env.events().publish(
            (symbol_short!("swap_prop"), stream_id),
            SwapProposedEvent {
                swap_id,
                stream_id,
                proposer: swap.proposer.clone(),
                to_asset: swap.to_asset.clone(),
                exchange_rate,
                expires_at,
            },
        );
        Ok(swap_id)
    }

    pub fn execute(env: &Env, caller: &Address, swap_id: u64) -> Result<(), ContractError> {
        policy::ensure_not_paused(env)?;
        let mut swap = storage::load_swap(env, swap_id)?;
        let mut stream = storage::load_stream(env, swap.stream_id)?;

        StreamLedger::require_participant(&stream, caller)?;
        if *caller == swap.proposer {
            return Err(ContractError::Unauthorized);
        }

        Self::ensure_open(&swap)?;
        let now = env.ledger().timestamp();
        if now >= swap.expires_at {
            log!(env, "swap proposal expired", swap_id, swap.expires_at);
            return Err(ContractError::SwapExpired);
        }

        Self::ensure_swappable(env, &mut stream, now)?;
        if storage::executed_swap(env, stream.id).is_some() || swap.from_asset != stream.asset {
            return Err(ContractError::SwapAlreadyExecuted);
        }
        // Policy may have changed since the proposal was made.
        policy::ensure_asset_allowed(env, &swap.to_asset)?;

        // The sender funds the new custody even when the recipient executes.
        if *caller != stream.sender {
            stream.sender.require_auth();
        }
        let held = storage::load_escrow(env, stream.id)?.held();

        stream.asset = swap.to_asset.clone();
        swap.active = false;
        swap.executed_at = Some(now);
        storage::save_stream(env, &stream);
        storage::save_swap(env, &swap);
        storage::record_executed_swap(env, stream.id, swap_id);

        settlement::exchange_custody(env, &stream.sender, &swap.from_asset, &swap.to_asset, held)?;

        env.events().publish(
            (symbol_short!("swapped"), stream.id),
            SwapExecutedEvent {
                swap_id,
                stream_id: stream.id,
                from_asset: swap.from_asset,
                to_asset: swap.to_asset,
            },
        );
        Ok(())
    }

    /// Either participant may retire an open proposal.
    pub fn invalidate(env: &Env, caller: &Address, swap_id: u64) -> Result<(), ContractError> {
        let mut swap = storage::load_swap(env, swap_id)?;
        let stream = storage::load_stream(env, swap.stream_id)?;
        StreamLedger::require_participant(&stream, caller)?;
        Self::ensure_open(&swap)?;

        swap.active = false;
        storage::save_swap(env, &swap);

        env.events().publish(
            (symbol_short!("swap_inv"), swap.stream_id),
            SwapInvalidatedEvent {
                swap_id,
                stream_id: swap.stream_id,
            },
        );
        Ok(())
    }

    fn ensure_open(swap: &SwapProposal) -> Result<(), ContractError> {
        if swap.executed_at.is_some() {
            return Err(ContractError::SwapAlreadyExecuted);
        }
        if !swap.active {
            return Err(ContractError::SwapInactive);
        }
        Ok(())
    }

    fn ensure_swappable(env: &Env, stream: &mut Stream, now: u64) -> Result<(), ContractError> {
        if !stream.allow_swaps {
            return Err(ContractError::SwapsDisabled);
        }
        StreamLedger::activate_if_started(stream, now);
        StreamLedger::ensure_active(env, stream)
    }
}
