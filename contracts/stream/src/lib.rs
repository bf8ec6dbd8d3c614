#![no_std]

mod accrual;
mod asset;
mod error;
mod events;
mod modification;
mod policy;
mod settlement;
mod storage;
mod swap;
mod types;

use soroban_sdk::{contract, contractimpl, log, symbol_short, Address, Env, Vec};

pub use error::ContractError;
pub use events::{
    AssetPolicyEvent, ModificationConsentedEvent, ModificationProposedEvent, StreamCancelledEvent,
    StreamCreatedEvent, StreamEvent, StreamModifiedEvent, SwapExecutedEvent, SwapInvalidatedEvent,
    SwapProposedEvent, WithdrawnEvent,
};
pub use storage::{MAX_FEE_BPS, MODIFICATION_WINDOW, SCALE};
pub use types::{
    AssetMetadata, AssetRef, CancelSplit, Config, CreateStreamParams, CurveKind, Escrow,
    IntervalUnit, ModificationProposal, Stream, StreamStatus, SwapProposal,
};

use modification::ModificationProtocol;
use settlement::Settlement;
use swap::SwapNegotiator;

// ---------------------------------------------------------------------------
// Internal Helpers
// ---------------------------------------------------------------------------

impl StreamLedger {
    /// Checks creation parameters and returns the `(start_time, end_time)` window.
    fn validate_stream_params(
        sender: &Address,
        params: &CreateStreamParams,
        now: u64,
    ) -> Result<(u64, u64), ContractError> {
        if params.total_amount <= 0 || params.rate_per_interval <= 0 || params.duration == 0 {
            return Err(ContractError::InvalidParameters);
        }
        if params.interval.ticks() == 0 {
            return Err(ContractError::InvalidParameters);
        }
        if params.curve != CurveKind::Linear && params.curve_param <= 0 {
            return Err(ContractError::InvalidParameters);
        }
        if *sender == params.recipient {
            return Err(ContractError::InvalidParameters);
        }

        let start_time = params.start_time.unwrap_or(now);
        if start_time < now {
            return Err(ContractError::InvalidParameters);
        }
        let end_time = start_time
            .checked_add(params.duration)
            .ok_or(ContractError::InvalidParameters)?;

        Ok((start_time, end_time))
    }

    /// Validates, collects `total_amount + fee`, then allocates the id and
    /// persists the stream with its escrow record.
    fn open_stream(
        env: &Env,
        config: &Config,
        sender: &Address,
        params: CreateStreamParams,
        now: u64,
    ) -> Result<u64, ContractError> {
        let (start_time, end_time) = Self::validate_stream_params(sender, &params, now)?;
        policy::ensure_asset_allowed(env, &params.asset)?;

        let fee = policy::calculate_fee(params.total_amount, config.fee_bps)
            .ok_or(ContractError::InvalidParameters)?;

        // A failed debit returns before any id is allocated or record written.
        Settlement::for_asset(env, &params.asset)?.intake(
            sender,
            params.total_amount,
            fee,
            &config.treasury,
        )?;

        let stream_id = storage::next_stream_id(env);
        let status = if start_time > now {
            StreamStatus::Created
        } else {
            StreamStatus::Active
        };

        let stream = Stream {
            id: stream_id,
            sender: sender.clone(),
            recipient: params.recipient,
            asset: params.asset,
            total_amount: params.total_amount,
            rate_per_interval: params.rate_per_interval,
            interval: params.interval,
            curve: params.curve,
            curve_param: params.curve_param,
            start_time,
            end_time,
            withdrawn_amount: 0,
            status,
            created_at: now,
            allow_swaps: params.allow_swaps,
            paused_at: None,
            paused_duration: 0,
            closed_at: None,
        };
        storage::save_stream(env, &stream);
        storage::save_escrow(
            env,
            stream_id,
            &Escrow {
                deposited: stream.total_amount,
                withdrawn: 0,
                refunded: 0,
            },
        );

        env.events().publish(
            (symbol_short!("created"), stream_id),
            StreamCreatedEvent {
                stream_id,
                sender: stream.sender.clone(),
                recipient: stream.recipient.clone(),
                asset: stream.asset.clone(),
                total_amount: stream.total_amount,
                fee,
                start_time,
                end_time,
            },
        );

        Ok(stream_id)
    }

    /// `Created` streams become `Active` once their start time is reached.
    pub(crate) fn activate_if_started(stream: &mut Stream, now: u64) {
        if stream.status == StreamStatus::Created && now >= stream.start_time {
            stream.status = StreamStatus::Active;
        }
    }

    pub(crate) fn ensure_active(env: &Env, stream: &Stream) -> Result<(), ContractError> {
        if stream.status != StreamStatus::Active {
            log!(env, "stream not active", stream.id, stream.status);
            return Err(ContractError::StreamNotActive);
        }
        Ok(())
    }

    /// Authenticates `caller` and checks it is the sender or the recipient.
    pub(crate) fn require_participant(
        stream: &Stream,
        caller: &Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        if *caller != stream.sender && *caller != stream.recipient {
            return Err(ContractError::Unauthorized);
        }
        Ok(())
    }

    /// Settles and closes a stream: available amount to the recipient, the
    /// remaining custody balance back to the sender.
    fn cancel(
        env: &Env,
        mut stream: Stream,
        cancelled_by: Address,
    ) -> Result<CancelSplit, ContractError> {
        if stream.status.is_terminal() {
            return Err(ContractError::AlreadyTerminal);
        }

        let now = env.ledger().timestamp();
        let available = accrual::available_at(&stream, now);
        let mut escrow = storage::load_escrow(env, stream.id)?;
        let split = settlement::cancellation_split(&escrow, available);

        // Records are written before any funds leave custody.
        stream.withdrawn_amount += split.paid_to_recipient;
        stream.status = StreamStatus::Cancelled;
        stream.closed_at = Some(now);
        escrow.withdrawn += split.paid_to_recipient;
        escrow.refunded += split.refunded_to_sender;
        storage::save_stream(env, &stream);
        storage::save_escrow(env, stream.id, &escrow);
        storage::remove_modification(env, stream.id);

        Settlement::for_asset(env, &stream.asset)?.settle_cancellation(
            &stream.sender,
            &stream.recipient,
            &split,
        )?;

        env.events().publish(
            (symbol_short!("cancelled"), stream.id),
            StreamCancelledEvent {
                stream_id: stream.id,
                cancelled_by,
                paid_to_recipient: split.paid_to_recipient,
                refunded_to_sender: split.refunded_to_sender,
            },
        );

        Ok(split)
    }
}

// ---------------------------------------------------------------------------
// Contract Implementation
// ---------------------------------------------------------------------------

#[contract]
pub struct StreamLedger;

#[contractimpl]
impl StreamLedger {
    /// Initialise the ledger.
    ///
    /// Must be called exactly once before any other operation. Stores
    /// `Config { admin, native_asset, treasury, fee_bps }`, zeroes the stream
    /// and swap id counters and allow-lists the native asset.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: called a second time
    /// - `FeeTooHigh`: `fee_bps > MAX_FEE_BPS`
    pub fn init(
        env: Env,
        admin: Address,
        native_asset: Address,
        treasury: Address,
        fee_bps: u32,
    ) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        admin.require_auth();
        policy::validate_fee(fee_bps)?;

        storage::set_config(
            &env,
            &Config {
                admin,
                native_asset,
                treasury,
                fee_bps,
            },
        );
        env.storage()
            .instance()
            .set(&types::DataKey::NextStreamId, &0u64);
        env.storage()
            .instance()
            .set(&types::DataKey::NextSwapId, &0u64);
        policy::set_allowed(&env, &AssetRef::Native, true);
        Ok(())
    }

    /// Create a new stream funded by `sender`.
    ///
    /// Debits `total_amount + fee` from the sender. The fee (basis points of
    /// `total_amount`) is forwarded to the treasury; `total_amount` stays in
    /// custody as the stream's escrow. Returns the new stream id; ids are
    /// sequential from 0 and never reused.
    ///
    /// # Validation
    /// - `total_amount > 0`, `rate_per_interval > 0`, `duration > 0`
    /// - interval of at least one tick
    /// - `curve_param > 0` for every curve except `Linear`
    /// - `sender != recipient`
    /// - `start_time`, when given, not in the past
    /// - asset allow-listed and not deny-listed
    ///
    /// # Errors
    /// - `ContractPaused`, `InvalidParameters`, `AssetNotAllowed`, `AssetDenied`
    /// - `InsufficientBalance`: sender cannot cover `total_amount + fee`
    /// - `AssetTransferFailed`: external token rejected the debit
    ///
    /// # Usage Notes
    /// - The transfer and the record are atomic: a failed debit leaves no
    ///   stream behind and does not advance the id counter
    /// - A future `start_time` creates the stream in `Created`; it becomes
    ///   `Active` once the ledger reaches `start_time`
    pub fn create_stream(
        env: Env,
        sender: Address,
        params: CreateStreamParams,
    ) -> Result<u64, ContractError> {
        policy::ensure_not_paused(&env)?;
        sender.require_auth();

        let config = storage::get_config(&env)?;
        let now = env.ledger().timestamp();
        Self::open_stream(&env, &config, &sender, params, now)
    }

    /// Create several streams from one sender in a single transaction.
    ///
    /// Either every stream is created or none is.
    pub fn create_streams(
        env: Env,
        sender: Address,
        streams: Vec<CreateStreamParams>,
    ) -> Result<Vec<u64>, ContractError> {
        policy::ensure_not_paused(&env)?;
        sender.require_auth();

        let config = storage::get_config(&env)?;
        let now = env.ledger().timestamp();

        let mut created_ids = Vec::new(&env);
        for params in streams.iter() {
            created_ids.push_back(Self::open_stream(&env, &config, &sender, params, now)?);
        }
        Ok(created_ids)
    }

    /// Released but not yet withdrawn amount at the current ledger time.
    ///
    /// Accrual is bounded by `end_time` and excludes time spent paused.
    /// Returns 0 for `Cancelled` and `Completed` streams.
    pub fn available_amount(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        let stream = storage::load_stream(&env, stream_id)?;
        Ok(accrual::available_at(&stream, env.ledger().timestamp()))
    }

    /// Withdraw released funds to the recipient.
    ///
    /// With `amount = None` everything available is withdrawn; when nothing
    /// is available this returns 0 without touching state. A withdrawal that
    /// brings `withdrawn_amount` to `total_amount` completes the stream.
    ///
    /// # Errors
    /// - `Unauthorized`: caller is not the recipient
    /// - `StreamNotActive`: stream is `Created`, `Paused` or terminal
    /// - `InvalidParameters`: requested amount is not positive
    /// - `InsufficientAvailable`: requested amount exceeds what is available
    pub fn withdraw(
        env: Env,
        recipient: Address,
        stream_id: u64,
        amount: Option<i128>,
    ) -> Result<i128, ContractError> {
        policy::ensure_not_paused(&env)?;
        recipient.require_auth();

        let mut stream = storage::load_stream(&env, stream_id)?;
        if recipient != stream.recipient {
            return Err(ContractError::Unauthorized);
        }

        let now = env.ledger().timestamp();
        Self::activate_if_started(&mut stream, now);
        Self::ensure_active(&env, &stream)?;

        let available = accrual::available_at(&stream, now);
        let amount = match amount {
            Some(requested) if requested <= 0 => return Err(ContractError::InvalidParameters),
            Some(requested) if requested > available => {
                log!(&env, "withdraw exceeds available", stream_id, requested, available);
                return Err(ContractError::InsufficientAvailable);
            }
            Some(requested) => requested,
            None if available == 0 => return Ok(0),
            None => available,
        };

        let mut escrow = storage::load_escrow(&env, stream_id)?;

        // Records are written before any funds leave custody.
        stream.withdrawn_amount += amount;
        escrow.withdrawn += amount;
        let completed = stream.withdrawn_amount == stream.total_amount;
        if completed {
            stream.status = StreamStatus::Completed;
            stream.closed_at = Some(now);
            storage::remove_modification(&env, stream_id);
        }
        storage::save_stream(&env, &stream);
        storage::save_escrow(&env, stream_id, &escrow);

        Settlement::for_asset(&env, &stream.asset)?.pay_out(&stream.recipient, amount)?;

        env.events().publish(
            (symbol_short!("withdrew"), stream_id),
            WithdrawnEvent {
                stream_id,
                recipient: stream.recipient.clone(),
                amount,
                withdrawn_total: stream.withdrawn_amount,
            },
        );
        if completed {
            env.events().publish(
                (symbol_short!("completed"), stream_id),
                StreamEvent::Completed(stream_id),
            );
        }

        Ok(amount)
    }

    /// Cancel a stream as its sender.
    ///
    /// Pays the recipient everything available at this instant and refunds
    /// the rest of the escrow to the sender, then moves the stream to
    /// `Cancelled`. `paid + refunded + previously withdrawn == total_amount`.
    ///
    /// # Errors
    /// - `Unauthorized`: caller is not the sender
    /// - `AlreadyTerminal`: stream is `Cancelled` or `Completed`
    ///
    /// # Usage Notes
    /// - Works on `Created`, `Active` and `Paused` streams
    /// - Remains available while the ledger is globally paused so senders
    ///   can always recover unstreamed funds
    pub fn cancel_stream(
        env: Env,
        sender: Address,
        stream_id: u64,
    ) -> Result<CancelSplit, ContractError> {
        sender.require_auth();
        let stream = storage::load_stream(&env, stream_id)?;
        if sender != stream.sender {
            return Err(ContractError::Unauthorized);
        }
        Self::cancel(&env, stream, sender)
    }

    /// Pause a stream. Admin or an authorized pauser only.
    ///
    /// Accrual is frozen while paused and resumes where it left off; the
    /// end of the stream shifts by the paused time.
    pub fn pause_stream(env: Env, caller: Address, stream_id: u64) -> Result<(), ContractError> {
        policy::require_pauser(&env, &caller)?;
        let mut stream = storage::load_stream(&env, stream_id)?;
        if stream.status.is_terminal() {
            return Err(ContractError::AlreadyTerminal);
        }

        let now = env.ledger().timestamp();
        Self::activate_if_started(&mut stream, now);
        Self::ensure_active(&env, &stream)?;

        stream.status = StreamStatus::Paused;
        stream.paused_at = Some(now);
        storage::save_stream(&env, &stream);

        env.events().publish(
            (symbol_short!("paused"), stream_id),
            StreamEvent::Paused(stream_id),
        );
        Ok(())
    }

    /// Resume a paused stream. Admin or an authorized pauser only.
    pub fn resume_stream(env: Env, caller: Address, stream_id: u64) -> Result<(), ContractError> {
        policy::require_pauser(&env, &caller)?;
        let mut stream = storage::load_stream(&env, stream_id)?;

        match stream.status {
            StreamStatus::Cancelled | StreamStatus::Completed => {
                return Err(ContractError::AlreadyTerminal)
            }
            StreamStatus::Created | StreamStatus::Active => {
                return Err(ContractError::StreamNotPaused)
            }
            StreamStatus::Paused => {}
        }

        let now = env.ledger().timestamp();
        if let Some(paused_at) = stream.paused_at.take() {
            // Only paused time after the start delays accrual.
            stream.paused_duration += now.saturating_sub(paused_at.max(stream.start_time));
        }
        stream.status = StreamStatus::Active;
        storage::save_stream(&env, &stream);

        env.events().publish(
            (symbol_short!("resumed"), stream_id),
            StreamEvent::Resumed(stream_id),
        );
        Ok(())
    }

    /// Retrieve the complete state of a stream.
    pub fn get_stream(env: Env, stream_id: u64) -> Result<Stream, ContractError> {
        storage::load_stream(&env, stream_id)
    }

    /// Custody bookkeeping for a stream.
    pub fn get_escrow(env: Env, stream_id: u64) -> Result<Escrow, ContractError> {
        storage::load_escrow(&env, stream_id)
    }

    /// Number of streams ever created; also the next id to be assigned.
    pub fn stream_count(env: Env) -> u64 {
        storage::get_stream_count(&env)
    }

    // ============================================
    // MODIFICATION CONSENT
    // ============================================

    /// Propose new terms for an active stream. Either party may propose; the
    /// proposer's consent is recorded immediately and the proposal expires
    /// `MODIFICATION_WINDOW` ticks from now. Replaces any earlier proposal.
    pub fn propose_modification(
        env: Env,
        caller: Address,
        stream_id: u64,
        new_duration: Option<u64>,
        additional_amount: Option<i128>,
        new_rate: Option<i128>,
    ) -> Result<(), ContractError> {
        ModificationProtocol::propose(
            &env,
            &caller,
            stream_id,
            new_duration,
            additional_amount,
            new_rate,
        )
    }

    /// Record the caller's consent. Returns `true` when this consent
    /// completed the pair and the new terms were applied.
    pub fn consent_modification(
        env: Env,
        caller: Address,
        stream_id: u64,
    ) -> Result<bool, ContractError> {
        ModificationProtocol::consent(&env, &caller, stream_id)
    }

    /// Drop the pending proposal. Either party may withdraw it.
    pub fn withdraw_modification(
        env: Env,
        caller: Address,
        stream_id: u64,
    ) -> Result<(), ContractError> {
        ModificationProtocol::withdraw(&env, &caller, stream_id)
    }

    pub fn get_modification(env: Env, stream_id: u64) -> Option<ModificationProposal> {
        storage::load_modification(&env, stream_id)
    }

    // ============================================
    // ASSET SWAP
    // ============================================

    /// Propose switching the stream's asset. Returns the swap id.
    pub fn propose_swap(
        env: Env,
        caller: Address,
        stream_id: u64,
        from_asset: AssetRef,
        to_asset: AssetRef,
        exchange_rate: i128,
        expires_at: u64,
    ) -> Result<u64, ContractError> {
        SwapNegotiator::propose(
            &env,
            &caller,
            stream_id,
            from_asset,
            to_asset,
            exchange_rate,
            expires_at,
        )
    }

    /// Execute a swap proposal. Must be the participant who did not propose it.
    ///
    /// The stream's held balance moves to the new asset unit for unit: the
    /// sender deposits it in `to_asset` and is refunded the same amount of
    /// `from_asset`. Amounts are not converted at `exchange_rate`.
    ///
    /// # Errors
    /// - `InsufficientBalance`: sender cannot fund the held balance in `to_asset`
    /// - `AssetTransferFailed`: an external token rejected either leg
    pub fn execute_swap(env: Env, caller: Address, swap_id: u64) -> Result<(), ContractError> {
        SwapNegotiator::execute(&env, &caller, swap_id)
    }

    /// Withdraw a swap proposal so it can no longer execute.
    pub fn invalidate_swap(env: Env, caller: Address, swap_id: u64) -> Result<(), ContractError> {
        SwapNegotiator::invalidate(&env, &caller, swap_id)
    }

    pub fn get_swap(env: Env, swap_id: u64) -> Result<SwapProposal, ContractError> {
        storage::load_swap(&env, swap_id)
    }
}

#[contractimpl]
impl StreamLedger {
    /// Cancel a stream as the admin, for dispute resolution.
    ///
    /// Same settlement as `cancel_stream`: the recipient is paid what is
    /// available and the sender is refunded the rest.
    pub fn cancel_stream_as_admin(env: Env, stream_id: u64) -> Result<CancelSplit, ContractError> {
        let config = policy::require_admin(&env)?;
        let stream = storage::load_stream(&env, stream_id)?;
        Self::cancel(&env, stream, config.admin)
    }

    /// Rotate the admin key. Requires the current admin.
    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), ContractError> {
        let mut config = policy::require_admin(&env)?;
        let old_admin = config.admin.clone();

        config.admin = new_admin.clone();
        storage::set_config(&env, &config);

        env.events().publish(
            (symbol_short!("admin"), symbol_short!("updated")),
            (old_admin, new_admin),
        );
        Ok(())
    }

    /// Update the creation fee. Applies to streams created afterwards.
    pub fn set_fee(env: Env, fee_bps: u32) -> Result<(), ContractError> {
        let mut config = policy::require_admin(&env)?;
        policy::validate_fee(fee_bps)?;

        config.fee_bps = fee_bps;
        storage::set_config(&env, &config);

        env.events()
            .publish((symbol_short!("fee"), symbol_short!("updated")), fee_bps);
        Ok(())
    }

    pub fn set_treasury(env: Env, treasury: Address) -> Result<(), ContractError> {
        let mut config = policy::require_admin(&env)?;
        config.treasury = treasury.clone();
        storage::set_config(&env, &config);

        env.events()
            .publish((symbol_short!("treasury"), symbol_short!("updated")), treasury);
        Ok(())
    }

    /// Register an external token: reads its metadata through the token
    /// interface and allow-lists it.
    ///
    /// # Errors
    /// - `AssetNonConforming`: the contract does not answer name/symbol/decimals
    pub fn register_asset(env: Env, token: Address) -> Result<AssetMetadata, ContractError> {
        policy::require_admin(&env)?;
        let metadata = asset::read_metadata(&env, &token)?;

        env.storage()
            .persistent()
            .set(&types::DataKey::AssetMeta(token.clone()), &metadata);
        let asset = AssetRef::External(token);
        policy::set_allowed(&env, &asset, true);

        Self::publish_asset_policy(&env, asset);
        Ok(metadata)
    }

    pub fn allow_asset(env: Env, asset: AssetRef) -> Result<(), ContractError> {
        policy::require_admin(&env)?;
        policy::set_allowed(&env, &asset, true);
        Self::publish_asset_policy(&env, asset);
        Ok(())
    }

    pub fn disallow_asset(env: Env, asset: AssetRef) -> Result<(), ContractError> {
        policy::require_admin(&env)?;
        policy::set_allowed(&env, &asset, false);
        Self::publish_asset_policy(&env, asset);
        Ok(())
    }

    /// Deny-listed assets are rejected even when allow-listed.
    pub fn deny_asset(env: Env, asset: AssetRef) -> Result<(), ContractError> {
        policy::require_admin(&env)?;
        policy::set_denied(&env, &asset, true);
        Self::publish_asset_policy(&env, asset);
        Ok(())
    }

    pub fn undeny_asset(env: Env, asset: AssetRef) -> Result<(), ContractError> {
        policy::require_admin(&env)?;
        policy::set_denied(&env, &asset, false);
        Self::publish_asset_policy(&env, asset);
        Ok(())
    }

    pub fn add_pauser(env: Env, pauser: Address) -> Result<(), ContractError> {
        policy::require_admin(&env)?;
        storage::set_pauser(&env, &pauser, true);
        env.events()
            .publish((symbol_short!("pauser"), symbol_short!("added")), pauser);
        Ok(())
    }

    pub fn remove_pauser(env: Env, pauser: Address) -> Result<(), ContractError> {
        policy::require_admin(&env)?;
        storage::set_pauser(&env, &pauser, false);
        env.events()
            .publish((symbol_short!("pauser"), symbol_short!("removed")), pauser);
        Ok(())
    }

    /// Emergency stop for the whole ledger. Blocks creation, withdrawal,
    /// modification and swaps; cancellation stays available.
    pub fn set_global_pause(env: Env, caller: Address, paused: bool) -> Result<(), ContractError> {
        policy::require_pauser(&env, &caller)?;
        storage::set_global_pause(&env, paused);
        env.events().publish((symbol_short!("gpause"), caller), paused);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<Config, ContractError> {
        storage::get_config(&env)
    }

    pub fn is_globally_paused(env: Env) -> bool {
        storage::is_globally_paused(&env)
    }

    pub fn is_pauser(env: Env, who: Address) -> bool {
        storage::is_pauser(&env, &who)
    }

    /// Whether new streams may currently use `asset`.
    pub fn is_asset_allowed(env: Env, asset: AssetRef) -> bool {
        policy::ensure_asset_allowed(&env, &asset).is_ok()
    }

    pub fn get_asset_metadata(env: Env, token: Address) -> Option<AssetMetadata> {
        env.storage()
            .persistent()
            .get(&types::DataKey::AssetMeta(token))
    }
}

impl StreamLedger {
    fn publish_asset_policy(env: &Env, asset: AssetRef) {
        let allowed = storage::get_flag(env, &types::DataKey::AllowedAsset(asset.clone()));
        let denied = storage::get_flag(env, &types::DataKey::DeniedAsset(asset.clone()));
        env.events().publish(
            (symbol_short!("asset"), symbol_short!("policy")),
            AssetPolicyEvent {
                asset,
                allowed,
                denied,
            },
        );
    }
}

#[cfg(test)]
mod testutils;
