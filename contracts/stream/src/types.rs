use soroban_sdk::{contracttype, Address, String};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Global configuration for the ledger, written once by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    /// Contract of the network's native asset.
    pub native_asset: Address,
    /// Receives creation fees.
    pub treasury: Address,
    /// Creation fee in basis points of `total_amount`, capped at `MAX_FEE_BPS`.
    pub fee_bps: u32,
}

// ---------------------------------------------------------------------------
// Stream terms
// ---------------------------------------------------------------------------

/// Asset a stream is denominated in.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssetRef {
    Native,
    External(Address),
}

/// Metadata read from an external token when it is registered.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Granularity at which elapsed time is credited.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
    /// Raw count of logical ticks.
    Ticks(u64),
}

impl IntervalUnit {
    pub fn ticks(&self) -> u64 {
        match self {
            IntervalUnit::Second => 1,
            IntervalUnit::Minute => 60,
            IntervalUnit::Hour => 3_600,
            IntervalUnit::Day => 86_400,
            IntervalUnit::Ticks(n) => *n,
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurveKind {
    Linear = 0,
    Exponential = 1,
    Logarithmic = 2,
    Sigmoid = 3,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamStatus {
    Created = 0,
    Active = 1,
    Paused = 2,
    Cancelled = 3,
    Completed = 4,
}

impl StreamStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamStatus::Cancelled | StreamStatus::Completed)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stream {
    pub id: u64,
    pub sender: Address,
    pub recipient: Address,
    pub asset: AssetRef,
    pub total_amount: i128,
    pub rate_per_interval: i128,
    pub interval: IntervalUnit,
    pub curve: CurveKind,
    /// Curve shape parameter in plain units. Ignored for `Linear`.
    pub curve_param: i128,
    pub start_time: u64,
    pub end_time: u64,
    pub withdrawn_amount: i128,
    pub status: StreamStatus,
    pub created_at: u64,
    pub allow_swaps: bool,
    /// Set while the stream is paused.
    pub paused_at: Option<u64>,
    /// Paused time after `start_time`, excluded from accrual.
    pub paused_duration: u64,
    /// Set when the stream reaches `Cancelled` or `Completed`.
    pub closed_at: Option<u64>,
}

/// Custody bookkeeping for one stream.
///
/// Held funds are `deposited - withdrawn - refunded`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Escrow {
    pub deposited: i128,
    pub withdrawn: i128,
    pub refunded: i128,
}

impl Escrow {
    pub fn held(&self) -> i128 {
        self.deposited - self.withdrawn - self.refunded
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateStreamParams {
    pub recipient: Address,
    pub total_amount: i128,
    pub rate_per_interval: i128,
    pub interval: IntervalUnit,
    pub duration: u64,
    pub curve: CurveKind,
    pub curve_param: i128,
    pub asset: AssetRef,
    /// `None` starts the stream immediately.
    pub start_time: Option<u64>,
    pub allow_swaps: bool,
}

/// Outcome of a cancellation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CancelSplit {
    pub paid_to_recipient: i128,
    pub refunded_to_sender: i128,
}

// ---------------------------------------------------------------------------
// Protocol records
// ---------------------------------------------------------------------------

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModificationProposal {
    pub stream_id: u64,
    pub proposer: Address,
    pub new_duration: Option<u64>,
    pub new_rate: Option<i128>,
    pub additional_amount: Option<i128>,
    pub sender_consent: bool,
    pub recipient_consent: bool,
    pub created_at: u64,
    pub expires_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapProposal {
    pub swap_id: u64,
    pub stream_id: u64,
    pub proposer: Address,
    pub from_asset: AssetRef,
    pub to_asset: AssetRef,
    /// Fixed-point with `SCALE`. Recorded for the counterparty; no conversion is applied.
    pub exchange_rate: i128,
    pub expires_at: u64,
    pub active: bool,
    pub executed_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Storage keys
// ---------------------------------------------------------------------------

/// Namespace for all contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,                 // Instance: admin, native asset, treasury, fee.
    NextStreamId,           // Instance: stream id counter.
    NextSwapId,             // Instance: swap id counter.
    GlobalPause,            // Instance: emergency stop flag.
    Pauser(Address),        // Instance: authorized pausers.
    AllowedAsset(AssetRef), // Persistent: allow-list.
    DeniedAsset(AssetRef),  // Persistent: deny-list.
    AssetMeta(Address),     // Persistent: registered external token metadata.
    Stream(u64),            // Persistent: stream record.
    Escrow(u64),            // Persistent: escrow bookkeeping per stream.
    Modification(u64),      // Persistent: pending modification per stream.
    Swap(u64),              // Persistent: swap proposal by swap id.
    ExecutedSwap(u64),      // Persistent: winning swap id per stream.
}
