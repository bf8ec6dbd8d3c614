use soroban_sdk::{contracttype, Address};

use crate::types::AssetRef;

/// Status transitions without further payload.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamEvent {
    Paused(u64),
    Resumed(u64),
    Completed(u64),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamCreatedEvent {
    pub stream_id: u64,
    pub sender: Address,
    pub recipient: Address,
    pub asset: AssetRef,
    pub total_amount: i128,
    pub fee: i128,
    pub start_time: u64,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub stream_id: u64,
    pub recipient: Address,
    pub amount: i128,
    pub withdrawn_total: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamCancelledEvent {
    pub stream_id: u64,
    pub cancelled_by: Address,
    pub paid_to_recipient: i128,
    pub refunded_to_sender: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModificationProposedEvent {
    pub stream_id: u64,
    pub proposer: Address,
    pub expires_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModificationConsentedEvent {
    pub stream_id: u64,
    pub party: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamModifiedEvent {
    pub stream_id: u64,
    pub total_amount: i128,
    pub rate_per_interval: i128,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapProposedEvent {
    pub swap_id: u64,
    pub stream_id: u64,
    pub proposer: Address,
    pub to_asset: AssetRef,
    pub exchange_rate: i128,
    pub expires_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapExecutedEvent {
    pub swap_id: u64,
    pub stream_id: u64,
    pub from_asset: AssetRef,
    pub to_asset: AssetRef,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapInvalidatedEvent {
    pub swap_id: u64,
    pub stream_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetPolicyEvent {
    pub asset: AssetRef,
    pub allowed: bool,
    pub denied: bool,
}
