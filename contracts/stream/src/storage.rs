use soroban_sdk::{Address, Env};

use crate::error::ContractError;
use crate::types::{Config, DataKey, Escrow, ModificationProposal, Stream, SwapProposal};

// Constants
pub const SCALE: i128 = 1_000_000; // fixed-point unit for curve parameters and exchange rates
pub const BPS_DENOMINATOR: i128 = 10_000; // 100% = 10,000 basis points
pub const MAX_FEE_BPS: u32 = 1_000; // 10%

/// Lifetime of a modification proposal, in logical ticks (~10 days).
pub const MODIFICATION_WINDOW: u64 = 864_000;

const INSTANCE_TTL_THRESHOLD: u32 = 17_280;
const INSTANCE_TTL_EXTEND: u32 = 120_960;
const PERSISTENT_TTL_THRESHOLD: u32 = 17_280;
const PERSISTENT_TTL_EXTEND: u32 = 120_960;

// ---------------------------------------------------------------------------
// Instance storage
// ---------------------------------------------------------------------------

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<Config, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

pub fn get_stream_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::NextStreamId)
        .unwrap_or(0u64)
}

/// Hands out the next stream id and advances the counter.
pub fn next_stream_id(env: &Env) -> u64 {
    let id = get_stream_count(env);
    env.storage().instance().set(&DataKey::NextStreamId, &(id + 1));
    bump_instance(env);
    id
}

pub fn get_swap_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::NextSwapId)
        .unwrap_or(0u64)
}

pub fn next_swap_id(env: &Env) -> u64 {
    let id = get_swap_count(env);
    env.storage().instance().set(&DataKey::NextSwapId, &(id + 1));
    bump_instance(env);
    id
}

pub fn is_globally_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::GlobalPause)
        .unwrap_or(false)
}

pub fn set_global_pause(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::GlobalPause, &paused);
}

pub fn is_pauser(env: &Env, who: &Address) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Pauser(who.clone()))
        .unwrap_or(false)
}

pub fn set_pauser(env: &Env, who: &Address, enabled: bool) {
    let key = DataKey::Pauser(who.clone());
    if enabled {
        env.storage().instance().set(&key, &true);
    } else {
        env.storage().instance().remove(&key);
    }
}

// ---------------------------------------------------------------------------
// Persistent storage
// ---------------------------------------------------------------------------

fn save_persistent<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

pub fn get_flag(env: &Env, key: &DataKey) -> bool {
    env.storage().persistent().get(key).unwrap_or(false)
}

pub fn set_flag(env: &Env, key: &DataKey, enabled: bool) {
    if enabled {
        save_persistent(env, key, &true);
    } else {
        env.storage().persistent().remove(key);
    }
}

pub fn load_stream(env: &Env, stream_id: u64) -> Result<Stream, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Stream(stream_id))
        .ok_or(ContractError::StreamNotFound)
}

pub fn save_stream(env: &Env, stream: &Stream) {
    save_persistent(env, &DataKey::Stream(stream.id), stream);
}

pub fn load_escrow(env: &Env, stream_id: u64) -> Result<Escrow, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Escrow(stream_id))
        .ok_or(ContractError::StreamNotFound)
}

pub fn save_escrow(env: &Env, stream_id: u64, escrow: &Escrow) {
    save_persistent(env, &DataKey::Escrow(stream_id), escrow);
}

pub fn load_modification(env: &Env, stream_id: u64) -> Option<ModificationProposal> {
    env.storage()
        .persistent()
        .get(&DataKey::Modification(stream_id))
}

pub fn save_modification(env: &Env, proposal: &ModificationProposal) {
    save_persistent(env, &DataKey::Modification(proposal.stream_id), proposal);
}

pub fn remove_modification(env: &Env, stream_id: u64) {
    env.storage()
        .persistent()
        .remove(&DataKey::Modification(stream_id));
}

pub fn load_swap(env: &Env, swap_id: u64) -> Result<SwapProposal, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Swap(swap_id))
        .ok_or(ContractError::SwapNotFound)
}

pub fn save_swap(env: &Env, swap: &SwapProposal) {
    save_persistent(env, &DataKey::Swap(swap.swap_id), swap);
}

pub fn executed_swap(env: &Env, stream_id: u64) -> Option<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::ExecutedSwap(stream_id))
}

pub fn record_executed_swap(env: &Env, stream_id: u64, swap_id: u64) {
    save_persistent(env, &DataKey::ExecutedSwap(stream_id), &swap_id);
}
