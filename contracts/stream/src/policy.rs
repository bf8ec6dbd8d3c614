use soroban_sdk::{log, Address, Env};

use crate::error::ContractError;
use crate::storage::{self, BPS_DENOMINATOR, MAX_FEE_BPS};
use crate::types::{AssetRef, Config, DataKey};

/// Loads the config and requires the admin's authorization.
pub fn require_admin(env: &Env) -> Result<Config, ContractError> {
    let config = storage::get_config(env)?;
    config.admin.require_auth();
    Ok(config)
}

/// Admin or a member of the pauser set.
pub fn require_pauser(env: &Env, caller: &Address) -> Result<(), ContractError> {
    caller.require_auth();
    let config = storage::get_config(env)?;
    if *caller == config.admin || storage::is_pauser(env, caller) {
        Ok(())
    } else {
        Err(ContractError::Unauthorized)
    }
}

pub fn ensure_not_paused(env: &Env) -> Result<(), ContractError> {
    if storage::is_globally_paused(env) {
        return Err(ContractError::ContractPaused);
    }
    Ok(())
}

pub fn validate_fee(fee_bps: u32) -> Result<(), ContractError> {
    if fee_bps > MAX_FEE_BPS {
        return Err(ContractError::FeeTooHigh);
    }
    Ok(())
}

/// Fee charged on top of `amount`, rounded down.
pub fn calculate_fee(amount: i128, fee_bps: u32) -> Option<i128> {
    amount
        .checked_mul(fee_bps as i128)?
        .checked_div(BPS_DENOMINATOR)
}

/// Deny-list wins over allow-list.
pub fn ensure_asset_allowed(env: &Env, asset: &AssetRef) -> Result<(), ContractError> {
    if storage::get_flag(env, &DataKey::DeniedAsset(asset.clone())) {
        log!(env, "asset denied", asset.clone());
        return Err(ContractError::AssetDenied);
    }
    if !storage::get_flag(env, &DataKey::AllowedAsset(asset.clone())) {
        log!(env, "asset not allowed", asset.clone());
        return Err(ContractError::AssetNotAllowed);
    }
    Ok(())
}

pub fn set_allowed(env: &Env, asset: &AssetRef, allowed: bool) {
    storage::set_flag(env, &DataKey::AllowedAsset(asset.clone()), allowed);
}

pub fn set_denied(env: &Env, asset: &AssetRef, denied: bool) {
    storage::set_flag(env, &DataKey::DeniedAsset(asset.clone()), denied);
}
