//! Uniform debit/credit over the native asset and registered external tokens.
//!
//! `debit` moves funds from an account into ledger custody (this contract's
//! address); `credit` pays out of custody. Only the settlement module calls
//! the mutating half of this interface.

use soroban_sdk::{log, token::TokenClient, Address, Env};

use crate::error::ContractError;
use crate::storage;
use crate::types::{AssetMetadata, AssetRef};

pub trait AssetAdapter {
    fn debit(&self, from: &Address, amount: i128) -> Result<(), ContractError>;
    fn credit(&self, to: &Address, amount: i128) -> Result<(), ContractError>;
    fn balance_of(&self, account: &Address) -> Result<i128, ContractError>;
}

/// The network's native asset contract. Trusted: transfer failures abort the
/// invocation directly.
pub struct NativeAsset<'a> {
    env: &'a Env,
    token: TokenClient<'a>,
}

impl<'a> NativeAsset<'a> {
    pub fn new(env: &'a Env, contract: &Address) -> Self {
        Self {
            env,
            token: TokenClient::new(env, contract),
        }
    }
}

impl AssetAdapter for NativeAsset<'_> {
    fn debit(&self, from: &Address, amount: i128) -> Result<(), ContractError> {
        ensure_covered(self.env, self.balance_of(from)?, amount)?;
        self.token
            .transfer(from, &self.env.current_contract_address(), &amount);
        Ok(())
    }

    fn credit(&self, to: &Address, amount: i128) -> Result<(), ContractError> {
        self.token
            .transfer(&self.env.current_contract_address(), to, &amount);
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Result<i128, ContractError> {
        Ok(self.token.balance(account))
    }
}

/// A registered third-party token. Every call is a `try_` invocation so a
/// misbehaving contract surfaces as `AssetTransferFailed`.
pub struct ExternalAsset<'a> {
    env: &'a Env,
    token: TokenClient<'a>,
}

impl<'a> ExternalAsset<'a> {
    pub fn new(env: &'a Env, contract: &Address) -> Self {
        Self {
            env,
            token: TokenClient::new(env, contract),
        }
    }

    fn transfer(&self, from: &Address, to: &Address, amount: i128) -> Result<(), ContractError> {
        match self.token.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => {
                log!(
                    self.env,
                    "external transfer rejected",
                    self.token.address,
                    amount
                );
                Err(ContractError::AssetTransferFailed)
            }
        }
    }
}

impl AssetAdapter for ExternalAsset<'_> {
    fn debit(&self, from: &Address, amount: i128) -> Result<(), ContractError> {
        ensure_covered(self.env, self.balance_of(from)?, amount)?;
        self.transfer(from, &self.env.current_contract_address(), amount)
    }

    fn credit(&self, to: &Address, amount: i128) -> Result<(), ContractError> {
        self.transfer(&self.env.current_contract_address(), to, amount)
    }

    fn balance_of(&self, account: &Address) -> Result<i128, ContractError> {
        match self.token.try_balance(account) {
            Ok(Ok(balance)) => Ok(balance),
            _ => Err(ContractError::AssetTransferFailed),
        }
    }
}

/// Adapter for a stream's asset reference.
pub enum Asset<'a> {
    Native(NativeAsset<'a>),
    External(ExternalAsset<'a>),
}

impl<'a> Asset<'a> {
    pub fn resolve(env: &'a Env, asset: &AssetRef) -> Result<Self, ContractError> {
        Ok(match asset {
            AssetRef::Native => {
                let config = storage::get_config(env)?;
                Asset::Native(NativeAsset::new(env, &config.native_asset))
            }
            AssetRef::External(contract) => Asset::External(ExternalAsset::new(env, contract)),
        })
    }
}

impl AssetAdapter for Asset<'_> {
    fn debit(&self, from: &Address, amount: i128) -> Result<(), ContractError> {
        match self {
            Asset::Native(native) => native.debit(from, amount),
            Asset::External(external) => external.debit(from, amount),
        }
    }

    fn credit(&self, to: &Address, amount: i128) -> Result<(), ContractError> {
        match self {
            Asset::Native(native) => native.credit(to, amount),
            Asset::External(external) => external.credit(to, amount),
        }
    }

    fn balance_of(&self, account: &Address) -> Result<i128, ContractError> {
        match self {
            Asset::Native(native) => native.balance_of(account),
            Asset::External(external) => external.balance_of(account),
        }
    }
}

fn ensure_covered(env: &Env, balance: i128, amount: i128) -> Result<(), ContractError> {
    if balance < amount {
        log!(env, "insufficient balance for debit", balance, amount);
        return Err(ContractError::InsufficientBalance);
    }
    Ok(())
}

/// Reads name, symbol and decimals through the token interface. Contracts
/// that do not answer all three cannot be streamed.
pub fn read_metadata(env: &Env, contract: &Address) -> Result<AssetMetadata, ContractError> {
    let token = TokenClient::new(env, contract);
    let name = match token.try_name() {
        Ok(Ok(name)) => name,
        _ => return Err(ContractError::AssetNonConforming),
    };
    let symbol = match token.try_symbol() {
        Ok(Ok(symbol)) => symbol,
        _ => return Err(ContractError::AssetNonConforming),
    };
    let decimals = match token.try_decimals() {
        Ok(Ok(decimals)) => decimals,
        _ => return Err(ContractError::AssetNonConforming),
    };
    Ok(AssetMetadata {
        name,
        symbol,
        decimals,
    })
}
