//! All fund movement goes through here.
//!
//! Settlement computes amounts and moves them through the asset adapter; it
//! never persists anything. The ledger owns the stream and escrow records and
//! updates them around each call.

use soroban_sdk::{Address, Env};

use crate::asset::{Asset, AssetAdapter};
use crate::error::ContractError;
use crate::types::{AssetRef, CancelSplit, Escrow};

pub struct Settlement<'a> {
    asset: Asset<'a>,
}

impl<'a> Settlement<'a> {
    pub fn for_asset(env: &'a Env, asset: &AssetRef) -> Result<Self, ContractError> {
        Ok(Self {
            asset: Asset::resolve(env, asset)?,
        })
    }

    /// Takes `principal + fee` from the sender into custody and forwards the
    /// fee to the treasury.
    pub fn intake(
        &self,
        sender: &Address,
        principal: i128,
        fee: i128,
        treasury: &Address,
    ) -> Result<(), ContractError> {
        let gross = principal
            .checked_add(fee)
            .ok_or(ContractError::InvalidParameters)?;
        self.asset.debit(sender, gross)?;
        if fee > 0 {
            self.asset.credit(treasury, fee)?;
        }
        Ok(())
    }

    /// Additional funding agreed through a modification.
    pub fn top_up(&self, sender: &Address, amount: i128) -> Result<(), ContractError> {
        self.asset.debit(sender, amount)
    }

    pub fn pay_out(&self, recipient: &Address, amount: i128) -> Result<(), ContractError> {
        if amount > 0 {
            self.asset.credit(recipient, amount)?;
        }
        Ok(())
    }

    /// Pays the recipient what is available and refunds the rest of the
    /// custody balance to the sender.
    pub fn settle_cancellation(
        &self,
        sender: &Address,
        recipient: &Address,
        split: &CancelSplit,
    ) -> Result<(), ContractError> {
        self.pay_out(recipient, split.paid_to_recipient)?;
        if split.refunded_to_sender > 0 {
            self.asset.credit(sender, split.refunded_to_sender)?;
        }
        Ok(())
    }
}

/// Re-denominates a stream's custody after a swap: the sender deposits `held`
/// of `to` and receives the same number of units of `from` back. Amounts are
/// not converted.
pub fn exchange_custody(
    env: &Env,
    sender: &Address,
    from: &AssetRef,
    to: &AssetRef,
    held: i128,
) -> Result<(), ContractError> {
    if held <= 0 {
        return Ok(());
    }
    Settlement::for_asset(env, to)?.asset.debit(sender, held)?;
    Settlement::for_asset(env, from)?.pay_out(sender, held)
}

/// Divides the held balance at cancellation: `available` to the recipient,
/// everything else back to the sender.
pub fn cancellation_split(escrow: &Escrow, available: i128) -> CancelSplit {
    let held = escrow.held();
    let paid = available.clamp(0, held);
    CancelSplit {
        paid_to_recipient: paid,
        refunded_to_sender: held - paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_split_conserves_held_funds() {
        let escrow = Escrow {
            deposited: 1_000_000,
            withdrawn: 300_000,
            refunded: 0,
        };
        let split = cancellation_split(&escrow, 200_000);
        assert_eq!(split.paid_to_recipient, 200_000);
        assert_eq!(split.refunded_to_sender, 500_000);
        assert_eq!(
            split.paid_to_recipient + split.refunded_to_sender + escrow.withdrawn,
            escrow.deposited
        );
    }

    #[test]
    fn test_cancellation_split_never_pays_more_than_held() {
        let escrow = Escrow {
            deposited: 1_000,
            withdrawn: 900,
            refunded: 0,
        };
        let split = cancellation_split(&escrow, 5_000);
        assert_eq!(split.paid_to_recipient, 100);
        assert_eq!(split.refunded_to_sender, 0);
    }
}
