//! Account balances for the three assets the ledger moves
//!
//! `Native` pays anti-griefing deposits, `Collateral` is the yield-bearing
//! asset LPs post, and `Token` is the pegged asset this ledger issues. Native
//! and collateral enter through [`Bank::fund`], standing in for transfers
//! from outside the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::account::Address;
use crate::error::PreconditionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    Native,
    Collateral,
    Token,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    balances: BTreeMap<(Address, Asset), u128>,
}

impl Bank {
    pub fn balance(&self, account: &Address, asset: Asset) -> u128 {
        self.balances.get(&(*account, asset)).copied().unwrap_or(0)
    }

    pub fn fund(&mut self, account: &Address, asset: Asset, amount: u128) -> Result<(), PreconditionError> {
        self.credit(account, asset, amount)
    }

    pub fn credit(&mut self, account: &Address, asset: Asset, amount: u128) -> Result<(), PreconditionError> {
        if amount == 0 {
            return Ok(());
        }
        let entry = self.balances.entry((*account, asset)).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(PreconditionError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn debit(&mut self, account: &Address, asset: Asset, amount: u128) -> Result<(), PreconditionError> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.balance(account, asset);
        if available < amount {
            return Err(PreconditionError::InsufficientBalance {
                asset,
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(&(*account, asset));
        } else {
            self.balances.insert((*account, asset), remaining);
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        asset: Asset,
        amount: u128,
    ) -> Result<(), PreconditionError> {
        self.debit(from, asset, amount)?;
        self.credit(to, asset, amount)
    }
}
