//! Fixture targets.
//!
//! Each fixture comes with a `target_type()` describing it to the engine.
//! Mutable state sits behind `parking_lot` locks because dispatch only ever
//! hands targets a shared reference.

use parking_lot::Mutex;
use std::sync::Arc;
use surrogate_kernel::{ParamType, TargetError, TargetType, Value};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Counter
// ─────────────────────────────────────────────────────────────────────────────

pub struct Counter {
    total: Mutex<i64>,
}

impl Counter {
    pub const TYPE_NAME: &'static str = "demo::Counter";

    pub fn new(total: i64) -> Self {
        Self {
            total: Mutex::new(total),
        }
    }

    pub fn total(&self) -> i64 {
        *self.total.lock()
    }

    pub fn add(&self, amount: i64) -> i64 {
        let mut total = self.total.lock();
        *total += amount;
        *total
    }

    /// `total` field, `add(i64)` and `add(string)` overloads, private `secret`.
    pub fn target_type() -> Arc<TargetType> {
        TargetType::builder::<Counter>(Self::TYPE_NAME)
            .field("total", |c: &Counter| c.total())
            .private_field("secret", |_: &Counter| "c0ffee")
            .method("add", vec![ParamType::Int], |c: &Counter, args: &[Value]| {
                Ok(c.add(args[0].extract::<i64>()?))
            })
            .method("add", vec![ParamType::Str], |c: &Counter, args: &[Value]| {
                let amount: i64 = args[0].extract::<String>()?.trim().parse()?;
                Ok(c.add(amount))
            })
            .method("label", vec![], |c: &Counter, _: &[Value]| {
                Ok(format!("counter at {}", c.total()))
            })
            .build()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Math
// ─────────────────────────────────────────────────────────────────────────────

/// Static-only target.
pub struct Math;

impl Math {
    pub const TYPE_NAME: &'static str = "std::Math";

    pub fn target_type() -> Arc<TargetType> {
        TargetType::builder::<Math>(Self::TYPE_NAME)
            .static_field("PI", || std::f64::consts::PI)
            .static_method(
                "max",
                vec![ParamType::Int, ParamType::Int],
                |args: &[Value]| {
                    let a = args[0].extract::<i64>()?;
                    let b = args[1].extract::<i64>()?;
                    Ok(a.max(b))
                },
            )
            .static_method("abs", vec![ParamType::Int], |args: &[Value]| {
                Ok(args[0].extract::<i64>()?.abs())
            })
            .build()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger: Account extends Entity
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("amount must be positive, got {0}")]
    NonPositive(i64),
}

pub struct Entity {
    pub id: i64,
    pub label: String,
}

impl Entity {
    pub const TYPE_NAME: &'static str = "ledger::Entity";

    pub fn target_type() -> Arc<TargetType> {
        TargetType::builder::<Entity>(Self::TYPE_NAME)
            .field("id", |e: &Entity| e.id)
            .field("label", |e: &Entity| e.label.clone())
            .private_field("internal_ref", |e: &Entity| format!("ref-{}", e.id))
            .method("describe", vec![], |e: &Entity, _: &[Value]| {
                Ok(format!("{}#{}", e.label, e.id))
            })
            .build()
    }
}

pub struct Account {
    pub entity: Entity,
    balance: Mutex<i64>,
}

impl Account {
    pub const TYPE_NAME: &'static str = "ledger::Account";

    pub fn new(id: i64, label: impl Into<String>, balance: i64) -> Self {
        Self {
            entity: Entity {
                id,
                label: label.into(),
            },
            balance: Mutex::new(balance),
        }
    }

    pub fn balance(&self) -> i64 {
        *self.balance.lock()
    }

    pub fn withdraw(&self, amount: i64) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositive(amount));
        }
        let mut balance = self.balance.lock();
        if amount > *balance {
            return Err(LedgerError::InsufficientFunds {
                balance: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }

    /// Inherits the public members of [`Entity::target_type`].
    pub fn target_type() -> Arc<TargetType> {
        TargetType::builder::<Account>(Self::TYPE_NAME)
            .extends(Entity::target_type(), |a: &Account| &a.entity)
            .field("balance", |a: &Account| a.balance())
            .method(
                "withdraw",
                vec![ParamType::Int],
                |a: &Account, args: &[Value]| -> Result<i64, TargetError> {
                    Ok(a.withdraw(args[0].extract::<i64>()?)?)
                },
            )
            .private_method("audit", vec![], |a: &Account, _: &[Value]| {
                Ok(format!("audit:{}:{}", a.entity.id, a.balance()))
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdraw_guards_balance() {
        let account = Account::new(1, "ops", 10);
        assert_eq!(account.withdraw(4), Ok(6));
        assert_eq!(
            account.withdraw(7),
            Err(LedgerError::InsufficientFunds {
                balance: 6,
                requested: 7
            })
        );
        assert_eq!(account.withdraw(0), Err(LedgerError::NonPositive(0)));
    }

    #[test]
    fn fixture_types_describe_their_members() {
        let account = Account::target_type();
        assert_eq!(account.parent().unwrap().name(), Entity::TYPE_NAME);
        assert!(account.declared_method("withdraw", &[ParamType::Int]).is_some());
        assert!(Counter::target_type().declared_method("add", &[ParamType::Str]).is_some());
        assert!(Math::target_type().declared_field("PI").is_some());
    }
}
