// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger policy knobs, persisted in the `settings` table.

use std::fmt;
use std::str::FromStr;

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult, ValidationError};

/// What happens to dependent rows when a referenced entity is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeletePolicy {
    #[default]
    Restrict,
    Cascade,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Restrict => f.write_str("restrict"),
            DeletePolicy::Cascade => f.write_str("cascade"),
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restrict" => Ok(DeletePolicy::Restrict),
            "cascade" => Ok(DeletePolicy::Cascade),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on any single amount, guards against typos.
    pub max_amount: Decimal,
    pub max_name_length: usize,
    pub max_description_length: usize,
    pub max_accounts_per_user: usize,
    pub allow_negative_balance: bool,
    pub account_delete_policy: DeletePolicy,
    pub category_delete_policy: DeletePolicy,
    pub default_warn_threshold: Decimal,
    /// Create starter accounts and categories for newly registered users.
    pub seed_defaults: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            max_amount: Decimal::new(99_999_999_999, 2),
            max_name_length: 100,
            max_description_length: 200,
            max_accounts_per_user: 5,
            allow_negative_balance: false,
            account_delete_policy: DeletePolicy::Restrict,
            category_delete_policy: DeletePolicy::Restrict,
            default_warn_threshold: Decimal::new(8, 1),
            seed_defaults: true,
        }
    }
}

/// Highest value `max_amount` may take: 999 999 999 999.99. Keeps running
/// balances far inside `i64` cents.
pub fn max_amount_ceiling() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

impl LedgerConfig {
    pub const KEYS: [&'static str; 9] = [
        "max_amount",
        "max_name_length",
        "max_description_length",
        "max_accounts_per_user",
        "allow_negative_balance",
        "account_delete_policy",
        "category_delete_policy",
        "default_warn_threshold",
        "seed_defaults",
    ];

    /// Defaults overlaid with whatever the `settings` table holds.
    pub fn load(conn: &Connection) -> LedgerResult<Self> {
        let mut cfg = LedgerConfig::default();
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let mut rows = stmt.query([])?;
        while let Some(r) = rows.next()? {
            let key: String = r.get(0)?;
            let value: String = r.get(1)?;
            match cfg.apply(&key, &value) {
                Ok(()) => {}
                Err(ValidationError::UnknownSetting(_)) => {
                    tracing::debug!(%key, "ignoring unrelated setting");
                }
                Err(e) => {
                    return Err(LedgerError::Integrity(format!("stored setting: {}", e)));
                }
            }
        }
        Ok(cfg)
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let invalid = || ValidationError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        let v = value.trim();
        match key {
            "max_amount" => {
                let d = v.parse::<Decimal>().map_err(|_| invalid())?;
                if d <= Decimal::ZERO || d > max_amount_ceiling() || d.normalize().scale() > 2 {
                    return Err(invalid());
                }
                self.max_amount = d;
            }
            "max_name_length" => self.max_name_length = parse_positive(v).ok_or_else(invalid)?,
            "max_description_length" => {
                self.max_description_length = parse_positive(v).ok_or_else(invalid)?
            }
            "max_accounts_per_user" => {
                self.max_accounts_per_user = parse_positive(v).ok_or_else(invalid)?
            }
            "allow_negative_balance" => {
                self.allow_negative_balance = v.parse().map_err(|_| invalid())?
            }
            "account_delete_policy" => {
                self.account_delete_policy = v.parse().map_err(|_| invalid())?
            }
            "category_delete_policy" => {
                self.category_delete_policy = v.parse().map_err(|_| invalid())?
            }
            "default_warn_threshold" => {
                let d = v.parse::<Decimal>().map_err(|_| invalid())?;
                if d <= Decimal::ZERO || d > Decimal::ONE {
                    return Err(invalid());
                }
                self.default_warn_threshold = d;
            }
            "seed_defaults" => self.seed_defaults = v.parse().map_err(|_| invalid())?,
            _ => return Err(ValidationError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let v = match key {
            "max_amount" => self.max_amount.to_string(),
            "max_name_length" => self.max_name_length.to_string(),
            "max_description_length" => self.max_description_length.to_string(),
            "max_accounts_per_user" => self.max_accounts_per_user.to_string(),
            "allow_negative_balance" => self.allow_negative_balance.to_string(),
            "account_delete_policy" => self.account_delete_policy.to_string(),
            "category_delete_policy" => self.category_delete_policy.to_string(),
            "default_warn_threshold" => self.default_warn_threshold.to_string(),
            "seed_defaults" => self.seed_defaults.to_string(),
            _ => return None,
        };
        Some(v)
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|k| self.get(k).map(|v| (*k, v)))
            .collect()
    }
}

fn parse_positive(v: &str) -> Option<usize> {
    v.parse::<usize>().ok().filter(|n| *n > 0)
}

pub(crate) fn store_setting(conn: &Connection, key: &str, value: &str) -> LedgerResult<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}
