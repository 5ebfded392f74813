// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use super::{arg, optional_date, unknown};
use crate::Ledger;
use crate::models::{TransactionFilter, User};
use crate::utils::fmt_money;

pub fn handle(ledger: &Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let format = arg(sub, "format")?.to_lowercase();
            let out = arg(sub, "out")?;
            let filter = TransactionFilter {
                from: optional_date(sub, "from")?,
                to: optional_date(sub, "to")?,
                ..Default::default()
            };
            let count = export_transactions(ledger, user, &filter, &format, Path::new(out))?;
            println!("Exported {} transaction(s) to {}", count, out);
            Ok(())
        }
        _ => unknown("export", m),
    }
}

#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: String,
    pub counter_account: Option<String>,
    pub category: Option<String>,
    pub goal_id: Option<i64>,
    pub amount: String,
    pub description: String,
}

/// Writes the user's history, oldest first, as `csv` or `json`.
pub fn export_transactions(
    ledger: &Ledger,
    user: &User,
    filter: &TransactionFilter,
    format: &str,
    out: &Path,
) -> Result<usize> {
    if format != "csv" && format != "json" {
        bail!("Unknown format: {} (use csv|json)", format);
    }
    let accounts: HashMap<i64, String> = ledger
        .accounts(user.id)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let categories: HashMap<i64, String> = ledger
        .categories(user.id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut history = ledger.transactions(user.id, filter)?;
    history.reverse();
    let rows: Vec<ExportRow> = history
        .into_iter()
        .map(|t| ExportRow {
            id: t.id,
            timestamp: t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: t.kind.to_string(),
            account: accounts.get(&t.account_id).cloned().unwrap_or_default(),
            counter_account: t.counter_account_id.and_then(|id| accounts.get(&id).cloned()),
            category: t.category_id.and_then(|id| categories.get(&id).cloned()),
            goal_id: t.goal_id,
            amount: fmt_money(&t.amount),
            description: t.description,
        })
        .collect();

    if format == "csv" {
        let mut wtr = csv::Writer::from_path(out)
            .with_context(|| format!("Failed to create {}", out.display()))?;
        for row in &rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&rows)?)
            .with_context(|| format!("Failed to write {}", out.display()))?;
    }
    Ok(rows.len())
}
