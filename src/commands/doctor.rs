// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use crate::Ledger;
use crate::models::User;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Debug, Serialize)]
pub struct Issue {
    pub user: String,
    pub entity: String,
    pub id: i64,
    pub name: String,
    pub stored: String,
    pub derived: String,
}

/// Audits one user, or every user when none is selected.
pub fn collect(ledger: &Ledger, user: Option<&User>) -> Result<Vec<Issue>> {
    let users = match user {
        Some(u) => vec![u.clone()],
        None => ledger.users()?,
    };
    let mut issues = Vec::new();
    for u in &users {
        for d in ledger.audit(u.id)? {
            issues.push(Issue {
                user: u.email.clone(),
                entity: d.entity,
                id: d.id,
                name: d.name,
                stored: fmt_money(&d.stored),
                derived: fmt_money(&d.derived),
            });
        }
    }
    Ok(issues)
}

pub fn handle(ledger: &Ledger, user: Option<&User>, m: &clap::ArgMatches) -> Result<()> {
    let issues = collect(ledger, user)?;
    let found = issues.len();
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &issues)? {
        if issues.is_empty() {
            println!("doctor: no issues found");
        } else {
            let rows = issues
                .into_iter()
                .map(|i| vec![i.user, i.entity, i.id.to_string(), i.name, i.stored, i.derived])
                .collect();
            println!(
                "{}",
                pretty_table(&["User", "Entity", "ID", "Name", "Stored", "From log"], rows)
            );
        }
    }
    if found > 0 {
        anyhow::bail!("doctor: {} issue(s) found", found);
    }
    Ok(())
}
