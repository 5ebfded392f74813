// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::{arg, id_for_account, timestamp_or_now, unknown};
use crate::Ledger;
use crate::models::{AccountType, User};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(ledger: &mut Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg(sub, "name")?;
            let kind: AccountType = arg(sub, "type")?.parse()?;
            let opening = parse_decimal(arg(sub, "opening")?)?;
            let account =
                ledger.open_account(user.id, name, kind, opening, timestamp_or_now(sub)?)?;
            println!(
                "Added account '{}' ({}, balance {})",
                account.name,
                account.account_type,
                fmt_money(&account.balance)
            );
        }
        Some(("list", sub)) => {
            let accounts = ledger.accounts(user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let data = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            a.account_type.to_string(),
                            fmt_money(&a.balance),
                            a.created_at.format("%Y-%m-%d").to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Name", "Type", "Balance", "Created"], data)
                );
            }
        }
        Some(("rm", sub)) => {
            let name = arg(sub, "name")?;
            let account_id = id_for_account(ledger, user, name)?;
            ledger.delete_account(user.id, account_id)?;
            println!("Removed account '{}'", name);
        }
        _ => unknown("account", m)?,
    }
    Ok(())
}
