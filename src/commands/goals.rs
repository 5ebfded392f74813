// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use super::{arg, date_or_today, id_for_account, optional_date, timestamp_or_now, unknown};
use crate::goals::{GoalDeletion, progress_of};
use crate::models::{AccountType, User};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use crate::Ledger;

fn goal_id(sub: &clap::ArgMatches) -> Result<i64> {
    sub.get_one::<i64>("id").copied().context("missing goal id")
}

pub fn handle(ledger: &mut Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let linked = sub
                .get_one::<String>("account")
                .map(|name| id_for_account(ledger, user, name))
                .transpose()?;
            let goal = ledger.create_goal(
                user.id,
                arg(sub, "name")?,
                parse_decimal(arg(sub, "target")?)?,
                linked,
                optional_date(sub, "deadline")?,
            )?;
            println!(
                "Created saving goal #{} '{}' targeting {}",
                goal.id,
                goal.name,
                fmt_money(&goal.target_amount)
            );
        }
        Some(("contribute", sub)) => {
            let source = sub
                .get_one::<String>("account")
                .map(|name| id_for_account(ledger, user, name))
                .transpose()?;
            let outcome = ledger.contribute(
                user.id,
                goal_id(sub)?,
                source,
                parse_decimal(arg(sub, "amount")?)?,
                timestamp_or_now(sub)?,
            )?;
            if let Some(goal) = &outcome.posting.goal {
                println!(
                    "Contributed {} to '{}' ({} of {})",
                    fmt_money(&outcome.posting.transaction.amount),
                    goal.name,
                    fmt_money(&goal.current_amount),
                    fmt_money(&goal.target_amount)
                );
                if outcome.completed {
                    println!("Goal '{}' reached its target", goal.name);
                }
            }
        }
        Some(("convert", sub)) => {
            let kind: AccountType = arg(sub, "type")?.parse()?;
            let conversion = ledger.convert_to_account(
                user.id,
                goal_id(sub)?,
                kind,
                sub.get_one::<String>("name").map(String::as_str),
                timestamp_or_now(sub)?,
            )?;
            println!(
                "Converted goal '{}' into account '{}' with balance {}",
                conversion.goal.name,
                conversion.account.name,
                fmt_money(&conversion.account.balance)
            );
        }
        Some(("rm", sub)) => {
            let deletion = if sub.get_flag("forfeit") {
                GoalDeletion::ForfeitFunds
            } else {
                GoalDeletion::RequireEmpty
            };
            let id = goal_id(sub)?;
            ledger.delete_goal(user.id, id, deletion)?;
            println!("Removed saving goal #{}", id);
        }
        Some(("list", sub)) => {
            let today = date_or_today(sub, "as-of")?;
            let progress: Vec<_> = ledger
                .goals(user.id)?
                .iter()
                .map(|g| progress_of(g, today))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &progress)? {
                let data = progress
                    .iter()
                    .map(|p| {
                        vec![
                            p.goal_id.to_string(),
                            p.name.clone(),
                            p.status.to_string(),
                            format!("{} / {}", fmt_money(&p.current), fmt_money(&p.target)),
                            format!("{:.1}%", p.fraction * rust_decimal::Decimal::ONE_HUNDRED),
                            p.days_remaining.map(|d| d.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Status", "Saved", "Progress", "Days left"], data)
                );
            }
        }
        _ => unknown("goal", m)?,
    }
    Ok(())
}
