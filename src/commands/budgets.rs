// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::{Context, Result};

use super::{arg, date_or_today, id_for_category, optional_date, unknown};
use crate::models::{BudgetPeriod, BudgetStatus, CategoryType, User};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use crate::Ledger;

pub fn handle(ledger: &mut Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, user, sub)?,
        Some(("list", sub)) => list(ledger, user, sub)?,
        Some(("status", sub)) => {
            let statuses = ledger.evaluate_all(user.id, date_or_today(sub, "as-of")?)?;
            print_statuses(ledger, user, sub, &statuses)?;
        }
        Some(("preview", sub)) => {
            let category_id = id_for_category(
                ledger,
                user,
                arg(sub, "category")?,
                Some(CategoryType::Expense),
            )?;
            let statuses = ledger.preview_expense(
                user.id,
                category_id,
                parse_decimal(arg(sub, "amount")?)?,
                date_or_today(sub, "as-of")?,
            )?;
            if statuses.is_empty() && !sub.get_flag("json") && !sub.get_flag("jsonl") {
                println!("No budget covers this category");
            } else {
                print_statuses(ledger, user, sub, &statuses)?;
            }
        }
        Some(("prune", sub)) => {
            let removed = ledger.prune_expired_budgets(user.id, date_or_today(sub, "as-of")?)?;
            println!("Removed {} expired budget(s)", removed);
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<i64>("id").copied().context("missing budget id")?;
            ledger.delete_budget(user.id, id)?;
            println!("Removed budget #{}", id);
        }
        _ => unknown("budget", m)?,
    }
    Ok(())
}

fn add(ledger: &mut Ledger, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let category = arg(sub, "category")?;
    let category_id = id_for_category(ledger, user, category, Some(CategoryType::Expense))?;
    let period: BudgetPeriod = arg(sub, "period")?.parse()?;
    let warn = sub
        .get_one::<String>("warn")
        .map(|s| parse_decimal(s))
        .transpose()?;
    let budget = ledger.create_budget(
        user.id,
        category_id,
        parse_decimal(arg(sub, "limit")?)?,
        period,
        date_or_today(sub, "start")?,
        optional_date(sub, "end")?,
        warn,
    )?;
    println!(
        "Budget #{} set for {} / {} = {}",
        budget.id,
        category,
        budget.period,
        fmt_money(&budget.limit_amount)
    );
    Ok(())
}

fn category_names(ledger: &Ledger, user: &User) -> Result<HashMap<i64, String>> {
    Ok(ledger
        .categories(user.id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn list(ledger: &Ledger, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let budgets = ledger.budgets(user.id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        return Ok(());
    }
    let names = category_names(ledger, user)?;
    let data = budgets
        .iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                names.get(&b.category_id).cloned().unwrap_or_default(),
                b.period.to_string(),
                b.start_date.to_string(),
                b.end_date.map(|d| d.to_string()).unwrap_or_default(),
                fmt_money(&b.limit_amount),
                b.warn_threshold.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Category", "Period", "Start", "End", "Limit", "Warn at"],
            data
        )
    );
    Ok(())
}

fn print_statuses(
    ledger: &Ledger,
    user: &User,
    sub: &clap::ArgMatches,
    statuses: &[BudgetStatus],
) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &statuses)? {
        return Ok(());
    }
    let names = category_names(ledger, user)?;
    let data = statuses
        .iter()
        .map(|s| {
            vec![
                s.budget_id.to_string(),
                names.get(&s.category_id).cloned().unwrap_or_default(),
                format!("{} .. {}", s.window.start, s.window.end),
                fmt_money(&s.spent),
                fmt_money(&s.limit),
                fmt_money(&s.remaining),
                format!("{:.1}%", s.fraction_used * rust_decimal::Decimal::ONE_HUNDRED),
                s.state.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Category", "Window", "Spent", "Limit", "Remaining", "Used", "Status"],
            data
        )
    );
    Ok(())
}
