// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use super::{arg, id_for_account, id_for_category, optional_date, timestamp_or_now, unknown};
use crate::Ledger;
use crate::models::{CategoryType, Posting, TransactionFilter, TransactionType, User};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(ledger: &mut Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("income", sub)) => {
            let account_id = id_for_account(ledger, user, arg(sub, "account")?)?;
            let category_id =
                id_for_category(ledger, user, arg(sub, "category")?, Some(CategoryType::Income))?;
            let posting = ledger.record_income(
                user.id,
                account_id,
                category_id,
                parse_decimal(arg(sub, "amount")?)?,
                arg(sub, "desc")?,
                timestamp_or_now(sub)?,
            )?;
            report("income", &posting);
        }
        Some(("expense", sub)) => {
            let account_id = id_for_account(ledger, user, arg(sub, "account")?)?;
            let category_id = id_for_category(
                ledger,
                user,
                arg(sub, "category")?,
                Some(CategoryType::Expense),
            )?;
            let posting = ledger.record_expense(
                user.id,
                account_id,
                category_id,
                parse_decimal(arg(sub, "amount")?)?,
                arg(sub, "desc")?,
                timestamp_or_now(sub)?,
            )?;
            report("expense", &posting);
        }
        Some(("transfer", sub)) => {
            let source = id_for_account(ledger, user, arg(sub, "from")?)?;
            let dest = id_for_account(ledger, user, arg(sub, "to")?)?;
            let posting = ledger.record_transfer(
                user.id,
                source,
                dest,
                parse_decimal(arg(sub, "amount")?)?,
                arg(sub, "desc")?,
                timestamp_or_now(sub)?,
            )?;
            report("transfer", &posting);
        }
        Some(("list", sub)) => list(ledger, user, sub)?,
        _ => unknown("tx", m)?,
    }
    Ok(())
}

fn report(what: &str, posting: &Posting) {
    let balances = posting
        .accounts
        .iter()
        .map(|a| format!("{} = {}", a.name, fmt_money(&a.balance)))
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "Recorded {} #{} of {} ({})",
        what,
        posting.transaction.id,
        fmt_money(&posting.transaction.amount),
        balances
    );
}

fn list(ledger: &Ledger, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(ledger, user, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.timestamp.clone(),
                    r.kind.clone(),
                    r.account.clone(),
                    r.counter_account.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "When", "Type", "Account", "To", "Category", "Amount", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: String,
    pub counter_account: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

/// History rows for `tx list`, newest first, with names resolved.
pub fn query_rows(
    ledger: &Ledger,
    user: &User,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let mut filter = TransactionFilter {
        from: optional_date(sub, "from")?,
        to: optional_date(sub, "to")?,
        limit: sub.get_one::<usize>("limit").copied(),
        ..Default::default()
    };
    if let Some(name) = sub.get_one::<String>("account") {
        filter.account_id = Some(id_for_account(ledger, user, name)?);
    }
    if let Some(name) = sub.get_one::<String>("category") {
        filter.category_id = Some(id_for_category(ledger, user, name, None)?);
    }
    if let Some(kind) = sub.get_one::<String>("type") {
        filter.kind = Some(kind.parse::<TransactionType>()?);
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
    let name_of = |map: &HashMap<i64, String>, id: Option<i64>| {
        id.and_then(|id| map.get(&id).cloned()).unwrap_or_default()
    };

    Ok(ledger
        .transactions(user.id, &filter)?
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            timestamp: t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: t.kind.to_string(),
            account: name_of(&accounts, Some(t.account_id)),
            counter_account: name_of(&accounts, t.counter_account_id),
            category: name_of(&categories, t.category_id),
            amount: fmt_money(&t.amount),
            description: t.description,
        })
        .collect())
}
