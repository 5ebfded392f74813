// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::date_or_today;
use crate::Ledger;
use crate::models::User;
use crate::utils::{first_day_of_month, fmt_money, last_day_of_month, maybe_print_json, pretty_table};

pub fn handle(ledger: &Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    let as_of = date_or_today(m, "as-of")?;
    let json_flag = m.get_flag("json");
    let jsonl_flag = m.get_flag("jsonl");

    if m.get_flag("by-category") {
        let spend = ledger.spending_by_category(
            user.id,
            first_day_of_month(as_of),
            last_day_of_month(as_of),
        )?;
        if !maybe_print_json(json_flag, jsonl_flag, &spend)? {
            let data = spend
                .iter()
                .map(|s| vec![s.name.clone(), s.count.to_string(), fmt_money(&s.total)])
                .collect();
            println!("{}", pretty_table(&["Category", "Count", "Spent"], data));
        }
        return Ok(());
    }

    let summary = ledger.balance_summary(user.id, as_of)?;
    if maybe_print_json(json_flag, jsonl_flag, &summary)? {
        return Ok(());
    }
    let mut data: Vec<Vec<String>> = summary
        .accounts
        .iter()
        .map(|a| vec![a.name.clone(), a.account_type.to_string(), fmt_money(&a.balance)])
        .collect();
    data.push(vec!["Total".into(), String::new(), fmt_money(&summary.total_balance)]);
    println!("{}", pretty_table(&["Account", "Type", "Balance"], data));

    let month = as_of.format("%Y-%m").to_string();
    let totals = vec![
        vec!["Savings accounts".into(), fmt_money(&summary.savings_balance)],
        vec!["Held in goals".into(), fmt_money(&summary.goal_savings)],
        vec![format!("Income {}", month), fmt_money(&summary.month_income)],
        vec![format!("Expense {}", month), fmt_money(&summary.month_expense)],
        vec![
            format!("Net {}", month),
            fmt_money(&(summary.month_income - summary.month_expense)),
        ],
    ];
    println!("{}", pretty_table(&["Metric", "Amount"], totals));
    Ok(())
}
