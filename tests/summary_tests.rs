// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use ledgerly::commands::doctor;
use ledgerly::models::AccountType;
use ledgerly::{Ledger, cli};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (Ledger, i64, i64, i64) {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let user = ledger
        .register_user("Ana", "ana@example.com", "hash", "salt")
        .unwrap()
        .id;
    let main = ledger
        .open_account(user, "Main", AccountType::Bank, d("1000"), ts("2025-02-20 08:00:00"))
        .unwrap()
        .id;
    let savings = ledger
        .open_account(user, "Rainy Day", AccountType::Savings, d("0"), ts("2025-02-20 08:00:00"))
        .unwrap()
        .id;
    (ledger, user, main, savings)
}

fn category(ledger: &Ledger, user: i64, name: &str) -> i64 {
    ledger.category_by_name(user, name, None).unwrap().unwrap().id
}

#[test]
fn balance_summary_covers_accounts_goals_and_month() {
    let (mut ledger, user, main, savings) = setup();
    let salary = category(&ledger, user, "Salary");
    let food = category(&ledger, user, "Food & Drink");
    ledger
        .record_income(user, main, salary, d("2500"), "", ts("2025-03-01 09:00:00"))
        .unwrap();
    ledger
        .record_expense(user, main, food, d("80"), "", ts("2025-03-02 19:00:00"))
        .unwrap();
    ledger
        .record_expense(user, main, food, d("20"), "", ts("2025-02-27 19:00:00"))
        .unwrap();
    ledger
        .record_transfer(user, main, savings, d("400"), "", ts("2025-03-03 09:00:00"))
        .unwrap();
    let goal = ledger.create_goal(user, "Trip", d("1000"), Some(main), None).unwrap();
    ledger
        .contribute(user, goal.id, None, d("150"), ts("2025-03-04 09:00:00"))
        .unwrap();

    let summary = ledger.balance_summary(user, day("2025-03-15")).unwrap();
    assert_eq!(summary.total_balance, d("3250"));
    assert_eq!(summary.savings_balance, d("400"));
    assert_eq!(summary.goal_savings, d("150"));
    assert_eq!(summary.month_income, d("2500"));
    assert_eq!(summary.month_expense, d("80"));
    assert_eq!(summary.accounts.len(), 4);
}

#[test]
fn spending_by_category_sorts_largest_first() {
    let (mut ledger, user, main, _) = setup();
    let food = category(&ledger, user, "Food & Drink");
    let transport = category(&ledger, user, "Transport");
    for (cat, amount) in [(food, "10"), (transport, "45"), (food, "15")] {
        ledger
            .record_expense(user, main, cat, d(amount), "", ts("2025-03-05 12:00:00"))
            .unwrap();
    }

    let spend = ledger
        .spending_by_category(user, day("2025-03-01"), day("2025-03-31"))
        .unwrap();
    assert_eq!(spend.len(), 2);
    assert_eq!(spend[0].name, "Transport");
    assert_eq!(spend[0].total, d("45"));
    assert_eq!(spend[1].total, d("25"));
    assert_eq!(spend[1].count, 2);
}

#[test]
fn audit_reports_tampered_balances() {
    let (mut ledger, user, main, savings) = setup();
    ledger
        .record_transfer(user, main, savings, d("100"), "", ts("2025-03-03 09:00:00"))
        .unwrap();
    assert!(ledger.audit(user).unwrap().is_empty());

    ledger
        .connection()
        .execute("UPDATE accounts SET balance = balance + 1 WHERE id = ?1", [savings])
        .unwrap();
    let found = ledger.audit(user).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, savings);
    assert_eq!(found[0].stored, d("100.01"));
    assert_eq!(found[0].derived, d("100"));

    let issues = doctor::collect(&ledger, None).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].user, "ana@example.com");
    assert_eq!(issues[0].name, "Rainy Day");
}

#[test]
fn doctor_command_fails_when_the_log_disagrees() {
    let (mut ledger, user, main, savings) = setup();
    ledger
        .record_transfer(user, main, savings, d("100"), "", ts("2025-03-03 09:00:00"))
        .unwrap();
    let matches = cli::build_cli().get_matches_from(["ledgerly", "doctor", "--json"]);
    let Some(("doctor", doctor_m)) = matches.subcommand() else {
        panic!("no doctor subcommand");
    };
    doctor::handle(&ledger, None, doctor_m).unwrap();

    ledger
        .connection()
        .execute("UPDATE accounts SET balance = balance - 5 WHERE id = ?1", [main])
        .unwrap();
    let err = doctor::handle(&ledger, None, doctor_m).unwrap_err();
    assert!(err.to_string().contains("1 issue(s) found"));
}
