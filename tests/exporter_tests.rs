// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use ledgerly::models::{AccountType, TransactionFilter, User};
use ledgerly::{Ledger, cli, commands::exporter};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::tempdir;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn setup() -> (Ledger, User) {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let user = ledger
        .register_user("Ana", "ana@example.com", "hash", "salt")
        .unwrap();
    let checking = ledger
        .open_account(user.id, "Checking", AccountType::Bank, d("200"), ts("2025-01-01 09:00:00"))
        .unwrap()
        .id;
    let wallet = ledger
        .account_by_name(user.id, "Cash Wallet")
        .unwrap()
        .unwrap()
        .id;
    let food = ledger
        .category_by_name(user.id, "Food & Drink", None)
        .unwrap()
        .unwrap()
        .id;
    ledger
        .record_expense(user.id, checking, food, d("12.34"), "Cafe, downtown", ts("2025-01-02 10:00:00"))
        .unwrap();
    ledger
        .record_transfer(user.id, checking, wallet, d("50"), "", ts("2025-01-03 10:00:00"))
        .unwrap();
    (ledger, user)
}

#[test]
fn export_transactions_as_csv_oldest_first() {
    let (ledger, user) = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("tx.csv");

    let count = exporter::export_transactions(
        &ledger,
        &user,
        &TransactionFilter::default(),
        "csv",
        &out,
    )
    .unwrap();
    assert_eq!(count, 3);

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        [
            "id",
            "timestamp",
            "type",
            "account",
            "counter_account",
            "category",
            "goal_id",
            "amount",
            "description"
        ]
    );
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][2], "Income");
    assert_eq!(&records[1][5], "Food & Drink");
    assert_eq!(&records[1][7], "12.34");
    assert_eq!(&records[1][8], "Cafe, downtown");
    assert_eq!(&records[2][2], "Transfer");
    assert_eq!(&records[2][4], "Cash Wallet");
}

#[test]
fn export_transactions_streams_pretty_json() {
    let (ledger, user) = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("tx.json");
    let out_str = out.to_str().unwrap();

    let matches = cli::build_cli().get_matches_from([
        "ledgerly",
        "export",
        "transactions",
        "--format",
        "JSON",
        "--out",
        out_str,
        "--from",
        "2025-01-02",
    ]);
    let Some(("export", export_m)) = matches.subcommand() else {
        panic!("no export subcommand");
    };
    exporter::handle(&ledger, &user, export_m).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains('\n'));
    let items: Value = serde_json::from_str(&text).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["type"], "Expense");
    assert_eq!(items[0]["amount"], "12.34");
    assert_eq!(items[1]["counter_account"], "Cash Wallet");
    assert_eq!(items[1]["category"], Value::Null);
}

#[test]
fn unknown_export_format_is_rejected() {
    let (ledger, user) = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("tx.xml");
    let err = exporter::export_transactions(
        &ledger,
        &user,
        &TransactionFilter::default(),
        "xml",
        &out,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Unknown format"));
    assert!(!out.exists());
}
