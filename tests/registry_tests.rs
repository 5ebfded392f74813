// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use ledgerly::models::{AccountType, BudgetPeriod, CategoryType, TransactionFilter, TransactionType};
use ledgerly::{Entity, Ledger, LedgerError, RuleViolation, ValidationError};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn setup() -> (Ledger, i64) {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let user = ledger
        .register_user("Ana", "ana@example.com", "hash", "salt")
        .unwrap()
        .id;
    (ledger, user)
}

fn open(ledger: &mut Ledger, user: i64, name: &str, balance: &str) -> i64 {
    ledger
        .open_account(user, name, AccountType::Cash, d(balance), ts("2025-01-01 08:00:00"))
        .unwrap()
        .id
}

#[test]
fn new_users_get_starter_accounts_and_categories() {
    let (ledger, user) = setup();
    let accounts = ledger.accounts(user).unwrap();
    let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["Cash Wallet", "My Bank Account"]);
    assert!(accounts.iter().all(|a| a.balance.is_zero()));

    let categories = ledger.categories(user).unwrap();
    assert_eq!(categories.len(), 5);
    let income: Vec<_> = categories
        .iter()
        .filter(|c| c.category_type == CategoryType::Income)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(income, ["Salary"]);
}

#[test]
fn seeding_can_be_disabled() {
    let mut ledger = Ledger::open_in_memory().unwrap();
    ledger.set_setting("seed_defaults", "false").unwrap();
    let user = ledger
        .register_user("Bare", "bare@example.com", "h", "s")
        .unwrap()
        .id;
    assert!(ledger.accounts(user).unwrap().is_empty());
    assert!(ledger.categories(user).unwrap().is_empty());
}

#[test]
fn emails_are_validated_and_unique_ignoring_case() {
    let (mut ledger, _) = setup();
    let err = ledger
        .register_user("Ana 2", "ANA@example.com", "h", "s")
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::DuplicateName {
            entity: Entity::User,
            ..
        })
    ));
    let err = ledger
        .register_user("Nope", "not-an-email", "h", "s")
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::InvalidEmail(_))
    ));
    assert!(ledger.find_user_by_email("Ana@Example.com").unwrap().is_some());
}

#[test]
fn credentials_are_stored_as_given() {
    let (mut ledger, user) = setup();
    assert_eq!(
        ledger.credentials(user).unwrap(),
        ("hash".to_string(), "salt".to_string())
    );
    ledger.update_credentials(user, "hash2", "salt2").unwrap();
    assert_eq!(ledger.credentials(user).unwrap().0, "hash2");
    assert!(matches!(
        ledger.update_credentials(999, "x", "y").unwrap_err(),
        LedgerError::NotFound { .. }
    ));
}

#[test]
fn account_limit_and_unique_names() {
    let (mut ledger, user) = setup();
    open(&mut ledger, user, "Third", "0");
    let err = ledger
        .open_account(user, "Third", AccountType::Bank, Decimal::ZERO, ts("2025-01-01 08:00:00"))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::DuplicateName {
            entity: Entity::Account,
            ..
        })
    ));

    open(&mut ledger, user, "Fourth", "0");
    open(&mut ledger, user, "Fifth", "0");
    let err = ledger
        .open_account(user, "Sixth", AccountType::Bank, Decimal::ZERO, ts("2025-01-01 08:00:00"))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::AccountLimitExceeded { max: 5 })
    ));
    assert_eq!(ledger.accounts(user).unwrap().len(), 5);
}

#[test]
fn opening_balance_is_logged_as_uncategorized_income() {
    let (mut ledger, user) = setup();
    let id = open(&mut ledger, user, "Piggy", "42.50");
    let history = ledger
        .transactions(
            user,
            &TransactionFilter {
                account_id: Some(id),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionType::Income);
    assert_eq!(history[0].category_id, None);
    assert_eq!(history[0].amount, d("42.50"));
    assert!(ledger.audit(user).unwrap().is_empty());
}

#[test]
fn names_are_trimmed_and_bounded() {
    let (mut ledger, user) = setup();
    let account = ledger
        .open_account(user, "  Travel  ", AccountType::Savings, Decimal::ZERO, ts("2025-01-01 08:00:00"))
        .unwrap();
    assert_eq!(account.name, "Travel");

    let long = "x".repeat(101);
    let err = ledger
        .create_category(user, &long, CategoryType::Expense)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::NameTooLong { max: 100, .. })
    ));
}

#[test]
fn category_names_are_unique_per_type() {
    let (mut ledger, user) = setup();
    ledger
        .create_category(user, "Transport", CategoryType::Income)
        .unwrap();
    let err = ledger
        .create_category(user, "Transport", CategoryType::Expense)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::DuplicateName {
            entity: Entity::Category,
            ..
        })
    ));
    let found = ledger
        .category_by_name(user, "Transport", Some(CategoryType::Income))
        .unwrap()
        .unwrap();
    assert_eq!(found.category_type, CategoryType::Income);
}

#[test]
fn restrict_policy_keeps_accounts_with_history() {
    let (mut ledger, user) = setup();
    let used = open(&mut ledger, user, "Used", "10");
    let err = ledger.delete_account(user, used).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::AccountHasHistory { transactions: 1, .. })
    ));

    let empty = open(&mut ledger, user, "Empty", "0");
    ledger.delete_account(user, empty).unwrap();
    assert!(ledger.account(user, empty).is_err());
}

#[test]
fn cascade_policy_drops_own_entries_but_not_transfers() {
    let (mut ledger, user) = setup();
    ledger.set_setting("account_delete_policy", "cascade").unwrap();
    let food = ledger
        .category_by_name(user, "Food & Drink", None)
        .unwrap()
        .unwrap()
        .id;

    let solo = open(&mut ledger, user, "Solo", "50");
    ledger
        .record_expense(user, solo, food, d("20"), "", ts("2025-01-02 08:00:00"))
        .unwrap();
    ledger.delete_account(user, solo).unwrap();
    let left = ledger
        .transactions(
            user,
            &TransactionFilter {
                account_id: Some(solo),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(left.is_empty());

    let a = open(&mut ledger, user, "A", "50");
    let b = open(&mut ledger, user, "B", "0");
    ledger
        .record_transfer(user, a, b, d("5"), "", ts("2025-01-02 09:00:00"))
        .unwrap();
    let err = ledger.delete_account(user, b).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::AccountHasHistory { .. })
    ));
    assert!(ledger.audit(user).unwrap().is_empty());
}

#[test]
fn categories_in_use_cannot_be_deleted() {
    let (mut ledger, user) = setup();
    let account = open(&mut ledger, user, "Main", "100");
    let food = ledger
        .category_by_name(user, "Food & Drink", None)
        .unwrap()
        .unwrap()
        .id;
    ledger
        .record_expense(user, account, food, d("10"), "", ts("2025-01-02 08:00:00"))
        .unwrap();
    let err = ledger.delete_category(user, food).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::CategoryInUse { transactions: 1, .. })
    ));
}

#[test]
fn budgets_block_category_delete_unless_cascading() {
    let (mut ledger, user) = setup();
    let travel = ledger
        .create_category(user, "Travel", CategoryType::Expense)
        .unwrap()
        .id;
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    ledger
        .create_budget(user, travel, d("300"), BudgetPeriod::Monthly, start, None, None)
        .unwrap();

    let err = ledger.delete_category(user, travel).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::CategoryInUse { budgets: 1, .. })
    ));

    ledger.set_setting("category_delete_policy", "cascade").unwrap();
    ledger.delete_category(user, travel).unwrap();
    assert!(ledger.budgets(user).unwrap().is_empty());
    assert!(ledger.category(user, travel).is_err());
}

#[test]
fn deleting_a_user_removes_only_their_data() {
    let (mut ledger, ana) = setup();
    let bob = ledger
        .register_user("Bob", "bob@example.com", "h", "s")
        .unwrap()
        .id;
    let a = open(&mut ledger, ana, "A", "100");
    let b = open(&mut ledger, ana, "B", "0");
    ledger
        .record_transfer(ana, a, b, d("30"), "", ts("2025-01-02 08:00:00"))
        .unwrap();
    ledger.create_goal(ana, "Goal", d("100"), Some(a), None).unwrap();
    open(&mut ledger, bob, "Bob's", "5");

    ledger.delete_user(ana).unwrap();
    assert!(ledger.find_user_by_email("ana@example.com").unwrap().is_none());
    assert!(ledger.accounts(ana).unwrap().is_empty());
    assert!(ledger
        .transactions(ana, &TransactionFilter::default())
        .unwrap()
        .is_empty());
    assert_eq!(ledger.accounts(bob).unwrap().len(), 3);
    assert!(matches!(
        ledger.delete_user(ana).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
}
