// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use ledgerly::budget::{classify, resolve_window};
use ledgerly::models::{
    AccountType, Budget, BudgetPeriod, BudgetState, BudgetWindow, CategoryType, TransactionFilter,
};
use ledgerly::{Ledger, LedgerError, RuleViolation, ValidationError};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

struct Fixture {
    ledger: Ledger,
    user: i64,
    account: i64,
    food: i64,
    transport: i64,
}

fn setup() -> Fixture {
    let mut ledger = Ledger::open_in_memory().unwrap();
    let user = ledger
        .register_user("Ana", "ana@example.com", "hash", "salt")
        .unwrap()
        .id;
    let account = ledger
        .open_account(user, "Main", AccountType::Bank, d("1000"), ts("2025-01-01 08:00:00"))
        .unwrap()
        .id;
    let food = ledger
        .category_by_name(user, "Food & Drink", None)
        .unwrap()
        .unwrap()
        .id;
    let transport = ledger
        .category_by_name(user, "Transport", None)
        .unwrap()
        .unwrap()
        .id;
    Fixture {
        ledger,
        user,
        account,
        food,
        transport,
    }
}

impl Fixture {
    fn spend(&mut self, category: i64, amount: &str, at: &str) {
        self.ledger
            .record_expense(self.user, self.account, category, d(amount), "", ts(at))
            .unwrap();
    }

    fn monthly(&mut self, category: i64, limit: &str, warn: Option<&str>) -> i64 {
        self.ledger
            .create_budget(
                self.user,
                category,
                d(limit),
                BudgetPeriod::Monthly,
                day("2025-01-01"),
                None,
                warn.map(d),
            )
            .unwrap()
            .id
    }
}

fn budget(period: BudgetPeriod, start: &str, end: Option<&str>) -> Budget {
    Budget {
        id: 1,
        user_id: 1,
        category_id: 1,
        limit_amount: d("100"),
        period,
        start_date: day(start),
        end_date: end.map(day),
        warn_threshold: d("0.8"),
    }
}

#[test]
fn monthly_budget_reaches_warning_at_threshold() {
    let mut f = setup();
    let id = f.monthly(f.food, "200", Some("0.85"));
    f.spend(f.food, "100", "2025-03-05 12:00:00");
    f.spend(f.food, "70", "2025-03-12 19:30:00");

    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-20")).unwrap();
    assert_eq!(status.spent, d("170"));
    assert_eq!(status.remaining, d("30"));
    assert_eq!(status.fraction_used, d("0.85"));
    assert_eq!(status.state, BudgetState::Warning);
    assert_eq!(
        status.window,
        BudgetWindow {
            start: day("2025-03-01"),
            end: day("2025-03-31"),
        }
    );
}

#[test]
fn spending_the_full_limit_is_exceeded() {
    let mut f = setup();
    let id = f.monthly(f.food, "200", None);
    f.spend(f.food, "150", "2025-03-05 12:00:00");
    f.spend(f.food, "50", "2025-03-06 12:00:00");

    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-07")).unwrap();
    assert_eq!(status.state, BudgetState::Exceeded);
    assert_eq!(status.remaining, Decimal::ZERO);

    f.spend(f.food, "25", "2025-03-07 12:00:00");
    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-07")).unwrap();
    assert_eq!(status.remaining, d("-25"));
    assert_eq!(status.state, BudgetState::Exceeded);
}

#[test]
fn only_matching_category_inside_the_window_counts() {
    let mut f = setup();
    let id = f.monthly(f.food, "200", None);
    f.spend(f.food, "40", "2025-02-28 23:59:59");
    f.spend(f.food, "10", "2025-03-01 00:00:00");
    f.spend(f.transport, "90", "2025-03-10 08:00:00");
    f.spend(f.food, "15", "2025-03-31 23:59:59");
    f.spend(f.food, "60", "2025-04-01 00:00:00");

    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-15")).unwrap();
    assert_eq!(status.spent, d("25"));
    assert_eq!(status.state, BudgetState::Ok);
}

#[test]
fn evaluation_is_repeatable_and_read_only() {
    let mut f = setup();
    f.monthly(f.food, "200", None);
    f.monthly(f.transport, "50", None);
    f.spend(f.food, "120", "2025-03-05 12:00:00");
    f.spend(f.transport, "45", "2025-03-05 13:00:00");
    let before = f
        .ledger
        .transactions(f.user, &TransactionFilter::default())
        .unwrap()
        .len();

    let first = f.ledger.evaluate_all(f.user, day("2025-03-20")).unwrap();
    let second = f.ledger.evaluate_all(f.user, day("2025-03-20")).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].state, BudgetState::Warning);
    assert_eq!(
        f.ledger
            .transactions(f.user, &TransactionFilter::default())
            .unwrap()
            .len(),
        before
    );
}

#[test]
fn preview_adds_the_prospective_expense_without_recording_it() {
    let mut f = setup();
    let id = f.monthly(f.food, "200", Some("0.85"));
    f.spend(f.food, "150", "2025-03-05 12:00:00");

    let preview = f
        .ledger
        .preview_expense(f.user, f.food, d("60"), day("2025-03-20"))
        .unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].spent, d("210"));
    assert_eq!(preview[0].state, BudgetState::Exceeded);

    let actual = f.ledger.evaluate_budget(f.user, id, day("2025-03-20")).unwrap();
    assert_eq!(actual.spent, d("150"));
    assert_eq!(f.ledger.account(f.user, f.account).unwrap().balance, d("850"));

    let none = f
        .ledger
        .preview_expense(f.user, f.transport, d("60"), day("2025-03-20"))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn weekly_windows_step_from_the_start_date() {
    let b = budget(BudgetPeriod::Weekly, "2025-03-03", None);
    assert_eq!(
        resolve_window(&b, day("2025-03-12")),
        BudgetWindow {
            start: day("2025-03-10"),
            end: day("2025-03-16"),
        }
    );
    assert_eq!(resolve_window(&b, day("2025-03-03")).start, day("2025-03-03"));
    assert_eq!(resolve_window(&b, day("2025-03-09")).end, day("2025-03-09"));
    assert_eq!(
        resolve_window(&b, day("2025-03-01")),
        BudgetWindow {
            start: day("2025-02-24"),
            end: day("2025-03-02"),
        }
    );
}

#[test]
fn monthly_yearly_and_custom_windows() {
    let monthly = budget(BudgetPeriod::Monthly, "2024-01-15", None);
    assert_eq!(
        resolve_window(&monthly, day("2024-02-10")),
        BudgetWindow {
            start: day("2024-02-01"),
            end: day("2024-02-29"),
        }
    );
    let yearly = budget(BudgetPeriod::Yearly, "2024-06-01", None);
    assert_eq!(
        resolve_window(&yearly, day("2025-07-04")),
        BudgetWindow {
            start: day("2025-01-01"),
            end: day("2025-12-31"),
        }
    );
    let custom = budget(BudgetPeriod::Custom, "2025-03-10", Some("2025-03-20"));
    assert_eq!(
        resolve_window(&custom, day("2025-05-01")),
        BudgetWindow {
            start: day("2025-03-10"),
            end: day("2025-03-20"),
        }
    );
}

#[test]
fn custom_budget_includes_its_last_day() {
    let mut f = setup();
    let id = f
        .ledger
        .create_budget(
            f.user,
            f.food,
            d("100"),
            BudgetPeriod::Custom,
            day("2025-03-10"),
            Some(day("2025-03-20")),
            None,
        )
        .unwrap()
        .id;
    f.spend(f.food, "30", "2025-03-09 23:59:59");
    f.spend(f.food, "20", "2025-03-10 00:00:00");
    f.spend(f.food, "60", "2025-03-20 23:59:59");
    f.spend(f.food, "5", "2025-03-21 00:00:00");

    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-15")).unwrap();
    assert_eq!(status.spent, d("80"));
    assert_eq!(status.state, BudgetState::Warning);
}

#[test]
fn budget_shape_is_validated() {
    let mut f = setup();
    let err = f
        .ledger
        .create_budget(f.user, f.food, d("100"), BudgetPeriod::Custom, day("2025-03-10"), None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::CustomPeriodNeedsEndDate)
    ));

    let err = f
        .ledger
        .create_budget(
            f.user,
            f.food,
            d("100"),
            BudgetPeriod::Custom,
            day("2025-03-10"),
            Some(day("2025-03-01")),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::EndBeforeStart { .. })
    ));

    for bad in ["0", "1.5"] {
        let err = f
            .ledger
            .create_budget(
                f.user,
                f.food,
                d("100"),
                BudgetPeriod::Monthly,
                day("2025-03-01"),
                None,
                Some(d(bad)),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::InvalidThreshold(_))
        ));
    }

    let salary = f
        .ledger
        .category_by_name(f.user, "Salary", Some(CategoryType::Income))
        .unwrap()
        .unwrap()
        .id;
    let err = f
        .ledger
        .create_budget(f.user, salary, d("100"), BudgetPeriod::Monthly, day("2025-03-01"), None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rule(RuleViolation::CategoryMismatch { .. })
    ));
    assert!(f.ledger.budgets(f.user).unwrap().is_empty());
}

#[test]
fn default_threshold_comes_from_config() {
    let mut f = setup();
    f.ledger.set_setting("default_warn_threshold", "0.5").unwrap();
    let id = f.monthly(f.food, "100", None);
    assert_eq!(f.ledger.budget(f.user, id).unwrap().warn_threshold, d("0.5"));
}

#[test]
fn prune_removes_only_finished_custom_budgets() {
    let mut f = setup();
    f.monthly(f.food, "200", None);
    f.ledger
        .create_budget(
            f.user,
            f.transport,
            d("80"),
            BudgetPeriod::Custom,
            day("2025-02-01"),
            Some(day("2025-02-28")),
            None,
        )
        .unwrap();
    f.ledger
        .create_budget(
            f.user,
            f.transport,
            d("80"),
            BudgetPeriod::Custom,
            day("2025-03-01"),
            Some(day("2025-03-31")),
            None,
        )
        .unwrap();

    assert_eq!(f.ledger.prune_expired_budgets(f.user, day("2025-03-01")).unwrap(), 1);
    assert_eq!(f.ledger.budgets(f.user).unwrap().len(), 2);
    assert_eq!(f.ledger.prune_expired_budgets(f.user, day("2025-03-01")).unwrap(), 0);
}

#[test]
fn delete_budget_is_scoped_to_owner() {
    let mut f = setup();
    let id = f.monthly(f.food, "200", None);
    let bob = f
        .ledger
        .register_user("Bob", "bob@example.com", "h", "s")
        .unwrap()
        .id;
    assert!(matches!(
        f.ledger.delete_budget(bob, id).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
    f.ledger.delete_budget(f.user, id).unwrap();
    assert!(f.ledger.budget(f.user, id).is_err());
}

#[test]
fn classification_thresholds() {
    let warn = d("0.85");
    assert_eq!(classify(d("0.84995"), warn), BudgetState::Ok);
    assert_eq!(classify(d("0.85"), warn), BudgetState::Warning);
    assert_eq!(classify(d("0.99995"), warn), BudgetState::Warning);
    assert_eq!(classify(d("1"), warn), BudgetState::Exceeded);
    assert_eq!(classify(d("0.5"), Decimal::ONE), BudgetState::Ok);
}

#[test]
fn state_agrees_with_reported_fraction_just_below_threshold() {
    let mut f = setup();
    let big = f
        .ledger
        .open_account(f.user, "Big", AccountType::Bank, d("20000"), ts("2025-01-01 08:00:00"))
        .unwrap()
        .id;
    let id = f
        .ledger
        .create_budget(
            f.user,
            f.food,
            d("10000"),
            BudgetPeriod::Monthly,
            day("2025-01-01"),
            None,
            None,
        )
        .unwrap()
        .id;
    f.ledger
        .record_expense(f.user, big, f.food, d("7999.99"), "", ts("2025-03-05 12:00:00"))
        .unwrap();

    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-20")).unwrap();
    assert_eq!(status.fraction_used, d("0.799999"));
    assert_eq!(status.state, BudgetState::Ok);
    assert_eq!(classify(status.fraction_used, d("0.8")), status.state);

    f.ledger
        .record_expense(f.user, big, f.food, d("0.01"), "", ts("2025-03-06 12:00:00"))
        .unwrap();
    let status = f.ledger.evaluate_budget(f.user, id, day("2025-03-20")).unwrap();
    assert_eq!(status.fraction_used, d("0.8"));
    assert_eq!(status.state, BudgetState::Warning);
}
