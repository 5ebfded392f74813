// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget engine. Spend is always recomputed from the transaction log; the
//! read side never writes.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, TimeDelta};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{Entity, LedgerError, LedgerResult, RuleViolation};
use crate::ledger::{Ledger, begin, load_category, reject};
use crate::models::{Budget, BudgetPeriod, BudgetState, BudgetStatus, BudgetWindow, CategoryType};
use crate::utils::{first_day_of_month, from_minor, last_day_of_month};
use crate::validation;

/// Resolves the day range `budget` covers on `as_of`.
pub fn resolve_window(budget: &Budget, as_of: NaiveDate) -> BudgetWindow {
    match budget.period {
        BudgetPeriod::Monthly => BudgetWindow {
            start: first_day_of_month(as_of),
            end: last_day_of_month(as_of),
        },
        BudgetPeriod::Weekly => {
            let weeks = (as_of - budget.start_date).num_days().div_euclid(7);
            let start = budget
                .start_date
                .checked_add_signed(TimeDelta::days(weeks * 7))
                .unwrap_or(budget.start_date);
            let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
            BudgetWindow { start, end }
        }
        BudgetPeriod::Yearly => BudgetWindow {
            start: NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of),
            end: NaiveDate::from_ymd_opt(as_of.year(), 12, 31).unwrap_or(as_of),
        },
        BudgetPeriod::Custom => BudgetWindow {
            start: budget.start_date,
            end: budget.end_date.unwrap_or(budget.start_date),
        },
    }
}

/// State for a spend ratio. Callers pass the same `fraction_used` they report.
pub fn classify(fraction_used: Decimal, warn_threshold: Decimal) -> BudgetState {
    if fraction_used >= Decimal::ONE {
        BudgetState::Exceeded
    } else if fraction_used >= warn_threshold {
        BudgetState::Warning
    } else {
        BudgetState::Ok
    }
}

fn status_of(budget: &Budget, window: BudgetWindow, spent: Decimal) -> BudgetStatus {
    let fraction_used = spent / budget.limit_amount;
    BudgetStatus {
        budget_id: budget.id,
        category_id: budget.category_id,
        window,
        spent,
        limit: budget.limit_amount,
        remaining: budget.limit_amount - spent,
        fraction_used,
        state: classify(fraction_used, budget.warn_threshold),
    }
}

/// Expense total for a category inside `window`, in minor units.
fn spent_in(
    conn: &Connection,
    user_id: i64,
    category_id: i64,
    window: BudgetWindow,
) -> LedgerResult<i64> {
    let from = window.start.and_time(NaiveTime::MIN);
    let until = window
        .end
        .checked_add_days(Days::new(1))
        .unwrap_or(window.end)
        .and_time(NaiveTime::MIN);
    let spent: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE user_id = ?1 AND category_id = ?2 AND type = 'Expense'
           AND timestamp >= ?3 AND timestamp < ?4",
        params![user_id, category_id, from, until],
        |r| r.get(0),
    )?;
    Ok(spent)
}

fn load_budget(conn: &Connection, user_id: i64, budget_id: i64) -> LedgerResult<Budget> {
    conn.query_row(
        &format!(
            "SELECT {} FROM budgets WHERE id = ?1 AND user_id = ?2",
            Budget::COLUMNS
        ),
        params![budget_id, user_id],
        Budget::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(Entity::Budget, budget_id))
}

fn query_budgets(
    conn: &Connection,
    user_id: i64,
    category_id: Option<i64>,
) -> LedgerResult<Vec<Budget>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM budgets WHERE user_id = ?1 AND (?2 IS NULL OR category_id = ?2) ORDER BY id",
        Budget::COLUMNS
    ))?;
    let rows = stmt.query_map(params![user_id, category_id], Budget::from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn evaluate_with(
    conn: &Connection,
    user_id: i64,
    budget: &Budget,
    as_of: NaiveDate,
) -> LedgerResult<BudgetStatus> {
    let window = resolve_window(budget, as_of);
    debug!(budget_id = budget.id, start = %window.start, end = %window.end, "resolved budget window");
    let spent = spent_in(conn, user_id, budget.category_id, window)?;
    Ok(status_of(budget, window, from_minor(spent)))
}

impl Ledger {
    #[allow(clippy::too_many_arguments)]
    pub fn create_budget(
        &mut self,
        user_id: i64,
        category_id: i64,
        limit_amount: Decimal,
        period: BudgetPeriod,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        warn_threshold: Option<Decimal>,
    ) -> LedgerResult<Budget> {
        let (limit, threshold) = validation::budget(
            limit_amount,
            period,
            start_date,
            end_date,
            warn_threshold.unwrap_or(self.config.default_warn_threshold),
            self.config.max_amount,
        )?;

        let tx = begin(&mut self.conn)?;
        let category = load_category(&tx, user_id, category_id)?;
        if category.category_type != CategoryType::Expense {
            return Err(reject(RuleViolation::CategoryMismatch {
                category_id: category.id,
                expected: CategoryType::Expense,
                actual: category.category_type,
            }));
        }
        let end_date = if period == BudgetPeriod::Custom { end_date } else { None };
        tx.execute(
            "INSERT INTO budgets(user_id, category_id, limit_amount, period, start_date, end_date, warn_threshold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                category.id,
                limit,
                period,
                start_date,
                end_date,
                threshold.to_string()
            ],
        )?;
        let budget = load_budget(&tx, user_id, tx.last_insert_rowid())?;
        tx.commit()?;

        info!(user_id, budget_id = budget.id, category_id, %period, limit = %limit_amount, "created budget");
        Ok(budget)
    }

    pub fn delete_budget(&mut self, user_id: i64, budget_id: i64) -> LedgerResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM budgets WHERE id = ?1 AND user_id = ?2",
            params![budget_id, user_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found(Entity::Budget, budget_id));
        }
        info!(user_id, budget_id, "deleted budget");
        Ok(())
    }

    pub fn budget(&self, user_id: i64, budget_id: i64) -> LedgerResult<Budget> {
        load_budget(&self.conn, user_id, budget_id)
    }

    pub fn budgets(&self, user_id: i64) -> LedgerResult<Vec<Budget>> {
        query_budgets(&self.conn, user_id, None)
    }

    pub fn evaluate_budget(
        &self,
        user_id: i64,
        budget_id: i64,
        as_of: NaiveDate,
    ) -> LedgerResult<BudgetStatus> {
        let snapshot = self.conn.unchecked_transaction()?;
        let budget = load_budget(&snapshot, user_id, budget_id)?;
        evaluate_with(&snapshot, user_id, &budget, as_of)
    }

    pub fn evaluate_all(&self, user_id: i64, as_of: NaiveDate) -> LedgerResult<Vec<BudgetStatus>> {
        let snapshot = self.conn.unchecked_transaction()?;
        query_budgets(&snapshot, user_id, None)?
            .iter()
            .map(|b| evaluate_with(&snapshot, user_id, b, as_of))
            .collect()
    }

    /// Status of each budget on `category_id` as if an expense of `amount`
    /// were recorded on `as_of`. Nothing is written.
    pub fn preview_expense(
        &self,
        user_id: i64,
        category_id: i64,
        amount: Decimal,
        as_of: NaiveDate,
    ) -> LedgerResult<Vec<BudgetStatus>> {
        let extra = validation::amount("amount", amount, self.config.max_amount)?;
        let snapshot = self.conn.unchecked_transaction()?;
        let category = load_category(&snapshot, user_id, category_id)?;
        let mut out = Vec::new();
        for budget in query_budgets(&snapshot, user_id, Some(category.id))? {
            let window = resolve_window(&budget, as_of);
            let mut spent = spent_in(&snapshot, user_id, category.id, window)?;
            if window.contains(as_of) {
                spent += extra;
            }
            out.push(status_of(&budget, window, from_minor(spent)));
        }
        Ok(out)
    }

    /// Removes Custom budgets whose range ended before `as_of`.
    pub fn prune_expired_budgets(&mut self, user_id: i64, as_of: NaiveDate) -> LedgerResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM budgets WHERE user_id = ?1 AND period = 'Custom' AND end_date < ?2",
            params![user_id, as_of],
        )?;
        info!(user_id, removed, "pruned expired budgets");
        Ok(removed)
    }
}
