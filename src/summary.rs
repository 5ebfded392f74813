// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side aggregates over balances and the transaction log.

use chrono::{Days, NaiveDate, NaiveTime};
use rusqlite::params;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;

use crate::error::{Entity, LedgerResult};
use crate::ledger::Ledger;
use crate::models::{Account, AccountType};
use crate::utils::{first_day_of_month, from_minor, last_day_of_month};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub total_balance: Decimal,
    pub savings_balance: Decimal,
    pub goal_savings: Decimal,
    pub month_income: Decimal,
    pub month_expense: Decimal,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category_id: i64,
    pub name: String,
    pub total: Decimal,
    pub count: i64,
}

/// A stored amount that disagrees with the sum of its log records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub entity: String,
    pub id: i64,
    pub name: String,
    pub stored: Decimal,
    pub derived: Decimal,
}

impl Ledger {
    pub fn balance_summary(&self, user_id: i64, as_of: NaiveDate) -> LedgerResult<BalanceSummary> {
        let snapshot = self.conn.unchecked_transaction()?;
        let mut stmt = snapshot.prepare(&format!(
            "SELECT {} FROM accounts WHERE user_id = ?1 ORDER BY name",
            Account::COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], Account::from_row)?;
        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        drop(stmt);

        let total_balance: Decimal = accounts.iter().map(|a| a.balance).sum();
        let savings_balance: Decimal = accounts
            .iter()
            .filter(|a| a.account_type == AccountType::Savings)
            .map(|a| a.balance)
            .sum();

        let goal_minor: i64 = snapshot.query_row(
            "SELECT COALESCE(SUM(current_amount), 0) FROM saving_goals
             WHERE user_id = ?1 AND status != 'Converted'",
            params![user_id],
            |r| r.get(0),
        )?;

        let from = first_day_of_month(as_of).and_time(NaiveTime::MIN);
        let month_end = last_day_of_month(as_of);
        let until = month_end
            .checked_add_days(Days::new(1))
            .unwrap_or(month_end)
            .and_time(NaiveTime::MIN);
        let (income, expense): (i64, i64) = snapshot.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN type = 'Income' AND category_id IS NOT NULL THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = 'Expense' THEN amount ELSE 0 END), 0)
             FROM transactions WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp < ?3",
            params![user_id, from, until],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(BalanceSummary {
            total_balance,
            savings_balance,
            goal_savings: from_minor(goal_minor),
            month_income: from_minor(income),
            month_expense: from_minor(expense),
            accounts,
        })
    }

    /// Expense totals per category over `[from, to]`, largest first.
    pub fn spending_by_category(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<CategorySpend>> {
        let until = to.checked_add_days(Days::new(1)).unwrap_or(to);
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, SUM(t.amount) AS total, COUNT(*) AS n
             FROM transactions t JOIN categories c ON c.id = t.category_id
             WHERE t.user_id = ?1 AND t.type = 'Expense'
               AND t.timestamp >= ?2 AND t.timestamp < ?3
             GROUP BY c.id, c.name
             ORDER BY total DESC, c.name",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                from.and_time(NaiveTime::MIN),
                until.and_time(NaiveTime::MIN)
            ],
            |r| {
                Ok(CategorySpend {
                    category_id: r.get(0)?,
                    name: r.get(1)?,
                    total: from_minor(r.get(2)?),
                    count: r.get(3)?,
                })
            },
        )?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }

    /// Recomputes account balances and goal amounts from the log.
    pub fn audit(&self, user_id: i64) -> LedgerResult<Vec<Discrepancy>> {
        let snapshot = self.conn.unchecked_transaction()?;
        let mut found = Vec::new();

        let mut stmt = snapshot.prepare(
            "SELECT a.id, a.name, a.balance,
                COALESCE((SELECT SUM(CASE
                    WHEN t.type = 'Income' AND t.account_id = a.id THEN t.amount
                    WHEN t.type = 'Transfer' AND t.counter_account_id = a.id THEN t.amount
                    WHEN t.account_id = a.id THEN -t.amount
                    ELSE 0 END)
                  FROM transactions t
                  WHERE t.account_id = a.id OR t.counter_account_id = a.id), 0)
             FROM accounts a WHERE a.user_id = ?1 ORDER BY a.id",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
            ))
        })?;
        for row in rows {
            let (id, name, stored, derived) = row?;
            if stored != derived {
                found.push(discrepancy(Entity::Account, id, name, stored, derived));
            }
        }
        drop(stmt);

        let mut stmt = snapshot.prepare(
            "SELECT g.id, g.name, g.current_amount,
                COALESCE((SELECT SUM(t.amount) FROM transactions t
                  WHERE t.goal_id = g.id AND t.type = 'GoalContribution'), 0)
             FROM saving_goals g WHERE g.user_id = ?1 ORDER BY g.id",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
            ))
        })?;
        for row in rows {
            let (id, name, stored, derived) = row?;
            if stored != derived {
                found.push(discrepancy(Entity::Goal, id, name, stored, derived));
            }
        }

        Ok(found)
    }
}

fn discrepancy(entity: Entity, id: i64, name: String, stored: i64, derived: i64) -> Discrepancy {
    let d = Discrepancy {
        entity: entity.to_string(),
        id,
        name,
        stored: from_minor(stored),
        derived: from_minor(derived),
    };
    error!(entity = %d.entity, id, stored = %d.stored, derived = %d.derived, "stored amount disagrees with log");
    d
}
