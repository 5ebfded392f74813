// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger store: account balances plus the append-only transaction log.
//!
//! Every mutation runs inside one immediate SQLite transaction. Balances are
//! only ever changed in the same unit as the log row that justifies them, so
//! a failed step rolls both back together when the transaction is dropped.

use std::path::Path;

use chrono::{Days, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, OptionalExtension, ToSql, TransactionBehavior, params};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::{DeletePolicy, LedgerConfig, store_setting};
use crate::db;
use crate::error::{Entity, LedgerError, LedgerResult, RuleViolation};
use crate::goals;
use crate::models::{
    Account, Category, CategoryType, GoalStatus, Posting, SavingGoal, Transaction,
    TransactionFilter, TransactionType,
};
use crate::validation;

/// Handle to one ledger database. Mutating methods take `&mut self`, which
/// serializes all writes through a single owner.
pub struct Ledger {
    pub(crate) conn: Connection,
    pub(crate) config: LedgerConfig,
}

impl Ledger {
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> LedgerResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> LedgerResult<Self> {
        db::init_schema(&conn)?;
        let config = LedgerConfig::load(&conn)?;
        Ok(Ledger { conn, config })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validates and persists one setting, then applies it to this handle.
    pub fn set_setting(&mut self, key: &str, value: &str) -> LedgerResult<()> {
        let mut next = self.config.clone();
        next.apply(key, value)?;
        store_setting(&self.conn, key, value)?;
        self.config = next;
        info!(%key, %value, "setting updated");
        Ok(())
    }

    pub fn record_income(
        &mut self,
        user_id: i64,
        account_id: i64,
        category_id: i64,
        amount: Decimal,
        description: &str,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<Posting> {
        let minor = validation::amount("amount", amount, self.config.max_amount)?;
        let description = validation::description(description, self.config.max_description_length)?;

        let tx = begin(&mut self.conn)?;
        let account = load_account(&tx, user_id, account_id)?;
        let category = load_category(&tx, user_id, category_id)?;
        expect_category(&category, CategoryType::Income)?;

        adjust_balance(&tx, account.id, minor)?;
        let transaction = append(
            &tx,
            &NewEntry {
                user_id,
                account_id: account.id,
                counter_account_id: None,
                category_id: Some(category.id),
                goal_id: None,
                kind: TransactionType::Income,
                amount: minor,
                description,
                timestamp,
            },
        )?;
        let accounts = vec![load_account(&tx, user_id, account.id)?];
        tx.commit()?;

        info!(user_id, account_id, txn_id = transaction.id, amount = %amount, "recorded income");
        Ok(Posting {
            transaction,
            accounts,
            goal: None,
        })
    }

    pub fn record_expense(
        &mut self,
        user_id: i64,
        account_id: i64,
        category_id: i64,
        amount: Decimal,
        description: &str,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<Posting> {
        let minor = validation::amount("amount", amount, self.config.max_amount)?;
        let description = validation::description(description, self.config.max_description_length)?;

        let tx = begin(&mut self.conn)?;
        let account = load_account(&tx, user_id, account_id)?;
        let category = load_category(&tx, user_id, category_id)?;
        expect_category(&category, CategoryType::Expense)?;
        ensure_funds(&self.config, &account, amount)?;

        adjust_balance(&tx, account.id, -minor)?;
        let transaction = append(
            &tx,
            &NewEntry {
                user_id,
                account_id: account.id,
                counter_account_id: None,
                category_id: Some(category.id),
                goal_id: None,
                kind: TransactionType::Expense,
                amount: minor,
                description,
                timestamp,
            },
        )?;
        let accounts = vec![load_account(&tx, user_id, account.id)?];
        tx.commit()?;

        info!(user_id, account_id, txn_id = transaction.id, amount = %amount, "recorded expense");
        Ok(Posting {
            transaction,
            accounts,
            goal: None,
        })
    }

    /// Moves funds between two accounts of the same user as one log record.
    pub fn record_transfer(
        &mut self,
        user_id: i64,
        source_account_id: i64,
        dest_account_id: i64,
        amount: Decimal,
        description: &str,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<Posting> {
        validation::transfer_endpoints(source_account_id, dest_account_id)?;
        let minor = validation::amount("amount", amount, self.config.max_amount)?;
        let description = validation::description(description, self.config.max_description_length)?;

        let tx = begin(&mut self.conn)?;
        let source = load_account(&tx, user_id, source_account_id)?;
        let dest = load_account(&tx, user_id, dest_account_id)?;
        ensure_funds(&self.config, &source, amount)?;

        adjust_balance(&tx, source.id, -minor)?;
        adjust_balance(&tx, dest.id, minor)?;
        let transaction = append(
            &tx,
            &NewEntry {
                user_id,
                account_id: source.id,
                counter_account_id: Some(dest.id),
                category_id: None,
                goal_id: None,
                kind: TransactionType::Transfer,
                amount: minor,
                description,
                timestamp,
            },
        )?;
        let accounts = vec![
            load_account(&tx, user_id, source.id)?,
            load_account(&tx, user_id, dest.id)?,
        ];
        tx.commit()?;

        info!(
            user_id,
            source_account_id,
            dest_account_id,
            txn_id = transaction.id,
            amount = %amount,
            "recorded transfer"
        );
        Ok(Posting {
            transaction,
            accounts,
            goal: None,
        })
    }

    /// Debits the source account and credits the goal. Completion is
    /// detected inside the same unit.
    pub fn record_goal_contribution(
        &mut self,
        user_id: i64,
        goal_id: i64,
        source_account_id: i64,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<Posting> {
        let minor = validation::amount("amount", amount, self.config.max_amount)?;

        let tx = begin(&mut self.conn)?;
        let goal = load_goal(&tx, user_id, goal_id)?;
        if goal.status != GoalStatus::Active {
            return Err(reject(RuleViolation::GoalNotActive {
                goal_id: goal.id,
                status: goal.status,
            }));
        }
        let account = load_account(&tx, user_id, source_account_id)?;
        ensure_funds(&self.config, &account, amount)?;

        adjust_balance(&tx, account.id, -minor)?;
        tx.execute(
            "UPDATE saving_goals SET current_amount = current_amount + ?1 WHERE id = ?2",
            params![minor, goal.id],
        )?;
        let description = format!("Contribution to {}", goal.name);
        let transaction = append(
            &tx,
            &NewEntry {
                user_id,
                account_id: account.id,
                counter_account_id: None,
                category_id: None,
                goal_id: Some(goal.id),
                kind: TransactionType::GoalContribution,
                amount: minor,
                description: &description,
                timestamp,
            },
        )?;
        let completed = goals::settle_completion(&tx, goal.id, timestamp)?;
        let accounts = vec![load_account(&tx, user_id, account.id)?];
        let goal = load_goal(&tx, user_id, goal.id)?;
        tx.commit()?;

        info!(
            user_id,
            goal_id,
            source_account_id,
            txn_id = transaction.id,
            amount = %amount,
            completed,
            "recorded goal contribution"
        );
        Ok(Posting {
            transaction,
            accounts,
            goal: Some(goal),
        })
    }

    /// Removes an account. Under `Restrict` any history blocks deletion.
    /// `Cascade` drops the account's own income and expense rows but still
    /// refuses when transfers or goal contributions reference it.
    pub fn delete_account(&mut self, user_id: i64, account_id: i64) -> LedgerResult<()> {
        let policy = self.config.account_delete_policy;
        let tx = begin(&mut self.conn)?;
        let account = load_account(&tx, user_id, account_id)?;

        let (own, linked): (i64, i64) = tx.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN type IN ('Income','Expense') AND account_id = ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type IN ('Transfer','GoalContribution') THEN 1 ELSE 0 END), 0)
             FROM transactions WHERE account_id = ?1 OR counter_account_id = ?1",
            params![account.id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        match policy {
            DeletePolicy::Restrict if own + linked > 0 => {
                return Err(reject(RuleViolation::AccountHasHistory {
                    account_id: account.id,
                    transactions: own + linked,
                }));
            }
            DeletePolicy::Cascade if linked > 0 => {
                return Err(reject(RuleViolation::AccountHasHistory {
                    account_id: account.id,
                    transactions: linked,
                }));
            }
            DeletePolicy::Cascade => {
                tx.execute(
                    "DELETE FROM transactions WHERE account_id = ?1 AND type IN ('Income','Expense')",
                    params![account.id],
                )?;
            }
            DeletePolicy::Restrict => {}
        }
        tx.execute(
            "DELETE FROM accounts WHERE id = ?1 AND user_id = ?2",
            params![account.id, user_id],
        )?;
        tx.commit()?;

        info!(user_id, account_id, cascaded = own, %policy, "deleted account");
        Ok(())
    }

    pub fn transaction(&self, user_id: i64, transaction_id: i64) -> LedgerResult<Transaction> {
        load_transaction(&self.conn, user_id, transaction_id)
    }

    /// Transaction history, newest first.
    pub fn transactions(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<Transaction>> {
        let mut sql = format!(
            "SELECT {} FROM transactions WHERE user_id = ?",
            Transaction::COLUMNS
        );
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];

        if let Some(account_id) = filter.account_id {
            sql.push_str(" AND (account_id = ? OR counter_account_id = ?)");
            values.push(Box::new(account_id));
            values.push(Box::new(account_id));
        }
        if let Some(category_id) = filter.category_id {
            sql.push_str(" AND category_id = ?");
            values.push(Box::new(category_id));
        }
        if let Some(goal_id) = filter.goal_id {
            sql.push_str(" AND goal_id = ?");
            values.push(Box::new(goal_id));
        }
        if let Some(kind) = filter.kind {
            sql.push_str(" AND type = ?");
            values.push(Box::new(kind));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND timestamp >= ?");
            values.push(Box::new(from.and_time(NaiveTime::MIN)));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND timestamp < ?");
            let next = to.checked_add_days(Days::new(1)).unwrap_or(to);
            values.push(Box::new(next.and_time(NaiveTime::MIN)));
        }
        sql.push_str(" ORDER BY timestamp DESC, id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), Transaction::from_row)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }
}

/// Row to append to the log. `amount` is in minor units.
pub(crate) struct NewEntry<'a> {
    pub user_id: i64,
    pub account_id: i64,
    pub counter_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub goal_id: Option<i64>,
    pub kind: TransactionType,
    pub amount: i64,
    pub description: &'a str,
    pub timestamp: NaiveDateTime,
}

pub(crate) fn begin(conn: &mut Connection) -> LedgerResult<rusqlite::Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

pub(crate) fn append(conn: &Connection, e: &NewEntry<'_>) -> LedgerResult<Transaction> {
    conn.execute(
        "INSERT INTO transactions(user_id, account_id, counter_account_id, category_id, goal_id, type, amount, description, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            e.user_id,
            e.account_id,
            e.counter_account_id,
            e.category_id,
            e.goal_id,
            e.kind,
            e.amount,
            e.description,
            e.timestamp
        ],
    )?;
    load_transaction(conn, e.user_id, conn.last_insert_rowid())
}

pub(crate) fn adjust_balance(conn: &Connection, account_id: i64, delta: i64) -> LedgerResult<()> {
    let changed = conn.execute(
        "UPDATE accounts SET balance = balance + ?1
         WHERE id = ?2 AND typeof(balance + ?1) = 'integer'",
        params![delta, account_id],
    )?;
    if changed != 1 {
        let msg = format!(
            "balance update for account {} touched {} rows (missing or overflowing)",
            account_id, changed
        );
        tracing::error!("{}", msg);
        return Err(LedgerError::Integrity(msg));
    }
    Ok(())
}

pub(crate) fn load_account(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<Account> {
    conn.query_row(
        &format!(
            "SELECT {} FROM accounts WHERE id = ?1 AND user_id = ?2",
            Account::COLUMNS
        ),
        params![id, user_id],
        Account::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(Entity::Account, id))
}

pub(crate) fn load_category(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<Category> {
    conn.query_row(
        &format!(
            "SELECT {} FROM categories WHERE id = ?1 AND user_id = ?2",
            Category::COLUMNS
        ),
        params![id, user_id],
        Category::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(Entity::Category, id))
}

pub(crate) fn load_goal(conn: &Connection, user_id: i64, id: i64) -> LedgerResult<SavingGoal> {
    conn.query_row(
        &format!(
            "SELECT {} FROM saving_goals WHERE id = ?1 AND user_id = ?2",
            SavingGoal::COLUMNS
        ),
        params![id, user_id],
        SavingGoal::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(Entity::Goal, id))
}

pub(crate) fn load_transaction(
    conn: &Connection,
    user_id: i64,
    id: i64,
) -> LedgerResult<Transaction> {
    conn.query_row(
        &format!(
            "SELECT {} FROM transactions WHERE id = ?1 AND user_id = ?2",
            Transaction::COLUMNS
        ),
        params![id, user_id],
        Transaction::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(Entity::Transaction, id))
}

/// Logs a rule rejection and turns it into an error.
pub(crate) fn reject(violation: RuleViolation) -> LedgerError {
    warn!(%violation, "operation rejected");
    LedgerError::Rule(violation)
}

fn ensure_funds(config: &LedgerConfig, account: &Account, amount: Decimal) -> LedgerResult<()> {
    if config.allow_negative_balance || account.balance >= amount {
        return Ok(());
    }
    Err(reject(RuleViolation::InsufficientBalance {
        account_id: account.id,
        available: account.balance,
        required: amount,
    }))
}

fn expect_category(category: &Category, expected: CategoryType) -> LedgerResult<()> {
    if category.category_type == expected {
        return Ok(());
    }
    Err(reject(RuleViolation::CategoryMismatch {
        category_id: category.id,
        expected,
        actual: category.category_type,
    }))
}

