// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Users, accounts and categories: uniqueness, ownership and limits.

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::{DeletePolicy, LedgerConfig};
use crate::error::{Entity, LedgerError, LedgerResult, RuleViolation};
use crate::ledger::{
    Ledger, NewEntry, adjust_balance, append, begin, load_account, load_category, reject,
};
use crate::models::{Account, AccountType, Category, CategoryType, TransactionType, User};
use crate::validation;

const DEFAULT_ACCOUNTS: [(&str, AccountType); 2] = [
    ("My Bank Account", AccountType::Bank),
    ("Cash Wallet", AccountType::Cash),
];

const DEFAULT_CATEGORIES: [(&str, CategoryType); 5] = [
    ("Food & Drink", CategoryType::Expense),
    ("Transport", CategoryType::Expense),
    ("Salary", CategoryType::Income),
    ("Education", CategoryType::Expense),
    ("Entertainment", CategoryType::Expense),
];

/// Fails unless the user may open one more account under `name`.
pub(crate) fn ensure_account_slot(
    conn: &Connection,
    config: &LedgerConfig,
    user_id: i64,
    name: &str,
) -> LedgerResult<()> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE user_id = ?1",
        params![user_id],
        |r| r.get(0),
    )?;
    if usize::try_from(count).unwrap_or(usize::MAX) >= config.max_accounts_per_user {
        return Err(reject(RuleViolation::AccountLimitExceeded {
            max: config.max_accounts_per_user,
        }));
    }
    let taken: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE user_id = ?1 AND name = ?2",
            params![user_id, name],
            |r| r.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(reject(RuleViolation::DuplicateName {
            entity: Entity::Account,
            name: name.to_string(),
        }));
    }
    Ok(())
}

/// Inserts an account at zero balance.
pub(crate) fn insert_account(
    conn: &Connection,
    user_id: i64,
    name: &str,
    account_type: AccountType,
) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO accounts(user_id, name, type, balance) VALUES (?1, ?2, ?3, 0)",
        params![user_id, name, account_type],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_category(
    conn: &Connection,
    user_id: i64,
    name: &str,
    category_type: CategoryType,
) -> LedgerResult<i64> {
    let taken: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE user_id = ?1 AND name = ?2 AND type = ?3",
            params![user_id, name, category_type],
            |r| r.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(reject(RuleViolation::DuplicateName {
            entity: Entity::Category,
            name: name.to_string(),
        }));
    }
    conn.execute(
        "INSERT INTO categories(user_id, name, type) VALUES (?1, ?2, ?3)",
        params![user_id, name, category_type],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Ledger {
    /// Stores a user with credentials produced by the authentication layer.
    pub fn register_user(
        &mut self,
        name: &str,
        email: &str,
        password_hash: &str,
        salt: &str,
    ) -> LedgerResult<User> {
        let name = validation::name("name", name, self.config.max_name_length)?;
        let email = validation::email(email)?;

        let tx = begin(&mut self.conn)?;
        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM users WHERE email = ?1 COLLATE NOCASE",
                params![email],
                |r| r.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(reject(RuleViolation::DuplicateName {
                entity: Entity::User,
                name: email.to_string(),
            }));
        }
        tx.execute(
            "INSERT INTO users(name, email, password_hash, salt) VALUES (?1, ?2, ?3, ?4)",
            params![name, email, password_hash, salt],
        )?;
        let user_id = tx.last_insert_rowid();
        if self.config.seed_defaults {
            for (account, kind) in DEFAULT_ACCOUNTS {
                insert_account(&tx, user_id, account, kind)?;
            }
            for (category, kind) in DEFAULT_CATEGORIES {
                insert_category(&tx, user_id, category, kind)?;
            }
        }
        let user = load_user(&tx, user_id)?;
        tx.commit()?;

        info!(user_id, seeded = self.config.seed_defaults, "registered user");
        Ok(user)
    }

    pub fn user(&self, user_id: i64) -> LedgerResult<User> {
        load_user(&self.conn, user_id)
    }

    pub fn find_user_by_email(&self, email: &str) -> LedgerResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
                    User::COLUMNS
                ),
                params![email.trim()],
                User::from_row,
            )
            .optional()?)
    }

    pub fn users(&self) -> LedgerResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY id", User::COLUMNS))?;
        let rows = stmt.query_map([], User::from_row)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }

    /// Stored credentials `(password_hash, salt)` for the auth layer.
    pub fn credentials(&self, user_id: i64) -> LedgerResult<(String, String)> {
        self.conn
            .query_row(
                "SELECT password_hash, salt FROM users WHERE id = ?1",
                params![user_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| LedgerError::not_found(Entity::User, user_id))
    }

    pub fn update_credentials(
        &mut self,
        user_id: i64,
        password_hash: &str,
        salt: &str,
    ) -> LedgerResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET password_hash = ?1, salt = ?2 WHERE id = ?3",
            params![password_hash, salt, user_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found(Entity::User, user_id));
        }
        info!(user_id, "updated credentials");
        Ok(())
    }

    /// Deletes the user and everything they own.
    pub fn delete_user(&mut self, user_id: i64) -> LedgerResult<()> {
        let tx = begin(&mut self.conn)?;
        let changed = tx.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if changed == 0 {
            return Err(LedgerError::not_found(Entity::User, user_id));
        }
        tx.commit()?;
        info!(user_id, "deleted user");
        Ok(())
    }

    /// Opens an account. A positive opening balance is logged as an
    /// uncategorized income in the same unit.
    pub fn open_account(
        &mut self,
        user_id: i64,
        name: &str,
        account_type: AccountType,
        opening_balance: Decimal,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<Account> {
        let name = validation::name("account name", name, self.config.max_name_length)?;
        let opening = if opening_balance.is_zero() {
            0
        } else {
            validation::amount("opening balance", opening_balance, self.config.max_amount)?
        };

        let tx = begin(&mut self.conn)?;
        load_user(&tx, user_id)?;
        ensure_account_slot(&tx, &self.config, user_id, name)?;
        let account_id = insert_account(&tx, user_id, name, account_type)?;
        if opening > 0 {
            adjust_balance(&tx, account_id, opening)?;
            append(
                &tx,
                &NewEntry {
                    user_id,
                    account_id,
                    counter_account_id: None,
                    category_id: None,
                    goal_id: None,
                    kind: TransactionType::Income,
                    amount: opening,
                    description: "Opening balance",
                    timestamp,
                },
            )?;
        }
        let account = load_account(&tx, user_id, account_id)?;
        tx.commit()?;

        info!(user_id, account_id, opening = %opening_balance, "opened account");
        Ok(account)
    }

    pub fn account(&self, user_id: i64, account_id: i64) -> LedgerResult<Account> {
        load_account(&self.conn, user_id, account_id)
    }

    pub fn account_by_name(&self, user_id: i64, name: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM accounts WHERE user_id = ?1 AND name = ?2",
                    Account::COLUMNS
                ),
                params![user_id, name.trim()],
                Account::from_row,
            )
            .optional()?)
    }

    pub fn accounts(&self, user_id: i64) -> LedgerResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE user_id = ?1 ORDER BY name",
            Account::COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], Account::from_row)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }

    pub fn create_category(
        &mut self,
        user_id: i64,
        name: &str,
        category_type: CategoryType,
    ) -> LedgerResult<Category> {
        let name = validation::name("category name", name, self.config.max_name_length)?;

        let tx = begin(&mut self.conn)?;
        load_user(&tx, user_id)?;
        let category_id = insert_category(&tx, user_id, name, category_type)?;
        let category = load_category(&tx, user_id, category_id)?;
        tx.commit()?;

        info!(user_id, category_id, %category_type, "created category");
        Ok(category)
    }

    /// Transactions always block deletion. Budgets block it under
    /// `Restrict` and are removed with the category under `Cascade`.
    pub fn delete_category(&mut self, user_id: i64, category_id: i64) -> LedgerResult<()> {
        let policy = self.config.category_delete_policy;
        let tx = begin(&mut self.conn)?;
        let category = load_category(&tx, user_id, category_id)?;
        let transactions: i64 = tx.query_row(
            "SELECT COUNT(*) FROM transactions WHERE category_id = ?1",
            params![category.id],
            |r| r.get(0),
        )?;
        let budgets: i64 = tx.query_row(
            "SELECT COUNT(*) FROM budgets WHERE category_id = ?1",
            params![category.id],
            |r| r.get(0),
        )?;
        let blocked = transactions > 0 || (budgets > 0 && policy == DeletePolicy::Restrict);
        if blocked {
            return Err(reject(RuleViolation::CategoryInUse {
                category_id: category.id,
                transactions,
                budgets,
            }));
        }
        tx.execute(
            "DELETE FROM budgets WHERE category_id = ?1",
            params![category.id],
        )?;
        tx.execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
            params![category.id, user_id],
        )?;
        tx.commit()?;

        info!(user_id, category_id, budgets_removed = budgets, "deleted category");
        Ok(())
    }

    pub fn category(&self, user_id: i64, category_id: i64) -> LedgerResult<Category> {
        load_category(&self.conn, user_id, category_id)
    }

    /// Looks a category up by name, optionally narrowed to one type.
    pub fn category_by_name(
        &self,
        user_id: i64,
        name: &str,
        category_type: Option<CategoryType>,
    ) -> LedgerResult<Option<Category>> {
        let name = name.trim();
        Ok(self.categories(user_id)?.into_iter().find(|c| {
            c.name == name && category_type.is_none_or(|t| c.category_type == t)
        }))
    }

    pub fn categories(&self, user_id: i64) -> LedgerResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ?1 ORDER BY type, name",
            Category::COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], Category::from_row)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?);
        }
        Ok(data)
    }
}

fn load_user(conn: &Connection, user_id: i64) -> LedgerResult<User> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
        params![user_id],
        User::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(Entity::User, user_id))
}
