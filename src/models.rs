// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::utils::from_minor;

fn normalized(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Stores an enum as its canonical name in a TEXT column.
macro_rules! text_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: ValidationError| FromSqlError::Other(Box::new(e)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Bank,
    Cash,
    Savings,
    InternetBank,
}

impl AccountType {
    pub const ALL: [AccountType; 4] = [
        AccountType::Bank,
        AccountType::Cash,
        AccountType::Savings,
        AccountType::InternetBank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Bank => "Bank",
            AccountType::Cash => "Cash",
            AccountType::Savings => "Savings",
            AccountType::InternetBank => "InternetBank",
        }
    }
}

impl FromStr for AccountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|t| normalized(t.as_str()) == normalized(s))
            .ok_or_else(|| ValidationError::UnknownAccountType(s.to_string()))
    }
}

text_column!(AccountType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "Income",
            CategoryType::Expense => "Expense",
        }
    }
}

impl FromStr for CategoryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(ValidationError::UnknownCategoryType(s.to_string())),
        }
    }
}

text_column!(CategoryType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
    GoalContribution,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
            TransactionType::Transfer => "Transfer",
            TransactionType::GoalContribution => "GoalContribution",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            "goalcontribution" | "contribution" => Ok(TransactionType::GoalContribution),
            _ => Err(ValidationError::UnknownTransactionType(s.to_string())),
        }
    }
}

text_column!(TransactionType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalStatus {
    Active,
    Completed,
    /// Funds moved into a regular account; the goal is closed.
    Converted,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "Active",
            GoalStatus::Completed => "Completed",
            GoalStatus::Converted => "Converted",
        }
    }
}

impl FromStr for GoalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "converted" => Ok(GoalStatus::Converted),
            _ => Err(ValidationError::UnknownGoalStatus(s.to_string())),
        }
    }
}

text_column!(GoalStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetPeriod {
    Monthly,
    Weekly,
    Yearly,
    Custom,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "Monthly",
            BudgetPeriod::Weekly => "Weekly",
            BudgetPeriod::Yearly => "Yearly",
            BudgetPeriod::Custom => "Custom",
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "monthly" | "month" => Ok(BudgetPeriod::Monthly),
            "weekly" | "week" => Ok(BudgetPeriod::Weekly),
            "yearly" | "year" => Ok(BudgetPeriod::Yearly),
            "custom" => Ok(BudgetPeriod::Custom),
            _ => Err(ValidationError::UnknownPeriod(s.to_string())),
        }
    }
}

text_column!(BudgetPeriod);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetState {
    Ok,
    Warning,
    Exceeded,
}

impl fmt::Display for BudgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BudgetState::Ok => "OK",
            BudgetState::Warning => "Warning",
            BudgetState::Exceeded => "Exceeded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl User {
    pub(crate) const COLUMNS: &'static str = "id, name, email, created_at";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: r.get("id")?,
            name: r.get("name")?,
            email: r.get("email")?,
            created_at: r.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: Decimal,
    pub created_at: NaiveDateTime,
}

impl Account {
    pub(crate) const COLUMNS: &'static str = "id, user_id, name, type, balance, created_at";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Account {
            id: r.get("id")?,
            user_id: r.get("user_id")?,
            name: r.get("name")?,
            account_type: r.get("type")?,
            balance: from_minor(r.get("balance")?),
            created_at: r.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

impl Category {
    pub(crate) const COLUMNS: &'static str = "id, user_id, name, type";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: r.get("id")?,
            user_id: r.get("user_id")?,
            name: r.get("name")?,
            category_type: r.get("type")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub counter_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub goal_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal, // always positive
    pub description: String,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub(crate) const COLUMNS: &'static str = "id, user_id, account_id, counter_account_id, category_id, goal_id, type, amount, description, timestamp";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: r.get("id")?,
            user_id: r.get("user_id")?,
            account_id: r.get("account_id")?,
            counter_account_id: r.get("counter_account_id")?,
            category_id: r.get("category_id")?,
            goal_id: r.get("goal_id")?,
            kind: r.get("type")?,
            amount: from_minor(r.get("amount")?),
            description: r.get("description")?,
            timestamp: r.get("timestamp")?,
        })
    }

    /// Signed effect of this transaction on `account_id`'s balance.
    pub fn effect_on(&self, account_id: i64) -> Decimal {
        match self.kind {
            TransactionType::Income if self.account_id == account_id => self.amount,
            TransactionType::Transfer if self.counter_account_id == Some(account_id) => {
                self.amount
            }
            _ if self.account_id == account_id => -self.amount,
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingGoal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub linked_account_id: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub status: GoalStatus,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl SavingGoal {
    pub(crate) const COLUMNS: &'static str = "id, user_id, name, target_amount, current_amount, linked_account_id, deadline, status, created_at, completed_at";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SavingGoal {
            id: r.get("id")?,
            user_id: r.get("user_id")?,
            name: r.get("name")?,
            target_amount: from_minor(r.get("target_amount")?),
            current_amount: from_minor(r.get("current_amount")?),
            linked_account_id: r.get("linked_account_id")?,
            deadline: r.get("deadline")?,
            status: r.get("status")?,
            created_at: r.get("created_at")?,
            completed_at: r.get("completed_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub limit_amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub warn_threshold: Decimal,
}

impl Budget {
    pub(crate) const COLUMNS: &'static str =
        "id, user_id, category_id, limit_amount, period, start_date, end_date, warn_threshold";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        let threshold: String = r.get("warn_threshold")?;
        let warn_threshold = threshold.parse::<Decimal>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Budget {
            id: r.get("id")?,
            user_id: r.get("user_id")?,
            category_id: r.get("category_id")?,
            limit_amount: from_minor(r.get("limit_amount")?),
            period: r.get("period")?,
            start_date: r.get("start_date")?,
            end_date: r.get("end_date")?,
            warn_threshold,
        })
    }
}

/// Inclusive day range a budget aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BudgetWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget_id: i64,
    pub category_id: i64,
    pub window: BudgetWindow,
    pub spent: Decimal,
    pub limit: Decimal,
    pub remaining: Decimal,
    pub fraction_used: Decimal,
    pub state: BudgetState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: i64,
    pub name: String,
    pub current: Decimal,
    pub target: Decimal,
    pub remaining: Decimal,
    pub fraction: Decimal,
    pub status: GoalStatus,
    pub days_remaining: Option<i64>,
}

/// Result of a balance-changing operation: the log record plus fresh
/// snapshots of everything it touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posting {
    pub transaction: Transaction,
    pub accounts: Vec<Account>,
    pub goal: Option<SavingGoal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub account: Account,
    pub goal: SavingGoal,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub goal_id: Option<i64>,
    pub kind: Option<TransactionType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}
