// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy for ledger operations.
//!
//! Validation and rule errors are recoverable: the caller fixes the input
//! and resubmits. Integrity and storage errors abort the unit of work.

use std::fmt;

use chrono::NaiveDate;
use rusqlite::ErrorCode;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{CategoryType, GoalStatus};

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Account,
    Category,
    Transaction,
    Goal,
    Budget,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Entity::User => "User",
            Entity::Account => "Account",
            Entity::Category => "Category",
            Entity::Transaction => "Transaction",
            Entity::Goal => "Saving goal",
            Entity::Budget => "Budget",
        };
        f.write_str(s)
    }
}

/// Bad input shape or range. Raised before storage is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be positive")]
    AmountMustBePositive { field: &'static str },
    #[error("{field} cannot exceed {max}")]
    AmountTooLarge { field: &'static str, max: Decimal },
    #[error("{field} cannot have more than two decimal places")]
    AmountTooPrecise { field: &'static str },
    #[error("{field} is required")]
    NameRequired { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    NameTooLong { field: &'static str, max: usize },
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
    #[error("unknown account type '{0}' (expected Bank, Cash, Savings or InternetBank)")]
    UnknownAccountType(String),
    #[error("unknown category type '{0}' (expected Income or Expense)")]
    UnknownCategoryType(String),
    #[error("unknown transaction type '{0}'")]
    UnknownTransactionType(String),
    #[error("unknown budget period '{0}' (expected Monthly, Weekly, Yearly or Custom)")]
    UnknownPeriod(String),
    #[error("unknown goal status '{0}'")]
    UnknownGoalStatus(String),
    #[error("a source account is required")]
    SourceAccountRequired,
    #[error("cannot transfer to the same account")]
    SameAccountTransfer,
    #[error("custom budgets require an end date")]
    CustomPeriodNeedsEndDate,
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("warning threshold must be greater than 0 and at most 1, got {0}")]
    InvalidThreshold(Decimal),
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),
    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidSetting { key: String, value: String },
}

/// Well-formed request refused by a business rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("insufficient balance in account {account_id}: available {available}, required {required}")]
    InsufficientBalance {
        account_id: i64,
        available: Decimal,
        required: Decimal,
    },
    #[error("maximum of {max} accounts per user reached")]
    AccountLimitExceeded { max: usize },
    #[error("{entity} named '{name}' already exists")]
    DuplicateName { entity: Entity, name: String },
    #[error("category {category_id} is an {actual} category, expected {expected}")]
    CategoryMismatch {
        category_id: i64,
        expected: CategoryType,
        actual: CategoryType,
    },
    #[error("saving goal {goal_id} has not reached its target yet")]
    GoalNotCompleted { goal_id: i64 },
    #[error("saving goal {goal_id} is {status} and no longer accepts changes")]
    GoalNotActive { goal_id: i64, status: GoalStatus },
    #[error("saving goal {goal_id} still holds {amount}; confirm forfeiting the funds to delete it")]
    GoalHasFunds { goal_id: i64, amount: Decimal },
    #[error("account {account_id} is referenced by {transactions} transaction(s)")]
    AccountHasHistory { account_id: i64, transactions: i64 },
    #[error("category {category_id} is referenced by {transactions} transaction(s) and {budgets} budget(s)")]
    CategoryInUse {
        category_id: i64,
        transactions: i64,
        budgets: i64,
    },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error("storage unavailable: {0}")]
    Storage(#[source] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    /// True when the user can correct the input and resubmit.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_) | LedgerError::Rule(_) | LedgerError::NotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
                tracing::error!(error = %e, "constraint violation, aborting");
                LedgerError::Integrity(e.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => {
                tracing::error!(error = %e, "stored value unreadable, aborting");
                LedgerError::Integrity(e.to_string())
            }
            _ => LedgerError::Storage(e),
        }
    }
}
