// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budget;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod goals;
pub mod ledger;
pub mod models;
pub mod registry;
pub mod summary;
pub mod utils;
pub mod validation;

pub use config::{DeletePolicy, LedgerConfig};
pub use error::{Entity, LedgerError, LedgerResult, RuleViolation, ValidationError};
pub use goals::{ContributionOutcome, GoalDeletion};
pub use ledger::Ledger;
