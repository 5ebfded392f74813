// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure precondition checks. Nothing here touches storage.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::models::BudgetPeriod;
use crate::utils::to_minor;

static EMAIL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// Checks a money amount and returns it in minor units.
pub fn amount(field: &'static str, value: Decimal, max: Decimal) -> Result<i64, ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::AmountMustBePositive { field });
    }
    if value > max {
        return Err(ValidationError::AmountTooLarge { field, max });
    }
    if value.normalize().scale() > 2 {
        return Err(ValidationError::AmountTooPrecise { field });
    }
    to_minor(value).ok_or(ValidationError::AmountTooLarge { field, max })
}

/// Returns the trimmed name.
pub fn name<'a>(
    field: &'static str,
    value: &'a str,
    max_len: usize,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired { field });
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::NameTooLong {
            field,
            max: max_len,
        });
    }
    Ok(trimmed)
}

pub fn description(value: &str, max_len: usize) -> Result<&str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::DescriptionTooLong { max: max_len });
    }
    Ok(trimmed)
}

pub fn email(value: &str) -> Result<&str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired { field: "email" });
    }
    if !EMAIL.as_ref().is_some_and(|re| re.is_match(trimmed)) {
        return Err(ValidationError::InvalidEmail(trimmed.to_string()));
    }
    Ok(trimmed)
}

pub fn transfer_endpoints(source: i64, dest: i64) -> Result<(), ValidationError> {
    if source == dest {
        return Err(ValidationError::SameAccountTransfer);
    }
    Ok(())
}

pub fn threshold(value: Decimal) -> Result<Decimal, ValidationError> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::InvalidThreshold(value));
    }
    Ok(value)
}

/// Budget shape: Custom needs an end date and no range may run backwards.
pub fn budget_range(
    period: BudgetPeriod,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (period, end) {
        (BudgetPeriod::Custom, None) => Err(ValidationError::CustomPeriodNeedsEndDate),
        (_, Some(end)) if end < start => Err(ValidationError::EndBeforeStart { start, end }),
        _ => Ok(()),
    }
}

/// Goal fields: trimmed name and target in minor units.
pub fn goal<'a>(
    name: &'a str,
    target: Decimal,
    max_name_len: usize,
    max_amount: Decimal,
) -> Result<(&'a str, i64), ValidationError> {
    let name = self::name("goal name", name, max_name_len)?;
    let target = amount("target amount", target, max_amount)?;
    Ok((name, target))
}

/// Budget fields: limit in minor units and the checked threshold.
pub fn budget(
    limit: Decimal,
    period: BudgetPeriod,
    start: NaiveDate,
    end: Option<NaiveDate>,
    warn_threshold: Decimal,
    max_amount: Decimal,
) -> Result<(i64, Decimal), ValidationError> {
    let limit = amount("budget limit", limit, max_amount)?;
    budget_range(period, start, end)?;
    Ok((limit, threshold(warn_threshold)?))
}
