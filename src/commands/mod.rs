// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod doctor;
pub mod exporter;
pub mod goals;
pub mod settings;
pub mod summary;
pub mod transactions;
pub mod users;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use clap::ArgMatches;

use crate::Ledger;
use crate::models::{CategoryType, User};
use crate::utils::{now, parse_date, parse_timestamp};

/// Value of an argument clap already guarantees is present.
pub fn arg<'a>(m: &'a ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing required argument --{}", id))
}

/// The acting user named by the global `--user` flag.
pub fn current_user(ledger: &Ledger, m: &ArgMatches) -> Result<User> {
    let email = m
        .get_one::<String>("user")
        .context("No user selected; pass --user EMAIL or set LEDGERLY_USER")?;
    ledger
        .find_user_by_email(email)?
        .with_context(|| format!("Unknown user '{}'", email))
}

pub fn id_for_account(ledger: &Ledger, user: &User, name: &str) -> Result<i64> {
    ledger
        .account_by_name(user.id, name)?
        .map(|a| a.id)
        .with_context(|| format!("Unknown account '{}'", name))
}

pub fn id_for_category(
    ledger: &Ledger,
    user: &User,
    name: &str,
    kind: Option<CategoryType>,
) -> Result<i64> {
    ledger
        .category_by_name(user.id, name, kind)?
        .map(|c| c.id)
        .with_context(|| format!("Unknown category '{}'", name))
}

/// `--at` timestamp, or the current local time.
pub fn timestamp_or_now(m: &ArgMatches) -> Result<NaiveDateTime> {
    match m.get_one::<String>("at") {
        Some(s) => parse_timestamp(s),
        None => Ok(now()),
    }
}

pub fn date_or_today(m: &ArgMatches, id: &str) -> Result<NaiveDate> {
    match m.get_one::<String>(id) {
        Some(s) => parse_date(s),
        None => Ok(now().date()),
    }
}

pub fn optional_date(m: &ArgMatches, id: &str) -> Result<Option<NaiveDate>> {
    m.get_one::<String>(id).map(|s| parse_date(s)).transpose()
}

pub(crate) fn unknown(group: &str, m: &ArgMatches) -> Result<()> {
    match m.subcommand_name() {
        Some(name) => bail!("Unknown {} subcommand '{}'", group, name),
        None => bail!("Missing {} subcommand; see --help", group),
    }
}
