// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use super::{arg, unknown};
use crate::Ledger;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let entries = ledger.config().entries();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), ledger.config())? {
                let rows = entries
                    .into_iter()
                    .map(|(k, v)| vec![k.to_string(), v])
                    .collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("get", sub)) => {
            let key = arg(sub, "key")?;
            let value = ledger
                .config()
                .get(key)
                .with_context(|| format!("Unknown setting '{}'", key))?;
            println!("{}", value);
        }
        Some(("set", sub)) => {
            let key = arg(sub, "key")?;
            let value = arg(sub, "value")?;
            ledger.set_setting(key, value)?;
            println!("{} = {}", key, value);
        }
        _ => unknown("config", m)?,
    }
    Ok(())
}
