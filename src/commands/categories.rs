// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::{arg, id_for_category, unknown};
use crate::Ledger;
use crate::models::{CategoryType, User};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(ledger: &mut Ledger, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: CategoryType = arg(sub, "type")?.parse()?;
            let category = ledger.create_category(user.id, arg(sub, "name")?, kind)?;
            println!("Added {} category '{}'", category.category_type, category.name);
        }
        Some(("list", sub)) => {
            let categories = ledger.categories(user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &categories)? {
                let data = categories
                    .iter()
                    .map(|c| vec![c.name.clone(), c.category_type.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Name", "Type"], data));
            }
        }
        Some(("rm", sub)) => {
            let name = arg(sub, "name")?;
            let kind = sub
                .get_one::<String>("type")
                .map(|s| s.parse::<CategoryType>())
                .transpose()?;
            let category_id = id_for_category(ledger, user, name, kind)?;
            ledger.delete_category(user.id, category_id)?;
            println!("Removed category '{}'", name);
        }
        _ => unknown("category", m)?,
    }
    Ok(())
}
