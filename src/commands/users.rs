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
        Some(("add", sub)) => {
            let user = ledger.register_user(
                arg(sub, "name")?,
                arg(sub, "email")?,
                arg(sub, "password-hash")?,
                arg(sub, "salt")?,
            )?;
            println!("Registered user '{}' <{}> (id {})", user.name, user.email, user.id);
        }
        Some(("list", sub)) => {
            let users = ledger.users()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
                let data = users
                    .iter()
                    .map(|u| {
                        vec![
                            u.id.to_string(),
                            u.name.clone(),
                            u.email.clone(),
                            u.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Email", "Created"], data));
            }
        }
        Some(("rm", sub)) => {
            let email = arg(sub, "email")?;
            let user = ledger
                .find_user_by_email(email)?
                .with_context(|| format!("Unknown user '{}'", email))?;
            ledger.delete_user(user.id)?;
            println!("Removed user '{}' and all of their data", user.email);
        }
        _ => unknown("user", m)?,
    }
    Ok(())
}
