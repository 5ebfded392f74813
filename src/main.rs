// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ledgerly::{Ledger, cli, commands, db, utils};

fn main() -> Result<()> {
    utils::init_tracing();
    let matches = cli::build_cli().get_matches();

    let path = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => db::db_path()?,
    };
    let mut ledger = Ledger::open(&path)
        .with_context(|| format!("Failed to open ledger at {}", path.display()))?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("user", sub)) => commands::users::handle(&mut ledger, sub)?,
        Some(("config", sub)) => commands::settings::handle(&mut ledger, sub)?,
        Some(("doctor", sub)) => {
            let user = match matches.get_one::<String>("user") {
                Some(_) => Some(commands::current_user(&ledger, &matches)?),
                None => None,
            };
            commands::doctor::handle(&ledger, user.as_ref(), sub)?
        }
        Some((name, sub)) => {
            let user = commands::current_user(&ledger, &matches)?;
            match name {
                "account" => commands::accounts::handle(&mut ledger, &user, sub)?,
                "category" => commands::categories::handle(&mut ledger, &user, sub)?,
                "tx" => commands::transactions::handle(&mut ledger, &user, sub)?,
                "goal" => commands::goals::handle(&mut ledger, &user, sub)?,
                "budget" => commands::budgets::handle(&mut ledger, &user, sub)?,
                "summary" => commands::summary::handle(&ledger, &user, sub)?,
                "export" => commands::exporter::handle(&ledger, &user, sub)?,
                _ => {
                    cli::build_cli().print_help()?;
                    println!();
                }
            }
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
