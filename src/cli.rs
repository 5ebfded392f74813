// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).help(help)
}

fn req(id: &'static str, help: &'static str) -> Arg {
    opt(id, help).required(true)
}

fn as_of() -> Arg {
    opt("as-of", "Evaluation date YYYY-MM-DD (default: today)")
}

fn at() -> Arg {
    opt("at", "Timestamp YYYY-MM-DD[ HH:MM[:SS]] (default: now)")
}

fn id_arg(help: &'static str) -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
        .help(help)
}

pub fn build_cli() -> Command {
    Command::new("ledgerly")
        .about("Multi-user personal finance ledger")
        .version(clap::crate_version!())
        .subcommand_required(false)
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("LEDGERLY_DB")
                .help("Path to the ledger database"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .env("LEDGERLY_USER")
                .help("Email of the acting user"),
        )
        .subcommand(Command::new("init").about("Create the database and schema"))
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Display name"))
                        .arg(req("email", "Login email"))
                        .arg(
                            opt("password-hash", "Password hash from the auth layer")
                                .default_value(""),
                        )
                        .arg(opt("salt", "Salt from the auth layer").default_value("")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(req("email", "Email of the user to delete"))),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Account name"))
                        .arg(opt("type", "Bank|Cash|Savings|InternetBank").default_value("Bank"))
                        .arg(opt("opening", "Opening balance").default_value("0"))
                        .arg(at()),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(req("name", "Account name"))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Category name"))
                        .arg(opt("type", "Income|Expense").default_value("Expense")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm")
                        .arg(req("name", "Category name"))
                        .arg(opt("type", "Income|Expense")),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("income")
                        .arg(req("account", "Account name"))
                        .arg(req("category", "Income category name"))
                        .arg(req("amount", "Amount"))
                        .arg(opt("desc", "Description").default_value(""))
                        .arg(at()),
                )
                .subcommand(
                    Command::new("expense")
                        .arg(req("account", "Account name"))
                        .arg(req("category", "Expense category name"))
                        .arg(req("amount", "Amount"))
                        .arg(opt("desc", "Description").default_value(""))
                        .arg(at()),
                )
                .subcommand(
                    Command::new("transfer")
                        .arg(req("from", "Source account name"))
                        .arg(req("to", "Destination account name"))
                        .arg(req("amount", "Amount"))
                        .arg(opt("desc", "Description").default_value(""))
                        .arg(at()),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("account", "Filter by account name"))
                        .arg(opt("category", "Filter by category name"))
                        .arg(opt("type", "Income|Expense|Transfer|GoalContribution"))
                        .arg(opt("from", "First day YYYY-MM-DD"))
                        .arg(opt("to", "Last day YYYY-MM-DD"))
                        .arg(opt("limit", "Maximum rows").value_parser(value_parser!(usize))),
                )),
        )
        .subcommand(
            Command::new("goal")
                .about("Manage saving goals")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Goal name"))
                        .arg(req("target", "Target amount"))
                        .arg(opt("account", "Linked source account name"))
                        .arg(opt("deadline", "Deadline YYYY-MM-DD")),
                )
                .subcommand(
                    Command::new("contribute")
                        .arg(id_arg("Goal id"))
                        .arg(req("amount", "Amount"))
                        .arg(opt("account", "Source account name (default: linked account)"))
                        .arg(at()),
                )
                .subcommand(
                    Command::new("convert")
                        .arg(id_arg("Goal id"))
                        .arg(opt("type", "Type of the new account").default_value("Savings"))
                        .arg(opt("name", "Name of the new account (default: goal name)"))
                        .arg(at()),
                )
                .subcommand(
                    Command::new("rm").arg(id_arg("Goal id")).arg(
                        Arg::new("forfeit")
                            .long("forfeit")
                            .action(ArgAction::SetTrue)
                            .help("Delete even if the goal holds funds"),
                    ),
                )
                .subcommand(json_flags(Command::new("list").arg(as_of()))),
        )
        .subcommand(
            Command::new("budget")
                .about("Manage budgets")
                .subcommand(
                    Command::new("add")
                        .arg(req("category", "Expense category name"))
                        .arg(req("limit", "Spending limit"))
                        .arg(opt("period", "Monthly|Weekly|Yearly|Custom").default_value("Monthly"))
                        .arg(opt("start", "Start date YYYY-MM-DD (default: today)"))
                        .arg(opt("end", "End date YYYY-MM-DD (Custom only)"))
                        .arg(opt("warn", "Warning threshold in (0, 1]")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(json_flags(Command::new("status").arg(as_of())))
                .subcommand(json_flags(
                    Command::new("preview")
                        .arg(req("category", "Expense category name"))
                        .arg(req("amount", "Prospective expense"))
                        .arg(as_of()),
                ))
                .subcommand(Command::new("prune").arg(as_of()))
                .subcommand(Command::new("rm").arg(id_arg("Budget id"))),
        )
        .subcommand(json_flags(
            Command::new("summary")
                .about("Balances and this month's cash flow")
                .arg(as_of())
                .arg(
                    Arg::new("by-category")
                        .long("by-category")
                        .action(ArgAction::SetTrue)
                        .help("Show the month's spending per category"),
                ),
        ))
        .subcommand(json_flags(
            Command::new("doctor").about("Recompute balances from the log and report mismatches"),
        ))
        .subcommand(
            Command::new("config")
                .about("Show or change ledger settings")
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .arg(opt("format", "csv|json").default_value("csv"))
                    .arg(req("out", "Output file"))
                    .arg(opt("from", "First day YYYY-MM-DD"))
                    .arg(opt("to", "Last day YYYY-MM-DD")),
            ),
        )
}
