//! Clap command tree definition.

use clap::{Arg, ArgGroup, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("stockguard")
        .about("Race concurrent stock decrements under four concurrency strategies")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Config file (default: ./stockguard.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .value_name("S")
                .help("unsynchronized | optimistic | pessimistic | distributed")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_race())
        .subcommand(build_compare())
        .subcommand(build_seed())
        .subcommand(build_config_init())
}

fn build_race() -> Command {
    Command::new("race")
        .about("Fire N concurrent adjustments at one record")
        .arg(
            Arg::new("sku")
                .long("sku")
                .help("Target record by SKU (demo records are seeded)"),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .help("Target record by id")
                .value_parser(clap::value_parser!(u64)),
        )
        .group(ArgGroup::new("target").args(["sku", "id"]).required(true))
        .arg(delta_arg())
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .short('n')
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("quantity")
                .long("quantity")
                .help("Reset the record to this quantity before the run")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("barrier")
                .long("barrier")
                .help("Hold every worker behind a start barrier")
                .action(clap::ArgAction::SetTrue),
        )
}

fn build_compare() -> Command {
    Command::new("compare")
        .about("Run the same race once per strategy on fresh records")
        .arg(
            Arg::new("quantity")
                .long("quantity")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .short('n')
                .default_value("20")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(delta_arg())
}

fn build_seed() -> Command {
    Command::new("seed").about("Seed the demo records and list them")
}

fn build_config_init() -> Command {
    Command::new("config-init").about("Write a commented default config file if none exists")
}

fn delta_arg() -> Arg {
    Arg::new("delta")
        .long("delta")
        .default_value("-1")
        .allow_negative_numbers(true)
        .value_parser(clap::value_parser!(i64))
}
