//! stockguard CLI: race concurrent stock decrements from the shell.
//!
//! `stockguard [--config FILE] [--strategy S] [--json] <race|compare|seed|config-init>`
//!
//! The store is in-process, so every invocation starts from freshly seeded
//! demo records. Logging goes to stderr, filtered by `RUST_LOG`.

mod commands;
mod format;
mod parse;

use std::path::Path;
use std::process;

use stockguard_core::{NewStockRecord, RecordUpdate, StockError, StockRecord, StockResult, Strategy};
use stockguard_engine::{Inventory, StockConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_records, format_result, format_results, OutputMode};
use parse::{global_opts, matches_to_action, CliAction, GlobalOpts, Target};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let parsed = global_opts(&matches).and_then(|opts| Ok((opts, matches_to_action(&matches)?)));
    let (opts, action) = match parsed {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(2);
        }
    };

    match run(&opts, action, mode) {
        Ok(out) => {
            if !out.is_empty() {
                println!("{}", out);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

fn load_config(opts: &GlobalOpts) -> StockResult<StockConfig> {
    let path = opts.config_path();
    let mut config = if opts.config.is_some() || path.exists() {
        debug!(target: "stockguard::cli", path = %path.display(), "Loading config");
        StockConfig::from_file(&path)?
    } else {
        StockConfig::default()
    };
    if let Some(strategy) = opts.strategy {
        config.strategy = strategy.as_str().to_string();
    }
    config.seed_demo_data = true;
    Ok(config)
}

fn run(opts: &GlobalOpts, action: CliAction, mode: OutputMode) -> StockResult<String> {
    match action {
        CliAction::ConfigInit => config_init(&opts.config_path()),
        CliAction::Seed => {
            let inventory = Inventory::open(load_config(opts)?)?;
            Ok(format_records(&inventory.list_all()?, mode))
        }
        CliAction::Race {
            target,
            delta,
            concurrency,
            quantity,
            barrier,
        } => {
            let mut config = load_config(opts)?;
            config.harness.start_barrier |= barrier;
            let inventory = Inventory::open(config)?;
            let record = resolve(&inventory, &target)?;
            let record = match quantity {
                Some(q) => reset_quantity(&inventory, &record, q)?,
                None => record,
            };
            let result = inventory.run_concurrency_test(record.id, delta, concurrency)?;
            Ok(format_result(&result, record.quantity, delta, mode))
        }
        CliAction::Compare {
            quantity,
            concurrency,
            delta,
        } => {
            let inventory = Inventory::open(load_config(opts)?)?;
            let mut results = Vec::with_capacity(Strategy::ALL.len());
            for strategy in Strategy::ALL {
                let record = inventory.create_record(NewStockRecord::new(
                    format!("CMP-{}", strategy.label()),
                    format!("{} comparison", strategy),
                    0,
                    quantity,
                ))?;
                results.push(inventory.run_concurrency_test_with(
                    strategy,
                    record.id,
                    delta,
                    concurrency,
                )?);
            }
            Ok(format_results(&results, quantity, delta, mode))
        }
    }
}

fn resolve(inventory: &Inventory, target: &Target) -> StockResult<StockRecord> {
    match target {
        Target::Sku(sku) => inventory.get_by_sku(sku),
        Target::Id(id) => inventory.get_by_id(*id),
    }
}

fn reset_quantity(inventory: &Inventory, record: &StockRecord, quantity: u32) -> StockResult<StockRecord> {
    inventory.update_record(
        record.id,
        RecordUpdate {
            name: record.name.clone(),
            price: record.price,
            quantity,
            version: record.version,
        },
    )
}

fn config_init(path: &Path) -> StockResult<String> {
    if StockConfig::write_default_if_missing(path)? {
        Ok(format!("Wrote {}", path.display()))
    } else {
        Err(StockError::invalid_input(format!(
            "{} already exists; not overwriting",
            path.display()
        )))
    }
}
