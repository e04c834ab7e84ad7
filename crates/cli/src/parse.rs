//! ArgMatches → CliAction.

use clap::ArgMatches;
use std::path::PathBuf;
use stockguard_core::{StockId, Strategy};
use stockguard_engine::CONFIG_FILE_NAME;

/// Record addressed by a `race`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Sku(String),
    Id(StockId),
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Race {
        target: Target,
        delta: i64,
        concurrency: usize,
        quantity: Option<u32>,
        barrier: bool,
    },
    Compare {
        quantity: u32,
        concurrency: usize,
        delta: i64,
    },
    Seed,
    ConfigInit,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOpts {
    /// Explicit `--config`, if any
    pub config: Option<PathBuf>,
    /// `--strategy` override
    pub strategy: Option<Strategy>,
}

impl GlobalOpts {
    /// Config path to read or create
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }
}

pub fn global_opts(matches: &ArgMatches) -> Result<GlobalOpts, String> {
    let strategy = matches
        .get_one::<String>("strategy")
        .map(|s| s.parse::<Strategy>().map_err(|e| e.to_string()))
        .transpose()?;
    Ok(GlobalOpts {
        config: matches.get_one::<String>("config").map(PathBuf::from),
        strategy,
    })
}

pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    match matches.subcommand() {
        Some(("race", sub)) => {
            let target = match (sub.get_one::<String>("sku"), sub.get_one::<u64>("id")) {
                (Some(sku), _) => Target::Sku(sku.clone()),
                (None, Some(id)) => Target::Id(StockId::new(*id)),
                (None, None) => return Err("race needs --sku or --id".to_string()),
            };
            Ok(CliAction::Race {
                target,
                delta: *sub.get_one::<i64>("delta").unwrap_or(&-1),
                concurrency: *sub.get_one::<usize>("concurrency").unwrap_or(&10),
                quantity: sub.get_one::<u32>("quantity").copied(),
                barrier: sub.get_flag("barrier"),
            })
        }
        Some(("compare", sub)) => Ok(CliAction::Compare {
            quantity: *sub.get_one::<u32>("quantity").unwrap_or(&5),
            concurrency: *sub.get_one::<usize>("concurrency").unwrap_or(&20),
            delta: *sub.get_one::<i64>("delta").unwrap_or(&-1),
        }),
        Some(("seed", _)) => Ok(CliAction::Seed),
        Some(("config-init", _)) => Ok(CliAction::ConfigInit),
        Some((other, _)) => Err(format!("unknown command '{}'", other)),
        None => Err("no command given".to_string()),
    }
}
