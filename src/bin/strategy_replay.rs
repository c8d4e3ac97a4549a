//! Strategy Replay Binary
//!
//! Runs a configured strategy on the paper host against market events
//! recorded in a JSON-lines file.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin strategy_replay -- config.toml events.jsonl
//! ```
//!
//! Settings can be overridden from the environment (or a `.env` file), e.g.
//! `MSS__LOG__LEVEL=debug` or `MSS__RUNNER__STATE_FILE=state.json`.

use std::env;
use std::process::ExitCode;

use log::{error, info};

use margin_strategy_sdk::{
    capability::RuleBasedCapabilityManager,
    config::Settings,
    host::PaperHost,
    logging,
    runner::{ReplayFeed, RunnerState, StateStore, StrategyRunner},
    strategy::{ExitReason, Strategy, StrategyContext, StrategyRegistry},
    Result,
};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <config> <events.jsonl>", program_name(&args));
        return ExitCode::FAILURE;
    }

    let settings = match Settings::new(&args[1]) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load config {}: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&settings.log.level);
    match dotenv {
        Ok(path) => info!("Loaded environment from: {}", path.display()),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    match run(settings, &args[2]).await {
        Ok(RunnerState::Exited { reason, .. })
            if reason != ExitReason::FinishedSuccessfully =>
        {
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Replay failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn program_name(args: &[String]) -> &str {
    args.first().map_or("strategy_replay", String::as_str)
}

async fn run(settings: Settings, events_path: &str) -> Result<RunnerState> {
    let pair = settings.strategy.pair.clone();
    let registry = StrategyRegistry::with_builtin();
    let strategy = registry.create_strategy(
        &settings.strategy.type_name,
        &pair,
        settings.strategy.params.clone(),
    )?;
    let strategy_name = strategy.name().to_string();

    let capabilities = RuleBasedCapabilityManager::new(settings.rules.clone())?;
    let host = PaperHost::new(settings.paper.host_input(&pair), capabilities);

    let mut runner = StrategyRunner::new(strategy, host, settings.runner.runner_config());
    if let Some(path) = &settings.runner.state_file {
        let store = StateStore::new(path, &pair, &strategy_name);
        runner = runner.with_state_store(store);
    }

    let mut feed = ReplayFeed::new(events_path);
    runner.run(&mut feed).await?;

    let host = runner.host();
    info!("Final state: {}", runner.state());
    if !host.status().is_empty() {
        info!("Last status: {}", host.status());
    }
    info!(
        "Completed trades: {}, open orders: {}",
        host.get_buffered_completed_trades().len(),
        host.open_order_count()
    );
    for currency in [pair.first(), pair.second()] {
        let funds = host.funds_of(currency);
        info!(
            "{}: available {}, reserved {}, total {}",
            currency, funds.available, funds.reserved, funds.total_for_currency
        );
    }

    Ok(runner.state().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_name() {
        assert_eq!(program_name(&[]), "strategy_replay");
        assert_eq!(program_name(&["./replay".to_string()]), "./replay");
    }
}
