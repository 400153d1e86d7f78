//! CLI definition and dispatch.
//!
//! Each command loads an INI file, validates it, replays the configured CSV
//! bars date by date through a driver backed by the paper execution port,
//! and prints the submitted intents as CSV.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::{write_order_intents, write_target_weights, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_execution::PaperExecution;
use crate::domain::code_data::{bars_on, build_unified_timeline};
use crate::domain::config_validation::{
    parse_date_range, validate_run_config, validate_selection_config, validate_signal_config,
    DEFAULT_EQUITY,
};
use crate::domain::error::FactorsigError;
use crate::domain::scheduler::{parse_triggers, RebalanceScheduler};
use crate::domain::selection::{FactorWeights, SelectionConfig};
use crate::domain::signal::SignalConfig;
use crate::domain::snapshot::FactorParams;
use crate::domain::strategy::{SelectionStrategy, SignalStrategy};
use crate::domain::universe::{load_universe, parse_codes, Universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "factorsig", about = "Factor selection and trading signal replay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay bars through the selection engine and print target weights
    Select {
        #[arg(short, long)]
        config: PathBuf,
        /// Write CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay bars through the signal state machine and print orders
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Select { config, output } => run_select(&config, output.as_deref()),
        Command::Signals {
            config,
            code,
            output,
        } => run_signals(&config, code.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FactorsigError> {
    FileConfigAdapter::from_file(path).map_err(|e| FactorsigError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn run_validate(config_path: &Path) -> Result<(), FactorsigError> {
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;
    validate_selection_config(&adapter)?;
    validate_signal_config(&adapter)?;
    if let Some(codes) = adapter.get_string("data", "codes") {
        parse_codes(&codes)?;
    }
    info!(config = %config_path.display(), "configuration is valid");
    Ok(())
}

pub fn run_select(config_path: &Path, output: Option<&Path>) -> Result<(), FactorsigError> {
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;
    validate_selection_config(&adapter)?;

    let data = data_port(&adapter)?;
    let codes = resolve_codes(None, &adapter, &data)?;
    let universe = load_run_universe(&adapter, &data, codes, 1)?;

    let strategy = SelectionStrategy::new(
        &universe.codes(),
        build_factor_params(&adapter),
        build_scheduler(&adapter)?,
        build_selection_config(&adapter),
    )
    .with_parallel(adapter.get_bool("selection", "parallel", false));

    let mut port = PaperExecution::new(build_equity(&adapter));
    run_selection_pipeline(&universe, strategy, &mut port);

    write_output(output, |out| write_target_weights(out, port.targets()))
}

pub fn run_signals(
    config_path: &Path,
    code_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), FactorsigError> {
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;
    validate_signal_config(&adapter)?;

    let signal_config = build_signal_config(&adapter);
    let warmup = signal_config.macd_slow + signal_config.macd_signal;

    let data = data_port(&adapter)?;
    let codes = resolve_codes(code_override, &adapter, &data)?;
    let universe = load_run_universe(&adapter, &data, codes, warmup)?;

    let strategy = SignalStrategy::new(&universe.codes(), &signal_config);
    let mut port = PaperExecution::new(build_equity(&adapter));
    run_signal_pipeline(&universe, strategy, &mut port);

    write_output(output, |out| write_order_intents(out, port.orders()))
}

/// Replays the universe date by date; returns the number of rebalances.
pub fn run_selection_pipeline(
    universe: &Universe,
    mut strategy: SelectionStrategy,
    port: &mut PaperExecution,
) -> usize {
    let timeline = build_unified_timeline(&universe.instruments);
    info!(
        instruments = universe.count(),
        dates = timeline.len(),
        "running selection replay"
    );

    let mut rebalances = 0;
    for date in timeline {
        let bars = bars_on(&universe.instruments, date);
        if let Some(outcome) = strategy.on_bars(date, &bars, port) {
            rebalances += 1;
            info!(
                %date,
                selected = ?outcome.target.members(),
                fallback = outcome.fallback_used,
                "target portfolio"
            );
        }
    }
    rebalances
}

/// Replays the universe date by date; returns the number of orders.
pub fn run_signal_pipeline(
    universe: &Universe,
    mut strategy: SignalStrategy,
    port: &mut PaperExecution,
) -> usize {
    let timeline = build_unified_timeline(&universe.instruments);
    info!(
        instruments = universe.count(),
        dates = timeline.len(),
        "running signal replay"
    );

    let mut orders = 0;
    for date in timeline {
        let bars = bars_on(&universe.instruments, date);
        orders += strategy.on_bars(&bars, port).len();
    }
    orders
}

fn data_port(config: &dyn ConfigPort) -> Result<CsvAdapter, FactorsigError> {
    let dir = config
        .get_string("data", "dir")
        .ok_or_else(|| FactorsigError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

fn load_run_universe(
    config: &dyn ConfigPort,
    data: &dyn DataPort,
    codes: Vec<String>,
    minimum_bars: usize,
) -> Result<Universe, FactorsigError> {
    let (start_date, end_date) = parse_date_range(config)?;
    load_universe(data, codes, start_date, end_date, minimum_bars)
}

/// `--code`, then `[data] codes`, then every file the data port lists.
pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
    data: &dyn DataPort,
) -> Result<Vec<String>, FactorsigError> {
    if let Some(code) = code_override {
        return Ok(parse_codes(code)?);
    }
    if let Some(codes) = config.get_string("data", "codes") {
        return Ok(parse_codes(&codes)?);
    }
    data.list_codes()
}

pub fn build_factor_params(config: &dyn ConfigPort) -> FactorParams {
    let d = FactorParams::default();
    FactorParams {
        acceleration_window: config.get_int("selection", "acceleration_window", d.acceleration_window as i64)
            as usize,
        momentum_period: config.get_int("selection", "momentum_period", d.momentum_period as i64) as usize,
        momentum_k: config.get_double("selection", "momentum_k", d.momentum_k),
        value_window: config.get_int("selection", "value_window", d.value_window as i64) as usize,
    }
}

pub fn build_selection_config(config: &dyn ConfigPort) -> SelectionConfig {
    let d = SelectionConfig::default();
    let w = &d.weights;
    let weight = |key: &str, default: f64| config.get_double("selection", key, default);

    SelectionConfig {
        selnum_final: config.get_int("selection", "selnum_final", d.selnum_final as i64) as usize,
        reserve: config.get_double("selection", "reserve", d.reserve),
        npap_min: config.get_double("selection", "npap_min", d.npap_min),
        solvency_min: config.get_double("selection", "solvency_min", d.solvency_min),
        roe_min: config.get_double("selection", "roe_min", d.roe_min),
        value_percentile: config.get_double("selection", "value_percentile", d.value_percentile),
        weights: FactorWeights {
            ttm_growth: weight("weight_ttm_growth", w.ttm_growth),
            acceleration: weight("weight_acceleration", w.acceleration),
            npap: weight("weight_npap", w.npap),
            solvency: weight("weight_solvency", w.solvency),
            roe: weight("weight_roe", w.roe),
            avg_value: weight("weight_avg_value", w.avg_value),
            analyst_revision: weight("weight_analyst_revision", w.analyst_revision),
            analyst_growth: weight("weight_analyst_growth", w.analyst_growth),
        },
    }
}

pub fn build_scheduler(config: &dyn ConfigPort) -> Result<RebalanceScheduler, FactorsigError> {
    match config.get_string("schedule", "triggers") {
        None => Ok(RebalanceScheduler::default()),
        Some(s) => parse_triggers(&s)
            .map(RebalanceScheduler::new)
            .map_err(|reason| FactorsigError::invalid("schedule", "triggers", reason)),
    }
}

pub fn build_signal_config(config: &dyn ConfigPort) -> SignalConfig {
    let d = SignalConfig::default();
    let int = |key: &str, default: usize| config.get_int("signal", key, default as i64) as usize;
    let double = |key: &str, default: f64| config.get_double("signal", key, default);

    SignalConfig {
        atr_period: int("atr_period", d.atr_period),
        rsi_period: int("rsi_period", d.rsi_period),
        rsi_long_max: double("rsi_long_max", d.rsi_long_max),
        rsi_short_min: double("rsi_short_min", d.rsi_short_min),
        sma_period: int("sma_period", d.sma_period),
        volume_sma_period: int("volume_sma_period", d.volume_sma_period),
        macd_fast: int("macd_fast", d.macd_fast),
        macd_slow: int("macd_slow", d.macd_slow),
        macd_signal: int("macd_signal", d.macd_signal),
        kdj_period: int("kdj_period", d.kdj_period),
        kdj_fast: int("kdj_fast", d.kdj_fast),
        kdj_slow: int("kdj_slow", d.kdj_slow),
        risk_fraction: double("risk_fraction", d.risk_fraction),
        contract_multiplier: double("contract_multiplier", d.contract_multiplier),
        margin_rate: double("margin_rate", d.margin_rate),
        max_pyramid: config.get_int("signal", "max_pyramid", d.max_pyramid as i64) as u32,
        long_pyramid_atr: double("long_pyramid_atr", d.long_pyramid_atr),
        short_pyramid_atr: double("short_pyramid_atr", d.short_pyramid_atr),
        stop_loss_atr: double("stop_loss_atr", d.stop_loss_atr),
        take_profit_atr: double("take_profit_atr", d.take_profit_atr),
    }
}

pub fn build_equity(config: &dyn ConfigPort) -> f64 {
    config.get_double("account", "equity", DEFAULT_EQUITY)
}

fn write_output<F>(output: Option<&Path>, write: F) -> Result<(), FactorsigError>
where
    F: FnOnce(Box<dyn io::Write>) -> Result<(), FactorsigError>,
{
    let out: Box<dyn io::Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    write(out)?;
    if let Some(path) = output {
        info!(path = %path.display(), "output written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn builders_use_defaults_for_missing_keys() {
        let c = config("[data]\ndir = x\n");
        assert_eq!(build_selection_config(&c), SelectionConfig::default());
        assert_eq!(build_signal_config(&c), SignalConfig::default());
        assert_eq!(build_factor_params(&c), FactorParams::default());
        assert_eq!(build_equity(&c), DEFAULT_EQUITY);
        let scheduler = build_scheduler(&c).unwrap();
        assert_eq!(scheduler.triggers().count(), 5);
    }

    #[test]
    fn builders_read_overrides() {
        let c = config(
            "[selection]\nselnum_final = 10\nweight_solvency = 0.5\nmomentum_k = 1.1\n\
             [signal]\nmax_pyramid = 2\nstop_loss_atr = 2.5\n\
             [schedule]\ntriggers = 03-15\n\
             [account]\nequity = 250000\n",
        );
        let s = build_selection_config(&c);
        assert_eq!(s.selnum_final, 10);
        assert_eq!(s.weights.solvency, 0.5);
        assert_eq!(build_factor_params(&c).momentum_k, 1.1);

        let g = build_signal_config(&c);
        assert_eq!(g.max_pyramid, 2);
        assert_eq!(g.stop_loss_atr, 2.5);

        let scheduler = build_scheduler(&c).unwrap();
        assert_eq!(scheduler.triggers().collect::<Vec<_>>(), vec![&(3, 15)]);
        assert_eq!(build_equity(&c), 250_000.0);
    }

    #[test]
    fn bad_triggers_are_config_errors() {
        let c = config("[schedule]\ntriggers = 3/15\n");
        assert!(matches!(
            build_scheduler(&c),
            Err(FactorsigError::ConfigInvalid { key, .. }) if key == "triggers"
        ));
    }
}
