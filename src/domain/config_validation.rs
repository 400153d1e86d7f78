//! Configuration validation.
//!
//! Checks every INI value a run reads before any data is loaded. Absent keys
//! take the documented defaults, so only present-but-wrong values and
//! missing required keys fail.

use crate::domain::error::FactorsigError;
use crate::domain::scheduler::parse_triggers;
use crate::domain::selection::SelectionConfig;
use crate::domain::signal::SignalConfig;
use crate::domain::snapshot::FactorParams;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_EQUITY: f64 = 1_000_000.0;

/// `[data]`, `[schedule]` and `[account]`.
pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), FactorsigError> {
    validate_data_dir(config)?;
    validate_dates(config)?;
    validate_triggers(config)?;
    positive(config, "account", "equity", DEFAULT_EQUITY)?;
    Ok(())
}

pub fn validate_selection_config(config: &dyn ConfigPort) -> Result<(), FactorsigError> {
    let d = SelectionConfig::default();
    let p = FactorParams::default();

    at_least(config, "selection", "selnum_final", d.selnum_final as i64, 1)?;
    fraction(config, "selection", "reserve", d.reserve, false)?;
    fraction(config, "selection", "value_percentile", d.value_percentile, true)?;
    at_least(config, "selection", "acceleration_window", p.acceleration_window as i64, 3)?;
    at_least(config, "selection", "momentum_period", p.momentum_period as i64, 1)?;
    at_least(config, "selection", "value_window", p.value_window as i64, 1)?;
    positive(config, "selection", "momentum_k", p.momentum_k)?;
    Ok(())
}

pub fn validate_signal_config(config: &dyn ConfigPort) -> Result<(), FactorsigError> {
    let d = SignalConfig::default();

    for (key, default) in [
        ("atr_period", d.atr_period),
        ("rsi_period", d.rsi_period),
        ("sma_period", d.sma_period),
        ("volume_sma_period", d.volume_sma_period),
        ("macd_fast", d.macd_fast),
        ("macd_slow", d.macd_slow),
        ("macd_signal", d.macd_signal),
        ("kdj_period", d.kdj_period),
        ("kdj_fast", d.kdj_fast),
        ("kdj_slow", d.kdj_slow),
    ] {
        at_least(config, "signal", key, default as i64, 1)?;
    }

    let fast = config.get_int("signal", "macd_fast", d.macd_fast as i64);
    let slow = config.get_int("signal", "macd_slow", d.macd_slow as i64);
    if fast >= slow {
        return Err(FactorsigError::invalid(
            "signal",
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }

    for (key, default) in [("rsi_long_max", d.rsi_long_max), ("rsi_short_min", d.rsi_short_min)] {
        let value = config.get_double("signal", key, default);
        if !(0.0..=100.0).contains(&value) {
            return Err(FactorsigError::invalid("signal", key, "RSI bound must be within 0..100"));
        }
    }

    fraction(config, "signal", "risk_fraction", d.risk_fraction, true)?;
    fraction(config, "signal", "margin_rate", d.margin_rate, true)?;
    positive(config, "signal", "risk_fraction", d.risk_fraction)?;
    positive(config, "signal", "margin_rate", d.margin_rate)?;
    positive(config, "signal", "contract_multiplier", d.contract_multiplier)?;
    at_least(config, "signal", "max_pyramid", d.max_pyramid as i64, 1)?;
    for (key, default) in [
        ("long_pyramid_atr", d.long_pyramid_atr),
        ("short_pyramid_atr", d.short_pyramid_atr),
        ("stop_loss_atr", d.stop_loss_atr),
        ("take_profit_atr", d.take_profit_atr),
    ] {
        positive(config, "signal", key, default)?;
    }
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), FactorsigError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FactorsigError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FactorsigError> {
    let (start_date, end_date) = parse_date_range(config)?;
    if start_date >= end_date {
        return Err(FactorsigError::invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// `[data] start_date` and `end_date` as dates.
pub fn parse_date_range(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), FactorsigError> {
    let start = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    Ok((start, end))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, FactorsigError> {
    match value {
        None => Err(FactorsigError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FactorsigError::invalid("data", field, format!("invalid {} format, expected YYYY-MM-DD", field))
        }),
    }
}

fn validate_triggers(config: &dyn ConfigPort) -> Result<(), FactorsigError> {
    if let Some(triggers) = config.get_string("schedule", "triggers") {
        parse_triggers(&triggers).map_err(|reason| FactorsigError::invalid("schedule", "triggers", reason))?;
    }
    Ok(())
}

fn at_least(config: &dyn ConfigPort, section: &str, key: &str, default: i64, min: i64) -> Result<(), FactorsigError> {
    let value = config.get_int(section, key, default);
    if value < min {
        return Err(FactorsigError::invalid(
            section,
            key,
            format!("{} must be at least {}", key, min),
        ));
    }
    Ok(())
}

fn positive(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<(), FactorsigError> {
    let value = config.get_double(section, key, default);
    if !(value > 0.0 && value.is_finite()) {
        return Err(FactorsigError::invalid(section, key, format!("{} must be positive", key)));
    }
    Ok(())
}

/// `0 <= value < 1`, or `<= 1` when `inclusive`.
fn fraction(config: &dyn ConfigPort, section: &str, key: &str, default: f64, inclusive: bool) -> Result<(), FactorsigError> {
    let value = config.get_double(section, key, default);
    let upper_ok = if inclusive { value <= 1.0 } else { value < 1.0 };
    if !(value >= 0.0 && upper_ok) {
        let bound = if inclusive { "between 0 and 1" } else { "at least 0 and below 1" };
        return Err(FactorsigError::invalid(section, key, format!("{} must be {}", key, bound)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATA: &str = "[data]\ndir = data\nstart_date = 2020-01-01\nend_date = 2024-12-31\n";

    fn invalid_key(err: FactorsigError) -> String {
        match err {
            FactorsigError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn defaults_pass() {
        let config = make_config(DATA);
        assert!(validate_run_config(&config).is_ok());
        assert!(validate_selection_config(&config).is_ok());
        assert!(validate_signal_config(&config).is_ok());
    }

    #[test]
    fn full_config_passes() {
        let config = make_config(
            r#"
[data]
dir = /srv/bars
codes = 600000,000001
start_date = 2019-01-01
end_date = 2023-12-31

[selection]
selnum_final = 20
reserve = 0.1
value_percentile = 0.8
acceleration_window = 8

[schedule]
triggers = 01-31,04-30,07-15,08-31,10-31

[signal]
atr_period = 15
macd_fast = 12
macd_slow = 26
risk_fraction = 0.01
contract_multiplier = 200

[account]
equity = 500000
"#,
        );
        assert!(validate_run_config(&config).is_ok());
        assert!(validate_selection_config(&config).is_ok());
        assert!(validate_signal_config(&config).is_ok());
    }

    #[test]
    fn missing_dir_fails() {
        let config = make_config("[data]\nstart_date = 2020-01-01\nend_date = 2024-12-31\n");
        let err = validate_run_config(&config).unwrap_err();
        assert!(matches!(err, FactorsigError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[data]\ndir = x\nstart_date = 2020-01-01\n");
        let err = validate_run_config(&config).unwrap_err();
        assert!(matches!(err, FactorsigError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn bad_date_format_fails() {
        let config = make_config("[data]\ndir = x\nstart_date = 01/01/2020\nend_date = 2024-12-31\n");
        assert_eq!(invalid_key(validate_run_config(&config).unwrap_err()), "start_date");
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[data]\ndir = x\nstart_date = 2025-01-01\nend_date = 2024-12-31\n");
        assert_eq!(invalid_key(validate_run_config(&config).unwrap_err()), "start_date");
    }

    #[test]
    fn bad_trigger_fails() {
        let config = make_config(&format!("{DATA}[schedule]\ntriggers = 01-31,02-30\n"));
        assert_eq!(invalid_key(validate_run_config(&config).unwrap_err()), "triggers");
    }

    #[test]
    fn non_positive_equity_fails() {
        let config = make_config(&format!("{DATA}[account]\nequity = 0\n"));
        assert_eq!(invalid_key(validate_run_config(&config).unwrap_err()), "equity");
    }

    #[test]
    fn selection_bounds() {
        for (body, key) in [
            ("selnum_final = 0", "selnum_final"),
            ("reserve = 1.0", "reserve"),
            ("reserve = -0.1", "reserve"),
            ("value_percentile = 1.5", "value_percentile"),
            ("acceleration_window = 2", "acceleration_window"),
            ("momentum_k = 0", "momentum_k"),
        ] {
            let config = make_config(&format!("[selection]\n{body}\n"));
            assert_eq!(invalid_key(validate_selection_config(&config).unwrap_err()), key);
        }
    }

    #[test]
    fn signal_bounds() {
        for (body, key) in [
            ("atr_period = 0", "atr_period"),
            ("macd_fast = 30", "macd_fast"),
            ("rsi_long_max = 120", "rsi_long_max"),
            ("risk_fraction = 0", "risk_fraction"),
            ("margin_rate = 2", "margin_rate"),
            ("contract_multiplier = -1", "contract_multiplier"),
            ("max_pyramid = 0", "max_pyramid"),
            ("stop_loss_atr = 0", "stop_loss_atr"),
        ] {
            let config = make_config(&format!("[signal]\n{body}\n"));
            assert_eq!(invalid_key(validate_signal_config(&config).unwrap_err()), key);
        }
    }

    #[test]
    fn parse_date_range_reads_dates() {
        let config = make_config(DATA);
        let (start, end) = parse_date_range(&config).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }
}
