//! CSV file data adapter and intent writers.
//!
//! Each instrument lives in `<dir>/<CODE>.csv`. Columns are addressed by
//! header name: `date,open,high,low,close,volume` are required; any of the
//! fundamental columns may follow. A row carries fundamentals when the file
//! has a `net_profit_after` column and the row's cell is not blank; other
//! blank fundamental cells read as zero (or false for flags). `traded_value`
//! belongs to the bar and is read on every row.

use crate::domain::error::FactorsigError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::intent::{OrderIntent, TargetWeight};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";
const FUNDAMENTALS_KEY: &str = "net_profit_after";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

fn data_err(reason: impl Into<String>) -> FactorsigError {
    FactorsigError::Data {
        reason: reason.into(),
    }
}

/// Header name to column position.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self { index }
    }

    fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn cell<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.index
            .get(name)
            .and_then(|&i| record.get(i))
            .map(str::trim)
    }

    fn required<'r>(&self, record: &'r StringRecord, name: &str) -> Result<&'r str, FactorsigError> {
        self.cell(record, name)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| data_err(format!("missing {} column", name)))
    }

    fn price(&self, record: &StringRecord, name: &str) -> Result<f64, FactorsigError> {
        self.required(record, name)?
            .parse()
            .map_err(|e| data_err(format!("invalid {} value: {}", name, e)))
    }

    fn number(&self, record: &StringRecord, name: &str) -> Result<f64, FactorsigError> {
        match self.cell(record, name) {
            None | Some("") => Ok(0.0),
            Some(s) => s
                .parse()
                .map_err(|e| data_err(format!("invalid {} value: {}", name, e))),
        }
    }

    /// Blank or absent cells are undefined rather than zero.
    fn optional_number(&self, record: &StringRecord, name: &str) -> Result<Option<f64>, FactorsigError> {
        match self.cell(record, name) {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|e| data_err(format!("invalid {} value: {}", name, e))),
        }
    }

    fn flag(&self, record: &StringRecord, name: &str) -> Result<bool, FactorsigError> {
        match self.cell(record, name).map(str::to_lowercase).as_deref() {
            None | Some("") | Some("0") | Some("false") => Ok(false),
            Some("1") | Some("true") => Ok(true),
            Some(other) => Err(data_err(format!("invalid {} flag: {}", name, other))),
        }
    }

    fn volume(&self, record: &StringRecord) -> Result<i64, FactorsigError> {
        let raw = self.required(record, "volume")?;
        raw.parse::<i64>()
            .or_else(|_| raw.parse::<f64>().map(|v| v.round() as i64))
            .map_err(|e| data_err(format!("invalid volume value: {}", e)))
    }

    fn fundamentals(&self, record: &StringRecord) -> Result<Option<Fundamentals>, FactorsigError> {
        if self.cell(record, FUNDAMENTALS_KEY).is_none_or(str::is_empty) {
            return Ok(None);
        }
        Ok(Some(Fundamentals {
            net_profit_after: self.number(record, "net_profit_after")?,
            net_profit_z: self.number(record, "net_profit_z")?,
            con_npgrate_13w: self.number(record, "con_npgrate_13w")?,
            short_term_borrowing: self.number(record, "short_term_borrowing")?,
            short_term_bonds: self.number(record, "short_term_bonds")?,
            non_current_liabilities_due_1y: self.number(record, "non_current_liabilities_due_1y")?,
            monetary_capital: self.number(record, "monetary_capital")?,
            trading_financial_assets: self.number(record, "trading_financial_assets")?,
            net_operating_cash: self.number(record, "net_operating_cash")?,
            total_assets: self.number(record, "total_assets")?,
            total_liabilities: self.number(record, "total_liabilities")?,
            roe_after: self.number(record, "roe_after")?,
            analyst_revision: self.number(record, "analyst_revision")?,
            analyst_growth: self.number(record, "analyst_growth")?,
            recent_issuance: self.flag(record, "recent_issuance")?,
            is_st: self.flag(record, "is_st")?,
        }))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FactorsigError> {
        let path = self.csv_path(code);
        if !path.is_file() {
            return Err(FactorsigError::NoData {
                code: code.to_string(),
            });
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_err(format!("CSV header error in {}: {}", path.display(), e)))?;
        let columns = Columns::new(headers);
        if !columns.has("date") {
            return Err(data_err(format!("{} has no date column", path.display())));
        }

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

            let date_str = columns.required(&record, "date")?;
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
                .map_err(|e| data_err(format!("invalid date format: {}", e)))?;
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: columns.price(&record, "open")?,
                high: columns.price(&record, "high")?,
                low: columns.price(&record, "low")?,
                close: columns.price(&record, "close")?,
                volume: columns.volume(&record)?,
                traded_value: columns.optional_number(&record, "traded_value")?,
                fundamentals: columns.fundamentals(&record)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_codes(&self) -> Result<Vec<String>, FactorsigError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_err(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_err(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }
}

/// Writes `date,code,target_weight` rows.
pub fn write_target_weights<W: Write>(out: W, targets: &[TargetWeight]) -> Result<(), FactorsigError> {
    write_targets_csv(csv::Writer::from_writer(out), targets)
        .map_err(|e| data_err(format!("failed to write targets: {}", e)))
}

/// Writes `date,code,action,size,reason` rows; `size` is blank for closes.
pub fn write_order_intents<W: Write>(out: W, orders: &[OrderIntent]) -> Result<(), FactorsigError> {
    write_orders_csv(csv::Writer::from_writer(out), orders)
        .map_err(|e| data_err(format!("failed to write orders: {}", e)))
}

fn write_targets_csv<W: Write>(mut wtr: csv::Writer<W>, targets: &[TargetWeight]) -> csv::Result<()> {
    wtr.write_record(["date", "code", "target_weight"])?;
    for t in targets {
        wtr.write_record([
            t.date.format(DATE_FORMAT).to_string(),
            t.code.clone(),
            format!("{:.6}", t.target_weight),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_orders_csv<W: Write>(mut wtr: csv::Writer<W>, orders: &[OrderIntent]) -> csv::Result<()> {
    wtr.write_record(["date", "code", "action", "size", "reason"])?;
    for o in orders {
        wtr.write_record([
            o.date.format(DATE_FORMAT).to_string(),
            o.code.clone(),
            o.action.to_string(),
            o.action.size().map(|s| s.to_string()).unwrap_or_default(),
            o.reason.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
