//! Bar data access port.

use crate::domain::error::FactorsigError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars of `code` within `[start_date, end_date]`, oldest first.
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FactorsigError>;

    fn list_codes(&self) -> Result<Vec<String>, FactorsigError>;
}
