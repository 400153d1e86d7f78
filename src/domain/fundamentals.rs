//! Per-bar fundamental, analyst and flag fields consumed by the selection engine.

/// Fundamental record attached to a bar. Values are as reported on that date;
/// the core never mutates them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fundamentals {
    pub net_profit_after: f64,
    /// Profit-growth proxy fed to the acceleration regression.
    pub net_profit_z: f64,
    pub con_npgrate_13w: f64,
    pub short_term_borrowing: f64,
    pub short_term_bonds: f64,
    pub non_current_liabilities_due_1y: f64,
    pub monetary_capital: f64,
    pub trading_financial_assets: f64,
    pub net_operating_cash: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub roe_after: f64,
    pub analyst_revision: f64,
    pub analyst_growth: f64,
    pub recent_issuance: bool,
    pub is_st: bool,
}

impl Fundamentals {
    pub fn cash(&self) -> f64 {
        self.monetary_capital + self.trading_financial_assets - self.net_operating_cash
    }

    pub fn short_term_debt(&self) -> f64 {
        self.short_term_borrowing + self.short_term_bonds + self.non_current_liabilities_due_1y
    }

    pub fn net_assets(&self) -> f64 {
        self.total_assets - self.total_liabilities
    }
}
