//! Period-over-period profit growth.
//!
//! From consecutive `net_profit_after` values: the NPAP ratio is
//! current / previous and TTM growth is that ratio minus one. Both are
//! undefined for the first observation or when the previous value is zero.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthValue {
    pub ttm_growth: Option<f64>,
    pub npap_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfitGrowth {
    prev: Option<f64>,
    value: GrowthValue,
}

impl ProfitGrowth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, net_profit_after: f64) -> GrowthValue {
        let ratio = match self.prev.replace(net_profit_after) {
            Some(prev) if prev != 0.0 => Some(net_profit_after / prev),
            _ => None,
        };
        self.value = GrowthValue {
            ttm_growth: ratio.map(|r| r - 1.0),
            npap_ratio: ratio,
        };
        self.value
    }

    pub fn value(&self) -> GrowthValue {
        self.value
    }
}
