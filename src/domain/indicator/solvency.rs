//! Solvency ratio: (cash - short-term debt) / net assets.

use crate::domain::fundamentals::Fundamentals;

/// `None` when net assets are zero.
pub fn solvency(f: &Fundamentals) -> Option<f64> {
    let net_assets = f.net_assets();
    if net_assets == 0.0 {
        return None;
    }
    Some((f.cash() - f.short_term_debt()) / net_assets)
}
