//! Acceleration of profit growth.
//!
//! Keeps the last `window` values of the profit-growth proxy and, once the
//! window is full, fits value = a*t^2 + b*t + c over t = 0..window-1 by
//! ordinary least squares. The quadratic coefficient `a` is the acceleration.
//! Undefined until the window fills, or when the fit is singular (window < 3).

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue, RollingWindow};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_WINDOW: usize = 8;

#[derive(Debug, Clone)]
pub struct Acceleration {
    history: RollingWindow,
    value: Option<f64>,
}

impl Acceleration {
    pub fn new(window: usize) -> Self {
        Self {
            history: RollingWindow::new(window),
            value: None,
        }
    }

    pub fn update(&mut self, proxy: f64) -> Option<f64> {
        self.history.push(proxy);
        self.value = if self.history.is_full() {
            quadratic_coefficient(&self.history)
        } else {
            None
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Default for Acceleration {
    fn default() -> Self {
        Acceleration::new(DEFAULT_WINDOW)
    }
}

/// Least-squares `a` of y = a*t^2 + b*t + c, solved from the 3x3 normal
/// equations by Cramer's rule.
fn quadratic_coefficient(history: &RollingWindow) -> Option<f64> {
    // s[k] = sum t^k, r[k] = sum y * t^k
    let mut s = [0.0_f64; 5];
    let mut r = [0.0_f64; 3];
    for (t, y) in history.iter().enumerate() {
        let t = t as f64;
        let mut p = 1.0;
        for (k, sk) in s.iter_mut().enumerate() {
            *sk += p;
            if k < 3 {
                r[k] += y * p;
            }
            p *= t;
        }
    }

    let m = [[s[4], s[3], s[2]], [s[3], s[2], s[1]], [s[2], s[1], s[0]]];
    let det = det3(&m);
    if det.abs() < f64::EPSILON {
        return None;
    }

    let mut ma = m;
    ma[0][0] = r[2];
    ma[1][0] = r[1];
    ma[2][0] = r[0];
    Some(det3(&ma) / det)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Acceleration of `net_profit_z` over bars carrying fundamentals. Bars
/// without fundamentals are invalid points and do not advance the window.
pub fn calculate_acceleration(bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
    let mut acc = Acceleration::new(window);
    IndicatorSeries::from_stream(IndicatorType::Acceleration(window), bars, |bar| {
        let proxy = bar.fundamentals.as_ref()?.net_profit_z;
        acc.update(proxy).map(IndicatorValue::Simple)
    })
}
