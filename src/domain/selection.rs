//! Cross-sectional selection and scoring engine.
//!
//! Runs on rebalance dates over a [`FactorSnapshot`]:
//!
//! 1. Base pool: top third by TTM growth, then the top half of those with
//!    positive acceleration, ranked by acceleration.
//! 2. Hard filters on quality, solvency, profitability, liquidity and flags.
//!    The liquidity threshold is a percentile of the base pool, not of the
//!    filtered set.
//! 3. Fallback to the base pool when too few instruments pass.
//! 4. Min-max normalization of each factor to [0, 100] (50 when flat).
//! 5. Weighted composite score.
//! 6. Stable descending ranking, skipping halted or zero-volume instruments.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::snapshot::{FactorRow, FactorSnapshot};
use crate::domain::target::TargetPortfolio;

const TTM_KEEP_DIVISOR: usize = 3;
const ACCELERATION_KEEP_DIVISOR: usize = 2;
const NEUTRAL_SCORE: f64 = 50.0;
const MOMENTUM_WEIGHT: f64 = 1.0;

/// Score weights. The solvency term is multiplied by `1 - solvency`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorWeights {
    pub ttm_growth: f64,
    pub acceleration: f64,
    pub npap: f64,
    pub solvency: f64,
    pub roe: f64,
    pub avg_value: f64,
    pub analyst_revision: f64,
    pub analyst_growth: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        FactorWeights {
            ttm_growth: 0.3,
            acceleration: 0.5,
            npap: 0.5,
            solvency: -1.0,
            roe: 0.01,
            avg_value: 0.9,
            analyst_revision: 0.2,
            analyst_growth: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub selnum_final: usize,
    pub reserve: f64,
    pub npap_min: f64,
    pub solvency_min: f64,
    pub roe_min: f64,
    /// Percentile (0..=1) of the base pool's average traded value an
    /// instrument must reach.
    pub value_percentile: f64,
    pub weights: FactorWeights,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            selnum_final: 30,
            reserve: 0.05,
            npap_min: 0.5,
            solvency_min: -1.0,
            roe_min: 0.01,
            value_percentile: 0.9,
            weights: FactorWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredInstrument {
    pub code: String,
    pub score: f64,
}

/// Everything a rebalance decided, for logging and inspection.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub date: NaiveDate,
    pub base_pool: Vec<String>,
    pub eligible: Vec<String>,
    pub fallback_used: bool,
    pub value_threshold: Option<f64>,
    /// Eligible instruments by descending score.
    pub ranked: Vec<ScoredInstrument>,
    /// Ranked instruments passed over because they could not trade.
    pub skipped: Vec<String>,
    pub target: TargetPortfolio,
}

/// Keep `n / divisor` members, but never drop a non-empty stage to nothing.
fn keep_count(n: usize, divisor: usize) -> usize {
    if n == 0 { 0 } else { (n / divisor).max(1) }
}

/// Stage 1: TTM growth top third, then the positive-acceleration top half.
pub fn base_pool(rows: &[FactorRow]) -> Vec<&FactorRow> {
    let mut by_ttm: Vec<(&FactorRow, f64)> = rows
        .iter()
        .filter_map(|r| r.ttm_growth.map(|g| (r, g)))
        .collect();
    by_ttm.sort_by(|a, b| b.1.total_cmp(&a.1));
    by_ttm.truncate(keep_count(by_ttm.len(), TTM_KEEP_DIVISOR));

    let mut by_acc: Vec<(&FactorRow, f64)> = by_ttm
        .into_iter()
        .filter_map(|(r, _)| r.acceleration.filter(|a| *a > 0.0).map(|a| (r, a)))
        .collect();
    by_acc.sort_by(|a, b| b.1.total_cmp(&a.1));
    by_acc.truncate(keep_count(by_acc.len(), ACCELERATION_KEEP_DIVISOR));

    by_acc.into_iter().map(|(r, _)| r).collect()
}

/// Percentile with linear interpolation between closest ranks; `q` in 0..=1.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Stage 2. Undefined factors fail their filter.
pub fn passes_hard_filters(row: &FactorRow, value_threshold: Option<f64>, config: &SelectionConfig) -> bool {
    let above = |v: Option<f64>, min: f64| v.is_some_and(|v| v > min);

    above(row.npap_ratio, config.npap_min)
        && above(row.solvency, config.solvency_min)
        && above(row.roe, config.roe_min)
        && matches!((row.avg_value, value_threshold), (Some(v), Some(t)) if v >= t)
        && !row.recent_issuance
        && !row.is_st
}

/// Min-max scale the defined values to [0, 100]. Undefined inputs stay
/// undefined and do not take part in the min/max; a flat factor maps every
/// defined value to 50.
pub fn normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let defined = values.iter().flatten().copied();
    let (min, max) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    values
        .iter()
        .map(|v| {
            v.map(|v| {
                if min == max {
                    NEUTRAL_SCORE
                } else {
                    (v - min) / (max - min) * 100.0
                }
            })
        })
        .collect()
}

/// Stage 4 and 5 over an eligible set of complete rows, in input order.
pub fn composite_scores(eligible: &[&FactorRow], weights: &FactorWeights) -> Vec<ScoredInstrument> {
    let column = |f: fn(&FactorRow) -> Option<f64>| -> Vec<Option<f64>> {
        normalize(&eligible.iter().map(|r| f(r)).collect::<Vec<_>>())
    };

    let terms: [(f64, Vec<Option<f64>>); 9] = [
        (weights.ttm_growth, column(|r| r.ttm_growth)),
        (weights.acceleration, column(|r| r.acceleration)),
        (weights.npap, column(|r| r.npap_ratio)),
        (1.0 - weights.solvency, column(|r| r.solvency)),
        (weights.roe, column(|r| r.roe)),
        (weights.avg_value, column(|r| r.avg_value)),
        (MOMENTUM_WEIGHT, column(|r| r.momentum)),
        (weights.analyst_revision, column(|r| r.analyst_revision)),
        (weights.analyst_growth, column(|r| r.analyst_growth)),
    ];

    eligible
        .iter()
        .enumerate()
        .map(|(i, row)| ScoredInstrument {
            code: row.code.clone(),
            score: terms
                .iter()
                .map(|(w, col)| col[i].map_or(0.0, |v| w * v))
                .sum(),
        })
        .collect()
}

/// Full pipeline for one rebalance date.
pub fn select(snapshot: &FactorSnapshot, config: &SelectionConfig) -> SelectionOutcome {
    let base = base_pool(&snapshot.rows);

    let base_values: Vec<f64> = base.iter().filter_map(|r| r.avg_value).collect();
    let value_threshold = percentile(&base_values, config.value_percentile);

    let filtered: Vec<&FactorRow> = base
        .iter()
        .copied()
        .filter(|r| passes_hard_filters(r, value_threshold, config) && r.is_complete())
        .collect();

    let fallback_used = filtered.len() < config.selnum_final;
    let eligible: Vec<&FactorRow> = if fallback_used {
        warn!(
            date = %snapshot.date,
            passed = filtered.len(),
            wanted = config.selnum_final,
            "too few instruments passed the hard filters, using the base pool"
        );
        base.iter().copied().filter(|r| r.is_complete()).collect()
    } else {
        filtered
    };

    let mut ranked = composite_scores(&eligible, &config.weights);
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut chosen = Vec::with_capacity(config.selnum_final);
    let mut skipped = Vec::new();
    for scored in &ranked {
        if chosen.len() == config.selnum_final {
            break;
        }
        let tradeable = snapshot
            .get(&scored.code)
            .is_some_and(|r| !r.is_untradeable());
        if tradeable {
            chosen.push(scored.code.clone());
        } else {
            debug!(code = %scored.code, "skipping halted or untraded instrument");
            skipped.push(scored.code.clone());
        }
    }

    let target = TargetPortfolio::new(snapshot.date, chosen, config.selnum_final, config.reserve);
    info!(
        date = %snapshot.date,
        universe = snapshot.len(),
        base_pool = base.len(),
        eligible = eligible.len(),
        selected = target.len(),
        "selection complete"
    );

    SelectionOutcome {
        date: snapshot.date,
        base_pool: base.iter().map(|r| r.code.clone()).collect(),
        eligible: eligible.iter().map(|r| r.code.clone()).collect(),
        fallback_used,
        value_threshold,
        ranked,
        skipped,
        target,
    }
}
