//! Target portfolio and its translation into per-instrument target weights.

use chrono::NaiveDate;

use crate::domain::intent::TargetWeight;

/// Equal-weighted set of selected instruments with a cash reserve.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPortfolio {
    pub date: NaiveDate,
    members: Vec<String>,
    weight_each: f64,
}

impl TargetPortfolio {
    /// Keeps at most `selnum_final` distinct codes in the given order. Each
    /// member is weighted `(1 - reserve) / selnum_final`, so a short list
    /// leaves the unused slots in cash.
    pub fn new(date: NaiveDate, codes: Vec<String>, selnum_final: usize, reserve: f64) -> Self {
        let mut members: Vec<String> = Vec::with_capacity(selnum_final.min(codes.len()));
        for code in codes {
            if members.len() == selnum_final {
                break;
            }
            if !members.contains(&code) {
                members.push(code);
            }
        }
        let weight_each = if selnum_final == 0 {
            0.0
        } else {
            (1.0 - reserve) / selnum_final as f64
        };
        Self {
            date,
            members,
            weight_each,
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, code: &str) -> bool {
        self.members.iter().any(|m| m == code)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn weight_each(&self) -> f64 {
        self.weight_each
    }

    pub fn weight(&self, code: &str) -> f64 {
        if self.contains(code) {
            self.weight_each
        } else {
            0.0
        }
    }
}

/// One target-weight intent per tracked instrument: the member weight when
/// selected, zero otherwise.
pub fn translate<'a, I>(target: &TargetPortfolio, tracked: I) -> Vec<TargetWeight>
where
    I: IntoIterator<Item = &'a str>,
{
    tracked
        .into_iter()
        .map(|code| TargetWeight {
            code: code.to_string(),
            date: target.date,
            target_weight: target.weight(code),
        })
        .collect()
}
