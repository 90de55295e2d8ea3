//! Hit-rate extraction from harness output.

use std::sync::LazyLock;

use cacheforge_types::error::MetricError;
use regex::Regex;

static LLC_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"LLC TOTAL\s+.*?ACCESS:\s*(\d+)\s+HIT:\s*(\d+)").expect("valid LLC TOTAL regex")
});

/// LLC access and hit counters from one harness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlcTotals {
    pub accesses: u64,
    pub hits: u64,
}

impl LlcTotals {
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.accesses as f64
    }
}

/// Find the first `LLC TOTAL ... ACCESS: <n> HIT: <n>` line.
pub fn parse_llc_totals(output: &str) -> Result<LlcTotals, MetricError> {
    let caps = LLC_TOTAL.captures(output).ok_or(MetricError::MissingLine)?;
    let count = |i: usize| -> Result<u64, MetricError> {
        let raw = &caps[i];
        raw.parse::<u64>()
            .map_err(|_| MetricError::InvalidCount(raw.to_string()))
    };
    let accesses = count(1)?;
    let hits = count(2)?;

    if accesses == 0 {
        return Err(MetricError::ZeroAccesses);
    }
    if hits > accesses {
        return Err(MetricError::HitsExceedAccesses { hits, accesses });
    }
    Ok(LlcTotals { accesses, hits })
}

/// `HIT / ACCESS` from the harness output; always within `[0, 1]`.
pub fn parse_hit_rate(output: &str) -> Result<f64, MetricError> {
    parse_llc_totals(output).map(|totals| totals.hit_rate())
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
