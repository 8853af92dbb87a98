//! Parallel batches of independent seeded runs.
//!
//! Each run builds its own RNG from `base_seed + index`, so a batch is
//! reproducible regardless of how rayon schedules it. Aggregation only reads
//! finished results.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sim_core::{validate_parameters, SimulationParameters};
use sim_econ::{rng_from_seed, MarketModel};
use tracing::info;

use crate::{aggregate_final_metrics, build_timeline, SimError};

/// Summary statistics over a batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

impl Distribution {
    /// Nearest-rank statistics. Empty input yields all zeros.
    pub fn from_values(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let n = values.len();
        let pct = |p: f64| {
            let idx = ((p / 100.0) * (n as f64 - 1.0)).round() as usize;
            values[idx.min(n - 1)]
        };
        Self {
            mean: values.iter().sum::<f64>() / n as f64,
            p10: pct(10.0),
            p50: pct(50.0),
            p90: pct(90.0),
            min: values[0],
            max: values[n - 1],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloSummary {
    pub runs: usize,
    pub base_seed: u64,
    pub final_market_share: Distribution,
    pub total_revenue: Distribution,
    pub total_profit: Distribution,
}

/// Run `runs` independent simulations in parallel and summarize the outcomes.
pub fn run_monte_carlo(
    params: &SimulationParameters,
    start: chrono::NaiveDate,
    runs: usize,
    base_seed: u64,
) -> Result<MonteCarloSummary, SimError> {
    validate_parameters(params)?;
    info!(runs, base_seed, "starting monte carlo batch");
    let outcomes: Vec<(f64, f64, f64)> = (0..runs)
        .into_par_iter()
        .map(|i| {
            let model = MarketModel::new(params, start);
            let mut rng = rng_from_seed(Some(base_seed.wrapping_add(i as u64)));
            let fm = aggregate_final_metrics(&build_timeline(&model, &mut rng));
            (
                fm.final_market_share,
                fm.total_revenue.to_f64().unwrap_or(0.0),
                fm.total_profit.to_f64().unwrap_or(0.0),
            )
        })
        .collect();
    let (shares, rest): (Vec<f64>, Vec<(f64, f64)>) =
        outcomes.into_iter().map(|(s, r, p)| (s, (r, p))).unzip();
    let (revenues, profits): (Vec<f64>, Vec<f64>) = rest.into_iter().unzip();
    Ok(MonteCarloSummary {
        runs,
        base_seed,
        final_market_share: Distribution::from_values(shares),
        total_revenue: Distribution::from_values(revenues),
        total_profit: Distribution::from_values(profits),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_percentiles() {
        let d = Distribution::from_values((1..=11).map(|x| x as f64).collect());
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 11.0);
        assert_eq!(d.p50, 6.0);
        assert_eq!(d.p10, 2.0);
        assert_eq!(d.p90, 10.0);
        assert_eq!(d.mean, 6.0);
        assert_eq!(Distribution::from_values(vec![]), Distribution::default());
    }
}
