#![deny(warnings)]

//! Run orchestration: builds the monthly timeline, aggregates final metrics
//! and attaches advisor output.
//!
//! A run owns its RNG and holds no shared state, so independent runs can
//! execute on separate threads (see [`monte_carlo`]).

pub mod monte_carlo;

pub use monte_carlo::{run_monte_carlo, Distribution, MonteCarloSummary};

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sim_ai::ScenarioMode;
use sim_core::{
    validate_parameters, FinalMetrics, ProjectedResults, SimConfig, SimulationParameters,
    SimulationResults, TimelineData, ValidationError, WhatIfScenario,
};
use sim_econ::{rng_from_seed, MarketModel, MonthState};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// Parameters failed validation at entry.
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ValidationError),
    /// An observer stopped the run; the partial timeline was discarded.
    #[error("simulation cancelled after {completed_months} months")]
    Cancelled { completed_months: u32 },
}

/// Hook called after every simulated month.
pub trait MonthObserver {
    fn on_month(&mut self, record: &TimelineData) -> ControlFlow<()>;
}

impl<F> MonthObserver for F
where
    F: FnMut(&TimelineData) -> ControlFlow<()>,
{
    fn on_month(&mut self, record: &TimelineData) -> ControlFlow<()> {
        self(record)
    }
}

/// Cancellation token that can be flipped from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl MonthObserver for CancelFlag {
    fn on_month(&mut self, _record: &TimelineData) -> ControlFlow<()> {
        if self.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Run the monthly step across the horizon, letting `observer` stop early.
pub fn build_timeline_with<R, O>(
    model: &MarketModel<'_>,
    rng: &mut R,
    observer: &mut O,
) -> Result<Vec<TimelineData>, SimError>
where
    R: Rng + ?Sized,
    O: MonthObserver + ?Sized,
{
    let months = model.params().simulation_duration;
    let mut timeline = Vec::with_capacity(months as usize);
    let mut state = model.initial_state();
    for month in 1..=months {
        let record = model.step(month, state, rng);
        debug!(
            month,
            share = record.market_share,
            customers = record.customer_base,
            "month simulated"
        );
        state = MonthState::from(&record);
        let flow = observer.on_month(&record);
        timeline.push(record);
        if flow.is_break() {
            return Err(SimError::Cancelled {
                completed_months: month,
            });
        }
    }
    Ok(timeline)
}

/// Run the monthly step across the whole horizon.
pub fn build_timeline<R: Rng + ?Sized>(model: &MarketModel<'_>, rng: &mut R) -> Vec<TimelineData> {
    let mut never = |_: &TimelineData| ControlFlow::Continue(());
    build_timeline_with(model, rng, &mut never).unwrap_or_default()
}

/// Reduce a timeline to its summary. An empty timeline yields zeros.
pub fn aggregate_final_metrics(timeline: &[TimelineData]) -> FinalMetrics {
    let total_revenue: Decimal = timeline.iter().map(|r| r.revenue).sum();
    let total_profit: Decimal = timeline.iter().map(|r| r.profit).sum();
    let final_market_share = timeline.last().map(|r| r.market_share).unwrap_or(0.0);
    let customer_growth_percent = match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => {
            (last.customer_base as f64 - first.customer_base as f64)
                / (first.customer_base.max(1) as f64)
                * 100.0
        }
        _ => 0.0,
    };
    let brand_value = (total_revenue * Decimal::new(2, 1)
        + Decimal::from_f64(final_market_share * 100_000.0).unwrap_or(Decimal::ZERO))
    .round_dp(2);
    FinalMetrics {
        total_revenue,
        total_profit,
        final_market_share,
        customer_growth_percent,
        brand_value,
    }
}

/// Simulate with an injected RNG and observer. Parameters are validated first.
pub fn run_simulation_with<R, O>(
    params: &SimulationParameters,
    start: NaiveDate,
    rng: &mut R,
    observer: &mut O,
) -> Result<SimulationResults, SimError>
where
    R: Rng + ?Sized,
    O: MonthObserver + ?Sized,
{
    validate_parameters(params)?;
    let model = MarketModel::new(params, start);
    let timeline = build_timeline_with(&model, rng, observer)?;
    let final_metrics = aggregate_final_metrics(&timeline);
    let mut results = SimulationResults {
        timeline,
        final_metrics,
        recommendations: Vec::new(),
        scenarios: sim_ai::generate_scenarios(params),
    };
    let data = sim_ai::analyze(params, &results);
    results.recommendations =
        sim_ai::generate_recommendations(&data, results.final_metrics.total_revenue);
    Ok(results)
}

/// Validate, simulate and attach recommendations and heuristic scenarios.
pub fn run_simulation(
    params: &SimulationParameters,
    cfg: &SimConfig,
) -> Result<SimulationResults, SimError> {
    info!(
        months = params.simulation_duration,
        competitors = params.competitor_count,
        seed = ?cfg.rng_seed,
        "starting simulation"
    );
    let mut rng = rng_from_seed(cfg.rng_seed);
    let mut never = |_: &TimelineData| ControlFlow::Continue(());
    let results = run_simulation_with(params, cfg.start_date, &mut rng, &mut never)?;
    info!(
        final_share = results.final_metrics.final_market_share,
        revenue = %results.final_metrics.total_revenue,
        recommendations = results.recommendations.len(),
        "simulation finished"
    );
    Ok(results)
}

/// Like [`run_simulation`], with scenario projections produced in `mode`.
pub fn run_simulation_with_mode(
    params: &SimulationParameters,
    cfg: &SimConfig,
    mode: ScenarioMode,
) -> Result<SimulationResults, SimError> {
    let mut results = run_simulation(params, cfg)?;
    if mode == ScenarioMode::Resimulated {
        results.scenarios = resimulate_scenarios(params, &results, cfg)?;
    }
    Ok(results)
}

/// Re-run every canned scenario with its overrides and the run's seed,
/// replacing the heuristic share and revenue deltas with measured ones.
/// Risk level and probability keep their canned values.
///
/// Every step consumes the same draws whatever the pricing model, so each
/// alternative sees the baseline's competitor jitter month for month and the
/// deltas reflect only the parameter change. Scenarios never alter the
/// horizon, so total revenue is compared over equal month counts.
pub fn resimulate_scenarios(
    params: &SimulationParameters,
    baseline: &SimulationResults,
    cfg: &SimConfig,
) -> Result<Vec<WhatIfScenario>, SimError> {
    let base = &baseline.final_metrics;
    let mut out = Vec::new();
    for scenario in sim_ai::generate_scenarios(params) {
        let alt_params = scenario.parameter_changes.apply(params);
        validate_parameters(&alt_params)?;
        let model = MarketModel::new(&alt_params, cfg.start_date);
        let mut rng = rng_from_seed(cfg.rng_seed);
        let alt = aggregate_final_metrics(&build_timeline(&model, &mut rng));
        let revenue_change_percent = if base.total_revenue > Decimal::ZERO {
            ((alt.total_revenue - base.total_revenue) / base.total_revenue)
                .to_f64()
                .unwrap_or(0.0)
                * 100.0
        } else {
            0.0
        };
        debug!(scenario = %scenario.id, revenue_change_percent, "scenario re-simulated");
        out.push(WhatIfScenario {
            projected_results: ProjectedResults {
                market_share_change: alt.final_market_share - base.final_market_share,
                revenue_change_percent,
                ..scenario.projected_results
            },
            ..scenario
        });
    }
    Ok(out)
}
