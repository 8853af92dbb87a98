#![deny(warnings)]

//! Market models: latent dynamics and the monthly state transition.
//!
//! This module provides:
//! - Month-invariant market dynamics (competitor pressure, seasonality)
//! - The single-step transition from one month's state to the next record
//! - A seedable RNG so identical inputs reproduce identical timelines

use chrono::{Datelike, Months, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    Kpis, MarketDynamics, PricingModel, PromotionChannel, SimulationParameters, TimelineData,
};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::warn;

/// RNG used by every stochastic draw in a run.
pub type SimRng = ChaCha8Rng;

/// Cap on marketing-driven share gain per month, in percentage points.
pub const MAX_MARKETING_IMPACT: f64 = 5.0;
/// Cap on structural competitor strength.
pub const MAX_COMPETITOR_STRENGTH: f64 = 0.9;
/// Minimum monthly churn.
pub const MIN_CHURN_RATE: f64 = 0.01;

const ALLOCATION_TOLERANCE: f64 = 1e-6;

/// Build the run RNG. `None` seeds from OS entropy.
///
/// Example:
/// let mut a = rng_from_seed(Some(7));
/// let mut b = rng_from_seed(Some(7));
/// assert_eq!(a.gen::<u64>(), b.gen::<u64>());
pub fn rng_from_seed(seed: Option<u64>) -> SimRng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Structural headwind from rivals: min(0.9, 0.3 + 0.1 * count).
pub fn competitor_strength(competitor_count: u32) -> f64 {
    (0.3 + 0.1 * competitor_count as f64).min(MAX_COMPETITOR_STRENGTH)
}

/// Twelve monthly multipliers `1 + 0.2 * sin(2πi/12)`, or all 1.0 when disabled.
pub fn seasonality_factors(enabled: bool) -> [f64; 12] {
    let mut out = [1.0; 12];
    if enabled {
        for (i, f) in out.iter_mut().enumerate() {
            *f = 1.0 + 0.2 * (2.0 * PI * i as f64 / 12.0).sin();
        }
    }
    out
}

/// Derive the month-invariant latent factors for a run.
pub fn market_dynamics(params: &SimulationParameters) -> MarketDynamics {
    MarketDynamics {
        competitor_strength: competitor_strength(params.competitor_count),
        seasonality_factors: seasonality_factors(params.promotion_strategy.seasonality),
        price_elasticity: params.pricing_strategy.price_elasticity,
        innovation_impact_cap: (params.product_strategy.innovation_rate * 0.5).min(1.0),
    }
}

/// Channel allocations in percent, rescaled to sum to 100 when they do not.
///
/// Returns zeros when the total is not positive.
pub fn normalized_allocations(channels: &[PromotionChannel]) -> Vec<f64> {
    let total: f64 = channels.iter().map(|c| c.budget_allocation_percent).sum();
    if total <= 0.0 || !total.is_finite() {
        return vec![0.0; channels.len()];
    }
    if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        warn!(
            total,
            channels = channels.len(),
            "channel allocations do not sum to 100; normalizing"
        );
    }
    channels
        .iter()
        .map(|c| c.budget_allocation_percent * 100.0 / total)
        .collect()
}

/// Share gain from promotion: sum of `effectiveness * log10(1 + budget/100k)`,
/// doubled and capped at 5 points.
pub fn marketing_impact(channels: &[(f64, f64)]) -> f64 {
    let raw: f64 = channels
        .iter()
        .map(|&(effectiveness, budget)| effectiveness * (1.0 + budget.max(0.0) / 100_000.0).log10())
        .sum();
    (raw * 2.0).min(MAX_MARKETING_IMPACT)
}

/// Price multiplier for the pricing model.
///
/// The dynamic draw is taken for every model and discarded unless the model
/// is `Dynamic`, so runs that differ only in pricing model share one random
/// stream month for month.
pub fn price_multiplier<R: Rng + ?Sized>(model: PricingModel, rng: &mut R) -> f64 {
    let dynamic: f64 = rng.gen_range(0.9..=1.2);
    match model {
        PricingModel::Penetration => 0.8,
        PricingModel::Competitive => 1.0,
        PricingModel::Premium => 1.3,
        PricingModel::Dynamic => dynamic,
    }
}

/// Share change from pricing: `-(multiplier - 1) * price * elasticity * 0.1`.
pub fn price_impact(multiplier: f64, base_price: f64, elasticity: f64) -> f64 {
    -(multiplier - 1.0) * base_price * elasticity * 0.1
}

/// Organic support from product quality on a 1–10 scale.
pub fn quality_impact(quality_level: f64) -> f64 {
    quality_level / 10.0
}

/// Stochastic headwind: `strength * U(0.8, 1.2) * 2`.
pub fn competitor_impact<R: Rng + ?Sized>(strength: f64, rng: &mut R) -> f64 {
    let jitter: f64 = rng.gen_range(0.8..=1.2);
    strength * jitter * 2.0
}

/// Monthly churn, floored at 1%.
pub fn churn_rate(quality_impact: f64) -> f64 {
    (0.05 - quality_impact * 0.03).max(MIN_CHURN_RATE)
}

/// Split the remaining share evenly across rivals with ±20% jitter each.
/// Reporting only; never read back by the step.
pub fn competitor_shares<R: Rng + ?Sized>(
    our_share: f64,
    competitor_count: u32,
    rng: &mut R,
) -> BTreeMap<String, f64> {
    let mut shares = BTreeMap::new();
    if competitor_count == 0 {
        return shares;
    }
    let even = (100.0 - our_share).max(0.0) / competitor_count as f64;
    for i in 1..=competitor_count {
        let jitter: f64 = rng.gen_range(0.8..=1.2);
        shares.insert(format!("Competitor {i}"), even * jitter);
    }
    shares
}

/// Initial active customers: `floor(market_size * share * 0.001)`.
pub fn initial_customer_base(market_size: u64, initial_share: f64) -> u64 {
    floor_count(market_size as f64 * initial_share * 0.001)
}

fn floor_count(x: f64) -> u64 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    let f = x.floor();
    if f >= u64::MAX as f64 {
        return u64::MAX;
    }
    f as u64
}

fn dec(x: f64) -> Decimal {
    Decimal::from_f64(x).unwrap_or(Decimal::ZERO)
}

/// The state carried from one month to the next.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthState {
    pub market_share: f64,
    pub customer_base: u64,
}

impl From<&TimelineData> for MonthState {
    fn from(r: &TimelineData) -> Self {
        Self {
            market_share: r.market_share,
            customer_base: r.customer_base,
        }
    }
}

/// Immutable per-run context for the monthly step.
///
/// Holds the derived dynamics and the per-channel budgets so allocation
/// normalization happens once per run rather than once per month.
#[derive(Clone, Debug)]
pub struct MarketModel<'a> {
    params: &'a SimulationParameters,
    dynamics: MarketDynamics,
    /// (effectiveness, monthly-independent channel budget in USD)
    channels: Vec<(f64, f64)>,
    start: NaiveDate,
}

impl<'a> MarketModel<'a> {
    /// Build the context. `start` is truncated to the first of its month.
    pub fn new(params: &'a SimulationParameters, start: NaiveDate) -> Self {
        let marketing = params.budget.marketing.to_f64().unwrap_or(0.0);
        let channels = params
            .promotion_strategy
            .channels
            .iter()
            .zip(normalized_allocations(&params.promotion_strategy.channels))
            .map(|(c, pct)| (c.effectiveness, marketing * pct / 100.0))
            .collect();
        Self {
            params,
            dynamics: market_dynamics(params),
            channels,
            start: start.with_day(1).unwrap_or(start),
        }
    }

    pub fn dynamics(&self) -> &MarketDynamics {
        &self.dynamics
    }

    pub fn params(&self) -> &SimulationParameters {
        self.params
    }

    /// State before month 1.
    pub fn initial_state(&self) -> MonthState {
        MonthState {
            market_share: self.params.initial_market_share,
            customer_base: initial_customer_base(
                self.params.market_size,
                self.params.initial_market_share,
            ),
        }
    }

    /// Calendar month covered by the 1-based `month`.
    pub fn period(&self, month: u32) -> NaiveDate {
        self.start
            .checked_add_months(Months::new(month.saturating_sub(1)))
            .unwrap_or(self.start)
    }

    /// Seasonality multiplier for the 1-based `month`.
    pub fn seasonality(&self, month: u32) -> f64 {
        self.dynamics.seasonality_factors[self.period(month).month0() as usize]
    }

    /// Marketing impact for this run's channels.
    pub fn marketing_impact(&self) -> f64 {
        marketing_impact(&self.channels)
    }

    /// Compute the record for `month` from the previous month's state.
    ///
    /// Draw order is fixed: dynamic price (drawn for every model), competitor
    /// headwind, then one jitter per competitor share.
    pub fn step<R: Rng + ?Sized>(&self, month: u32, prev: MonthState, rng: &mut R) -> TimelineData {
        let p = self.params;
        let base_price = p.pricing_strategy.base_price.to_f64().unwrap_or(0.0);
        let season = self.seasonality(month);

        let marketing = self.marketing_impact();
        let multiplier = price_multiplier(p.pricing_strategy.model, rng);
        let price = price_impact(multiplier, base_price, p.pricing_strategy.price_elasticity);
        let quality = quality_impact(p.product_strategy.quality_level);
        let competitor = competitor_impact(self.dynamics.competitor_strength, rng);

        let delta = (marketing + price + quality - competitor) * season;
        let market_share = (prev.market_share + delta).clamp(0.0, 100.0);
        let share_delta = market_share - prev.market_share;

        let churn = churn_rate(quality);
        let new_customers = floor_count(p.market_size as f64 * share_delta.max(0.0) * 0.001);
        let churned = floor_count(prev.customer_base as f64 * churn);
        let customer_base = prev
            .customer_base
            .saturating_add(new_customers)
            .saturating_sub(churned);

        let revenue =
            (Decimal::from(customer_base) * p.pricing_strategy.base_price * dec(season)).round_dp(2);
        let costs =
            ((p.budget.marketing + p.budget.product + p.budget.operations) / Decimal::from(12))
                .round_dp(2);
        let profit = revenue - costs;

        let cac = if new_customers > 0 {
            (costs * Decimal::new(7, 1) / Decimal::from(new_customers)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let ltv = if customer_base > 0 {
            (revenue / Decimal::from(customer_base) * Decimal::from(12) / dec(churn)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        let roi = if costs > Decimal::ZERO {
            (profit / costs).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };
        let growth_rate = if customer_base > 0 {
            new_customers as f64 / customer_base as f64 * 100.0
        } else {
            0.0
        };

        let competitor_shares = competitor_shares(market_share, p.competitor_count, rng);

        TimelineData {
            month,
            period: self.period(month),
            market_share,
            revenue,
            costs,
            profit,
            customer_base,
            new_customers,
            churned_customers: churned,
            competitor_shares,
            kpis: Kpis {
                cac,
                ltv,
                roi,
                nps: 30.0 + p.product_strategy.quality_level * 5.0,
                churn_rate: churn,
                growth_rate,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Budget, PricingStrategy, ProductStrategy, PromotionStrategy};
    use rand::Rng;

    fn channel(kind: &str, pct: f64, eff: f64) -> PromotionChannel {
        PromotionChannel {
            channel_type: kind.to_string(),
            budget_allocation_percent: pct,
            effectiveness: eff,
            target_audience: String::new(),
        }
    }

    fn params() -> SimulationParameters {
        SimulationParameters {
            market_size: 10_000_000,
            initial_market_share: 15.0,
            competitor_count: 5,
            simulation_duration: 12,
            pricing_strategy: PricingStrategy {
                model: PricingModel::Competitive,
                base_price: Decimal::new(299, 0),
                price_elasticity: 1.2,
                competitor_price_response: 0.5,
            },
            promotion_strategy: PromotionStrategy {
                channels: vec![channel("digital", 50.0, 0.8), channel("tv", 50.0, 0.8)],
                total_budget: Decimal::new(5_000_000, 0),
                seasonality: true,
            },
            product_strategy: ProductStrategy {
                features: vec![],
                quality_level: 7.0,
                innovation_rate: 0.1,
            },
            budget: Budget {
                total: Decimal::new(12_000_000, 0),
                marketing: Decimal::new(5_000_000, 0),
                product: Decimal::new(3_000_000, 0),
                operations: Decimal::new(3_000_000, 0),
                reserve: Decimal::new(1_000_000, 0),
            },
        }
    }

    fn jan() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn competitor_strength_is_capped() {
        assert!((competitor_strength(1) - 0.4).abs() < 1e-12);
        assert!((competitor_strength(5) - 0.8).abs() < 1e-12);
        assert_eq!(competitor_strength(6), 0.9);
        assert_eq!(competitor_strength(100), 0.9);
    }

    #[test]
    fn seasonality_curve_shape() {
        let f = seasonality_factors(true);
        assert_eq!(f[0], 1.0);
        assert!((f[3] - 1.2).abs() < 1e-12);
        assert!((f[9] - 0.8).abs() < 1e-12);
        assert_eq!(seasonality_factors(false), [1.0; 12]);
    }

    #[test]
    fn marketing_impact_has_diminishing_returns_and_cap() {
        let small = marketing_impact(&[(1.0, 100_000.0)]);
        let double = marketing_impact(&[(1.0, 200_000.0)]);
        assert!(double > small);
        assert!(double < 2.0 * small);
        assert_eq!(marketing_impact(&[(10.0, 1e9)]), MAX_MARKETING_IMPACT);
        assert_eq!(marketing_impact(&[]), 0.0);
    }

    #[test]
    fn price_impact_by_model() {
        let mut rng = rng_from_seed(Some(1));
        assert_eq!(price_multiplier(PricingModel::Competitive, &mut rng), 1.0);
        let pen = price_impact(price_multiplier(PricingModel::Penetration, &mut rng), 100.0, 1.0);
        let prem = price_impact(price_multiplier(PricingModel::Premium, &mut rng), 100.0, 1.0);
        assert!(pen > 0.0);
        assert!(prem < 0.0);
        for _ in 0..100 {
            let m = price_multiplier(PricingModel::Dynamic, &mut rng);
            assert!((0.9..=1.2).contains(&m));
        }
    }

    #[test]
    fn every_pricing_model_consumes_the_same_draws() {
        let models = [
            PricingModel::Competitive,
            PricingModel::Penetration,
            PricingModel::Premium,
            PricingModel::Dynamic,
        ];
        let next: Vec<u64> = models
            .iter()
            .map(|&m| {
                let mut rng = rng_from_seed(Some(11));
                price_multiplier(m, &mut rng);
                rng.gen::<u64>()
            })
            .collect();
        assert!(next.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn switching_pricing_model_keeps_competitor_jitter_aligned() {
        let mut dynamic = params();
        dynamic.pricing_strategy.model = PricingModel::Dynamic;
        let mut premium = params();
        premium.pricing_strategy.model = PricingModel::Premium;
        let a = MarketModel::new(&dynamic, jan());
        let b = MarketModel::new(&premium, jan());
        let mut rng_a = rng_from_seed(Some(42));
        let mut rng_b = rng_from_seed(Some(42));
        let (mut sa, mut sb) = (a.initial_state(), b.initial_state());
        for month in 1..=6 {
            sa = MonthState::from(&a.step(month, sa, &mut rng_a));
            sb = MonthState::from(&b.step(month, sb, &mut rng_b));
        }
        assert_eq!(rng_a.gen::<u64>(), rng_b.gen::<u64>());
    }

    #[test]
    fn churn_is_floored() {
        assert!((churn_rate(0.7) - 0.029).abs() < 1e-12);
        assert_eq!(churn_rate(5.0), MIN_CHURN_RATE);
    }

    #[test]
    fn normalization_rescales_unbalanced_allocations() {
        let chans = vec![channel("a", 30.0, 1.0), channel("b", 30.0, 1.0)];
        let n = normalized_allocations(&chans);
        assert!((n[0] - 50.0).abs() < 1e-9);
        assert!((n.iter().sum::<f64>() - 100.0).abs() < 1e-9);
        let zeros = normalized_allocations(&[channel("a", 0.0, 1.0)]);
        assert_eq!(zeros, vec![0.0]);
    }

    #[test]
    fn initial_base_is_ten_percent_of_share_weighted_market() {
        assert_eq!(initial_customer_base(10_000_000, 15.0), 150_000);
        assert_eq!(initial_customer_base(0, 15.0), 0);
    }

    #[test]
    fn first_month_is_seeded_and_bounded() {
        let p = params();
        let model = MarketModel::new(&p, jan());
        let s0 = model.initial_state();
        let a = model.step(1, s0, &mut rng_from_seed(Some(42)));
        let b = model.step(1, s0, &mut rng_from_seed(Some(42)));
        assert_eq!(a, b);
        assert!(a.market_share >= 15.0 && a.market_share <= 20.0);
        assert_eq!(a.period, jan());
        assert_eq!(a.kpis.nps, 65.0);
        assert_eq!(a.costs, Decimal::new(91_666_667, 2));
        assert!(a.revenue > Decimal::ZERO);
    }

    #[test]
    fn zero_customers_yield_zero_kpis() {
        let mut p = params();
        p.initial_market_share = 0.0;
        p.promotion_strategy.channels.clear();
        p.pricing_strategy.model = PricingModel::Premium;
        let model = MarketModel::new(&p, jan());
        let r = model.step(1, model.initial_state(), &mut rng_from_seed(Some(3)));
        assert_eq!(r.market_share, 0.0);
        assert_eq!(r.customer_base, 0);
        assert_eq!(r.kpis.cac, Decimal::ZERO);
        assert_eq!(r.kpis.ltv, Decimal::ZERO);
        assert_eq!(r.kpis.growth_rate, 0.0);
        assert!(r.profit < Decimal::ZERO);
    }

    #[test]
    fn period_advances_by_calendar_month() {
        let p = params();
        let model = MarketModel::new(&p, NaiveDate::from_ymd_opt(2025, 11, 17).unwrap());
        assert_eq!(model.period(1), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(model.period(3), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(model.seasonality(3), 1.0);
    }

    proptest! {
        #[test]
        fn step_keeps_state_in_bounds(prev_share in 0.0f64..=100.0,
                                      prev_base in 0u64..5_000_000,
                                      quality in 1.0f64..=10.0,
                                      elasticity in -5.0f64..5.0,
                                      model_idx in 0usize..4,
                                      seed in any::<u64>()) {
            let mut p = params();
            p.product_strategy.quality_level = quality;
            p.pricing_strategy.price_elasticity = elasticity;
            p.pricing_strategy.model = [
                PricingModel::Competitive,
                PricingModel::Penetration,
                PricingModel::Premium,
                PricingModel::Dynamic,
            ][model_idx];
            let model = MarketModel::new(&p, jan());
            let prev = MonthState { market_share: prev_share, customer_base: prev_base };
            let r = model.step(2, prev, &mut rng_from_seed(Some(seed)));
            prop_assert!((0.0..=100.0).contains(&r.market_share));
            prop_assert!(r.kpis.churn_rate >= MIN_CHURN_RATE);
            prop_assert_eq!(r.customer_base, (prev_base + r.new_customers).saturating_sub(r.churned_customers));
        }

        #[test]
        fn competitor_shares_within_jitter_bound(share in 0.0f64..=100.0,
                                                 count in 1u32..20,
                                                 seed in any::<u64>()) {
            let shares = competitor_shares(share, count, &mut rng_from_seed(Some(seed)));
            prop_assert_eq!(shares.len(), count as usize);
            let remaining = 100.0 - share;
            let total: f64 = shares.values().sum();
            prop_assert!(total >= remaining * 0.8 - 1e-9);
            prop_assert!(total <= remaining * 1.2 + 1e-9);
        }
    }
}
