#![deny(warnings)]

//! Core domain models and invariants for the market strategy simulator.
//!
//! This crate defines the serializable types shared by the simulation and
//! advisory crates, along with validation helpers that reject malformed
//! parameter sets before a run starts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Pricing model applied to the product for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingModel {
    /// Price matched to the market.
    Competitive,
    /// Below-market price to win share.
    Penetration,
    /// Above-market price backed by quality.
    Premium,
    /// Price re-drawn every month.
    Dynamic,
}

/// Pricing inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingStrategy {
    pub model: PricingModel,
    /// Monthly price per customer in USD (>= 0).
    pub base_price: Decimal,
    /// Sensitivity of share to price changes (dimensionless).
    pub price_elasticity: f64,
    /// How strongly rivals react to our pricing (reported only).
    #[serde(default)]
    pub competitor_price_response: f64,
}

/// A single promotion channel and its share of the marketing budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionChannel {
    /// Channel kind, e.g. "digital", "tv", "events".
    #[serde(rename = "type")]
    pub channel_type: String,
    /// Percentage of the marketing budget; all channels should sum to 100.
    pub budget_allocation_percent: f64,
    /// Relative effectiveness multiplier (>= 0).
    pub effectiveness: f64,
    #[serde(default)]
    pub target_audience: String,
}

/// Promotion inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionStrategy {
    pub channels: Vec<PromotionChannel>,
    pub total_budget: Decimal,
    /// Whether monthly seasonality applies.
    #[serde(default = "default_true")]
    pub seasonality: bool,
}

fn default_true() -> bool {
    true
}

/// Product inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStrategy {
    #[serde(default)]
    pub features: Vec<String>,
    /// Quality on a 1–10 scale.
    pub quality_level: f64,
    /// Share of effort spent on new features per period (>= 0).
    pub innovation_rate: f64,
}

/// Annual budget split in USD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub total: Decimal,
    pub marketing: Decimal,
    pub product: Decimal,
    pub operations: Decimal,
    pub reserve: Decimal,
}

/// Full input for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    /// Addressable market in people.
    pub market_size: u64,
    /// Starting share in percent [0, 100].
    pub initial_market_share: f64,
    /// Number of rivals (>= 1).
    pub competitor_count: u32,
    /// Horizon in months (>= 1).
    pub simulation_duration: u32,
    pub pricing_strategy: PricingStrategy,
    pub promotion_strategy: PromotionStrategy,
    pub product_strategy: ProductStrategy,
    pub budget: Budget,
}

/// Run configuration that is not part of the business inputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimConfig {
    /// Calendar month of the first simulated step (day is ignored).
    pub start_date: NaiveDate,
    /// Seed for deterministic RNG; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            rng_seed: None,
        }
    }
}

impl SimConfig {
    /// Deterministic configuration with the default start date.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Latent factors derived once per run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDynamics {
    /// Structural competitive headwind in [0, 0.9].
    pub competitor_strength: f64,
    /// Multipliers indexed by calendar month (0 = January).
    pub seasonality_factors: [f64; 12],
    pub price_elasticity: f64,
    pub innovation_impact_cap: f64,
}

/// Monthly key performance indicators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    /// Customer acquisition cost in USD.
    pub cac: Decimal,
    /// Customer lifetime value in USD.
    pub ltv: Decimal,
    pub roi: f64,
    pub nps: f64,
    pub churn_rate: f64,
    /// New customers as a percentage of the base.
    pub growth_rate: f64,
}

/// One month of simulated results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineData {
    /// 1-based month index within the run.
    pub month: u32,
    /// First day of the calendar month this record covers.
    pub period: NaiveDate,
    /// Our share in percent, clamped to [0, 100].
    pub market_share: f64,
    pub revenue: Decimal,
    pub costs: Decimal,
    pub profit: Decimal,
    pub customer_base: u64,
    pub new_customers: u64,
    pub churned_customers: u64,
    /// Reporting-only rival shares keyed by competitor name.
    pub competitor_shares: BTreeMap<String, f64>,
    pub kpis: Kpis,
}

/// Summary of a completed timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalMetrics {
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub final_market_share: f64,
    pub customer_growth_percent: f64,
    /// Heuristic proxy, not a valuation.
    pub brand_value: Decimal,
}

/// Lifecycle stage of the market as seen from the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketMaturity {
    Emerging,
    Growing,
    Mature,
    Declining,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPerformance {
    /// Customer growth over the run in percent.
    pub growth_rate: f64,
    /// Total profit over total revenue.
    pub profit_margin: f64,
    /// Share change over the run in percentage points.
    pub market_share_trend: f64,
    /// Average NPS across the run.
    pub customer_satisfaction: f64,
    /// Our share relative to ours plus the largest rival, in [0, 1].
    pub competitive_position: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConditions {
    pub competition_intensity: f64,
    pub market_maturity: MarketMaturity,
    pub customer_preferences: Vec<String>,
    pub emerging_trends: Vec<String>,
}

/// Derived performance summary consumed by the rule engines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub current_performance: CurrentPerformance,
    pub market_conditions: MarketConditions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Strategic,
    Pricing,
    Product,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Ranking weight: high=3, medium=2, low=1.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// Expected effect of acting on a recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub revenue: Decimal,
    pub market_share_delta: f64,
    pub time_to_impact_days: u32,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub rec_type: RecommendationType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    /// Ordered implementation checklist.
    pub implementation: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskType {
    Market,
    Financial,
    Competitive,
    Operational,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Ordering weight: critical=4 down to low=1.
    pub fn weight(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    #[serde(rename = "type")]
    pub risk_type: RiskType,
    pub severity: Severity,
    pub description: String,
    pub mitigation: String,
    pub probability: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub overall_risk_level: Severity,
    pub risks: Vec<Risk>,
    /// Mitigations ordered from most to least severe risk.
    pub mitigation_priorities: Vec<String>,
}

/// Partial override of a parameter set. `None` keeps the original value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_model: Option<PricingModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_budget: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innovation_rate: Option<f64>,
}

impl ParameterOverrides {
    /// Return a copy of `base` with the overridden fields replaced.
    pub fn apply(&self, base: &SimulationParameters) -> SimulationParameters {
        let mut out = base.clone();
        if let Some(model) = self.pricing_model {
            out.pricing_strategy.model = model;
        }
        if let Some(price) = self.base_price {
            out.pricing_strategy.base_price = price;
        }
        if let Some(marketing) = self.marketing_budget {
            out.budget.marketing = marketing;
        }
        if let Some(q) = self.quality_level {
            out.product_strategy.quality_level = q;
        }
        if let Some(rate) = self.innovation_rate {
            out.product_strategy.innovation_rate = rate;
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedResults {
    /// Share change in percentage points.
    pub market_share_change: f64,
    pub revenue_change_percent: f64,
    pub risk_level: Severity,
    /// Probability of success in [0, 1].
    pub probability: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfScenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameter_changes: ParameterOverrides,
    pub projected_results: ProjectedResults,
}

/// Everything a run returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    pub timeline: Vec<TimelineData>,
    pub final_metrics: FinalMetrics,
    pub recommendations: Vec<Recommendation>,
    pub scenarios: Vec<WhatIfScenario>,
}

/// Validation errors for parameter invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    /// Share must be within [0, 100].
    #[error("market share {0} is out of range [0, 100]")]
    ShareOutOfRange(f64),
    /// At least one competitor is required.
    #[error("competitor count must be >= 1")]
    NoCompetitors,
    /// At least one month must be simulated.
    #[error("simulation duration must be >= 1 month")]
    ZeroDuration,
    /// Quality must be within [1, 10].
    #[error("quality level {0} is out of range [1, 10]")]
    QualityOutOfRange(f64),
    /// Price or budget must be non-negative.
    #[error("negative monetary value in {0}")]
    NegativeMoney(&'static str),
    /// Rates and multipliers must be non-negative.
    #[error("negative value in {0}")]
    NegativeValue(&'static str),
    /// Price or budget exceeds the supported ceiling.
    #[error("monetary value in {0} exceeds the supported maximum")]
    MoneyTooLarge(&'static str),
    /// Market size exceeds [`MAX_MARKET_SIZE`].
    #[error("market size {0} exceeds the supported maximum")]
    MarketTooLarge(u64),
    /// Duration exceeds [`MAX_SIMULATION_MONTHS`].
    #[error("simulation duration of {0} months exceeds the supported maximum")]
    DurationTooLong(u32),
    /// Channels are present but carry no allocation.
    #[error("channel allocations must be non-negative and sum to more than zero")]
    InvalidAllocation,
}

/// Largest accepted market size, in people.
pub const MAX_MARKET_SIZE: u64 = 10_000_000_000;
/// Longest accepted run, in months.
pub const MAX_SIMULATION_MONTHS: u32 = 1_200;
/// Largest accepted unit price, in USD.
pub const MAX_BASE_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
/// Largest accepted budget line, in USD.
pub const MAX_BUDGET: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

// At the ceilings a run stays far inside `Decimal` range: at most ~1.2e12
// customers, ~2e21 revenue per month and ~3e24 summed over the horizon.

fn check_money(value: Decimal, max: Decimal, name: &'static str) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney(name));
    }
    if value > max {
        return Err(ValidationError::MoneyTooLarge(name));
    }
    Ok(())
}

/// Validate the pricing block.
pub fn validate_pricing(p: &PricingStrategy) -> Result<(), ValidationError> {
    check_money(p.base_price, MAX_BASE_PRICE, "pricingStrategy.basePrice")?;
    if !p.price_elasticity.is_finite() {
        return Err(ValidationError::NonFinite("pricingStrategy.priceElasticity"));
    }
    if !p.competitor_price_response.is_finite() {
        return Err(ValidationError::NonFinite(
            "pricingStrategy.competitorPriceResponse",
        ));
    }
    Ok(())
}

/// Validate a promotion channel.
pub fn validate_channel(c: &PromotionChannel) -> Result<(), ValidationError> {
    if !(c.budget_allocation_percent.is_finite() && c.effectiveness.is_finite()) {
        return Err(ValidationError::NonFinite("promotionStrategy.channels"));
    }
    if c.budget_allocation_percent < 0.0 {
        return Err(ValidationError::InvalidAllocation);
    }
    if c.effectiveness < 0.0 {
        return Err(ValidationError::NegativeValue("channel.effectiveness"));
    }
    Ok(())
}

/// Validate the promotion block. An empty channel list is allowed.
pub fn validate_promotion(p: &PromotionStrategy) -> Result<(), ValidationError> {
    check_money(p.total_budget, MAX_BUDGET, "promotionStrategy.totalBudget")?;
    for c in &p.channels {
        validate_channel(c)?;
    }
    if !p.channels.is_empty() {
        let total: f64 = p.channels.iter().map(|c| c.budget_allocation_percent).sum();
        if total <= 0.0 {
            return Err(ValidationError::InvalidAllocation);
        }
    }
    Ok(())
}

/// Validate the product block.
pub fn validate_product(p: &ProductStrategy) -> Result<(), ValidationError> {
    if !p.quality_level.is_finite() || !p.innovation_rate.is_finite() {
        return Err(ValidationError::NonFinite("productStrategy"));
    }
    if !(1.0..=10.0).contains(&p.quality_level) {
        return Err(ValidationError::QualityOutOfRange(p.quality_level));
    }
    if p.innovation_rate < 0.0 {
        return Err(ValidationError::NegativeValue("productStrategy.innovationRate"));
    }
    Ok(())
}

/// Validate the budget block.
pub fn validate_budget(b: &Budget) -> Result<(), ValidationError> {
    let fields = [
        (b.total, "budget.total"),
        (b.marketing, "budget.marketing"),
        (b.product, "budget.product"),
        (b.operations, "budget.operations"),
        (b.reserve, "budget.reserve"),
    ];
    for (value, name) in fields {
        check_money(value, MAX_BUDGET, name)?;
    }
    Ok(())
}

/// Validate a full parameter set, including every nested block.
pub fn validate_parameters(p: &SimulationParameters) -> Result<(), ValidationError> {
    if !p.initial_market_share.is_finite() {
        return Err(ValidationError::NonFinite("initialMarketShare"));
    }
    if !(0.0..=100.0).contains(&p.initial_market_share) {
        return Err(ValidationError::ShareOutOfRange(p.initial_market_share));
    }
    if p.competitor_count == 0 {
        return Err(ValidationError::NoCompetitors);
    }
    if p.market_size > MAX_MARKET_SIZE {
        return Err(ValidationError::MarketTooLarge(p.market_size));
    }
    if p.simulation_duration == 0 {
        return Err(ValidationError::ZeroDuration);
    }
    if p.simulation_duration > MAX_SIMULATION_MONTHS {
        return Err(ValidationError::DurationTooLong(p.simulation_duration));
    }
    validate_pricing(&p.pricing_strategy)?;
    validate_promotion(&p.promotion_strategy)?;
    validate_product(&p.product_strategy)?;
    validate_budget(&p.budget)?;
    Ok(())
}
