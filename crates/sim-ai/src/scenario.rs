//! Canned what-if scenarios with heuristic projections.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    ParameterOverrides, PricingModel, ProjectedResults, Severity, SimulationParameters,
    WhatIfScenario, MAX_BASE_PRICE, MAX_BUDGET,
};

/// How scenario outcomes are projected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioMode {
    /// Pre-authored projections, no extra simulation work.
    #[default]
    Heuristic,
    /// Re-run the timeline with the overrides applied.
    Resimulated,
}

pub const AGGRESSIVE_MARKETING: &str = "aggressive-marketing";
pub const PREMIUM_POSITIONING: &str = "premium-positioning";
pub const INNOVATION_FOCUS: &str = "innovation-focus";

/// Scale `value`, saturating at `max`.
fn scaled(value: Decimal, factor: Decimal, max: Decimal) -> Decimal {
    value.checked_mul(factor).map_or(max, |v| v.min(max))
}

/// Overrides for the aggressive-marketing alternative: +50% marketing budget,
/// capped at [`MAX_BUDGET`].
pub fn aggressive_marketing(params: &SimulationParameters) -> ParameterOverrides {
    ParameterOverrides {
        marketing_budget: Some(scaled(params.budget.marketing, Decimal::new(15, 1), MAX_BUDGET)),
        ..Default::default()
    }
}

/// Overrides for premium positioning: premium model at +30% base price,
/// capped at [`MAX_BASE_PRICE`].
pub fn premium_positioning(params: &SimulationParameters) -> ParameterOverrides {
    ParameterOverrides {
        pricing_model: Some(PricingModel::Premium),
        base_price: Some(scaled(
            params.pricing_strategy.base_price,
            Decimal::new(13, 1),
            MAX_BASE_PRICE,
        )),
        ..Default::default()
    }
}

/// Overrides for innovation focus: double innovation, +2 quality capped at 10.
pub fn innovation_focus(params: &SimulationParameters) -> ParameterOverrides {
    ParameterOverrides {
        innovation_rate: Some(params.product_strategy.innovation_rate * 2.0),
        quality_level: Some((params.product_strategy.quality_level + 2.0).min(10.0)),
        ..Default::default()
    }
}

/// The three canned alternatives with heuristic projections.
pub fn generate_scenarios(params: &SimulationParameters) -> Vec<WhatIfScenario> {
    vec![
        WhatIfScenario {
            id: AGGRESSIVE_MARKETING.to_string(),
            name: "Aggressive Marketing".to_string(),
            description: "Increase the marketing budget by 50% to accelerate acquisition"
                .to_string(),
            parameter_changes: aggressive_marketing(params),
            projected_results: ProjectedResults {
                market_share_change: 3.5,
                revenue_change_percent: 25.0,
                risk_level: Severity::Medium,
                probability: 0.7,
            },
        },
        WhatIfScenario {
            id: PREMIUM_POSITIONING.to_string(),
            name: "Premium Positioning".to_string(),
            description: "Move to premium pricing with a 30% higher base price".to_string(),
            parameter_changes: premium_positioning(params),
            projected_results: ProjectedResults {
                market_share_change: -2.0,
                revenue_change_percent: 15.0,
                risk_level: Severity::High,
                probability: 0.55,
            },
        },
        WhatIfScenario {
            id: INNOVATION_FOCUS.to_string(),
            name: "Innovation Focus".to_string(),
            description: "Double the innovation rate and raise product quality by two levels"
                .to_string(),
            parameter_changes: innovation_focus(params),
            projected_results: ProjectedResults {
                market_share_change: 2.5,
                revenue_change_percent: 18.0,
                risk_level: Severity::Medium,
                probability: 0.65,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Budget, PricingStrategy, ProductStrategy, PromotionStrategy};

    fn params(marketing: i64, quality: f64) -> SimulationParameters {
        SimulationParameters {
            market_size: 1_000_000,
            initial_market_share: 10.0,
            competitor_count: 3,
            simulation_duration: 12,
            pricing_strategy: PricingStrategy {
                model: PricingModel::Competitive,
                base_price: Decimal::new(100, 0),
                price_elasticity: 1.0,
                competitor_price_response: 0.0,
            },
            promotion_strategy: PromotionStrategy {
                channels: vec![],
                total_budget: Decimal::new(marketing, 0),
                seasonality: false,
            },
            product_strategy: ProductStrategy {
                features: vec![],
                quality_level: quality,
                innovation_rate: 0.2,
            },
            budget: Budget {
                total: Decimal::new(marketing * 2, 0),
                marketing: Decimal::new(marketing, 0),
                product: Decimal::new(marketing / 2, 0),
                operations: Decimal::new(marketing / 2, 0),
                reserve: Decimal::ZERO,
            },
        }
    }

    #[test]
    fn three_scenarios_with_stable_ids() {
        let s = generate_scenarios(&params(1_000, 7.0));
        let ids: Vec<&str> = s.iter().map(|x| x.id.as_str()).collect();
        assert_eq!(ids, vec![AGGRESSIVE_MARKETING, PREMIUM_POSITIONING, INNOVATION_FOCUS]);
        for sc in &s {
            assert!((0.0..=1.0).contains(&sc.projected_results.probability));
        }
    }

    #[test]
    fn premium_and_innovation_overrides() {
        let p = params(1_000, 9.0);
        let prem = premium_positioning(&p).apply(&p);
        assert_eq!(prem.pricing_strategy.model, PricingModel::Premium);
        assert_eq!(prem.pricing_strategy.base_price, Decimal::new(130, 0));
        let inn = innovation_focus(&p).apply(&p);
        assert_eq!(inn.product_strategy.quality_level, 10.0);
        assert!((inn.product_strategy.innovation_rate - 0.4).abs() < 1e-12);
    }

    #[test]
    fn overrides_saturate_at_ceilings() {
        let mut p = params(1_000, 7.0);
        p.budget.marketing = MAX_BUDGET;
        p.pricing_strategy.base_price = MAX_BASE_PRICE;
        assert_eq!(aggressive_marketing(&p).marketing_budget, Some(MAX_BUDGET));
        assert_eq!(premium_positioning(&p).base_price, Some(MAX_BASE_PRICE));
        p.budget.marketing = Decimal::MAX;
        assert_eq!(aggressive_marketing(&p).marketing_budget, Some(MAX_BUDGET));
    }

    #[test]
    fn no_scenario_changes_the_horizon() {
        let p = params(1_000, 7.0);
        for sc in generate_scenarios(&p) {
            assert_eq!(sc.parameter_changes.apply(&p).simulation_duration, 12);
        }
    }

    proptest! {
        #[test]
        fn aggressive_marketing_only_scales_marketing(marketing in 0i64..1_000_000_000) {
            let p = params(marketing, 7.0);
            let out = aggressive_marketing(&p).apply(&p);
            prop_assert_eq!(out.budget.marketing, p.budget.marketing * Decimal::new(15, 1));
            let mut expected = p.clone();
            expected.budget.marketing = out.budget.marketing;
            prop_assert_eq!(out, expected);
        }
    }
}
