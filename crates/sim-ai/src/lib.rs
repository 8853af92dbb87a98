#![deny(warnings)]

//! Strategy advisor: recommendations, risk register and what-if scenarios
//! derived from a finished simulation run.

pub mod analysis;
pub mod recommend;
pub mod risk;
pub mod scenario;

pub use analysis::analyze;
pub use recommend::{generate_recommendations, rank_recommendations, RecommendationRule};
pub use risk::{assess_risks, overall_risk_level, RiskRule};
pub use scenario::{generate_scenarios, ScenarioMode};

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sim_core::{
    AnalysisData, ProjectedResults, Recommendation, RiskAssessment, SimulationParameters,
    SimulationResults, WhatIfScenario,
};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Performance,
    Financial,
    Customer,
    Market,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub message: String,
}

/// A scenario with its ranking score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategicOption {
    pub scenario: WhatIfScenario,
    pub score: f64,
}

/// Output of [`advise`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryReport {
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub risk_assessment: RiskAssessment,
    pub strategic_options: Vec<StrategicOption>,
}

/// Expected value of a scenario: success probability times revenue change.
pub fn utility(projected: &ProjectedResults) -> f64 {
    projected.probability * projected.revenue_change_percent
}

/// Rank scenarios by [`utility`], best first.
pub fn strategic_options(scenarios: &[WhatIfScenario]) -> Vec<StrategicOption> {
    let mut out: Vec<StrategicOption> = scenarios
        .iter()
        .map(|s| StrategicOption {
            scenario: s.clone(),
            score: utility(&s.projected_results),
        })
        .collect();
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}

/// Human-readable observations about the run.
pub fn insights(
    params: &SimulationParameters,
    results: &SimulationResults,
    data: &AnalysisData,
) -> Vec<Insight> {
    let fm = &results.final_metrics;
    let perf = &data.current_performance;
    let market = &data.market_conditions;
    vec![
        Insight {
            category: InsightCategory::Performance,
            message: format!(
                "Market share moved from {:.1}% to {:.1}% ({:+.1} points) over {} months",
                params.initial_market_share,
                fm.final_market_share,
                perf.market_share_trend,
                results.timeline.len()
            ),
        },
        Insight {
            category: InsightCategory::Financial,
            message: format!(
                "Total revenue ${:.0} with a {:.1}% profit margin",
                fm.total_revenue.to_f64().unwrap_or(0.0),
                perf.profit_margin * 100.0
            ),
        },
        Insight {
            category: InsightCategory::Customer,
            message: format!(
                "Customer base changed {:+.1}%; average NPS {:.0}",
                fm.customer_growth_percent, perf.customer_satisfaction
            ),
        },
        Insight {
            category: InsightCategory::Market,
            message: format!(
                "Competition intensity {:.2} in a {:?} market; buyers lean toward {}",
                market.competition_intensity,
                market.market_maturity,
                market.customer_preferences.join(", ")
            ),
        },
    ]
}

/// Run the full advisor over a finished run.
pub fn advise(params: &SimulationParameters, results: &SimulationResults) -> AdvisoryReport {
    let data = analyze(params, results);
    let recommendations = generate_recommendations(&data, results.final_metrics.total_revenue);
    let risk_assessment = assess_risks(&data);
    debug!(
        recommendations = recommendations.len(),
        risks = risk_assessment.risks.len(),
        level = ?risk_assessment.overall_risk_level,
        "advisory report built"
    );
    AdvisoryReport {
        insights: insights(params, results, &data),
        recommendations,
        risk_assessment,
        strategic_options: strategic_options(&results.scenarios),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{ParameterOverrides, Severity};

    fn make_scenario(id: &str, probability: f64, revenue: f64) -> WhatIfScenario {
        WhatIfScenario {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            parameter_changes: ParameterOverrides::default(),
            projected_results: ProjectedResults {
                market_share_change: 0.0,
                revenue_change_percent: revenue,
                risk_level: Severity::Low,
                probability,
            },
        }
    }

    #[test]
    fn utility_is_expected_revenue_change() {
        assert_eq!(utility(&make_scenario("a", 0.5, 20.0).projected_results), 10.0);
    }

    #[test]
    fn options_ranked_best_first() {
        let opts = strategic_options(&[
            make_scenario("low", 0.5, 10.0),
            make_scenario("high", 0.9, 30.0),
            make_scenario("mid", 0.7, 20.0),
        ]);
        let ids: Vec<&str> = opts.iter().map(|o| o.scenario.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[test]
    fn canned_scenarios_rank_aggressive_marketing_first() {
        let p = sim_core::SimulationParameters {
            market_size: 1_000,
            initial_market_share: 1.0,
            competitor_count: 1,
            simulation_duration: 1,
            pricing_strategy: sim_core::PricingStrategy {
                model: sim_core::PricingModel::Competitive,
                base_price: rust_decimal::Decimal::ONE,
                price_elasticity: 1.0,
                competitor_price_response: 0.0,
            },
            promotion_strategy: sim_core::PromotionStrategy {
                channels: vec![],
                total_budget: rust_decimal::Decimal::ZERO,
                seasonality: false,
            },
            product_strategy: sim_core::ProductStrategy {
                features: vec![],
                quality_level: 5.0,
                innovation_rate: 0.1,
            },
            budget: sim_core::Budget {
                total: rust_decimal::Decimal::ZERO,
                marketing: rust_decimal::Decimal::ZERO,
                product: rust_decimal::Decimal::ZERO,
                operations: rust_decimal::Decimal::ZERO,
                reserve: rust_decimal::Decimal::ZERO,
            },
        };
        let opts = strategic_options(&generate_scenarios(&p));
        assert_eq!(opts[0].scenario.id, scenario::AGGRESSIVE_MARKETING);
        assert_eq!(opts[2].scenario.id, scenario::PREMIUM_POSITIONING);
    }
}
