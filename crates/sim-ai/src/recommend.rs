//! Rule-based recommendation engine.
//!
//! Each rule is a closed variant with a pure condition and a pure builder,
//! evaluated in table order. Matches are ranked by priority weight and then
//! by projected revenue, and truncated to [`MAX_RECOMMENDATIONS`].

use rust_decimal::Decimal;
use sim_core::{AnalysisData, Impact, Priority, Recommendation, RecommendationType};
use std::cmp::Ordering;

pub const MAX_RECOMMENDATIONS: usize = 5;

/// Margin below which pricing action is recommended.
pub const TARGET_PROFIT_MARGIN: f64 = 0.15;
/// NPS below which a retention plan is recommended.
pub const TARGET_NPS: f64 = 70.0;
/// Competitive position below which differentiation is recommended.
pub const MIN_COMPETITIVE_POSITION: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecommendationRule {
    MarketShareRecovery,
    ProfitOptimization,
    RetentionPlan,
    CompetitiveDifferentiation,
}

impl RecommendationRule {
    /// Evaluation order.
    pub const ALL: [RecommendationRule; 4] = [
        RecommendationRule::MarketShareRecovery,
        RecommendationRule::ProfitOptimization,
        RecommendationRule::RetentionPlan,
        RecommendationRule::CompetitiveDifferentiation,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::MarketShareRecovery => "market-share-recovery",
            Self::ProfitOptimization => "profit-optimization",
            Self::RetentionPlan => "customer-retention",
            Self::CompetitiveDifferentiation => "competitive-differentiation",
        }
    }

    pub fn fires(self, data: &AnalysisData) -> bool {
        let perf = &data.current_performance;
        match self {
            Self::MarketShareRecovery => perf.market_share_trend < 0.0,
            Self::ProfitOptimization => perf.profit_margin < TARGET_PROFIT_MARGIN,
            Self::RetentionPlan => perf.customer_satisfaction < TARGET_NPS,
            Self::CompetitiveDifferentiation => {
                perf.competitive_position < MIN_COMPETITIVE_POSITION
            }
        }
    }

    /// Build the recommendation when the rule fires. `baseline_revenue` is the
    /// run's total revenue and scales the projected revenue impact.
    pub fn evaluate(self, data: &AnalysisData, baseline_revenue: Decimal) -> Option<Recommendation> {
        if !self.fires(data) {
            return None;
        }
        let perf = &data.current_performance;
        let baseline = baseline_revenue.max(Decimal::ZERO);
        let rec = match self {
            Self::MarketShareRecovery => Recommendation {
                id: self.id().to_string(),
                rec_type: RecommendationType::Strategic,
                priority: Priority::High,
                title: "Recover lost market share".to_string(),
                description: format!(
                    "Market share fell by {:.1} points over the horizon. Rebalance promotion \
                     toward the highest-yield channels and sharpen positioning against the leaders.",
                    -perf.market_share_trend
                ),
                impact: Impact {
                    revenue: (baseline * Decimal::new(15, 2)).round_dp(2),
                    market_share_delta: (-perf.market_share_trend * 0.5 + 1.0).min(5.0),
                    time_to_impact_days: 90,
                    confidence: 0.7,
                },
                implementation: steps(&[
                    "Audit channel ROI and move budget to the top performers",
                    "Launch a targeted win-back campaign for churned segments",
                    "Refresh positioning against the two strongest competitors",
                    "Track monthly share against a recovery target",
                ]),
            },
            Self::ProfitOptimization => Recommendation {
                id: self.id().to_string(),
                rec_type: RecommendationType::Pricing,
                priority: Priority::High,
                title: "Improve profit margin".to_string(),
                description: format!(
                    "Profit margin is {:.1}%, below the {:.0}% target. Revisit price points \
                     and cut spend that does not convert.",
                    perf.profit_margin * 100.0,
                    TARGET_PROFIT_MARGIN * 100.0
                ),
                impact: Impact {
                    revenue: (baseline * Decimal::new(10, 2)).round_dp(2),
                    market_share_delta: -0.5,
                    time_to_impact_days: 60,
                    confidence: 0.75,
                },
                implementation: steps(&[
                    "Segment customers by willingness to pay",
                    "Test a price increase on the least elastic segment",
                    "Cut the lowest-converting marketing channel",
                    "Renegotiate operating contracts above budget",
                ]),
            },
            Self::RetentionPlan => Recommendation {
                id: self.id().to_string(),
                rec_type: RecommendationType::Product,
                priority: Priority::Medium,
                title: "Launch a customer retention plan".to_string(),
                description: format!(
                    "Customer satisfaction (NPS {:.0}) is below {:.0}. Raising product quality \
                     lowers churn and lifts lifetime value.",
                    perf.customer_satisfaction, TARGET_NPS
                ),
                impact: Impact {
                    revenue: (baseline * Decimal::new(8, 2)).round_dp(2),
                    market_share_delta: 1.0,
                    time_to_impact_days: 120,
                    confidence: 0.65,
                },
                implementation: steps(&[
                    "Survey detractors and rank their top complaints",
                    "Fix the three most reported quality issues",
                    "Introduce a loyalty tier for long-tenure customers",
                    "Review NPS monthly with product and support leads",
                ]),
            },
            Self::CompetitiveDifferentiation => Recommendation {
                id: self.id().to_string(),
                rec_type: RecommendationType::Strategic,
                priority: Priority::High,
                title: "Differentiate from the market leader".to_string(),
                description: format!(
                    "Competitive position index is {:.2}, well behind the leading rival. \
                     Invest in features and messaging competitors cannot easily copy.",
                    perf.competitive_position
                ),
                impact: Impact {
                    revenue: (baseline * Decimal::new(12, 2)).round_dp(2),
                    market_share_delta: 2.0,
                    time_to_impact_days: 180,
                    confidence: 0.6,
                },
                implementation: steps(&[
                    "Map feature gaps against the leading competitor",
                    "Pick one defensible capability and fund it",
                    "Align messaging across every channel around it",
                    "Measure share of voice quarterly",
                ]),
            },
        };
        Some(rec)
    }
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Ordering used for ranking: higher priority first, then higher revenue.
pub fn ranking_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| b.impact.revenue.cmp(&a.impact.revenue))
}

/// Sort by [`ranking_order`] and keep the top [`MAX_RECOMMENDATIONS`].
pub fn rank_recommendations(mut recs: Vec<Recommendation>) -> Vec<Recommendation> {
    recs.sort_by(ranking_order);
    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

/// Evaluate every rule and return the ranked matches. Empty when nothing fires.
pub fn generate_recommendations(
    data: &AnalysisData,
    baseline_revenue: Decimal,
) -> Vec<Recommendation> {
    let matched = RecommendationRule::ALL
        .iter()
        .filter_map(|rule| rule.evaluate(data, baseline_revenue))
        .collect();
    rank_recommendations(matched)
}
