//! Derivation of [`AnalysisData`] from a finished run.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sim_core::{
    AnalysisData, CurrentPerformance, MarketConditions, MarketMaturity, PricingModel,
    SimulationParameters, SimulationResults, TimelineData,
};

/// Build the performance and market-condition summary for the rule engines.
pub fn analyze(params: &SimulationParameters, results: &SimulationResults) -> AnalysisData {
    let fm = &results.final_metrics;
    let market_share_trend = fm.final_market_share - params.initial_market_share;
    let current_performance = CurrentPerformance {
        growth_rate: fm.customer_growth_percent,
        profit_margin: profit_margin(fm.total_revenue, fm.total_profit),
        market_share_trend,
        customer_satisfaction: mean(results.timeline.iter().map(|r| r.kpis.nps)),
        competitive_position: results
            .timeline
            .last()
            .map(competitive_position)
            .unwrap_or(0.0),
    };
    let avg_growth = mean(results.timeline.iter().map(|r| r.kpis.growth_rate));
    let market_conditions = MarketConditions {
        competition_intensity: sim_econ::competitor_strength(params.competitor_count),
        market_maturity: market_maturity(market_share_trend, avg_growth),
        customer_preferences: customer_preferences(params),
        emerging_trends: emerging_trends(params),
    };
    AnalysisData {
        current_performance,
        market_conditions,
    }
}

/// Profit over revenue. With no revenue, any loss counts as -100%.
pub fn profit_margin(revenue: Decimal, profit: Decimal) -> f64 {
    if revenue > Decimal::ZERO {
        (profit / revenue).to_f64().unwrap_or(0.0)
    } else if profit < Decimal::ZERO {
        -1.0
    } else {
        0.0
    }
}

/// Our share relative to ours plus the largest rival's.
pub fn competitive_position(record: &TimelineData) -> f64 {
    let leader = record
        .competitor_shares
        .values()
        .copied()
        .fold(0.0_f64, f64::max);
    let denom = record.market_share + leader;
    if denom > 0.0 {
        record.market_share / denom
    } else {
        0.0
    }
}

/// Classify the market from share trend (points) and mean monthly growth (%).
pub fn market_maturity(share_trend: f64, avg_growth: f64) -> MarketMaturity {
    if share_trend < -1.0 {
        MarketMaturity::Declining
    } else if avg_growth >= 8.0 {
        MarketMaturity::Emerging
    } else if avg_growth >= 3.0 {
        MarketMaturity::Growing
    } else {
        MarketMaturity::Mature
    }
}

fn customer_preferences(params: &SimulationParameters) -> Vec<String> {
    let mut prefs = vec![match params.pricing_strategy.model {
        PricingModel::Penetration => "price-sensitive buyers",
        PricingModel::Competitive => "value-for-money buyers",
        PricingModel::Premium => "quality-focused buyers",
        PricingModel::Dynamic => "deal-seeking buyers",
    }
    .to_string()];
    if params.product_strategy.quality_level >= 8.0 {
        prefs.push("premium experience".to_string());
    }
    if params.product_strategy.features.len() >= 5 {
        prefs.push("feature-rich offerings".to_string());
    }
    prefs
}

fn emerging_trends(params: &SimulationParameters) -> Vec<String> {
    let mut trends = Vec::new();
    let digital = params.promotion_strategy.channels.iter().any(|c| {
        let t = c.channel_type.to_ascii_lowercase();
        t.contains("digital") || t.contains("social") || t.contains("search")
    });
    if digital {
        trends.push("digital-first engagement".to_string());
    }
    if params.product_strategy.innovation_rate >= 0.2 {
        trends.push("rapid product iteration".to_string());
    }
    if params.promotion_strategy.seasonality {
        trends.push("seasonal demand swings".to_string());
    }
    if params.competitor_count >= 5 {
        trends.push("market consolidation".to_string());
    }
    trends
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
