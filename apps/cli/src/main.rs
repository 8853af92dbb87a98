#![deny(warnings)]

//! Headless CLI: load a parameter file, run the simulation and print the
//! advisor's report.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_ai::{AdvisoryReport, ScenarioMode};
use sim_core::*;
use sim_runtime::MonteCarloSummary;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    params: Option<PathBuf>,
    seed: Option<u64>,
    start: Option<NaiveDate>,
    json: bool,
    monte_carlo: Option<usize>,
    resimulate: bool,
    version: bool,
}

fn parse_month(s: &str) -> Option<NaiveDate> {
    let (y, m) = s.split_once('-')?;
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, 1)
}

fn parse_args() -> Result<Args> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--params" => {
                let v = it.next().context("--params needs a path")?;
                args.params = Some(PathBuf::from(v));
            }
            "--seed" => {
                let v = it.next().context("--seed needs a value")?;
                args.seed = Some(v.parse().with_context(|| format!("bad seed: {v}"))?);
            }
            "--start" => {
                let v = it.next().context("--start needs YYYY-MM")?;
                args.start = Some(parse_month(&v).with_context(|| format!("bad month: {v}"))?);
            }
            "--monte-carlo" => {
                let v = it.next().context("--monte-carlo needs a run count")?;
                args.monte_carlo = Some(v.parse().with_context(|| format!("bad run count: {v}"))?);
            }
            "--json" => args.json = true,
            "--resimulate" => args.resimulate = true,
            "--version" => args.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn load_params(path: &Path) -> Result<SimulationParameters> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let params: SimulationParameters = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        _ => serde_yaml::from_str(&text)?,
    };
    Ok(params)
}

fn demo_params() -> SimulationParameters {
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
            channels: vec![
                PromotionChannel {
                    channel_type: "digital".to_string(),
                    budget_allocation_percent: 60.0,
                    effectiveness: 0.8,
                    target_audience: "smb".to_string(),
                },
                PromotionChannel {
                    channel_type: "events".to_string(),
                    budget_allocation_percent: 40.0,
                    effectiveness: 0.6,
                    target_audience: "enterprise".to_string(),
                },
            ],
            total_budget: Decimal::new(5_000_000, 0),
            seasonality: true,
        },
        product_strategy: ProductStrategy {
            features: vec!["dashboards".to_string(), "api".to_string()],
            quality_level: 7.0,
            innovation_rate: 0.15,
        },
        budget: Budget {
            total: Decimal::new(12_000_000, 0),
            marketing: Decimal::new(5_000_000, 0),
            product: Decimal::new(3_000_000, 0),
            operations: Decimal::new(2_500_000, 0),
            reserve: Decimal::new(1_500_000, 0),
        },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<'a> {
    results: &'a SimulationResults,
    report: &'a AdvisoryReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    monte_carlo: Option<&'a MonteCarloSummary>,
}

fn print_summary(
    results: &SimulationResults,
    report: &AdvisoryReport,
    mc: Option<&MonteCarloSummary>,
) {
    let fm = &results.final_metrics;
    println!(
        "KPI | months: {} | revenue: ${} | profit: ${} | share: {:.1}% | customers: {:+.1}% | brand: ${}",
        results.timeline.len(),
        fm.total_revenue.round_dp(0),
        fm.total_profit.round_dp(0),
        fm.final_market_share,
        fm.customer_growth_percent,
        fm.brand_value.round_dp(0)
    );
    for insight in &report.insights {
        println!("  [{:?}] {}", insight.category, insight.message);
    }
    println!("Recommendations:");
    for rec in &report.recommendations {
        println!(
            "  {:?}/{:?} {} (+${} over {} days, {:.0}% confidence)",
            rec.priority,
            rec.rec_type,
            rec.title,
            rec.impact.revenue.round_dp(0),
            rec.impact.time_to_impact_days,
            rec.impact.confidence * 100.0
        );
    }
    println!(
        "Risk: {:?} ({} risks)",
        report.risk_assessment.overall_risk_level,
        report.risk_assessment.risks.len()
    );
    for m in &report.risk_assessment.mitigation_priorities {
        println!("  - {m}");
    }
    println!("Scenarios:");
    for opt in &report.strategic_options {
        let pr = &opt.scenario.projected_results;
        println!(
            "  {} | share {:+.1} pts | revenue {:+.1}% | risk {:?} | p={:.2} | score {:.1}",
            opt.scenario.name,
            pr.market_share_change,
            pr.revenue_change_percent,
            pr.risk_level,
            pr.probability,
            opt.score
        );
    }
    if let Some(mc) = mc {
        println!(
            "Monte Carlo | runs: {} | share p10/p50/p90: {:.1}/{:.1}/{:.1} | revenue mean: ${:.0}",
            mc.runs,
            mc.final_market_share.p10,
            mc.final_market_share.p50,
            mc.final_market_share.p90,
            mc.total_revenue.mean
        );
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    if args.version {
        println!(
            "market-sim {} ({}, built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(params = ?args.params, seed = ?args.seed, "starting CLI");

    let params = match &args.params {
        Some(path) => load_params(path)?,
        None => demo_params(),
    };
    let mut cfg = SimConfig {
        rng_seed: args.seed,
        ..SimConfig::default()
    };
    if let Some(start) = args.start {
        cfg.start_date = start;
    }
    let mode = if args.resimulate {
        ScenarioMode::Resimulated
    } else {
        ScenarioMode::Heuristic
    };

    let results = sim_runtime::run_simulation_with_mode(&params, &cfg, mode)?;
    let report = sim_ai::advise(&params, &results);
    let mc = match args.monte_carlo {
        Some(runs) => Some(sim_runtime::run_monte_carlo(
            &params,
            cfg.start_date,
            runs,
            args.seed.unwrap_or(0),
        )?),
        None => None,
    };

    if args.json {
        let out = Output {
            results: &results,
            report: &report,
            monte_carlo: mc.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&results, &report, mc.as_ref());
    }
    Ok(())
}
