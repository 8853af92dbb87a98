//! Risk register built from threshold rules over [`AnalysisData`].

use sim_core::{AnalysisData, Risk, RiskAssessment, RiskType, Severity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskRule {
    MarketShareDecline,
    ThinMargin,
    CompetitionIntensity,
    CustomerContraction,
    LowSatisfaction,
}

impl RiskRule {
    pub const ALL: [RiskRule; 5] = [
        RiskRule::MarketShareDecline,
        RiskRule::ThinMargin,
        RiskRule::CompetitionIntensity,
        RiskRule::CustomerContraction,
        RiskRule::LowSatisfaction,
    ];

    pub fn evaluate(self, data: &AnalysisData) -> Option<Risk> {
        let perf = &data.current_performance;
        let market = &data.market_conditions;
        match self {
            Self::MarketShareDecline if perf.market_share_trend < -1.0 => Some(Risk {
                risk_type: RiskType::Market,
                severity: Severity::High,
                description: format!(
                    "Market share is eroding ({:.1} points over the horizon)",
                    perf.market_share_trend
                ),
                mitigation: "Reallocate promotion budget to the best-performing channels and \
                             review pricing against rivals"
                    .to_string(),
                probability: (0.5 + perf.market_share_trend.abs() * 0.05).min(0.95),
            }),
            Self::ThinMargin if perf.profit_margin < 0.05 => Some(Risk {
                risk_type: RiskType::Financial,
                severity: Severity::Critical,
                description: format!(
                    "Profit margin of {:.1}% leaves no buffer against shocks",
                    perf.profit_margin * 100.0
                ),
                mitigation: "Freeze discretionary spend and restore margin before scaling".to_string(),
                probability: 0.8,
            }),
            Self::CompetitionIntensity if market.competition_intensity > 0.8 => Some(Risk {
                risk_type: RiskType::Competitive,
                severity: Severity::Medium,
                description: format!(
                    "Competition intensity is {:.2}; rivals can undercut on price",
                    market.competition_intensity
                ),
                mitigation: "Build switching costs through integrations and loyalty programs"
                    .to_string(),
                probability: market.competition_intensity.clamp(0.0, 1.0),
            }),
            Self::CustomerContraction if perf.growth_rate < 0.0 => Some(Risk {
                risk_type: RiskType::Market,
                severity: Severity::Medium,
                description: format!(
                    "Customer base shrank by {:.1}% over the horizon",
                    -perf.growth_rate
                ),
                mitigation: "Target churned segments with win-back offers".to_string(),
                probability: 0.6,
            }),
            Self::LowSatisfaction if perf.customer_satisfaction < 50.0 => Some(Risk {
                risk_type: RiskType::Operational,
                severity: Severity::High,
                description: format!(
                    "Average NPS of {:.0} points to quality problems",
                    perf.customer_satisfaction
                ),
                mitigation: "Prioritize quality fixes over new features for two release cycles"
                    .to_string(),
                probability: 0.5,
            }),
            _ => None,
        }
    }
}

/// Critical if any critical risk; high if two or more high; medium if one
/// high; otherwise low.
pub fn overall_risk_level(risks: &[Risk]) -> Severity {
    if risks.iter().any(|r| r.severity == Severity::Critical) {
        return Severity::Critical;
    }
    match risks.iter().filter(|r| r.severity == Severity::High).count() {
        0 => Severity::Low,
        1 => Severity::Medium,
        _ => Severity::High,
    }
}

/// Evaluate every risk rule and build the register.
pub fn assess_risks(data: &AnalysisData) -> RiskAssessment {
    let risks: Vec<Risk> = RiskRule::ALL
        .iter()
        .filter_map(|rule| rule.evaluate(data))
        .collect();
    let mut ordered: Vec<&Risk> = risks.iter().collect();
    ordered.sort_by(|a, b| b.severity.weight().cmp(&a.severity.weight()));
    let mitigation_priorities = ordered.iter().map(|r| r.mitigation.clone()).collect();
    RiskAssessment {
        overall_risk_level: overall_risk_level(&risks),
        risks,
        mitigation_priorities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{CurrentPerformance, MarketConditions, MarketMaturity};

    fn data(trend: f64, margin: f64, intensity: f64) -> AnalysisData {
        AnalysisData {
            current_performance: CurrentPerformance {
                growth_rate: 2.0,
                profit_margin: margin,
                market_share_trend: trend,
                customer_satisfaction: 65.0,
                competitive_position: 0.5,
            },
            market_conditions: MarketConditions {
                competition_intensity: intensity,
                market_maturity: MarketMaturity::Mature,
                customer_preferences: vec![],
                emerging_trends: vec![],
            },
        }
    }

    fn risk(severity: Severity) -> Risk {
        Risk {
            risk_type: RiskType::Market,
            severity,
            description: String::new(),
            mitigation: format!("{severity:?}"),
            probability: 0.5,
        }
    }

    #[test]
    fn no_risks_is_low() {
        let a = assess_risks(&data(0.5, 0.3, 0.5));
        assert!(a.risks.is_empty());
        assert_eq!(a.overall_risk_level, Severity::Low);
        assert!(a.mitigation_priorities.is_empty());
    }

    #[test]
    fn thresholds_map_to_severities() {
        let a = assess_risks(&data(-1.5, 0.3, 0.5));
        assert_eq!(a.risks.len(), 1);
        assert_eq!(a.risks[0].severity, Severity::High);
        assert_eq!(a.overall_risk_level, Severity::Medium);

        let a = assess_risks(&data(0.0, 0.01, 0.5));
        assert_eq!(a.risks[0].risk_type, RiskType::Financial);
        assert_eq!(a.overall_risk_level, Severity::Critical);

        let a = assess_risks(&data(0.0, 0.3, 0.9));
        assert_eq!(a.risks[0].severity, Severity::Medium);
        assert_eq!(a.overall_risk_level, Severity::Low);

        // Boundary: exactly -1 and 0.8 do not fire.
        assert!(assess_risks(&data(-1.0, 0.3, 0.8)).risks.is_empty());
    }

    #[test]
    fn overall_level_rules() {
        assert_eq!(overall_risk_level(&[]), Severity::Low);
        assert_eq!(overall_risk_level(&[risk(Severity::Medium)]), Severity::Low);
        assert_eq!(overall_risk_level(&[risk(Severity::High)]), Severity::Medium);
        assert_eq!(
            overall_risk_level(&[risk(Severity::High), risk(Severity::High)]),
            Severity::High
        );
        assert_eq!(
            overall_risk_level(&[risk(Severity::Low), risk(Severity::Critical)]),
            Severity::Critical
        );
    }

    #[test]
    fn mitigations_ordered_by_severity() {
        let mut d = data(-3.0, 0.0, 0.9);
        d.current_performance.customer_satisfaction = 40.0;
        let a = assess_risks(&d);
        let severities: Vec<Severity> = a.risks.iter().map(|r| r.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::High, Severity::Critical, Severity::Medium, Severity::High]
        );
        assert_eq!(a.mitigation_priorities.len(), 4);
        assert_eq!(a.mitigation_priorities[0], a.risks[1].mitigation);
        assert_eq!(a.mitigation_priorities[3], a.risks[2].mitigation);
        assert_eq!(a.overall_risk_level, Severity::Critical);
    }
}
