use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ratios::FeasibilityRatios;
use crate::types::{round_money, round_percent, Percent};

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskType {
    FundingGap,
    InterestReserve,
    LtcRatio,
    LtvRatio,
    ProfitMargin,
}

/// Used both for the severity of a finding and the overall grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    #[serde(rename = "type")]
    pub risk_type: RiskType,
    pub severity: RiskLevel,
    pub description: String,
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risks: Vec<RiskFinding>,
    /// Number of findings
    pub risk_score: u32,
    pub overall_risk: RiskLevel,
}

impl RiskAssessment {
    pub fn has(&self, risk_type: RiskType) -> bool {
        self.risks.iter().any(|r| r.risk_type == risk_type)
    }
}

/// Grade a scenario by how many rules fired: none is low, one or two is
/// medium, three or more is high.
pub fn overall_risk(finding_count: usize) -> RiskLevel {
    match finding_count {
        0 => RiskLevel::Low,
        1 | 2 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Everything a rule may look at.
#[derive(Debug, Clone)]
pub struct RiskContext<'a> {
    pub ratios: &'a FeasibilityRatios,
    /// Lender's maximum loan-to-cost, percent
    pub loan_to_cost_limit: Percent,
    /// Lender's maximum loan-to-value, percent
    pub loan_to_value_limit: Percent,
    /// Profit margin floor, percent
    pub min_profit_margin_pct: Percent,
}

/// A single underwriting check: when `triggered` holds, a finding of
/// `risk_type` / `severity` is emitted with the text from `describe`.
#[derive(Clone)]
pub struct RiskRule {
    pub risk_type: RiskType,
    pub severity: RiskLevel,
    pub triggered: fn(&RiskContext<'_>) -> bool,
    pub describe: fn(&RiskContext<'_>) -> String,
    pub mitigation: &'static str,
}

impl fmt::Debug for RiskRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskRule")
            .field("risk_type", &self.risk_type)
            .field("severity", &self.severity)
            .field("mitigation", &self.mitigation)
            .finish_non_exhaustive()
    }
}

impl RiskRule {
    fn evaluate(&self, ctx: &RiskContext<'_>) -> Option<RiskFinding> {
        if !(self.triggered)(ctx) {
            return None;
        }
        Some(RiskFinding {
            risk_type: self.risk_type,
            severity: self.severity,
            description: (self.describe)(ctx),
            mitigation: self.mitigation.to_string(),
        })
    }
}

/// The five standard construction-lending checks, in reporting order.
pub fn standard_rules() -> Vec<RiskRule> {
    vec![
        RiskRule {
            risk_type: RiskType::FundingGap,
            severity: RiskLevel::High,
            triggered: |ctx| ctx.ratios.funding_gap > Decimal::ZERO,
            describe: |ctx| {
                format!(
                    "Funding gap of ${} between total project cost and committed loan plus equity",
                    round_money(ctx.ratios.funding_gap)
                )
            },
            mitigation: "Secure additional equity or mezzanine financing before closing",
        },
        RiskRule {
            risk_type: RiskType::InterestReserve,
            severity: RiskLevel::Medium,
            triggered: |ctx| ctx.ratios.interest_reserve_needed > Decimal::ZERO,
            describe: |ctx| {
                format!(
                    "Interest reserve falls ${} short of interest accrued during construction",
                    round_money(ctx.ratios.interest_reserve_needed)
                )
            },
            mitigation: "Increase the interest reserve or fund the shortfall from sponsor equity",
        },
        RiskRule {
            risk_type: RiskType::LtcRatio,
            severity: RiskLevel::High,
            triggered: |ctx| ctx.ratios.loan_to_cost_ratio > ctx.loan_to_cost_limit,
            describe: |ctx| {
                format!(
                    "Loan-to-cost ratio of {}% exceeds the {}% limit",
                    round_percent(ctx.ratios.loan_to_cost_ratio),
                    ctx.loan_to_cost_limit
                )
            },
            mitigation: "Increase the equity contribution or reduce the loan amount",
        },
        RiskRule {
            risk_type: RiskType::LtvRatio,
            severity: RiskLevel::High,
            triggered: |ctx| ctx.ratios.loan_to_value_ratio > ctx.loan_to_value_limit,
            describe: |ctx| {
                format!(
                    "Loan-to-value ratio of {}% exceeds the {}% limit",
                    round_percent(ctx.ratios.loan_to_value_ratio),
                    ctx.loan_to_value_limit
                )
            },
            mitigation: "Reduce the loan amount or support a higher completion value with an updated appraisal",
        },
        RiskRule {
            risk_type: RiskType::ProfitMargin,
            severity: RiskLevel::Medium,
            triggered: |ctx| ctx.ratios.profit_margin < ctx.min_profit_margin_pct,
            describe: |ctx| {
                format!(
                    "Profit margin of {}% is below the {}% minimum",
                    round_percent(ctx.ratios.profit_margin),
                    ctx.min_profit_margin_pct
                )
            },
            mitigation: "Revisit cost assumptions, value-engineer the design or renegotiate pricing",
        },
    ]
}

/// Default profit margin floor, percent.
pub fn default_min_profit_margin() -> Percent {
    dec!(10)
}

// ---------------------------------------------------------------------------
// Assessor
// ---------------------------------------------------------------------------

/// Runs an ordered rule list. Every rule is evaluated; none suppresses
/// another, and findings keep the rule order.
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    rules: Vec<RiskRule>,
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiskAssessor {
    pub fn new(rules: Vec<RiskRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(standard_rules())
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: RiskRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[RiskRule] {
        &self.rules
    }

    pub fn assess(&self, ctx: &RiskContext<'_>) -> RiskAssessment {
        let risks: Vec<RiskFinding> = self.rules.iter().filter_map(|r| r.evaluate(ctx)).collect();
        RiskAssessment {
            risk_score: risks.len() as u32,
            overall_risk: overall_risk(risks.len()),
            risks,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_ratios() -> FeasibilityRatios {
        FeasibilityRatios {
            loan_to_cost_ratio: dec!(75),
            loan_to_value_ratio: dec!(53.57),
            profit_margin: dec!(40),
            roi: dec!(160),
            break_even_months: dec!(60),
            funding_gap: Decimal::ZERO,
            equity_required: dec!(5_000_000),
            interest_reserve_needed: Decimal::ZERO,
        }
    }

    fn ctx(ratios: &FeasibilityRatios) -> RiskContext<'_> {
        RiskContext {
            ratios,
            loan_to_cost_limit: dec!(80),
            loan_to_value_limit: dec!(65),
            min_profit_margin_pct: default_min_profit_margin(),
        }
    }

    fn types(assessment: &RiskAssessment) -> Vec<RiskType> {
        assessment.risks.iter().map(|r| r.risk_type).collect()
    }

    #[test]
    fn test_clean_project_is_low_risk() {
        let ratios = healthy_ratios();
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert!(a.risks.is_empty());
        assert_eq!(a.risk_score, 0);
        assert_eq!(a.overall_risk, RiskLevel::Low);
    }

    #[test]
    fn test_funding_gap_is_high_severity() {
        let mut ratios = healthy_ratios();
        ratios.funding_gap = dec!(4_000_000);
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert_eq!(types(&a), vec![RiskType::FundingGap]);
        assert_eq!(a.risks[0].severity, RiskLevel::High);
        assert!(a.risks[0].description.contains("$4000000"));
        assert_eq!(a.overall_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_interest_reserve_is_medium_severity() {
        let mut ratios = healthy_ratios();
        ratios.interest_reserve_needed = dec!(12_500.4);
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert_eq!(types(&a), vec![RiskType::InterestReserve]);
        assert_eq!(a.risks[0].severity, RiskLevel::Medium);
        assert!(a.risks[0].description.contains("$12500"));
    }

    #[test]
    fn test_ratio_limits_are_strict() {
        let mut ratios = healthy_ratios();
        ratios.loan_to_cost_ratio = dec!(80);
        ratios.loan_to_value_ratio = dec!(65);
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert!(a.risks.is_empty(), "ratios at the limit should pass");

        ratios.loan_to_cost_ratio = dec!(80.01);
        ratios.loan_to_value_ratio = dec!(65.2);
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert_eq!(types(&a), vec![RiskType::LtcRatio, RiskType::LtvRatio]);
        assert!(a.risks.iter().all(|r| r.severity == RiskLevel::High));
    }

    #[test]
    fn test_thin_margin_flagged() {
        let mut ratios = healthy_ratios();
        ratios.profit_margin = dec!(5);
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert_eq!(types(&a), vec![RiskType::ProfitMargin]);
        assert_eq!(a.risks[0].severity, RiskLevel::Medium);

        ratios.profit_margin = dec!(10);
        assert!(RiskAssessor::standard().assess(&ctx(&ratios)).risks.is_empty());
    }

    #[test]
    fn test_every_rule_fires_in_fixed_order() {
        let ratios = FeasibilityRatios {
            loan_to_cost_ratio: dec!(90),
            loan_to_value_ratio: dec!(95),
            profit_margin: dec!(2),
            roi: dec!(5),
            break_even_months: dec!(24),
            funding_gap: dec!(100_000),
            equity_required: dec!(200_000),
            interest_reserve_needed: dec!(50_000),
        };
        let a = RiskAssessor::standard().assess(&ctx(&ratios));
        assert_eq!(
            types(&a),
            vec![
                RiskType::FundingGap,
                RiskType::InterestReserve,
                RiskType::LtcRatio,
                RiskType::LtvRatio,
                RiskType::ProfitMargin,
            ]
        );
        assert_eq!(a.risk_score, 5);
        assert_eq!(a.overall_risk, RiskLevel::High);
    }

    #[test]
    fn test_overall_grade_thresholds() {
        assert_eq!(overall_risk(0), RiskLevel::Low);
        assert_eq!(overall_risk(1), RiskLevel::Medium);
        assert_eq!(overall_risk(2), RiskLevel::Medium);
        assert_eq!(overall_risk(3), RiskLevel::High);
        assert_eq!(overall_risk(7), RiskLevel::High);
    }

    #[test]
    fn test_custom_rule_appended() {
        let assessor = RiskAssessor::standard().with_rule(RiskRule {
            risk_type: RiskType::ProfitMargin,
            severity: RiskLevel::Low,
            triggered: |ctx| ctx.ratios.break_even_months > dec!(48),
            describe: |_| "Slow payback".to_string(),
            mitigation: "Consider phasing the project",
        });
        assert_eq!(assessor.rules().len(), 6);
        let ratios = healthy_ratios();
        let a = assessor.assess(&ctx(&ratios));
        assert_eq!(a.risk_score, 1);
        assert_eq!(a.risks[0].severity, RiskLevel::Low);
        assert_eq!(a.risks[0].description, "Slow payback");
    }

    #[test]
    fn test_finding_wire_format() {
        let finding = RiskFinding {
            risk_type: RiskType::LtvRatio,
            severity: RiskLevel::High,
            description: "d".into(),
            mitigation: "m".into(),
        };
        let v = serde_json::to_value(&finding).unwrap();
        assert_eq!(v["type"], "ltv-ratio");
        assert_eq!(v["severity"], "high");
    }
}
