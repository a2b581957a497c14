use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::accrual::{accrue_interest, period_interest};
use super::disbursement::{DisbursementModel, DisbursementPolicy};
use super::fees::{aggregate_fees, FinancingFees};
use super::ratios::{compute_ratios, loan_to_cost_ratio};
use super::risk::{RiskAssessment, RiskAssessor, RiskContext};
use super::schedule::{build_cash_flow, build_draw_schedule, CashFlowPeriod, DrawRecord};
use super::terms::{
    CapitalStack, ConstructionWindow, ExitAssumptions, ExitStrategy, LoanTerms, ProjectCostBasis,
    ProjectType, UnderwritingAssumptions,
};
use super::validation::validate_input;
use crate::types::{round_money, round_percent, with_metadata, ComputationOutput, Money, Percent};
use crate::LoanResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Everything a borrower enters for one construction loan scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionLoanInput {
    pub project_type: ProjectType,
    pub loan_amount: Money,
    /// Annual interest rate, percent
    pub interest_rate: Percent,
    pub loan_term_months: u32,
    pub construction_period_months: u32,
    pub total_project_cost: Money,
    pub land_cost: Money,
    pub construction_cost: Money,
    pub soft_costs: Money,
    pub contingency: Money,
    pub equity_contribution: Money,
    pub disbursement_policy: DisbursementPolicy,
    pub interest_reserve_provided: Money,
    pub origination_fee_percent: Percent,
    pub appraisal_fee: Money,
    pub legal_fee: Money,
    pub title_fee: Money,
    pub inspection_fee: Money,
    /// Lender's maximum loan-to-cost, percent
    pub loan_to_cost_limit: Percent,
    /// Lender's maximum loan-to-value, percent
    pub loan_to_value_limit: Percent,
    pub completion_value: Money,
    pub exit_strategy: ExitStrategy,
    pub construction_start_date: NaiveDate,
    pub completion_date: NaiveDate,
    #[serde(default)]
    pub assumptions: UnderwritingAssumptions,
}

impl ConstructionLoanInput {
    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            loan_amount: self.loan_amount,
            annual_interest_rate: self.interest_rate,
            loan_term_months: self.loan_term_months,
            construction_period_months: self.construction_period_months,
            disbursement_policy: self.disbursement_policy,
        }
    }

    pub fn cost_basis(&self) -> ProjectCostBasis {
        ProjectCostBasis {
            land_cost: self.land_cost,
            construction_cost: self.construction_cost,
            soft_costs: self.soft_costs,
            contingency: self.contingency,
            total_project_cost: self.total_project_cost,
        }
    }

    pub fn financing_fees(&self) -> FinancingFees {
        FinancingFees {
            origination_fee_percent: self.origination_fee_percent,
            appraisal_fee: self.appraisal_fee,
            legal_fee: self.legal_fee,
            title_fee: self.title_fee,
            inspection_fee: self.inspection_fee,
        }
    }

    pub fn capital_stack(&self) -> CapitalStack {
        CapitalStack {
            loan_amount: self.loan_amount,
            equity_contribution: self.equity_contribution,
            total_project_cost: self.total_project_cost,
        }
    }

    pub fn exit_assumptions(&self) -> ExitAssumptions {
        ExitAssumptions {
            projected_completion_value: self.completion_value,
            interest_reserve_provided: self.interest_reserve_provided,
        }
    }

    pub fn construction_window(&self) -> ConstructionWindow {
        ConstructionWindow {
            start: self.construction_start_date,
            completion: self.completion_date,
        }
    }
}

/// Feasibility result of one scenario. Currency is rounded to whole units,
/// percentages and months to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionLoanOutput {
    /// One month of interest on the full commitment (headline figure)
    pub monthly_interest: Money,
    /// Interest accrued on the drawn balance across all draws
    pub total_interest: Money,
    pub interest_reserve_needed: Money,
    /// Principal + interest + fees
    pub total_loan_cost: Money,
    pub loan_fees: Money,
    pub funding_gap: Money,
    pub equity_required: Money,
    pub loan_to_cost_ratio: Percent,
    pub loan_to_value_ratio: Percent,
    pub profit_margin: Percent,
    pub roi: Percent,
    pub break_even_months: Decimal,
    /// Average draw per construction month
    pub monthly_draws: Money,
    pub draw_schedule: Vec<DrawRecord>,
    pub cash_flow: Vec<CashFlowPeriod>,
    pub risk_assessment: RiskAssessment,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Run the full construction-loan pipeline on already-validated input.
///
/// Draws → interest accrual → fees and feasibility ratios → risk rules →
/// reported schedule. Pure: identical input gives identical output. The
/// only failure is a draw date beyond the representable calendar.
pub fn calculate(input: &ConstructionLoanInput) -> LoanResult<ConstructionLoanOutput> {
    let terms = input.loan_terms();
    let months = terms.construction_period_months;

    let model = DisbursementModel::new(input.assumptions.milestone_weights.clone());
    let draws = model.generate_draws(terms.loan_amount, months, terms.disbursement_policy);
    debug!(
        "generated {} {} draws over {months} months",
        draws.len(),
        terms.disbursement_policy
    );

    let accrual = accrue_interest(&draws, terms.annual_interest_rate);
    let loan_fees = aggregate_fees(terms.loan_amount, &input.financing_fees());
    debug!("accrued interest {} and fees {loan_fees}", accrual.total);

    let ratios = compute_ratios(
        &input.capital_stack(),
        &input.exit_assumptions(),
        months,
        accrual.total,
    );
    debug!(
        "ltc {} ltv {} margin {}",
        ratios.loan_to_cost_ratio, ratios.loan_to_value_ratio, ratios.profit_margin
    );

    let risk_assessment = RiskAssessor::standard().assess(&RiskContext {
        ratios: &ratios,
        loan_to_cost_limit: input.loan_to_cost_limit,
        loan_to_value_limit: input.loan_to_value_limit,
        min_profit_margin_pct: input.assumptions.min_profit_margin_pct,
    });

    let monthly_draws = if months > 0 {
        terms.loan_amount / Decimal::from(months)
    } else {
        Decimal::ZERO
    };

    Ok(ConstructionLoanOutput {
        monthly_interest: round_money(period_interest(
            terms.loan_amount,
            terms.annual_interest_rate,
        )),
        total_interest: round_money(accrual.total),
        interest_reserve_needed: round_money(ratios.interest_reserve_needed),
        total_loan_cost: round_money(terms.loan_amount + accrual.total + loan_fees),
        loan_fees: round_money(loan_fees),
        funding_gap: round_money(ratios.funding_gap),
        equity_required: round_money(ratios.equity_required),
        loan_to_cost_ratio: round_percent(ratios.loan_to_cost_ratio),
        loan_to_value_ratio: round_percent(ratios.loan_to_value_ratio),
        profit_margin: round_percent(ratios.profit_margin),
        roi: round_percent(ratios.roi),
        break_even_months: round_percent(ratios.break_even_months),
        monthly_draws: round_money(monthly_draws),
        draw_schedule: build_draw_schedule(&draws, input.construction_start_date)?,
        cash_flow: build_cash_flow(&draws, terms.annual_interest_rate, months),
        risk_assessment,
    })
}

/// Validate, calculate and wrap the result in the standard envelope.
///
/// Every validation problem is reported at once as
/// [`LoanError::ValidationFailed`](crate::LoanError::ValidationFailed).
pub fn calculate_construction_loan(
    input: &ConstructionLoanInput,
) -> LoanResult<ComputationOutput<ConstructionLoanOutput>> {
    let start = Instant::now();

    validate_input(input).into_result()?;

    let output = calculate(input)?;
    let warnings = collect_warnings(input, &output);

    info!(
        "construction loan of {} assessed: {} risk, {} finding(s), {} warning(s)",
        input.loan_amount,
        output.risk_assessment.overall_risk,
        output.risk_assessment.risk_score,
        warnings.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Construction Loan Feasibility (progressive draw accrual)",
        &serde_json::json!({
            "project_type": input.project_type,
            "exit_strategy": input.exit_strategy,
            "loan_amount": input.loan_amount.to_string(),
            "interest_rate_pct": input.interest_rate.to_string(),
            "construction_period_months": input.construction_period_months,
            "loan_term_months": input.loan_term_months,
            "disbursement_policy": input.disbursement_policy.as_str(),
            "interest_basis": "cumulative drawn balance, monthly",
            "milestone_weights": input
                .assumptions
                .milestone_weights
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>(),
            "min_profit_margin_pct": input.assumptions.min_profit_margin_pct.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Advisories that do not trigger a risk finding but deserve a look.
fn collect_warnings(input: &ConstructionLoanInput, output: &ConstructionLoanOutput) -> Vec<String> {
    let mut warnings = Vec::new();

    let ltc = loan_to_cost_ratio(input.loan_amount, input.total_project_cost);
    let ltc_headroom = input.loan_to_cost_limit - ltc;
    if ltc_headroom >= Decimal::ZERO && ltc_headroom < dec!(5) {
        warnings.push(format!(
            "Loan-to-cost of {}% is within 5 points of the {}% limit",
            output.loan_to_cost_ratio, input.loan_to_cost_limit
        ));
    }

    if output.total_interest > Decimal::ZERO
        && input.interest_reserve_provided < output.total_interest * dec!(0.5)
    {
        warnings.push(format!(
            "Interest reserve of ${} covers less than half of the ${} accrued interest",
            round_money(input.interest_reserve_provided),
            output.total_interest
        ));
    }

    if output.break_even_months > Decimal::from(input.loan_term_months) {
        warnings.push(format!(
            "Break-even of {} months extends beyond the {}-month loan term",
            output.break_even_months, input.loan_term_months
        ));
    }

    let difference = input.cost_basis().reconciliation_difference();
    if !difference.is_zero() {
        warnings.push(format!(
            "Cost components differ from total project cost by ${}",
            round_money(difference)
        ));
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction_loan::risk::{RiskLevel, RiskType};
    use crate::LoanError;

    fn residential_input() -> ConstructionLoanInput {
        ConstructionLoanInput {
            project_type: ProjectType::Residential,
            loan_amount: dec!(2_000_000),
            interest_rate: dec!(8.5),
            loan_term_months: 18,
            construction_period_months: 12,
            total_project_cost: dec!(2_500_000),
            land_cost: dec!(500_000),
            construction_cost: dec!(1_800_000),
            soft_costs: dec!(150_000),
            contingency: dec!(50_000),
            equity_contribution: dec!(500_000),
            disbursement_policy: DisbursementPolicy::Monthly,
            interest_reserve_provided: dec!(150_000),
            origination_fee_percent: dec!(1.5),
            appraisal_fee: dec!(3_000),
            legal_fee: dec!(8_000),
            title_fee: dec!(5_000),
            inspection_fee: dec!(6_000),
            loan_to_cost_limit: dec!(80),
            loan_to_value_limit: dec!(75),
            completion_value: dec!(3_200_000),
            exit_strategy: ExitStrategy::Sale,
            construction_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            completion_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            assumptions: UnderwritingAssumptions::default(),
        }
    }

    #[test]
    fn test_headline_figures() {
        let out = calculate(&residential_input()).unwrap();
        assert_eq!(out.monthly_interest, dec!(14_167));
        assert_eq!(out.monthly_draws, dec!(166_667));
        assert_eq!(out.loan_fees, dec!(52_000));
        assert_eq!(out.funding_gap, Decimal::ZERO);
        assert_eq!(out.equity_required, dec!(500_000));
        assert_eq!(out.loan_to_cost_ratio, dec!(80));
        assert_eq!(out.loan_to_value_ratio, dec!(62.5));
        assert_eq!(out.profit_margin, dec!(28));
        assert_eq!(out.roi, dec!(140));
        assert_eq!(out.break_even_months, dec!(42.9));
    }

    #[test]
    fn test_interest_on_drawn_balance() {
        let out = calculate(&residential_input()).unwrap();
        // 14166.67 * 78 / 12 = 92083.33
        assert_eq!(out.total_interest, dec!(92_083));
        assert!(out.total_interest < dec!(2_000_000) * dec!(0.085));
        assert_eq!(out.interest_reserve_needed, Decimal::ZERO);
        assert_eq!(out.total_loan_cost, dec!(2_000_000) + dec!(92_083) + dec!(52_000));
    }

    #[test]
    fn test_schedule_and_cash_flow_lengths() {
        let out = calculate(&residential_input()).unwrap();
        assert_eq!(out.draw_schedule.len(), 12);
        assert_eq!(out.cash_flow.len(), 12);
        assert_eq!(out.draw_schedule[11].cumulative_amount, dec!(2_000_000));
        assert_eq!(out.cash_flow[11].cumulative_interest, out.total_interest);
    }

    #[test]
    fn test_clean_scenario_is_low_risk() {
        let out = calculate(&residential_input()).unwrap();
        assert!(out.risk_assessment.risks.is_empty());
        assert_eq!(out.risk_assessment.overall_risk, RiskLevel::Low);
    }

    #[test]
    fn test_zero_reserve_needs_all_interest() {
        let mut input = residential_input();
        input.interest_reserve_provided = Decimal::ZERO;
        let out = calculate(&input).unwrap();
        assert_eq!(out.interest_reserve_needed, out.total_interest);
        assert!(out.risk_assessment.has(RiskType::InterestReserve));
    }

    #[test]
    fn test_custom_profit_floor() {
        let mut input = residential_input();
        input.assumptions.min_profit_margin_pct = dec!(30);
        let out = calculate(&input).unwrap();
        assert!(out.risk_assessment.has(RiskType::ProfitMargin));
        assert_eq!(out.risk_assessment.overall_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_envelope_and_warnings() {
        let result = calculate_construction_loan(&residential_input()).unwrap();
        assert_eq!(
            result.methodology,
            "Construction Loan Feasibility (progressive draw accrual)"
        );
        assert_eq!(result.assumptions["disbursement_policy"], "monthly");
        // LTC sits exactly on its limit; break-even (42.9) exceeds the 18-month term
        assert!(result.warnings.iter().any(|w| w.contains("within 5 points")));
        assert!(result.warnings.iter().any(|w| w.contains("beyond the 18-month")));
        assert!(!result.warnings.iter().any(|w| w.contains("Cost components")));
    }

    #[test]
    fn test_validation_runs_before_calculation() {
        let mut input = residential_input();
        input.loan_amount = dec!(50_000);
        input.construction_period_months = 24;
        let err = calculate_construction_loan(&input).unwrap_err();
        assert!(matches!(err, LoanError::ValidationFailed(_)));
        assert!(err.issues().len() >= 2);
    }

    #[test]
    fn test_input_deserializes_with_default_assumptions() {
        let json = r#"{
            "project_type": "mixed-use",
            "loan_amount": 15000000,
            "interest_rate": 6.75,
            "loan_term_months": 30,
            "construction_period_months": 24,
            "total_project_cost": 20000000,
            "land_cost": 5000000,
            "construction_cost": 13000000,
            "soft_costs": 1500000,
            "contingency": 500000,
            "equity_contribution": 5000000,
            "disbursement_policy": "quarterly",
            "interest_reserve_provided": 800000,
            "origination_fee_percent": 0.75,
            "appraisal_fee": 8000,
            "legal_fee": 25000,
            "title_fee": 12000,
            "inspection_fee": 20000,
            "loan_to_cost_limit": 75,
            "loan_to_value_limit": 65,
            "completion_value": 28000000,
            "exit_strategy": "hold",
            "construction_start_date": "2024-06-01",
            "completion_date": "2026-05-31"
        }"#;
        let input: ConstructionLoanInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.interest_rate, dec!(6.75));
        assert_eq!(input.assumptions, UnderwritingAssumptions::default());
        let out = calculate(&input).unwrap();
        assert_eq!(out.draw_schedule.len(), 8);
        assert_eq!(out.cash_flow.len(), 24);
    }
}
