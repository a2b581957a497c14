use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::calculator::ConstructionLoanInput;
use super::disbursement::DisbursementPolicy;
use super::terms::{
    ConstructionWindow, ExitStrategy, ProjectCostBasis, ProjectType, UnderwritingAssumptions,
};
use crate::error::{LoanError, ValidationIssue};
use crate::types::{Money, Percent};
use crate::LoanResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of validating one input record. Problems are collected, never
/// short-circuited, so a form can show all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn into_result(self) -> LoanResult<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(LoanError::ValidationFailed(self.errors))
        }
    }
}

/// A loan record as submitted, before its required fields are known to be
/// present. Deserialising into this instead of [`ConstructionLoanInput`]
/// lets a missing field be reported alongside every other problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanInputDraft {
    pub project_type: Option<ProjectType>,
    pub loan_amount: Option<Money>,
    pub interest_rate: Option<Percent>,
    pub loan_term_months: Option<u32>,
    pub construction_period_months: Option<u32>,
    pub total_project_cost: Option<Money>,
    pub land_cost: Option<Money>,
    pub construction_cost: Option<Money>,
    pub soft_costs: Option<Money>,
    pub contingency: Option<Money>,
    pub equity_contribution: Option<Money>,
    pub disbursement_policy: Option<DisbursementPolicy>,
    pub interest_reserve_provided: Option<Money>,
    pub origination_fee_percent: Option<Percent>,
    pub appraisal_fee: Option<Money>,
    pub legal_fee: Option<Money>,
    pub title_fee: Option<Money>,
    pub inspection_fee: Option<Money>,
    pub loan_to_cost_limit: Option<Percent>,
    pub loan_to_value_limit: Option<Percent>,
    pub completion_value: Option<Money>,
    pub exit_strategy: Option<ExitStrategy>,
    pub construction_start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub assumptions: UnderwritingAssumptions,
}

impl From<&ConstructionLoanInput> for LoanInputDraft {
    fn from(input: &ConstructionLoanInput) -> Self {
        Self {
            project_type: Some(input.project_type),
            loan_amount: Some(input.loan_amount),
            interest_rate: Some(input.interest_rate),
            loan_term_months: Some(input.loan_term_months),
            construction_period_months: Some(input.construction_period_months),
            total_project_cost: Some(input.total_project_cost),
            land_cost: Some(input.land_cost),
            construction_cost: Some(input.construction_cost),
            soft_costs: Some(input.soft_costs),
            contingency: Some(input.contingency),
            equity_contribution: Some(input.equity_contribution),
            disbursement_policy: Some(input.disbursement_policy),
            interest_reserve_provided: Some(input.interest_reserve_provided),
            origination_fee_percent: Some(input.origination_fee_percent),
            appraisal_fee: Some(input.appraisal_fee),
            legal_fee: Some(input.legal_fee),
            title_fee: Some(input.title_fee),
            inspection_fee: Some(input.inspection_fee),
            loan_to_cost_limit: Some(input.loan_to_cost_limit),
            loan_to_value_limit: Some(input.loan_to_value_limit),
            completion_value: Some(input.completion_value),
            exit_strategy: Some(input.exit_strategy),
            construction_start_date: Some(input.construction_start_date),
            completion_date: Some(input.completion_date),
            assumptions: input.assumptions.clone(),
        }
    }
}

impl LoanInputDraft {
    /// Validate the draft and, when it passes, complete it into a
    /// [`ConstructionLoanInput`]. Missing fields fail in the same
    /// [`LoanError::ValidationFailed`] batch as every other problem.
    pub fn into_input(self) -> LoanResult<ConstructionLoanInput> {
        validate_draft(&self).into_result()?;
        Ok(ConstructionLoanInput {
            project_type: present(self.project_type, "project_type")?,
            loan_amount: present(self.loan_amount, "loan_amount")?,
            interest_rate: present(self.interest_rate, "interest_rate")?,
            loan_term_months: present(self.loan_term_months, "loan_term_months")?,
            construction_period_months: present(
                self.construction_period_months,
                "construction_period_months",
            )?,
            total_project_cost: present(self.total_project_cost, "total_project_cost")?,
            land_cost: present(self.land_cost, "land_cost")?,
            construction_cost: present(self.construction_cost, "construction_cost")?,
            soft_costs: present(self.soft_costs, "soft_costs")?,
            contingency: present(self.contingency, "contingency")?,
            equity_contribution: present(self.equity_contribution, "equity_contribution")?,
            disbursement_policy: present(self.disbursement_policy, "disbursement_policy")?,
            interest_reserve_provided: present(
                self.interest_reserve_provided,
                "interest_reserve_provided",
            )?,
            origination_fee_percent: present(
                self.origination_fee_percent,
                "origination_fee_percent",
            )?,
            appraisal_fee: present(self.appraisal_fee, "appraisal_fee")?,
            legal_fee: present(self.legal_fee, "legal_fee")?,
            title_fee: present(self.title_fee, "title_fee")?,
            inspection_fee: present(self.inspection_fee, "inspection_fee")?,
            loan_to_cost_limit: present(self.loan_to_cost_limit, "loan_to_cost_limit")?,
            loan_to_value_limit: present(self.loan_to_value_limit, "loan_to_value_limit")?,
            completion_value: present(self.completion_value, "completion_value")?,
            exit_strategy: present(self.exit_strategy, "exit_strategy")?,
            construction_start_date: present(
                self.construction_start_date,
                "construction_start_date",
            )?,
            completion_date: present(self.completion_date, "completion_date")?,
            assumptions: self.assumptions,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Currency,
    Percent,
    Months,
}

/// Accepted band for one numeric field.
#[derive(Debug, Clone, Copy)]
struct FieldRange {
    field: &'static str,
    label: &'static str,
    min: Decimal,
    max: Decimal,
    unit: Unit,
}

impl FieldRange {
    const fn new(
        field: &'static str,
        label: &'static str,
        min: Decimal,
        max: Decimal,
        unit: Unit,
    ) -> Self {
        Self {
            field,
            label,
            min,
            max,
            unit,
        }
    }

    fn check(&self, value: Option<Decimal>) -> Option<ValidationIssue> {
        let Some(value) = value else {
            return Some(required(self.field));
        };
        let message = if value < self.min {
            if self.min.is_zero() {
                format!("{} cannot be negative", self.label)
            } else {
                format!("{} must be at least {}", self.label, self.display(self.min))
            }
        } else if value > self.max {
            format!("{} cannot exceed {}", self.label, self.display(self.max))
        } else {
            return None;
        };
        Some(issue(self.field, message))
    }

    fn display(&self, bound: Decimal) -> String {
        match self.unit {
            Unit::Currency => format!("${}", with_thousands(bound)),
            Unit::Percent => format!("{}%", bound.normalize()),
            Unit::Months => format!("{} months", bound.normalize()),
        }
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Check every field range and cross-field rule.
pub fn validate_input(input: &ConstructionLoanInput) -> ValidationReport {
    validate_draft(&LoanInputDraft::from(input))
}

/// Check a possibly incomplete record. Each missing field is one issue;
/// range checks run on the fields present and cross-field rules run when
/// every field they compare is present.
pub fn validate_draft(draft: &LoanInputDraft) -> ValidationReport {
    let mut errors: Vec<ValidationIssue> = descriptive_fields(draft)
        .into_iter()
        .filter(|(_, given)| !given)
        .map(|(field, _)| required(field))
        .collect();

    errors.extend(
        range_checks(draft)
            .into_iter()
            .filter_map(|(range, value)| range.check(value)),
    );
    errors.extend(cross_field_checks(draft));
    errors.extend(assumption_checks(&draft.assumptions));

    ValidationReport::from_issues(errors)
}

fn descriptive_fields(draft: &LoanInputDraft) -> [(&'static str, bool); 5] {
    [
        ("project_type", draft.project_type.is_some()),
        ("disbursement_policy", draft.disbursement_policy.is_some()),
        ("exit_strategy", draft.exit_strategy.is_some()),
        ("construction_start_date", draft.construction_start_date.is_some()),
        ("completion_date", draft.completion_date.is_some()),
    ]
}

fn range_checks(draft: &LoanInputDraft) -> Vec<(FieldRange, Option<Decimal>)> {
    use Unit::*;
    vec![
        (
            FieldRange::new("loan_amount", "Loan amount", dec!(100_000), dec!(100_000_000), Currency),
            draft.loan_amount,
        ),
        (
            FieldRange::new("interest_rate", "Interest rate", dec!(1), dec!(25), Percent),
            draft.interest_rate,
        ),
        (
            FieldRange::new("loan_term_months", "Loan term", dec!(6), dec!(36), Months),
            draft.loan_term_months.map(Decimal::from),
        ),
        (
            FieldRange::new(
                "construction_period_months",
                "Construction period",
                dec!(3),
                dec!(24),
                Months,
            ),
            draft.construction_period_months.map(Decimal::from),
        ),
        (
            FieldRange::new(
                "total_project_cost",
                "Project cost",
                dec!(100_000),
                dec!(200_000_000),
                Currency,
            ),
            draft.total_project_cost,
        ),
        (
            FieldRange::new("land_cost", "Land cost", Decimal::ZERO, dec!(100_000_000), Currency),
            draft.land_cost,
        ),
        (
            FieldRange::new(
                "construction_cost",
                "Construction cost",
                dec!(50_000),
                dec!(150_000_000),
                Currency,
            ),
            draft.construction_cost,
        ),
        (
            FieldRange::new("soft_costs", "Soft costs", Decimal::ZERO, dec!(50_000_000), Currency),
            draft.soft_costs,
        ),
        (
            FieldRange::new("contingency", "Contingency", Decimal::ZERO, dec!(20_000_000), Currency),
            draft.contingency,
        ),
        (
            FieldRange::new(
                "equity_contribution",
                "Equity contribution",
                Decimal::ZERO,
                dec!(100_000_000),
                Currency,
            ),
            draft.equity_contribution,
        ),
        (
            FieldRange::new(
                "interest_reserve_provided",
                "Interest reserve",
                Decimal::ZERO,
                dec!(10_000_000),
                Currency,
            ),
            draft.interest_reserve_provided,
        ),
        (
            FieldRange::new(
                "origination_fee_percent",
                "Origination fee",
                Decimal::ZERO,
                dec!(5),
                Percent,
            ),
            draft.origination_fee_percent,
        ),
        (
            FieldRange::new("appraisal_fee", "Appraisal fee", Decimal::ZERO, dec!(10_000), Currency),
            draft.appraisal_fee,
        ),
        (
            FieldRange::new("legal_fee", "Legal fee", Decimal::ZERO, dec!(25_000), Currency),
            draft.legal_fee,
        ),
        (
            FieldRange::new("title_fee", "Title fee", Decimal::ZERO, dec!(15_000), Currency),
            draft.title_fee,
        ),
        (
            FieldRange::new(
                "inspection_fee",
                "Inspection fee",
                Decimal::ZERO,
                dec!(20_000),
                Currency,
            ),
            draft.inspection_fee,
        ),
        (
            FieldRange::new(
                "loan_to_cost_limit",
                "Loan-to-cost ratio",
                dec!(50),
                dec!(90),
                Percent,
            ),
            draft.loan_to_cost_limit,
        ),
        (
            FieldRange::new(
                "loan_to_value_limit",
                "Loan-to-value ratio",
                dec!(50),
                dec!(85),
                Percent,
            ),
            draft.loan_to_value_limit,
        ),
        (
            FieldRange::new(
                "completion_value",
                "Completion value",
                dec!(100_000),
                dec!(300_000_000),
                Currency,
            ),
            draft.completion_value,
        ),
    ]
}

fn cross_field_checks(draft: &LoanInputDraft) -> Vec<ValidationIssue> {
    let mut errors = Vec::new();

    if let (Some(period), Some(term)) = (draft.construction_period_months, draft.loan_term_months) {
        if period > term {
            errors.push(issue(
                "construction_period_months",
                "Construction period cannot exceed loan term",
            ));
        }
    }

    if let (Some(loan), Some(cost)) = (draft.loan_amount, draft.total_project_cost) {
        if loan > cost {
            errors.push(issue(
                "loan_amount",
                "Loan amount cannot exceed total project cost",
            ));
        }
        if let Some(equity) = draft.equity_contribution {
            if loan + equity < cost {
                errors.push(issue(
                    "equity_contribution",
                    "Loan amount plus equity contribution must cover total project cost",
                ));
            }
        }
    }

    if let (Some(start), Some(completion)) = (draft.construction_start_date, draft.completion_date)
    {
        if !(ConstructionWindow { start, completion }).is_ordered() {
            errors.push(issue(
                "completion_date",
                "Completion date must be after construction start date",
            ));
        }
    }

    if let (Some(land), Some(construction), Some(soft), Some(contingency), Some(total)) = (
        draft.land_cost,
        draft.construction_cost,
        draft.soft_costs,
        draft.contingency,
        draft.total_project_cost,
    ) {
        let basis = ProjectCostBasis {
            land_cost: land,
            construction_cost: construction,
            soft_costs: soft,
            contingency,
            total_project_cost: total,
        };
        // Components may be estimates; allow 1% drift from the stated total.
        if total > Decimal::ZERO && basis.reconciliation_difference() > total * dec!(0.01) {
            errors.push(issue(
                "total_project_cost",
                "Land, construction, soft costs and contingency must add up to total project cost",
            ));
        }
    }

    errors
}

fn assumption_checks(assumptions: &UnderwritingAssumptions) -> Vec<ValidationIssue> {
    let mut errors = Vec::new();
    let weights = &assumptions.milestone_weights;

    if weights.is_empty() {
        errors.push(issue(
            "assumptions.milestone_weights",
            "At least one milestone weight is required",
        ));
    } else if weights.iter().any(|w| w.is_sign_negative()) {
        errors.push(issue(
            "assumptions.milestone_weights",
            "Milestone weights cannot be negative",
        ));
    } else {
        let sum: Decimal = weights.iter().sum();
        if (sum - Decimal::ONE).abs() > dec!(0.0001) {
            errors.push(issue(
                "assumptions.milestone_weights",
                format!("Milestone weights must sum to 1 (got {sum})"),
            ));
        }
    }

    let floor = assumptions.min_profit_margin_pct;
    if floor < Decimal::ZERO || floor > dec!(100) {
        errors.push(issue(
            "assumptions.min_profit_margin_pct",
            "Minimum profit margin must be between 0% and 100%",
        ));
    }

    errors
}

fn required(field: &str) -> ValidationIssue {
    issue(field, format!("{field} is required"))
}

fn present<T>(value: Option<T>, field: &str) -> LoanResult<T> {
    value.ok_or_else(|| LoanError::InvalidInput {
        field: field.to_string(),
        reason: "is required".to_string(),
    })
}

fn issue(field: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// `1234567` -> `1,234,567` (integer part only).
fn with_thousands(value: Decimal) -> String {
    let digits = value.trunc().abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
