use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::disbursement::{default_milestone_weights, DisbursementPolicy};
use super::risk::default_min_profit_margin;
use crate::types::{Money, Percent};

// ---------------------------------------------------------------------------
// Descriptive enums (carried through, not used by the math)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Residential,
    Commercial,
    Industrial,
    MixedUse,
    LandDevelopment,
    Renovation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitStrategy {
    Sale,
    Refinance,
    Hold,
    Lease,
}

// ---------------------------------------------------------------------------
// Value records
// ---------------------------------------------------------------------------

/// Commercial terms of the loan itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_amount: Money,
    /// Annual rate in percent (8.5 = 8.5%)
    pub annual_interest_rate: Percent,
    pub loan_term_months: u32,
    pub construction_period_months: u32,
    pub disbursement_policy: DisbursementPolicy,
}

/// Cost build-up of the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCostBasis {
    pub land_cost: Money,
    pub construction_cost: Money,
    pub soft_costs: Money,
    pub contingency: Money,
    pub total_project_cost: Money,
}

impl ProjectCostBasis {
    /// Sum of the individual cost components.
    pub fn component_total(&self) -> Money {
        self.land_cost + self.construction_cost + self.soft_costs + self.contingency
    }

    /// Absolute difference between the stated total and the component sum.
    pub fn reconciliation_difference(&self) -> Money {
        (self.total_project_cost - self.component_total()).abs()
    }
}

/// How the project cost is funded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStack {
    pub loan_amount: Money,
    pub equity_contribution: Money,
    pub total_project_cost: Money,
}

impl CapitalStack {
    /// Cost not covered by either the loan or the committed equity.
    pub fn funding_gap(&self) -> Money {
        (self.total_project_cost - self.loan_amount - self.equity_contribution).max(Decimal::ZERO)
    }

    /// Equity needed to close the gap between cost and loan.
    pub fn equity_required(&self) -> Money {
        (self.total_project_cost - self.loan_amount).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitAssumptions {
    pub projected_completion_value: Money,
    pub interest_reserve_provided: Money,
}

/// Tunable underwriting parameters. Every field has a market default so
/// callers normally omit the whole block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwritingAssumptions {
    /// Share of the loan released per milestone tranche, front-loaded.
    pub milestone_weights: Vec<Decimal>,
    /// Profit margin (percent) below which the project is flagged.
    pub min_profit_margin_pct: Percent,
}

impl Default for UnderwritingAssumptions {
    fn default() -> Self {
        Self {
            milestone_weights: default_milestone_weights(),
            min_profit_margin_pct: default_min_profit_margin(),
        }
    }
}

/// Construction window as entered, used only for validation and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionWindow {
    pub start: NaiveDate,
    pub completion: NaiveDate,
}

impl ConstructionWindow {
    pub fn is_ordered(&self) -> bool {
        self.completion > self.start
    }
}
