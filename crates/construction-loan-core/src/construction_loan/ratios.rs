use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::terms::{CapitalStack, ExitAssumptions};
use crate::types::{Money, Percent};

/// Feasibility figures of one scenario, unrounded.
///
/// The risk assessor reads these directly; only the reported output is
/// rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityRatios {
    pub loan_to_cost_ratio: Percent,
    pub loan_to_value_ratio: Percent,
    pub profit_margin: Percent,
    pub roi: Percent,
    pub break_even_months: Decimal,
    pub funding_gap: Money,
    pub equity_required: Money,
    pub interest_reserve_needed: Money,
}

// ---------------------------------------------------------------------------
// Individual ratios
// ---------------------------------------------------------------------------

/// Loan / total project cost, in percent. Zero when the cost is zero.
pub fn loan_to_cost_ratio(loan_amount: Money, total_project_cost: Money) -> Percent {
    percent_of(loan_amount, total_project_cost)
}

/// Loan / completion value, in percent. Zero when the value is zero.
pub fn loan_to_value_ratio(loan_amount: Money, completion_value: Money) -> Percent {
    percent_of(loan_amount, completion_value)
}

/// Development profit over cost, in percent.
pub fn profit_margin(completion_value: Money, total_project_cost: Money) -> Percent {
    percent_of(completion_value - total_project_cost, total_project_cost)
}

/// Development profit over equity, in percent. Zero without equity.
pub fn return_on_equity(
    completion_value: Money,
    total_project_cost: Money,
    equity_contribution: Money,
) -> Percent {
    percent_of(completion_value - total_project_cost, equity_contribution)
}

/// Months of profit needed to cover the project cost.
///
/// A project that never makes a profit reports the full construction period.
pub fn break_even_months(
    completion_value: Money,
    total_project_cost: Money,
    construction_period_months: u32,
) -> Decimal {
    let months = Decimal::from(construction_period_months);
    let profit = completion_value - total_project_cost;
    if profit <= Decimal::ZERO || months.is_zero() {
        return months;
    }
    // cost / (profit / months)
    total_project_cost * months / profit
}

/// Interest not covered by the reserve set aside for it.
pub fn interest_reserve_needed(total_interest: Money, interest_reserve_provided: Money) -> Money {
    (total_interest - interest_reserve_provided).max(Decimal::ZERO)
}

fn percent_of(numerator: Decimal, denominator: Decimal) -> Percent {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator / denominator * dec!(100)
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Compute every feasibility figure for one scenario.
pub fn compute_ratios(
    stack: &CapitalStack,
    exit: &ExitAssumptions,
    construction_period_months: u32,
    total_interest: Money,
) -> FeasibilityRatios {
    let cost = stack.total_project_cost;
    let value = exit.projected_completion_value;

    FeasibilityRatios {
        loan_to_cost_ratio: loan_to_cost_ratio(stack.loan_amount, cost),
        loan_to_value_ratio: loan_to_value_ratio(stack.loan_amount, value),
        profit_margin: profit_margin(value, cost),
        roi: return_on_equity(value, cost, stack.equity_contribution),
        break_even_months: break_even_months(value, cost, construction_period_months),
        funding_gap: stack.funding_gap(),
        equity_required: stack.equity_required(),
        interest_reserve_needed: interest_reserve_needed(
            total_interest,
            exit.interest_reserve_provided,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_to_cost() {
        assert_eq!(loan_to_cost_ratio(dec!(2_000_000), dec!(2_500_000)), dec!(80));
        assert_eq!(loan_to_cost_ratio(dec!(2_000_000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_loan_to_value() {
        assert_eq!(loan_to_value_ratio(dec!(2_000_000), dec!(3_200_000)), dec!(62.5));
        let ltv = loan_to_value_ratio(dec!(100_000_000), dec!(180_000_000));
        assert_eq!(ltv.round_dp(1), dec!(55.6));
    }

    #[test]
    fn test_profit_margin_and_roi() {
        assert_eq!(profit_margin(dec!(3_200_000), dec!(2_500_000)), dec!(28));
        assert_eq!(
            return_on_equity(dec!(3_200_000), dec!(2_500_000), dec!(500_000)),
            dec!(140)
        );
    }

    #[test]
    fn test_roi_without_equity_is_zero() {
        assert_eq!(
            return_on_equity(dec!(3_200_000), dec!(2_500_000), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_negative_margin() {
        assert_eq!(profit_margin(dec!(2_000_000), dec!(2_500_000)), dec!(-20));
    }

    #[test]
    fn test_break_even_profitable_project() {
        // 2.5M / (700k / 12) = 42.857...
        let months = break_even_months(dec!(3_200_000), dec!(2_500_000), 12);
        assert_eq!(months.round_dp(3), dec!(42.857));
    }

    #[test]
    fn test_break_even_unprofitable_is_full_period() {
        assert_eq!(break_even_months(dec!(2_500_000), dec!(2_500_000), 12), dec!(12));
        assert_eq!(break_even_months(dec!(2_000_000), dec!(2_500_000), 18), dec!(18));
    }

    #[test]
    fn test_interest_reserve_needed_floors_at_zero() {
        assert_eq!(interest_reserve_needed(dec!(90_000), dec!(150_000)), Decimal::ZERO);
        assert_eq!(interest_reserve_needed(dec!(90_000), dec!(40_000)), dec!(50_000));
        assert_eq!(interest_reserve_needed(dec!(90_000), Decimal::ZERO), dec!(90_000));
    }

    #[test]
    fn test_compute_ratios_bundle() {
        let stack = CapitalStack {
            loan_amount: dec!(2_000_000),
            equity_contribution: dec!(500_000),
            total_project_cost: dec!(2_500_000),
        };
        let exit = ExitAssumptions {
            projected_completion_value: dec!(3_200_000),
            interest_reserve_provided: dec!(150_000),
        };
        let r = compute_ratios(&stack, &exit, 12, dec!(92_083));
        assert_eq!(r.loan_to_cost_ratio, dec!(80));
        assert_eq!(r.loan_to_value_ratio, dec!(62.5));
        assert_eq!(r.profit_margin, dec!(28));
        assert_eq!(r.roi, dec!(140));
        assert_eq!(r.funding_gap, Decimal::ZERO);
        assert_eq!(r.equity_required, dec!(500_000));
        assert_eq!(r.interest_reserve_needed, Decimal::ZERO);
    }
}
