use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// One-time closing costs of the loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingFees {
    /// Origination fee as a percent of the loan amount
    pub origination_fee_percent: Percent,
    pub appraisal_fee: Money,
    pub legal_fee: Money,
    pub title_fee: Money,
    pub inspection_fee: Money,
}

impl FinancingFees {
    pub fn origination_fee(&self, loan_amount: Money) -> Money {
        loan_amount * self.origination_fee_percent / dec!(100)
    }

    pub fn fixed_fees(&self) -> Money {
        self.appraisal_fee + self.legal_fee + self.title_fee + self.inspection_fee
    }
}

/// Total closing costs: origination plus every fixed fee.
pub fn aggregate_fees(loan_amount: Money, fees: &FinancingFees) -> Money {
    fees.origination_fee(loan_amount) + fees.fixed_fees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_standard_fee_stack() {
        let fees = FinancingFees {
            origination_fee_percent: dec!(1.5),
            appraisal_fee: dec!(3_000),
            legal_fee: dec!(8_000),
            title_fee: dec!(5_000),
            inspection_fee: dec!(6_000),
        };
        assert_eq!(fees.origination_fee(dec!(2_000_000)), dec!(30_000));
        assert_eq!(fees.fixed_fees(), dec!(22_000));
        assert_eq!(aggregate_fees(dec!(2_000_000), &fees), dec!(52_000));
    }

    #[test]
    fn test_no_fees() {
        let fees = FinancingFees {
            origination_fee_percent: Decimal::ZERO,
            appraisal_fee: Decimal::ZERO,
            legal_fee: Decimal::ZERO,
            title_fee: Decimal::ZERO,
            inspection_fee: Decimal::ZERO,
        };
        assert_eq!(aggregate_fees(dec!(5_000_000), &fees), Decimal::ZERO);
    }
}
