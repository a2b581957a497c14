use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoanError;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How the committed loan is released to the borrower during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisbursementPolicy {
    /// One equal draw per month
    Monthly,
    /// Two equal draws per month
    BiMonthly,
    /// One equal draw per started quarter
    Quarterly,
    /// Front-loaded weighted tranches tied to construction progress
    Milestone,
}

impl DisbursementPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementPolicy::Monthly => "monthly",
            DisbursementPolicy::BiMonthly => "bi-monthly",
            DisbursementPolicy::Quarterly => "quarterly",
            DisbursementPolicy::Milestone => "milestone",
        }
    }
}

impl fmt::Display for DisbursementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisbursementPolicy {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(DisbursementPolicy::Monthly),
            "bi-monthly" | "bimonthly" => Ok(DisbursementPolicy::BiMonthly),
            "quarterly" => Ok(DisbursementPolicy::Quarterly),
            "milestone" => Ok(DisbursementPolicy::Milestone),
            other => Err(LoanError::InvalidInput {
                field: "disbursement_policy".into(),
                reason: format!(
                    "unknown policy '{other}' (expected monthly, bi-monthly, quarterly or milestone)"
                ),
            }),
        }
    }
}

/// Default milestone tranches: 30% / 25% / 25% / 20% of the loan.
pub fn default_milestone_weights() -> Vec<Decimal> {
    vec![dec!(0.30), dec!(0.25), dec!(0.25), dec!(0.20)]
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Turns a loan commitment into an ordered list of draw amounts.
///
/// Amounts are left unrounded; rounding happens once, when the schedule is
/// reported. The milestone weights are injected so alternative tranche
/// structures can be modelled without touching the draw logic.
#[derive(Debug, Clone, PartialEq)]
pub struct DisbursementModel {
    milestone_weights: Vec<Decimal>,
}

impl Default for DisbursementModel {
    fn default() -> Self {
        Self::new(default_milestone_weights())
    }
}

impl DisbursementModel {
    pub fn new(milestone_weights: Vec<Decimal>) -> Self {
        Self { milestone_weights }
    }

    pub fn milestone_weights(&self) -> &[Decimal] {
        &self.milestone_weights
    }

    /// Generate the draw amounts for `months` of construction.
    ///
    /// Returns an empty vector when `months` is zero.
    pub fn generate_draws(
        &self,
        loan_amount: Money,
        months: u32,
        policy: DisbursementPolicy,
    ) -> Vec<Money> {
        if months == 0 {
            return Vec::new();
        }
        match policy {
            DisbursementPolicy::Monthly => even_draws(loan_amount, months),
            DisbursementPolicy::BiMonthly => even_draws(loan_amount, months * 2),
            DisbursementPolicy::Quarterly => even_draws(loan_amount, months.div_ceil(3)),
            DisbursementPolicy::Milestone => self.milestone_draws(loan_amount, months),
        }
    }

    fn milestone_draws(&self, loan_amount: Money, months: u32) -> Vec<Money> {
        if self.milestone_weights.is_empty() {
            return even_draws(loan_amount, months);
        }
        let periods = tranche_periods(months, self.milestone_weights.len() as u32);
        let mut draws = Vec::with_capacity(periods.iter().sum::<u32>() as usize);
        for (weight, count) in self.milestone_weights.iter().zip(periods) {
            draws.extend(even_draws(loan_amount * *weight, count));
        }
        draws
    }
}

/// Draws under the default milestone weights.
pub fn generate_draws(loan_amount: Money, months: u32, policy: DisbursementPolicy) -> Vec<Money> {
    DisbursementModel::default().generate_draws(loan_amount, months, policy)
}

/// Split `months` across `tranches`. The remainder goes to the earliest
/// tranches and every tranche gets at least one period.
fn tranche_periods(months: u32, tranches: u32) -> Vec<u32> {
    let base = months / tranches;
    let remainder = months % tranches;
    (0..tranches)
        .map(|k| (base + u32::from(k < remainder)).max(1))
        .collect()
}

fn even_draws(amount: Money, count: u32) -> Vec<Money> {
    if count == 0 {
        return Vec::new();
    }
    vec![amount / Decimal::from(count); count as usize]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn total(draws: &[Money]) -> Money {
        draws.iter().sum()
    }

    fn assert_sums_to(draws: &[Money], expected: Money) {
        let diff = (total(draws) - expected).abs();
        assert!(diff < dec!(0.000001), "draws sum to {}, expected {expected}", total(draws));
    }

    #[test]
    fn test_monthly_even_draws() {
        let draws = generate_draws(dec!(2_000_000), 12, DisbursementPolicy::Monthly);
        assert_eq!(draws.len(), 12);
        assert_eq!(draws[0].round_dp(0), dec!(166_667));
        assert!(draws.windows(2).all(|w| w[0] == w[1]));
        assert_sums_to(&draws, dec!(2_000_000));
    }

    #[test]
    fn test_bi_monthly_doubles_draw_count() {
        let draws = generate_draws(dec!(8_000_000), 18, DisbursementPolicy::BiMonthly);
        assert_eq!(draws.len(), 36);
        assert_sums_to(&draws, dec!(8_000_000));
    }

    #[test]
    fn test_quarterly_rounds_quarters_up() {
        assert_eq!(generate_draws(dec!(1_200_000), 12, DisbursementPolicy::Quarterly).len(), 4);
        assert_eq!(generate_draws(dec!(1_200_000), 10, DisbursementPolicy::Quarterly).len(), 4);
        assert_eq!(generate_draws(dec!(1_200_000), 24, DisbursementPolicy::Quarterly).len(), 8);
        let draws = generate_draws(dec!(1_200_000), 10, DisbursementPolicy::Quarterly);
        assert_eq!(draws[0], dec!(300_000));
    }

    #[test]
    fn test_milestone_tranches_divisible_months() {
        let draws = generate_draws(dec!(1_200_000), 12, DisbursementPolicy::Milestone);
        assert_eq!(draws.len(), 12);
        // 30% over 3 periods, 25% over 3, 25% over 3, 20% over 3
        assert_eq!(draws[0], dec!(120_000));
        assert_eq!(draws[3], dec!(100_000));
        assert_eq!(draws[6], dec!(100_000));
        assert_eq!(draws[9], dec!(80_000));
        assert_sums_to(&draws, dec!(1_200_000));
    }

    #[test]
    fn test_milestone_remainder_goes_to_early_tranches() {
        assert_eq!(tranche_periods(10, 4), vec![3, 3, 2, 2]);
        assert_eq!(tranche_periods(13, 4), vec![4, 3, 3, 3]);
        let draws = generate_draws(dec!(1_000_000), 10, DisbursementPolicy::Milestone);
        assert_eq!(draws.len(), 10);
        assert_eq!(draws[0], dec!(100_000));
        assert_eq!(draws[9], dec!(100_000));
        assert_sums_to(&draws, dec!(1_000_000));
    }

    #[test]
    fn test_milestone_short_period_keeps_every_tranche() {
        assert_eq!(tranche_periods(3, 4), vec![1, 1, 1, 1]);
        let draws = generate_draws(dec!(1_000_000), 3, DisbursementPolicy::Milestone);
        assert_eq!(
            draws,
            vec![dec!(300_000), dec!(250_000), dec!(250_000), dec!(200_000)]
        );
    }

    #[test]
    fn test_milestone_custom_weights() {
        let model = DisbursementModel::new(vec![dec!(0.5), dec!(0.5)]);
        let draws = model.generate_draws(dec!(1_000_000), 4, DisbursementPolicy::Milestone);
        assert_eq!(draws, vec![dec!(250_000); 4]);
        assert_eq!(model.milestone_weights().len(), 2);
    }

    #[test]
    fn test_milestone_without_weights_falls_back_to_even() {
        let model = DisbursementModel::new(Vec::new());
        let draws = model.generate_draws(dec!(600_000), 6, DisbursementPolicy::Milestone);
        assert_eq!(draws, vec![dec!(100_000); 6]);
    }

    #[test]
    fn test_zero_months_yields_no_draws() {
        for policy in [
            DisbursementPolicy::Monthly,
            DisbursementPolicy::BiMonthly,
            DisbursementPolicy::Quarterly,
            DisbursementPolicy::Milestone,
        ] {
            assert!(generate_draws(dec!(1_000_000), 0, policy).is_empty());
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Bi-Monthly".parse::<DisbursementPolicy>().unwrap(), DisbursementPolicy::BiMonthly);
        assert_eq!(" milestone ".parse::<DisbursementPolicy>().unwrap(), DisbursementPolicy::Milestone);
        let err = "weekly".parse::<DisbursementPolicy>().unwrap_err();
        assert!(err.to_string().contains("weekly"));
    }

    #[test]
    fn test_policy_wire_format() {
        let json = serde_json::to_string(&DisbursementPolicy::BiMonthly).unwrap();
        assert_eq!(json, "\"bi-monthly\"");
        assert_eq!(DisbursementPolicy::BiMonthly.to_string(), "bi-monthly");
        assert!(serde_json::from_str::<DisbursementPolicy>("\"weekly\"").is_err());
    }
}
