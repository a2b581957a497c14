use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Interest accrued over a draw sequence. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestAccrual {
    /// Interest charged in each draw period
    pub per_period: Vec<Money>,
    /// Sum of `per_period`
    pub total: Money,
}

impl InterestAccrual {
    /// Running total of interest, one entry per period.
    pub fn cumulative(&self) -> Vec<Money> {
        let mut running = Decimal::ZERO;
        self.per_period
            .iter()
            .map(|interest| {
                running += *interest;
                running
            })
            .collect()
    }
}

/// One month of interest on `balance` at an annual percentage rate.
pub fn period_interest(balance: Money, annual_rate_percent: Percent) -> Money {
    // rate / 100 / 12 folded into a single division
    balance * annual_rate_percent / dec!(1200)
}

/// Accrue monthly interest on the running drawn balance.
///
/// Period `i` is charged on the sum of draws `0..=i`; undrawn commitment
/// accrues nothing.
pub fn accrue_interest(draws: &[Money], annual_rate_percent: Percent) -> InterestAccrual {
    let mut balance = Decimal::ZERO;
    let per_period: Vec<Money> = draws
        .iter()
        .map(|draw| {
            balance += *draw;
            period_interest(balance, annual_rate_percent)
        })
        .collect();
    let total = per_period.iter().sum();
    InterestAccrual { per_period, total }
}
