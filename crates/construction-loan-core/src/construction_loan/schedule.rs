use chrono::{Months, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::accrual::period_interest;
use super::disbursement::{default_milestone_weights, DisbursementModel, DisbursementPolicy};
use crate::error::LoanError;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::LoanResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One disbursement, as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// 1-based position in the schedule
    pub sequence_number: u32,
    pub period_date: NaiveDate,
    pub amount: Money,
    pub cumulative_amount: Money,
}

/// One construction month, as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPeriod {
    /// 1-based construction month
    pub period_index: u32,
    pub draw_amount: Money,
    pub interest_payment: Money,
    pub cumulative_draws: Money,
    pub cumulative_interest: Money,
}

/// Standalone draw-schedule request, for previewing disbursements before a
/// full feasibility run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawScheduleRequest {
    pub loan_amount: Money,
    pub construction_period_months: u32,
    pub disbursement_policy: DisbursementPolicy,
    pub start_date: NaiveDate,
    /// Milestone tranche weights; the standard split when absent
    #[serde(default)]
    pub milestone_weights: Option<Vec<Decimal>>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Date each draw and accumulate the drawn total.
///
/// Draw `i` is dated `i` whole calendar months after `start_date`, whatever
/// the policy. Bi-monthly schedules therefore run past the construction
/// window; this mirrors how the schedule has always been reported.
///
/// Fails with [`LoanError::DateError`] when a draw date falls outside the
/// calendar chrono can represent.
pub fn build_draw_schedule(draws: &[Money], start_date: NaiveDate) -> LoanResult<Vec<DrawRecord>> {
    let mut cumulative = Decimal::ZERO;
    draws
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            cumulative += *amount;
            Ok(DrawRecord {
                sequence_number: i as u32 + 1,
                period_date: add_months(start_date, i as u32)?,
                amount: round_money(*amount),
                cumulative_amount: round_money(cumulative),
            })
        })
        .collect()
}

/// Month-by-month draws and interest over the construction period.
///
/// Month `i` carries draw `i` (zero once the draws run out) and interest on
/// every draw dated at or before it, matching [`build_draw_schedule`].
pub fn build_cash_flow(
    draws: &[Money],
    annual_rate_percent: Percent,
    construction_period_months: u32,
) -> Vec<CashFlowPeriod> {
    let mut cumulative_draws = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;

    (0..construction_period_months as usize)
        .map(|i| {
            let draw = draws.get(i).copied().unwrap_or(Decimal::ZERO);
            cumulative_draws += draw;
            let interest = period_interest(cumulative_draws, annual_rate_percent);
            cumulative_interest += interest;
            CashFlowPeriod {
                period_index: i as u32 + 1,
                draw_amount: round_money(draw),
                interest_payment: round_money(interest),
                cumulative_draws: round_money(cumulative_draws),
                cumulative_interest: round_money(cumulative_interest),
            }
        })
        .collect()
}

/// Generate and date the draws for a loan without running the full pipeline.
pub fn generate_draw_schedule(
    request: &DrawScheduleRequest,
) -> LoanResult<ComputationOutput<Vec<DrawRecord>>> {
    let start = Instant::now();

    if request.loan_amount <= Decimal::ZERO {
        return Err(LoanError::InvalidInput {
            field: "loan_amount".into(),
            reason: "must be positive".into(),
        });
    }
    if request.construction_period_months == 0 {
        return Err(LoanError::InvalidInput {
            field: "construction_period_months".into(),
            reason: "must be at least one month".into(),
        });
    }

    let weights = match &request.milestone_weights {
        Some(weights) => {
            check_weights(weights)?;
            weights.clone()
        }
        None => default_milestone_weights(),
    };

    let model = DisbursementModel::new(weights);
    let draws = model.generate_draws(
        request.loan_amount,
        request.construction_period_months,
        request.disbursement_policy,
    );
    let schedule = build_draw_schedule(&draws, request.start_date)?;
    debug!(
        "draw schedule: {} {} draws from {}",
        schedule.len(),
        request.disbursement_policy,
        request.start_date
    );

    let mut warnings = Vec::new();
    if schedule.len() as u32 > request.construction_period_months {
        if let Some(last) = schedule.last() {
            warnings.push(format!(
                "{} draws are dated one month apart; the last falls on {}, after the construction period",
                schedule.len(),
                last.period_date
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Construction Draw Schedule",
        &serde_json::json!({
            "loan_amount": request.loan_amount.to_string(),
            "construction_period_months": request.construction_period_months,
            "disbursement_policy": request.disbursement_policy.as_str(),
            "milestone_weights": model
                .milestone_weights()
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn check_weights(weights: &[Decimal]) -> LoanResult<()> {
    let reason = if weights.is_empty() {
        "at least one weight is required".to_string()
    } else if weights.iter().any(|w| w.is_sign_negative()) {
        "weights cannot be negative".to_string()
    } else {
        let sum: Decimal = weights.iter().sum();
        if (sum - Decimal::ONE).abs() <= dec!(0.0001) {
            return Ok(());
        }
        format!("weights must sum to 1 (got {sum})")
    };
    Err(LoanError::InvalidInput {
        field: "milestone_weights".into(),
        reason,
    })
}

fn add_months(date: NaiveDate, months: u32) -> LoanResult<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        LoanError::DateError(format!("{date} plus {months} month(s) is out of range"))
    })
}
