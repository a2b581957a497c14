use chrono::NaiveDate;
use clap::Args;
use log::debug;
use rust_decimal::Decimal;
use serde_json::Value;

use construction_loan_core::construction_loan::{
    calculate_construction_loan, generate_draw_schedule, validate_draft, DisbursementPolicy,
    DrawScheduleRequest, LoanInputDraft,
};

use crate::input;

/// Arguments for a full feasibility run
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to JSON input file (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for input validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON input file (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a standalone draw schedule
#[derive(Args)]
pub struct DrawsArgs {
    /// Path to JSON draw-schedule request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Committed loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Construction period in months
    #[arg(long)]
    pub months: Option<u32>,

    /// Disbursement policy: monthly, bi-monthly, quarterly or milestone
    #[arg(long, default_value = "monthly")]
    pub policy: DisbursementPolicy,

    /// Date of the first draw (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Milestone tranche weights, comma separated (e.g. 0.4,0.35,0.25)
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<Decimal>>,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let draft: LoanInputDraft = input::read_input(args.input.as_deref())?;
    let loan_input = draft.into_input()?;
    debug!(
        "calculating {:?} loan of {}",
        loan_input.project_type, loan_input.loan_amount
    );
    let result = calculate_construction_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let draft: LoanInputDraft = input::read_input(args.input.as_deref())?;
    let report = validate_draft(&draft);
    debug!("validation found {} issue(s)", report.errors.len());
    Ok(serde_json::to_value(report)?)
}

pub fn run_draws(args: DrawsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: DrawScheduleRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        DrawScheduleRequest {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            construction_period_months: args
                .months
                .ok_or("--months is required (or provide --input)")?,
            disbursement_policy: args.policy,
            start_date: args
                .start_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            milestone_weights: args.weights,
        }
    };

    let result = generate_draw_schedule(&request)?;
    Ok(serde_json::to_value(result)?)
}
