//! Construction loan financing engine.
//!
//! Pipeline, leaf first: [`disbursement`] produces the draw amounts,
//! [`accrual`] charges interest on the cumulative drawn balance, [`fees`]
//! and [`ratios`] derive the feasibility figures, [`risk`] grades them and
//! [`schedule`] lays everything out per period. [`calculator`] wires the
//! stages together; [`validation`] guards its inputs.

pub mod accrual;
pub mod calculator;
pub mod disbursement;
pub mod fees;
pub mod ratios;
pub mod risk;
pub mod schedule;
pub mod terms;
pub mod validation;

pub use calculator::{
    calculate, calculate_construction_loan, ConstructionLoanInput, ConstructionLoanOutput,
};
pub use disbursement::{DisbursementModel, DisbursementPolicy};
pub use risk::{RiskAssessment, RiskFinding, RiskLevel, RiskType};
pub use schedule::{generate_draw_schedule, CashFlowPeriod, DrawRecord, DrawScheduleRequest};
pub use validation::{validate_draft, validate_input, LoanInputDraft, ValidationReport};
