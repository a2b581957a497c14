pub mod construction_loan;
