//! Derivation and reconciliation core behind the loan contract form.
//!
//! The form runtime owns rendering and transport; this crate owns the parts with
//! real rules: identifier parsing, written amount labels, repayment schedules,
//! maturity dates and the spouse/joint-borrower synchronization.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
