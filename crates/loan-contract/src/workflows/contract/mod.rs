pub mod amortization;
pub mod amount;
pub mod domain;
pub mod identity;
pub mod maturity;
mod submission;
pub mod sync;

pub use amortization::{
    AmortizationError, AmortizationRequest, AmortizationSummary, Installment, RepaymentMethod,
};
pub use amount::AmountLabelError;
pub use domain::{ContractForm, Person, PersonList, PersonRef};
pub use maturity::MaturityError;
pub use submission::{file_prefix, prepare_submission, CollateralView, SubmissionContext};
pub use sync::{FieldWrite, FieldWriteView, FormDiff, Synchronizer};
