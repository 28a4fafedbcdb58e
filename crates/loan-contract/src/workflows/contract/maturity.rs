use chrono::{Months, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaturityError {
    #[error("term must be at least one month")]
    ZeroTerm,
    #[error("maturity for {start} plus {months} months is outside the calendar range")]
    OutOfRange { start: NaiveDate, months: u32 },
}

/// Last day of a loan that starts on `start` and runs `term_months` months.
///
/// Adding months clamps to the end of shorter months (Jan 31 + 1 month is the
/// last day of February), then one day is subtracted.
pub fn maturity_date(start: NaiveDate, term_months: u32) -> Result<NaiveDate, MaturityError> {
    if term_months == 0 {
        return Err(MaturityError::ZeroTerm);
    }

    start
        .checked_add_months(Months::new(term_months))
        .and_then(|date| date.pred_opt())
        .ok_or(MaturityError::OutOfRange {
            start,
            months: term_months,
        })
}

/// Chinese long-form date used in generated documents.
pub fn format_long(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}
