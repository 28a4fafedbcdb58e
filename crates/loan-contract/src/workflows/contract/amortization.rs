//! Repayment trial calculation for the four supported methods.
//!
//! Arithmetic runs on unrounded decimals. Every figure handed back to callers
//! is rounded to cents, half away from zero.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PERCENT: Decimal = Decimal::ONE_HUNDRED;
const MONTHS_PER_YEAR: u32 = 12;
const ZERO_RATE_DESCRIPTION: &str = "无利息";

/// Longest accepted term, thirty years.
pub const MAX_TERM_MONTHS: u32 = 360;
/// Principals from here on cannot be written out as a currency label.
pub const MAX_PRINCIPAL: Decimal = Decimal::from_parts(1_874_919_424, 2_328_306, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMethod {
    /// Level payment, 等额本息.
    #[serde(alias = "equal_principal_interest")]
    EqualInstallment,
    /// Declining payment, 等额本金.
    EqualPrincipal,
    InterestOnly,
    /// One-time settlement at maturity, 利随本清.
    #[serde(alias = "one_time")]
    Bullet,
}

impl RepaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EqualInstallment => "等额本息",
            Self::EqualPrincipal => "等额本金",
            Self::InterestOnly => "按月付息，到期还本",
            Self::Bullet => "利随本清",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::EqualInstallment => "每月还款金额固定",
            Self::EqualPrincipal => "首月还得最多，之后逐月递减",
            Self::InterestOnly => "每月只还利息，最后一期还本金+当月利息",
            Self::Bullet => "到期一次性还本付息",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmortizationError {
    #[error("principal must be greater than zero, got {0}")]
    NonPositivePrincipal(Decimal),
    #[error("principal {0} exceeds the supported range")]
    PrincipalTooLarge(Decimal),
    #[error("term must be at least one month")]
    ZeroTerm,
    #[error("term of {0} months exceeds the {MAX_TERM_MONTHS} month limit")]
    TermTooLong(u32),
    #[error("annual rate must not be negative, got {0}")]
    NegativeRate(Decimal),
    #[error("calculation overflowed for the given inputs")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRequest {
    pub principal: Decimal,
    pub term_months: u32,
    pub annual_rate_percent: Decimal,
    pub method: RepaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmortizationSummary {
    pub method: RepaymentMethod,
    /// Regular payment; the first payment for declining schedules.
    pub monthly_payment: Decimal,
    pub first_payment: Decimal,
    pub last_payment: Decimal,
    pub per_period_decrement: Option<Decimal>,
    pub total_interest: Decimal,
    pub total_repayment: Decimal,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installment {
    pub period: u32,
    pub payment: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    pub remaining: Decimal,
}

impl AmortizationRequest {
    pub fn monthly_rate(&self) -> Decimal {
        self.annual_rate_percent / PERCENT / Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn summarize(&self) -> Result<AmortizationSummary, AmortizationError> {
        self.validate()?;

        let principal = self.principal;
        let term = Decimal::from(self.term_months);
        let rate = self.monthly_rate();

        if rate.is_zero() {
            let level = div(principal, term)?;
            return Ok(AmortizationSummary {
                method: self.method,
                monthly_payment: cents(level),
                first_payment: cents(level),
                last_payment: cents(level),
                per_period_decrement: None,
                total_interest: Decimal::ZERO,
                total_repayment: cents(principal),
                description: ZERO_RATE_DESCRIPTION,
            });
        }

        let summary = match self.method {
            RepaymentMethod::EqualInstallment => {
                let level = self.level_payment(rate)?;
                let total = mul(level, term)?;
                AmortizationSummary {
                    method: self.method,
                    monthly_payment: cents(level),
                    first_payment: cents(level),
                    last_payment: cents(level),
                    per_period_decrement: None,
                    total_interest: cents(sub(total, principal)?),
                    total_repayment: cents(total),
                    description: self.method.description(),
                }
            }
            RepaymentMethod::EqualPrincipal => {
                let slice = div(principal, term)?;
                let first = add(slice, mul(principal, rate)?)?;
                let interest = mul(mul(add(term, Decimal::ONE)?, principal)?, rate)?;
                let interest = div(interest, Decimal::TWO)?;
                AmortizationSummary {
                    method: self.method,
                    monthly_payment: cents(first),
                    first_payment: cents(first),
                    last_payment: cents(mul(slice, add(Decimal::ONE, rate)?)?),
                    per_period_decrement: Some(cents(mul(slice, rate)?)),
                    total_interest: cents(interest),
                    total_repayment: cents(add(principal, interest)?),
                    description: self.method.description(),
                }
            }
            RepaymentMethod::InterestOnly => {
                let periodic = mul(principal, rate)?;
                let interest = mul(periodic, term)?;
                AmortizationSummary {
                    method: self.method,
                    monthly_payment: cents(periodic),
                    first_payment: cents(periodic),
                    last_payment: cents(add(periodic, principal)?),
                    per_period_decrement: None,
                    total_interest: cents(interest),
                    total_repayment: cents(add(principal, interest)?),
                    description: self.method.description(),
                }
            }
            RepaymentMethod::Bullet => {
                let interest = mul(mul(principal, rate)?, term)?;
                let settlement = cents(add(principal, interest)?);
                AmortizationSummary {
                    method: self.method,
                    monthly_payment: Decimal::ZERO,
                    first_payment: if self.term_months == 1 {
                        settlement
                    } else {
                        Decimal::ZERO
                    },
                    last_payment: settlement,
                    per_period_decrement: None,
                    total_interest: cents(interest),
                    total_repayment: settlement,
                    description: self.method.description(),
                }
            }
        };

        Ok(summary)
    }

    /// Period-by-period breakdown matching [`summarize`](Self::summarize).
    pub fn schedule(&self) -> Result<Vec<Installment>, AmortizationError> {
        self.validate()?;

        let principal = self.principal;
        let term = Decimal::from(self.term_months);
        let rate = self.monthly_rate();
        let slice = div(principal, term)?;
        let level = if rate.is_zero() {
            slice
        } else {
            match self.method {
                RepaymentMethod::EqualInstallment => self.level_payment(rate)?,
                _ => Decimal::ZERO,
            }
        };

        let mut remaining = principal;
        let mut rows = Vec::with_capacity(self.term_months as usize);
        for period in 1..=self.term_months {
            let last = period == self.term_months;
            let (payment, principal_part, interest) = if rate.is_zero() {
                (level, if last { remaining } else { level }, Decimal::ZERO)
            } else {
                match self.method {
                    RepaymentMethod::EqualInstallment => {
                        let interest = mul(remaining, rate)?;
                        let principal_part = if last {
                            remaining
                        } else {
                            sub(level, interest)?
                        };
                        (level, principal_part, interest)
                    }
                    RepaymentMethod::EqualPrincipal => {
                        let interest = mul(remaining, rate)?;
                        let principal_part = if last { remaining } else { slice };
                        (add(principal_part, interest)?, principal_part, interest)
                    }
                    RepaymentMethod::InterestOnly => {
                        let interest = mul(principal, rate)?;
                        if last {
                            (add(interest, principal)?, principal, interest)
                        } else {
                            (interest, Decimal::ZERO, interest)
                        }
                    }
                    RepaymentMethod::Bullet => {
                        if last {
                            let interest = mul(mul(principal, rate)?, term)?;
                            (add(principal, interest)?, principal, interest)
                        } else {
                            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
                        }
                    }
                }
            };

            remaining = if last {
                Decimal::ZERO
            } else {
                sub(remaining, principal_part)?
            };
            rows.push(Installment {
                period,
                payment: cents(payment),
                principal: cents(principal_part),
                interest: cents(interest),
                remaining: cents(remaining),
            });
        }

        Ok(rows)
    }

    fn validate(&self) -> Result<(), AmortizationError> {
        if self.principal <= Decimal::ZERO {
            return Err(AmortizationError::NonPositivePrincipal(self.principal));
        }
        if self.principal >= MAX_PRINCIPAL {
            return Err(AmortizationError::PrincipalTooLarge(self.principal));
        }
        if self.term_months == 0 {
            return Err(AmortizationError::ZeroTerm);
        }
        if self.term_months > MAX_TERM_MONTHS {
            return Err(AmortizationError::TermTooLong(self.term_months));
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(AmortizationError::NegativeRate(self.annual_rate_percent));
        }
        Ok(())
    }

    fn level_payment(&self, rate: Decimal) -> Result<Decimal, AmortizationError> {
        let growth = add(Decimal::ONE, rate)?
            .checked_powi(i64::from(self.term_months))
            .ok_or(AmortizationError::Overflow)?;
        let numerator = mul(mul(self.principal, rate)?, growth)?;
        div(numerator, sub(growth, Decimal::ONE)?)
    }
}

fn add(left: Decimal, right: Decimal) -> Result<Decimal, AmortizationError> {
    left.checked_add(right).ok_or(AmortizationError::Overflow)
}

fn sub(left: Decimal, right: Decimal) -> Result<Decimal, AmortizationError> {
    left.checked_sub(right).ok_or(AmortizationError::Overflow)
}

fn mul(left: Decimal, right: Decimal) -> Result<Decimal, AmortizationError> {
    left.checked_mul(right).ok_or(AmortizationError::Overflow)
}

fn div(left: Decimal, right: Decimal) -> Result<Decimal, AmortizationError> {
    left.checked_div(right).ok_or(AmortizationError::Overflow)
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
