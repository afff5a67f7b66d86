use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::LoanId;

#[derive(Error, Debug)]
pub enum EmiError {
    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidRate {
        rate: Rate,
    },

    #[error("invalid term: {months} months")]
    InvalidTerm {
        months: u32,
    },

    #[error("loan already completed: {loan_id}")]
    AlreadyCompleted {
        loan_id: LoanId,
    },

    #[error("loan is defaulted: {loan_id}")]
    LoanDefaulted {
        loan_id: LoanId,
    },

    #[error("loan not found: {loan_id}")]
    LoanNotFound {
        loan_id: LoanId,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization failed: {message}")]
    SerializationFailed {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EmiError>;
