use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::TermKey;
use crate::decimal::Money;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("unsupported frequency {value:?}, should be one of: hours, days, weeks, months, years")]
    InvalidFrequency {
        value: String,
    },

    #[error("properties not defined or empty")]
    MissingProperties,

    #[error("invalid date range: {message}")]
    InvalidDateRange {
        message: String,
    },

    #[error("some payments would be lost because they are out of the contract time frame: {}", format_lost(.lost))]
    LostPayment {
        lost: Vec<LostPayment>,
    },

    #[error("cannot pay term, the rents were not generated")]
    NoSchedule,

    #[error("payment term {term} is out of the contract time frame")]
    OutOfRange {
        term: TermKey,
    },

    #[error("invalid term key: {value}")]
    InvalidTermKey {
        value: String,
    },

    #[error("invalid date: {value}")]
    InvalidDate {
        value: String,
    },
}

/// a paid rent that an update would have discarded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostPayment {
    pub term: TermKey,
    pub amounts: Vec<Money>,
}

impl fmt::Display for LostPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amounts = self
            .amounts
            .iter()
            .map(|amount| amount.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        write!(f, "{} {}", self.term, amounts)
    }
}

fn format_lost(lost: &[LostPayment]) -> String {
    lost.iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LedgerError>;
