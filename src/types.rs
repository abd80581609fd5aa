use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

/// unique identifier for a contract
pub type ContractId = Uuid;

/// unique identifier for a rented unit
pub type PropertyId = Uuid;

/// billing period unit of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "hours", alias = "hourly")]
    Hourly,
    #[serde(rename = "days", alias = "daily")]
    Daily,
    #[serde(rename = "weeks", alias = "weekly")]
    Weekly,
    #[serde(rename = "months", alias = "monthly")]
    Monthly,
    #[serde(rename = "years", alias = "yearly")]
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Hourly,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hours",
            Frequency::Daily => "days",
            Frequency::Weekly => "weeks",
            Frequency::Monthly => "months",
            Frequency::Yearly => "years",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hours" | "hourly" => Ok(Frequency::Hourly),
            "days" | "daily" => Ok(Frequency::Daily),
            "weeks" | "weekly" => Ok(Frequency::Weekly),
            "months" | "monthly" => Ok(Frequency::Monthly),
            "years" | "yearly" => Ok(Frequency::Yearly),
            _ => Err(LedgerError::InvalidFrequency {
                value: s.to_string(),
            }),
        }
    }
}

/// where a discount or VAT line item comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// derived from the contract definition on every recomputation
    Contract,
    /// recorded by a settlement against one term
    Settlement,
}

/// contract status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    /// schedule generated up to the contract end
    Active,
    /// schedule capped at the termination date
    Terminated,
}

/// payment status of a single rent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    PartiallyPaid,
    NotPaid,
}
