pub mod stages;

use chrono::{DateTime, Utc};

use crate::config::ContractConfig;
use crate::rent::{Rent, Settlement};

/// everything a stage may read while building one rent
#[derive(Debug, Clone, Copy)]
pub struct RentInput<'a> {
    pub config: &'a ContractConfig,
    pub rent_date: DateTime<Utc>,
    pub previous: Option<&'a Rent>,
    pub settlement: Option<&'a Settlement>,
}

/// one pure step of the rent computation
pub type Stage = fn(&RentInput<'_>, Rent) -> Rent;

/// stages in execution order; later stages read line items of earlier ones
pub const STAGES: [Stage; 7] = [
    stages::base,
    stages::debts,
    stages::discounts,
    stages::vat,
    stages::balance,
    stages::payments,
    stages::total,
];

/// compute the rent of the term starting at `rent_date`
///
/// `previous` is the rent of the preceding term, its unpaid amount is carried
/// into this one. `settlement` holds what was recorded against this term.
pub fn compute_rent(
    config: &ContractConfig,
    rent_date: DateTime<Utc>,
    previous: Option<&Rent>,
    settlement: Option<&Settlement>,
) -> Rent {
    let input = RentInput {
        config,
        rent_date,
        previous,
        settlement,
    };

    STAGES
        .iter()
        .fold(Rent::default(), |rent, stage| stage(&input, rent))
}
