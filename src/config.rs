use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{end_of_day, serde_date, start_of_day};
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::{Frequency, PropertyId};

/// contract definition, everything the rent schedule is derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    #[serde(alias = "begin", with = "serde_date")]
    pub start: DateTime<Utc>,
    #[serde(with = "serde_date")]
    pub end: DateTime<Utc>,
    #[serde(default, with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub termination: Option<DateTime<Utc>>,
    pub frequency: Frequency,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub vat_rate: Rate,
    #[serde(default)]
    pub properties: Vec<PropertyAssignment>,
}

/// rented unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
}

/// one rented unit's contribution to the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAssignment {
    pub property: Property,
    #[serde(default)]
    pub rent: Money,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    /// open when unset
    #[serde(default, with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<DateTime<Utc>>,
    /// open when unset
    #[serde(default, with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<DateTime<Utc>>,
}

/// recurring expense billed with a unit's rent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub title: String,
    pub amount: Money,
    #[serde(default, with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub begin_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn new(title: impl Into<String>, amount: Money) -> Self {
        Self {
            title: title.into(),
            amount,
            begin_date: None,
            end_date: None,
        }
    }

    /// restrict the expense to a range of calendar days
    pub fn between(mut self, begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.begin_date = Some(begin);
        self.end_date = Some(end);
        self
    }

    /// whether the expense is billed for a term starting at `instant`
    pub fn applies_on(&self, instant: DateTime<Utc>) -> bool {
        let day = instant.date_naive();
        let after_begin = self.begin_date.map_or(true, |begin| begin.date_naive() <= day);
        let before_end = self.end_date.map_or(true, |end| day <= end.date_naive());
        after_begin && before_end
    }
}

impl PropertyAssignment {
    pub fn new(name: impl Into<String>, rent: Money) -> Self {
        Self {
            property: Property {
                id: Uuid::new_v4(),
                name: name.into(),
            },
            rent,
            expenses: Vec::new(),
            entry_date: None,
            exit_date: None,
        }
    }

    pub fn with_expense(mut self, title: impl Into<String>, amount: Money) -> Self {
        self.expenses.push(Expense::new(title, amount));
        self
    }

    pub fn with_expenses(mut self, expenses: Vec<Expense>) -> Self {
        self.expenses.extend(expenses);
        self
    }

    /// occupancy window, both days inclusive
    pub fn occupied(mut self, entry: DateTime<Utc>, exit: DateTime<Utc>) -> Self {
        self.entry_date = Some(entry);
        self.exit_date = Some(exit);
        self
    }

    /// whether the unit is billed for the term starting at `instant`
    ///
    /// Calendar frequencies compare at their granularity: a unit entering on
    /// the 15th is billed for that whole month on a monthly contract. Weekly
    /// terms are anchored on the contract start, so the occupancy window is
    /// matched against the term's own `[start, next start)` span instead.
    pub fn is_occupied_at(&self, frequency: Frequency, instant: DateTime<Utc>) -> bool {
        let entry = self.entry_date.map(start_of_day);
        let exit = self.exit_date.map(end_of_day);

        match frequency {
            Frequency::Weekly => {
                let next = frequency.advance(instant, 1);
                entry.map_or(true, |entry| entry < next) && exit.map_or(true, |exit| instant <= exit)
            }
            _ => {
                entry.map_or(true, |entry| frequency.is_same_or_before(entry, instant))
                    && exit.map_or(true, |exit| frequency.is_same_or_before(instant, exit))
            }
        }
    }
}

impl ContractConfig {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, frequency: Frequency) -> Self {
        Self {
            start,
            end,
            termination: None,
            frequency,
            discount: Money::ZERO,
            vat_rate: Rate::ZERO,
            properties: Vec::new(),
        }
    }

    /// three-year monthly lease without VAT
    pub fn residential_lease(start: DateTime<Utc>, properties: Vec<PropertyAssignment>) -> Self {
        Self {
            properties,
            ..Self::new(start, lease_end(start, 3), Frequency::Monthly)
        }
    }

    /// nine-year monthly lease with 20% VAT
    pub fn commercial_lease(start: DateTime<Utc>, properties: Vec<PropertyAssignment>) -> Self {
        Self {
            vat_rate: Rate::from_percentage(20),
            properties,
            ..Self::new(start, lease_end(start, 9), Frequency::Monthly)
        }
    }

    /// last instant of the schedule: termination if set, else end
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.termination.unwrap_or(self.end)
    }

    /// check the invariants every schedule generation relies on
    pub fn validate(&self) -> Result<()> {
        if self.properties.is_empty() {
            return Err(LedgerError::MissingProperties);
        }

        if let Some(termination) = self.termination {
            if termination < self.start || termination > self.end {
                return Err(LedgerError::InvalidDateRange {
                    message: format!(
                        "termination date {} is out of the contract time frame {} - {}",
                        termination, self.start, self.end
                    ),
                });
            }
        }

        if self.end <= self.start {
            return Err(LedgerError::InvalidDateRange {
                message: format!(
                    "contract end {} must be after its start {}",
                    self.end, self.start
                ),
            });
        }

        Ok(())
    }
}

fn lease_end(start: DateTime<Utc>, years: u32) -> DateTime<Utc> {
    Frequency::Yearly.advance(start, years) - Duration::minutes(1)
}

/// partial update of a contract definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractChanges {
    #[serde(default, alias = "begin", with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_date::option", skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// `Some(None)` clears the termination
    #[serde(default, with = "serde_date::nullable", skip_serializing_if = "Option::is_none")]
    pub termination: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<PropertyAssignment>>,
}

impl ContractChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn termination(mut self, termination: DateTime<Utc>) -> Self {
        self.termination = Some(Some(termination));
        self
    }

    /// lift the termination, the schedule runs to `end` again
    pub fn clear_termination(mut self) -> Self {
        self.termination = Some(None);
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn discount(mut self, discount: Money) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn vat_rate(mut self, vat_rate: Rate) -> Self {
        self.vat_rate = Some(vat_rate);
        self
    }

    pub fn properties(mut self, properties: Vec<PropertyAssignment>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// merged copy of `config`, fields set here win
    pub fn apply_to(&self, config: &ContractConfig) -> ContractConfig {
        let mut merged = config.clone();
        if let Some(start) = self.start {
            merged.start = start;
        }
        if let Some(end) = self.end {
            merged.end = end;
        }
        if let Some(termination) = self.termination {
            merged.termination = termination;
        }
        if let Some(frequency) = self.frequency {
            merged.frequency = frequency;
        }
        if let Some(discount) = self.discount {
            merged.discount = discount;
        }
        if let Some(vat_rate) = self.vat_rate {
            merged.vat_rate = vat_rate;
        }
        if let Some(properties) = &self.properties {
            merged.properties = properties.clone();
        }
        merged
    }
}
