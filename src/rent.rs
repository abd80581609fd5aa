use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::TermKey;
use crate::decimal::{Money, Rate};
use crate::types::Origin;

/// plain amount with a label (rent, charge or debt)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    pub amount: Money,
}

impl LineItem {
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub origin: Origin,
    #[serde(default)]
    pub description: String,
    pub amount: Money,
}

impl Discount {
    pub fn settlement(description: impl Into<String>, amount: Money) -> Self {
        Self {
            origin: Origin::Settlement,
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vat {
    pub origin: Origin,
    pub description: String,
    pub rate: Rate,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub amount: Money,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub description: String,
}

impl Payment {
    pub fn new(amount: Money) -> Self {
        Self {
            date: None,
            amount,
            kind: String::new(),
            reference: String::new(),
            description: String::new(),
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }
}

/// aggregated amounts of one rent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentTotal {
    /// unpaid amount carried from the previous rent
    pub balance: Money,
    pub pre_tax_amount: Money,
    pub charges: Money,
    pub debts: Money,
    pub discount: Money,
    pub vat: Money,
    pub grand_total: Money,
    /// sum of the payments recorded on this rent
    pub payment: Money,
}

/// one billing term of a contract
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rent {
    pub term: TermKey,
    pub month: u32,
    pub year: i32,
    pub pre_tax_amounts: Vec<LineItem>,
    pub charges: Vec<LineItem>,
    pub discounts: Vec<Discount>,
    pub debts: Vec<LineItem>,
    pub vats: Vec<Vat>,
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub description: String,
    pub total: RentTotal,
}

impl Rent {
    /// whether anything was recorded against this rent
    ///
    /// A paid rent must survive every regeneration of the schedule.
    pub fn is_paid(&self) -> bool {
        self.payments.iter().any(|p| p.amount.is_positive())
            || self
                .discounts
                .iter()
                .any(|d| d.origin == Origin::Settlement && d.amount.is_positive())
            || self.debts.iter().any(|d| d.amount.is_positive())
            || !self.description.is_empty()
    }

    /// settlement that recomputes this rent to the same recorded activity
    ///
    /// Contract-origin discounts and every VAT line are left out, the
    /// pipeline derives them again from the contract.
    pub fn recorded_settlement(&self) -> Settlement {
        Settlement {
            payments: self.payments.clone(),
            debts: self.debts.clone(),
            discounts: self
                .discounts
                .iter()
                .filter(|d| d.origin == Origin::Settlement)
                .cloned()
                .collect(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
        }
    }

    /// unpaid part of this rent, negative when overpaid
    pub fn outstanding(&self) -> Money {
        self.total.grand_total - self.total.payment
    }
}

/// activity recorded against one rent: payments, debts, discounts, note
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settlement {
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub debts: Vec<LineItem>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Settlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payment(mut self, payment: Payment) -> Self {
        self.payments.push(payment);
        self
    }

    pub fn debt(mut self, description: impl Into<String>, amount: Money) -> Self {
        self.debts.push(LineItem::new(description, amount));
        self
    }

    pub fn discount(mut self, description: impl Into<String>, amount: Money) -> Self {
        self.discounts.push(Discount::settlement(description, amount));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// build a settlement from VAT-inclusive amounts as entered at the desk
    ///
    /// `promo` and `extra_charge` are stored net of `vat_rate` so the VAT
    /// stage adds it back; non-positive payments are dropped.
    pub fn from_gross(
        payments: Vec<Payment>,
        promo: Option<(String, Money)>,
        extra_charge: Option<(String, Money)>,
        vat_rate: Rate,
    ) -> Self {
        let mut settlement = Settlement {
            payments: payments
                .into_iter()
                .filter(|p| p.amount.is_positive())
                .collect(),
            ..Settlement::default()
        };

        if let Some((note, amount)) = promo.filter(|(_, amount)| amount.is_positive()) {
            settlement = settlement.discount(note, amount.exclude_rate(vat_rate));
        }
        if let Some((note, amount)) = extra_charge.filter(|(_, amount)| amount.is_positive()) {
            settlement = settlement.debt(note, amount.exclude_rate(vat_rate));
        }
        settlement
    }

    /// append another settlement's activity, descriptions joined by a newline
    pub fn merge(&mut self, other: Settlement) {
        self.payments.extend(other.payments);
        self.debts.extend(other.debts);
        self.discounts.extend(other.discounts);
        self.description = match (self.description.take(), other.description) {
            (Some(mine), Some(theirs)) => Some(format!("{}\n{}", mine, theirs)),
            (mine, theirs) => mine.or(theirs),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
            && self.debts.is_empty()
            && self.discounts.is_empty()
            && self.description.as_deref().map_or(true, str::is_empty)
    }
}
