/// serialization support for contracts and rents
use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::calendar::TermKey;
use crate::contract::Contract;
use crate::decimal::{Money, Rate};
use crate::rent::{Payment, Rent};
use crate::types::{ContractId, ContractStatus, Frequency, Origin, PaymentStatus};

/// settled when nothing is due or the payments cover the grand total
fn payment_status(grand_total: Money, new_balance: Money, payment: Money) -> PaymentStatus {
    if !grand_total.is_positive() || !new_balance.is_negative() {
        PaymentStatus::Paid
    } else if payment.is_positive() {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::NotPaid
    }
}

/// serializable view of one rent, as shown on a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentView {
    pub term: TermKey,
    pub month: u32,
    pub year: i32,
    pub balance: Money,
    /// payment minus grand total, negative while something is owed
    pub new_balance: Money,
    pub payment: Money,
    pub payments: Vec<Payment>,
    pub discount: Money,
    pub total_amount: Money,
    pub total_without_balance: Money,
    pub total_without_vat: Money,
    pub total_to_pay: Money,
    pub vat_amount: Money,
    pub promo: Money,
    pub promo_note: String,
    pub extra_charge: Money,
    pub extra_charge_note: String,
    pub description: String,
    /// only set once the term has started
    pub status: Option<PaymentStatus>,
    pub active: bool,
}

impl RentView {
    pub fn from_rent(rent: &Rent, frequency: Frequency, time_provider: &SafeTimeProvider) -> Self {
        let now = time_provider.now();
        let total = &rent.total;
        let new_balance = total.payment - total.grand_total;

        let settlement_discounts = rent
            .discounts
            .iter()
            .filter(|d| d.origin == Origin::Settlement);
        let mut promo: Money = settlement_discounts.clone().map(|d| d.amount).sum();
        let promo_note = settlement_discounts
            .map(|d| format!("{}\n", d.description))
            .collect::<String>();

        let mut extra_charge: Money = rent.debts.iter().map(|d| d.amount).sum();
        let extra_charge_note = rent
            .debts
            .iter()
            .map(|d| format!("{}\n", d.description))
            .collect::<String>();

        let vat_rate = rent
            .vats
            .iter()
            .find(|v| v.origin == Origin::Contract)
            .map(|v| v.rate)
            .unwrap_or(Rate::ZERO);
        if !vat_rate.is_zero() {
            if promo.is_positive() {
                promo = promo.include_rate(vat_rate).round2();
            }
            if extra_charge.is_positive() {
                extra_charge = extra_charge.include_rate(vat_rate).round2();
            }
        }

        let contract_discount: Money = rent
            .discounts
            .iter()
            .filter(|d| d.origin == Origin::Contract)
            .map(|d| d.amount)
            .sum();
        let vat_amount: Money = rent
            .vats
            .iter()
            .filter(|v| v.origin == Origin::Contract)
            .map(|v| v.amount)
            .sum();

        let (status, active) = match rent.term.to_instant() {
            Ok(start) if frequency.is_same_or_before(start, now) => (
                Some(payment_status(total.grand_total, new_balance, total.payment)),
                now < frequency.advance(start, 1),
            ),
            _ => (None, false),
        };

        RentView {
            term: rent.term,
            month: rent.month,
            year: rent.year,
            balance: total.balance,
            new_balance,
            payment: total.payment,
            payments: rent.payments.clone(),
            discount: total.discount,
            total_amount: total.grand_total,
            total_without_balance: total.grand_total - total.balance,
            total_without_vat: total.pre_tax_amount + total.charges - contract_discount,
            total_to_pay: total.grand_total,
            vat_amount,
            promo,
            promo_note,
            extra_charge,
            extra_charge_note,
            description: rent.description.clone(),
            status,
            active,
        }
    }

    /// status whatever the term date
    pub fn settlement_status(&self) -> PaymentStatus {
        payment_status(self.total_amount, self.new_balance, self.payment)
    }
}

/// serializable view of a contract and its schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractView {
    pub id: ContractId,
    pub status: ContractStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub termination: Option<DateTime<Utc>>,
    pub frequency: Frequency,
    pub terms: u32,
    pub vat_rate: Rate,
    pub discount: Money,
    pub property_count: usize,
    pub rent_count: usize,
    pub paid_rent_count: usize,
    pub outstanding_balance: Money,
    pub current_term: Option<TermKey>,
    pub rents: Vec<RentView>,
}

impl ContractView {
    pub fn from_contract(contract: &Contract, time_provider: &SafeTimeProvider) -> Self {
        let config = &contract.config;
        ContractView {
            id: contract.id,
            status: contract.status(),
            start: config.start,
            end: config.end,
            termination: config.termination,
            frequency: config.frequency,
            terms: contract.terms,
            vat_rate: config.vat_rate,
            discount: config.discount,
            property_count: config.properties.len(),
            rent_count: contract.rents.len(),
            paid_rent_count: contract.paid_rents().count(),
            outstanding_balance: contract.outstanding_balance(),
            current_term: contract.current_rent(time_provider).map(|rent| rent.term),
            rents: contract
                .rents
                .iter()
                .map(|rent| RentView::from_rent(rent, config.frequency, time_provider))
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// rent counts and amounts over a range of terms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodOverview {
    pub count_all: u32,
    pub count_paid: u32,
    pub count_partially_paid: u32,
    pub count_not_paid: u32,
    pub total_to_pay: Money,
    pub total_paid: Money,
    pub total_not_paid: Money,
}

impl PeriodOverview {
    /// aggregate every rent with `from <= term <= to`
    pub fn for_term_range<'a>(
        contracts: impl IntoIterator<Item = &'a Contract>,
        from: TermKey,
        to: TermKey,
    ) -> Self {
        contracts
            .into_iter()
            .flat_map(|contract| contract.rents.iter())
            .filter(|rent| from <= rent.term && rent.term <= to)
            .fold(PeriodOverview::default(), |mut acc, rent| {
                acc.add(rent);
                acc
            })
    }

    fn add(&mut self, rent: &Rent) {
        let total = &rent.total;
        let new_balance = total.payment - total.grand_total;

        match payment_status(total.grand_total, new_balance, total.payment) {
            PaymentStatus::Paid => self.count_paid += 1,
            PaymentStatus::PartiallyPaid => self.count_partially_paid += 1,
            PaymentStatus::NotPaid => self.count_not_paid += 1,
        }
        self.count_all += 1;
        self.total_to_pay += total.grand_total;
        self.total_paid += total.payment;
        if new_balance.is_negative() {
            self.total_not_paid -= new_balance;
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
