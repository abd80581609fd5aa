//! The seven rent computation stages.
//!
//! Each stage is a pure function of the input and the rent built so far.

use chrono::Datelike;

use crate::calendar::TermKey;
use crate::decimal::{Money, Rate};
use crate::rent::{Discount, LineItem, Rent, Vat};
use crate::types::Origin;

use super::RentInput;

const CONTRACT_DISCOUNT: &str = "contract discount";

/// term key, period and the billed units with their expenses
pub fn base(input: &RentInput<'_>, mut rent: Rent) -> Rent {
    let frequency = input.config.frequency;
    let instant = input.rent_date;

    rent.term = TermKey::from_instant(frequency, instant);
    rent.month = instant.month();
    rent.year = instant.year();

    for assignment in input
        .config
        .properties
        .iter()
        .filter(|assignment| assignment.is_occupied_at(frequency, instant))
    {
        rent.pre_tax_amounts
            .push(LineItem::new(assignment.property.name.clone(), assignment.rent));
        rent.charges.extend(
            assignment
                .expenses
                .iter()
                .filter(|expense| expense.applies_on(instant))
                .map(|expense| LineItem::new(expense.title.clone(), expense.amount)),
        );
    }

    if let Some(settlement) = input.settlement {
        rent.description = settlement.description.clone().unwrap_or_default();
    }
    rent
}

pub fn debts(input: &RentInput<'_>, mut rent: Rent) -> Rent {
    if let Some(settlement) = input.settlement {
        rent.debts.extend(settlement.debts.iter().cloned());
    }
    rent
}

pub fn discounts(input: &RentInput<'_>, mut rent: Rent) -> Rent {
    if !input.config.discount.is_zero() {
        rent.discounts.push(Discount {
            origin: Origin::Contract,
            description: CONTRACT_DISCOUNT.to_string(),
            amount: input.config.discount,
        });
    }

    if let Some(settlement) = input.settlement {
        rent.discounts.extend(
            settlement
                .discounts
                .iter()
                .map(|discount| Discount::settlement(discount.description.clone(), discount.amount)),
        );
    }
    rent
}

/// VAT on every amount so far; discounts reduce the base
pub fn vat(input: &RentInput<'_>, mut rent: Rent) -> Rent {
    let rate = input.config.vat_rate;
    if rate.is_zero() {
        return rent;
    }

    let mut vats = Vec::with_capacity(
        rent.pre_tax_amounts.len() + rent.charges.len() + rent.debts.len() + rent.discounts.len(),
    );
    vats.extend(
        rent.pre_tax_amounts
            .iter()
            .chain(rent.charges.iter())
            .map(|item| vat_line(Origin::Contract, &item.description, item.amount, rate)),
    );
    vats.extend(
        rent.debts
            .iter()
            .map(|debt| vat_line(Origin::Settlement, &debt.description, debt.amount, rate)),
    );
    vats.extend(
        rent.discounts
            .iter()
            .map(|discount| vat_line(discount.origin, &discount.description, -discount.amount, rate)),
    );

    rent.vats.extend(vats);
    rent
}

fn vat_line(origin: Origin, description: &str, base: Money, rate: Rate) -> Vat {
    Vat {
        origin,
        description: format!("{} VAT ({})", description, rate),
        rate,
        amount: base.apply_rate(rate),
    }
}

/// carry what the previous rent left unpaid
pub fn balance(input: &RentInput<'_>, mut rent: Rent) -> Rent {
    rent.total.balance = input
        .previous
        .map(Rent::outstanding)
        .unwrap_or(Money::ZERO);
    rent
}

pub fn payments(input: &RentInput<'_>, mut rent: Rent) -> Rent {
    if let Some(settlement) = input.settlement {
        rent.payments.extend(settlement.payments.iter().cloned());
    }
    rent
}

pub fn total(_input: &RentInput<'_>, mut rent: Rent) -> Rent {
    let pre_tax_amount: Money = rent.pre_tax_amounts.iter().map(|item| item.amount).sum();
    let charges: Money = rent.charges.iter().map(|item| item.amount).sum();
    let debts: Money = rent.debts.iter().map(|item| item.amount).sum();
    let discount: Money = rent.discounts.iter().map(|item| item.amount).sum();
    let vat = rent.vats.iter().map(|item| item.amount).sum::<Money>().round2();
    let payment: Money = rent.payments.iter().map(|item| item.amount).sum();

    rent.total.pre_tax_amount = pre_tax_amount;
    rent.total.charges = charges;
    rent.total.debts = debts;
    rent.total.discount = discount;
    rent.total.vat = vat;
    rent.total.grand_total =
        (pre_tax_amount + charges + debts - discount + vat + rent.total.balance).round2();
    rent.total.payment = payment;
    rent
}
