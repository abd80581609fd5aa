use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calendar::TermKey;
use crate::config::{ContractChanges, ContractConfig, PropertyAssignment};
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, LostPayment, Result};
use crate::pipeline::compute_rent;
use crate::rent::{Rent, Settlement};
use crate::serialization::ContractView;
use crate::types::{ContractId, ContractStatus, Frequency};

/// lease contract with its rent schedule
///
/// The contract exclusively owns its rents. Structural edits return a new
/// contract; only [`Contract::pay_term`] mutates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    #[serde(flatten)]
    pub config: ContractConfig,
    /// nominal number of terms between start and end
    pub terms: u32,
    pub rents: Vec<Rent>,
}

impl Contract {
    /// builder for creating contracts
    pub fn builder() -> ContractBuilder {
        ContractBuilder::new()
    }

    /// validate the definition and generate every rent, initially unpaid
    pub fn create(id: ContractId, config: ContractConfig) -> Result<Self> {
        config.validate()?;

        let terms = config.frequency.count_between(config.start, config.end);
        let rents = generate_rents(&config);

        info!(
            contract_id = %id,
            frequency = %config.frequency,
            terms,
            rents = rents.len(),
            "rent schedule generated"
        );

        Ok(Self {
            id,
            config,
            terms,
            rents,
        })
    }

    /// regenerate the schedule from a modified definition
    ///
    /// Fails with [`LedgerError::LostPayment`] when a paid term starts outside
    /// the new span; `self` is never modified. Every paid term is replayed on
    /// the regenerated term whose period contains its start, in order.
    pub fn update(&self, changes: &ContractChanges) -> Result<Self> {
        let config = changes.apply_to(&self.config);

        let lost: Vec<LostPayment> = self
            .paid_rents()
            .filter(|rent| !covers(&config, rent.term))
            .map(|rent| LostPayment {
                term: rent.term,
                amounts: rent.payments.iter().map(|p| p.amount).collect(),
            })
            .collect();

        if !lost.is_empty() {
            warn!(
                contract_id = %self.id,
                lost = lost.len(),
                "update rejected, paid rents out of the contract time frame"
            );
            return Err(LedgerError::LostPayment { lost });
        }

        let mut updated = Contract::create(self.id, config)?;

        let mut replays: Vec<(TermKey, Settlement)> = Vec::new();
        for paid in self.paid_rents() {
            let target = paid
                .term
                .to_instant()
                .ok()
                .and_then(|instant| updated.index_at(instant))
                .map(|index| updated.rents[index].term)
                .ok_or_else(|| LedgerError::LostPayment {
                    lost: vec![LostPayment {
                        term: paid.term,
                        amounts: paid.payments.iter().map(|p| p.amount).collect(),
                    }],
                })?;

            // several old terms can fold into one when the frequency widens
            match replays.last_mut() {
                Some((term, settlement)) if *term == target => {
                    settlement.merge(paid.recorded_settlement());
                }
                _ => replays.push((target, paid.recorded_settlement())),
            }
        }

        let replayed = replays.len();
        for (term, settlement) in replays {
            updated.pay_term(term, settlement)?;
        }

        info!(
            contract_id = %self.id,
            terms = updated.terms,
            rents = updated.rents.len(),
            replayed,
            "contract updated"
        );
        Ok(updated)
    }

    /// extend the end by the nominal number of terms
    pub fn renew(&self) -> Result<Self> {
        let end = self.config.frequency.advance(self.config.end, self.terms);
        let mut renewed = self.update(&ContractChanges::new().end(end))?;
        renewed.terms = self.terms;

        info!(contract_id = %self.id, end = %end, "contract renewed");
        Ok(renewed)
    }

    /// cap the schedule at `termination`, `end` is kept
    pub fn terminate(&self, termination: DateTime<Utc>) -> Result<Self> {
        if termination < self.config.start || termination > self.config.end {
            return Err(LedgerError::InvalidDateRange {
                message: format!(
                    "termination date {} is out of the contract time frame {} - {}",
                    termination, self.config.start, self.config.end
                ),
            });
        }

        let terminated = self.update(&ContractChanges::new().termination(termination))?;
        info!(contract_id = %self.id, termination = %termination, "contract terminated");
        Ok(terminated)
    }

    /// record a settlement against `term` and recompute the rents after it
    ///
    /// The target rent gets `settlement`, every following rent is recomputed
    /// from its own recorded settlement so carried balances stay consistent
    /// whatever order terms are paid in.
    pub fn pay_term(&mut self, term: TermKey, settlement: Settlement) -> Result<&mut Self> {
        if self.rents.is_empty() {
            return Err(LedgerError::NoSchedule);
        }

        let instant = term.to_instant()?;
        let frequency = self.config.frequency;
        if !frequency.contains(self.config.start, self.config.effective_end(), instant) {
            return Err(LedgerError::OutOfRange { term });
        }

        let target = self
            .rents
            .iter()
            .position(|rent| rent.term == term)
            .ok_or(LedgerError::OutOfRange { term })?;

        let mut rents: Vec<Rent> = Vec::with_capacity(self.rents.len());
        rents.extend_from_slice(&self.rents[..target]);

        for (index, existing) in self.rents.iter().enumerate().skip(target) {
            let recorded;
            let applied = if index == target {
                &settlement
            } else {
                recorded = existing.recorded_settlement();
                &recorded
            };
            let rent = compute_rent(
                &self.config,
                self.term_start(index),
                rents.last(),
                Some(applied),
            );
            rents.push(rent);
        }

        debug!(
            contract_id = %self.id,
            term = %term,
            recomputed = rents.len() - target,
            "term settled"
        );

        self.rents = rents;
        Ok(self)
    }

    /// instant the rent at `index` was generated for
    fn term_start(&self, index: usize) -> DateTime<Utc> {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        self.config.frequency.advance(self.config.start, steps)
    }

    /// terminated while a termination caps the schedule before `end`
    pub fn status(&self) -> ContractStatus {
        match self.config.termination {
            Some(termination) if termination < self.config.end => ContractStatus::Terminated,
            _ => ContractStatus::Active,
        }
    }

    /// rent of a term, if it is part of the visible schedule
    pub fn rent(&self, term: TermKey) -> Option<&Rent> {
        self.rents
            .binary_search_by_key(&term, |rent| rent.term)
            .ok()
            .map(|index| &self.rents[index])
    }

    /// rent of the term containing the provider's current time
    pub fn current_rent(&self, time_provider: &SafeTimeProvider) -> Option<&Rent> {
        self.rent_at(time_provider.now())
    }

    /// rent whose period contains `instant`
    pub fn rent_at(&self, instant: DateTime<Utc>) -> Option<&Rent> {
        if instant < self.config.start {
            return None;
        }
        self.index_at(instant).map(|index| &self.rents[index])
    }

    /// index of the last rent keyed at or before `instant` whose period has
    /// not ended by then
    fn index_at(&self, instant: DateTime<Utc>) -> Option<usize> {
        let key = TermKey::from_instant(self.config.frequency, instant);
        let index = self.rents.iter().rposition(|rent| rent.term <= key)?;
        (instant < self.term_start(index + 1)).then_some(index)
    }

    /// rents with recorded activity, in schedule order
    pub fn paid_rents(&self) -> impl Iterator<Item = &Rent> + '_ {
        self.rents.iter().filter(|rent| rent.is_paid())
    }

    /// pretty json of the ledger as seen at the provider's current time
    pub fn json(&self, time_provider: &SafeTimeProvider) -> String {
        ContractView::from_contract(self, time_provider)
            .to_json_pretty()
            .unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// amount still owed at the end of the visible schedule
    pub fn outstanding_balance(&self) -> Money {
        self.rents
            .last()
            .map(Rent::outstanding)
            .unwrap_or(Money::ZERO)
    }
}

/// whether the term starting at `term` lies in the span of `config`
fn covers(config: &ContractConfig, term: TermKey) -> bool {
    term.to_instant()
        .map(|instant| config.frequency.contains(config.start, config.effective_end(), instant))
        .unwrap_or(false)
}

/// walk the timeline from start to the schedule cap, one term per period
fn generate_rents(config: &ContractConfig) -> Vec<Rent> {
    let frequency = config.frequency;
    let cap = config.effective_end();

    let mut rents: Vec<Rent> = Vec::new();
    let mut current = config.start;
    let mut step: u32 = 0;

    while frequency.is_same_or_before(current, cap) {
        let rent = compute_rent(config, current, rents.last(), None);
        rents.push(rent);

        step += 1;
        let next = frequency.advance(config.start, step);
        if next <= current {
            break;
        }
        current = next;
    }
    rents
}

/// builder for creating contracts
#[derive(Debug, Default)]
pub struct ContractBuilder {
    id: Option<ContractId>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    termination: Option<DateTime<Utc>>,
    frequency: Option<Frequency>,
    discount: Option<Money>,
    vat_rate: Option<Rate>,
    properties: Vec<PropertyAssignment>,
}

impl ContractBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: ContractId) -> Self {
        self.id = Some(id);
        self
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
        self.termination = Some(termination);
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

    pub fn property(mut self, property: PropertyAssignment) -> Self {
        self.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: Vec<PropertyAssignment>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn build(self) -> Result<Contract> {
        let start = self.start.ok_or(LedgerError::InvalidDateRange {
            message: "contract start date is required".to_string(),
        })?;
        let end = self.end.ok_or(LedgerError::InvalidDateRange {
            message: "contract end date is required".to_string(),
        })?;
        let frequency = self.frequency.ok_or(LedgerError::InvalidFrequency {
            value: String::new(),
        })?;

        let config = ContractConfig {
            start,
            end,
            termination: self.termination,
            frequency,
            discount: self.discount.unwrap_or(Money::ZERO),
            vat_rate: self.vat_rate.unwrap_or(Rate::ZERO),
            properties: self.properties,
        };

        Contract::create(self.id.unwrap_or_else(Uuid::new_v4), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rent::Payment;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn key(value: u64) -> TermKey {
        TermKey::new(value)
    }

    fn paid(amount: i64) -> Settlement {
        Settlement::new().payment(Payment::new(Money::from_major(amount)))
    }

    fn zero_priced() -> Vec<PropertyAssignment> {
        vec![
            PropertyAssignment::new("cellar", Money::ZERO),
            PropertyAssignment::new("parking", Money::ZERO),
        ]
    }

    fn long_lease() -> Contract {
        Contract::builder()
            .start(at(2017, 1, 1, 0, 0))
            .end(at(2025, 12, 31, 23, 59))
            .frequency(Frequency::Monthly)
            .properties(zero_priced())
            .build()
            .unwrap()
    }

    fn office_lease() -> Contract {
        Contract::builder()
            .start(at(2020, 1, 1, 0, 0))
            .end(at(2020, 12, 31, 23, 59))
            .frequency(Frequency::Monthly)
            .vat_rate(Rate::from_percentage(20))
            .property(
                PropertyAssignment::new("office1", Money::from_major(300))
                    .with_expense("expense", Money::from_major(10))
                    .occupied(at(2020, 1, 1, 0, 0), at(2020, 12, 31, 0, 0)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_contract() {
        let contract = long_lease();

        assert_eq!(contract.terms, 108);
        assert_eq!(contract.rents.len(), 108);
        assert_eq!(contract.rents[0].term, key(2017010100));
        assert_eq!(contract.rents[107].term, key(2025120100));
        assert!(contract.rents.windows(2).all(|w| w[0].term < w[1].term));
        assert_eq!(contract.status(), ContractStatus::Active);
    }

    #[test]
    fn test_create_rejects_invalid_contracts() {
        let missing_properties = Contract::builder()
            .start(at(2017, 1, 1, 0, 0))
            .end(at(2017, 1, 1, 3, 0))
            .frequency(Frequency::Hourly)
            .build();
        assert_eq!(missing_properties.unwrap_err(), LedgerError::MissingProperties);

        let reversed = Contract::builder()
            .start(at(2017, 1, 1, 0, 0))
            .end(at(2016, 1, 1, 3, 0))
            .frequency(Frequency::Hourly)
            .properties(zero_priced())
            .build();
        assert!(matches!(reversed, Err(LedgerError::InvalidDateRange { .. })));

        let no_frequency = Contract::builder()
            .start(at(2017, 1, 1, 0, 0))
            .end(at(2018, 1, 1, 0, 0))
            .properties(zero_priced())
            .build();
        assert!(matches!(no_frequency, Err(LedgerError::InvalidFrequency { .. })));
    }

    #[test]
    fn test_terminate_and_reterminate() {
        let contract = long_lease();

        let terminated = contract.terminate(at(2017, 12, 31, 23, 59)).unwrap();
        assert_eq!(terminated.terms, 108);
        assert_eq!(terminated.rents.len(), 12);
        assert_eq!(terminated.config.end, contract.config.end);
        assert_eq!(terminated.status(), ContractStatus::Terminated);

        let longer = terminated.terminate(at(2018, 12, 31, 23, 59)).unwrap();
        assert_eq!(longer.rents.len(), 24);

        let shorter = longer.terminate(at(2017, 6, 30, 23, 59)).unwrap();
        assert_eq!(shorter.rents.len(), 6);
        assert_eq!(shorter.terms, 108);

        assert!(matches!(
            contract.terminate(at(2026, 12, 31, 23, 59)),
            Err(LedgerError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            contract.terminate(at(2016, 1, 1, 0, 0)),
            Err(LedgerError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_update_keeps_termination_inside_dates() {
        let terminated = long_lease().terminate(at(2017, 12, 31, 23, 59)).unwrap();

        let extended = terminated
            .update(&ContractChanges::new().end(at(2026, 3, 31, 23, 59)))
            .unwrap();
        assert_eq!(extended.terms, 111);
        assert_eq!(extended.rents.len(), 12);

        assert!(terminated
            .update(&ContractChanges::new().end(at(2017, 12, 30, 23, 59)))
            .is_err());
        assert!(terminated
            .update(&ContractChanges::new().start(at(2018, 1, 1, 23, 59)))
            .is_err());
    }

    #[test]
    fn test_pay_term_errors() {
        let mut contract = long_lease();

        assert!(matches!(
            contract.pay_term(key(2026120100), paid(200)),
            Err(LedgerError::OutOfRange { .. })
        ));
        assert!(matches!(
            contract.pay_term(key(2016120100), paid(200)),
            Err(LedgerError::OutOfRange { .. })
        ));
        assert!(matches!(
            contract.pay_term(key(2017023000), paid(200)),
            Err(LedgerError::InvalidTermKey { .. })
        ));

        let mut empty = contract.clone();
        empty.rents.clear();
        assert_eq!(
            empty.pay_term(key(2017010100), paid(200)).unwrap_err(),
            LedgerError::NoSchedule
        );
    }

    #[test]
    fn test_pay_first_and_last_terms() {
        let mut contract = long_lease();
        contract.pay_term(key(2017010100), paid(200)).unwrap();
        contract.pay_term(key(2025120100), paid(300)).unwrap();

        assert_eq!(contract.rents.len(), 108);
        assert_eq!(contract.rents[0].total.payment, Money::from_major(200));
        assert_eq!(contract.rents[107].total.payment, Money::from_major(300));
        assert_eq!(contract.paid_rents().count(), 2);
        // zero-priced units: overpayments keep cascading
        assert_eq!(contract.rents[1].total.balance, Money::from_major(-200));
        assert_eq!(contract.outstanding_balance(), Money::from_major(-500));
    }

    #[test]
    fn test_pay_term_recomputes_following_balances() {
        let mut contract = office_lease();
        contract.pay_term(key(2020010100), paid(372)).unwrap();

        let february = contract.rent(key(2020020100)).unwrap();
        assert_eq!(february.total.balance, Money::ZERO);
        assert_eq!(february.total.grand_total, Money::from_major(372));

        let december = contract.rent(key(2020120100)).unwrap();
        assert_eq!(december.total.grand_total, Money::from_major(372 * 12 - 372));
    }

    #[test]
    fn test_pay_term_keeps_following_settlements() {
        let mut contract = office_lease();
        contract
            .pay_term(key(2020030100), paid(100).description("partial"))
            .unwrap();
        contract.pay_term(key(2020010100), paid(372)).unwrap();

        let march = contract.rent(key(2020030100)).unwrap();
        assert_eq!(march.total.payment, Money::from_major(100));
        assert_eq!(march.description, "partial");
        assert_eq!(march.total.balance, Money::from_major(372));
    }

    #[test]
    fn test_update_replays_settlements() {
        let mut contract = long_lease();
        contract
            .pay_term(
                key(2017010100),
                paid(200)
                    .debt("extra", Money::from_major(100))
                    .discount("", Money::from_major(100)),
            )
            .unwrap();

        let extended = contract
            .update(&ContractChanges::new().end(at(2026, 3, 31, 23, 59)))
            .unwrap();

        assert_eq!(extended.terms, 111);
        assert_eq!(extended.rents.len(), 111);
        let first = extended.rent(key(2017010100)).unwrap();
        assert_eq!(first.payments[0].amount, Money::from_major(200));
        assert_eq!(first.debts[0].amount, Money::from_major(100));
        assert_eq!(first.discounts[0].amount, Money::from_major(100));
        assert_eq!(extended.paid_rents().count(), 1);
    }

    #[test]
    fn test_update_rejects_lost_payment_without_mutation() {
        let mut contract = long_lease();
        contract.pay_term(key(2025120100), paid(200)).unwrap();
        let before = contract.clone();

        let err = contract
            .update(
                &ContractChanges::new()
                    .start(at(2019, 1, 1, 0, 0))
                    .end(at(2024, 12, 31, 23, 59)),
            )
            .unwrap_err();

        match err {
            LedgerError::LostPayment { lost } => {
                assert_eq!(lost.len(), 1);
                assert_eq!(lost[0].term, key(2025120100));
                assert_eq!(lost[0].amounts, vec![Money::from_major(200)]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(contract, before);

        let shortened = contract
            .update(
                &ContractChanges::new()
                    .start(at(2019, 1, 1, 0, 0))
                    .end(at(2025, 12, 31, 23, 59)),
            )
            .unwrap();
        assert_eq!(shortened.rents.len(), 84);
        assert_eq!(
            shortened.rent(key(2025120100)).unwrap().total.payment,
            Money::from_major(200)
        );
    }

    #[test]
    fn test_terminate_before_paid_term_fails() {
        let mut contract = long_lease();
        contract
            .pay_term(key(2018060100), Settlement::new().description("keys returned late"))
            .unwrap();

        assert!(matches!(
            contract.terminate(at(2017, 12, 31, 23, 59)),
            Err(LedgerError::LostPayment { .. })
        ));
        assert_eq!(contract.terminate(at(2018, 6, 30, 23, 59)).unwrap().rents.len(), 18);
    }

    #[test]
    fn test_renew_keeps_nominal_terms() {
        let mut contract = long_lease();
        contract.pay_term(key(2025120100), paid(200)).unwrap();

        let renewed = contract.renew().unwrap();
        assert_eq!(renewed.terms, 108);
        assert_eq!(renewed.rents.len(), 216);
        assert_eq!(renewed.paid_rents().count(), 1);
        assert_eq!(
            renewed.rent(key(2025120100)).unwrap().payments[0].amount,
            Money::from_major(200)
        );
    }

    #[test]
    fn test_current_rent_follows_time_provider() {
        let contract = office_lease();
        let time = SafeTimeProvider::new(TimeSource::Test(at(2020, 3, 17, 9, 0)));

        let current = contract.current_rent(&time).unwrap();
        assert_eq!(current.term, key(2020030100));

        let later = SafeTimeProvider::new(TimeSource::Test(at(2021, 3, 17, 9, 0)));
        assert!(contract.current_rent(&later).is_none());
    }

    #[test]
    fn test_weekly_schedule_anchored_on_start() {
        let contract = Contract::builder()
            .start(at(2021, 7, 14, 0, 0))
            .end(at(2021, 8, 10, 23, 59))
            .frequency(Frequency::Weekly)
            .discount(Money::from(dec!(2.5)))
            .property(PropertyAssignment::new("desk", Money::from_major(50)))
            .build()
            .unwrap();

        assert_eq!(contract.terms, 4);
        let keys: Vec<u64> = contract.rents.iter().map(|r| r.term.value()).collect();
        assert_eq!(keys, vec![2021071400, 2021072100, 2021072800, 2021080400]);
        assert_eq!(contract.rents[3].total.grand_total, Money::from(dec!(190)));

        let mid_week = contract.rent_at(at(2021, 7, 24, 10, 0)).unwrap();
        assert_eq!(mid_week.term, key(2021072100));
        assert!(contract.rent_at(at(2021, 7, 13, 23, 0)).is_none());
        assert!(contract.rent_at(at(2021, 8, 11, 0, 0)).is_none());
    }

    #[test]
    fn test_reset_termination_reactivates_contract() {
        let contract = long_lease();
        let terminated = contract.terminate(at(2017, 12, 31, 23, 59)).unwrap();
        assert_eq!(terminated.status(), ContractStatus::Terminated);

        let reset = terminated
            .update(&ContractChanges::new().clear_termination())
            .unwrap();
        assert_eq!(reset.config.termination, None);
        assert_eq!(reset.status(), ContractStatus::Active);
        assert_eq!(reset.rents.len(), 108);

        let from_json: ContractChanges = serde_json::from_str(r#"{"termination": null}"#).unwrap();
        let reset = terminated.update(&from_json).unwrap();
        assert_eq!(reset.status(), ContractStatus::Active);
        assert_eq!(reset.rents, contract.rents);
    }

    #[test]
    fn test_terminate_on_contract_bounds() {
        let contract = long_lease();

        let at_start = contract.terminate(contract.config.start).unwrap();
        assert_eq!(at_start.rents.len(), 1);
        assert_eq!(at_start.rents[0].term, key(2017010100));
        assert_eq!(at_start.terms, 108);
        assert_eq!(at_start.status(), ContractStatus::Terminated);

        let at_end = contract.terminate(contract.config.end).unwrap();
        assert_eq!(at_end.rents.len(), 108);
        assert_eq!(at_end.status(), ContractStatus::Active);
    }

    #[test]
    fn test_lost_payment_reported_before_invalid_range() {
        let mut contract = long_lease();
        contract.pay_term(key(2025120100), paid(200)).unwrap();

        let err = contract
            .update(&ContractChanges::new().end(at(2016, 1, 1, 0, 0)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::LostPayment { .. }));
    }

    #[test]
    fn test_rent_at_ignores_instants_before_start() {
        let contract = Contract::builder()
            .start(at(2021, 1, 15, 0, 0))
            .end(at(2021, 12, 14, 23, 59))
            .frequency(Frequency::Monthly)
            .properties(zero_priced())
            .build()
            .unwrap();

        assert!(contract.rent_at(at(2021, 1, 10, 0, 0)).is_none());
        assert_eq!(contract.rent_at(at(2021, 1, 20, 0, 0)).unwrap().term, key(2021010100));
    }

    #[test]
    fn test_weekly_update_replays_on_covering_term() {
        let mut contract = Contract::builder()
            .start(at(2021, 7, 14, 0, 0))
            .end(at(2021, 8, 10, 23, 59))
            .frequency(Frequency::Weekly)
            .property(PropertyAssignment::new("desk", Money::from_major(50)))
            .build()
            .unwrap();
        contract.pay_term(key(2021072800), paid(50)).unwrap();

        let shifted = contract
            .update(&ContractChanges::new().start(at(2021, 7, 15, 0, 0)))
            .unwrap();
        let keys: Vec<u64> = shifted.rents.iter().map(|r| r.term.value()).collect();
        assert_eq!(keys, vec![2021071500, 2021072200, 2021072900, 2021080500]);
        assert_eq!(shifted.paid_rents().count(), 1);
        assert_eq!(
            shifted.rent(key(2021072200)).unwrap().total.payment,
            Money::from_major(50)
        );

        let err = contract
            .update(&ContractChanges::new().start(at(2021, 7, 29, 0, 0)))
            .unwrap_err();
        match err {
            LedgerError::LostPayment { lost } => assert_eq!(lost[0].term, key(2021072800)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_yearly_contract_starting_mid_year() {
        let yearly = || {
            Contract::builder()
                .start(at(2021, 7, 1, 0, 0))
                .end(at(2024, 6, 30, 23, 59))
                .frequency(Frequency::Yearly)
                .property(PropertyAssignment::new("warehouse", Money::from_major(1_000)))
                .build()
                .unwrap()
        };

        let mut contract = yearly();
        assert_eq!(contract.terms, 3);
        assert_eq!(contract.rents[0].term, key(2021010100));
        assert_eq!(contract.rent_at(at(2021, 9, 1, 0, 0)).unwrap().term, key(2021010100));
        assert!(matches!(
            contract.pay_term(key(2020010100), paid(1_000)),
            Err(LedgerError::OutOfRange { .. })
        ));

        contract.pay_term(key(2023010100), paid(1_000)).unwrap();
        contract.pay_term(key(2021010100), paid(1_000)).unwrap();

        let mut in_order = yearly();
        in_order.pay_term(key(2021010100), paid(1_000)).unwrap();
        in_order.pay_term(key(2023010100), paid(1_000)).unwrap();
        assert_eq!(contract.rents, in_order.rents);
        assert_eq!(contract.rent(key(2022010100)).unwrap().total.grand_total, Money::from_major(1_000));

        let extended = contract
            .update(&ContractChanges::new().end(at(2025, 6, 30, 23, 59)))
            .unwrap();
        assert_eq!(extended.rents.len(), contract.rents.len() + 1);
        assert_eq!(extended.paid_rents().count(), 2);
        assert_eq!(
            extended.rent(key(2023010100)).unwrap().total.payment,
            Money::from_major(1_000)
        );
    }

    #[test]
    fn test_hourly_contract_paid_then_updated() {
        let mut contract = Contract::builder()
            .start(at(2017, 1, 1, 0, 0))
            .end(at(2017, 1, 1, 5, 59))
            .frequency(Frequency::Hourly)
            .properties(zero_priced())
            .build()
            .unwrap();
        assert_eq!(contract.rents.len(), 6);
        contract.pay_term(key(2017010103), paid(10)).unwrap();

        let longer = contract
            .update(&ContractChanges::new().end(at(2017, 1, 1, 7, 59)))
            .unwrap();
        assert_eq!(longer.rents.len(), 8);
        assert_eq!(longer.rent(key(2017010103)).unwrap().total.payment, Money::from_major(10));
        assert_eq!(longer.rents[7].total.balance, Money::from_major(-10));

        assert!(matches!(
            contract.terminate(at(2017, 1, 1, 2, 30)),
            Err(LedgerError::LostPayment { .. })
        ));
        assert_eq!(contract.terminate(at(2017, 1, 1, 3, 15)).unwrap().rents.len(), 4);
    }

    #[test]
    fn test_widening_frequency_merges_settlements() {
        let mut contract = long_lease();
        contract.pay_term(key(2017010100), paid(100)).unwrap();
        contract
            .pay_term(key(2017030100), paid(50).description("march"))
            .unwrap();

        let yearly = contract
            .update(&ContractChanges::new().frequency(Frequency::Yearly))
            .unwrap();

        assert_eq!(yearly.rents.len(), 9);
        let first = yearly.rent(key(2017010100)).unwrap();
        assert_eq!(first.payments.len(), 2);
        assert_eq!(first.total.payment, Money::from_major(150));
        assert_eq!(first.description, "march");
        assert_eq!(yearly.paid_rents().count(), 1);
    }
}
