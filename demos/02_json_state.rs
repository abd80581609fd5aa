/// json state - ledger views for debugging and monitoring
use chrono::{Duration, TimeZone, Utc};
use rent_ledger::{
    Contract, ContractConfig, Money, Payment, PeriodOverview, PropertyAssignment,
    SafeTimeProvider, Settlement, TermKey, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    println!("=== json state serialization ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut flat = Contract::create(
        rent_ledger::Uuid::new_v4(),
        ContractConfig::residential_lease(
            start,
            vec![PropertyAssignment::new("flat 3B", Money::from_major(850))
                .with_expense("heating", Money::from_major(60))],
        ),
    )?;
    let mut garage = Contract::create(
        rent_ledger::Uuid::new_v4(),
        ContractConfig::residential_lease(
            start,
            vec![PropertyAssignment::new("garage 12", Money::from_major(90))],
        ),
    )?;

    // stage 1: first month, nothing paid
    println!("stage 1: created");
    println!("----------------");
    println!("{}\n", flat.rents[0].total.grand_total);

    // stage 2: january partially paid, garage settled
    flat.pay_term(
        TermKey::new(2024010100),
        Settlement::new().payment(Payment::new(Money::from_major(500))),
    )?;
    garage.pay_term(
        TermKey::new(2024010100),
        Settlement::new().payment(Payment::new(Money::from_major(90))),
    )?;
    let overview = PeriodOverview::for_term_range(
        [&flat, &garage],
        TermKey::new(2024010100),
        TermKey::new(2024010100),
    );
    println!("stage 2: january overview");
    println!("-------------------------");
    println!("{}\n", overview.to_json_pretty()?);

    // stage 3: a month later the flat owes two terms
    controller.advance(Duration::days(31));
    let current = flat.current_rent(&time).map(|rent| rent.term);
    println!("stage 3: current term {:?}", current);
    println!("-----------------------------------");
    println!("{}\n", flat.json(&time));

    Ok(())
}
