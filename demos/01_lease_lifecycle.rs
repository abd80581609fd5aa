/// lease lifecycle - create, settle, extend, terminate and renew
use rent_ledger::{
    parse_date, Contract, ContractChanges, ContractConfig, LedgerError, Money, Payment,
    PropertyAssignment, Settlement, TermKey,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== lease lifecycle ===\n");

    let config = ContractConfig::commercial_lease(
        parse_date("01/01/2017 00:00")?,
        vec![
            PropertyAssignment::new("shop", Money::from_major(1_200))
                .with_expense("service charge", Money::from_major(150)),
            PropertyAssignment::new("storage", Money::from_major(200))
                .occupied(parse_date("01/03/2017")?, parse_date("31/12/2019")?),
        ],
    );
    let mut lease = Contract::create(rent_ledger::Uuid::new_v4(), config)?;
    println!("created: {} terms, {} rents", lease.terms, lease.rents.len());

    // first and fourth terms paid, the fourth with a repair billed to the tenant
    lease.pay_term(
        TermKey::new(2017010100),
        Settlement::new().payment(Payment::new(Money::from_major(1_620)).kind("transfer")),
    )?;
    lease.pay_term(
        TermKey::new(2017040100),
        Settlement::new()
            .payment(Payment::new(Money::from_major(2_000)).kind("cheque"))
            .debt("broken window", Money::from_major(80))
            .description("window repaired on 12/04"),
    )?;
    println!("april carried balance: {}", lease.rents[3].total.balance);

    // three more months
    let extended = lease.update(&ContractChanges::new().end(parse_date("31/03/2026 23:59")?))?;
    println!("extended: {} terms, {} rents", extended.terms, extended.rents.len());

    // leaving before a paid term is refused
    match extended.terminate(parse_date("28/02/2017 23:59")?) {
        Err(LedgerError::LostPayment { lost }) => {
            for payment in lost {
                println!("would lose: {}", payment);
            }
        }
        other => println!("unexpected: {:?}", other.map(|c| c.rents.len())),
    }

    let terminated = extended.terminate(parse_date("31/12/2019 23:59")?)?;
    println!(
        "terminated: status {:?}, {} rents, still owed {}",
        terminated.status(),
        terminated.rents.len(),
        terminated.outstanding_balance()
    );

    let renewed = lease.renew()?;
    println!("renewed: {} terms, {} rents", renewed.terms, renewed.rents.len());

    Ok(())
}
