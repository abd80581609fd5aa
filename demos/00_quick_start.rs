/// quick start - minimal example to get started
use rent_ledger::{
    parse_date, Contract, Frequency, Money, Payment, PropertyAssignment, Rate, Settlement, TermKey,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a one year office lease billed monthly with 20% VAT
    let mut contract = Contract::builder()
        .start(parse_date("01/01/2020 00:00")?)
        .end(parse_date("31/12/2020 23:59")?)
        .frequency(Frequency::Monthly)
        .vat_rate(Rate::from_percentage(20))
        .property(
            PropertyAssignment::new("office1", Money::from_major(300))
                .with_expense("expense", Money::from_major(10)),
        )
        .build()?;

    // settle january
    contract.pay_term(
        TermKey::new(2020010100),
        Settlement::new().payment(Payment::new(Money::from_major(372))),
    )?;

    for rent in &contract.rents {
        println!(
            "{}  due {:>8}  paid {:>6}  carried {:>8}",
            rent.term, rent.total.grand_total, rent.total.payment, rent.total.balance
        );
    }
    println!("outstanding: {}", contract.outstanding_balance());

    Ok(())
}
