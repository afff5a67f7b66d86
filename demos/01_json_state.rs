/// json state - explicit save/load of a loan portfolio
use chrono::{NaiveDate, TimeZone, Utc};
use emi_engine_rs::{Loan, LoanStore, Money, Rate, SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== portfolio save/load ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));

    let mut store = LoanStore::new();

    let car = store.add(
        Loan::builder()
            .name("car loan")
            .principal(Money::from_major(500_000))
            .annual_rate(Rate::from_percentage(dec!(9.25)))
            .term_months(60)
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .build(&time)?,
    );
    store.add(
        Loan::builder()
            .name("phone emi")
            .principal(Money::from_major(24_000))
            .annual_rate(Rate::ZERO)
            .term_months(12)
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .build(&time)?,
    );

    // three months of car payments
    for _ in 0..3 {
        store.apply_payment(car, &time)?;
    }

    println!("loans:               {}", store.len());
    println!("active:              {}", store.active_count());
    println!("total outstanding:   {}", store.total_outstanding().round_dp(2));
    println!("monthly commitment:  {}\n", store.monthly_commitment().round_dp(2));

    // nothing was persisted implicitly; save is an explicit call
    let saved = store.save_to_string()?;
    println!("saved {} bytes of json\n", saved.len());

    let restored = LoanStore::load_from_str(&saved)?;
    println!("restored loans:      {}", restored.len());
    println!(
        "restored state:\n{}",
        restored.get(car)?.json()
    );

    Ok(())
}
