/// quick start - open a loan, pay it down, watch it complete
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use emi_engine_rs::{Loan, LoanStatus, Money, Rate, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== emi quick start ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    // 100,000 at 8.5% over 12 months
    let mut loan = Loan::builder()
        .name("bike loan")
        .principal(Money::from_major(100_000))
        .annual_rate(Rate::from_percentage(rust_decimal_macros::dec!(8.5)))
        .term_months(12)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .build(&time)?;

    println!("principal:       {}", loan.principal);
    println!("monthly payment: {}", loan.monthly_payment.round_dp(2));
    println!("total payable:   {}", loan.total_payable().round_dp(2));
    println!("first due date:  {}\n", loan.next_due_date);

    // print the amortization breakdown
    let schedule = loan.schedule()?;
    println!("  #  due date     principal     interest      balance");
    for inst in &schedule.installments {
        println!(
            "{:>3}  {}  {:>11}  {:>11}  {:>11}",
            inst.number,
            inst.due_date,
            inst.principal_portion.round_dp(2),
            inst.interest_portion.round_dp(2),
            inst.ending_balance.round_dp(2),
        );
    }
    println!("total interest: {}\n", schedule.total_interest.round_dp(2));

    // pay every month until done
    let mut events = emi_engine_rs::EventStore::new();
    while loan.status == LoanStatus::Active {
        controller.advance(Duration::days(30));
        let receipt = loan.apply_payment(&time, &mut events)?;
        println!(
            "payment {:>2}: paid {} | remaining {} | progress {}%",
            receipt.payment_number,
            loan.total_paid.round_dp(2),
            loan.outstanding().round_dp(2),
            loan.progress().as_percentage().round_dp(1),
        );
    }

    println!("\nstatus: {:?}", loan.status);
    println!("events emitted: {}", events.events().len());

    Ok(())
}
