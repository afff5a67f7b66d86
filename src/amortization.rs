use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::{EmiError, Result};
use crate::types::LoanId;

/// advance a date by whole calendar months
///
/// end-of-month overflow is clamped, never rolled over: Jan 31 + 1 month is
/// Feb 29 in a leap year, Feb 28 otherwise. note that clamping drifts the
/// day-of-month after a short month (Jan 31 -> Feb 29 -> Mar 29).
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| EmiError::InvalidDate {
            message: format!("{} + {} months out of range", date, months),
        })
}

/// fixed monthly payment that fully amortizes `principal` over `term_months`
/// at the given nominal annual rate compounded monthly
///
/// EMI = P * r * (1 + r)^n / ((1 + r)^n - 1), r = annual / 12.
/// a zero rate degenerates to the linear `principal / term` payment; a
/// negative rate is rejected.
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_months: u32) -> Result<Money> {
    if !principal.is_positive() {
        return Err(EmiError::InvalidPrincipal { amount: principal });
    }
    if annual_rate.is_negative() {
        return Err(EmiError::InvalidRate { rate: annual_rate });
    }
    if term_months == 0 {
        return Err(EmiError::InvalidTerm { months: term_months });
    }

    let monthly_rate = annual_rate.monthly_rate().as_decimal();

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let r = monthly_rate;
    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..term_months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    Ok(Money::from_decimal(numerator / denominator))
}

/// one installment in an amortization schedule
#[derive(Debug, Clone, PartialEq)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
}

/// full principal/interest breakdown of an equal-installment loan
#[derive(Debug, Clone)]
pub struct AmortizationSchedule {
    pub loan_id: LoanId,
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub monthly_payment: Money,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the schedule; installment due dates run monthly from the
    /// month after `start_date`
    pub fn generate(
        loan_id: LoanId,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let emi = monthly_payment(principal, annual_rate, term_months)?;
        let monthly_rate = annual_rate.monthly_rate().as_decimal();

        let mut installments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;
        let mut cumulative_principal = Money::ZERO;

        for i in 1..=term_months {
            let due_date = add_months(start_date, i)?;
            let interest_portion = Money::from_decimal(balance.as_decimal() * monthly_rate);
            let principal_portion = emi - interest_portion;

            cumulative_interest += interest_portion;
            cumulative_principal += principal_portion;

            let ending_balance = (balance - principal_portion).max(Money::ZERO);

            installments.push(Installment {
                number: i,
                due_date,
                beginning_balance: balance,
                payment_amount: emi,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_principal,
                cumulative_interest,
            });

            balance = ending_balance;
        }

        // fold sub-unit rounding residue into the final installment
        if let Some(last) = installments.last_mut() {
            if last.ending_balance > Money::ZERO && last.ending_balance < Money::from_major(1) {
                last.principal_portion += last.ending_balance;
                last.payment_amount += last.ending_balance;
                last.ending_balance = Money::ZERO;
            }
        }

        let total_interest = installments
            .iter()
            .map(|p| p.interest_portion)
            .fold(Money::ZERO, |acc, x| acc + x);

        let total_payment = installments
            .iter()
            .map(|p| p.payment_amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            loan_id,
            principal,
            annual_rate,
            term_months,
            start_date,
            monthly_payment: emi,
            installments,
            total_interest,
            total_payment,
        })
    }

    /// get installment by 1-based number
    pub fn installment(&self, number: u32) -> Option<&Installment> {
        self.installments.get(number.saturating_sub(1) as usize)
    }

    /// remaining balance after the given installment
    pub fn balance_after(&self, number: u32) -> Money {
        self.installment(number)
            .map(|p| p.ending_balance)
            .unwrap_or(self.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_emi_formula_exact() {
        // independently verified: 100000 at 8.5% nominal annual over 12 months
        let emi = monthly_payment(
            Money::from_major(100_000),
            Rate::from_percentage(dec!(8.5)),
            12,
        )
        .unwrap();

        assert_eq!(emi, Money::from_str_exact("8721.97824601").unwrap());
    }

    #[test]
    fn test_amortization_closure() {
        // total repaid always exceeds principal when interest is positive
        let principal = Money::from_major(100_000);
        let emi = monthly_payment(principal, Rate::from_percentage(dec!(8.5)), 12).unwrap();

        assert!(emi * dec!(12) > principal);
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let emi = monthly_payment(Money::from_major(12_000), Rate::ZERO, 12).unwrap();
        assert_eq!(emi, Money::from_major(1_000));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let rate = Rate::from_percentage(dec!(8.5));

        assert!(matches!(
            monthly_payment(Money::ZERO, rate, 12),
            Err(EmiError::InvalidPrincipal { .. })
        ));
        assert!(matches!(
            monthly_payment(Money::from_major(-5_000), rate, 12),
            Err(EmiError::InvalidPrincipal { .. })
        ));
        assert!(matches!(
            monthly_payment(
                Money::from_major(100_000),
                Rate::from_percentage(dec!(-1)),
                12
            ),
            Err(EmiError::InvalidRate { .. })
        ));
        assert!(matches!(
            monthly_payment(Money::from_major(100_000), rate, 0),
            Err(EmiError::InvalidTerm { months: 0 })
        ));
    }

    #[test]
    fn test_end_of_month_clamping() {
        assert_eq!(add_months(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(add_months(date(2023, 1, 31), 1).unwrap(), date(2023, 2, 28));
        assert_eq!(add_months(date(2024, 3, 31), 1).unwrap(), date(2024, 4, 30));
        // mid-month days are preserved
        assert_eq!(add_months(date(2024, 1, 15), 1).unwrap(), date(2024, 2, 15));
        // clamped day drifts after the short month
        assert_eq!(add_months(date(2024, 2, 29), 1).unwrap(), date(2024, 3, 29));
    }

    #[test]
    fn test_schedule_fully_amortizes() {
        let schedule = AmortizationSchedule::generate(
            Uuid::new_v4(),
            Money::from_major(100_000),
            Rate::from_percentage(dec!(8.5)),
            12,
            date(2024, 1, 1),
        )
        .unwrap();

        assert_eq!(schedule.installments.len(), 12);
        assert_eq!(schedule.installments[11].ending_balance, Money::ZERO);
        assert_eq!(
            schedule.total_interest,
            Money::from_str_exact("4663.73895211").unwrap()
        );
        assert_eq!(schedule.total_payment, schedule.monthly_payment * dec!(12));
        // closure up to the final clamp residue of at most 1e-8
        let closure_gap =
            (schedule.total_payment - (schedule.principal + schedule.total_interest)).abs();
        assert!(closure_gap <= Money::from_str_exact("0.00000001").unwrap());
    }

    #[test]
    fn test_schedule_interest_declines() {
        let schedule = AmortizationSchedule::generate(
            Uuid::new_v4(),
            Money::from_major(50_000),
            Rate::from_percentage(12u32),
            24,
            date(2024, 1, 1),
        )
        .unwrap();

        for pair in schedule.installments.windows(2) {
            assert!(pair[1].interest_portion < pair[0].interest_portion);
            assert!(pair[1].principal_portion > pair[0].principal_portion);
        }
    }

    #[test]
    fn test_schedule_due_dates_monthly() {
        let schedule = AmortizationSchedule::generate(
            Uuid::new_v4(),
            Money::from_major(10_000),
            Rate::from_percentage(10u32),
            3,
            date(2024, 1, 31),
        )
        .unwrap();

        assert_eq!(schedule.installments[0].due_date, date(2024, 2, 29));
        assert_eq!(schedule.installments[1].due_date, date(2024, 3, 31));
        assert_eq!(schedule.installments[2].due_date, date(2024, 4, 30));
    }
}
