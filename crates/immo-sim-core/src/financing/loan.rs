use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ImmoSimError;
use crate::financing::acquisition::PropertyAcquisition;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ImmoSimResult;

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed-rate mortgage terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financing {
    /// Amount borrowed
    pub principal: Money,
    /// Annual nominal rate (0.038 = 3.8%)
    pub annual_rate: Rate,
    /// Loan term in years
    pub term_years: u32,
}

/// One month of the amortization table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

/// Twelve months of the amortization table rolled up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub payments: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub months: Vec<AmortizationRow>,
    pub years: Vec<AmortizationYear>,
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

impl Financing {
    pub fn new(principal: Money, annual_rate: Rate, term_years: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_years,
        }
    }

    /// Borrow whatever the down payment does not cover. A down payment larger
    /// than the total cost is a cash purchase: the principal floors at zero.
    pub fn from_down_payment(
        acquisition: &PropertyAcquisition,
        down_payment: Money,
        annual_rate: Rate,
        term_years: u32,
    ) -> Self {
        let principal = (acquisition.total_cost() - down_payment).max(Decimal::ZERO);
        Self::new(principal, annual_rate, term_years)
    }

    pub fn months(&self) -> u32 {
        self.term_years * MONTHS_PER_YEAR
    }

    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(MONTHS_PER_YEAR)
    }

    pub fn monthly_payment(&self) -> Money {
        monthly_payment(self.principal, self.annual_rate, self.term_years)
    }

    /// Sum of every monthly payment over the term.
    pub fn total_paid(&self) -> Money {
        self.monthly_payment() * Decimal::from(self.months())
    }

    /// Total credit cost. Zero for an interest-free or zero-term loan.
    pub fn total_interest(&self) -> Money {
        if self.annual_rate.is_zero() || self.term_years == 0 {
            return Decimal::ZERO;
        }
        self.total_paid() - self.principal
    }

    pub fn validate(&self) -> ImmoSimResult<()> {
        if self.principal < Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "principal".into(),
                reason: "Loan principal cannot be negative".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO || self.annual_rate >= Decimal::ONE {
            return Err(ImmoSimError::InvalidInput {
                field: "annual_rate".into(),
                reason: "Annual rate must be between 0 and 1 (0.038 = 3.8%)".into(),
            });
        }
        if self.term_years > 50 {
            return Err(ImmoSimError::InvalidInput {
                field: "term_years".into(),
                reason: "Loan term cannot exceed 50 years".into(),
            });
        }
        Ok(())
    }
}

/// Standard fixed-rate mortgage payment: P * r(1+r)^n / ((1+r)^n - 1).
///
/// A zero term means nothing is borrowed over time and the payment is zero.
/// A zero rate amortises in a straight line, P / n.
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_years: u32) -> Money {
    if term_years == 0 {
        return Decimal::ZERO;
    }

    let n = term_years * MONTHS_PER_YEAR;
    if annual_rate.is_zero() {
        return principal / Decimal::from(n);
    }

    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    let compound = (Decimal::ONE + monthly_rate).powi(n as i64);
    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        // Only reachable through decimal underflow of a vanishing rate
        return principal / Decimal::from(n);
    }

    principal * monthly_rate * compound / denominator
}

/// Exact outstanding balance after `months` payments, following the same
/// monthly recurrence as the amortization table.
pub fn balance_after_months(financing: &Financing, months: u32) -> Money {
    let total = financing.months();
    if total == 0 {
        return financing.principal;
    }
    if months >= total {
        return Decimal::ZERO;
    }

    let payment = financing.monthly_payment();
    let monthly_rate = financing.monthly_rate();
    let mut balance = financing.principal;
    for _ in 0..months {
        let interest = balance * monthly_rate;
        balance -= payment - interest;
    }
    balance.max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the month-by-month amortization table of a fixed-rate loan.
///
/// The last month repays whatever balance is left so the table always closes
/// at exactly zero and the principal column sums to the amount borrowed.
pub fn amortization_schedule(
    financing: &Financing,
) -> ImmoSimResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    financing.validate()?;

    debug!(
        principal = %financing.principal,
        annual_rate = %financing.annual_rate,
        term_years = financing.term_years,
        "building amortization schedule"
    );

    let schedule = if financing.term_years == 0 {
        warnings.push("Loan term is zero: no repayment schedule".into());
        AmortizationSchedule {
            monthly_payment: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            months: Vec::new(),
            years: Vec::new(),
        }
    } else {
        if financing.annual_rate.is_zero() {
            warnings.push("Zero interest rate: principal repaid in equal instalments".into());
        }
        if financing.principal.is_zero() {
            warnings.push("Nothing borrowed: every payment is zero".into());
        }
        build_schedule(financing)
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fixed-rate annuity amortization (monthly compounding)",
        financing,
        warnings,
        elapsed,
        schedule,
    ))
}

fn build_schedule(financing: &Financing) -> AmortizationSchedule {
    let n = financing.months();
    let payment = financing.monthly_payment();
    let monthly_rate = financing.monthly_rate();

    let mut months = Vec::with_capacity(n as usize);
    let mut balance = financing.principal;

    for month in 1..=n {
        let interest = balance * monthly_rate;
        let mut principal = payment - interest;
        let mut month_payment = payment;
        if month == n {
            principal = balance;
            month_payment = interest + principal;
        }
        balance = (balance - principal).max(Decimal::ZERO);

        months.push(AmortizationRow {
            month,
            payment: month_payment,
            interest,
            principal,
            remaining_balance: balance,
        });
    }

    let years = roll_up_years(&months);
    let total_paid: Money = months.iter().map(|r| r.payment).sum();
    let total_interest: Money = months.iter().map(|r| r.interest).sum();

    AmortizationSchedule {
        monthly_payment: payment,
        total_paid,
        total_interest,
        months,
        years,
    }
}

fn roll_up_years(months: &[AmortizationRow]) -> Vec<AmortizationYear> {
    months
        .chunks(MONTHS_PER_YEAR as usize)
        .enumerate()
        .map(|(i, chunk)| AmortizationYear {
            year: i as u32 + 1,
            payments: chunk.iter().map(|r| r.payment).sum(),
            interest: chunk.iter().map(|r| r.interest).sum(),
            principal: chunk.iter().map(|r| r.principal).sum(),
            closing_balance: chunk
                .last()
                .map(|r| r.remaining_balance)
                .unwrap_or(Decimal::ZERO),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan() -> Financing {
        Financing::new(dec!(200_000), dec!(0.038), 20)
    }

    #[test]
    fn test_monthly_payment_sanity() {
        // 200k at 3.8% over 20 years ≈ 1,190.99 / month
        let pmt = loan().monthly_payment();
        assert!((pmt - dec!(1190.99)).abs() < dec!(0.01), "payment = {pmt}");
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let f = Financing::new(dec!(120_000), Decimal::ZERO, 10);
        assert_eq!(f.monthly_payment(), dec!(1000));
        assert_eq!(f.total_interest(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_term_pays_nothing() {
        let f = Financing::new(dec!(120_000), dec!(0.04), 0);
        assert_eq!(f.monthly_payment(), Decimal::ZERO);
        assert_eq!(f.total_interest(), Decimal::ZERO);
        let out = amortization_schedule(&f).unwrap();
        assert!(out.result.months.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let out = amortization_schedule(&loan()).unwrap();
        let s = &out.result;
        assert_eq!(s.months.len(), 240);
        assert_eq!(s.months.last().unwrap().remaining_balance, Decimal::ZERO);
        let repaid: Money = s.months.iter().map(|r| r.principal).sum();
        assert!((repaid - dec!(200_000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_first_month_split() {
        let out = amortization_schedule(&loan()).unwrap();
        let first = &out.result.months[0];
        // 200,000 × 0.038 / 12
        assert_eq!(first.interest.round_dp(2), dec!(633.33));
        assert_eq!(first.principal, first.payment - first.interest);
    }

    #[test]
    fn test_yearly_roll_up() {
        let out = amortization_schedule(&loan()).unwrap();
        let s = &out.result;
        assert_eq!(s.years.len(), 20);
        assert_eq!(s.years[0].closing_balance, s.months[11].remaining_balance);
        let interest: Money = s.years.iter().map(|y| y.interest).sum();
        assert!((interest - s.total_interest).abs() < dec!(0.000001));
    }

    #[test]
    fn test_total_interest_matches_schedule() {
        let f = loan();
        let out = amortization_schedule(&f).unwrap();
        assert!((out.result.total_interest - f.total_interest()).abs() < dec!(0.0001));
    }

    #[test]
    fn test_balance_after_months_matches_table() {
        let f = loan();
        let out = amortization_schedule(&f).unwrap();
        let after_five_years = balance_after_months(&f, 60);
        assert_eq!(after_five_years, out.result.months[59].remaining_balance);
        assert_eq!(balance_after_months(&f, 240), Decimal::ZERO);
    }

    #[test]
    fn test_down_payment_above_cost_borrows_nothing() {
        let acq = PropertyAcquisition::new(dec!(100_000), dec!(30));
        let f = Financing::from_down_payment(&acq, dec!(500_000), dec!(0.03), 15);
        assert_eq!(f.principal, Decimal::ZERO);
        assert_eq!(f.monthly_payment(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let f = Financing::new(dec!(1000), dec!(-0.01), 5);
        assert!(matches!(
            amortization_schedule(&f),
            Err(ImmoSimError::InvalidInput { .. })
        ));
    }
}
