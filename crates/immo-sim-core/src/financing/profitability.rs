use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Inputs for the headline return ratios of a rental.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitabilityInput {
    /// Amount the yields are measured against (price, or all-in cost)
    pub acquisition_cost: Money,
    /// Gross annual rent
    pub annual_rent: Money,
    /// Annual charges borne by the owner
    pub annual_charges: Money,
    /// Cash put in by the investor
    pub down_payment: Money,
    /// Annual cashflow after debt service
    pub annual_cashflow: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    /// Annual rent / acquisition cost
    pub gross_yield: Rate,
    /// (Annual rent - charges) / acquisition cost
    pub net_yield: Rate,
    /// Net revenue / down payment
    pub roi: Rate,
    /// Annual cashflow / down payment
    pub cash_on_cash: Rate,
    /// Unlevered capitalisation rate, same basis as the net yield
    pub cap_rate: Rate,
}

/// Occupancy needed for rent to cover fixed charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEven {
    pub minimum_occupancy: Rate,
    pub minimum_rented_days: Decimal,
    pub safety_margin: Rate,
}

/// Yield and return ratios. Any ratio whose denominator is zero is reported as zero.
pub fn profitability_ratios(input: &ProfitabilityInput) -> ProfitabilityRatios {
    let net_revenue = input.annual_rent - input.annual_charges;

    let gross_yield = ratio(input.annual_rent, input.acquisition_cost);
    let net_yield = ratio(net_revenue, input.acquisition_cost);
    let (roi, cash_on_cash) = if input.down_payment > Decimal::ZERO {
        (
            net_revenue / input.down_payment,
            input.annual_cashflow / input.down_payment,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    ProfitabilityRatios {
        gross_yield,
        net_yield,
        roi,
        cash_on_cash,
        cap_rate: net_yield,
    }
}

/// Break-even occupancy given monthly fixed charges (debt service included)
/// and the monthly rent. `None` when there is no rent to cover anything with.
pub fn break_even(monthly_fixed_charges: Money, monthly_rent: Money) -> Option<BreakEven> {
    if monthly_rent <= Decimal::ZERO {
        return None;
    }

    let minimum_occupancy = monthly_fixed_charges / monthly_rent;
    Some(BreakEven {
        minimum_occupancy,
        minimum_rented_days: minimum_occupancy * DAYS_PER_YEAR,
        safety_margin: Decimal::ONE - minimum_occupancy,
    })
}

fn ratio(numerator: Money, denominator: Money) -> Rate {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProfitabilityInput {
        ProfitabilityInput {
            acquisition_cost: dec!(200_000),
            annual_rent: dec!(12_000),
            annual_charges: dec!(2_000),
            down_payment: dec!(40_000),
            annual_cashflow: dec!(1_200),
        }
    }

    #[test]
    fn test_yields() {
        let r = profitability_ratios(&sample());
        assert_eq!(r.gross_yield, dec!(0.06));
        assert_eq!(r.net_yield, dec!(0.05));
        assert_eq!(r.cap_rate, r.net_yield);
    }

    #[test]
    fn test_returns_on_down_payment() {
        let r = profitability_ratios(&sample());
        assert_eq!(r.roi, dec!(0.25));
        assert_eq!(r.cash_on_cash, dec!(0.03));
    }

    #[test]
    fn test_no_down_payment_returns_zero() {
        let mut input = sample();
        input.down_payment = Decimal::ZERO;
        let r = profitability_ratios(&input);
        assert_eq!(r.roi, Decimal::ZERO);
        assert_eq!(r.cash_on_cash, Decimal::ZERO);
    }

    #[test]
    fn test_zero_cost_does_not_divide() {
        let mut input = sample();
        input.acquisition_cost = Decimal::ZERO;
        assert_eq!(profitability_ratios(&input).gross_yield, Decimal::ZERO);
    }

    #[test]
    fn test_break_even() {
        let be = break_even(dec!(600), dec!(800)).unwrap();
        assert_eq!(be.minimum_occupancy, dec!(0.75));
        assert_eq!(be.minimum_rented_days, dec!(273.75));
        assert_eq!(be.safety_margin, dec!(0.25));
    }

    #[test]
    fn test_break_even_without_rent() {
        assert!(break_even(dec!(600), Decimal::ZERO).is_none());
    }
}
