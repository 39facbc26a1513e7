use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ImmoSimError;
use crate::types::{Money, Rate};
use crate::ImmoSimResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const IRR_FLOOR: Decimal = dec!(-0.9);
const IRR_CEILING: Decimal = dec!(10);

/// Net Present Value of a series of yearly cash flows, the first one undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ImmoSimResult<Money> {
    if rate <= dec!(-1) {
        return Err(ImmoSimError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let (value, _) = npv_and_derivative(rate, cash_flows).ok_or_else(|| {
        ImmoSimError::DivisionByZero {
            context: "NPV discount factor".into(),
        }
    })?;
    Ok(value)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// The search is bounded to [-90%, 1000%]; every step uses checked decimal
/// arithmetic so that extreme cash flows report a convergence failure instead
/// of overflowing.
pub fn irr(cash_flows: &[Money], guess: Rate) -> ImmoSimResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ImmoSimError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_outflow || !has_inflow {
        return Err(ImmoSimError::InsufficientData(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    let mut rate = guess.clamp(IRR_FLOOR, IRR_CEILING);
    let mut last_delta = Decimal::MAX;

    for i in 0..MAX_IRR_ITERATIONS {
        let (value, derivative) = npv_and_derivative(rate, cash_flows).ok_or_else(|| {
            ImmoSimError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta,
            }
        })?;
        last_delta = value;

        if value.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if derivative.is_zero() {
            break;
        }

        let step = value.checked_div(derivative).ok_or_else(|| {
            ImmoSimError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta,
            }
        })?;
        rate = (rate - step).clamp(IRR_FLOOR, IRR_CEILING);
    }

    Err(ImmoSimError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

/// NPV and its derivative with respect to the rate. `None` on overflow.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as u64);
            let term = (t_dec * cf).checked_div(discount.checked_mul(one_plus_r)?)?;
            derivative = derivative.checked_sub(term)?;
        }
    }

    Some((value, derivative))
}
