use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ImmoSimError;
use crate::financing::profitability::{
    break_even, profitability_ratios, BreakEven, ProfitabilityInput, ProfitabilityRatios,
};
use crate::financing::{Financing, PropertyAcquisition};
use crate::time_value::irr;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ImmoSimResult;

/// Length of the standard forward simulation.
pub const DEFAULT_HORIZON_YEARS: u32 = 20;
/// Longest accepted forward simulation.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Largest projected property value or monthly rent. Keeps every derived
/// yearly amount well inside the decimal range.
const VALUE_CEILING: Decimal = dec!(1000000000000000000000000);

const MONTHS_PER_YEAR: Decimal = dec!(12);
const IRR_GUESS: Rate = dec!(0.08);

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_YEARS
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Rent and running costs of the property once let.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingAssumptions {
    /// Monthly rent before vacancy
    pub monthly_rent: Money,
    /// Share of the year the property stays empty (0.05 = 5%)
    #[serde(default)]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub monthly_condo_fees: Money,
    #[serde(default)]
    pub annual_property_tax: Money,
    /// Landlord insurance, per month
    #[serde(default)]
    pub monthly_insurance: Money,
    /// Yearly rent indexation, applied from year 2
    #[serde(default)]
    pub rent_growth_rate: Rate,
    /// Yearly change in property value
    #[serde(default)]
    pub appreciation_rate: Rate,
}

impl OperatingAssumptions {
    /// Condo fees, insurance and property tax spread over twelve months.
    pub fn monthly_charges(&self) -> Money {
        self.monthly_condo_fees + self.monthly_insurance + self.annual_property_tax / MONTHS_PER_YEAR
    }

    /// (condo + insurance) × 12 + property tax
    pub fn annual_charges(&self) -> Money {
        (self.monthly_condo_fees + self.monthly_insurance) * MONTHS_PER_YEAR
            + self.annual_property_tax
    }

    /// Rent actually collected in a month once vacancy is taken out.
    pub fn effective_monthly_rent(&self) -> Money {
        self.monthly_rent * (Decimal::ONE - self.vacancy_rate)
    }

    pub fn validate(&self) -> ImmoSimResult<()> {
        if self.monthly_rent < Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "monthly_rent".into(),
                reason: "Rent cannot be negative".into(),
            });
        }
        if self.vacancy_rate < Decimal::ZERO || self.vacancy_rate >= Decimal::ONE {
            return Err(ImmoSimError::InvalidInput {
                field: "vacancy_rate".into(),
                reason: "Vacancy rate must be in [0, 1)".into(),
            });
        }
        if self.monthly_condo_fees < Decimal::ZERO
            || self.annual_property_tax < Decimal::ZERO
            || self.monthly_insurance < Decimal::ZERO
        {
            return Err(ImmoSimError::InvalidInput {
                field: "charges".into(),
                reason: "Operating charges cannot be negative".into(),
            });
        }
        if self.rent_growth_rate <= dec!(-1) || self.appreciation_rate <= dec!(-1) {
            return Err(ImmoSimError::InvalidInput {
                field: "growth".into(),
                reason: "Growth rates must be greater than -100%".into(),
            });
        }
        Ok(())
    }
}

/// Everything needed to analyse a buy-to-let purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
    pub acquisition: PropertyAcquisition,
    /// Cash brought by the investor
    #[serde(default)]
    pub down_payment: Money,
    /// Annual nominal loan rate (0.038 = 3.8%)
    pub annual_rate: Rate,
    pub term_years: u32,
    pub operating: OperatingAssumptions,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
}

impl InvestmentInput {
    pub fn financing(&self) -> Financing {
        Financing::from_down_payment(
            &self.acquisition,
            self.down_payment,
            self.annual_rate,
            self.term_years,
        )
    }

    pub fn validate(&self) -> ImmoSimResult<()> {
        self.acquisition.validate()?;
        self.operating.validate()?;
        if self.down_payment < Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "down_payment".into(),
                reason: "Down payment cannot be negative".into(),
            });
        }
        if self.horizon_years > MAX_HORIZON_YEARS {
            return Err(ImmoSimError::InvalidInput {
                field: "horizon_years".into(),
                reason: format!("Horizon cannot exceed {MAX_HORIZON_YEARS} years"),
            });
        }
        let horizon = self.horizon_years;
        let operating = &self.operating;
        if compounding_years(self.acquisition.price, operating.appreciation_rate, horizon)
            != Some(horizon)
        {
            return Err(ImmoSimError::InvalidInput {
                field: "appreciation_rate".into(),
                reason: "Property value grows out of the supported range over the horizon".into(),
            });
        }
        let rent_steps = horizon.saturating_sub(1);
        if compounding_years(operating.monthly_rent, operating.rent_growth_rate, rent_steps)
            != Some(rent_steps)
        {
            return Err(ImmoSimError::InvalidInput {
                field: "rent_growth_rate".into(),
                reason: "Rent grows out of the supported range over the horizon".into(),
            });
        }
        self.financing().validate()
    }
}

/// One year of the forward simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    pub property_value: Money,
    pub monthly_rent: Money,
    /// Rent collected over the year, net of vacancy
    pub annual_revenue: Money,
    pub annual_charges: Money,
    /// Loan payments made during the year
    pub debt_service: Money,
    pub cashflow: Money,
    pub remaining_balance: Money,
    /// Property value minus purchase price
    pub capital_gain: Money,
    /// Property value minus remaining balance
    pub net_equity: Money,
}

/// A projection ready to be walked year by year.
///
/// Nothing is computed until iterated, and every call to [`years`] starts again
/// from the acquisition so the same input always yields the same sequence.
///
/// [`years`]: InvestmentProjection::years
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentProjection {
    purchase_price: Money,
    financing: Financing,
    operating: OperatingAssumptions,
    horizon_years: u32,
}

/// Lazy iterator over the years of an [`InvestmentProjection`].
#[derive(Debug, Clone)]
pub struct ProjectionYears<'a> {
    projection: &'a InvestmentProjection,
    annual_payment: Money,
    year: u32,
    property_value: Money,
    monthly_rent: Money,
    balance: Money,
}

/// Summary of the projection over the whole horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub horizon_years: u32,
    pub first_year_cashflow: Money,
    pub cumulative_cashflow: Money,
    pub final_property_value: Money,
    pub final_net_equity: Money,
    pub total_capital_gain: Money,
    /// Yearly return on the down payment, resale at net equity in the last year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_irr: Option<Rate>,
}

/// Point-in-time metrics of an investment plus its forward projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAnalysis {
    pub total_cost: Money,
    pub notary_fees: Money,
    pub loan_principal: Money,
    pub monthly_payment: Money,
    /// All payments over the term
    pub total_credit_cost: Money,
    pub total_interest: Money,
    /// Rent collected per month net of vacancy
    pub monthly_net_rent: Money,
    pub monthly_charges: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    /// Annual rent / (price + renovation)
    pub gross_yield: Rate,
    /// (Rent net of vacancy - charges) / total cost
    pub net_yield: Rate,
    /// Net revenue / down payment
    pub roi: Rate,
    pub ratios: ProfitabilityRatios,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even: Option<BreakEven>,
    pub projection: Vec<YearProjection>,
    pub summary: ProjectionSummary,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

impl InvestmentProjection {
    pub fn new(
        acquisition: &PropertyAcquisition,
        financing: &Financing,
        operating: &OperatingAssumptions,
        horizon_years: u32,
    ) -> Self {
        // Stop before the first year whose value or rent would leave the supported range
        let value_years =
            compounding_years(acquisition.price, operating.appreciation_rate, horizon_years)
                .unwrap_or(0);
        let rent_years = compounding_years(
            operating.monthly_rent,
            operating.rent_growth_rate,
            horizon_years.saturating_sub(1),
        )
        .map_or(0, |steps| steps + 1);
        let reachable = horizon_years.min(value_years).min(rent_years);
        if reachable < horizon_years {
            warn!(
                requested = horizon_years,
                reachable, "projection truncated, compounded amounts leave the supported range"
            );
        }
        Self {
            purchase_price: acquisition.price,
            financing: financing.clone(),
            operating: operating.clone(),
            horizon_years: reachable,
        }
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    pub fn years(&self) -> ProjectionYears<'_> {
        ProjectionYears {
            projection: self,
            annual_payment: self.financing.monthly_payment() * MONTHS_PER_YEAR,
            year: 0,
            property_value: self.purchase_price,
            monthly_rent: self.operating.monthly_rent,
            balance: self.financing.principal,
        }
    }
}

impl<'a> IntoIterator for &'a InvestmentProjection {
    type Item = YearProjection;
    type IntoIter = ProjectionYears<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.years()
    }
}

impl Iterator for ProjectionYears<'_> {
    type Item = YearProjection;

    fn next(&mut self) -> Option<YearProjection> {
        let p = self.projection;
        if self.year >= p.horizon_years {
            return None;
        }
        self.year += 1;

        self.property_value *= Decimal::ONE + p.operating.appreciation_rate;
        if self.year > 1 {
            self.monthly_rent *= Decimal::ONE + p.operating.rent_growth_rate;
        }

        let annual_revenue =
            self.monthly_rent * MONTHS_PER_YEAR * (Decimal::ONE - p.operating.vacancy_rate);
        let annual_charges = p.operating.annual_charges();

        // Yearly interest approximated as balance × annual rate, not the monthly schedule
        let debt_service = if self.year <= p.financing.term_years {
            let principal_repaid =
                self.annual_payment - self.balance * p.financing.annual_rate;
            self.balance -= principal_repaid;
            self.annual_payment
        } else {
            self.balance = Decimal::ZERO;
            Decimal::ZERO
        };

        let remaining_balance = self.balance.max(Decimal::ZERO);

        Some(YearProjection {
            year: self.year,
            property_value: self.property_value,
            monthly_rent: self.monthly_rent,
            annual_revenue,
            annual_charges,
            debt_service,
            cashflow: annual_revenue - annual_charges - debt_service,
            remaining_balance,
            capital_gain: self.property_value - p.purchase_price,
            net_equity: self.property_value - remaining_balance,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.projection.horizon_years.saturating_sub(self.year) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ProjectionYears<'_> {}

/// Number of yearly compounding steps, up to `steps`, that keep `start` at or
/// below the value ceiling. `None` when `start` is already above it.
fn compounding_years(start: Decimal, rate: Rate, steps: u32) -> Option<u32> {
    if start.abs() > VALUE_CEILING {
        return None;
    }
    let factor = Decimal::ONE + rate;
    let mut value = start;
    for year in 0..steps {
        match value.checked_mul(factor) {
            Some(next) if next.abs() <= VALUE_CEILING => value = next,
            _ => return Some(year),
        }
    }
    Some(steps)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Set up the year-by-year simulation of value, rent, debt and equity.
pub fn project_investment(
    acquisition: &PropertyAcquisition,
    financing: &Financing,
    operating: &OperatingAssumptions,
    horizon_years: u32,
) -> InvestmentProjection {
    InvestmentProjection::new(acquisition, financing, operating, horizon_years)
}

/// Cost, financing, cashflow, yields and the projection summary of one investment.
pub fn analyze_investment(
    input: &InvestmentInput,
) -> ImmoSimResult<ComputationOutput<InvestmentAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.validate()?;

    let acquisition = &input.acquisition;
    let operating = &input.operating;
    let total_cost = acquisition.total_cost();

    if input.down_payment > total_cost {
        warnings.push(format!(
            "Down payment {} exceeds the total cost {}, nothing is borrowed",
            input.down_payment, total_cost
        ));
    }
    let financing = input.financing();
    if input.down_payment.is_zero() && financing.principal > Decimal::ZERO {
        warnings.push("No down payment: the purchase is fully financed".into());
    }

    debug!(
        total_cost = %total_cost,
        principal = %financing.principal,
        horizon = input.horizon_years,
        "analyzing investment"
    );

    let monthly_payment = financing.monthly_payment();
    let monthly_net_rent = operating.effective_monthly_rent();
    let monthly_charges = operating.monthly_charges();
    let monthly_cashflow = monthly_net_rent - monthly_charges - monthly_payment;
    let annual_cashflow = monthly_cashflow * MONTHS_PER_YEAR;

    let annual_rent = operating.monthly_rent * MONTHS_PER_YEAR;
    let annual_charges = monthly_charges * MONTHS_PER_YEAR;
    let net_revenue = monthly_net_rent * MONTHS_PER_YEAR - annual_charges;

    let gross_yield = ratio(annual_rent, acquisition.price_with_renovation());
    let net_yield = ratio(net_revenue, total_cost);
    let roi = if input.down_payment > Decimal::ZERO {
        net_revenue / input.down_payment
    } else {
        Decimal::ZERO
    };

    let ratios = profitability_ratios(&ProfitabilityInput {
        acquisition_cost: total_cost,
        annual_rent: monthly_net_rent * MONTHS_PER_YEAR,
        annual_charges,
        down_payment: input.down_payment,
        annual_cashflow,
    });
    let break_even = break_even(monthly_charges + monthly_payment, operating.monthly_rent);
    if let Some(ref be) = break_even {
        if be.minimum_occupancy > Decimal::ONE {
            warnings.push("Rent does not cover charges and loan payments even at full occupancy".into());
        }
    }

    let projection: Vec<YearProjection> =
        project_investment(acquisition, &financing, operating, input.horizon_years)
            .years()
            .collect();
    let summary = summarize(&projection, input.down_payment, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Buy-to-let analysis with annual forward projection",
        input,
        warnings,
        elapsed,
        InvestmentAnalysis {
            total_cost,
            notary_fees: acquisition.notary_fees(),
            loan_principal: financing.principal,
            monthly_payment,
            total_credit_cost: financing.total_paid(),
            total_interest: financing.total_interest(),
            monthly_net_rent,
            monthly_charges,
            monthly_cashflow,
            annual_cashflow,
            gross_yield,
            net_yield,
            roi,
            ratios,
            break_even,
            projection,
            summary,
        },
    ))
}

fn summarize(
    projection: &[YearProjection],
    down_payment: Money,
    warnings: &mut Vec<String>,
) -> ProjectionSummary {
    let last = projection.last();
    let cumulative_cashflow: Money = projection.iter().map(|y| y.cashflow).sum();

    let equity_irr = match last {
        Some(last) if down_payment > Decimal::ZERO => {
            let mut flows = Vec::with_capacity(projection.len() + 1);
            flows.push(-down_payment);
            flows.extend(projection.iter().map(|y| y.cashflow));
            if let Some(final_flow) = flows.last_mut() {
                *final_flow += last.net_equity;
            }
            match irr(&flows, IRR_GUESS) {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warn!(error = %e, "equity IRR did not converge");
                    warnings.push(format!("Equity IRR unavailable: {e}"));
                    None
                }
            }
        }
        _ => None,
    };

    ProjectionSummary {
        horizon_years: projection.len() as u32,
        first_year_cashflow: projection.first().map_or(Decimal::ZERO, |y| y.cashflow),
        cumulative_cashflow,
        final_property_value: last.map_or(Decimal::ZERO, |y| y.property_value),
        final_net_equity: last.map_or(Decimal::ZERO, |y| y.net_equity),
        total_capital_gain: last.map_or(Decimal::ZERO, |y| y.capital_gain),
        equity_irr,
    }
}

fn ratio(numerator: Money, denominator: Money) -> Rate {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
