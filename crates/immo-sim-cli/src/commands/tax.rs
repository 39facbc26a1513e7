use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use immo_sim_core::taxation::rental::{
    DeductibleCharges, FurnishedAssets, Household, IncentiveCommitment, RentalTaxInput,
    DEFAULT_BUILDING_YEARS, DEFAULT_COMMITMENT_YEARS, DEFAULT_FURNITURE_YEARS,
};
use immo_sim_core::taxation::{compare_regimes, simulate_tax_regime, TaxRegimeId};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RegimeArg {
    BareMicro,
    BareReal,
    FurnishedMicro,
    FurnishedReal,
    Incentive,
}

impl From<RegimeArg> for TaxRegimeId {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::BareMicro => TaxRegimeId::BareRentalMicro,
            RegimeArg::BareReal => TaxRegimeId::BareRentalReal,
            RegimeArg::FurnishedMicro => TaxRegimeId::FurnishedMicro,
            RegimeArg::FurnishedReal => TaxRegimeId::FurnishedReal,
            RegimeArg::Incentive => TaxRegimeId::IncentiveScheme,
        }
    }
}

/// Arguments for rental tax simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TaxArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Tax regime (ignored by compare-regimes)
    #[arg(long, value_enum)]
    pub regime: Option<RegimeArg>,

    /// Gross annual rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Annual loan interest
    #[arg(long, default_value = "0")]
    pub loan_interest: Decimal,

    /// Annual condominium fees
    #[arg(long, default_value = "0")]
    pub condo_fees: Decimal,

    /// Annual property tax
    #[arg(long, default_value = "0")]
    pub property_tax: Decimal,

    /// Annual insurance
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Annual maintenance works
    #[arg(long, default_value = "0")]
    pub maintenance: Decimal,

    /// Other deductible charges
    #[arg(long, default_value = "0")]
    pub other_charges: Decimal,

    /// Loan principal repaid over the year
    #[arg(long, default_value = "0")]
    pub principal_repaid: Decimal,

    /// Flat marginal tax rate (0.30 = 30%)
    #[arg(long)]
    pub marginal_rate: Option<Decimal>,

    /// Household taxable income excluding the rental
    #[arg(long)]
    pub other_income: Option<Decimal>,

    /// Number of household shares
    #[arg(long)]
    pub parts: Option<Decimal>,

    /// Property price (furnished depreciation and incentive scheme)
    #[arg(long)]
    pub property_price: Option<Decimal>,

    /// Furniture value
    #[arg(long, default_value = "0")]
    pub furniture: Decimal,

    /// Incentive zone: "A bis", "A", "B1", "B2"
    #[arg(long)]
    pub zone: Option<String>,

    /// Living area in square metres (incentive rent ceiling)
    #[arg(long)]
    pub surface: Option<Decimal>,

    /// Incentive commitment in years: 6, 9 or 12
    #[arg(long, default_value_t = DEFAULT_COMMITMENT_YEARS)]
    pub duration: u32,
}

impl TaxArgs {
    fn into_input(
        self,
        default_regime: Option<TaxRegimeId>,
    ) -> Result<RentalTaxInput, Box<dyn std::error::Error>> {
        if let Some(parsed) = input::from_file_or_stdin(self.input.as_deref())? {
            return Ok(parsed);
        }

        let regime = self
            .regime
            .map(TaxRegimeId::from)
            .or(default_regime)
            .ok_or("--regime is required (or provide --input)")?;

        let household = match (self.other_income, self.parts) {
            (None, None) => None,
            (income, parts) => Some(Household {
                other_taxable_income: income.unwrap_or(Decimal::ZERO),
                parts: parts.unwrap_or(Decimal::ONE),
            }),
        };

        let furnished = self.property_price.map(|price| FurnishedAssets {
            property_price: price,
            furniture_value: self.furniture,
            building_years: DEFAULT_BUILDING_YEARS,
            furniture_years: DEFAULT_FURNITURE_YEARS,
        });

        let incentive = match self.zone {
            Some(zone) => Some(IncentiveCommitment {
                acquisition_price: self
                    .property_price
                    .ok_or("--property-price is required with --zone")?,
                zone,
                surface: self.surface.ok_or("--surface is required with --zone")?,
                duration_years: self.duration,
            }),
            None => None,
        };

        Ok(RentalTaxInput {
            regime,
            annual_rent: self.rent.ok_or("--rent is required (or provide --input)")?,
            charges: DeductibleCharges {
                loan_interest: self.loan_interest,
                condo_fees: self.condo_fees,
                property_tax: self.property_tax,
                insurance: self.insurance,
                maintenance: self.maintenance,
                other: self.other_charges,
            },
            annual_principal_repaid: self.principal_repaid,
            marginal_tax_rate: self.marginal_rate,
            household,
            furnished,
            incentive,
        })
    }
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input = args.into_input(None)?;
    let output = simulate_tax_regime(&tax_input)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_compare_regimes(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input = args.into_input(Some(TaxRegimeId::BareRentalMicro))?;
    let output = compare_regimes(&tax_input)?;
    Ok(serde_json::to_value(output)?)
}
