use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use immo_sim_core::financing::acquisition::DEFAULT_NOTARY_FEE_RATE;
use immo_sim_core::financing::PropertyAcquisition;
use immo_sim_core::projection::investment::DEFAULT_HORIZON_YEARS;
use immo_sim_core::projection::{
    analyze_investment, project_investment, InvestmentInput, OperatingAssumptions,
    YearProjection,
};

use crate::input;

/// Purchase, loan and letting assumptions shared by `analyze` and `project`
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct InvestmentFlags {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Living area in square metres
    #[arg(long)]
    pub surface: Option<Decimal>,

    /// Renovation budget
    #[arg(long, default_value = "0")]
    pub renovation: Decimal,

    /// Notary fees as a fraction of the price
    #[arg(long)]
    pub notary_rate: Option<Decimal>,

    /// Cash brought by the investor
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Annual loan rate as a decimal (0.038 = 3.8%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Monthly rent before vacancy
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Vacancy as a fraction of the year
    #[arg(long, default_value = "0")]
    pub vacancy: Decimal,

    /// Monthly condominium fees
    #[arg(long, default_value = "0")]
    pub condo_fees: Decimal,

    /// Annual property tax
    #[arg(long, default_value = "0")]
    pub property_tax: Decimal,

    /// Monthly landlord insurance
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Yearly rent indexation
    #[arg(long, default_value = "0")]
    pub rent_growth: Decimal,

    /// Yearly property appreciation
    #[arg(long, default_value = "0")]
    pub appreciation: Decimal,

    /// Projection horizon in years
    #[arg(long)]
    pub horizon: Option<u32>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub investment: InvestmentFlags,
}

#[derive(Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub investment: InvestmentFlags,
}

impl InvestmentFlags {
    fn into_input(self) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
        if let Some(parsed) = input::from_file_or_stdin(self.input.as_deref())? {
            return Ok(parsed);
        }

        let acquisition = PropertyAcquisition {
            price: self.price.ok_or("--price is required (or provide --input)")?,
            surface: self.surface.ok_or("--surface is required (or provide --input)")?,
            renovation_cost: self.renovation,
            notary_fee_rate: self.notary_rate.unwrap_or(DEFAULT_NOTARY_FEE_RATE),
        };
        Ok(InvestmentInput {
            acquisition,
            down_payment: self.down_payment,
            annual_rate: self.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: self.term.ok_or("--term is required (or provide --input)")?,
            operating: OperatingAssumptions {
                monthly_rent: self.rent.ok_or("--rent is required (or provide --input)")?,
                vacancy_rate: self.vacancy,
                monthly_condo_fees: self.condo_fees,
                annual_property_tax: self.property_tax,
                monthly_insurance: self.insurance,
                rent_growth_rate: self.rent_growth,
                appreciation_rate: self.appreciation,
            },
            horizon_years: self.horizon.unwrap_or(DEFAULT_HORIZON_YEARS),
        })
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = args.investment.into_input()?;
    let output = analyze_investment(&investment)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = args.investment.into_input()?;
    investment.validate()?;

    let years: Vec<YearProjection> = project_investment(
        &investment.acquisition,
        &investment.financing(),
        &investment.operating,
        investment.horizon_years,
    )
    .years()
    .collect();
    Ok(serde_json::to_value(years)?)
}
