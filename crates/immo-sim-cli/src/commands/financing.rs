use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use immo_sim_core::financing::loan::{self, Financing};
use immo_sim_core::taxation::brackets;

use crate::input;

/// Arguments for a loan amortization table
#[derive(Args)]
pub struct AmortizationArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual nominal rate as a decimal (0.038 = 3.8%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Only keep the yearly roll-up
    #[arg(long)]
    pub yearly: bool,
}

/// Arguments for household income tax
#[derive(Args)]
pub struct IncomeTaxArgs {
    #[arg(long)]
    pub input: Option<String>,

    /// Household taxable income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Number of household shares
    #[arg(long, default_value = "1")]
    pub parts: Decimal,
}

/// Arguments for the real-estate wealth tax
#[derive(Args)]
pub struct WealthTaxArgs {
    #[arg(long)]
    pub input: Option<String>,

    /// Taxable real-estate net worth
    #[arg(long)]
    pub net_worth: Option<Decimal>,
}

#[derive(Deserialize)]
struct IncomeTaxInput {
    taxable_income: Decimal,
    #[serde(default = "one_part")]
    parts: Decimal,
}

fn one_part() -> Decimal {
    Decimal::ONE
}

#[derive(Deserialize)]
struct WealthTaxInput {
    net_worth: Decimal,
}

pub fn run_amortization(args: AmortizationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let financing: Financing = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(financing) => financing,
        None => Financing::new(
            args.principal
                .ok_or("--principal is required (or provide --input)")?,
            args.rate.ok_or("--rate is required (or provide --input)")?,
            args.years.ok_or("--years is required (or provide --input)")?,
        ),
    };

    amortization(&financing, args.yearly)
}

fn amortization(financing: &Financing, yearly: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let mut output = loan::amortization_schedule(financing)?;
    if yearly {
        output.result.months.clear();
    }
    Ok(serde_json::to_value(output)?)
}

pub fn run_income_tax(args: IncomeTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input = match input::from_file_or_stdin::<IncomeTaxInput>(args.input.as_deref())? {
        Some(tax_input) => tax_input,
        None => IncomeTaxInput {
            taxable_income: args
                .income
                .ok_or("--income is required (or provide --input)")?,
            parts: args.parts,
        },
    };
    if tax_input.parts <= Decimal::ZERO {
        return Err("parts must be positive".into());
    }

    let assessment = brackets::assess_income_tax(tax_input.taxable_income, tax_input.parts);
    Ok(serde_json::to_value(assessment)?)
}

pub fn run_wealth_tax(args: WealthTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let net_worth = match input::from_file_or_stdin::<WealthTaxInput>(args.input.as_deref())? {
        Some(tax_input) => tax_input.net_worth,
        None => args
            .net_worth
            .ok_or("--net-worth is required (or provide --input)")?,
    };

    Ok(serde_json::to_value(brackets::assess_wealth_tax(net_worth))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn loan() -> Financing {
        Financing::new(dec!(196000), dec!(0.038), 20)
    }

    #[test]
    fn test_full_schedule_keeps_months() {
        let value = amortization(&loan(), false).unwrap();
        assert_eq!(value["result"]["months"].as_array().unwrap().len(), 240);
        assert_eq!(value["result"]["years"].as_array().unwrap().len(), 20);
    }

    #[test]
    fn test_yearly_drops_monthly_rows() {
        let value = amortization(&loan(), true).unwrap();
        assert!(value["result"]["months"].as_array().unwrap().is_empty());
        let years = value["result"]["years"].as_array().unwrap();
        assert_eq!(years.len(), 20);
        assert_eq!(years[19]["year"], 20);
    }

    #[test]
    fn test_yearly_flag_with_input_file() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        std::fs::write(
            file.path(),
            "principal: \"120000\"\nannual_rate: \"0.035\"\nterm_years: 15\n",
        )
        .unwrap();
        let args = AmortizationArgs {
            input: Some(file.path().to_str().unwrap().to_string()),
            principal: None,
            rate: None,
            years: None,
            yearly: true,
        };
        let value = run_amortization(args).unwrap();
        assert!(value["result"]["months"].as_array().unwrap().is_empty());
        assert_eq!(value["result"]["years"].as_array().unwrap().len(), 15);
    }
}
