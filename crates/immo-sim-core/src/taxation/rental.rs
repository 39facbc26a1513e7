use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ImmoSimError;
use crate::taxation::brackets::{income_tax, social_levies};
use crate::types::{with_metadata, Area, ComputationOutput, Money, Rate};
use crate::ImmoSimResult;

// ---------------------------------------------------------------------------
// Regime constants
// ---------------------------------------------------------------------------

/// Bare-rental micro regime: rent ceiling and flat abatement.
pub const BARE_MICRO_THRESHOLD: Money = dec!(15000);
pub const BARE_MICRO_ABATEMENT: Rate = dec!(0.30);

/// Furnished-rental micro regime: rent ceiling and flat abatement.
pub const FURNISHED_MICRO_THRESHOLD: Money = dec!(77700);
pub const FURNISHED_MICRO_ABATEMENT: Rate = dec!(0.50);

/// Share of a property's price that can be depreciated (land is excluded).
pub const DEPRECIABLE_BUILDING_SHARE: Rate = dec!(0.8);

/// A property deficit may offset at most this much of the household's other income per year.
pub const DEFICIT_OFFSET_CAP: Money = dec!(10700);

/// Incentive scheme: price retained for the reduction is capped.
pub const INCENTIVE_PRICE_CAP: Money = dec!(300000);

pub const DEFAULT_BUILDING_YEARS: u32 = 30;
pub const DEFAULT_FURNITURE_YEARS: u32 = 7;
pub const DEFAULT_COMMITMENT_YEARS: u32 = 9;

fn default_building_years() -> u32 {
    DEFAULT_BUILDING_YEARS
}

fn default_furniture_years() -> u32 {
    DEFAULT_FURNITURE_YEARS
}

fn default_commitment_years() -> u32 {
    DEFAULT_COMMITMENT_YEARS
}

fn default_parts() -> Decimal {
    Decimal::ONE
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tax regime applied to rental income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegimeId {
    /// Unfurnished letting, flat 30% abatement
    BareRentalMicro,
    /// Unfurnished letting, itemised charges
    BareRentalReal,
    /// Furnished letting, flat 50% abatement
    FurnishedMicro,
    /// Furnished letting, itemised charges and depreciation
    FurnishedReal,
    /// Pinel-like tax reduction against a rent ceiling commitment
    IncentiveScheme,
}

impl TaxRegimeId {
    pub const ALL: [TaxRegimeId; 5] = [
        TaxRegimeId::BareRentalMicro,
        TaxRegimeId::BareRentalReal,
        TaxRegimeId::FurnishedMicro,
        TaxRegimeId::FurnishedReal,
        TaxRegimeId::IncentiveScheme,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaxRegimeId::BareRentalMicro => "Bare rental, micro regime",
            TaxRegimeId::BareRentalReal => "Bare rental, real regime",
            TaxRegimeId::FurnishedMicro => "Furnished rental, micro regime",
            TaxRegimeId::FurnishedReal => "Furnished rental, real simplified regime",
            TaxRegimeId::IncentiveScheme => "Incentive scheme",
        }
    }
}

/// Annual deductible charges of a rental.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeductibleCharges {
    /// Loan interest only, never principal
    #[serde(default)]
    pub loan_interest: Money,
    #[serde(default)]
    pub condo_fees: Money,
    #[serde(default)]
    pub property_tax: Money,
    #[serde(default)]
    pub insurance: Money,
    #[serde(default)]
    pub maintenance: Money,
    #[serde(default)]
    pub other: Money,
}

impl DeductibleCharges {
    pub fn total(&self) -> Money {
        self.loan_interest
            + self.condo_fees
            + self.property_tax
            + self.insurance
            + self.maintenance
            + self.other
    }

    fn has_negative(&self) -> bool {
        [
            self.loan_interest,
            self.condo_fees,
            self.property_tax,
            self.insurance,
            self.maintenance,
            self.other,
        ]
        .iter()
        .any(|v| *v < Decimal::ZERO)
    }
}

/// Household situation used for a progressive income tax differential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    /// Taxable income excluding the rental
    #[serde(default)]
    pub other_taxable_income: Money,
    /// Number of household shares
    #[serde(default = "default_parts")]
    pub parts: Decimal,
}

/// Depreciable assets of a furnished rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnishedAssets {
    pub property_price: Money,
    #[serde(default)]
    pub furniture_value: Money,
    #[serde(default = "default_building_years")]
    pub building_years: u32,
    #[serde(default = "default_furniture_years")]
    pub furniture_years: u32,
}

/// Commitment taken under the incentive scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveCommitment {
    pub acquisition_price: Money,
    /// Zone label: "A bis", "A", "B1", "B2"
    pub zone: String,
    pub surface: Area,
    /// Holding duration: 6, 9 or 12 years
    #[serde(default = "default_commitment_years")]
    pub duration_years: u32,
}

/// Rent-ceiling zone of the incentive scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveZone {
    ABis,
    A,
    B1,
    B2,
    Unlisted,
}

impl IncentiveZone {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().replace(' ', "").as_str() {
            "abis" => IncentiveZone::ABis,
            "a" => IncentiveZone::A,
            "b1" => IncentiveZone::B1,
            "b2" => IncentiveZone::B2,
            _ => IncentiveZone::Unlisted,
        }
    }

    /// Monthly rent ceiling per square metre. Unlisted zones use the B1 ceiling.
    pub fn rent_ceiling_per_area(&self) -> Money {
        match self {
            IncentiveZone::ABis => dec!(18.25),
            IncentiveZone::A => dec!(13.56),
            IncentiveZone::B1 => dec!(10.93),
            IncentiveZone::B2 => dec!(9.50),
            IncentiveZone::Unlisted => dec!(10.93),
        }
    }
}

/// Total reduction rate by holding duration; other durations get the 6-year rate.
pub fn incentive_reduction_rate(duration_years: u32) -> Rate {
    match duration_years {
        6 => dec!(0.12),
        9 => dec!(0.18),
        12 => dec!(0.21),
        _ => dec!(0.12),
    }
}

/// Input for a single-regime tax simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalTaxInput {
    pub regime: TaxRegimeId,
    /// Gross annual rent (requested rent for the incentive scheme)
    pub annual_rent: Money,
    #[serde(default)]
    pub charges: DeductibleCharges,
    /// Loan principal repaid over the year, a cash outflow that is not deductible
    #[serde(default)]
    pub annual_principal_repaid: Money,
    /// Flat marginal rate applied to the rental result (0.30 = 30%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_tax_rate: Option<Rate>,
    /// Used for a progressive computation when no marginal rate is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household: Option<Household>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnished: Option<FurnishedAssets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incentive: Option<IncentiveCommitment>,
}

/// Taxes and cashflow common to every regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBill {
    pub taxable_income: Money,
    pub income_tax: Money,
    pub social_levies: Money,
    pub total_tax: Money,
    /// Rent - charges - principal repaid - taxes (+ any tax reduction)
    pub net_cashflow: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroRegimeResult {
    pub eligible: bool,
    pub rent_threshold: Money,
    pub abatement_rate: Rate,
    /// Zero when the fallback regime applied
    pub abatement: Money,
    /// The micro regime itself, or its real counterpart when ineligible
    pub applied_regime: TaxRegimeId,
    pub tax: TaxBill,
    /// Micro taxable income minus real taxable income: positive when the real regime shelters more
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_vs_micro_taxable_gap: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BareRealResult {
    pub total_charges: Money,
    /// Charges in excess of rent
    pub deficit: Money,
    /// Tax saved by offsetting the capped deficit against other income
    pub deficit_offset_saving: Money,
    pub tax: TaxBill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depreciation {
    pub building: Money,
    pub furniture: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnishedRealResult {
    pub total_charges: Money,
    pub depreciation: Depreciation,
    pub tax: TaxBill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionYear {
    pub year: u32,
    pub reduction: Money,
    pub cumulative: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveSchemeResult {
    pub zone: IncentiveZone,
    pub duration_years: u32,
    pub price_within_cap: bool,
    /// min(price, cap)
    pub eligible_price: Money,
    pub reduction_rate: Rate,
    pub reduction_total: Money,
    pub reduction_annual: Money,
    pub rent_ceiling_per_area: Money,
    pub max_monthly_rent: Money,
    pub requested_monthly_rent: Money,
    /// Requested rent brought down to the ceiling
    pub applied_monthly_rent: Money,
    pub rent_compliant: bool,
    pub cashflow_without_reduction: Money,
    /// Taxes on the applied rent under the real regime; net cashflow includes the reduction
    pub tax: TaxBill,
    pub reduction_schedule: Vec<ReductionYear>,
}

/// Result of a tax simulation, tagged by regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum TaxRegimeResult {
    BareRentalMicro(MicroRegimeResult),
    BareRentalReal(BareRealResult),
    FurnishedMicro(MicroRegimeResult),
    FurnishedReal(FurnishedRealResult),
    IncentiveScheme(IncentiveSchemeResult),
}

impl TaxRegimeResult {
    pub fn regime(&self) -> TaxRegimeId {
        match self {
            TaxRegimeResult::BareRentalMicro(_) => TaxRegimeId::BareRentalMicro,
            TaxRegimeResult::BareRentalReal(_) => TaxRegimeId::BareRentalReal,
            TaxRegimeResult::FurnishedMicro(_) => TaxRegimeId::FurnishedMicro,
            TaxRegimeResult::FurnishedReal(_) => TaxRegimeId::FurnishedReal,
            TaxRegimeResult::IncentiveScheme(_) => TaxRegimeId::IncentiveScheme,
        }
    }

    pub fn tax(&self) -> &TaxBill {
        match self {
            TaxRegimeResult::BareRentalMicro(r) | TaxRegimeResult::FurnishedMicro(r) => &r.tax,
            TaxRegimeResult::BareRentalReal(r) => &r.tax,
            TaxRegimeResult::FurnishedReal(r) => &r.tax,
            TaxRegimeResult::IncentiveScheme(r) => &r.tax,
        }
    }

    /// Regime whose rules produced the taxes (differs from `regime()` after a micro fallback).
    pub fn applied_regime(&self) -> TaxRegimeId {
        match self {
            TaxRegimeResult::BareRentalMicro(r) | TaxRegimeResult::FurnishedMicro(r) => {
                r.applied_regime
            }
            other => other.regime(),
        }
    }

    pub fn eligible(&self) -> bool {
        match self {
            TaxRegimeResult::BareRentalMicro(r) | TaxRegimeResult::FurnishedMicro(r) => r.eligible,
            _ => true,
        }
    }
}

/// One line of a side-by-side regime comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub regime: TaxRegimeId,
    pub applied_regime: TaxRegimeId,
    pub eligible: bool,
    pub taxable_income: Money,
    pub total_tax: Money,
    pub net_cashflow: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeComparison {
    pub regimes: Vec<RegimeSummary>,
    /// Regime with the highest net cashflow
    pub best: TaxRegimeId,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

type RegimeCalculator = fn(&RentalTaxInput, &mut Vec<String>) -> ImmoSimResult<TaxRegimeResult>;

fn calculator_for(regime: TaxRegimeId) -> RegimeCalculator {
    match regime {
        TaxRegimeId::BareRentalMicro => bare_rental_micro,
        TaxRegimeId::BareRentalReal => bare_rental_real,
        TaxRegimeId::FurnishedMicro => furnished_micro,
        TaxRegimeId::FurnishedReal => furnished_real,
        TaxRegimeId::IncentiveScheme => incentive_scheme,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute taxable income, taxes and net cashflow of a rental under one regime.
///
/// An ineligible micro regime is not an error: the result is flagged and the
/// taxes are computed under the matching real regime instead.
pub fn simulate_tax_regime(
    input: &RentalTaxInput,
) -> ImmoSimResult<ComputationOutput<TaxRegimeResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    debug!(regime = ?input.regime, annual_rent = %input.annual_rent, "simulating tax regime");

    let result = calculator_for(input.regime)(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        input.regime.label(),
        input,
        warnings,
        elapsed,
        result,
    ))
}

/// Run every regime on the same rental and rank them by net cashflow.
///
/// The incentive scheme is only included when a commitment is supplied.
pub fn compare_regimes(
    input: &RentalTaxInput,
) -> ImmoSimResult<ComputationOutput<RegimeComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let mut regimes = Vec::new();
    for regime in TaxRegimeId::ALL {
        if regime == TaxRegimeId::IncentiveScheme && input.incentive.is_none() {
            continue;
        }
        let scoped = RentalTaxInput {
            regime,
            ..input.clone()
        };
        let result = calculator_for(regime)(&scoped, &mut warnings)?;
        let tax = result.tax();
        regimes.push(RegimeSummary {
            regime,
            applied_regime: result.applied_regime(),
            eligible: result.eligible(),
            taxable_income: tax.taxable_income,
            total_tax: tax.total_tax,
            net_cashflow: tax.net_cashflow,
        });
    }

    let best = regimes
        .iter()
        .filter(|r| r.eligible)
        .max_by(|a, b| a.net_cashflow.cmp(&b.net_cashflow))
        .map(|r| r.regime)
        .unwrap_or(TaxRegimeId::BareRentalReal);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Rental tax regime comparison",
        input,
        warnings,
        elapsed,
        RegimeComparison { regimes, best },
    ))
}

/// Annual depreciation: 80% of the price over the building life plus the
/// furniture over its own life. A zero life depreciates nothing.
pub fn depreciation(assets: &FurnishedAssets) -> Depreciation {
    let building = if assets.building_years == 0 {
        Decimal::ZERO
    } else {
        DEPRECIABLE_BUILDING_SHARE * assets.property_price / Decimal::from(assets.building_years)
    };
    let furniture = if assets.furniture_years == 0 {
        Decimal::ZERO
    } else {
        assets.furniture_value / Decimal::from(assets.furniture_years)
    };
    Depreciation {
        building,
        furniture,
        total: building + furniture,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &RentalTaxInput) -> ImmoSimResult<()> {
    if input.annual_rent < Decimal::ZERO {
        return Err(ImmoSimError::InvalidInput {
            field: "annual_rent".into(),
            reason: "Annual rent cannot be negative".into(),
        });
    }
    if input.charges.has_negative() {
        return Err(ImmoSimError::InvalidInput {
            field: "charges".into(),
            reason: "Deductible charges cannot be negative".into(),
        });
    }
    if let Some(rate) = input.marginal_tax_rate {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(ImmoSimError::InvalidInput {
                field: "marginal_tax_rate".into(),
                reason: "Marginal tax rate must be between 0 and 1".into(),
            });
        }
    }
    if let Some(ref household) = input.household {
        if household.parts <= Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "household.parts".into(),
                reason: "Household must have a positive number of parts".into(),
            });
        }
    }
    if input.regime == TaxRegimeId::IncentiveScheme && input.incentive.is_none() {
        return Err(ImmoSimError::InvalidInput {
            field: "incentive".into(),
            reason: "Incentive scheme requires the acquisition price, zone and surface".into(),
        });
    }
    // Checked whatever the regime, the comparison runs any supplied commitment
    if let Some(ref commitment) = input.incentive {
        if commitment.duration_years == 0 {
            return Err(ImmoSimError::InvalidInput {
                field: "incentive.duration_years".into(),
                reason: "Commitment duration must be at least one year".into(),
            });
        }
        if commitment.acquisition_price < Decimal::ZERO || commitment.surface < Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "incentive".into(),
                reason: "Acquisition price and surface cannot be negative".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Regime calculators
// ---------------------------------------------------------------------------

fn bare_rental_micro(
    input: &RentalTaxInput,
    warnings: &mut Vec<String>,
) -> ImmoSimResult<TaxRegimeResult> {
    let eligible = input.annual_rent <= BARE_MICRO_THRESHOLD;
    let (abatement, applied_regime, taxable) = if eligible {
        let abatement = input.annual_rent * BARE_MICRO_ABATEMENT;
        (abatement, TaxRegimeId::BareRentalMicro, input.annual_rent - abatement)
    } else {
        warnings.push(format!(
            "Annual rent {} exceeds the {} micro-regime ceiling, taxed under the real regime",
            input.annual_rent, BARE_MICRO_THRESHOLD
        ));
        (
            Decimal::ZERO,
            TaxRegimeId::BareRentalReal,
            real_taxable(input.annual_rent, input.charges.total(), Decimal::ZERO),
        )
    };

    Ok(TaxRegimeResult::BareRentalMicro(MicroRegimeResult {
        eligible,
        rent_threshold: BARE_MICRO_THRESHOLD,
        abatement_rate: BARE_MICRO_ABATEMENT,
        abatement,
        applied_regime,
        tax: tax_bill(input, input.annual_rent, taxable, Decimal::ZERO),
        real_vs_micro_taxable_gap: None,
    }))
}

fn bare_rental_real(
    input: &RentalTaxInput,
    _warnings: &mut Vec<String>,
) -> ImmoSimResult<TaxRegimeResult> {
    let total_charges = input.charges.total();
    let taxable = real_taxable(input.annual_rent, total_charges, Decimal::ZERO);
    let deficit = (total_charges - input.annual_rent).max(Decimal::ZERO);
    let deficit_offset_saving = deficit.min(DEFICIT_OFFSET_CAP) * effective_marginal_rate(input);

    Ok(TaxRegimeResult::BareRentalReal(BareRealResult {
        total_charges,
        deficit,
        deficit_offset_saving,
        tax: tax_bill(input, input.annual_rent, taxable, Decimal::ZERO),
    }))
}

fn furnished_micro(
    input: &RentalTaxInput,
    warnings: &mut Vec<String>,
) -> ImmoSimResult<TaxRegimeResult> {
    let eligible = input.annual_rent <= FURNISHED_MICRO_THRESHOLD;
    let depreciation_total = furnished_depreciation(input, warnings).total;
    let real = real_taxable(input.annual_rent, input.charges.total(), depreciation_total);

    let (abatement, applied_regime, taxable, gap) = if eligible {
        let abatement = input.annual_rent * FURNISHED_MICRO_ABATEMENT;
        let micro = input.annual_rent - abatement;
        (abatement, TaxRegimeId::FurnishedMicro, micro, Some(micro - real))
    } else {
        warnings.push(format!(
            "Annual rent {} exceeds the {} furnished micro-regime ceiling, taxed under the real simplified regime",
            input.annual_rent, FURNISHED_MICRO_THRESHOLD
        ));
        (Decimal::ZERO, TaxRegimeId::FurnishedReal, real, None)
    };

    Ok(TaxRegimeResult::FurnishedMicro(MicroRegimeResult {
        eligible,
        rent_threshold: FURNISHED_MICRO_THRESHOLD,
        abatement_rate: FURNISHED_MICRO_ABATEMENT,
        abatement,
        applied_regime,
        tax: tax_bill(input, input.annual_rent, taxable, Decimal::ZERO),
        real_vs_micro_taxable_gap: gap,
    }))
}

fn furnished_real(
    input: &RentalTaxInput,
    warnings: &mut Vec<String>,
) -> ImmoSimResult<TaxRegimeResult> {
    let total_charges = input.charges.total();
    let depreciation = furnished_depreciation(input, warnings);
    let taxable = real_taxable(input.annual_rent, total_charges, depreciation.total);

    Ok(TaxRegimeResult::FurnishedReal(FurnishedRealResult {
        total_charges,
        tax: tax_bill(input, input.annual_rent, taxable, Decimal::ZERO),
        depreciation,
    }))
}

fn incentive_scheme(
    input: &RentalTaxInput,
    warnings: &mut Vec<String>,
) -> ImmoSimResult<TaxRegimeResult> {
    let commitment = input
        .incentive
        .as_ref()
        .ok_or_else(|| ImmoSimError::InvalidInput {
            field: "incentive".into(),
            reason: "Incentive scheme requires the acquisition price, zone and surface".into(),
        })?;
    if commitment.duration_years == 0 {
        return Err(ImmoSimError::DivisionByZero {
            context: "incentive annual reduction".into(),
        });
    }

    let zone = IncentiveZone::from_label(&commitment.zone);
    if zone == IncentiveZone::Unlisted {
        warnings.push(format!(
            "Unknown incentive zone '{}', using the B1 rent ceiling",
            commitment.zone
        ));
    }
    if !matches!(commitment.duration_years, 6 | 9 | 12) {
        warnings.push(format!(
            "Commitment of {} years is not a standard duration, using the 6-year rate",
            commitment.duration_years
        ));
    }

    let duration = Decimal::from(commitment.duration_years);
    let price_within_cap = commitment.acquisition_price <= INCENTIVE_PRICE_CAP;
    if !price_within_cap {
        warnings.push(format!(
            "Acquisition price {} exceeds the {} cap, reduction computed on the cap",
            commitment.acquisition_price, INCENTIVE_PRICE_CAP
        ));
    }
    let eligible_price = commitment.acquisition_price.min(INCENTIVE_PRICE_CAP);
    let reduction_rate = incentive_reduction_rate(commitment.duration_years);
    let reduction_total = eligible_price * reduction_rate;
    let reduction_annual = reduction_total / duration;

    let rent_ceiling_per_area = zone.rent_ceiling_per_area();
    let max_monthly_rent = rent_ceiling_per_area * commitment.surface;
    let requested_monthly_rent = input.annual_rent / dec!(12);
    let rent_compliant = requested_monthly_rent <= max_monthly_rent;
    if !rent_compliant {
        warnings.push(format!(
            "Requested rent {:.2}/month exceeds the {:.2}/month ceiling, rent capped",
            requested_monthly_rent, max_monthly_rent
        ));
    }
    let applied_monthly_rent = requested_monthly_rent.min(max_monthly_rent);
    let applied_annual_rent = applied_monthly_rent * dec!(12);

    let taxable = real_taxable(applied_annual_rent, input.charges.total(), Decimal::ZERO);
    let tax = tax_bill(input, applied_annual_rent, taxable, reduction_annual);
    let cashflow_without_reduction = tax.net_cashflow - reduction_annual;

    let reduction_schedule = (1..=commitment.duration_years)
        .map(|year| ReductionYear {
            year,
            reduction: reduction_annual,
            cumulative: reduction_annual * Decimal::from(year),
        })
        .collect();

    Ok(TaxRegimeResult::IncentiveScheme(IncentiveSchemeResult {
        zone,
        duration_years: commitment.duration_years,
        price_within_cap,
        eligible_price,
        reduction_rate,
        reduction_total,
        reduction_annual,
        rent_ceiling_per_area,
        max_monthly_rent,
        requested_monthly_rent,
        applied_monthly_rent,
        rent_compliant,
        cashflow_without_reduction,
        tax,
        reduction_schedule,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn real_taxable(rent: Money, charges: Money, depreciation: Money) -> Money {
    (rent - charges - depreciation).max(Decimal::ZERO)
}

fn furnished_depreciation(input: &RentalTaxInput, warnings: &mut Vec<String>) -> Depreciation {
    match input.furnished {
        Some(ref assets) => depreciation(assets),
        None => {
            warnings.push("No furnished assets supplied: depreciation taken as zero".into());
            Depreciation {
                building: Decimal::ZERO,
                furniture: Decimal::ZERO,
                total: Decimal::ZERO,
            }
        }
    }
}

/// Income tax attributable to the rental result.
fn rental_income_tax(input: &RentalTaxInput, taxable: Money) -> Money {
    if let Some(rate) = input.marginal_tax_rate {
        return taxable * rate;
    }
    match input.household {
        Some(ref h) => {
            income_tax(h.other_taxable_income + taxable, h.parts)
                - income_tax(h.other_taxable_income, h.parts)
        }
        None => income_tax(taxable, Decimal::ONE),
    }
}

/// Rate at which a deductible deficit saves tax.
fn effective_marginal_rate(input: &RentalTaxInput) -> Rate {
    if let Some(rate) = input.marginal_tax_rate {
        return rate;
    }
    match input.household {
        Some(ref h) => {
            crate::taxation::brackets::assess_income_tax(h.other_taxable_income, h.parts)
                .marginal_rate
        }
        None => Decimal::ZERO,
    }
}

fn tax_bill(
    input: &RentalTaxInput,
    rent_received: Money,
    taxable_income: Money,
    tax_reduction: Money,
) -> TaxBill {
    let income_tax = rental_income_tax(input, taxable_income);
    let social_levies = social_levies(taxable_income);
    let total_tax = income_tax + social_levies;
    let net_cashflow = rent_received
        - input.charges.total()
        - input.annual_principal_repaid
        - total_tax
        + tax_reduction;

    TaxBill {
        taxable_income,
        income_tax,
        social_levies,
        total_tax,
        net_cashflow,
    }
}
