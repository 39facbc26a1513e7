use immo_sim_core::taxation::brackets::{assess_wealth_tax, income_tax, wealth_tax};
use immo_sim_core::taxation::rental::{
    compare_regimes, simulate_tax_regime, DeductibleCharges, FurnishedAssets, IncentiveCommitment,
    RentalTaxInput, TaxRegimeId, TaxRegimeResult,
};
use immo_sim_core::ImmoSimError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn rental(regime: TaxRegimeId, rent: Decimal) -> RentalTaxInput {
    RentalTaxInput {
        regime,
        annual_rent: rent,
        charges: DeductibleCharges {
            loan_interest: dec!(5200),
            condo_fees: dec!(360),
            property_tax: dec!(800),
            insurance: dec!(360),
            maintenance: Decimal::ZERO,
            other: Decimal::ZERO,
        },
        annual_principal_repaid: dec!(7800),
        marginal_tax_rate: Some(dec!(0.11)),
        household: None,
        furnished: Some(FurnishedAssets {
            property_price: dec!(200000),
            furniture_value: dec!(5600),
            building_years: 30,
            furniture_years: 7,
        }),
        incentive: Some(IncentiveCommitment {
            acquisition_price: dec!(200000),
            zone: "B1".into(),
            surface: dec!(50),
            duration_years: 9,
        }),
    }
}

// ===========================================================================
// Regimes
// ===========================================================================

#[test]
fn test_micro_cutoff_is_exact() {
    let eligible = simulate_tax_regime(&rental(TaxRegimeId::BareRentalMicro, dec!(15000))).unwrap();
    let ineligible =
        simulate_tax_regime(&rental(TaxRegimeId::BareRentalMicro, dec!(15000.01))).unwrap();

    assert!(eligible.result.eligible());
    assert_eq!(eligible.result.tax().taxable_income, dec!(10500));
    assert!(!ineligible.result.eligible());
    assert_eq!(ineligible.result.applied_regime(), TaxRegimeId::BareRentalReal);
}

#[test]
fn test_furnished_real_shelters_rent() {
    let out = simulate_tax_regime(&rental(TaxRegimeId::FurnishedReal, dec!(7800))).unwrap();
    match out.result {
        TaxRegimeResult::FurnishedReal(r) => {
            // 0.8 × 200k / 30 + 5600 / 7
            assert_eq!(r.depreciation.total.round_dp(2), dec!(6133.33));
            assert_eq!(r.tax.taxable_income, Decimal::ZERO);
            assert_eq!(r.tax.total_tax, Decimal::ZERO);
            assert_eq!(r.tax.net_cashflow, dec!(7800) - dec!(6720) - dec!(7800));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_incentive_reconstructs_annual_reduction() {
    for duration in [6u32, 9, 12] {
        let mut input = rental(TaxRegimeId::IncentiveScheme, dec!(6000));
        if let Some(ref mut commitment) = input.incentive {
            commitment.duration_years = duration;
        }
        let out = simulate_tax_regime(&input).unwrap();
        match out.result {
            TaxRegimeResult::IncentiveScheme(r) => {
                assert_eq!(r.reduction_total / Decimal::from(duration), r.reduction_annual);
                let last = r.reduction_schedule.last().unwrap();
                assert_eq!(last.year, duration);
                assert!((last.cumulative - r.reduction_total).abs() < dec!(0.0000001));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}

#[test]
fn test_incentive_zero_duration_rejected() {
    let mut input = rental(TaxRegimeId::IncentiveScheme, dec!(6000));
    if let Some(ref mut commitment) = input.incentive {
        commitment.duration_years = 0;
    }
    assert!(matches!(
        simulate_tax_regime(&input),
        Err(ImmoSimError::InvalidInput { .. })
    ));
}

#[test]
fn test_compare_all_regimes() {
    let out = compare_regimes(&rental(TaxRegimeId::BareRentalMicro, dec!(7800))).unwrap();
    let regimes: Vec<TaxRegimeId> = out.result.regimes.iter().map(|r| r.regime).collect();
    assert_eq!(regimes, TaxRegimeId::ALL.to_vec());
    // The annual reduction tops every other regime's cashflow
    assert_eq!(out.result.best, TaxRegimeId::IncentiveScheme);
}

#[test]
fn test_compare_rejects_negative_incentive_surface() {
    let mut input = rental(TaxRegimeId::BareRentalReal, dec!(7800));
    if let Some(ref mut commitment) = input.incentive {
        commitment.surface = dec!(-50);
    }
    assert!(matches!(
        compare_regimes(&input),
        Err(ImmoSimError::InvalidInput { ref field, .. }) if field == "incentive"
    ));
}

#[test]
fn test_compare_rejects_zero_duration_commitment() {
    let mut input = rental(TaxRegimeId::BareRentalReal, dec!(7800));
    if let Some(ref mut commitment) = input.incentive {
        commitment.duration_years = 0;
    }
    assert!(matches!(
        compare_regimes(&input),
        Err(ImmoSimError::InvalidInput { ref field, .. }) if field == "incentive.duration_years"
    ));
}

#[test]
fn test_regime_input_from_json() {
    let json = r#"{
        "regime": "furnished_micro",
        "annual_rent": "9000",
        "charges": { "loan_interest": "2000" },
        "marginal_tax_rate": "0.3"
    }"#;
    let input: RentalTaxInput = serde_json::from_str(json).unwrap();
    let out = simulate_tax_regime(&input).unwrap();
    assert_eq!(out.result.tax().taxable_income, dec!(4500));
    // No assets supplied: depreciation taken as zero
    assert_eq!(out.warnings.len(), 1);
}

// ===========================================================================
// Brackets
// ===========================================================================

#[test]
fn test_income_tax_regression_values() {
    assert_eq!(income_tax(dec!(11294), dec!(1)), Decimal::ZERO);
    assert_eq!(income_tax(dec!(17524), dec!(1)), dec!(685.30));
    assert_eq!(income_tax(dec!(50000), dec!(2)), dec!(1370.60) + dec!(2) * dec!(7476) * dec!(0.30));
}

#[test]
fn test_wealth_tax_continuity_at_threshold() {
    let below = wealth_tax(dec!(1299999));
    let above = wealth_tax(dec!(1300001));
    assert_eq!(below, Decimal::ZERO);
    assert!(above > Decimal::ZERO && above < dec!(3000));
    assert_eq!(assess_wealth_tax(dec!(1300001)).marginal_rate, dec!(0.005));
}

#[test]
fn test_wealth_tax_bands_apply_to_whole_net_worth() {
    // 510k at 0.5%, 540k at 0.7%, 650k at 1%, 500k at 1.25%
    assert_eq!(wealth_tax(dec!(3000000)), dec!(19080));
}
