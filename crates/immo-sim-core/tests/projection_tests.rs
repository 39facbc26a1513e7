use immo_sim_core::financing::loan::amortization_schedule;
use immo_sim_core::financing::PropertyAcquisition;
use immo_sim_core::projection::{
    analyze_investment, project_investment, InvestmentInput, OperatingAssumptions,
    YearProjection,
};
use immo_sim_core::projection::scenarios::ScenarioBook;
use immo_sim_core::ImmoSimError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Reference scenario
// ===========================================================================

fn reference_input() -> InvestmentInput {
    InvestmentInput {
        acquisition: PropertyAcquisition::new(dec!(200000), dec!(50)),
        down_payment: dec!(20000),
        annual_rate: dec!(0.038),
        term_years: 20,
        operating: OperatingAssumptions {
            monthly_rent: dec!(650),
            vacancy_rate: dec!(0.05),
            monthly_condo_fees: dec!(30),
            annual_property_tax: dec!(800),
            monthly_insurance: dec!(30),
            rent_growth_rate: dec!(0.015),
            appreciation_rate: dec!(0.02),
        },
        horizon_years: 20,
    }
}

fn close(actual: Decimal, expected: Decimal, tolerance: Decimal) -> bool {
    (actual - expected).abs() < tolerance
}

#[test]
fn test_reference_scenario_fixtures() {
    let out = analyze_investment(&reference_input()).unwrap();
    let a = &out.result;

    // 200k + 8% notary fees - 20k down payment
    assert_eq!(a.loan_principal, dec!(196000));
    assert!(close(a.monthly_payment, dec!(1167.1676), dec!(0.001)), "{}", a.monthly_payment);

    let y1 = &a.projection[0];
    assert!(close(y1.cashflow, dec!(-8116.0115), dec!(0.01)), "{}", y1.cashflow);
    assert!(close(y1.remaining_balance, dec!(189441.9885), dec!(0.01)));

    let y20 = &a.projection[19];
    assert!(close(y20.property_value, dec!(297189.4792), dec!(0.01)), "{}", y20.property_value);
    // The annual approximation leaves a residual balance at the end of the term
    assert!(close(y20.remaining_balance, dec!(4718.1347), dec!(0.01)));
    assert!(close(y20.net_equity, dec!(292471.3445), dec!(0.01)), "{}", y20.net_equity);

    assert!(close(a.summary.cumulative_cashflow, dec!(-139173.8561), dec!(0.05)));
}

#[test]
fn test_exact_schedule_differs_from_annual_approximation() {
    let input = reference_input();
    let financing = input.financing();
    let schedule = amortization_schedule(&financing).unwrap().result;
    let projected: Vec<YearProjection> = project_investment(
        &input.acquisition,
        &financing,
        &input.operating,
        input.horizon_years,
    )
    .years()
    .collect();

    assert_eq!(schedule.years.last().unwrap().closing_balance, Decimal::ZERO);
    assert!(projected[19].remaining_balance > Decimal::ZERO);
    assert!(projected[0].remaining_balance != schedule.years[0].closing_balance);
}

#[test]
fn test_analysis_is_idempotent() {
    let input = reference_input();
    let first = analyze_investment(&input).unwrap().result;
    let second = analyze_investment(&input).unwrap().result;
    assert_eq!(first, second);
}

#[test]
fn test_projection_years_are_sequential() {
    let input = reference_input();
    let projection = project_investment(
        &input.acquisition,
        &input.financing(),
        &input.operating,
        input.horizon_years,
    );
    let mut previous_value = input.acquisition.price;
    for year in &projection {
        assert!(year.property_value > previous_value);
        assert_eq!(year.capital_gain, year.property_value - input.acquisition.price);
        assert_eq!(
            year.cashflow,
            year.annual_revenue - year.annual_charges - year.debt_service
        );
        previous_value = year.property_value;
    }
}

#[test]
fn test_zero_rate_loan_projection() {
    let mut input = reference_input();
    input.annual_rate = Decimal::ZERO;
    let out = analyze_investment(&input).unwrap();
    let a = &out.result;
    assert_eq!(a.monthly_payment, dec!(196000) / dec!(240));
    assert_eq!(a.total_interest, Decimal::ZERO);
    // Straight-line repayment clears the loan in the last year
    assert!(close(a.projection[19].remaining_balance, Decimal::ZERO, dec!(0.000001)));
}

#[test]
fn test_input_from_json_uses_defaults() {
    let json = r#"{
        "acquisition": { "price": "150000", "surface": "40" },
        "down_payment": "15000",
        "annual_rate": "0.035",
        "term_years": 25,
        "operating": { "monthly_rent": "600" }
    }"#;
    let input: InvestmentInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.horizon_years, 20);
    assert_eq!(input.acquisition.notary_fee_rate, dec!(0.08));
    assert_eq!(input.operating.vacancy_rate, Decimal::ZERO);

    let out = analyze_investment(&input).unwrap();
    assert_eq!(out.result.projection.len(), 20);
}

#[test]
fn test_long_horizons_fail_validation_instead_of_overflowing() {
    let mut input = reference_input();
    input.horizon_years = 5000;
    assert!(matches!(
        analyze_investment(&input),
        Err(ImmoSimError::InvalidInput { ref field, .. }) if field == "horizon_years"
    ));

    // Doubling every year for a century leaves the decimal range
    input.horizon_years = 100;
    input.operating.appreciation_rate = dec!(1.0);
    assert!(matches!(
        analyze_investment(&input),
        Err(ImmoSimError::InvalidInput { ref field, .. }) if field == "appreciation_rate"
    ));
}

#[test]
fn test_scenario_book_comparison() {
    let mut book = ScenarioBook::new();
    book.add("Reference", reference_input()).unwrap();

    let mut bigger_deposit = reference_input();
    bigger_deposit.down_payment = dec!(80000);
    book.add("Bigger deposit", bigger_deposit).unwrap();

    let cmp = book.comparison().into_option().unwrap();
    assert_eq!(cmp.rows.len(), 2);
    assert_eq!(cmp.best_cashflow, "Bigger deposit");
    // Same net revenue over a smaller deposit
    assert_eq!(cmp.best_roi, "Reference");
}
