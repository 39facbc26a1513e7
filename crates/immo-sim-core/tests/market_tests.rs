use immo_sim_core::market::scoring::{MarketRating, RecommendationTier, Severity};
use immo_sim_core::market::trends::TrendDirection;
use immo_sim_core::market::{
    analyze_price_trends, compare_to_market, investment_recommendation, market_evolution,
    market_liquidity, market_score, market_stats, top_municipalities, MarketAggregate,
    MarketTable, PropertyKind, RankingMetric,
};
use immo_sim_core::Assessment;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn row(code: &str, year: i32, per_area: Decimal, surface: Decimal, n: u64) -> MarketAggregate {
    MarketAggregate {
        municipality: code.into(),
        year: Some(year),
        mean_price: Some(per_area * surface),
        mean_price_per_area: Some(per_area),
        mean_surface: Some(surface),
        transactions: Some(n),
        house_sales: Some(n / 3),
        apartment_sales: Some(n - n / 3),
        house_share: None,
        apartment_share: None,
    }
}

/// A declining mid-sized town and a small village with a single year.
fn table() -> MarketTable {
    MarketTable::new(vec![
        row("59350", 2021, dec!(2600), dec!(70), 60),
        row("59350", 2022, dec!(2500), dec!(72), 45),
        row("59350", 2023, dec!(2350), dec!(68), 30),
        row("59350", 2024, dec!(2300), dec!(65), 45),
        row("01001", 2024, dec!(1800), dec!(110), 4),
    ])
}

// ===========================================================================
// Analytics
// ===========================================================================

#[test]
fn test_declining_market() {
    let t = analyze_price_trends(&table(), Some("59350")).into_option().unwrap();
    assert_eq!(t.years_observed, 4);
    assert_eq!(t.direction, Some(TrendDirection::StrongDecline));
    assert!(t.mean_price_per_area_change.unwrap() < dec!(-0.02));
}

#[test]
fn test_declining_market_score() {
    let s = market_score(&table(), "59350").into_option().unwrap();
    // 45 sales / year: moderately liquid
    assert_eq!(s.components.liquidity, 15);
    assert_eq!(s.components.trend, 5);
    // Volume ≈ 30.5M
    assert_eq!(s.components.volume, 20);
    assert_eq!(s.components.stability, 20);
    assert_eq!(s.score, 60);
    assert_eq!(s.rating, MarketRating::Fair);
}

#[test]
fn test_bargain_gets_price_bonus() {
    let r = investment_recommendation(&table(), "59350", dec!(1800), dec!(70))
        .into_option()
        .unwrap();
    assert_eq!(r.market.score, 60);
    assert_eq!(r.score, 70);
    assert_eq!(r.tier, RecommendationTier::Recommended);
    assert_eq!(r.severity, Severity::Success);
    assert_eq!(r.similar_count, 4);
}

#[test]
fn test_single_year_village() {
    assert_eq!(analyze_price_trends(&table(), Some("01001")), Assessment::InsufficientData);
    let evo = market_evolution(&table(), Some("01001")).into_option().unwrap();
    assert_eq!(evo.len(), 1);
    assert_eq!(evo[0].price_change, None);

    let r = investment_recommendation(&table(), "01001", dec!(1800), dec!(110))
        .into_option()
        .unwrap();
    assert!(!r.trend.is_available());
    assert!(r.comparison.is_available());
}

#[test]
fn test_empty_table_is_insufficient_everywhere() {
    let empty = MarketTable::default();
    assert!(!market_evolution(&empty, None).is_available());
    assert!(!market_liquidity(&empty, None).is_available());
    assert!(!compare_to_market(dec!(3000), &empty, None).is_available());
    assert!(!market_stats(&empty, None, PropertyKind::All).is_available());
    assert!(!market_score(&empty, "59350").is_available());
    assert!(top_municipalities(&empty, RankingMetric::PricePerArea, 10, false).is_empty());
}

#[test]
fn test_missing_columns_are_skipped() {
    let mut sparse = row("59350", 2024, dec!(2300), dec!(65), 45);
    sparse.mean_price_per_area = None;
    let table = MarketTable::new(vec![sparse]);
    assert_eq!(compare_to_market(dec!(2300), &table, None), Assessment::InsufficientData);
    let stats = market_stats(&table, None, PropertyKind::All).into_option().unwrap();
    assert_eq!(stats.mean_price_per_area, None);
    assert_eq!(stats.total_transactions, 45);
}

#[test]
fn test_analytics_are_idempotent() {
    let t = table();
    assert_eq!(market_score(&t, "59350"), market_score(&t, "59350"));
    assert_eq!(
        investment_recommendation(&t, "59350", dec!(2400), dec!(70)),
        investment_recommendation(&t, "59350", dec!(2400), dec!(70))
    );
    assert_eq!(market_evolution(&t, None), market_evolution(&t, None));
}

#[test]
fn test_department_ranking() {
    let nord = table().department("59");
    let top = top_municipalities(&nord, RankingMetric::Transactions, 3, false);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].transactions, 180);
}
