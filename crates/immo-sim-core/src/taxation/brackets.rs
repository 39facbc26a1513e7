use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// One slice of a progressive schedule. `upper` is the cumulative ceiling of
/// the slice; the top slice has none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper: Option<Money>,
    pub rate: Rate,
}

const fn bracket(upper: Option<Money>, rate: Rate) -> TaxBracket {
    TaxBracket { upper, rate }
}

/// Income tax schedule, applied per household part.
pub const INCOME_TAX_BRACKETS: [TaxBracket; 5] = [
    bracket(Some(dec!(11294)), dec!(0)),
    bracket(Some(dec!(17524)), dec!(0.11)),
    bracket(Some(dec!(37133)), dec!(0.30)),
    bracket(Some(dec!(88970)), dec!(0.41)),
    bracket(None, dec!(0.45)),
];

/// Flat levies on net property income.
pub const SOCIAL_LEVY_RATE: Rate = dec!(0.172);

/// Net real-estate wealth below which no wealth tax is due.
pub const WEALTH_TAX_THRESHOLD: Money = dec!(1300000);

/// Wealth tax schedule. Band widths are 800k, 510k, 540k, 650k, 1M, 6M; the
/// first, untaxed band is the 800k abatement.
///
/// The bands apply to the whole net worth, so the abatement is the 0% band
/// itself and is not subtracted beforehand. A schedule that first removes
/// 800k and then starts again with an 800k band at 0% charges less above the
/// threshold: at 3M this one yields 19,080 where the abatement-first reading
/// yields 9,830.
pub const WEALTH_TAX_BRACKETS: [TaxBracket; 7] = [
    bracket(Some(dec!(800000)), dec!(0)),
    bracket(Some(dec!(1310000)), dec!(0.005)),
    bracket(Some(dec!(1850000)), dec!(0.007)),
    bracket(Some(dec!(2500000)), dec!(0.010)),
    bracket(Some(dec!(3500000)), dec!(0.0125)),
    bracket(Some(dec!(9500000)), dec!(0.015)),
    bracket(None, dec!(0.0175)),
];

/// Portion of a base taxed inside one bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketSlice {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
    pub taxable: Money,
    pub tax: Money,
}

/// Detailed application of a progressive schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketAssessment {
    /// Amount the schedule was applied to
    pub base: Money,
    pub tax: Money,
    /// Rate of the highest slice reached
    pub marginal_rate: Rate,
    /// tax / base
    pub average_rate: Rate,
    pub slices: Vec<BracketSlice>,
}

/// Household income tax breakdown (family quotient applied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxAssessment {
    pub taxable_income: Money,
    pub parts: Decimal,
    /// Income per part, the amount the schedule is applied to
    pub quotient: Money,
    /// Tax due by the whole household
    pub tax: Money,
    pub marginal_rate: Rate,
    pub average_rate: Rate,
    /// Slices of one part's quotient
    pub slices: Vec<BracketSlice>,
}

/// Apply a marginal schedule: each slice only taxes the amount between the
/// previous ceiling and its own. Negative bases owe nothing.
pub fn apply_brackets(base: Money, brackets: &[TaxBracket]) -> BracketAssessment {
    let base = base.max(Decimal::ZERO);
    let mut slices = Vec::new();
    let mut tax = Decimal::ZERO;
    let mut marginal_rate = Decimal::ZERO;
    let mut lower = Decimal::ZERO;

    for b in brackets {
        if base <= lower {
            break;
        }
        let ceiling = b.upper.map_or(base, |u| u.min(base));
        let taxable = ceiling - lower;
        if taxable > Decimal::ZERO {
            let slice_tax = taxable * b.rate;
            tax += slice_tax;
            marginal_rate = b.rate;
            slices.push(BracketSlice {
                lower,
                upper: b.upper,
                rate: b.rate,
                taxable,
                tax: slice_tax,
            });
        }
        match b.upper {
            Some(u) => lower = u,
            None => break,
        }
    }

    let average_rate = if base.is_zero() {
        Decimal::ZERO
    } else {
        tax / base
    };

    BracketAssessment {
        base,
        tax,
        marginal_rate,
        average_rate,
        slices,
    }
}

/// Income tax due by a household with `parts` shares. Non-positive parts
/// count as a single share.
pub fn income_tax(taxable_income: Money, parts: Decimal) -> Money {
    assess_income_tax(taxable_income, parts).tax
}

pub fn assess_income_tax(taxable_income: Money, parts: Decimal) -> IncomeTaxAssessment {
    let parts = if parts > Decimal::ZERO {
        parts
    } else {
        Decimal::ONE
    };
    let quotient = taxable_income.max(Decimal::ZERO) / parts;
    let per_part = apply_brackets(quotient, &INCOME_TAX_BRACKETS);
    let tax = per_part.tax * parts;

    let average_rate = if taxable_income > Decimal::ZERO {
        tax / taxable_income
    } else {
        Decimal::ZERO
    };

    IncomeTaxAssessment {
        taxable_income,
        parts,
        quotient,
        tax,
        marginal_rate: per_part.marginal_rate,
        average_rate,
        slices: per_part.slices,
    }
}

/// 17.2% of net property income, never negative.
pub fn social_levies(net_property_income: Money) -> Money {
    net_property_income.max(Decimal::ZERO) * SOCIAL_LEVY_RATE
}

/// Real-estate wealth tax on net taxable wealth.
pub fn wealth_tax(net_worth: Money) -> Money {
    assess_wealth_tax(net_worth).tax
}

pub fn assess_wealth_tax(net_worth: Money) -> BracketAssessment {
    if net_worth < WEALTH_TAX_THRESHOLD {
        return BracketAssessment {
            base: net_worth.max(Decimal::ZERO),
            tax: Decimal::ZERO,
            marginal_rate: Decimal::ZERO,
            average_rate: Decimal::ZERO,
            slices: Vec::new(),
        };
    }
    apply_brackets(net_worth, &WEALTH_TAX_BRACKETS)
}
