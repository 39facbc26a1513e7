use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ImmoSimError;
use crate::projection::investment::{analyze_investment, InvestmentAnalysis, InvestmentInput};
use crate::types::{Area, Assessment, Money, Rate};
use crate::ImmoSimResult;

/// A named investment saved for later comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub input: InvestmentInput,
    pub analysis: InvestmentAnalysis,
}

/// In-memory list of saved scenarios. Scenarios are only ever appended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioBook {
    snapshots: Vec<ScenarioSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub name: String,
    pub surface: Area,
    pub price: Money,
    pub price_per_area: Option<Money>,
    pub monthly_rent: Money,
    pub gross_yield: Rate,
    pub net_yield: Rate,
    pub monthly_cashflow: Money,
    pub roi: Rate,
    pub final_net_equity: Money,
}

/// Side-by-side view of every saved scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub rows: Vec<ScenarioRow>,
    pub best_cashflow: String,
    pub best_roi: String,
}

impl ScenarioBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyse `input` and keep the result under `name`.
    pub fn add(&mut self, name: &str, input: InvestmentInput) -> ImmoSimResult<&ScenarioSnapshot> {
        self.add_at(name, input, Utc::now())
    }

    pub fn add_at(
        &mut self,
        name: &str,
        input: InvestmentInput,
        saved_at: DateTime<Utc>,
    ) -> ImmoSimResult<&ScenarioSnapshot> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ImmoSimError::InvalidInput {
                field: "name".into(),
                reason: "A scenario needs a name".into(),
            });
        }

        let analysis = analyze_investment(&input)?.result;
        debug!(name, count = self.snapshots.len() + 1, "scenario saved");

        self.snapshots.push(ScenarioSnapshot {
            name: name.to_string(),
            saved_at,
            input,
            analysis,
        });
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioSnapshot> {
        self.snapshots.iter()
    }

    /// Most recent scenario saved under `name`.
    pub fn get(&self, name: &str) -> Option<&ScenarioSnapshot> {
        self.snapshots.iter().rev().find(|s| s.name == name)
    }

    /// Comparison table, available once at least two scenarios are saved.
    pub fn comparison(&self) -> Assessment<ScenarioComparison> {
        if self.snapshots.len() < 2 {
            return Assessment::InsufficientData;
        }

        let rows: Vec<ScenarioRow> = self
            .snapshots
            .iter()
            .map(|s| ScenarioRow {
                name: s.name.clone(),
                surface: s.input.acquisition.surface,
                price: s.input.acquisition.price,
                price_per_area: s.input.acquisition.price_per_area(),
                monthly_rent: s.input.operating.monthly_rent,
                gross_yield: s.analysis.gross_yield,
                net_yield: s.analysis.net_yield,
                monthly_cashflow: s.analysis.monthly_cashflow,
                roi: s.analysis.roi,
                final_net_equity: s.analysis.summary.final_net_equity,
            })
            .collect();

        // First saved wins ties
        let best_by = |key: fn(&ScenarioRow) -> Money| {
            rows.iter()
                .fold(None::<&ScenarioRow>, |best, row| match best {
                    Some(b) if key(b) >= key(row) => Some(b),
                    _ => Some(row),
                })
                .map(|r| r.name.clone())
                .unwrap_or_default()
        };
        let best_cashflow = best_by(|r| r.monthly_cashflow);
        let best_roi = best_by(|r| r.roi);

        Assessment::Available(ScenarioComparison {
            rows,
            best_cashflow,
            best_roi,
        })
    }
}
