//! Reference data shared by the market commands: the yearly transaction
//! aggregates and the municipality registry. Loaded once per process.

pub mod communes;
pub mod dvf;

use std::collections::BTreeSet;
use std::path::PathBuf;

use immo_sim_core::market::registry::code_from_display;
use immo_sim_core::market::{MarketTable, MunicipalityRegistry};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

static REFERENCE: OnceCell<ReferenceData> = OnceCell::new();

/// Where the reference files live.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub data_dir: PathBuf,
    pub communes_file: Option<PathBuf>,
    /// Empty means every available year
    pub years: Vec<i32>,
}

#[derive(Debug, Default)]
pub struct ReferenceData {
    pub market: MarketTable,
    pub registry: MunicipalityRegistry,
}

/// Process-wide reference data, loaded on first use. Later calls ignore
/// `config` and return the cached tables.
pub fn reference_data(config: &ReferenceConfig) -> &'static ReferenceData {
    REFERENCE.get_or_init(|| ReferenceData::load(config))
}

impl ReferenceData {
    pub fn load(config: &ReferenceConfig) -> Self {
        let market = dvf::load_market_table(&config.data_dir, &config.years);
        if market.is_empty() {
            warn!(dir = %config.data_dir.display(), "no market data loaded");
        }

        let registry = match &config.communes_file {
            Some(path) => communes::read_registry(path).unwrap_or_else(|e| {
                warn!(error = %e, "municipality registry unavailable");
                MunicipalityRegistry::default()
            }),
            None => MunicipalityRegistry::default(),
        };

        debug!(
            rows = market.len(),
            municipalities = registry.len(),
            "reference data loaded"
        );
        Self { market, registry }
    }

    /// Codes present in the market table.
    pub fn available_codes(&self) -> BTreeSet<String> {
        self.market.municipalities().into_iter().collect()
    }

    /// Accepts a code, a registry name, or a "Name (code)" display string.
    pub fn resolve_municipality(&self, query: &str) -> Result<String, String> {
        let query = query.trim();
        if let Some(code) = code_from_display(query) {
            return Ok(code.to_string());
        }
        if self.registry.name(query).is_some() || !self.market.select(Some(query)).is_empty() {
            return Ok(query.to_string());
        }
        self.registry
            .code_for_name(query)
            .map(str::to_string)
            .ok_or_else(|| format!("Unknown municipality '{}'", query))
    }

    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.registry.display_name(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, ReferenceConfig) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dvf2024.csv"),
            "insee_com,prix_m2_moyen,nb_mutations\n59350,2300,45\n01001,1800,4\n",
        )
        .unwrap();
        let communes = dir.path().join("communes.csv");
        fs::write(&communes, "COM,LIBELLE,TYPECOM\n59350,Lille,COM\n01001,L'Abergement,COM\n")
            .unwrap();
        let config = ReferenceConfig {
            data_dir: dir.path().to_path_buf(),
            communes_file: Some(communes),
            years: Vec::new(),
        };
        (dir, config)
    }

    #[test]
    fn test_resolves_code_name_and_display() {
        let (_dir, config) = fixture();
        let data = ReferenceData::load(&config);
        assert_eq!(data.market.len(), 2);
        assert_eq!(data.resolve_municipality("59350").unwrap(), "59350");
        assert_eq!(data.resolve_municipality(" lille ").unwrap(), "59350");
        assert_eq!(data.resolve_municipality("Lille (59350)").unwrap(), "59350");
        assert!(data.resolve_municipality("Atlantis").is_err());
        assert_eq!(data.display_name("01001"), "L'Abergement");
    }

    #[test]
    fn test_missing_registry_still_loads_market() {
        let (_dir, mut config) = fixture();
        config.communes_file = Some(config.data_dir.join("absent.csv"));
        let data = ReferenceData::load(&config);
        assert!(data.registry.is_empty());
        assert_eq!(data.available_codes().len(), 2);
    }
}
