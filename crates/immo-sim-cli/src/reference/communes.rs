//! Official municipality registry (COM, LIBELLE, TYPECOM columns).

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use immo_sim_core::market::MunicipalityRegistry;
use tracing::debug;

/// Row type kept from the registry; the others are districts and former
/// municipalities.
const MUNICIPALITY_TYPE: &str = "COM";

pub fn read_registry(path: &Path) -> Result<MunicipalityRegistry, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let text = decode(bytes);
    let registry = parse_registry(&text)?;
    debug!(file = %path.display(), municipalities = registry.len(), "registry loaded");
    Ok(registry)
}

/// UTF-8, else Latin-1 where every byte is its own code point.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("registry is not UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| char::from(b)).collect()
        }
    }
}

pub(crate) fn parse_registry(
    text: &str,
) -> Result<MunicipalityRegistry, Box<dyn std::error::Error>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let code_col = position("COM").ok_or("registry has no COM column")?;
    let name_col = position("LIBELLE").ok_or("registry has no LIBELLE column")?;
    let type_col = position("TYPECOM");

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let is_municipality = match type_col {
            Some(col) => record.get(col) == Some(MUNICIPALITY_TYPE),
            None => true,
        };
        if !is_municipality {
            continue;
        }
        if let (Some(code), Some(name)) = (record.get(code_col), record.get(name_col)) {
            entries.push((code.to_string(), name.to_string()));
        }
    }
    Ok(MunicipalityRegistry::new(entries))
}
