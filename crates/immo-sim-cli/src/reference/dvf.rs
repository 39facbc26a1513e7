//! Yearly transaction aggregates from `dvf<year>.csv` files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use immo_sim_core::market::{MarketAggregate, MarketTable};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

const FILE_PREFIX: &str = "dvf";
const FILE_SUFFIX: &str = ".csv";

/// Header spellings found across the yearly exports.
const HEADER_ALIASES: [(&str, &str); 9] = [
    ("annee", "annee"),
    ("nb_mutations", "nb_mutations"),
    ("nbmaisons", "nb_maisons"),
    ("nbapparts", "nb_apparts"),
    ("propmaison", "prop_maison"),
    ("propappart", "prop_appart"),
    ("prixmoyen", "prix_moyen"),
    ("prixm2moyen", "prix_m2_moyen"),
    ("surfacemoy", "surface_moy"),
];

/// Market files in `data_dir`, sorted by year. An empty `years` keeps every
/// file matching the naming pattern.
pub fn discover(data_dir: &Path, years: &[i32]) -> Vec<(i32, PathBuf)> {
    let entries = match fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %data_dir.display(), error = %e, "market data directory unreadable");
            return Vec::new();
        }
    };

    let mut files: Vec<(i32, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            let year = year_from_file_name(path.file_name()?.to_str()?)?;
            Some((year, path))
        })
        .filter(|(year, _)| years.is_empty() || years.contains(year))
        .collect();
    files.sort();
    files
}

/// Load every discovered file into one table. Files that fail to parse are
/// logged and skipped.
pub fn load_market_table(data_dir: &Path, years: &[i32]) -> MarketTable {
    let mut rows = Vec::new();
    for (year, path) in discover(data_dir, years) {
        match read_market_file(&path, year) {
            Ok(mut file_rows) => {
                debug!(file = %path.display(), rows = file_rows.len(), "market file loaded");
                rows.append(&mut file_rows);
            }
            Err(e) => warn!(file = %path.display(), error = %e, "skipping market file"),
        }
    }
    MarketTable::new(rows)
}

/// Parse one export. `file_year` stands in when the file has no year column.
pub fn read_market_file(
    path: &Path,
    file_year: i32,
) -> Result<Vec<MarketAggregate>, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    parse_market_csv(&contents, file_year)
}

pub(crate) fn parse_market_csv(
    contents: &str,
    file_year: i32,
) -> Result<Vec<MarketAggregate>, Box<dyn std::error::Error>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(detect_delimiter(contents))
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(contents.as_bytes());

    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect();
    if !columns.contains_key("insee_com") {
        return Err("missing insee_com column".into());
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row = Row {
            record: &record,
            columns: &columns,
        };
        let Some(municipality) = row.text("insee_com").map(pad_code) else {
            continue;
        };
        rows.push(MarketAggregate {
            municipality,
            year: row.year().or(Some(file_year)),
            mean_price: row.decimal("prix_moyen"),
            mean_price_per_area: row.decimal("prix_m2_moyen"),
            mean_surface: row.decimal("surface_moy"),
            transactions: row.count("nb_mutations"),
            house_sales: row.count("nb_maisons"),
            apartment_sales: row.count("nb_apparts"),
            house_share: row.decimal("prop_maison"),
            apartment_share: row.decimal("prop_appart"),
        });
    }
    Ok(rows)
}

/// Lower-case, trim, strip accents, then map known variants to one name.
pub(crate) fn normalize_header(header: &str) -> String {
    let folded: String = header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .map(strip_accent)
        .collect();
    HEADER_ALIASES
        .iter()
        .find(|(variant, _)| *variant == folded)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(folded)
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}

fn year_from_file_name(name: &str) -> Option<i32> {
    let digits = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn detect_delimiter(contents: &str) -> u8 {
    let header = contents.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// Numeric exports drop the leading zero of codes such as 01001.
fn pad_code(code: &str) -> String {
    if code.len() == 4 && code.chars().all(|c| c.is_ascii_digit()) {
        format!("0{code}")
    } else {
        code.to_string()
    }
}

struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl Row<'_> {
    fn text(&self, column: &str) -> Option<&str> {
        let value = self.record.get(*self.columns.get(column)?)?;
        (!value.is_empty()).then_some(value)
    }

    fn decimal(&self, column: &str) -> Option<Decimal> {
        let raw = self.text(column)?;
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }

    fn count(&self, column: &str) -> Option<u64> {
        let value = self.decimal(column)?;
        if value.is_sign_negative() {
            return None;
        }
        value.trunc().to_u64()
    }

    fn year(&self) -> Option<i32> {
        self.decimal("annee")?.trunc().to_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_header_aliases() {
        assert_eq!(normalize_header(" Année "), "annee");
        assert_eq!(normalize_header("PrixM2Moyen"), "prix_m2_moyen");
        assert_eq!(normalize_header("SurfaceMoy"), "surface_moy");
        assert_eq!(normalize_header("INSEE_COM"), "insee_com");
        assert_eq!(normalize_header("\u{feff}nbMaisons"), "nb_maisons");
    }

    #[test]
    fn test_file_name_pattern() {
        assert_eq!(year_from_file_name("dvf2023.csv"), Some(2023));
        assert_eq!(year_from_file_name("dvf23.csv"), None);
        assert_eq!(year_from_file_name("dvf2023.csv.bak"), None);
        assert_eq!(year_from_file_name("communes.csv"), None);
    }

    #[test]
    fn test_legacy_headers_and_year_fallback() {
        let csv = "INSEE_COM,nbMaisons,nbApparts,PrixMoyen,Prixm2Moyen,SurfaceMoy,nb_mutations\n\
                   1001,3,1,180000.0,1800.5,100,4\n\
                   59350,20,25,n/a,2300,65,45.0\n";
        let rows = parse_market_csv(csv, 2017).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].municipality, "01001");
        assert_eq!(rows[0].year, Some(2017));
        assert_eq!(rows[0].mean_price_per_area, Some(dec!(1800.5)));
        assert_eq!(rows[0].house_sales, Some(3));

        assert_eq!(rows[1].mean_price, None);
        assert_eq!(rows[1].transactions, Some(45));
    }

    #[test]
    fn test_year_column_wins_over_file_name() {
        let csv = "annee;insee_com;prix_m2_moyen\n2024;75056;10200\n";
        let rows = parse_market_csv(csv, 2017).unwrap();
        assert_eq!(rows[0].year, Some(2024));
        assert_eq!(rows[0].mean_surface, None);
    }

    #[test]
    fn test_missing_municipality_column_is_an_error() {
        assert!(parse_market_csv("annee,prix_moyen\n2024,1\n", 2024).is_err());
    }

    #[test]
    fn test_directory_loading_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("dvf2023.csv"),
            "insee_com,prix_m2_moyen,nb_mutations\n59350,2350,30\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("dvf2024.csv"),
            "insee_com,prix_m2_moyen,nb_mutations\n59350,2300,45\n",
        )
        .unwrap();
        fs::write(dir.path().join("dvf2022.csv"), "no,useful,columns\n1,2,3\n").unwrap();
        fs::write(dir.path().join("notes.csv"), "insee_com\n1\n").unwrap();

        assert_eq!(discover(dir.path(), &[]).len(), 3);
        assert_eq!(discover(dir.path(), &[2024]).len(), 1);

        let table = load_market_table(dir.path(), &[]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.years(), vec![2023, 2024]);
    }

    #[test]
    fn test_missing_directory_is_an_empty_table() {
        let table = load_market_table(Path::new("/nonexistent/immo-data"), &[]);
        assert!(table.is_empty());
    }
}
