use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read an input file, parsed as YAML for `.yaml`/`.yml` and JSON otherwise.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use immo_sim_core::financing::Financing;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_reads_yaml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "principal: \"196000\"\nannual_rate: \"0.038\"\nterm_years: 20").unwrap();

        let financing: Financing = read_input(file.path().to_str().unwrap()).unwrap();
        assert_eq!(financing.principal, dec!(196000));
        assert_eq!(financing.term_years, 20);
    }

    #[test]
    fn test_reads_json_otherwise() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"principal": "1000", "annual_rate": "0", "term_years": 1}}"#).unwrap();

        let financing: Financing = read_input(file.path().to_str().unwrap()).unwrap();
        assert_eq!(financing.annual_rate, dec!(0));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = read_input::<Financing>("/nonexistent/immo-input.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
