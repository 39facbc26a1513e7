use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalityMatch {
    pub code: String,
    pub name: String,
}

impl MunicipalityMatch {
    /// "Name (code)"
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// Official municipality codes and their display names.
#[derive(Debug, Clone, Default)]
pub struct MunicipalityRegistry {
    code_to_name: BTreeMap<String, String>,
    name_to_code: HashMap<String, String>,
}

impl MunicipalityRegistry {
    pub fn new<I, C, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut registry = Self::default();
        for (code, name) in entries {
            let code = code.into().trim().to_string();
            let name = name.into().trim().to_string();
            if code.is_empty() || name.is_empty() {
                continue;
            }
            registry.name_to_code.insert(normalize(&name), code.clone());
            registry.code_to_name.insert(code, name);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.code_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code_to_name.is_empty()
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.code_to_name.get(code).map(String::as_str)
    }

    /// Case- and whitespace-insensitive lookup by exact name.
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_code.get(&normalize(name)).map(String::as_str)
    }

    /// Name, or the code itself for unknown municipalities.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.name(code).unwrap_or(code)
    }

    /// Municipalities whose code or name contains `term`, restricted to the
    /// `available` codes, sorted by name and capped at `limit`.
    pub fn search(
        &self,
        term: &str,
        available: &BTreeSet<String>,
        limit: usize,
    ) -> Vec<MunicipalityMatch> {
        let needle = normalize(term);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<MunicipalityMatch> = self
            .code_to_name
            .iter()
            .filter(|(code, _)| available.contains(code.as_str()))
            .filter(|(code, name)| {
                code.to_lowercase().contains(&needle) || normalize(name).contains(&needle)
            })
            .take(limit)
            .map(|(code, name)| MunicipalityMatch {
                code: code.clone(),
                name: name.clone(),
            })
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        matches
    }
}

/// Extract the code from a "Name (code)" display string.
pub fn code_from_display(display: &str) -> Option<&str> {
    let (_, rest) = display.rsplit_once('(')?;
    let code = rest.trim_end().strip_suffix(')')?.trim();
    (!code.is_empty()).then_some(code)
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MunicipalityRegistry {
        MunicipalityRegistry::new([
            ("75056", "Paris"),
            ("13055", "Marseille"),
            ("69123", "Lyon"),
            ("69381", "Lyon 1er Arrondissement"),
        ])
    }

    fn available(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_lookups() {
        let r = registry();
        assert_eq!(r.name("69123"), Some("Lyon"));
        assert_eq!(r.code_for_name("  MARSEILLE "), Some("13055"));
        assert_eq!(r.display_name("00000"), "00000");
    }

    #[test]
    fn test_search_restricted_to_available_codes() {
        let r = registry();
        let found = r.search("lyon", &available(&["69123", "75056"]), DEFAULT_SEARCH_LIMIT);
        assert_eq!(
            found,
            vec![MunicipalityMatch { code: "69123".into(), name: "Lyon".into() }]
        );
    }

    #[test]
    fn test_search_by_code_sorted_by_name() {
        let r = registry();
        let found = r.search("5", &available(&["75056", "13055"]), DEFAULT_SEARCH_LIMIT);
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Marseille", "Paris"]);
        assert!(r.search("   ", &available(&["75056"]), 10).is_empty());
    }

    #[test]
    fn test_display_round_trip() {
        let m = MunicipalityMatch { code: "75056".into(), name: "Paris".into() };
        assert_eq!(m.display(), "Paris (75056)");
        assert_eq!(code_from_display(&m.display()), Some("75056"));
        assert_eq!(code_from_display("Paris"), None);
    }
}
