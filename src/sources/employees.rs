//! Mapping from attendance (RAMS) names to Time Doctor user names.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TrackerMatch {
    /// Employee uses Time Doctor under this name.
    Mapped(String),
    /// Employee is known but does not use Time Doctor.
    NoTracker,
    /// Employee is not in the map.
    Unknown,
}

/// "Abdulla (100025)" -> "abdulla", "DONALD JERRY (2)" -> "donald jerry"
pub fn normalise(rams_name: &str) -> String {
    let base = match rams_name.find('(') {
        Some(idx) => &rams_name[..idx],
        None => rams_name,
    };
    base.trim().to_lowercase()
}

/// Map values are Time Doctor names; an empty value marks "no Time Doctor".
pub fn lookup(map: &BTreeMap<String, String>, rams_name: &str) -> TrackerMatch {
    let key = normalise(rams_name);
    let found = map
        .iter()
        .find(|(k, _)| normalise(k) == key)
        .map(|(_, v)| v.trim());

    match found {
        Some("") => TrackerMatch::NoTracker,
        Some(name) => TrackerMatch::Mapped(name.to_string()),
        None => TrackerMatch::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("donald jerry".to_string(), "Donald".to_string()),
            ("towsif".to_string(), "Towsif Ahmed Khalid".to_string()),
            ("yasmin".to_string(), String::new()),
        ])
    }

    #[test]
    fn test_normalise_strips_id_suffix() {
        assert_eq!(normalise("Abdulla (100025)"), "abdulla");
        assert_eq!(normalise("DONALD JERRY (2)"), "donald jerry");
        assert_eq!(normalise("  Towsif  "), "towsif");
    }

    #[test]
    fn test_lookup_mapped() {
        assert_eq!(
            lookup(&map(), "Donald Jerry (17)"),
            TrackerMatch::Mapped("Donald".to_string())
        );
    }

    #[test]
    fn test_lookup_no_tracker() {
        assert_eq!(lookup(&map(), "YASMIN (4)"), TrackerMatch::NoTracker);
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(lookup(&map(), "Someone Else"), TrackerMatch::Unknown);
    }
}
