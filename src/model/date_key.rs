use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const FORMAT: &str = "%Y-%m-%d";

/// A calendar date in `YYYY-MM-DD` form. This is the sole identifier of a daily record.
///
/// Ordering follows the date, which is also the ordering of the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's date on the local clock.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The `YYYY-MM` prefix shared by every day of this month.
    pub fn month_prefix(&self) -> String {
        self.0.format("%Y-%m").to_string()
    }

    /// Whether `self` falls in the same calendar month as `other`.
    pub fn same_month(&self, other: &DateKey) -> bool {
        self.month_prefix() == other.month_prefix()
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // chrono accepts unpadded fields, the key format does not
        anyhow::ensure!(
            trimmed.len() == 10,
            "Invalid date '{trimmed}', expected YYYY-MM-DD"
        );
        NaiveDate::parse_from_str(trimmed, FORMAT)
            .map(Self)
            .with_context(|| format!("Invalid date '{trimmed}', expected YYYY-MM-DD"))
    }
}

impl Serialize for DateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let key = DateKey::from_str("2025-03-07").unwrap();
        assert_eq!(key.to_string(), "2025-03-07");
        assert_eq!(key.month_prefix(), "2025-03");
    }

    #[test]
    fn test_rejects_bad_dates() {
        assert!(DateKey::from_str("2025-3-7").is_err());
        assert!(DateKey::from_str("2025-02-30").is_err());
        assert!(DateKey::from_str("yesterday").is_err());
    }

    #[test]
    fn test_order_matches_string_order() {
        let mut keys: Vec<DateKey> = ["2025-10-01", "2025-09-30", "2024-12-31"]
            .iter()
            .map(|s| DateKey::from_str(s).unwrap())
            .collect();
        keys.sort();
        let strings: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let mut sorted_strings = strings.clone();
        sorted_strings.sort();
        assert_eq!(strings, sorted_strings);
    }

    #[test]
    fn test_same_month() {
        let a = DateKey::from_str("2025-10-01").unwrap();
        let b = DateKey::from_str("2025-10-31").unwrap();
        let c = DateKey::from_str("2025-11-01").unwrap();
        assert!(a.same_month(&b));
        assert!(!a.same_month(&c));
    }

    #[test]
    fn test_serde_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(DateKey::from_str("2025-01-02").unwrap(), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2025-01-02":1}"#);
        let back: std::collections::BTreeMap<DateKey, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
