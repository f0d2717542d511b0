//! Screens non-personnel manifest lines (freight, mail, tools) out of passenger counts.
//!
//! Matching is a case-insensitive substring test on `"{name} {company}"`, so a
//! passenger surnamed "Parts" is screened out too. The keyword list is
//! configurable for that reason.

use crate::model::Passenger;

pub const DEFAULT_CARGO_KEYWORDS: &[&str] = &[
    "cargo", "package", "packages", "sample", "samples", "mail", "tool", "tools", "parts", "supply",
    "supplies",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoFilter {
    keywords: Vec<String>,
}

impl Default for CargoFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CARGO_KEYWORDS.iter().copied())
    }
}

impl CargoFilter {
    /// Keywords are lower-cased; blank entries are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_cargo(&self, passenger: &Passenger) -> bool {
        let text = format!("{} {}", passenger.name, passenger.company).to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Entries that are people.
    pub fn personnel<'a>(&self, list: &'a [Passenger]) -> Vec<&'a Passenger> {
        list.iter().filter(|p| !self.is_cargo(p)).collect()
    }
}
