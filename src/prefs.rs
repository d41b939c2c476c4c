// src/prefs.rs
//! User preference policy: a market allow-list plus sector/industry
//! include/exclude lists, loaded from a TOML document.
//!
//! A missing document means "nothing to enforce". All matching is
//! case-insensitive; empty lists impose no constraint.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub markets: MarketPolicy,
    pub sectors: ListPolicy,
    pub industries: ListPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketPolicy {
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListPolicy {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl ListPolicy {
    fn permits(&self, value: &str) -> bool {
        if self.exclude.iter().any(|e| e.eq_ignore_ascii_case(value)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|i| i.eq_ignore_ascii_case(value))
    }
}

impl Preferences {
    /// Load the preference document. Missing file -> `Ok(None)`;
    /// unreadable or malformed TOML is an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading preferences from {}", path.display()))?;
        let prefs = toml::from_str(&content)
            .with_context(|| format!("parsing preferences from {}", path.display()))?;
        Ok(Some(prefs))
    }

    /// Checked once per run; a disallowed market fails the whole run.
    pub fn market_is_allowed(&self, market: &str) -> bool {
        self.markets.allow.is_empty()
            || self
                .markets
                .allow
                .iter()
                .any(|m| m.eq_ignore_ascii_case(market))
    }

    /// Per-candidate gate over the sector and industry policies.
    pub fn matches_sector_industry(&self, sector: &str, industry: &str) -> bool {
        self.sectors.permits(sector) && self.industries.permits(industry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(doc: &str) -> Preferences {
        toml::from_str(doc).unwrap()
    }

    #[test]
    fn empty_document_permits_everything() {
        let p = prefs("");
        assert!(p.market_is_allowed("us"));
        assert!(p.matches_sector_industry("Technology", "Semiconductors"));
    }

    #[test]
    fn market_allow_list_is_case_insensitive() {
        let p = prefs("[markets]\nallow = [\"US\", \"eu\"]\n");
        assert!(p.market_is_allowed("us"));
        assert!(p.market_is_allowed("EU"));
        assert!(!p.market_is_allowed("jp"));
    }

    #[test]
    fn exclude_beats_include() {
        let p = prefs(
            "[sectors]\ninclude = [\"Technology\", \"Healthcare\"]\nexclude = [\"healthcare\"]\n",
        );
        assert!(p.matches_sector_industry("Technology", ""));
        assert!(!p.matches_sector_industry("Healthcare", ""));
        assert!(!p.matches_sector_industry("Energy", ""));
    }

    #[test]
    fn industry_policy_is_independent_of_sector_policy() {
        let p = prefs("[industries]\nexclude = [\"Biotechnology\"]\n");
        assert!(p.matches_sector_industry("Healthcare", "Drug Manufacturers"));
        assert!(!p.matches_sector_industry("Healthcare", "Biotechnology"));
    }

    #[test]
    fn empty_field_fails_only_nonempty_include_lists() {
        let p = prefs("[sectors]\ninclude = [\"Technology\"]\n");
        assert!(!p.matches_sector_industry("", ""));
        let open = prefs("[sectors]\nexclude = [\"Energy\"]\n");
        assert!(open.matches_sector_industry("", ""));
    }

    #[test]
    fn load_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Preferences::load(&tmp.path().join("absent.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn load_malformed_document_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prefs.toml");
        fs::write(&path, "markets = 3").unwrap();
        assert!(Preferences::load(&path).is_err());
    }
}
