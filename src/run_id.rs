// src/run_id.rs
//! Run identity: the strict `YYYY-MM-DD-HHMMSS` identifier naming one
//! screening run and every on-disk artifact belonging to it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::IDEA_SCREENS_DIR_NAME;

pub const RUN_ID_FORMAT: &str = "YYYY-MM-DD-HHMMSS";

fn run_id_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{6}$").unwrap())
}

/// A validated run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Fresh identifier from the current UTC time.
    pub fn mint() -> Self {
        Self(Utc::now().format("%Y-%m-%d-%H%M%S").to_string())
    }

    /// Lexical validation only; `context` names the offending input in the
    /// error (a flag name or a path).
    pub fn validate(value: &str, context: &str) -> Result<()> {
        if run_id_re().is_match(value) {
            Ok(())
        } else {
            bail!("invalid {context}: '{value}'; expected format {RUN_ID_FORMAT}");
        }
    }

    pub fn parse(value: &str, context: &str) -> Result<Self> {
        Self::validate(value, context)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, "run id")
    }
}

/// The run id embedded in a path: the component following the first
/// `idea-screens` marker segment, unvalidated.
pub fn extract_from_path(path: &Path) -> Option<String> {
    let mut components = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    components
        .by_ref()
        .find(|part| part == IDEA_SCREENS_DIR_NAME)?;
    components.next()
}
