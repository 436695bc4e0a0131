/**
 * Case Numbers
 *
 * Human-readable case identifiers of the form `PREFIX-YEAR-SEQ`, for
 * example `1000HILLS-2025-007`. The sequence restarts at 1 every year and
 * is zero-padded to at least three digits; sequences past 999 simply grow
 * wider (`1000HILLS-2025-1000`).
 *
 * The prefix may itself contain dashes, so parsing splits from the right.
 */
use crate::shared::error::SharedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed case identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseNumber {
    pub prefix: String,
    pub year: i32,
    pub sequence: u32,
}

impl CaseNumber {
    pub fn new(prefix: impl Into<String>, year: i32, sequence: u32) -> Self {
        Self {
            prefix: prefix.into(),
            year,
            sequence,
        }
    }

    /// The `PREFIX-YEAR-` head shared by every case number of one year.
    pub fn year_head(prefix: &str, year: i32) -> String {
        format!("{}-{}-", prefix, year)
    }
}

impl fmt::Display for CaseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:03}", self.prefix, self.year, self.sequence)
    }
}

impl FromStr for CaseNumber {
    type Err = SharedError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || SharedError::validation("case_number", format!("'{}' is not PREFIX-YEAR-SEQ", raw));

        let mut parts = raw.rsplitn(3, '-');
        let sequence = parts.next().ok_or_else(invalid)?;
        let year = parts.next().ok_or_else(invalid)?;
        let prefix = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

        if sequence.len() < 3 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self {
            prefix: prefix.to_string(),
            year: year.parse().map_err(|_| invalid())?,
            sequence: sequence.parse().map_err(|_| invalid())?,
        })
    }
}
