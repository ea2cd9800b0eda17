//! Bundled airport dataset and its CSV parser.
//!
//! The text starts with an `id,iata_code,name,passengers` header. Lines
//! starting with `#` are comments; names containing commas are quoted.

use std::{fmt, io::Cursor};

use serde::Deserialize;

use crate::airport::Airport;

/// Airport dataset shipped with the crate.
pub const BUNDLED_AIRPORTS: &str = include_str!("../data/airports.csv");

/// Malformed seed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedError {
    /// 1-based line number in the source text, 0 when unknown.
    pub line: u64,
    /// What was wrong with the line.
    pub reason: String,
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seed line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for SeedError {}

impl From<csv::Error> for SeedError {
    fn from(value: csv::Error) -> Self {
        Self {
            line: value.position().map_or(0, |p| p.line()),
            reason: value.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    id: i64,
    iata_code: String,
    name: String,
    passengers: i64,
}

/// Parses CSV airport rows.
pub fn parse_airports(text: &str) -> Result<Vec<Airport>, SeedError> {
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(text));
    let headers = rdr.headers()?.clone();

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: SeedRow = record
            .deserialize(Some(&headers))
            .map_err(|e| SeedError {
                line,
                reason: e.to_string(),
            })?;
        if row.iata_code.is_empty() {
            return Err(SeedError {
                line,
                reason: "empty iata_code".to_string(),
            });
        }
        if row.name.is_empty() {
            return Err(SeedError {
                line,
                reason: "empty name".to_string(),
            });
        }
        out.push(Airport {
            id: row.id,
            iata_code: row.iata_code,
            name: row.name,
            passengers: row.passengers,
        });
    }
    Ok(out)
}

/// Parses [`BUNDLED_AIRPORTS`].
pub fn bundled_airports() -> Result<Vec<Airport>, SeedError> {
    parse_airports(BUNDLED_AIRPORTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,iata_code,name,passengers\n";

    #[test]
    fn parses_quoted_names_with_commas() {
        let text = format!("{HEADER}# comment\n\n7,XYZ,\"Somewhere, North Field\",42\n");
        let rows = parse_airports(&text).expect("parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Somewhere, North Field");
        assert_eq!(rows[0].passengers, 42);
    }

    #[test]
    fn reports_line_numbers() {
        let text = format!("{HEADER}1,OPO,Porto,10\n2,LIS,Lisbon,lots\n");
        let err = parse_airports(&text).expect_err("bad row");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn rejects_empty_code() {
        let text = format!("{HEADER}1, ,Porto,10\n");
        let err = parse_airports(&text).expect_err("empty code");
        assert_eq!(err.line, 2);
        assert_eq!(err.reason, "empty iata_code");
    }

    #[test]
    fn bundled_dataset_has_unique_codes() {
        let rows = bundled_airports().expect("bundled");
        let mut codes: Vec<_> = rows.iter().map(|a| a.iata_code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), rows.len());
        assert!(rows.iter().all(|a| a.iata_code.len() == 3));
    }
}
