use std::cmp::Ordering;

use crate::airport::Airport;

/// ASCII case-insensitive substring test, the same folding SQLite's `LIKE`
/// applies. An empty needle matches everything.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// True when `needle` occurs in the airport's name or code.
pub fn airport_matches(airport: &Airport, needle: &str) -> bool {
    contains_folded(&airport.name, needle) || contains_folded(&airport.iata_code, needle)
}

/// Busiest first; ties fall back to id so results are deterministic.
pub fn busiest_first(a: &Airport, b: &Airport) -> Ordering {
    b.passengers.cmp(&a.passengers).then(a.id.cmp(&b.id))
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_is_ascii_only() {
        assert!(contains_folded("London Heathrow", "lon"));
        assert!(contains_folded("LHR", "hr"));
        assert!(!contains_folded("Václav Havel", "VÁ"));
    }

    #[test]
    fn escapes_wildcards() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
    }
}
