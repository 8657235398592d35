//! Normalises vendor forest-type codes (`code_tfv`) into the nine-code
//! canonical classification vocabulary, and buckets intersected parcels by
//! canonical code or by dominant species.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use meridian_db::ForestBreakdownRow;

/// Sentinel species label used when a parcel's `essence1` is empty or
/// whitespace-only.
pub const UNSPECIFIED_SPECIES: &str = "indetermine";

/// The nine terminal codes every raw vendor code normalises to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalCode {
    Ff1,
    Ff2,
    Ff3,
    Ff4,
    Fo1,
    Fo2,
    Fo3,
    La,
    Fp,
}

impl CanonicalCode {
    /// Normalises a raw `code_tfv` value against the fixed relation. `FF4`
    /// is the exhaustive catch-all, so this function is total: every
    /// non-empty raw code maps to exactly one canonical code.
    pub fn normalize(raw: &str) -> Self {
        if raw.starts_with("FF1") || raw == "FF0" || matches!(raw, "AFJ" | "AFV" | "HFW" | "HFZ" | "QF") {
            Self::Ff1
        } else if raw.starts_with("FF2") || matches!(raw, "CPJ" | "CPV" | "CRJ" | "CRV") {
            Self::Ff2
        } else if raw.starts_with("FF3") || matches!(raw, "FR" | "MR") {
            Self::Ff3
        } else if raw.starts_with("FO1") || raw == "30" {
            Self::Fo1
        } else if raw.starts_with("FO2") {
            Self::Fo2
        } else if raw.starts_with("FO3") {
            Self::Fo3
        } else if raw.starts_with("LA") || raw == "40" {
            Self::La
        } else if raw == "FP" || raw == "50" {
            Self::Fp
        } else {
            Self::Ff4
        }
    }

    /// The machine-readable canonical code string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ff1 => "FF1",
            Self::Ff2 => "FF2",
            Self::Ff3 => "FF3",
            Self::Ff4 => "FF4",
            Self::Fo1 => "FO1",
            Self::Fo2 => "FO2",
            Self::Fo3 => "FO3",
            Self::La => "LA",
            Self::Fp => "FP",
        }
    }

    /// The display label from the external vocabulary. Treated as an
    /// opaque string by this crate.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ff1 => "Foret fermee de feuillus purs",
            Self::Ff2 => "Foret fermee de coniferes purs",
            Self::Ff3 => "Foret fermee melangee",
            Self::Ff4 => "Autre formation forestiere",
            Self::Fo1 => "Foret ouverte de feuillus purs",
            Self::Fo2 => "Foret ouverte de coniferes purs",
            Self::Fo3 => "Foret ouverte melangee",
            Self::La => "Lande",
            Self::Fp => "Peupleraie",
        }
    }
}

/// Buckets intersected parcel rows by canonical code, summing intersected
/// area (ha) per bucket, ordered by descending area.
pub fn bucket_by_canonical_code(rows: &[ForestBreakdownRow]) -> Vec<(CanonicalCode, f64)> {
    let mut totals: HashMap<CanonicalCode, f64> = HashMap::new();
    for row in rows {
        let code = CanonicalCode::normalize(&row.code_tfv);
        *totals.entry(code).or_insert(0.0) += row.intersected_area_m2 / 10_000.0;
    }

    let mut ordered: Vec<_> = totals.into_iter().collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ordered
}

/// Buckets intersected parcel rows by dominant species, summing intersected
/// area (ha) per bucket, ordered by descending area. Empty or
/// whitespace-only species collapse into [`UNSPECIFIED_SPECIES`].
pub fn bucket_by_species(rows: &[ForestBreakdownRow]) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in rows {
        let species = row
            .essence1
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNSPECIFIED_SPECIES);
        *totals.entry(species.to_string()).or_insert(0.0) += row.intersected_area_m2 / 10_000.0;
    }

    let mut ordered: Vec<_> = totals.into_iter().collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_table_rows_exactly() {
        assert_eq!(CanonicalCode::normalize("FF1-09-09"), CanonicalCode::Ff1);
        assert_eq!(CanonicalCode::normalize("FF0"), CanonicalCode::Ff1);
        assert_eq!(CanonicalCode::normalize("AFJ"), CanonicalCode::Ff1);
        assert_eq!(CanonicalCode::normalize("CPV"), CanonicalCode::Ff2);
        assert_eq!(CanonicalCode::normalize("FF3-01"), CanonicalCode::Ff3);
        assert_eq!(CanonicalCode::normalize("MR"), CanonicalCode::Ff3);
        assert_eq!(CanonicalCode::normalize("30"), CanonicalCode::Fo1);
        assert_eq!(CanonicalCode::normalize("FO2-X"), CanonicalCode::Fo2);
        assert_eq!(CanonicalCode::normalize("FO3-X"), CanonicalCode::Fo3);
        assert_eq!(CanonicalCode::normalize("40"), CanonicalCode::La);
        assert_eq!(CanonicalCode::normalize("LA-02"), CanonicalCode::La);
        assert_eq!(CanonicalCode::normalize("FP"), CanonicalCode::Fp);
        assert_eq!(CanonicalCode::normalize("50"), CanonicalCode::Fp);
    }

    #[test]
    fn unrecognised_codes_fall_back_to_the_catch_all() {
        assert_eq!(CanonicalCode::normalize("ZZZ"), CanonicalCode::Ff4);
        assert_eq!(CanonicalCode::normalize(""), CanonicalCode::Ff4);
    }

    fn row(code_tfv: &str, essence1: Option<&str>, area_m2: f64) -> ForestBreakdownRow {
        ForestBreakdownRow {
            code_tfv: code_tfv.to_string(),
            essence1: essence1.map(str::to_string),
            intersected_area_m2: area_m2,
        }
    }

    #[test]
    fn scenario_s4_buckets_into_ff1_and_ff2_ordered_by_area() {
        let rows = vec![
            row("FF1-09-09", Some("chene"), 20_000.0),
            row("AFJ", Some("chene"), 10_000.0),
            row("CPV", Some("pin"), 5_000.0),
        ];

        let breakdown = bucket_by_canonical_code(&rows);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].0, CanonicalCode::Ff1);
        assert_eq!(breakdown[0].1, 3.0);
        assert_eq!(breakdown[1].0, CanonicalCode::Ff2);
        assert_eq!(breakdown[1].1, 0.5);
    }

    #[test]
    fn species_breakdown_collapses_empty_and_whitespace_to_the_sentinel() {
        let rows = vec![
            row("FF1", Some(""), 10_000.0),
            row("FF1", Some("   "), 10_000.0),
            row("FF1", None, 10_000.0),
            row("FF1", Some("chene"), 30_000.0),
        ];

        let breakdown = bucket_by_species(&rows);
        assert_eq!(breakdown[0].0, "chene");
        assert_eq!(breakdown[0].1, 3.0);
        assert_eq!(breakdown[1].0, UNSPECIFIED_SPECIES);
        assert_eq!(breakdown[1].1, 3.0);
    }
}
