//! Mapping between human readable map scales and continuous zoom levels.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// One row of a [`ScaleTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleEntry {
    pub label: String,
    pub zoom: f64,
}

impl ScaleEntry {
    pub fn new(label: &str, zoom: f64) -> Self {
        Self {
            label: label.to_string(),
            zoom,
        }
    }
}

static DEFAULT_SCALES: Lazy<ScaleTable> = Lazy::new(|| ScaleTable {
    entries: vec![
        ScaleEntry::new("1:500", 20.0),
        ScaleEntry::new("1:1,000", 19.0),
        ScaleEntry::new("1:2,500", 17.0),
        ScaleEntry::new("1:5,000", 16.0),
        ScaleEntry::new("1:10,000", 15.0),
        ScaleEntry::new("1:25,000", 14.0),
        ScaleEntry::new("1:50,000", 13.0),
        ScaleEntry::new("1:100,000", 12.0),
        ScaleEntry::new("1:250,000", 10.0),
        ScaleEntry::new("1:500,000", 9.0),
        ScaleEntry::new("1:1,000,000", 8.0),
    ],
});

/// Ordered, immutable list of scale labels and the zoom level each maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTable {
    entries: Vec<ScaleEntry>,
}

impl ScaleTable {
    /// Builds a table, rejecting empty input, duplicate labels and
    /// non-finite zoom levels.
    pub fn new(entries: Vec<ScaleEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(MapError::InvalidConfig("scale table is empty".into()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if !entry.zoom.is_finite() {
                return Err(MapError::InvalidConfig(format!(
                    "scale {} has a non-finite zoom",
                    entry.label
                )));
            }
            if entries[..i].iter().any(|e| e.label == entry.label) {
                return Err(MapError::InvalidConfig(format!(
                    "duplicate scale label {}",
                    entry.label
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in web map scale table.
    pub fn standard() -> Self {
        DEFAULT_SCALES.clone()
    }

    /// Zoom level configured for `label`.
    pub fn zoom_for_scale(&self, label: &str) -> Result<f64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.zoom)
            .ok_or_else(|| MapError::UnknownScale(label.to_string()))
    }

    /// Label whose zoom level is closest to `zoom`. Ties go to the entry
    /// listed first.
    pub fn label_for_zoom(&self, zoom: f64) -> &str {
        let mut best = &self.entries[0];
        let mut best_diff = (best.zoom - zoom).abs();
        for entry in &self.entries[1..] {
            let diff = (entry.zoom - zoom).abs();
            if diff < best_diff {
                best = entry;
                best_diff = diff;
            }
        }
        &best.label
    }

    /// Iterator over the labels in table order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn entries(&self) -> &[ScaleEntry] {
        &self.entries
    }
}

impl Default for ScaleTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trip() {
        let table = ScaleTable::standard();
        for label in table.labels() {
            let zoom = table.zoom_for_scale(label).unwrap();
            assert_eq!(table.label_for_zoom(zoom), label);
        }
    }

    #[test]
    fn unknown_label_is_an_error() {
        let table = ScaleTable::standard();
        assert!(matches!(
            table.zoom_for_scale("1:3"),
            Err(MapError::UnknownScale(l)) if l == "1:3"
        ));
    }

    #[test]
    fn fractional_zoom_picks_nearest() {
        let table = ScaleTable::standard();
        assert_eq!(table.label_for_zoom(15.4), "1:10,000");
        assert_eq!(table.label_for_zoom(18.7), "1:1,000");
        assert_eq!(table.label_for_zoom(0.0), "1:1,000,000");
        assert_eq!(table.label_for_zoom(25.0), "1:500");
    }

    #[test]
    fn ties_resolve_to_first_entry() {
        let table = ScaleTable::standard();
        // 18 is one step from both 1:1,000 (19) and 1:2,500 (17).
        assert_eq!(table.label_for_zoom(18.0), "1:1,000");
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(ScaleTable::new(Vec::new()).is_err());
        let dup = vec![ScaleEntry::new("1:1", 1.0), ScaleEntry::new("1:1", 2.0)];
        assert!(ScaleTable::new(dup).is_err());
        assert!(ScaleTable::new(vec![ScaleEntry::new("1:1", f64::NAN)]).is_err());
    }
}
