//! Field-level comparison between a stored row and an incoming record.
//!
//! The stored row arrives positionally ordered to match the source field
//! list (the synchronizer selects columns in that order); the incoming record
//! is keyed by field name. Both sides are reduced to a canonical string form
//! before comparison: numeric text round-trips through its numeric value, so
//! a driver that reports `9.90` back as the real `9.9` does not trigger a
//! spurious update. The flip side is that values distinguished only by
//! numeric formatting (`"01"` vs `"1"`) compare equal.
//!
//! A stored SQL NULL differs from every present value, including the empty
//! string. Columns added after a row was inserted are NULL for that row, so
//! the first sync after a column addition rewrites them once and later runs
//! are stable.

use crate::source::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub column: String,
    pub value: String,
}

/// Ordered set of non-identifier fields whose value differs from the stored
/// row. Order follows the source field list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

/// Compares a stored row against an incoming record and returns the fields
/// that must be rewritten. The field at `key_index` is never part of the
/// result; a field missing from the record is skipped.
pub fn diff_record(
    fields: &[String],
    key_index: usize,
    stored: &[Option<String>],
    incoming: &Record,
) -> ChangeSet {
    let mut set = ChangeSet::default();
    for (idx, field) in fields.iter().enumerate() {
        if idx == key_index {
            continue;
        }
        let Some(new_value) = incoming.get(field) else {
            continue;
        };
        let existing = stored.get(idx).and_then(|value| value.as_deref());
        if !values_equal(existing, new_value) {
            set.changes.push(Change {
                column: field.clone(),
                value: new_value.to_string(),
            });
        }
    }
    set
}

fn values_equal(stored: Option<&str>, incoming: &str) -> bool {
    match stored {
        None => false,
        Some(existing) => canonical(existing) == canonical(incoming),
    }
}

/// Canonical comparison form: integer text collapses to its `i64` rendering,
/// other numeric text to its `f64` rendering, everything else compares as-is.
fn canonical(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return int.to_string();
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return float.to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::new(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn identical_rows_yield_empty_change_set() {
        let fields = fields(&["id", "name", "price"]);
        let stored = vec![
            Some("1".to_string()),
            Some("alice".to_string()),
            Some("9.99".to_string()),
        ];
        let incoming = record(&[("id", "1"), ("name", "alice"), ("price", "9.99")]);
        assert!(diff_record(&fields, 0, &stored, &incoming).is_empty());
    }

    #[test]
    fn single_changed_field_is_reported_alone() {
        let fields = fields(&["id", "name", "price"]);
        let stored = vec![
            Some("1".to_string()),
            Some("alice".to_string()),
            Some("9.99".to_string()),
        ];
        let incoming = record(&[("id", "1"), ("name", "alice"), ("price", "10.99")]);
        let set = diff_record(&fields, 0, &stored, &incoming);
        assert_eq!(set.len(), 1);
        assert_eq!(set.changes()[0].column, "price");
        assert_eq!(set.changes()[0].value, "10.99");
    }

    #[test]
    fn identifier_column_is_never_diffed() {
        let fields = fields(&["id", "name"]);
        let stored = vec![Some("1".to_string()), Some("alice".to_string())];
        let incoming = record(&[("id", "2"), ("name", "alice")]);
        assert!(diff_record(&fields, 0, &stored, &incoming).is_empty());
    }

    #[test]
    fn numeric_affinity_round_trip_is_not_a_change() {
        let fields = fields(&["id", "price", "qty"]);
        // Driver reports numerics back in its own rendering.
        let stored = vec![
            Some("1".to_string()),
            Some("9.9".to_string()),
            Some("7".to_string()),
        ];
        let incoming = record(&[("id", "1"), ("price", "9.90"), ("qty", "007")]);
        assert!(diff_record(&fields, 0, &stored, &incoming).is_empty());
    }

    #[test]
    fn null_differs_from_empty_string() {
        let fields = fields(&["id", "email"]);
        let stored = vec![Some("1".to_string()), None];
        let incoming = record(&[("id", "1"), ("email", "")]);
        let set = diff_record(&fields, 0, &stored, &incoming);
        assert_eq!(set.len(), 1);
        assert_eq!(set.changes()[0].column, "email");
        assert_eq!(set.changes()[0].value, "");
    }

    #[test]
    fn short_stored_row_counts_missing_cells_as_null() {
        let fields = fields(&["id", "name", "status"]);
        let stored = vec![Some("1".to_string()), Some("alice".to_string())];
        let incoming = record(&[("id", "1"), ("name", "alice"), ("status", "active")]);
        let set = diff_record(&fields, 0, &stored, &incoming);
        assert_eq!(set.len(), 1);
        assert_eq!(set.changes()[0].column, "status");
    }
}
