use std::collections::BTreeMap;

use crate::error::SchemaError;

/// Namespacing separator used by the survey's raw column names.
pub const RAW_SEPARATOR: char = '.';

/// Separator used in canonical column names.
pub const CANONICAL_SEPARATOR: char = '_';

// ---------------------------------------------------------------------------
// Single-name canonicalization
// ---------------------------------------------------------------------------

/// Rewrite one raw column name into its canonical form.
///
/// `Demographics.Ethnicity.Asians` → `Demographics_Ethnicity_Asians`.
/// Names without a separator are returned unchanged, which makes the
/// function idempotent.
pub fn canonical_name(raw: &str) -> String {
    raw.replace(RAW_SEPARATOR, &CANONICAL_SEPARATOR.to_string())
}

// ---------------------------------------------------------------------------
// ColumnMapping – raw → canonical for a whole header
// ---------------------------------------------------------------------------

/// One column of the source header after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnName {
    /// Name as found in the source.
    pub raw: String,
    /// Name with every separator replaced.
    pub canonical: String,
}

/// Ordered raw → canonical mapping for a table header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<ColumnName>,
    by_canonical: BTreeMap<String, usize>,
}

impl ColumnMapping {
    /// Columns in header order.
    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    /// Canonical names in header order.
    pub fn canonical_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.canonical.clone()).collect()
    }

    /// Header position of a canonical column.
    pub fn index_of(&self, canonical: &str) -> Option<usize> {
        self.by_canonical.get(canonical).copied()
    }

    /// Canonical name for a raw column.
    pub fn canonical_for(&self, raw: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.raw == raw)
            .map(|c| c.canonical.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Normalize every raw column name of a header.
///
/// Fails with [`SchemaError::Collision`] when two distinct raw names end up
/// with the same canonical name (`A.B` and `A_B`, for instance). A raw name
/// repeated verbatim is reported the same way, since the second column would
/// otherwise shadow the first.
pub fn normalize_columns<S: AsRef<str>>(raw_names: &[S]) -> Result<ColumnMapping, SchemaError> {
    let mut columns = Vec::with_capacity(raw_names.len());
    let mut by_canonical = BTreeMap::new();

    for (idx, raw) in raw_names.iter().enumerate() {
        let raw = raw.as_ref();
        let canonical = canonical_name(raw);

        if let Some(&prev) = by_canonical.get(&canonical) {
            let first: &ColumnName = &columns[prev];
            return Err(SchemaError::Collision {
                canonical,
                first: first.raw.clone(),
                second: raw.to_string(),
            });
        }

        by_canonical.insert(canonical.clone(), idx);
        columns.push(ColumnName {
            raw: raw.to_string(),
            canonical,
        });
    }

    Ok(ColumnMapping {
        columns,
        by_canonical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_every_separator() {
        assert_eq!(
            canonical_name("Demographics.Ethnicity.Asians"),
            "Demographics_Ethnicity_Asians"
        );
        assert_eq!(
            canonical_name("Employment.Work Activity.Sales, Purchasing, Marketing"),
            "Employment_Work Activity_Sales, Purchasing, Marketing"
        );
        assert_eq!(canonical_name("Year"), "Year");
    }

    #[test]
    fn mapping_keeps_header_order() {
        let mapping =
            normalize_columns(&["Year", "Education.Major", "Salaries.Standard Deviation"]).unwrap();
        assert_eq!(
            mapping.canonical_names(),
            vec!["Year", "Education_Major", "Salaries_Standard Deviation"]
        );
        assert_eq!(mapping.index_of("Education_Major"), Some(1));
        assert_eq!(mapping.canonical_for("Education.Major"), Some("Education_Major"));
        assert_eq!(mapping.columns()[2].raw, "Salaries.Standard Deviation");
    }

    #[test]
    fn collision_is_reported_with_both_names() {
        let err = normalize_columns(&["Education.Major", "Education_Major"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::Collision {
                canonical: "Education_Major".into(),
                first: "Education.Major".into(),
                second: "Education_Major".into(),
            }
        );
    }

    #[test]
    fn duplicate_raw_name_is_a_collision() {
        assert!(matches!(
            normalize_columns(&["Year", "Year"]),
            Err(SchemaError::Collision { .. })
        ));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(names in proptest::collection::btree_set("[A-Za-z. _/]{1,12}", 0..12)) {
            let names: Vec<String> = names.into_iter().collect();
            if let Ok(once) = normalize_columns(&names) {
                let twice = normalize_columns(&once.canonical_names()).unwrap();
                prop_assert_eq!(twice.canonical_names(), once.canonical_names());
            }
        }

        #[test]
        fn canonical_names_never_contain_the_raw_separator(name in "[A-Za-z. ]{0,20}") {
            let canonical = canonical_name(&name);
            prop_assert!(!canonical.contains(RAW_SEPARATOR));
            prop_assert_eq!(canonical_name(&canonical), canonical.clone());
        }
    }
}
