use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::{MAJOR_COLUMN, YEAR_COLUMN};
use super::normalize::ColumnMapping;

// ---------------------------------------------------------------------------
// MetricGroup – the namespace a numeric column belongs to
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricGroup {
    Demographics,
    Ethnicity,
    Gender,
    Degrees,
    EmployerType,
    WorkActivity,
    EmploymentStatus,
    Salaries,
    Other,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 9] = [
        MetricGroup::Demographics,
        MetricGroup::Ethnicity,
        MetricGroup::Gender,
        MetricGroup::Degrees,
        MetricGroup::EmployerType,
        MetricGroup::WorkActivity,
        MetricGroup::EmploymentStatus,
        MetricGroup::Salaries,
        MetricGroup::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricGroup::Demographics => "Demographics",
            MetricGroup::Ethnicity => "Ethnicity",
            MetricGroup::Gender => "Gender",
            MetricGroup::Degrees => "Degrees",
            MetricGroup::EmployerType => "EmployerType",
            MetricGroup::WorkActivity => "WorkActivity",
            MetricGroup::EmploymentStatus => "EmploymentStatus",
            MetricGroup::Salaries => "Salaries",
            MetricGroup::Other => "Other",
        }
    }

    /// Classify a canonical column name by its namespace prefix.
    /// Returns the group and the label inside it.
    fn classify(canonical: &str) -> (MetricGroup, String) {
        NAMESPACES
            .iter()
            .find_map(|(prefix, group)| {
                canonical
                    .strip_prefix(prefix)
                    .filter(|label| !label.is_empty())
                    .map(|label| (*group, label.to_string()))
            })
            .unwrap_or_else(|| (MetricGroup::Other, canonical.to_string()))
    }
}

/// Canonical namespace prefixes, most specific first.
const NAMESPACES: [(&str, MetricGroup); 8] = [
    ("Demographics_Ethnicity_", MetricGroup::Ethnicity),
    ("Demographics_Gender_", MetricGroup::Gender),
    ("Demographics_", MetricGroup::Demographics),
    ("Education_Degrees_", MetricGroup::Degrees),
    ("Employment_Employer Type_", MetricGroup::EmployerType),
    ("Employment_Work Activity_", MetricGroup::WorkActivity),
    ("Employment_Status_", MetricGroup::EmploymentStatus),
    ("Salaries_", MetricGroup::Salaries),
];

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricGroup::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| format!("unknown metric group '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// MetricKey – stable semantic address of a numeric column
// ---------------------------------------------------------------------------

/// `EmployerType.Business/Industry`, `WorkActivity.Teaching`, …
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MetricKey {
    pub group: MetricGroup,
    pub label: String,
}

impl MetricKey {
    pub fn new(group: MetricGroup, label: impl Into<String>) -> Self {
        Self {
            group,
            label: label.into(),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.label)
    }
}

impl FromStr for MetricKey {
    type Err = String;

    /// Split on the first `.` only; labels may contain further dots or slashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, label) = s
            .split_once('.')
            .ok_or_else(|| format!("metric key '{s}' has no group prefix"))?;
        if label.is_empty() {
            return Err(format!("metric key '{s}' has an empty label"));
        }
        Ok(MetricKey::new(group.parse()?, label))
    }
}

// ---------------------------------------------------------------------------
// MetricCatalog – semantic key → canonical column, built once at load time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricCatalog {
    columns: BTreeMap<MetricKey, String>,
    /// Keys per group in source header order.
    groups: BTreeMap<MetricGroup, Vec<MetricKey>>,
}

impl MetricCatalog {
    /// Build the catalog from a normalized header. Categorical columns
    /// (year, major) are not metrics and are skipped.
    pub fn from_mapping(mapping: &ColumnMapping) -> Self {
        let mut catalog = MetricCatalog::default();
        for column in mapping.columns() {
            if column.canonical == YEAR_COLUMN || column.canonical == MAJOR_COLUMN {
                continue;
            }
            catalog.insert(&column.canonical);
        }
        catalog
    }

    fn insert(&mut self, canonical: &str) {
        let (group, label) = MetricGroup::classify(canonical);
        let key = MetricKey::new(group, label);
        if self.columns.contains_key(&key) {
            return;
        }
        self.groups.entry(group).or_default().push(key.clone());
        self.columns.insert(key, canonical.to_string());
    }

    /// Canonical column for a semantic key.
    pub fn column(&self, key: &MetricKey) -> Option<&str> {
        self.columns.get(key).map(String::as_str)
    }

    /// All keys of a group, in header order. Empty when the group is absent.
    pub fn group(&self, group: MetricGroup) -> &[MetricKey] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &MetricKey) -> bool {
        self.columns.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::normalize_columns;

    fn catalog() -> MetricCatalog {
        let mapping = normalize_columns(&[
            "Year",
            "Education.Major",
            "Demographics.Total",
            "Demographics.Gender.Females",
            "Employment.Employer Type.Business/Industry",
            "Employment.Employer Type.Government",
            "Employment.Work Activity.Sales, Purchasing, Marketing",
            "Employment.Status.Unemployed",
            "Salaries.Standard Deviation",
            "Notes",
        ])
        .unwrap();
        MetricCatalog::from_mapping(&mapping)
    }

    #[test]
    fn classifies_by_namespace() {
        let catalog = catalog();
        let key: MetricKey = "EmployerType.Business/Industry".parse().unwrap();
        assert_eq!(
            catalog.column(&key),
            Some("Employment_Employer Type_Business/Industry")
        );
        assert_eq!(
            catalog.column(&MetricKey::new(MetricGroup::WorkActivity, "Sales, Purchasing, Marketing")),
            Some("Employment_Work Activity_Sales, Purchasing, Marketing")
        );
        assert!(catalog.contains(&MetricKey::new(MetricGroup::Gender, "Females")));
        assert!(catalog.contains(&MetricKey::new(MetricGroup::Demographics, "Total")));
        assert!(catalog.contains(&MetricKey::new(MetricGroup::Other, "Notes")));
    }

    #[test]
    fn skips_categorical_columns() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 8);
        assert!(!catalog.contains(&MetricKey::new(MetricGroup::Other, "Year")));
    }

    #[test]
    fn group_keeps_header_order() {
        let catalog = catalog();
        let labels: Vec<&str> = catalog
            .group(MetricGroup::EmployerType)
            .iter()
            .map(|k| k.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Business/Industry", "Government"]);
        assert!(catalog.group(MetricGroup::Degrees).is_empty());
    }

    #[test]
    fn key_display_round_trips() {
        let key = MetricKey::new(MetricGroup::EmploymentStatus, "Not in Labor Force");
        assert_eq!(key.to_string(), "EmploymentStatus.Not in Labor Force");
        assert_eq!(key.to_string().parse::<MetricKey>().unwrap(), key);
        assert!("Bogus.Thing".parse::<MetricKey>().is_err());
        assert!("EmployerType".parse::<MetricKey>().is_err());
    }
}
