//! Grouping resolver: protected-attribute selectors → one group label per row.
//!
//! Labels are canonicalised per attribute: numeric age is bucketed at 30,
//! gender is capitalised, marital status is title-cased, anything else is
//! stringified as-is. Two selectors join with [`GROUP_SEPARATOR`] in caller order.

use crate::common::error::{FairError, FairResult};
use crate::data::domain::{EvaluationTable, FeatureValue};

/// Label shared by every row when no selector is active.
pub const ALL_GROUP: &str = "All";
/// Joins the two halves of a composite group key.
pub const GROUP_SEPARATOR: &str = " | ";
/// Lower edge of the upper age bucket.
pub const AGE_SPLIT: f64 = 30.0;

const AGE_YOUNG: &str = "<30";
const AGE_OLDER: &str = "≥30";
const MISSING_LABEL: &str = "nan";

/// Symbolic selector → concrete feature column. Fixed once the context is built.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtectedRegistry {
    entries: Vec<(String, String)>,
}

impl Default for ProtectedRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                ("gender".into(), "Gender".into()),
                ("marital_status".into(), "Marital_status".into()),
                ("age".into(), "Age".into()),
            ],
        }
    }
}

impl ProtectedRegistry {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add or replace a selector.
    pub fn insert(&mut self, selector: &str, column: &str) {
        match self.entries.iter_mut().find(|(s, _)| s == selector) {
            Some(entry) => entry.1 = column.to_string(),
            None => self.entries.push((selector.to_string(), column.to_string())),
        }
    }

    pub fn column(&self, selector: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, c)| c.as_str())
    }

    /// Resolve a selector, failing on anything unregistered.
    pub fn resolve(&self, selector: &str) -> FairResult<&str> {
        self.column(selector)
            .ok_or_else(|| FairError::UnknownSelector(selector.to_string()))
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }
}

/// How raw values of a protected column become display labels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Canonical {
    /// Numeric age split at 30; carries the column maximum (upper edge is `max + 1`).
    AgeBucket { max: f64 },
    /// Binary-style categorical: `male` → `Male`.
    Capitalize,
    /// Free-form categorical: `single/divorced` → `Single/Divorced`.
    TitleCase,
    Raw,
}

impl Canonical {
    /// Pick the rule for a column, the same way for every call site.
    pub fn for_column(table: &EvaluationTable, column: &str) -> Self {
        match column.to_lowercase().as_str() {
            "age" => match table.numeric_column(column) {
                Some(values) => Canonical::AgeBucket {
                    max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                },
                None => Canonical::Raw,
            },
            "gender" => Canonical::Capitalize,
            "marital_status" => Canonical::TitleCase,
            _ => Canonical::Raw,
        }
    }

    pub fn apply(&self, value: &FeatureValue) -> String {
        match (self, value) {
            (Canonical::AgeBucket { max }, FeatureValue::Number(v)) => age_bucket(*v, *max).to_string(),
            (Canonical::Capitalize, FeatureValue::Text(s)) => capitalize(s),
            (Canonical::TitleCase, FeatureValue::Text(s)) => title_case(s),
            (_, other) => other.to_string(),
        }
    }
}

/// Bucket an age with edges `[0, 30, max + 1)`, left-closed.
///
/// Values outside every bucket (negative, non-finite) get the `nan` label.
pub fn age_bucket(age: f64, max: f64) -> &'static str {
    if !age.is_finite() || age < 0.0 {
        MISSING_LABEL
    } else if age < AGE_SPLIT {
        AGE_YOUNG
    } else if age < max + 1.0 {
        AGE_OLDER
    } else {
        MISSING_LABEL
    }
}

/// First letter upper-case, the rest lower-case.
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Ordering key for bucket labels: the first integer embedded in the text, 0 when none.
///
/// `<30` → 0, `30–49` → 30, `50+` → 50. A label opening with `<` or `≤` has no
/// lower bound, so its key is 0 whatever number follows.
pub fn label_order_key(label: &str) -> u64 {
    let label = label.trim_start();
    if label.starts_with('<') || label.starts_with('≤') {
        return 0;
    }
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Sort labels by their embedded numeric lower bound; ties keep their input order.
pub fn ordered_labels(labels: &[String]) -> Vec<String> {
    let mut sorted = labels.to_vec();
    sorted.sort_by_key(|l| label_order_key(l));
    sorted
}

/// Rows partitioned into groups.
///
/// Groups are kept in first-appearance order, except a single numeric age
/// selector, whose buckets are ordered by their lower bound.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupPartition {
    labels: Vec<String>,
    members: Vec<Vec<usize>>,
    assignment: Vec<usize>,
}

impl GroupPartition {
    fn from_row_labels(row_labels: Vec<String>, order_by_bound: bool) -> Self {
        let mut labels: Vec<String> = Vec::new();
        for label in &row_labels {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        if order_by_bound {
            labels = ordered_labels(&labels);
        }

        let mut members = vec![Vec::new(); labels.len()];
        let mut assignment = Vec::with_capacity(row_labels.len());
        for (row, label) in row_labels.iter().enumerate() {
            let group = labels.iter().position(|l| l == label).unwrap_or_default();
            members[group].push(row);
            assignment.push(group);
        }

        Self {
            labels,
            members,
            assignment,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(label, row indices)` in partition order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.members.iter().map(Vec::as_slice))
    }

    /// Group label of a row, by row position in the table.
    pub fn label_of(&self, row: usize) -> Option<&str> {
        self.assignment.get(row).map(|g| self.labels[*g].as_str())
    }

    /// Position of a row's group in [`Self::labels`].
    pub fn group_of(&self, row: usize) -> Option<usize> {
        self.assignment.get(row).copied()
    }
}

/// Map every row of the table to its group label.
///
/// Zero selectors put every row in [`ALL_GROUP`]; two selectors build a
/// composite key in caller order. More than two is rejected.
pub fn resolve_groups(
    table: &EvaluationTable,
    registry: &ProtectedRegistry,
    selectors: &[String],
) -> FairResult<GroupPartition> {
    if selectors.len() > 2 {
        return Err(FairError::TooManySelectors(selectors.len()));
    }

    let mut resolved = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let column = registry.resolve(selector)?;
        if !table.schema().contains(column) {
            return Err(FairError::UnknownFeature(column.to_string()));
        }
        resolved.push((column, Canonical::for_column(table, column)));
    }

    let row_labels: Vec<String> = table
        .rows()
        .iter()
        .map(|row| {
            if resolved.is_empty() {
                return ALL_GROUP.to_string();
            }
            resolved
                .iter()
                .map(|(column, rule)| match row.feature(column) {
                    Some(value) => rule.apply(value),
                    None => MISSING_LABEL.to_string(),
                })
                .collect::<Vec<_>>()
                .join(GROUP_SEPARATOR)
        })
        .collect();

    let order_by_bound = matches!(resolved.as_slice(), [(_, Canonical::AgeBucket { .. })]);
    Ok(GroupPartition::from_row_labels(row_labels, order_by_bound))
}
