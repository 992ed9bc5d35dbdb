//! The histogram ledger: one row per (region, process, variation) with the file and
//! histogram holding its template.
//!
//! Selection is a pure function of the table and a [`LedgerFilter`] expressed as data.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tg_core::{ProcessKind, Result};

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Region label, e.g. `CR_pass`.
    pub region: String,
    /// Process name, e.g. `ttbar`.
    pub process: String,
    /// Process classification.
    pub process_type: ProcessKind,
    /// Variation tag (`nominal` for central values).
    pub variation: String,
    /// File holding the template.
    pub source_filename: String,
    /// Histogram name inside `source_filename`.
    pub source_histname: String,
}

/// A row-oriented ledger table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    /// Ledger over `rows`.
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the ledger has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy with `substitutions` applied to every region label and source histogram name.
    pub fn substituted(&self, substitutions: &NameSubstitution) -> Ledger {
        let rows = self
            .rows
            .iter()
            .map(|r| LedgerRow {
                region: substitutions.apply(&r.region),
                source_histname: substitutions.apply(&r.source_histname),
                ..r.clone()
            })
            .collect();
        Ledger { rows }
    }
}

/// Read a ledger from a JSON array of rows.
pub fn read_ledger(path: &Path) -> Result<Ledger> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Row predicate as data. `None` on a field accepts every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Accepted regions.
    pub regions: Option<BTreeSet<String>>,
    /// Accepted process kinds.
    pub process_types: Option<BTreeSet<ProcessKind>>,
    /// Accepted variations.
    pub variations: Option<BTreeSet<String>>,
}

impl LedgerFilter {
    /// Accept every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to `regions`.
    pub fn regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to `kinds`.
    pub fn process_types(mut self, kinds: impl IntoIterator<Item = ProcessKind>) -> Self {
        self.process_types = Some(kinds.into_iter().collect());
        self
    }

    /// Restrict to `variations`.
    pub fn variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variations = Some(variations.into_iter().map(Into::into).collect());
        self
    }

    /// True if `row` passes every restriction.
    pub fn accepts(&self, row: &LedgerRow) -> bool {
        self.regions.as_ref().is_none_or(|s| s.contains(&row.region))
            && self.process_types.as_ref().is_none_or(|s| s.contains(&row.process_type))
            && self.variations.as_ref().is_none_or(|s| s.contains(&row.variation))
    }
}

/// Rows of `table` accepted by `filter`, in table order.
pub fn filter_ledger(table: &Ledger, filter: &LedgerFilter) -> Ledger {
    Ledger { rows: table.rows.iter().filter(|r| filter.accepts(r)).cloned().collect() }
}

/// Ordered find/replace pairs applied to region labels and histogram names.
///
/// Used to generate toys for a region whose transfer functions were fitted under a
/// different name (e.g. `CR_pass` → `SR_pass`).
///
/// Serialized as a map (`{"CR_pass": "SR_pass"}`) whose document order is the
/// application order; a list of `[find, replace]` pairs is accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSubstitution {
    pairs: Vec<(String, String)>,
}

impl NameSubstitution {
    /// No substitutions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Substitution from ordered `(find, replace)` pairs.
    pub fn new<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self { pairs: pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect() }
    }

    /// True if there is nothing to substitute.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `(find, replace)` pairs in application order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Apply every pair in order.
    pub fn apply(&self, s: &str) -> String {
        self.pairs.iter().fold(s.to_string(), |acc, (find, replace)| acc.replace(find, replace))
    }
}

impl Serialize for NameSubstitution {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (find, replace) in &self.pairs {
            map.serialize_entry(find, replace)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NameSubstitution {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> serde::de::Visitor<'de> for PairsVisitor {
            type Value = NameSubstitution;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of find/replace strings or a list of [find, replace] pairs")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((find, replace)) = map.next_entry::<String, String>()? {
                    pairs.push((find, replace));
                }
                Ok(NameSubstitution { pairs })
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some(pair) = seq.next_element::<(String, String)>()? {
                    pairs.push(pair);
                }
                Ok(NameSubstitution { pairs })
            }
        }

        deserializer.deserialize_any(PairsVisitor)
    }
}
