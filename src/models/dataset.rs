use std::collections::BTreeMap;

use super::record::{Outcome, Record};

/// Ordered, immutable collection of bout records.
///
/// Every transformation returns a new `Dataset`; nothing mutates in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn filter<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        Dataset::new(self.records.iter().filter(|r| keep(r)).cloned().collect())
    }

    pub fn map<F>(&self, f: F) -> Dataset
    where
        F: FnMut(&Record) -> Record,
    {
        Dataset::new(self.records.iter().map(f).collect())
    }

    /// Records at `indices`, in the order given. Out-of-range indices are skipped.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset::new(
            indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
        )
    }

    /// Indices of records grouped by outcome, each group in dataset order.
    pub fn indices_by_outcome(&self) -> BTreeMap<Outcome, Vec<usize>> {
        let mut groups: BTreeMap<Outcome, Vec<usize>> = BTreeMap::new();
        for (i, record) in self.records.iter().enumerate() {
            groups.entry(record.result).or_default().push(i);
        }
        groups
    }

    pub fn class_counts(&self) -> BTreeMap<Outcome, usize> {
        self.indices_by_outcome()
            .into_iter()
            .map(|(outcome, idx)| (outcome, idx.len()))
            .collect()
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
