//! Symbol frequency counting
//!
//! A [`FrequencyTable`] is an immutable multiset-to-map reduction of the input:
//! every entry carries a strictly positive count, and iteration is in ascending
//! symbol order so that downstream tree construction is reproducible.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<char, u64>,
}

impl FrequencyTable {
    /// Count every `char` of `text`.
    pub fn count(text: &str) -> Self {
        Self::from_symbols(text.chars())
    }

    /// Count an ordered sequence of symbols.
    pub fn from_symbols<I>(symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        Self::from_counts(symbols.into_iter().map(|c| (c, 1)))
    }

    /// Fold `(symbol, count)` records into a table, summing counts of equal symbols.
    /// Zero counts are dropped.
    pub fn from_counts<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (char, u64)>,
    {
        let counts = records
            .into_iter()
            .filter(|&(_, n)| n > 0)
            .fold(BTreeMap::new(), |mut acc, (symbol, n)| {
                *acc.entry(symbol).or_insert(0) += n;
                acc
            });
        Self { counts }
    }

    /// Sum two partial tables, e.g. counts taken over separate partitions of one input.
    pub fn merge(mut self, other: &FrequencyTable) -> Self {
        for (&symbol, &n) in &other.counts {
            *self.counts.entry(symbol).or_insert(0) += n;
        }
        self
    }

    pub fn get(&self, symbol: char) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of symbol occurrences.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, u64)> + '_ {
        self.counts.iter().map(|(&c, &n)| (c, n))
    }

    /// Shannon entropy in bits per symbol.
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        self.counts
            .values()
            .map(|&n| {
                let p = n as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}
