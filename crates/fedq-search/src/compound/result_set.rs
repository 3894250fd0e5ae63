//! Intermediate result sets and the set algebra the executor uses.

use std::{cmp::Ordering, collections::HashMap};

use crate::result::SearchResult;

/// Results of one subtree, kept sorted by id.
///
/// `order`, when present, maps ids to their position in the order a sorted
/// backend call produced. Ids missing from the map sort after the mapped
/// ones.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResultSet {
    /// Results in ascending id order with unique ids.
    results: Vec<SearchResult>,
    /// Requested output position per id.
    order: Option<HashMap<String, usize>>,
}

impl ResultSet {
    /// Builds a set from backend results, recording their order if `ordered`.
    pub(crate) fn new(results: Vec<SearchResult>, ordered: bool) -> Self {
        let order = ordered.then(|| {
            let mut order = HashMap::with_capacity(results.len());
            for (position, result) in results.iter().enumerate() {
                order.entry(result.id.clone()).or_insert(position);
            }
            order
        });

        let mut results = results;
        results.sort_by(|a, b| a.id.cmp(&b.id));
        let mut unique: Vec<SearchResult> = Vec::with_capacity(results.len());
        for result in results {
            match unique.last_mut() {
                Some(last) if last.id == result.id => last.merge_overwrite(result),
                _ => unique.push(result),
            }
        }

        Self {
            results: unique,
            order,
        }
    }

    /// True when no ids remain.
    pub(crate) fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when the set carries a backend order.
    pub(crate) fn is_ordered(&self) -> bool {
        self.order.is_some()
    }

    /// Ids present in both sets.
    pub(crate) fn intersect(self, other: Self) -> Self {
        let order = self.order.or(other.order);
        let mut out = Vec::with_capacity(self.results.len().min(other.results.len()));
        let mut left = self.results.into_iter().peekable();
        let mut right = other.results.into_iter().peekable();

        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            match l.id.cmp(&r.id) {
                Ordering::Less => {
                    left.next();
                }
                Ordering::Greater => {
                    right.next();
                }
                Ordering::Equal => {
                    if let (Some(mut l), Some(r)) = (left.next(), right.next()) {
                        l.merge_overwrite(r);
                        out.push(l);
                    }
                }
            }
        }

        Self {
            results: out,
            order,
        }
    }

    /// Ids present in either set.
    pub(crate) fn union(self, other: Self) -> Self {
        let order = self.order.or(other.order);
        let mut out = Vec::with_capacity(self.results.len() + other.results.len());
        let mut left = self.results.into_iter().peekable();
        let mut right = other.results.into_iter().peekable();

        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            match l.id.cmp(&r.id) {
                Ordering::Less => out.extend(left.next()),
                Ordering::Greater => out.extend(right.next()),
                Ordering::Equal => {
                    if let (Some(mut l), Some(r)) = (left.next(), right.next()) {
                        l.merge_overwrite(r);
                        out.push(l);
                    }
                }
            }
        }
        out.extend(left);
        out.extend(right);

        Self {
            results: out,
            order,
        }
    }

    /// Ids of `self` absent from `other`.
    pub(crate) fn subtract(self, other: Self) -> Self {
        let mut out = Vec::with_capacity(self.results.len());
        let mut right = other.results.into_iter().peekable();

        for result in self.results {
            while right.peek().is_some_and(|r| r.id < result.id) {
                right.next();
            }
            if right.peek().is_some_and(|r| r.id == result.id) {
                continue;
            }
            out.push(result);
        }

        Self {
            results: out,
            order: self.order,
        }
    }

    /// Keeps the rows of `self` and reorders them by `other`'s order.
    ///
    /// Ids present in both sets take `other`'s relative order, filling the
    /// positions those ids held in `self`. Ids only in `self` stay where they
    /// were. Without an order on `other`, `self` is returned unchanged.
    pub(crate) fn left_join_with_right_order(self, other: Self) -> Self {
        let Some(right_order) = other.order else {
            return self;
        };
        let current = self.into_results();

        let mut ranked: Vec<(usize, usize)> = current
            .iter()
            .enumerate()
            .filter_map(|(pos, r)| right_order.get(&r.id).map(|&rank| (rank, pos)))
            .collect();
        ranked.sort_unstable();
        let mut common = ranked.into_iter().map(|(_, pos)| pos);

        let picks: Vec<usize> = current
            .iter()
            .enumerate()
            .map(|(pos, r)| {
                if right_order.contains_key(&r.id) {
                    common.next().unwrap_or(pos)
                } else {
                    pos
                }
            })
            .collect();

        let mut slots: Vec<Option<SearchResult>> = current.into_iter().map(Some).collect();
        let reordered: Vec<SearchResult> = picks
            .into_iter()
            .filter_map(|pos| slots.get_mut(pos).and_then(Option::take))
            .collect();

        Self::new(reordered, true)
    }

    /// Final results: by recorded order when there is one, otherwise by id.
    pub(crate) fn into_results(self) -> Vec<SearchResult> {
        let Some(order) = self.order else {
            return self.results;
        };
        let mut results = self.results;
        results.sort_by(|a, b| {
            match (order.get(&a.id), order.get(&b.id)) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.id.cmp(&b.id))
        });
        results
    }
}
