//! Generic ordered container with filter/map/groupby helpers.
//! Insertion order is significant: it drives "last wins" compositing in
//! mosaics and layer order in stacks.
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

/// Polymorphic grouping key. Grouping closures return one of these so that
/// heterogeneous keys (dates, products, composites) share a single total
/// order, which fixes group order in flattened stacks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Text(String),
    Int(i64),
    Day(NaiveDate),
    Timestamp(DateTime<Utc>),
    Seq(Vec<GroupKey>),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(s) => write!(f, "{}", s),
            GroupKey::Int(i) => write!(f, "{}", i),
            GroupKey::Day(d) => write!(f, "{}", d),
            GroupKey::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            GroupKey::Seq(keys) => {
                let parts: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

/// Ordered sequence of items with collection-level helpers. Operations
/// return new collections; nothing mutates in place.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// New collection holding the items that satisfy `predicate`, in order.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Self
    where
        T: Clone,
    {
        self.items.iter().filter(|i| predicate(i)).cloned().collect()
    }

    /// Apply `f` to every item, yielding a collection of the results.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Collection<U> {
        self.items.iter().map(f).collect()
    }

    /// Group items by key: groups come back in ascending key order, and
    /// items inside a group keep their original relative order.
    pub fn groupby<K>(&self, key: impl Fn(&T) -> K) -> Vec<(K, Collection<T>)>
    where
        K: Ord + Clone,
        T: Clone,
    {
        let mut keyed: Vec<(K, T)> = self
            .items
            .iter()
            .map(|item| (key(item), item.clone()))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut groups: Vec<(K, Collection<T>)> = Vec::new();
        for (k, item) in keyed {
            let matches_last = groups.last().is_some_and(|(last, _)| *last == k);
            if matches_last {
                if let Some((_, group)) = groups.last_mut() {
                    group.items.push(item);
                }
            } else {
                groups.push((k, Collection { items: vec![item] }));
            }
        }
        groups
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> std::ops::Index<usize> for Collection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}
