//! Small sorted sets.
//!
//! Dependency sets, linearization edges and saved relations are tiny (usually empty or a
//! handful of events), so they live inline in a `SmallVec` kept sorted and duplicate-free.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Ord + Copy"
))]
pub struct VSet<T: Ord + Copy> {
    #[serde(deserialize_with = "deserialize_sorted")]
    elems: SmallVec<[T; 4]>,
}

fn deserialize_sorted<'de, D, T>(d: D) -> Result<SmallVec<[T; 4]>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Ord + Copy,
{
    let mut elems = SmallVec::<[T; 4]>::deserialize(d)?;
    elems.sort_unstable();
    elems.dedup();
    Ok(elems)
}

impl<T: Ord + Copy> Default for VSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Copy> VSet<T> {
    pub fn new() -> Self {
        Self {
            elems: SmallVec::new(),
        }
    }

    /// Inserts `t`; returns whether it was absent.
    pub fn insert(&mut self, t: T) -> bool {
        match self.elems.binary_search(&t) {
            Ok(_) => false,
            Err(i) => {
                self.elems.insert(i, t);
                true
            }
        }
    }

    /// Removes `t`; returns whether it was present.
    pub fn erase(&mut self, t: &T) -> bool {
        match self.elems.binary_search(t) {
            Ok(i) => {
                self.elems.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        self.elems.retain(|t| f(t));
    }

    pub fn contains(&self, t: &T) -> bool {
        self.elems.binary_search(t).is_ok()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn clear(&mut self) {
        self.elems.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.elems.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.elems.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.elems.last()
    }

    /// Adds every element of `other`.
    pub fn extend_from(&mut self, other: &VSet<T>) {
        for &t in other.iter() {
            self.insert(t);
        }
    }
}

impl<T: Ord + Copy> FromIterator<T> for VSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut elems: SmallVec<[T; 4]> = iter.into_iter().collect();
        elems.sort_unstable();
        elems.dedup();
        Self { elems }
    }
}

impl<'a, T: Ord + Copy> IntoIterator for &'a VSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elems.iter()
    }
}
