//! A typed bit vector for dense index sets.
//!
//! Data-flow analyses in this crate track sets of variables, blocks and expressions, all of
//! which are identified by small dense integers wrapped in newtypes. [`BitSet`] stores such a set
//! as 64-element words and is parameterized over the index newtype, so a set of variables cannot
//! be mixed up with a set of blocks.
//!
//! # Example
//!
//! ```rust
//! use tacflow::utils::BitSet;
//!
//! let mut set: BitSet = BitSet::new(100);
//! set.insert(0);
//! set.insert(50);
//! set.insert(99);
//!
//! assert!(set.contains(50));
//! assert_eq!(set.count(), 3);
//! assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 50, 99]);
//! ```

use std::{fmt, hash::Hash, marker::PhantomData};

/// A dense index that can be stored in a [`BitSet`].
pub trait Idx: Copy + Eq + Ord + Hash + fmt::Debug {
    /// Creates the index from its position.
    fn from_index(index: usize) -> Self;

    /// Returns the position of this index.
    fn index(self) -> usize;
}

impl Idx for usize {
    #[inline]
    fn from_index(index: usize) -> Self {
        index
    }

    #[inline]
    fn index(self) -> usize {
        self
    }
}

/// A fixed-domain set of indices backed by a bit vector.
///
/// The domain size is chosen at construction; every index passed in must be smaller than it.
/// All binary set operations require both operands to share the same domain size.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet<T: Idx = usize> {
    words: Vec<u64>,
    domain: usize,
    marker: PhantomData<fn() -> T>,
}

impl<T: Idx> BitSet<T> {
    /// Creates an empty set over `domain` indices.
    #[must_use]
    pub fn new(domain: usize) -> Self {
        Self {
            words: vec![0; domain.div_ceil(64)],
            domain,
            marker: PhantomData,
        }
    }

    /// Creates a set containing every index of the domain.
    #[must_use]
    pub fn full(domain: usize) -> Self {
        let mut set = Self::new(domain);
        set.fill();
        set
    }

    /// Creates a set over `domain` indices holding the given elements.
    ///
    /// # Panics
    ///
    /// Panics if an element lies outside the domain.
    #[must_use]
    pub fn from_elements(domain: usize, elements: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new(domain);
        set.extend(elements);
        set
    }

    /// Returns the number of indices this set can hold.
    #[must_use]
    pub const fn domain_size(&self) -> usize {
        self.domain
    }

    /// Returns `true` if no index is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Adds an element, returning `true` if it was not present before.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the domain.
    pub fn insert(&mut self, element: T) -> bool {
        let (word, mask) = self.locate(element);
        let was_set = self.words[word] & mask != 0;
        self.words[word] |= mask;
        !was_set
    }

    /// Removes an element, returning `true` if it was present.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the domain.
    pub fn remove(&mut self, element: T) -> bool {
        let (word, mask) = self.locate(element);
        let was_set = self.words[word] & mask != 0;
        self.words[word] &= !mask;
        was_set
    }

    /// Returns `true` if the element is present.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the domain.
    #[must_use]
    pub fn contains(&self, element: T) -> bool {
        let (word, mask) = self.locate(element);
        self.words[word] & mask != 0
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Inserts every index of the domain.
    pub fn fill(&mut self) {
        self.words.fill(u64::MAX);
        let tail = self.domain % 64;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
    }

    /// In-place union. Returns `true` if `self` changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        self.combine(other, |a, b| a | b)
    }

    /// In-place intersection. Returns `true` if `self` changed.
    pub fn intersect_with(&mut self, other: &Self) -> bool {
        self.combine(other, |a, b| a & b)
    }

    /// In-place difference (`self − other`). Returns `true` if `self` changed.
    pub fn difference_with(&mut self, other: &Self) -> bool {
        self.combine(other, |a, b| a & !b)
    }

    /// Returns the union of two sets as a new set.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// Returns the intersection of two sets as a new set.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// Returns `true` if every element of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        assert_eq!(self.domain, other.domain, "bit sets must share a domain");
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & !b == 0)
    }

    /// Iterates the elements in ascending index order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
            marker: PhantomData,
        }
    }

    fn locate(&self, element: T) -> (usize, u64) {
        let index = element.index();
        assert!(
            index < self.domain,
            "index {index} out of bounds for bit set of size {}",
            self.domain
        );
        (index / 64, 1u64 << (index % 64))
    }

    fn combine(&mut self, other: &Self, op: impl Fn(u64, u64) -> u64) -> bool {
        assert_eq!(self.domain, other.domain, "bit sets must share a domain");
        let mut changed = false;
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            let updated = op(*a, b);
            changed |= updated != *a;
            *a = updated;
        }
        changed
    }
}

impl<T: Idx> Extend<T> for BitSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl<'a, T: Idx> IntoIterator for &'a BitSet<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Idx> fmt::Debug for BitSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over the elements of a [`BitSet`].
pub struct Iter<'a, T> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
    marker: PhantomData<fn() -> T>,
}

impl<T: Idx> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(T::from_index(self.word_idx * 64 + bit));
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}
