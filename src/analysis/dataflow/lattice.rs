//! Lattice traits for data flow analysis.
//!
//! A lattice defines how abstract values combine where control flow paths meet. Both analyses in
//! this crate work on sets of dense indices:
//!
//! - **May analyses** (liveness) combine with union. A plain [`BitSet`] implements
//!   [`MeetSemiLattice`] this way.
//! - **Must analyses** (available expressions) combine with intersection, provided by the
//!   [`MustSet`] wrapper.

use std::fmt::Debug;

use crate::utils::{BitSet, Idx};

/// A meet semi-lattice with a meet (greatest lower bound) operation.
///
/// The meet operation combines information from multiple control flow paths.
/// It must satisfy:
///
/// - **Idempotent**: `x.meet(x) = x`
/// - **Commutative**: `x.meet(y) = y.meet(x)`
/// - **Associative**: `x.meet(y.meet(z)) = (x.meet(y)).meet(z)`
pub trait MeetSemiLattice: Clone + Debug + PartialEq {
    /// Computes the meet (greatest lower bound) of two lattice elements.
    #[must_use]
    fn meet(&self, other: &Self) -> Self;

    /// Meets `other` into `self`, returning `true` if `self` changed.
    fn meet_with(&mut self, other: &Self) -> bool {
        let met = self.meet(other);
        let changed = met != *self;
        *self = met;
        changed
    }
}

impl<T: Idx> MeetSemiLattice for BitSet<T> {
    /// Meet is union for may analyses.
    fn meet(&self, other: &Self) -> Self {
        self.union(other)
    }

    fn meet_with(&mut self, other: &Self) -> bool {
        self.union_with(other)
    }
}

/// A bit set whose meet is intersection, for must analyses.
#[derive(Clone, PartialEq, Eq)]
pub struct MustSet<T: Idx = usize>(pub BitSet<T>);

impl<T: Idx> MeetSemiLattice for MustSet<T> {
    fn meet(&self, other: &Self) -> Self {
        MustSet(self.0.intersection(&other.0))
    }

    fn meet_with(&mut self, other: &Self) -> bool {
        self.0.intersect_with(&other.0)
    }
}

impl<T: Idx> Debug for MustSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_meet_is_union() {
        let a: BitSet = BitSet::from_elements(8, [1, 2]);
        let b: BitSet = BitSet::from_elements(8, [2, 5]);
        assert_eq!(a.meet(&b), BitSet::from_elements(8, [1, 2, 5]));

        let mut c = a.clone();
        assert!(c.meet_with(&b));
        assert!(!c.meet_with(&b));
    }

    #[test]
    fn test_must_set_meet_is_intersection() {
        let a = MustSet(BitSet::<usize>::from_elements(8, [1, 2]));
        let b = MustSet(BitSet::from_elements(8, [2, 5]));
        assert_eq!(a.meet(&b), MustSet(BitSet::from_elements(8, [2])));

        let mut full = MustSet(BitSet::full(8));
        assert!(full.meet_with(&a));
        assert_eq!(full, a);
    }

    #[test]
    fn test_meet_laws() {
        let a: BitSet = BitSet::from_elements(4, [0, 3]);
        let b: BitSet = BitSet::from_elements(4, [1]);
        assert_eq!(a.meet(&a), a);
        assert_eq!(a.meet(&b), b.meet(&a));
    }
}
