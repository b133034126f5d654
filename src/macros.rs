/// Declares a dense, copyable index newtype.
///
/// The generated type wraps a `usize`, orders and hashes by that value, converts to and from
/// `usize`, prints as `Name(n)` in debug output and implements [`crate::utils::Idx`] so it can be
/// stored in a [`crate::utils::BitSet`]. `Display` is left to the caller since every identifier
/// prints differently in IR dumps.
///
/// ```rust, ignore
/// index_type! {
///     /// Identifies a variable in the variable arena.
///     pub struct VarId;
/// }
/// ```
macro_rules! index_type {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(usize);

        impl $name {
            /// Creates the identifier for the given dense index.
            #[must_use]
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the dense index of this identifier.
            #[must_use]
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl crate::utils::Idx for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index)
            }

            #[inline]
            fn index(self) -> usize {
                self.0
            }
        }
    };
}
