//! Validity tokens for cached artifacts.
//!
//! A [`Validity`] is recorded when an artifact is produced and compared
//! against a freshly computed token on the next lookup. If the recorded token
//! accepts the fresh one, the cached artifact may be reused.
//!
//! ## Truth Table
//!
//! ```text
//!   recorded \ fresh │ Always │ Never │ Timestamp(t2) │ Composite(a2,b2)
//!   ─────────────────┼────────┼───────┼───────────────┼──────────────────
//!   Always           │  true  │ false │     false     │      false
//!   Never            │  false │ false │     false     │      false
//!   Timestamp(t)     │  false │ false │    t == t2    │      false
//!   Composite(a,b)   │  false │ false │     false     │ a~a2 && b~b2
//! ```
//!
//! The relation is not symmetric in general and is not meant to be an
//! equivalence: `Never` accepts nothing, including itself.
//!
//! ## Example Usage
//!
//! ```
//! use mrucache::validity::Validity;
//!
//! let recorded = Validity::composite(Validity::Always, Validity::timestamp(5));
//! assert!(recorded.is_valid(&Validity::composite(Validity::Always, Validity::timestamp(5))));
//! assert!(!recorded.is_valid(&Validity::composite(Validity::Always, Validity::timestamp(6))));
//! assert!(!Validity::Always.is_valid(&Validity::timestamp(5)));
//! ```

use std::fmt;

/// A comparable proof that a cached artifact's preconditions still hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Validity {
    /// Valid for as long as the cache holds it.
    Always,
    /// Never reusable.
    Never,
    /// Valid while the source's modification stamp is unchanged.
    Timestamp(i64),
    /// Conjunction of two tokens.
    Composite(Box<Validity>, Box<Validity>),
}

impl Validity {
    /// Creates a timestamp token.
    #[inline]
    pub fn timestamp(stamp: i64) -> Self {
        Self::Timestamp(stamp)
    }

    /// Creates the conjunction of `first` and `second`.
    #[inline]
    pub fn composite(first: Validity, second: Validity) -> Self {
        Self::Composite(Box::new(first), Box::new(second))
    }

    /// Combines tokens into nested composites, right-folded.
    ///
    /// `[a, b, c]` becomes `Composite(a, Composite(b, c))`. A single token is
    /// returned unchanged; an empty iterator yields `None`.
    ///
    /// ```
    /// use mrucache::validity::Validity;
    ///
    /// let combined = Validity::combine([Validity::Always, Validity::timestamp(1), Validity::timestamp(2)]);
    /// assert_eq!(
    ///     combined,
    ///     Some(Validity::composite(
    ///         Validity::Always,
    ///         Validity::composite(Validity::timestamp(1), Validity::timestamp(2)),
    ///     ))
    /// );
    /// assert_eq!(Validity::combine(Vec::new()), None);
    /// ```
    pub fn combine<I>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = Validity>,
        I::IntoIter: DoubleEndedIterator,
    {
        tokens
            .into_iter()
            .rev()
            .reduce(|acc, token| Self::composite(token, acc))
    }

    /// Returns `true` if `current` proves the artifact recorded with `self`
    /// may still be reused.
    pub fn is_valid(&self, current: &Validity) -> bool {
        match (self, current) {
            (Self::Always, Self::Always) => true,
            (Self::Always, _) => false,
            (Self::Never, _) => false,
            (Self::Timestamp(recorded), Self::Timestamp(fresh)) => recorded == fresh,
            (Self::Timestamp(_), _) => false,
            (Self::Composite(a, b), Self::Composite(a2, b2)) => a.is_valid(a2) && b.is_valid(b2),
            (Self::Composite(..), _) => false,
        }
    }

    /// Returns `false` if an artifact carrying this token can never be reused.
    ///
    /// A composite is cacheable only if both halves are.
    pub fn is_cacheable(&self) -> bool {
        match self {
            Self::Never => false,
            Self::Always | Self::Timestamp(_) => true,
            Self::Composite(a, b) => a.is_cacheable() && b.is_cacheable(),
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::Never => f.write_str("never"),
            Self::Timestamp(stamp) => write!(f, "ts:{stamp}"),
            Self::Composite(a, b) => write!(f, "({a} & {b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<Validity> {
        vec![
            Validity::Always,
            Validity::Never,
            Validity::timestamp(5),
            Validity::composite(Validity::Always, Validity::timestamp(5)),
        ]
    }

    mod truth_table {
        use super::*;

        #[test]
        fn always_accepts_only_always() {
            let always = Validity::Always;
            let results: Vec<bool> = variants().iter().map(|v| always.is_valid(v)).collect();
            assert_eq!(results, vec![true, false, false, false]);
        }

        #[test]
        fn never_accepts_nothing() {
            for other in variants() {
                assert!(!Validity::Never.is_valid(&other), "Never accepted {other}");
            }
        }

        #[test]
        fn timestamp_requires_exact_equality() {
            let ts = Validity::timestamp(5);
            assert!(ts.is_valid(&Validity::timestamp(5)));
            assert!(!ts.is_valid(&Validity::timestamp(6)));
            // Newer is not good enough.
            assert!(!ts.is_valid(&Validity::timestamp(4)));
            assert!(!ts.is_valid(&Validity::Always));
            assert!(!ts.is_valid(&Validity::Never));
        }

        #[test]
        fn composite_requires_composite() {
            let c = Validity::composite(Validity::Always, Validity::timestamp(5));
            assert!(!c.is_valid(&Validity::Always));
            assert!(!c.is_valid(&Validity::timestamp(5)));
            assert!(!c.is_valid(&Validity::Never));
        }

        #[test]
        fn mismatched_variants_are_asymmetric_false() {
            assert!(!Validity::Always.is_valid(&Validity::timestamp(5)));
            assert!(!Validity::timestamp(5).is_valid(&Validity::Always));
        }

        #[test]
        fn full_matrix_diagonal() {
            // Every variant except Never accepts an identical copy of itself.
            for v in variants() {
                let expected = !matches!(v, Validity::Never);
                assert_eq!(v.is_valid(&v.clone()), expected, "diagonal for {v}");
            }
        }
    }

    mod composite {
        use super::*;

        #[test]
        fn conjunction_of_equal_halves() {
            let recorded = Validity::composite(Validity::Always, Validity::timestamp(5));
            let fresh = Validity::composite(Validity::Always, Validity::timestamp(5));
            assert!(recorded.is_valid(&fresh));
        }

        #[test]
        fn either_half_changing_invalidates() {
            let recorded = Validity::composite(Validity::Always, Validity::timestamp(5));
            assert!(!recorded.is_valid(&Validity::composite(Validity::Always, Validity::timestamp(6))));
            assert!(!recorded.is_valid(&Validity::composite(Validity::timestamp(1), Validity::timestamp(5))));
        }

        #[test]
        fn order_of_halves_matters() {
            let recorded = Validity::composite(Validity::Always, Validity::timestamp(5));
            let swapped = Validity::composite(Validity::timestamp(5), Validity::Always);
            assert!(!recorded.is_valid(&swapped));
        }

        #[test]
        fn nested_composites_recurse() {
            let recorded = Validity::combine([
                Validity::timestamp(1),
                Validity::timestamp(2),
                Validity::timestamp(3),
            ])
            .unwrap();
            let same = Validity::combine([
                Validity::timestamp(1),
                Validity::timestamp(2),
                Validity::timestamp(3),
            ])
            .unwrap();
            let changed = Validity::combine([
                Validity::timestamp(1),
                Validity::timestamp(2),
                Validity::timestamp(4),
            ])
            .unwrap();
            assert!(recorded.is_valid(&same));
            assert!(!recorded.is_valid(&changed));
        }

        #[test]
        fn combine_single_token_is_identity() {
            assert_eq!(Validity::combine([Validity::Always]), Some(Validity::Always));
        }
    }

    #[test]
    fn cacheable_excludes_never() {
        assert!(Validity::Always.is_cacheable());
        assert!(Validity::timestamp(0).is_cacheable());
        assert!(!Validity::Never.is_cacheable());
        assert!(!Validity::composite(Validity::Always, Validity::Never).is_cacheable());
    }

    #[test]
    fn display_forms() {
        let v = Validity::composite(Validity::Always, Validity::timestamp(7));
        assert_eq!(v.to_string(), "(always & ts:7)");
        assert_eq!(Validity::Never.to_string(), "never");
    }
}
