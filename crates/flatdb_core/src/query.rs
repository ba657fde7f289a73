//! Predicate composition.
//!
//! There is no query language: filters are host-language closures, combined
//! with [`Predicate::and`], [`Predicate::or`] and [`Predicate::not`].
//!
//! ```rust
//! use flatdb_core::Predicate;
//!
//! let even = Predicate::new(|n: &i64| n % 2 == 0);
//! let small = Predicate::new(|n: &i64| *n < 10);
//! let p = even.and(small.not());
//!
//! assert!(p.eval(&12));
//! assert!(!p.eval(&4));
//! ```

use std::fmt;

type Test<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A boolean test over entities of type `E`.
pub struct Predicate<E> {
    test: Test<E>,
}

impl<E: 'static> Predicate<E> {
    /// Wraps a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Box::new(test),
        }
    }

    /// A predicate that matches everything.
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Evaluates the predicate.
    pub fn eval(&self, entity: &E) -> bool {
        (self.test)(entity)
    }

    /// Matches when both predicates match.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::new(move |e| self.eval(e) && other.eval(e))
    }

    /// Matches when either predicate matches.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::new(move |e| self.eval(e) || other.eval(e))
    }

    /// Matches when this predicate does not.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(move |e| !self.eval(e))
    }
}

/// Returns whether every predicate in `predicates` matches `entity`.
///
/// An empty list matches everything.
pub fn matches_all<E: 'static>(predicates: &[Predicate<E>], entity: &E) -> bool {
    predicates.iter().all(|p| p.eval(entity))
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}
