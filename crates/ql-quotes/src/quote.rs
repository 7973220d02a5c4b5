//! `Quote` trait and `SimpleQuote` implementation.

use ql_core::errors::{Error, Result};
use ql_core::Real;
use std::sync::{PoisonError, RwLock};

/// A market-observable value.
pub trait Quote: std::fmt::Debug + Send + Sync {
    /// Return the current value.
    ///
    /// Returns `None` if the quote is not currently set.
    fn value(&self) -> Option<Real>;

    /// Return `true` if the quote currently holds a finite value.
    fn is_valid(&self) -> bool {
        self.value().is_some_and(Real::is_finite)
    }

    /// The current value, or [`Error::IllsetQuote`] naming `instrument` when
    /// the quote is empty or not finite.
    fn checked_value(&self, instrument: &str) -> Result<Real> {
        match self.value() {
            Some(v) if v.is_finite() => Ok(v),
            other => Err(Error::IllsetQuote {
                instrument: instrument.to_owned(),
                value: other.unwrap_or(Real::NAN),
            }),
        }
    }
}

/// A mutable market quote.
///
/// Shared as `Arc<SimpleQuote>`; setting the value through any clone of the
/// `Arc` is seen by every helper reading it.
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: RwLock<Option<Real>>,
}

impl SimpleQuote {
    /// Create a new quote with the given value.
    pub fn new(value: Real) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// Create an empty (invalid) quote.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a new value, returning the change from the previous one (zero
    /// when the quote was empty).
    pub fn set_value(&self, value: Real) -> Real {
        let mut slot = self.value.write().unwrap_or_else(PoisonError::into_inner);
        let diff = slot.map_or(0.0, |old| value - old);
        *slot = Some(value);
        tracing::trace!(value, diff, "quote updated");
        diff
    }

    /// Clear the value, making the quote invalid.
    pub fn reset(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Clone for SimpleQuote {
    fn clone(&self) -> Self {
        Self {
            value: RwLock::new(self.value()),
        }
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> Option<Real> {
        *self.value.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn simple_quote() {
        let q = SimpleQuote::new(1.05);
        assert!(q.is_valid());
        assert_eq!(q.value(), Some(1.05));
    }

    #[test]
    fn empty_quote() {
        let q = SimpleQuote::empty();
        assert!(!q.is_valid());
        assert_eq!(q.value(), None);
        assert!(matches!(
            q.checked_value("3M deposit"),
            Err(Error::IllsetQuote { value, .. }) if value.is_nan()
        ));
    }

    #[test]
    fn non_finite_quote_is_ill_set() {
        let q = SimpleQuote::new(Real::INFINITY);
        assert!(!q.is_valid());
        assert!(q.checked_value("bond").is_err());
    }

    #[test]
    fn updates_are_shared() {
        let q = Arc::new(SimpleQuote::new(0.01));
        let reader: Arc<dyn Quote> = q.clone();
        let diff = q.set_value(0.015);
        assert!((diff - 0.005).abs() < 1e-15);
        assert_eq!(reader.value(), Some(0.015));
        q.reset();
        assert_eq!(reader.value(), None);
    }
}
