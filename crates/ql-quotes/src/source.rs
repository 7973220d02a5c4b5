//! Quote sources: lookup of current values by instrument identifier.

use crate::quote::{Quote, SimpleQuote};
use ql_core::errors::{Error, Result};
use ql_core::{Handle, Real};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Anything that can report the current value of a named instrument.
pub trait QuoteSource: std::fmt::Debug + Send + Sync {
    /// Current value for `instrument_id`.
    ///
    /// # Errors
    /// [`Error::IllsetQuote`] when the identifier is unknown or its quote is
    /// empty or not finite.
    fn current_value(&self, instrument_id: &str) -> Result<Real>;
}

/// An in-memory book of named [`SimpleQuote`]s.
///
/// Helpers hold [`Handle`]s into the book, so updating a value here moves
/// every curve built from those helpers on its next rebuild.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    quotes: BTreeMap<String, Arc<SimpleQuote>>,
}

impl QuoteBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `instrument_id` to `value`, creating the quote if needed.
    pub fn set(&mut self, instrument_id: impl Into<String>, value: Real) -> Arc<SimpleQuote> {
        let quote = self
            .quotes
            .entry(instrument_id.into())
            .or_insert_with(|| Arc::new(SimpleQuote::empty()));
        quote.set_value(value);
        Arc::clone(quote)
    }

    /// A shared handle on the quote for `instrument_id`, if present.
    pub fn handle(&self, instrument_id: &str) -> Option<Handle<dyn Quote>> {
        self.quotes
            .get(instrument_id)
            .map(|q| Handle::from_arc(Arc::clone(q) as Arc<dyn Quote>))
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.quotes.keys().map(String::as_str)
    }

    /// Number of quotes in the book.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// `true` if the book holds no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Real)> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = (S, Real)>>(iter: I) -> Self {
        let mut book = QuoteBook::new();
        for (id, value) in iter {
            book.set(id, value);
        }
        book
    }
}

impl QuoteSource for QuoteBook {
    fn current_value(&self, instrument_id: &str) -> Result<Real> {
        match self.quotes.get(instrument_id) {
            Some(q) => q.checked_value(instrument_id),
            None => Err(Error::IllsetQuote {
                instrument: instrument_id.to_owned(),
                value: Real::NAN,
            }),
        }
    }
}
