//! `EvaluationContext`: the "today" of a valuation.
//!
//! Every date-dependent calculation takes the context explicitly; nothing in
//! the workspace reads a process-wide evaluation date.  A pricing run works
//! against one `&EvaluationContext`, so changing the date means building a
//! new context (or mutating one the caller owns) and pricing again.

use crate::date::Date;
use ql_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Evaluation date and cash-flow inclusion settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    evaluation_date: Option<Date>,
    #[serde(default)]
    include_settlement_date_flows: bool,
}

impl EvaluationContext {
    /// A context with no evaluation date.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context valued as of `date`.
    pub fn with_evaluation_date(date: Date) -> Self {
        Self {
            evaluation_date: Some(date),
            ..Self::default()
        }
    }

    /// Move the evaluation date.
    pub fn set_evaluation_date(&mut self, date: Date) {
        tracing::debug!(%date, "evaluation date set");
        self.evaluation_date = Some(date);
    }

    /// The evaluation date.
    ///
    /// # Errors
    /// [`Error::EvaluationDateNotSet`] if no date was given.
    pub fn evaluation_date(&self) -> Result<Date> {
        self.evaluation_date.ok_or(Error::EvaluationDateNotSet)
    }

    /// Whether a cash flow paid exactly on the reference date still counts
    /// as not yet occurred.
    pub fn include_settlement_date_flows(&self) -> bool {
        self.include_settlement_date_flows
    }

    /// Builder-style setter for
    /// [`include_settlement_date_flows`](Self::include_settlement_date_flows).
    pub fn with_settlement_date_flows(mut self, include: bool) -> Self {
        self.include_settlement_date_flows = include;
        self
    }
}
