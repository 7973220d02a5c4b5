//! Compounding conventions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How interest is compounded over a period of length `t` at rate `r` with
/// `f` compounding periods per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compounding {
    /// `1 + r·t`
    Simple,
    /// `(1 + r/f)^(f·t)`
    Compounded,
    /// `exp(r·t)`
    Continuous,
    /// Simple up to `t = 1/f`, compounded beyond.
    SimpleThenCompounded,
    /// Compounded up to `t = 1/f`, simple beyond.
    CompoundedThenSimple,
}

impl Compounding {
    /// Return `true` if the rule needs a finite compounding frequency.
    pub fn requires_frequency(self) -> bool {
        !matches!(self, Compounding::Simple | Compounding::Continuous)
    }
}

impl fmt::Display for Compounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Compounding::Simple => "simple",
            Compounding::Compounded => "compounded",
            Compounding::Continuous => "continuous",
            Compounding::SimpleThenCompounded => "simple-then-compounded",
            Compounding::CompoundedThenSimple => "compounded-then-simple",
        };
        f.write_str(s)
    }
}
