//! Patterns sub-module: lazily recomputed results.

pub mod lazy_object;
