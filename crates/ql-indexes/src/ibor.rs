//! Pre-configured IBOR indexes.

use crate::ibor_index::IborIndex;
use ql_time::{
    BusinessDayConvention, DayCounter, Period, Target, UnitedStates, UsMarket,
};
use std::sync::Arc;

/// Create a Euribor index with the given tenor.
///
/// - Calendar: TARGET
/// - Day counter: Actual/360
/// - Fixing days: 2
/// - Convention: Modified Following
/// - End of month: true
pub fn euribor(tenor: Period) -> IborIndex {
    IborIndex::new(
        format!("Euribor{tenor}"),
        tenor,
        2,
        Arc::new(Target),
        BusinessDayConvention::ModifiedFollowing,
        true,
        DayCounter::Actual360,
    )
}

/// Create a USD LIBOR index with the given tenor.
///
/// - Calendar: US settlement
/// - Day counter: Actual/360
/// - Fixing days: 2
/// - Convention: Modified Following
/// - End of month: true
pub fn usd_libor(tenor: Period) -> IborIndex {
    IborIndex::new(
        format!("USDLibor{tenor}"),
        tenor,
        2,
        Arc::new(UnitedStates::new(UsMarket::Settlement)),
        BusinessDayConvention::ModifiedFollowing,
        true,
        DayCounter::Actual360,
    )
}
