//! Terminal front end

pub mod convert;
pub mod currencies;
pub mod live;
pub mod setup;
pub mod ui;
