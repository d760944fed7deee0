pub mod summary;
pub mod tracker;

pub use summary::{
    active_period, days_remaining_in_active_period, period_statistics, periods_summary,
};
pub use tracker::{bootstrap_period, current_period, open_extension_period, shorten_active_period};
