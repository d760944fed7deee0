pub mod history;
pub mod record;

#[cfg(test)]
mod tests;

pub use history::{active_value_delta, amendments_history, summarize};
pub use record::{deactivate_amendment, record_tenure_amendment, record_value_amendment};
