pub mod debounce;
pub mod query;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer, SELECTION_DEBOUNCE};
pub use query::{join_url_params, parse_params};
