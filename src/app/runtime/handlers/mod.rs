pub mod query;
pub mod results;

pub use query::{handle_load_more, handle_query_change};
pub use results::handle_fetch_outcome;
