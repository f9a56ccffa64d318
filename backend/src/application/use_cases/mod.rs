pub mod search;

pub use search::{SearchByExample, SearchByText, SearchError, SearchResult};
