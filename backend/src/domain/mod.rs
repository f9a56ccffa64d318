// Domain layer module
pub mod aggregates;
pub mod base;
pub mod entities;
pub mod query_filter;
pub mod value_objects;

pub use aggregates::*;
pub use base::*;
pub use entities::*;
pub use query_filter::*;
pub use value_objects::*;
