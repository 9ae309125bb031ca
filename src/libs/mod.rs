pub mod connection;
pub mod error;
pub mod executor;
pub mod form;
pub mod query_builder;
pub mod row;
pub mod schema;
pub mod tabs;

#[cfg(test)]
pub(crate) mod memory;

// Re-export them for easier access from main.rs
pub use connection::*;
pub use error::*;
pub use executor::*;
pub use form::*;
pub use query_builder::*;
pub use row::*;
pub use schema::*;
pub use tabs::*;
