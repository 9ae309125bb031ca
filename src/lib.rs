//! CRUD forms over the six tables of the driving school database.
//!
//! Each table gets a [`Form`]: one input per field, a results grid and the
//! create/read/update/delete buttons. [`TabSet`] holds one form per table and
//! runs their actions through a single [`ConnectionManager`].

pub mod libs;

pub use libs::*;
