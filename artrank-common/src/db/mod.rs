//! Durable store models and queries

pub mod init;
pub mod models;
pub mod store;

pub use init::*;
pub use models::*;
pub use store::*;
