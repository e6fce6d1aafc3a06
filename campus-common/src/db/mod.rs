//! Database access layer

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
