//! Typed access to the directory collections: users, groups, group
//! memberships and OAuth clients, plus the database credentials the API
//! logs in with.

pub mod database;
pub mod errors;
pub mod etag;
pub mod models;
pub mod password;

pub use database::{Database, GrantedRole};
pub use errors::DirectoryError;
