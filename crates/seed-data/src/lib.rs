//! Bootstrap seeding for the directory database.
//!
//! Creates the database credentials the API logs in with and, for
//! development environments, a usable admin identity: an admin user, an
//! admin group granting permissions on every resource, the membership
//! linking the two, and the OAuth client of the local admin tool.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let config = SeedConfig::from_env()?;
//! let db = Database::connect(&config.mongo_uri, &config.database).await?;
//! let seeder = Seeder::new(db);
//!
//! let result = BootstrapBuilder::dev(config)
//!     .build(&seeder)
//!     .await?;
//! ```

pub mod builders;
pub mod config;
pub mod db;
pub mod generators;

pub use directory::models::{Credential, PermissionLevel, Resource, Role};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{AdminIdentity, BootstrapBuilder, BootstrapData, BootstrapResult};
    pub use crate::config::{AdminPassword, AdminSpec, ClientSpec, RootSpec, SeedConfig, Variant};
    pub use crate::db::{RootOutcome, SeedError, SeedStatus, Seeder};
    pub use crate::generators::{ClientGenerator, GroupGenerator, UserGenerator, root_id};
    pub use crate::{Credential, PermissionLevel, Resource, Role};
    pub use directory::Database;
}
