//! Document generators for bootstrap data.
//!
//! - [`UserGenerator`]: the admin and root users
//! - [`GroupGenerator`]: the admin group and memberships
//! - [`ClientGenerator`]: OAuth clients
//!
//! Every generated document carries a change-tracking tag computed from its
//! content and the run timestamp in `_created`/`_updated`.

pub mod client;
pub mod group;
pub mod user;

pub use client::ClientGenerator;
pub use group::GroupGenerator;
pub use user::{UserGenerator, root_id};
