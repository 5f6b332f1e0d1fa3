//! Database integration for seeding bootstrap data.
//!
//! The [`Seeder`] performs the individual writes: credentials, indexes and
//! one insert per document, each returning what later steps need.

mod seeder;

pub use seeder::{RootOutcome, SEEDED_COLLECTIONS, SeedError, SeedStatus, Seeder};
