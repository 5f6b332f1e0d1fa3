//! Builders for running bootstrap sequences.

pub mod bootstrap;

pub use bootstrap::{
    AdminIdentity, BootstrapBuilder, BootstrapData, BootstrapMetrics, BootstrapResult,
};
