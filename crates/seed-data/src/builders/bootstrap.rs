//! Fluent builder for running a bootstrap sequence.

use std::time::Instant;

use directory::models::{Credential, Group, OAuthClient, User};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::config::{AdminPassword, SeedConfig, Variant};
use crate::db::{RootOutcome, SeedError, Seeder};
use crate::generators::{ClientGenerator, GroupGenerator, UserGenerator};

/// Identifiers assigned to the admin identity documents, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminIdentity {
    pub user_id: ObjectId,
    pub group_id: ObjectId,
    pub membership_id: ObjectId,
    pub oauth_client_id: ObjectId,
}

/// Result of running a bootstrap sequence.
#[derive(Debug)]
pub struct BootstrapResult {
    pub variant: Variant,
    /// Login created by the run, as `user@database`.
    pub credential: Option<String>,
    pub admin: Option<AdminIdentity>,
    pub root: Option<RootOutcome>,
    pub metrics: Option<BootstrapMetrics>,
}

/// Timing and counts of a bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapMetrics {
    /// Time spent generating documents (milliseconds).
    pub generation_time_ms: u64,
    /// Time spent writing to the database (milliseconds, 0 if build_data used).
    pub seeding_time_ms: u64,
    pub documents_inserted: usize,
}

/// Everything a run would write, generated without touching the database.
///
/// The membership is absent: it can only be built from the identifiers the
/// store assigns to the user and the group.
#[derive(Debug)]
pub struct BootstrapData {
    pub variant: Variant,
    pub at: OffsetDateTime,
    pub credential: Option<Credential>,
    pub admin_user: Option<User>,
    pub admin_group: Option<Group>,
    pub local_tool: Option<OAuthClient>,
    pub root_user: Option<User>,
    pub metrics: Option<BootstrapMetrics>,
}

impl BootstrapData {
    /// Renders the planned writes as JSON, leaving out credential passwords.
    pub fn to_json(&self) -> Result<Value, SeedError> {
        Ok(json!({
            "variant": self.variant.as_str(),
            "credential": self.credential.as_ref().map(|c| json!({
                "user": c.username,
                "role": c.role.as_str(),
                "db": c.database,
            })),
            "users": document_json(self.admin_user.as_ref())?,
            "groups": document_json(self.admin_group.as_ref())?,
            "oauthclients": document_json(self.local_tool.as_ref())?,
            "root": document_json(self.root_user.as_ref())?,
        }))
    }
}

fn document_json<T: Serialize>(document: Option<&T>) -> Result<Value, SeedError> {
    Ok(serde_json::to_value(document)?)
}

/// Builder for bootstrap runs.
///
/// # Example
///
/// ```rust,ignore
/// let result = BootstrapBuilder::dev(SeedConfig::from_env()?)
///     .with_root_user(true)
///     .build(&seeder)
///     .await?;
/// ```
pub struct BootstrapBuilder {
    variant: Variant,
    config: SeedConfig,
    create_credential: bool,
    include_root: bool,
    at: Option<OffsetDateTime>,
    track_metrics: bool,
}

impl BootstrapBuilder {
    pub fn new(variant: Variant, config: SeedConfig) -> Self {
        Self {
            variant,
            config,
            create_credential: true,
            include_root: false,
            at: None,
            track_metrics: false,
        }
    }

    /// Primary credential plus the admin user, group, membership and the
    /// local tool OAuth client.
    pub fn dev(config: SeedConfig) -> Self {
        Self::new(Variant::Dev, config)
    }

    /// Scoped credential on the test database only.
    pub fn test(config: SeedConfig) -> Self {
        Self::new(Variant::Test, config)
    }

    /// Skips or performs the credential step.
    pub fn with_credential(mut self, enabled: bool) -> Self {
        self.create_credential = enabled;
        self
    }

    pub fn without_credential(self) -> Self {
        self.with_credential(false)
    }

    /// Seeds the admin with a password hashed at seed time instead of the
    /// precomputed hash.
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.config.admin.password = AdminPassword::Plain(password.into());
        self
    }

    /// Also ensures the root user exists.
    pub fn with_root_user(mut self, enabled: bool) -> Self {
        self.include_root = enabled;
        self
    }

    /// Fixes the `_created`/`_updated` timestamp of generated documents.
    pub fn with_timestamp(mut self, at: OffsetDateTime) -> Self {
        self.at = Some(at);
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.track_metrics = enabled;
        self
    }

    /// Generates the documents without seeding the database.
    pub fn build_data(&self) -> Result<BootstrapData, SeedError> {
        let start_time = self.track_metrics.then(Instant::now);
        let at = self.at.unwrap_or_else(OffsetDateTime::now_utc);
        let users = UserGenerator::new(self.config.password_rounds);

        let credential = self.create_credential.then(|| match self.variant {
            Variant::Dev => self.config.credential.clone(),
            Variant::Test => self.config.test_credential.clone(),
        });

        let (admin_user, admin_group, local_tool) = match self.variant {
            Variant::Dev => (
                Some(users.admin(&self.config.admin, at)?),
                Some(GroupGenerator::new().admin(&self.config.admin.group_name, at)?),
                Some(ClientGenerator::new().generate(&self.config.local_tool, at)?),
            ),
            Variant::Test => (None, None, None),
        };

        let root_user = if self.include_root {
            Some(users.root(&self.config.root, at)?)
        } else {
            None
        };

        let metrics = start_time.map(|start| BootstrapMetrics {
            generation_time_ms: start.elapsed().as_millis() as u64,
            seeding_time_ms: 0, // Set by build() if database seeding occurs
            documents_inserted: 0,
        });

        Ok(BootstrapData {
            variant: self.variant,
            at,
            credential,
            admin_user,
            admin_group,
            local_tool,
            root_user,
            metrics,
        })
    }

    /// Generates the documents and writes them in order. The first failure
    /// aborts the sequence; earlier writes stay in place.
    pub async fn build(self, seeder: &Seeder) -> Result<BootstrapResult, SeedError> {
        let mut data = self.build_data()?;
        let seed_start = self.track_metrics.then(Instant::now);
        let mut inserted = 0;

        if let Some(credential) = &data.credential {
            seeder.create_credential(credential).await?;
        }

        let admin = match (&data.admin_user, &data.admin_group, &data.local_tool) {
            (Some(user), Some(group), Some(client)) => {
                seeder.ensure_indexes().await?;

                let user_id = seeder.seed_user(user).await?;
                let group_id = seeder.seed_group(group).await?;
                let membership = GroupGenerator::new().membership(user_id, group_id, data.at)?;
                let membership_id = seeder.seed_membership(&membership).await?;
                let oauth_client_id = seeder.seed_oauth_client(client).await?;
                inserted += 4;

                Some(AdminIdentity {
                    user_id,
                    group_id,
                    membership_id,
                    oauth_client_id,
                })
            }
            _ => None,
        };

        let root = match &data.root_user {
            Some(root) => {
                let outcome = seeder.ensure_root_user(root).await?;
                if outcome == RootOutcome::Created {
                    inserted += 1;
                }
                Some(outcome)
            }
            None => None,
        };

        if let (Some(start), Some(metrics)) = (seed_start, data.metrics.as_mut()) {
            metrics.seeding_time_ms = start.elapsed().as_millis() as u64;
            metrics.documents_inserted = inserted;
        }

        Ok(BootstrapResult {
            variant: self.variant,
            credential: data
                .credential
                .as_ref()
                .map(|c| format!("{}@{}", c.username, c.database)),
            admin,
            root,
            metrics: data.metrics,
        })
    }
}
