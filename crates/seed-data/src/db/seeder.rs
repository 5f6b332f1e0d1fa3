//! Database seeding utilities.

use directory::etag;
use directory::models::{
    Credential, Group, GroupMembership, OAuthClient, Resource, User, stored_timestamp,
};
use directory::{Database, DirectoryError, GrantedRole};
use mongodb::bson::{Document, doc, oid::ObjectId};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::generators::root_id;

/// Collections written by a seeding run.
pub const SEEDED_COLLECTIONS: [Resource; 4] = [
    Resource::Users,
    Resource::Groups,
    Resource::Groupmemberships,
    Resource::Oauthclients,
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Membership references missing {resource} {id}")]
    DanglingReference { resource: &'static str, id: ObjectId },
    #[error("No root user {0} found, run the root command first")]
    MissingRoot(ObjectId),
}

impl From<serde_json::Error> for SeedError {
    fn from(error: serde_json::Error) -> Self {
        SeedError::Directory(DirectoryError::from(error))
    }
}

impl SeedError {
    /// Returns true when the run failed because its data was already present.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SeedError::Directory(e) if e.is_conflict())
    }
}

/// Outcome of [`Seeder::ensure_root_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOutcome {
    Created,
    AlreadyPresent,
}

/// Snapshot of what a database currently holds.
#[derive(Debug, Clone)]
pub struct SeedStatus {
    pub database: String,
    pub counts: Vec<(Resource, u64)>,
    pub credentials: Vec<(String, Option<Vec<GrantedRole>>)>,
}

/// Database seeder performing one write per call.
///
/// None of the writes are retried or rolled back; the first error is
/// returned to the caller.
pub struct Seeder {
    db: Database,
}

impl Seeder {
    /// Creates a new seeder writing to the current database of `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a database login.
    pub async fn create_credential(&self, credential: &Credential) -> Result<(), SeedError> {
        info!(
            "Creating credential {} on {}...",
            credential.username, credential.database
        );
        self.db.create_credential(credential).await?;
        Ok(())
    }

    /// Ensures the unique indexes guarding against a second run.
    pub async fn ensure_indexes(&self) -> Result<(), SeedError> {
        self.db.ensure_indexes().await?;
        Ok(())
    }

    /// Inserts a user and returns the identifier assigned to it.
    pub async fn seed_user(&self, user: &User) -> Result<ObjectId, SeedError> {
        let id = self.db.insert(user).await?;
        info!("Seeded user {} ({id})", user.nethz.as_deref().unwrap_or(&user.email));
        Ok(id)
    }

    /// Inserts a group and returns the identifier assigned to it.
    pub async fn seed_group(&self, group: &Group) -> Result<ObjectId, SeedError> {
        let id = self.db.insert(group).await?;
        info!("Seeded group {} ({id})", group.name);
        Ok(id)
    }

    /// Inserts a group membership after checking that both referenced
    /// documents exist.
    pub async fn seed_membership(
        &self,
        membership: &GroupMembership,
    ) -> Result<ObjectId, SeedError> {
        if !self.db.exists(Resource::Users, membership.user).await? {
            return Err(SeedError::DanglingReference {
                resource: Resource::Users.as_str(),
                id: membership.user,
            });
        }
        if !self.db.exists(Resource::Groups, membership.group).await? {
            return Err(SeedError::DanglingReference {
                resource: Resource::Groups.as_str(),
                id: membership.group,
            });
        }

        let id = self.db.insert(membership).await?;
        info!(
            "Seeded membership of {} in {} ({id})",
            membership.user, membership.group
        );
        Ok(id)
    }

    /// Inserts an OAuth client and returns the identifier assigned to it.
    pub async fn seed_oauth_client(&self, client: &OAuthClient) -> Result<ObjectId, SeedError> {
        let id = self.db.insert(client).await?;
        info!("Seeded OAuth client {:?} ({id})", client.client_id);
        Ok(id)
    }

    /// Inserts the root user unless a user with its identifier already exists.
    pub async fn ensure_root_user(&self, root: &User) -> Result<RootOutcome, SeedError> {
        let Some(id) = root.id else {
            return Err(SeedError::Config("root user needs a fixed id".to_string()));
        };

        if self.db.exists(Resource::Users, id).await? {
            warn!("Root user already in {}, leaving it untouched", self.db.name());
            return Ok(RootOutcome::AlreadyPresent);
        }

        self.db.insert(root).await?;
        info!("Root user added to {}", self.db.name());
        Ok(RootOutcome::Created)
    }

    /// Replaces the password of the root user with `password_hash`.
    ///
    /// The tag and `_updated` are refreshed along with it; `_created` is kept.
    pub async fn set_root_password(
        &self,
        password_hash: &str,
        at: OffsetDateTime,
    ) -> Result<(), SeedError> {
        let id = root_id();
        let Some(mut root) = self
            .db
            .find_one::<User>(Resource::Users, doc! { "_id": id })
            .await?
        else {
            return Err(SeedError::MissingRoot(id));
        };

        root.password = password_hash.to_string();
        etag::stamp(&mut root)?;
        let fields = doc! {
            "password": root.password.as_str(),
            "_etag": root.etag.as_str(),
            "_updated": stored_timestamp(at),
        };

        if !self.db.set_fields(Resource::Users, id, fields).await? {
            return Err(SeedError::MissingRoot(id));
        }
        info!("Root password changed in {}", self.db.name());
        Ok(())
    }

    /// Counts the seeded documents and looks up the given logins.
    pub async fn status(&self, credentials: &[&Credential]) -> Result<SeedStatus, SeedError> {
        let mut counts = Vec::with_capacity(SEEDED_COLLECTIONS.len());
        for resource in SEEDED_COLLECTIONS {
            counts.push((resource, self.db.count(resource, Document::new()).await?));
        }

        let mut found = Vec::with_capacity(credentials.len());
        for credential in credentials {
            let roles = self
                .db
                .credential_roles(&credential.username, &credential.database)
                .await?;
            found.push((
                format!("{}@{}", credential.username, credential.database),
                roles,
            ));
        }

        Ok(SeedStatus {
            database: self.db.name().to_string(),
            counts,
            credentials: found,
        })
    }

    /// Drops every seeded collection.
    ///
    /// **WARNING**: This deletes all users, groups, memberships and OAuth
    /// clients of the database, not only seeded ones.
    pub async fn clear_all(&self) -> Result<(), SeedError> {
        info!("Clearing seeded collections of {}...", self.db.name());
        self.db.drop_collections(&SEEDED_COLLECTIONS).await?;
        info!("All seeded collections dropped");
        Ok(())
    }
}
