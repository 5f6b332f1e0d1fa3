//! User document generation.

use directory::etag;
use directory::models::{Gender, Membership, User, stored_timestamp};
use directory::password::hash_password;
use mongodb::bson::oid::ObjectId;
use time::OffsetDateTime;

use crate::config::{AdminPassword, AdminSpec, ROOT_ID_BYTES, RootSpec};
use crate::db::SeedError;

/// Generates user documents ready for insertion.
#[derive(Debug, Clone)]
pub struct UserGenerator {
    password_rounds: u32,
}

impl UserGenerator {
    pub fn new(password_rounds: u32) -> Self {
        Self { password_rounds }
    }

    /// Hashes a plain password with the configured rounds.
    pub fn password_hash(&self, password: &str) -> Result<String, SeedError> {
        Ok(hash_password(password, self.password_rounds)?)
    }

    /// Generates the admin user. The identifier is left to the store.
    pub fn admin(&self, spec: &AdminSpec, at: OffsetDateTime) -> Result<User, SeedError> {
        let password = match &spec.password {
            AdminPassword::Hashed(hash) => hash.clone(),
            AdminPassword::Plain(plain) => self.password_hash(plain)?,
        };

        let stamp = stored_timestamp(at);
        let mut user = User {
            id: None,
            nethz: Some(spec.nethz.clone()),
            password,
            email: spec.email.clone(),
            membership: spec.membership,
            gender: spec.gender,
            firstname: spec.firstname.clone(),
            lastname: spec.lastname.clone(),
            etag: String::new(),
            created: stamp,
            updated: stamp,
        };
        etag::stamp(&mut user)?;
        Ok(user)
    }

    /// Generates the root user with its fixed identifier.
    pub fn root(&self, spec: &RootSpec, at: OffsetDateTime) -> Result<User, SeedError> {
        let stamp = stored_timestamp(at);
        let mut user = User {
            id: Some(root_id()),
            nethz: None,
            password: self.password_hash(&spec.password)?,
            email: spec.email.clone(),
            membership: Membership::None,
            gender: Gender::Male,
            firstname: "Lord".to_string(),
            lastname: "Root".to_string(),
            etag: String::new(),
            created: stamp,
            updated: stamp,
        };
        etag::stamp(&mut user)?;
        Ok(user)
    }
}

/// Identifier of the root user.
pub fn root_id() -> ObjectId {
    ObjectId::from_bytes(ROOT_ID_BYTES)
}
