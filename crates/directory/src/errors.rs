use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Server code for a duplicate key on a unique index.
const DUPLICATE_KEY: i32 = 11000;
/// Server code returned by `createUser` when the login already exists.
const USER_ALREADY_EXISTS: i32 = 51003;
const UNAUTHORIZED: i32 = 13;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Credential {username:?} already exists on database {database:?}")]
    CredentialExists { username: String, database: String },

    #[error("Duplicate document in {collection}: {message}")]
    DuplicateKey { collection: String, message: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid password hash: {0}")]
    InvalidPasswordHash(String),

    #[error("Insert into {0} returned no ObjectId")]
    MissingInsertedId(String),
}

/// Extracts the server error code from a driver error, if there is one.
pub fn server_code(error: &mongodb::error::Error) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Command(e) => Some(e.code),
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(e)) => Some(e.code),
        _ => None,
    }
}

impl DirectoryError {
    /// Classifies a failed document write against `collection`.
    pub fn from_write(collection: &str, error: mongodb::error::Error) -> Self {
        match server_code(&error) {
            Some(DUPLICATE_KEY) => DirectoryError::DuplicateKey {
                collection: collection.to_string(),
                message: error.to_string(),
            },
            Some(UNAUTHORIZED) => DirectoryError::PermissionDenied(error.to_string()),
            _ => DirectoryError::Database(error),
        }
    }

    /// Classifies a failed user-management command (`createUser`, `usersInfo`, `dropUser`).
    pub fn from_user_command(username: &str, database: &str, error: mongodb::error::Error) -> Self {
        match server_code(&error) {
            Some(USER_ALREADY_EXISTS) => DirectoryError::CredentialExists {
                username: username.to_string(),
                database: database.to_string(),
            },
            Some(UNAUTHORIZED) => DirectoryError::PermissionDenied(error.to_string()),
            _ => DirectoryError::Database(error),
        }
    }

    /// Returns true for failures caused by data that is already present.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DirectoryError::CredentialExists { .. } | DirectoryError::DuplicateKey { .. }
        )
    }
}
