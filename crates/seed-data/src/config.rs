//! Configuration for seeding runs.
//!
//! Values come from the environment (a `.env` file is honored by the `seed`
//! binary) and fall back to the development defaults below.

use std::env;

use directory::models::{Credential, Gender, Membership, Role};
use directory::password::DEFAULT_ROUNDS;

use crate::db::SeedError;

/// Hash of the development admin password (`admin`), precomputed with 5 rounds.
pub const DEV_ADMIN_PASSWORD_HASH: &str =
    "$pbkdf2-sha256$5$OqfUmtNaq5UyRohxDuGckw$9H/UL5N5dA7JmUq7ohRPfmJ84OUnpRKjTgsMeuFilXM";

/// Fixed identifier of the root user: 24 zeros as an ObjectId.
pub const ROOT_ID_BYTES: [u8; 12] = [0; 12];

/// Which bootstrap sequence to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Primary credential plus the admin identity documents.
    Dev,
    /// A second credential scoped to the test database, no documents.
    Test,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Dev => "dev",
            Variant::Test => "test",
        }
    }
}

/// How the admin password is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPassword {
    /// Stored as given.
    Hashed(String),
    /// Hashed at seed time.
    Plain(String),
}

/// The admin user seeded by the dev variant.
#[derive(Debug, Clone)]
pub struct AdminSpec {
    pub nethz: String,
    pub email: String,
    pub membership: Membership,
    pub gender: Gender,
    pub firstname: String,
    pub lastname: String,
    pub password: AdminPassword,
    /// Name of the group granting the admin permissions.
    pub group_name: String,
}

impl Default for AdminSpec {
    fn default() -> Self {
        Self {
            nethz: "admin".to_string(),
            email: "admin@example.com".to_string(),
            membership: Membership::Regular,
            gender: Gender::Female,
            firstname: "ad".to_string(),
            lastname: "min".to_string(),
            password: AdminPassword::Hashed(DEV_ADMIN_PASSWORD_HASH.to_string()),
            group_name: "admin".to_string(),
        }
    }
}

/// The root user created by `ensure_root_user`.
#[derive(Debug, Clone)]
pub struct RootSpec {
    pub email: String,
    pub password: String,
}

impl Default for RootSpec {
    fn default() -> Self {
        Self {
            email: "root@example.com".to_string(),
            password: "root".to_string(),
        }
    }
}

/// An OAuth client registered at bootstrap.
#[derive(Debug, Clone)]
pub struct ClientSpec {
    pub client_id: String,
    pub redirect_uri: String,
}

impl ClientSpec {
    /// The client used by the local admin tool.
    pub fn local_tool() -> Self {
        Self {
            client_id: "Local Tool".to_string(),
            redirect_uri: "http://localhost".to_string(),
        }
    }
}

/// Configuration for seeding operations.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Connection string of a login allowed to create users.
    pub mongo_uri: String,

    /// Database receiving the dev documents.
    pub database: String,

    /// Login the API uses in normal operation.
    pub credential: Credential,

    /// Login used by test runs, on its own database.
    pub test_credential: Credential,

    pub admin: AdminSpec,
    pub root: RootSpec,
    pub local_tool: ClientSpec,

    /// Rounds for passwords hashed at seed time.
    pub password_rounds: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database: "amivapi".to_string(),
            credential: Credential {
                username: "amivapi".to_string(),
                password: "amivapi".to_string(),
                role: Role::ReadWrite,
                database: "amivapi".to_string(),
            },
            test_credential: Credential {
                username: "test_user".to_string(),
                password: "test_pw".to_string(),
                role: Role::ReadWrite,
                database: "test_amivapi".to_string(),
            },
            admin: AdminSpec::default(),
            root: RootSpec::default(),
            local_tool: ClientSpec::local_tool(),
            password_rounds: DEFAULT_ROUNDS,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl SeedConfig {
    /// Loads the configuration from environment variables.
    pub fn from_env() -> Result<Self, SeedError> {
        let defaults = Self::default();

        let database = env_or("MONGO_DBNAME", &defaults.database);
        let credential = Credential {
            username: env_or("MONGO_USERNAME", &defaults.credential.username),
            password: env_or("MONGO_PASSWORD", &defaults.credential.password),
            role: Role::ReadWrite,
            database: database.clone(),
        };
        let test_credential = Credential {
            username: env_or("TEST_MONGO_USERNAME", &defaults.test_credential.username),
            password: env_or("TEST_MONGO_PASSWORD", &defaults.test_credential.password),
            role: Role::ReadWrite,
            database: env_or("TEST_MONGO_DBNAME", &defaults.test_credential.database),
        };

        let password_rounds = match env::var("PASSWORD_ROUNDS") {
            Ok(value) => value
                .parse::<u32>()
                .ok()
                .filter(|rounds| *rounds > 0)
                .ok_or_else(|| SeedError::Config(format!("invalid PASSWORD_ROUNDS: {value}")))?,
            Err(_) => defaults.password_rounds,
        };

        let mut admin = defaults.admin;
        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            admin.password = AdminPassword::Plain(password);
        }

        let config = Self {
            mongo_uri: env_or("MONGO_URI", &defaults.mongo_uri),
            database,
            credential,
            test_credential,
            admin,
            root: RootSpec {
                email: env_or("ROOT_MAIL", &defaults.root.email),
                password: env_or("ROOT_PASSWORD", &defaults.root.password),
            },
            local_tool: defaults.local_tool,
            password_rounds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Points both the dev documents and the primary credential at `database`.
    pub fn with_database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self.credential.database = database.to_string();
        self
    }

    /// Checks that test runs stay isolated from the primary database.
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.test_credential.database == self.credential.database {
            return Err(SeedError::Config(format!(
                "test database must differ from the primary database ({})",
                self.credential.database
            )));
        }
        if self.test_credential.username == self.credential.username {
            return Err(SeedError::Config(format!(
                "test username must differ from the primary username ({})",
                self.credential.username
            )));
        }
        Ok(())
    }
}
