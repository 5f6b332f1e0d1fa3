use std::collections::BTreeMap;

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Resources whose access a group can grant. Each one is also the name of
/// the collection backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Apikeys,
    Users,
    Sessions,
    Events,
    Eventsignups,
    Groups,
    Groupmemberships,
    Joboffers,
    Beverages,
    Studydocuments,
    Oauthclients,
}

impl Resource {
    pub const ALL: [Resource; 11] = [
        Resource::Apikeys,
        Resource::Users,
        Resource::Sessions,
        Resource::Events,
        Resource::Eventsignups,
        Resource::Groups,
        Resource::Groupmemberships,
        Resource::Joboffers,
        Resource::Beverages,
        Resource::Studydocuments,
        Resource::Oauthclients,
    ];

    /// Returns the resource name as stored in permission maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Apikeys => "apikeys",
            Resource::Users => "users",
            Resource::Sessions => "sessions",
            Resource::Events => "events",
            Resource::Eventsignups => "eventsignups",
            Resource::Groups => "groups",
            Resource::Groupmemberships => "groupmemberships",
            Resource::Joboffers => "joboffers",
            Resource::Beverages => "beverages",
            Resource::Studydocuments => "studydocuments",
            Resource::Oauthclients => "oauthclients",
        }
    }
}

/// Permission level a group grants on a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    None,
    Read,
    Readwrite,
}

pub type PermissionMatrix = BTreeMap<Resource, PermissionLevel>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    None,
    Regular,
    Extraordinary,
    Honorary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Role granted to a database credential, scoped to a single database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Read,
    ReadWrite,
    DbAdmin,
    DbOwner,
}

impl Role {
    /// Returns the built-in role name understood by `createUser`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::ReadWrite => "readWrite",
            Role::DbAdmin => "dbAdmin",
            Role::DbOwner => "dbOwner",
        }
    }
}

/// A database-level login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub database: String,
}

/// A document type stored in one of the directory collections.
pub trait StoredDocument: Serialize + Send + Sync {
    const COLLECTION: Resource;

    /// Identifier fixed before insertion, if any.
    fn id(&self) -> Option<ObjectId>;

    /// Sets the change-tracking tag.
    fn set_etag(&mut self, etag: String);
}

/// Converts a timestamp to the stored representation, dropping sub-second
/// precision the way the API does for documents it creates itself.
pub fn stored_timestamp(at: OffsetDateTime) -> DateTime {
    DateTime::from_millis(at.unix_timestamp() * 1000)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nethz: Option<String>,
    pub password: String,
    pub email: String,
    pub membership: Membership,
    pub gender: Gender,
    pub firstname: String,
    pub lastname: String,
    #[serde(rename = "_etag")]
    pub etag: String,
    #[serde(rename = "_created")]
    pub created: DateTime,
    #[serde(rename = "_updated")]
    pub updated: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub permissions: PermissionMatrix,
    #[serde(rename = "_etag")]
    pub etag: String,
    #[serde(rename = "_created")]
    pub created: DateTime,
    #[serde(rename = "_updated")]
    pub updated: DateTime,
}

impl Group {
    /// Returns the level granted on `resource`, treating missing entries as none.
    pub fn permission(&self, resource: Resource) -> PermissionLevel {
        self.permissions
            .get(&resource)
            .copied()
            .unwrap_or(PermissionLevel::None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    pub group: ObjectId,
    #[serde(rename = "_etag")]
    pub etag: String,
    #[serde(rename = "_created")]
    pub created: DateTime,
    #[serde(rename = "_updated")]
    pub updated: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(rename = "_etag")]
    pub etag: String,
    #[serde(rename = "_created")]
    pub created: DateTime,
    #[serde(rename = "_updated")]
    pub updated: DateTime,
}

macro_rules! stored_document {
    ($ty:ty, $collection:expr) => {
        impl StoredDocument for $ty {
            const COLLECTION: Resource = $collection;

            fn id(&self) -> Option<ObjectId> {
                self.id
            }

            fn set_etag(&mut self, etag: String) {
                self.etag = etag;
            }
        }
    };
}

stored_document!(User, Resource::Users);
stored_document!(Group, Resource::Groups);
stored_document!(GroupMembership, Resource::Groupmemberships);
stored_document!(OAuthClient, Resource::Oauthclients);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names_match_serde() {
        for resource in Resource::ALL {
            let json = serde_json::to_value(resource).unwrap();
            assert_eq!(json, serde_json::Value::String(resource.as_str().to_string()));
        }
    }

    #[test]
    fn test_permission_matrix_serializes_as_map() {
        let mut permissions = PermissionMatrix::new();
        permissions.insert(Resource::Beverages, PermissionLevel::Read);
        permissions.insert(Resource::Users, PermissionLevel::Readwrite);

        let json = serde_json::to_value(&permissions).unwrap();
        assert_eq!(json["beverages"], "read");
        assert_eq!(json["users"], "readwrite");
    }

    #[test]
    fn test_missing_permission_is_none() {
        let group = Group {
            id: None,
            name: "empty".to_string(),
            permissions: PermissionMatrix::new(),
            etag: String::new(),
            created: DateTime::from_millis(0),
            updated: DateTime::from_millis(0),
        };
        assert_eq!(group.permission(Resource::Events), PermissionLevel::None);
    }

    #[test]
    fn test_role_uses_builtin_name() {
        assert_eq!(Role::Read.as_str(), "read");
        assert_eq!(Role::ReadWrite.as_str(), "readWrite");
        assert_eq!(Role::DbOwner.as_str(), "dbOwner");
    }

    #[test]
    fn test_stored_timestamp_truncates_to_seconds() {
        let at = OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_456_789).unwrap();
        assert_eq!(stored_timestamp(at).timestamp_millis(), 1_700_000_000_000);
    }
}
