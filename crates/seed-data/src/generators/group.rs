//! Group and group membership generation.

use directory::etag;
use directory::models::{
    Group, GroupMembership, PermissionLevel, PermissionMatrix, Resource, stored_timestamp,
};
use mongodb::bson::oid::ObjectId;
use time::OffsetDateTime;

use crate::db::SeedError;

/// Generates groups and memberships ready for insertion.
#[derive(Debug, Default)]
pub struct GroupGenerator;

impl GroupGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Permissions of the admin group: read-write everywhere except
    /// beverages, which is read-only.
    pub fn admin_permissions() -> PermissionMatrix {
        Resource::ALL
            .into_iter()
            .map(|resource| {
                let level = match resource {
                    Resource::Beverages => PermissionLevel::Read,
                    _ => PermissionLevel::Readwrite,
                };
                (resource, level)
            })
            .collect()
    }

    pub fn admin(&self, name: &str, at: OffsetDateTime) -> Result<Group, SeedError> {
        let stamp = stored_timestamp(at);
        let mut group = Group {
            id: None,
            name: name.to_string(),
            permissions: Self::admin_permissions(),
            etag: String::new(),
            created: stamp,
            updated: stamp,
        };
        etag::stamp(&mut group)?;
        Ok(group)
    }

    /// Links a user to a group. Both identifiers must come from inserts
    /// made earlier in the same run.
    pub fn membership(
        &self,
        user: ObjectId,
        group: ObjectId,
        at: OffsetDateTime,
    ) -> Result<GroupMembership, SeedError> {
        let stamp = stored_timestamp(at);
        let mut membership = GroupMembership {
            id: None,
            user,
            group,
            etag: String::new(),
            created: stamp,
            updated: stamp,
        };
        etag::stamp(&mut membership)?;
        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_permissions_cover_every_resource() {
        let permissions = GroupGenerator::admin_permissions();
        assert_eq!(permissions.len(), Resource::ALL.len());

        for (resource, level) in &permissions {
            let expected = if *resource == Resource::Beverages {
                PermissionLevel::Read
            } else {
                PermissionLevel::Readwrite
            };
            assert_eq!(*level, expected, "{}", resource.as_str());
        }
    }

    #[test]
    fn test_admin_group() {
        let group = GroupGenerator::new()
            .admin("admin", OffsetDateTime::now_utc())
            .unwrap();
        assert_eq!(group.name, "admin");
        assert_eq!(group.permission(Resource::Beverages), PermissionLevel::Read);
        assert_eq!(group.permission(Resource::Oauthclients), PermissionLevel::Readwrite);
    }

    #[test]
    fn test_memberships_get_distinct_etags() {
        let groups = GroupGenerator::new();
        let at = OffsetDateTime::now_utc();
        let group = ObjectId::new();
        let a = groups.membership(ObjectId::new(), group, at).unwrap();
        let b = groups.membership(ObjectId::new(), group, at).unwrap();

        assert_eq!(a.group, b.group);
        assert_ne!(a.etag, b.etag);
    }
}
