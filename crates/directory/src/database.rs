use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use mongodb::options::IndexOptions;
use mongodb::{Client, IndexModel};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::DirectoryError;
use crate::models::{Credential, Resource, StoredDocument};

/// A granted role as reported by `usersInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedRole {
    pub role: String,
    pub db: String,
}

#[derive(Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    pub fn new(client: Client, name: &str) -> Self {
        let db = client.database(name);
        Self { client, db }
    }

    /// Connects to `uri` and selects `name` as the current database.
    pub async fn connect(uri: &str, name: &str) -> Result<Self, DirectoryError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client, name))
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }

    /// Returns a handle on another database of the same deployment.
    pub fn sibling(&self, name: &str) -> Self {
        Self::new(self.client.clone(), name)
    }

    /// Creates a login in the credential's database, with its role scoped to
    /// that same database.
    pub async fn create_credential(&self, credential: &Credential) -> Result<(), DirectoryError> {
        let command = doc! {
            "createUser": credential.username.as_str(),
            "pwd": credential.password.as_str(),
            "roles": [
                { "role": credential.role.as_str(), "db": credential.database.as_str() },
            ],
        };

        self.client
            .database(&credential.database)
            .run_command(command)
            .await
            .map_err(|e| {
                DirectoryError::from_user_command(&credential.username, &credential.database, e)
            })?;

        info!(
            "Created credential {} with role {} on {}",
            credential.username,
            credential.role.as_str(),
            credential.database
        );
        Ok(())
    }

    /// Looks up a login in `database`. Returns `None` when it doesn't exist.
    pub async fn credential_roles(
        &self,
        username: &str,
        database: &str,
    ) -> Result<Option<Vec<GrantedRole>>, DirectoryError> {
        let response = self
            .client
            .database(database)
            .run_command(doc! { "usersInfo": username })
            .await
            .map_err(|e| DirectoryError::from_user_command(username, database, e))?;

        let Ok(users) = response.get_array("users") else {
            return Ok(None);
        };
        let Some(user) = users.iter().find_map(Bson::as_document) else {
            return Ok(None);
        };

        let roles = user
            .get_array("roles")
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(Bson::as_document)
                    .filter_map(|r| {
                        Some(GrantedRole {
                            role: r.get_str("role").ok()?.to_string(),
                            db: r.get_str("db").ok()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(roles))
    }

    pub async fn drop_credential(&self, username: &str, database: &str) -> Result<(), DirectoryError> {
        self.client
            .database(database)
            .run_command(doc! { "dropUser": username })
            .await
            .map_err(|e| DirectoryError::from_user_command(username, database, e))?;
        Ok(())
    }

    /// Ensures the unique indexes that make a second seeding run fail
    /// instead of duplicating documents.
    pub async fn ensure_indexes(&self) -> Result<(), DirectoryError> {
        let indexes: [(Resource, Document, bool); 5] = [
            (Resource::Users, doc! { "nethz": 1 }, true),
            (Resource::Users, doc! { "email": 1 }, false),
            (Resource::Groups, doc! { "name": 1 }, false),
            (Resource::Groupmemberships, doc! { "user": 1, "group": 1 }, false),
            (Resource::Oauthclients, doc! { "client_id": 1 }, false),
        ];

        for (resource, keys, sparse) in indexes {
            let options = IndexOptions::builder().unique(true).sparse(sparse).build();
            let model = IndexModel::builder().keys(keys).options(options).build();
            self.db
                .collection::<Document>(resource.as_str())
                .create_index(model)
                .await
                .map_err(|e| DirectoryError::from_write(resource.as_str(), e))?;
        }

        debug!("Unique indexes ensured on {}", self.name());
        Ok(())
    }

    /// Inserts a document and returns its identifier.
    pub async fn insert<D: StoredDocument>(&self, document: &D) -> Result<ObjectId, DirectoryError> {
        let collection = D::COLLECTION.as_str();
        let result = self
            .db
            .collection::<D>(collection)
            .insert_one(document)
            .await
            .map_err(|e| DirectoryError::from_write(collection, e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DirectoryError::MissingInsertedId(collection.to_string()))
    }

    pub async fn find_one<T>(
        &self,
        resource: Resource,
        filter: Document,
    ) -> Result<Option<T>, DirectoryError>
    where
        T: DeserializeOwned + Send + Sync,
    {
        Ok(self
            .db
            .collection::<T>(resource.as_str())
            .find_one(filter)
            .await?)
    }

    /// Sets `fields` on the document with `id`. Returns false when no
    /// document matched.
    pub async fn set_fields(
        &self,
        resource: Resource,
        id: ObjectId,
        fields: Document,
    ) -> Result<bool, DirectoryError> {
        let collection = resource.as_str();
        let result = self
            .db
            .collection::<Document>(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await
            .map_err(|e| DirectoryError::from_write(collection, e))?;
        Ok(result.matched_count > 0)
    }

    pub async fn count(&self, resource: Resource, filter: Document) -> Result<u64, DirectoryError> {
        Ok(self
            .db
            .collection::<Document>(resource.as_str())
            .count_documents(filter)
            .await?)
    }

    pub async fn exists(&self, resource: Resource, id: ObjectId) -> Result<bool, DirectoryError> {
        Ok(self.count(resource, doc! { "_id": id }).await? > 0)
    }

    /// Drops the given collections, including their indexes.
    pub async fn drop_collections(&self, resources: &[Resource]) -> Result<(), DirectoryError> {
        for resource in resources {
            self.db
                .collection::<Document>(resource.as_str())
                .drop()
                .await?;
        }
        Ok(())
    }

    /// Drops the whole database.
    pub async fn drop(&self) -> Result<(), DirectoryError> {
        self.db.drop().await?;
        Ok(())
    }
}
