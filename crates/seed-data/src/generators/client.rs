//! OAuth client generation.

use directory::etag;
use directory::models::{OAuthClient, stored_timestamp};
use time::OffsetDateTime;

use crate::config::ClientSpec;
use crate::db::SeedError;

#[derive(Debug, Default)]
pub struct ClientGenerator;

impl ClientGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, spec: &ClientSpec, at: OffsetDateTime) -> Result<OAuthClient, SeedError> {
        let stamp = stored_timestamp(at);
        let mut client = OAuthClient {
            id: None,
            client_id: spec.client_id.clone(),
            redirect_uri: spec.redirect_uri.clone(),
            etag: String::new(),
            created: stamp,
            updated: stamp,
        };
        etag::stamp(&mut client)?;
        Ok(client)
    }
}
