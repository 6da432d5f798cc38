use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

use super::{AuthError, CredentialStore};

/// Mints opaque bearer tokens and records them as the user's only token.
#[derive(Clone)]
pub struct TokenMinter {
    store: Arc<dyn CredentialStore>,
    token_bytes: usize,
}

impl TokenMinter {
    pub fn new(store: Arc<dyn CredentialStore>, token_bytes: usize) -> Self {
        Self {
            store,
            token_bytes: token_bytes.max(16),
        }
    }

    pub fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Generate a token and persist it for `user_id`, replacing the old one.
    pub async fn issue(&self, user_id: i32) -> Result<String, AuthError> {
        let token = self.generate();
        self.store.update_user_token(user_id, &token).await?;
        Ok(token)
    }
}
