//! Local credential path: registration and enumeration-resistant login
//! over the shared identity store.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;
use secrets_identity_core::{IdentityError, IdentityResult, User, UserStore};
use std::sync::Arc;
use tracing::info;

/// A real Argon2 hash of "dummy_password", verified when the requested
/// username is absent so timing does not reveal whether a user exists.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$9QsJRKgzJkKaOUvlp7gl2Q$qmE3qIFBNJ6nZYbLYXEI2uo0zZc7T0Q8LU1ZsqsZ3QE";

#[derive(Clone)]
pub struct LocalCredentials {
    store: Arc<dyn UserStore>,
}

impl LocalCredentials {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Creates a local account. A taken username is rejected with
    /// [`IdentityError::DuplicateUser`] and the existing record is left
    /// untouched; the store serializes the check against the insert.
    pub async fn register(&self, username: &str, password: &str) -> IdentityResult<User> {
        let password_hash = hash_password(password)?;
        let user = self
            .store
            .create(User::new_local(username.to_string(), password_hash))
            .await?;

        info!(user_id = %user.id, "registered local user");
        Ok(user)
    }

    /// Verifies a username/password pair. Unknown users and wrong
    /// passwords fail identically with [`IdentityError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> IdentityResult<User> {
        let user = self.store.find_by_username(username).await?;

        let (user_exists, password_hash) = match &user {
            Some(u) => match u.password_hash.as_deref() {
                Some(hash) => (true, hash),
                // Provider-only account: no local password to match.
                None => (false, DUMMY_HASH),
            },
            None => (false, DUMMY_HASH),
        };

        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        let password_valid = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        if user_exists && password_valid {
            Ok(user.unwrap())
        } else {
            Err(IdentityError::InvalidCredentials)
        }
    }
}

fn hash_password(password: &str) -> IdentityResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| IdentityError::Internal(e.to_string()))
}
