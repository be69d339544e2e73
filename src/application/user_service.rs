use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{UpdateUserRequest, User};
use crate::domain::validation::{validate_user_id, validate_user_update};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Administrative user operations. Creation lives in
/// [`AuthService::register_user`](crate::application::auth_service::AuthService::register_user).
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repository.list_users().await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let user_id = validate_user_id(user_id)?;
        if !self.user_repository.delete_user(&user_id).await? {
            warn!(user_id = %user_id, "User not found");
            return Err(DomainError::NotFound("User not found".to_string()).into());
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    #[instrument(skip(self, req))]
    pub async fn update_user(&self, user_id: &str, req: UpdateUserRequest) -> Result<User> {
        let user_id = validate_user_id(user_id)?;
        let update = validate_user_update(req).map_err(DomainError::from)?;

        let current = self
            .user_repository
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;

        if let Some(username) = update.username.as_deref() {
            if username != current.username
                && self
                    .user_repository
                    .find_user_by_username(username)
                    .await?
                    .is_some()
            {
                warn!(username = username, "Username already exists");
                return Err(DomainError::Conflict("Username already exists".to_string()).into());
            }
        }

        let user = self
            .user_repository
            .update_user(&user_id, update)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }
}
