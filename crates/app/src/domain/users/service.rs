//! Users service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{info, instrument, warn};

use crate::{
    domain::{
        access::{Actor, Capability},
        errors::{Entity, MarketplaceError, StorageResultExt},
        users::{
            data::NewUser,
            records::{Role, UserRecord, UserUuid},
        },
    },
    storage::{Storage, StorageError},
};

#[derive(Clone)]
pub struct StorageUsersService {
    storage: Arc<dyn Storage>,
}

impl StorageUsersService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

/// Name shown for a profile registered without one.
fn display_name(name: &str, email: &str) -> String {
    let name = name.trim();

    if name.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        name.to_string()
    }
}

#[async_trait]
impl UsersService for StorageUsersService {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn register_user(&self, user: NewUser) -> Result<UserRecord, MarketplaceError> {
        let email = user.email.trim();

        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(MarketplaceError::Validation(format!(
                    "invalid email address {email:?}"
                )));
            }
        }

        let record = UserRecord {
            uuid: user.uuid,
            name: display_name(&user.name, email),
            email: email.to_string(),
            role: user.role.unwrap_or(Role::Renter),
            avatar: user.avatar,
        };

        let created = self
            .storage
            .create_user(record)
            .await
            .or_not_found(Entity::User)?;

        info!(user = %created.uuid, role = %created.role, "registered user");

        Ok(created)
    }

    async fn get_user(&self, actor: Actor, user: UserUuid) -> Result<UserRecord, MarketplaceError> {
        actor.require(Capability::Authenticated)?;

        self.storage.get_user(user).await.or_not_found(Entity::User)
    }

    async fn list_users(&self, actor: Actor) -> Result<Vec<UserRecord>, MarketplaceError> {
        actor.require(Capability::Administer)?;

        Ok(self.storage.list_users().await?)
    }

    async fn resolve_actor(&self, user: Option<UserUuid>) -> Result<Actor, MarketplaceError> {
        let Some(uuid) = user else {
            return Ok(Actor::Anonymous);
        };

        match self.storage.get_user(uuid).await {
            Ok(record) => Ok(Actor::user(record.uuid, record.role)),
            Err(StorageError::NotFound) => {
                warn!(user = %uuid, "unknown user; continuing anonymously");

                Ok(Actor::Anonymous)
            }
            Err(error) => Err(MarketplaceError::BackendUnavailable(error)),
        }
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Create a profile. A blank name falls back to the email's local part and a missing
    /// role to renter.
    async fn register_user(&self, user: NewUser) -> Result<UserRecord, MarketplaceError>;

    /// Retrieve a single profile.
    async fn get_user(&self, actor: Actor, user: UserUuid) -> Result<UserRecord, MarketplaceError>;

    /// Retrieve every profile (admin only).
    async fn list_users(&self, actor: Actor) -> Result<Vec<UserRecord>, MarketplaceError>;

    /// Turn a session's user id into the acting caller. Unknown ids act anonymously.
    async fn resolve_actor(&self, user: Option<UserUuid>) -> Result<Actor, MarketplaceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{domain::errors::ErrorKind, test::TestContext};

    use super::*;

    fn new_user(name: &str, email: &str, role: Option<Role>) -> NewUser {
        NewUser {
            uuid: UserUuid::new(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn blank_name_falls_back_to_email_local_part() -> TestResult {
        let ctx = TestContext::seeded()?;

        let user = ctx
            .users
            .register_user(new_user("  ", "sam.driver@example.com", None))
            .await?;

        assert_eq!(user.name, "sam.driver");
        assert_eq!(user.role, Role::Renter);

        Ok(())
    }

    #[tokio::test]
    async fn requested_role_is_kept() -> TestResult {
        let ctx = TestContext::seeded()?;

        let user = ctx
            .users
            .register_user(new_user("Olga", "olga@example.com", Some(Role::Owner)))
            .await?;

        assert_eq!(user.role, Role::Owner);
        assert_eq!(ctx.users.get_user(ctx.owner, user.uuid).await?, user);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_invalid_state() -> TestResult {
        let ctx = TestContext::seeded()?;

        let result = ctx
            .users
            .register_user(new_user("Alice", "Alice@Renter.com", None))
            .await;

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::InvalidState)
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() -> TestResult {
        let ctx = TestContext::seeded()?;

        let result = ctx
            .users
            .register_user(new_user("Nobody", "not-an-email", None))
            .await;

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::Validation)
        );

        Ok(())
    }

    #[tokio::test]
    async fn only_admins_list_users() -> TestResult {
        let ctx = TestContext::seeded()?;

        assert_eq!(ctx.users.list_users(ctx.admin).await?.len(), 3);
        assert_eq!(
            ctx.users
                .list_users(ctx.renter)
                .await
                .err()
                .map(|error| error.kind()),
            Some(ErrorKind::Unauthorized)
        );

        Ok(())
    }

    #[tokio::test]
    async fn resolve_actor_uses_stored_role() -> TestResult {
        let ctx = TestContext::seeded()?;

        assert_eq!(
            ctx.users.resolve_actor(ctx.owner.uuid()).await?,
            ctx.owner
        );
        assert_eq!(ctx.users.resolve_actor(None).await?, Actor::Anonymous);
        assert_eq!(
            ctx.users.resolve_actor(Some(UserUuid::new())).await?,
            Actor::Anonymous
        );

        Ok(())
    }

    #[tokio::test]
    async fn resolve_actor_surfaces_backend_failures() {
        let mut storage = crate::storage::MockStorage::new();
        storage
            .expect_get_user()
            .returning(|_| Err(StorageError::Unavailable("connection reset".to_string())));

        let service = StorageUsersService::new(Arc::new(storage));

        let result = service.resolve_actor(Some(UserUuid::new())).await;

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::BackendUnavailable)
        );
    }
}
