//! User service: authentication, registration, profiles, and the admin
//! customer-management operations.

use sqlx::PgPool;

use greengrocer_core::{Email, UserId};

use super::{ServiceError, ServiceResult};
use crate::db::users::{NewUser, ProfileUpdate, UserSortKey};
use crate::db::{Page, RepositoryError, SortDirection, UserRepository};
use crate::models::User;

/// Registration form fields before validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// User and account operations.
pub struct UserService<'a> {
    pool: &'a PgPool,
}

impl<'a> UserService<'a> {
    /// Create a new user service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Authenticate by (email, password) equality.
    ///
    /// A malformed email gets the same answer as a wrong password so the
    /// response doesn't leak which part failed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` with a generic message on any mismatch.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        let invalid =
            || ServiceError::InvalidArgument("invalid email or password".to_owned());

        let email = Email::parse(email).map_err(|_| invalid())?;

        UserRepository::new(self.pool)
            .authenticate(&email, password)
            .await?
            .ok_or_else(invalid)
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a malformed email or blank required fields
    /// - `Conflict` if the email is already registered (case-sensitive match)
    pub async fn register(&self, registration: &Registration) -> ServiceResult<User> {
        let email = Email::parse(&registration.email)
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;

        let first_name = registration.first_name.trim();
        let last_name = registration.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "first and last name are required".to_owned(),
            ));
        }
        if registration.password.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "password is required".to_owned(),
            ));
        }

        let repo = UserRepository::new(self.pool);

        if repo.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("email already exists".to_owned()));
        }

        let new_user = NewUser {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email,
            password: registration.password.clone(),
            phone: registration.phone.clone(),
        };

        // The unique index still backstops a concurrent registration.
        let user = repo.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                ServiceError::Conflict("email already exists".to_owned())
            }
            other => ServiceError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn user(&self, id: UserId) -> ServiceResult<User> {
        UserRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    /// Update the caller's own profile.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for blank names
    /// - `NotFound` if the user does not exist
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> ServiceResult<User> {
        if update.first_name.trim().is_empty() || update.last_name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "first and last name are required".to_owned(),
            ));
        }

        UserRepository::new(self.pool)
            .update_profile(id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("user"),
                other => ServiceError::Repository(other),
            })
    }

    /// Paged customer listing for the admin surface, with optional
    /// free-text search across name, email, and phone.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if a query fails.
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        page: u32,
        size: u32,
        sort: UserSortKey,
        direction: SortDirection,
    ) -> ServiceResult<Page<User>> {
        Ok(UserRepository::new(self.pool)
            .list(search, page, size, sort, direction)
            .await?)
    }

    /// Permanently delete a customer (destructive: cart and orders cascade).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn delete_customer(&self, id: UserId) -> ServiceResult<()> {
        if !UserRepository::new(self.pool).delete(id).await? {
            return Err(ServiceError::NotFound("user"));
        }
        tracing::warn!(user_id = %id, "customer deleted");
        Ok(())
    }

    /// Set or clear the employee flag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn set_employee(&self, id: UserId, is_employee: bool) -> ServiceResult<User> {
        UserRepository::new(self.pool)
            .set_employee(id, is_employee)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("user"),
                other => ServiceError::Repository(other),
            })
    }

    /// Set or clear the admin flag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> ServiceResult<User> {
        UserRepository::new(self.pool)
            .set_admin(id, is_admin)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("user"),
                other => ServiceError::Repository(other),
            })
    }

    /// Total registered users (admin dashboard).
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(UserRepository::new(self.pool).count().await?)
    }
}
