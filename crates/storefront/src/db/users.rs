//! User repository for database operations.

use sqlx::{PgPool, Postgres, QueryBuilder};

use greengrocer_core::{Email, UserId};

use super::{Page, RepositoryError, SortDirection, clamp_page_size, page_offset};
use crate::models::User;

/// Columns selected into [`User`]. The stored password is never part of the
/// domain type; only [`UserRepository::authenticate`] touches it.
const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, is_employee, is_admin, created_at, updated_at";

/// Fields for a new registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: String,
    pub phone: Option<String>,
}

/// Profile fields a user may change about themselves.
///
/// `password: None` keeps the stored password.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Sort keys accepted for user listings. Unknown keys fall back to
/// `FirstName` rather than reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortKey {
    #[default]
    FirstName,
    LastName,
    Email,
    CreatedAt,
}

impl UserSortKey {
    /// Parse a caller-supplied sort key, falling back to the default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "last_name" | "lastName" => Self::LastName,
            "email" => Self::Email,
            "created_at" | "createdAt" => Self::CreatedAt,
            _ => Self::FirstName,
        }
    }

    const fn as_sql(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their email address (exact, case-sensitive match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Match a user by (email, password) equality.
    ///
    /// The stored credential is compared as-is; see DESIGN.md for why this
    /// known gap is preserved rather than silently replaced with hashing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn authenticate(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND password = $2"
        ))
        .bind(email)
        .bind(password)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user with default (customer) role flags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, password, phone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.phone)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(user)
    }

    /// Update a user's own profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET first_name = $2, last_name = $3, phone = $4, \
                 password = COALESCE($5, password), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(&update.password)
        .fetch_optional(self.pool)
        .await?;

        user.ok_or(RepositoryError::NotFound)
    }

    /// List users, optionally filtered by a free-text term matched against
    /// name, email, and phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u32,
        size: u32,
        sort: UserSortKey,
        direction: SortDirection,
    ) -> Result<Page<User>, RepositoryError> {
        let size = clamp_page_size(size);
        let pattern = search.map(|term| format!("%{term}%"));

        let mut count_query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users");
        if let Some(ref pattern) = pattern {
            push_user_search(&mut count_query, pattern);
        }
        let total_items: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        if let Some(ref pattern) = pattern {
            push_user_search(&mut query, pattern);
        }
        query
            .push(" ORDER BY ")
            .push(sort.as_sql())
            .push(" ")
            .push(direction.as_sql())
            .push(" LIMIT ")
            .push_bind(i64::from(size))
            .push(" OFFSET ")
            .push_bind(page_offset(page, size));

        let users = query.build_query_as().fetch_all(self.pool).await?;

        Ok(Page::new(users, page, size, total_items))
    }

    /// Delete a user. Destructive: their cart and orders cascade away.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the employee flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_employee(&self, id: UserId, is_employee: bool) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_employee = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_employee)
        .fetch_optional(self.pool)
        .await?;

        user.ok_or(RepositoryError::NotFound)
    }

    /// Set or clear the admin flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_admin = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(self.pool)
        .await?;

        user.ok_or(RepositoryError::NotFound)
    }

    /// Total registered users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

fn push_user_search<'q>(query: &mut QueryBuilder<'q, Postgres>, pattern: &'q str) {
    query
        .push(" WHERE (first_name ILIKE ")
        .push_bind(pattern)
        .push(" OR last_name ILIKE ")
        .push_bind(pattern)
        .push(" OR email ILIKE ")
        .push_bind(pattern)
        .push(" OR phone ILIKE ")
        .push_bind(pattern)
        .push(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parse_whitelist() {
        assert_eq!(UserSortKey::parse("email"), UserSortKey::Email);
        assert_eq!(UserSortKey::parse("lastName"), UserSortKey::LastName);
        assert_eq!(UserSortKey::parse("created_at"), UserSortKey::CreatedAt);
        // Unknown keys fall back instead of reaching the database.
        assert_eq!(
            UserSortKey::parse("password; DROP TABLE users"),
            UserSortKey::FirstName
        );
    }
}
