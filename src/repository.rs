use crate::models::{Course, CreateCourseRequest, UpdateCourseRequest, User};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
///
/// Ownership contract: every course method takes the acting user's `owner_id`
/// and scopes the underlying query with it. A course belonging to another user
/// is therefore indistinguishable from a missing one at this layer.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Course Retrieval (Owner-Scoped) ---
    // Owner-scoped listing with optional subject filter and free-text search.
    async fn list_courses(
        &self,
        owner_id: Uuid,
        subject: Option<String>,
        search: Option<String>,
    ) -> Vec<Course>;
    // Owner-scoped single retrieval. None when absent OR foreign-owned.
    async fn get_course(&self, id: Uuid, owner_id: Uuid) -> Option<Course>;

    // --- Course Actions (Owner-Scoped) ---
    // Inserts a new course with owner_id stamped from the authenticated identity.
    // None signals an insert conflict (duplicate slug for this owner).
    async fn create_course(&self, req: CreateCourseRequest, owner_id: Uuid) -> Option<Course>;
    // Owner-Only: updates only if owner_id matches. Uses COALESCE for partial updates.
    async fn update_course(
        &self,
        id: Uuid,
        owner_id: Uuid,
        req: UpdateCourseRequest,
    ) -> Option<Course>;
    // Owner-Only: deletes only if owner_id matches the course's owner.
    async fn delete_course(&self, id: Uuid, owner_id: Uuid) -> bool;

    // --- User/Auth ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Permission codes granted to the user (e.g., "courses.view_course").
    async fn get_user_permissions(&self, user_id: Uuid) -> Vec<String>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Shared column list so every course query deserializes into the same shape.
const COURSE_COLUMNS: &str = "id, owner_id, subject, title, slug, overview, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// list_courses
    ///
    /// Implements flexible filtering using QueryBuilder for safe parameterization,
    /// adhering to the **"No SQL Injection Risk"** mandate.
    /// **Security**: The `owner_id = $1` predicate is part of the base query and
    /// cannot be bypassed by any filter combination, so the result set never
    /// contains another user's courses.
    async fn list_courses(
        &self,
        owner_id: Uuid,
        subject: Option<String>,
        search: Option<String>,
    ) -> Vec<Course> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE owner_id = "
        ));
        builder.push_bind(owner_id);

        if let Some(s) = subject {
            builder.push(" AND subject = ");
            builder.push_bind(s);
        }

        if let Some(s) = search {
            // Case-insensitive search across title and overview fields.
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR overview ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        let query = builder.build_query_as::<Course>();

        match query.fetch_all(&self.pool).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("list_courses error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_course
    ///
    /// Retrieves a course *only* if the provided `owner_id` matches the record's owner.
    /// Used by the detail handler; foreign-owned courses yield None (mapped to 404).
    async fn get_course(&self, id: Uuid, owner_id: Uuid) -> Option<Course> {
        let sql =
            format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_course error: {:?}", e);
                None
            })
    }

    /// create_course
    ///
    /// Inserts a new course. The `owner_id` column is bound from the authenticated
    /// identity, never from the request payload, so ownership cannot be forged.
    /// Returns None when the unique index on (owner_id, slug) rejects the insert.
    async fn create_course(&self, req: CreateCourseRequest, owner_id: Uuid) -> Option<Course> {
        let new_id = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO courses (id, owner_id, subject, title, slug, overview, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             ON CONFLICT (owner_id, slug) DO NOTHING \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(new_id)
            .bind(owner_id)
            .bind(req.subject)
            .bind(req.title)
            .bind(req.slug)
            .bind(req.overview)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("create_course error: {:?}", e);
                None
            })
    }

    /// update_course
    ///
    /// Updates a course only if the provided `owner_id` matches the owner.
    /// Uses the PostgreSQL `COALESCE` function to efficiently handle `Option<T>` fields,
    /// only updating a column if the corresponding field in `req` is `Some`.
    /// `owner_id` is deliberately absent from the SET clause: ownership is immutable.
    async fn update_course(
        &self,
        id: Uuid,
        owner_id: Uuid,
        req: UpdateCourseRequest,
    ) -> Option<Course> {
        let sql = format!(
            "UPDATE courses \
             SET subject = COALESCE($3, subject), \
                 title = COALESCE($4, title), \
                 slug = COALESCE($5, slug), \
                 overview = COALESCE($6, overview), \
                 updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(req.subject)
            .bind(req.title)
            .bind(req.slug)
            .bind(req.overview)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_course error: {:?}", e);
                None
            })
    }

    /// delete_course
    ///
    /// Deletes a course only if the provided `owner_id` matches the course owner.
    /// This is the **Owner-Only** authorization check.
    async fn delete_course(&self, id: Uuid, owner_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM courses WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_course error: {:?}", e);
                false
            }
        }
    }

    /// get_user
    ///
    /// Retrieves user profile data (ID, email, role) needed for authentication and authorization.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    /// get_user_permissions
    ///
    /// Retrieves the permission codes granted to a user. Loaded once per request
    /// by the AuthUser extractor.
    async fn get_user_permissions(&self, user_id: Uuid) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT code FROM user_permissions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_permissions error: {:?}", e);
            vec![]
        })
    }
}
