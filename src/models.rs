use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents the user's canonical identity record stored in the `public.profiles` table.
/// This structure includes the minimal required data resolved during authentication.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, referenced by courses.owner_id and user_permissions.user_id.
    pub id: Uuid,
    // The user's primary identifier.
    pub email: String,
    // The RBAC field: 'staff' or 'admin'. Admins implicitly hold every permission code.
    pub role: String,
}

/// Course
///
/// Represents a course record from the `public.courses` table.
/// This is the primary data structure for the course management logic.
///
/// Every course is owned by exactly one user (`owner_id`), and the management
/// endpoints never return or mutate a course owned by anyone other than the
/// requesting user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    // FK to public.profiles.id (Owner). Stamped at creation, never changed by updates.
    pub owner_id: Uuid,
    pub subject: String,
    pub title: String,
    // URL-friendly identifier, unique per owner (enforced by a DB unique index).
    pub slug: String,
    pub overview: String,

    // Timestamp handling for database integration and JSON serialization.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// CreateCourseRequest
///
/// Input payload for submitting a new course (POST /manage/courses).
///
/// Deliberately carries **no owner field**: ownership is always stamped from the
/// authenticated identity in the repository insert, so no payload can create a
/// course on behalf of another user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub subject: String,
    pub title: String,
    pub slug: String,
    pub overview: String,
}

/// UpdateCourseRequest
///
/// Partial update payload for modifying an existing course (PUT /manage/courses/{id}).
///
/// *Optimization*: Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// to efficiently handle partial updates, ensuring only provided fields are included in the JSON payload.
/// There is intentionally no `owner_id` field: ownership never changes through this endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

/// --- Profile Schemas (Output) ---

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /me).
/// Provides a slightly richer set of data than the internal `User` struct,
/// including the resolved permission codes so a frontend can hide actions
/// the user is not allowed to perform.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    // Permission codes resolved from user_permissions at authentication time.
    pub permissions: Vec<String>,
}
