use crate::{
    AppState,
    auth::{
        AuthUser, PERM_ADD_COURSE, PERM_CHANGE_COURSE, PERM_DELETE_COURSE, PERM_VIEW_COURSE,
    },
    models::{self, Course, CreateCourseRequest, UpdateCourseRequest, UserProfile},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// CourseFilter
///
/// Defines the accepted query parameters for the course listing endpoint
/// (GET /manage/courses). Used by Axum's Query extractor to safely bind HTTP
/// query parameters for filtering and search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct CourseFilter {
    /// Optional filter for courses in a specific subject.
    pub subject: Option<String>,
    /// Optional full-text search string for title/overview matching.
    pub search: Option<String>,
}

// --- Handlers ---

/// list_courses
///
/// [Authenticated Route] Lists all courses owned by the requesting user.
///
/// *Authorization*: Requires the `courses.view_course` permission code.
/// *Security*: The repository applies the `owner_id` filter **unconditionally**,
/// so the result set never contains another user's courses.
#[utoipa::path(
    get,
    path = "/manage/courses",
    params(CourseFilter),
    responses(
        (status = 200, description = "My Courses", body = [Course]),
        (status = 403, description = "Missing courses.view_course")
    )
)]
pub async fn list_courses(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Vec<models::Course>>, StatusCode> {
    if !auth.has_perm(PERM_VIEW_COURSE) {
        return Err(StatusCode::FORBIDDEN);
    }
    let courses = state
        .repo
        .list_courses(auth.id, filter.subject, filter.search)
        .await;
    Ok(Json(courses))
}

/// create_course
///
/// [Authenticated Route] Handles the submission of a new course.
///
/// *Authorization*: Requires the `courses.add_course` permission code.
/// *Ownership*: The `owner_id` is taken from the authenticated identity, never
/// from the payload, so submitted form data cannot influence ownership.
#[utoipa::path(
    post,
    path = "/manage/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 403, description = "Missing courses.add_course"),
        (status = 409, description = "Duplicate slug for this owner")
    )
)]
pub async fn create_course(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<models::CreateCourseRequest>,
) -> Result<(StatusCode, Json<models::Course>), StatusCode> {
    if !auth.has_perm(PERM_ADD_COURSE) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.create_course(payload, auth.id).await {
        Some(course) => Ok((StatusCode::CREATED, Json(course))),
        // The insert only fails silently on the (owner_id, slug) unique index.
        None => Err(StatusCode::CONFLICT),
    }
}

/// get_course_details
///
/// [Authenticated Route] Retrieves a single course's details by ID.
///
/// *Authorization*: Requires `courses.view_course`. The ownership filter is part
/// of the repository query: a course owned by another user yields 404, exactly
/// as if it did not exist.
#[utoipa::path(
    get,
    path = "/manage/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn get_course_details(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Course>, StatusCode> {
    if !auth.has_perm(PERM_VIEW_COURSE) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.get_course(id, auth.id).await {
        Some(course) => Ok(Json(course)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// update_course
///
/// [Authenticated Route] Allows a user to modify their own course.
///
/// *Authorization*: Requires `courses.change_course`, then enforces the
/// **Owner-Only** check in the repository layer. Ownership itself is immutable.
#[utoipa::path(
    put,
    path = "/manage/courses/{id}",
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 403, description = "Missing courses.change_course"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn update_course(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<models::Course>, StatusCode> {
    if !auth.has_perm(PERM_CHANGE_COURSE) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.update_course(id, auth.id, payload).await {
        Some(course) => Ok(Json(course)),
        // Returns 404 if the course is not found OR if the authenticated user is not the owner.
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_course
///
/// [Authenticated Route] Allows a user to delete their own course.
///
/// *Authorization*: Requires `courses.delete_course`. The repository enforces an
/// **Owner-Only** check; if the user is not the owner the query affects 0 rows.
#[utoipa::path(
    delete,
    path = "/manage/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Missing courses.delete_course"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_course(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if !auth.has_perm(PERM_DELETE_COURSE) {
        return StatusCode::FORBIDDEN;
    }
    // If the repository returns false, it means either the course didn't exist,
    // or the user wasn't the owner, hence 404 is a safe default response.
    if state.repo.delete_course(id, auth.id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile information,
/// including the resolved permission codes so a frontend can hide actions the
/// user cannot perform.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(auth: AuthUser, State(state): State<AppState>) -> Json<UserProfile> {
    let email = state
        .repo
        .get_user(auth.id)
        .await
        .map(|u| u.email)
        .unwrap_or_default();

    let mut permissions: Vec<String> = auth.permissions.into_iter().collect();
    permissions.sort();

    Json(UserProfile {
        id: auth.id,
        email,
        role: auth.role,
        permissions,
    })
}
