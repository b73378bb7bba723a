use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Management Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer. This module implements the course management surface:
/// listing, creating, updating, and deleting the requesting user's own courses.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware being
/// present on the router layer above this module. This guarantees that all handlers
/// receive a validated `AuthUser` struct containing the user's ID, role, and
/// permission codes, which is then used for the per-operation permission check and
/// for all Owner-Only queries (the `owner_id` predicate in the repository).
pub fn manage_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated user's profile and permission codes.
        .route("/me", get(handlers::get_me))
        // GET /manage/courses?subject=...&search=...
        // Lists the courses owned by the authenticated user, newest first.
        // The owner_id filter is applied unconditionally in the repository query.
        // POST /manage/courses
        // Submits a new course. Ownership is stamped from the authenticated identity.
        .route(
            "/manage/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        // GET/PUT/DELETE /manage/courses/{id}
        // Retrieves, modifies, or removes one of the user's own courses.
        // **Strict ownership check** is enforced within the repository query, so a
        // foreign-owned course behaves exactly like a missing one (404).
        .route(
            "/manage/courses/{id}",
            get(handlers::get_course_details)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
}
