use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use course_manager::{
    AppState,
    auth::{AuthUser, Claims, PERM_VIEW_COURSE},
    config::Env,
    models::{Course, CreateCourseRequest, UpdateCourseRequest, User},
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{collections::HashSet, sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
    permissions_to_return: Vec<String>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> Option<User> {
        self.user_to_return.clone()
    }
    async fn get_user_permissions(&self, _user_id: Uuid) -> Vec<String> {
        self.permissions_to_return.clone()
    }
    // Placeholders for trait methods the extractor never touches.
    async fn list_courses(
        &self,
        _owner_id: Uuid,
        _subject: Option<String>,
        _search: Option<String>,
    ) -> Vec<Course> {
        vec![]
    }
    async fn get_course(&self, _id: Uuid, _owner_id: Uuid) -> Option<Course> {
        None
    }
    async fn create_course(&self, _req: CreateCourseRequest, _owner_id: Uuid) -> Option<Course> {
        None
    }
    async fn update_course(
        &self,
        _id: Uuid,
        _owner_id: Uuid,
        _req: UpdateCourseRequest,
    ) -> Option<Course> {
        None
    }
    async fn delete_course(&self, _id: Uuid, _owner_id: Uuid) -> bool {
        false
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token(user_id: Uuid, exp_offset: u64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize, // Token expires in exp_offset seconds
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env, repo: MockAuthRepo, jwt_secret: String) -> AppState {
    // Start with a safe default config, then pin the environment and secret so
    // the extractor validates against the test constant.
    let mut config = course_manager::config::AppConfig::default();
    config.env = env;
    config.jwt_secret = jwt_secret;

    AppState {
        repo: Arc::new(repo),
        config,
    }
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(User {
            id: TEST_USER_ID,
            email: "test@example.com".to_string(),
            role: "staff".to_string(),
        }),
        permissions_to_return: vec![PERM_VIEW_COURSE.to_string()],
    };

    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, "staff");
    // Permission codes are resolved during extraction.
    assert!(user.has_perm(PERM_VIEW_COURSE));
    assert!(!user.has_perm("courses.delete_course"));
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_malformed_token() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Bearer not-a-jwt"),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_when_user_deleted_after_issue() {
    // Valid token, but the user no longer exists in the database.
    let token = create_token(TEST_USER_ID, 3600);
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(), // user_to_return: None
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let mock_repo = MockAuthRepo {
        user_to_return: Some(User {
            id: mock_user_id,
            email: "local@dev.com".to_string(),
            role: "staff".to_string(),
        }),
        permissions_to_return: vec![PERM_VIEW_COURSE.to_string()],
    };
    let app_state = create_app_state(Env::Local, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, mock_user_id);
    assert!(user.has_perm(PERM_VIEW_COURSE));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mock_user_id = Uuid::new_v4();
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Provide ONLY the local bypass header
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_role_implies_all_permissions() {
    // has_perm never consults user_permissions for admins (superuser semantics).
    let admin = AuthUser {
        id: TEST_USER_ID,
        role: "admin".to_string(),
        permissions: HashSet::new(),
    };

    assert!(admin.has_perm("courses.view_course"));
    assert!(admin.has_perm("courses.add_course"));
    assert!(admin.has_perm("courses.change_course"));
    assert!(admin.has_perm("courses.delete_course"));
}
