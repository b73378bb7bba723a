use course_manager::models::{Course, CreateCourseRequest, UpdateCourseRequest};

// --- Tests ---

#[test]
fn test_create_course_request_has_no_owner_field() {
    // The create payload must not be able to carry ownership: the owner is
    // stamped from the authenticated identity, never from form data.
    let req = CreateCourseRequest {
        subject: "programming".to_string(),
        title: "Rust 101".to_string(),
        slug: "rust-101".to_string(),
        overview: "Intro".to_string(),
    };

    let value = serde_json::to_value(&req).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 4);
    for key in ["subject", "title", "slug", "overview"] {
        assert!(object.contains_key(key), "missing field {key}");
    }
    assert!(!object.contains_key("owner_id"));
}

#[test]
fn test_create_course_request_ignores_submitted_owner() {
    // A client smuggling an owner_id into the JSON body must not break
    // deserialization; the field is simply discarded.
    let json = r#"{
        "subject": "programming",
        "title": "Rust 101",
        "slug": "rust-101",
        "overview": "Intro",
        "owner_id": "00000000-0000-0000-0000-000000000001"
    }"#;

    let req: CreateCourseRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.slug, "rust-101");
}

#[test]
fn test_update_course_request_optionality() {
    // This confirms the structure supports partial updates (all fields are Option<T>)
    let partial_update = UpdateCourseRequest {
        title: Some("New Title Only".to_string()),
        subject: None,
        slug: None,
        overview: None,
    };

    // The key validation is that None fields are omitted from the payload.
    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    assert!(!json_output.contains("subject"));
    assert!(!json_output.contains("overview"));
}

#[test]
fn test_course_json_shape() {
    let json_output = serde_json::to_string(&Course::default()).unwrap();

    // Field names ride through serde untouched; the frontend and the DB rows
    // agree on `owner_id`.
    assert!(json_output.contains(r#""owner_id""#));
    assert!(json_output.contains(r#""slug""#));
    assert!(json_output.contains(r#""created_at""#));
}
