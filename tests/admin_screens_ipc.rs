mod test_support;

use serde_json::json;
use test_support::{drain_messages, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn catalog_validation_runs_before_the_backend() {
    let previews = temp_dir("eduadmind-admin-catalog");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&previews);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "boards.create",
        json!({ "name": "   " }),
        "validation_failed",
    );
    assert_eq!(error["message"], json!("Board name is required"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "subjects.create",
        json!({ "standardId": "s1", "name": "Physics", "price": 0 }),
        "validation_failed",
    );
    assert_eq!(error["message"], json!("Valid price is required"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "name": "Asha", "email": "asha@example.test" }),
        "validation_failed",
    );
    assert_eq!(error["message"], json!("Password is required"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "purchases.updateStatus",
        json!({ "id": "p1", "status": "REFUNDED" }),
        "validation_failed",
    );
    assert_eq!(error["message"], json!("Unknown payment status: REFUNDED"));
}

#[test]
fn backend_failures_surface_generic_notices() {
    let previews = temp_dir("eduadmind-admin-failures");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&previews);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "boards.list",
        json!({}),
        "backend_failed",
    );
    assert_eq!(error["message"], json!("Failed to fetch boards"));
    assert!(error["details"]["reason"].as_str().is_some());

    request_err(
        &mut stdin,
        &mut reader,
        "2",
        "students.list",
        json!({}),
        "backend_failed",
    );
    request_err(
        &mut stdin,
        &mut reader,
        "3",
        "purchases.list",
        json!({}),
        "backend_failed",
    );

    let messages = drain_messages(&mut stdin, &mut reader, "4");
    assert_eq!(
        messages,
        vec![
            "Failed to fetch boards".to_string(),
            "Failed to fetch students".to_string(),
            "Failed to fetch purchases".to_string(),
        ]
    );
}

#[test]
fn dashboard_watch_stays_on_after_a_failed_first_fetch() {
    let previews = temp_dir("eduadmind-admin-dashboard");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&previews);

    let watched = request_ok(&mut stdin, &mut reader, "1", "dashboard.watch", json!({}));
    assert_eq!(watched["watching"], json!(true));
    assert_eq!(watched["overview"], serde_json::Value::Null);

    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["dashboardWatching"], json!(true));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "dashboard.overview",
        json!({}),
        "backend_failed",
    );
    assert_eq!(error["message"], json!("Failed to fetch dashboard data"));

    let unwatched = request_ok(&mut stdin, &mut reader, "4", "dashboard.unwatch", json!({}));
    assert_eq!(unwatched["watching"], json!(false));
}
