use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use finder_core::persist::{save_snapshot, IndexPaths};
use finder_core::{BuildConfig, FacultyRecord, IndexBuilder};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_app, ServerConfig};
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn build_tiny_index(dir: &Path) {
    let records = vec![
        FacultyRecord {
            faculty_id: "f0".into(),
            name: "Asha Rao".into(),
            mail: "asha@uni.edu".into(),
            research: "machine learning nlp".into(),
            ..Default::default()
        },
        FacultyRecord {
            faculty_id: "f1".into(),
            name: "Bo Chen".into(),
            research: "databases distributed systems".into(),
            ..Default::default()
        },
        FacultyRecord {
            faculty_id: "f2".into(),
            name: "Chidi Obi".into(),
            specialization: "nlp".into(),
            research: "nlp deep learning".into(),
            ..Default::default()
        },
    ];
    let index = IndexBuilder::new(BuildConfig::default()).build(records);
    save_snapshot(&IndexPaths::new(dir), &index).unwrap();
}

fn app_for(dir: &Path) -> Router {
    build_app(ServerConfig { index_dir: dir.to_path_buf(), default_k: 5, admin_token: Some(TOKEN.into()) }).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn recommend_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = app_for(dir.path());

    let (status, json) = get(app, "/recommend?query=nlp%20top%202").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "nlp");
    assert_eq!(json["top_k"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    let ids: Vec<&str> = arr.iter().map(|r| r["faculty_id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"f0") && ids.contains(&"f2"));
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn top_k_parameter_is_the_default_count() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = app_for(dir.path());

    let (status, json) = get(app, "/recommend?query=learning&top_k=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_query_is_bad_request() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let (status, _) = get(app_for(dir.path()), "/recommend?query=top%203").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unmatched_query_is_empty_success() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let (status, json) = get(app_for(dir.path()), "/recommend?query=quantum").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_index_is_unavailable() {
    let dir = tempdir().unwrap();
    let (status, _) = get(app_for(dir.path()), "/recommend?query=nlp").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn faculty_lookup_by_position() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = app_for(dir.path());
    let (status, json) = get(app.clone(), "/faculty/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Bo Chen");
    let (status, _) = get(app, "/faculty/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rebuild_requires_token_and_swaps_index() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());
    let body = json!({ "results": [
        { "faculty_id": "x", "name": "X", "research": "quantum computing" },
        { "faculty_id": "y", "name": "Y", "research": "compilers", "bio": null }
    ]})
    .to_string();

    let unauth = Request::post("/index/rebuild")
        .header("content-type", "application/json")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = send(app.clone(), unauth).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::post("/index/rebuild")
        .header("content-type", "application/json")
        .header("X-ADMIN-TOKEN", TOKEN)
        .body(Body::from(body))
        .unwrap();
    let (status, json) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 2);
    assert!(IndexPaths::new(dir.path()).snapshot().exists());

    let (status, json) = get(app, "/recommend?query=quantum").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["faculty_id"], "x");
}

#[tokio::test]
async fn reload_picks_up_new_snapshot() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());
    let (status, _) = get(app.clone(), "/index/status").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    build_tiny_index(dir.path());
    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", TOKEN).body(Body::empty()).unwrap();
    let (status, json) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);

    let (status, _) = get(app, "/recommend?query=databases").await;
    assert_eq!(status, StatusCode::OK);
}

fn rebuild_request(docs: &[&str]) -> Request<Body> {
    let results: Vec<Value> = docs
        .iter()
        .enumerate()
        .map(|(i, d)| json!({ "faculty_id": format!("r{i}"), "name": format!("R{i}"), "research": d }))
        .collect();
    Request::post("/index/rebuild")
        .header("content-type", "application/json")
        .header("X-ADMIN-TOKEN", TOKEN)
        .body(Body::from(json!({ "results": results }).to_string()))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rebuilds_leave_served_and_saved_index_in_step() {
    let dir = tempdir().unwrap();
    let app = app_for(dir.path());

    let (a, b) = tokio::join!(
        send(app.clone(), rebuild_request(&["quantum computing", "compilers"])),
        send(app.clone(), rebuild_request(&["robotics", "vision", "graphs"])),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let (status, json) = get(app, "/index/status").await;
    assert_eq!(status, StatusCode::OK);
    let on_disk = finder_core::persist::load_snapshot(&IndexPaths::new(dir.path())).unwrap();
    assert_eq!(json["num_docs"], on_disk.num_docs());
    assert_eq!(json["created_at"], on_disk.created_at());
}
