use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use tracker_api::{AppStateInner, router};
use tracker_db::Database;
use tracker_types::DataSource;
use tracker_types::api::TimelineDraft;

fn app_with(drafts: &[(&str, &str, &str)]) -> Router {
    let db = Database::open_in_memory().unwrap();
    let drafts: Vec<TimelineDraft> = drafts
        .iter()
        .map(|(username, stream, ita)| {
            let mut d = TimelineDraft {
                username: username.to_string(),
                ..Default::default()
            };
            d.details.stream = Some(stream.to_string());
            d.dates.ita_date = Some(ita.to_string());
            d
        })
        .collect();
    db.seed_timelines(&drafts).unwrap();
    router(AppStateInner::new(db))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

fn sample() -> Router {
    app_with(&[
        ("alice", "CEC", "2024-01-10"),
        ("bob", "FSW", "2024-03-01"),
        ("carol", "CEC", "2023-11-20"),
    ])
}

#[tokio::test]
async fn health_and_listing() {
    let app = sample();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&app, "/timelines").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["carol", "bob", "alice"]);
}

#[tokio::test]
async fn view_filters_sorts_and_clamps() {
    let app = sample();

    let (status, body) = get(&app, "/timelines/view?stream=CEC&sort=ita_date&dir=desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["per_page"], 50);
    assert_eq!(body["items"][0]["username"], "alice");
    assert_eq!(body["items"][1]["username"], "carol");

    let (_, body) = get(&app, "/timelines/view?page=9").await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["items"][0]["username"], "carol");

    let (_, body) = get(&app, "/timelines/view?search=BO").await;
    assert_eq!(body["total"], 1);

    let (_, body) = get(&app, "/timelines/view?stream=PNP").await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn facets_list_distinct_values() {
    let app = sample();
    let (status, body) = get(&app, "/timelines/facets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["streams"], json!(["CEC", "FSW"]));
    assert_eq!(body["visa_offices"], json!([]));
}

#[tokio::test]
async fn missing_timeline_is_404() {
    let app = sample();
    let (status, body) = get(&app, "/timelines/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Timeline not found");
}

#[tokio::test]
async fn claim_then_edit() {
    let app = sample();
    let (_, all) = get(&app, "/timelines").await;
    let alice = all.as_array().unwrap().iter().find(|t| t["username"] == "alice").unwrap();
    let bob = all.as_array().unwrap().iter().find(|t| t["username"] == "bob").unwrap();
    let alice_id = alice["id"].as_i64().unwrap();
    let bob_id = bob["id"].as_i64().unwrap();

    let uri = format!("/timelines/{alice_id}/claim");
    let (status, body) = post(&app, &uri, json!({ "email": "a@x.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeline_id"], alice_id);
    assert_eq!(body["username"], "alice");

    // second claim loses
    let (status, body) = post(&app, &uri, json!({ "email": "b@x.com" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This timeline has already been claimed");

    // the email is now tied to alice
    let (status, body) = post(&app, &format!("/timelines/{bob_id}/claim"), json!({ "email": "a@x.com" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This email is already in use by another timeline.");

    let (status, _) = post(&app, &format!("/timelines/{bob_id}/claim"), json!({ "email": "bob" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let patch = json!({ "email": "a@x.com", "updates": { "aor_date": "2024-02-02", "stream": "" } });
    let (status, body) = send(&app, Method::PATCH, &format!("/timelines/{alice_id}"), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Timeline updated successfully");

    let (_, stored) = get(&app, &format!("/timelines/{alice_id}")).await;
    assert_eq!(stored["aor_date"], "2024-02-02");
    assert_eq!(stored["ita_date"], "2024-01-10");
    assert_eq!(stored["stream"], Value::Null);
    assert!(stored["last_updated_by_user"].is_string());

    let intruder = json!({ "email": "b@x.com", "updates": { "notes": "mine now" } });
    let (status, _) = send(&app, Method::PATCH, &format!("/timelines/{alice_id}"), Some(intruder)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_timeline() {
    let app = sample();

    let (status, body) = post(
        &app,
        "/timelines",
        json!({ "username": "dave", "email": "d@x.com", "stream": "PNP", "ita_date": "2024-05-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["timeline"]["username"], "dave");
    assert_eq!(body["timeline"]["email_verified"], true);
    assert_eq!(body["timeline"]["data_source"], DataSource::UserSubmission.as_str());

    let (status, _) = post(&app, "/timelines", json!({ "username": "eve", "email": "d@x.com" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post(&app, "/timelines", json!({ "username": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username is required");

    let (status, body) = post(&app, "/timelines", json!({ "username": "frank" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["timeline"]["email_verified"], false);
}

#[tokio::test]
async fn comment_threads() {
    let app = sample();
    let (_, created) = post(&app, "/timelines", json!({ "username": "owner", "email": "o@x.com" })).await;
    let id = created["timeline"]["id"].as_i64().unwrap();
    let uri = format!("/timelines/{id}/comments");

    let (status, top) = post(&app, &uri, json!({ "email": "v@x.com", "comment_text": "  congrats! " })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(top["comment_text"], "congrats!");
    assert_eq!(top["commenter_username"], "v");
    assert_eq!(top["is_timeline_owner"], false);
    let top_id = top["id"].as_i64().unwrap();

    let (status, reply) = post(
        &app,
        &uri,
        json!({ "email": "o@x.com", "comment_text": "thanks", "parent_comment_id": top_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["commenter_username"], "owner");
    assert_eq!(reply["is_timeline_owner"], true);
    let reply_id = reply["id"].as_i64().unwrap();

    // replies to replies are refused
    let (status, _) = post(
        &app,
        &uri,
        json!({ "email": "v@x.com", "comment_text": "deeper", "parent_comment_id": reply_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(&app, &uri, json!({ "email": "v@x.com", "comment_text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Comment cannot be empty");

    let (status, body) = post(&app, &uri, json!({ "email": "v@x.com", "comment_text": "x".repeat(2001) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Comment must be less than 2000 characters");

    let (status, threads) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["id"], top_id);
    assert_eq!(threads[0]["replies"][0]["id"], reply_id);

    let (status, history) = get(&app, "/comments?email=v@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["id"], top_id);
    assert_eq!(history[0]["reply_count"], 1);
    assert_eq!(history[0]["timeline"]["username"], "owner");
    assert_eq!(history[0]["replies"][0]["commenter_username"], "owner");

    let (status, _) = get(&app, "/timelines/999/comments").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
