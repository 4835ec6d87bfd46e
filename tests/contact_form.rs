use httpmock::prelude::*;
use serde_json::json;

use dada_studio::content::actions::{
    self, ActionResult, CONTACT_INVALID, CONTACT_REJECTED, CONTACT_SERVER_ERROR,
};
use dada_studio::content::store::ContentStore;

fn store_for(server: &MockServer) -> ContentStore {
    ContentStore::new(&server.base_url(), &server.base_url(), "test-key")
}

fn valid_payload() -> serde_json::Value {
    json!({
        "name": "张三",
        "company": "Acme",
        "projectType": "Website",
        "email": "a@b.com",
        "message": "我们想做一个新官网",
    })
}

#[tokio::test]
async fn valid_submission_round_trips() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/contact_submissions")
                .header("apikey", "test-key")
                .matches(|req| {
                    // The database assigns created_at and status; the client
                    // must not send either.
                    let body = req.body.as_deref().unwrap_or_default();
                    let parsed: serde_json::Value =
                        serde_json::from_slice(body).unwrap_or(serde_json::Value::Null);
                    let row = parsed.as_object().expect("json object body");
                    row.get("name").and_then(|v| v.as_str()) == Some("张三")
                        && row.get("project_type").and_then(|v| v.as_str()) == Some("Website")
                        && !row.contains_key("created_at")
                        && !row.contains_key("status")
                });
            then.status(201);
        })
        .await;

    let result = actions::submit_contact(&store_for(&server), &valid_payload()).await;
    insert.assert_async().await;
    assert_eq!(result, ActionResult::ok());
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "success": true })
    );
}

#[tokio::test]
async fn company_is_optional() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path("/contact_submissions");
            then.status(201);
        })
        .await;

    let mut payload = valid_payload();
    payload.as_object_mut().unwrap().remove("company");
    let result = actions::submit_contact(&store_for(&server), &payload).await;
    insert.assert_async().await;
    assert!(result.success);
}

#[tokio::test]
async fn invalid_email_never_reaches_the_store() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path("/contact_submissions");
            then.status(201);
        })
        .await;

    let mut payload = valid_payload();
    payload["email"] = json!("not-an-email");
    let result = actions::submit_contact(&store_for(&server), &payload).await;

    assert_eq!(result, ActionResult::err(CONTACT_INVALID));
    insert.assert_hits_async(0).await;
}

#[tokio::test]
async fn short_name_and_message_fail_validation() {
    let server = MockServer::start_async().await;
    let store = store_for(&server);

    let mut payload = valid_payload();
    payload["name"] = json!("张");
    let result = actions::submit_contact(&store, &payload).await;
    assert_eq!(result.error.as_deref(), Some(CONTACT_INVALID));

    let mut payload = valid_payload();
    payload["message"] = json!("太短了");
    let result = actions::submit_contact(&store, &payload).await;
    assert_eq!(result.error.as_deref(), Some(CONTACT_INVALID));
}

#[tokio::test]
async fn database_rejection_maps_to_the_fixed_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/contact_submissions");
            then.status(400).body("row level security violation");
        })
        .await;

    let result = actions::submit_contact(&store_for(&server), &valid_payload()).await;
    assert_eq!(result, ActionResult::err(CONTACT_REJECTED));
}

#[tokio::test]
async fn transport_failure_maps_to_the_server_error_message() {
    // Nothing listens on this port.
    let store = ContentStore::new("http://127.0.0.1:9", "http://127.0.0.1:9", "test-key");
    let result = actions::submit_contact(&store, &valid_payload()).await;
    assert_eq!(result, ActionResult::err(CONTACT_SERVER_ERROR));
}
