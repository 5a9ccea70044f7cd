//! Management API client integration tests with mock server

use keboola_access::config::ManageConfig;
use keboola_access::error::ManageApiError;
use keboola_access::manage::{ManageClient, Project};
use keboola_access::util::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_HEADER: &str = "X-KBC-ManageApiToken";

fn create_test_client(mock_server: &MockServer) -> ManageClient {
    ManageClient::new(mock_server.uri(), &ManageConfig::default()).unwrap()
}

fn token() -> SecretString {
    SecretString::new("test-token")
}

#[tokio::test]
async fn test_verify_token_valid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/tokens/verify"))
        .and(header(TOKEN_HEADER, "test-token"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "description": "ops token",
            "owner": {"id": 5, "name": "Jane Operator"}
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.verify_token(&token()).await;

    assert!(result.valid);
    assert_eq!(result.owner_name.as_deref(), Some("Jane Operator"));
    assert_eq!(result.status_code, Some(200));
}

#[tokio::test]
async fn test_verify_token_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/tokens/verify"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid access token"})),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.verify_token(&token()).await;

    assert!(!result.valid);
    assert_eq!(result.owner_name, None);
    assert_eq!(result.status_code, Some(401));
    assert!(result.raw_body.contains("Invalid access token"));
}

#[tokio::test]
async fn test_verify_token_without_owner() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/tokens/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.verify_token(&token()).await;

    assert!(result.valid);
    assert_eq!(result.owner_display(), "Unknown");
}

#[tokio::test]
async fn test_list_projects_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/organizations/42/projects"))
        .and(header(TOKEN_HEADER, "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 101, "name": "Alpha", "region": "us-east-1"},
            {"id": "102", "name": "Beta"}
        ])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let projects = client.list_projects("42", &token()).await;

    assert_eq!(
        projects,
        vec![Project::new("101", "Alpha"), Project::new("102", "Beta")]
    );
}

#[tokio::test]
async fn test_list_projects_server_error_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/organizations/42/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert!(client.list_projects("42", &token()).await.is_empty());

    let err = client.try_list_projects("42", &token()).await.unwrap_err();
    assert!(matches!(err, ManageApiError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_list_projects_malformed_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/organizations/42/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.try_list_projects("42", &token()).await.unwrap_err();
    assert!(matches!(err, ManageApiError::InvalidResponse(_)));
    assert!(client.list_projects("42", &token()).await.is_empty());
    // Malformed responses are not cached
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_list_users_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/projects/101/users"))
        .and(header(TOKEN_HEADER, "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 7,
                "email": "a@x.com",
                "role": "Admin",
                "expires": null,
                "created": "2024-03-01T10:00:00+0100",
                "invitor": {"id": 1, "email": "boss@x.com"},
                "approver": null,
                "reason": null
            }
        ])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let users = client.list_users("101", &token()).await;

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, "7");
    assert_eq!(users[0].email, "a@x.com");
    assert_eq!(users[0].invitor.as_ref().unwrap()["email"], "boss@x.com");
}

#[tokio::test]
async fn test_list_users_keeps_record_with_null_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/projects/101/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "u1", "email": "a@x.com", "role": "Admin"},
            {"id": "u2", "email": null, "role": "Guest"}
        ])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let users = client.try_list_users("101", &token()).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].email, "a@x.com");
    assert_eq!(users[1].id, "u2");
    assert_eq!(users[1].email, "");
}

#[tokio::test]
async fn test_list_users_forbidden_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/projects/101/users"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert!(client.list_users("101", &token()).await.is_empty());
}

#[tokio::test]
async fn test_list_calls_are_cached_until_invalidated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/projects/101/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "email": "a@x.com", "role": "Guest"}
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    client.list_users("101", &token()).await;
    client.list_users("101", &token()).await;
    assert_eq!(client.cache().len(), 1);

    client.invalidate_cache();
    client.list_users("101", &token()).await;
    // expect(2) is verified when the mock server drops
}

#[tokio::test]
async fn test_cache_is_keyed_by_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/organizations/42/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    client.list_projects("42", &SecretString::new("one")).await;
    client.list_projects("42", &SecretString::new("two")).await;
    client.list_projects("42", &SecretString::new("one")).await;
}

#[tokio::test]
async fn test_delete_user_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/manage/projects/101/users/7"))
        .and(header(TOKEN_HEADER, "test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let outcome = client.delete_user_from_project("101", "7", &token()).await;

    assert!(outcome.ok);
    assert_eq!(outcome.status_code, Some(204));
}

#[tokio::test]
async fn test_delete_user_failure_keeps_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/manage/projects/101/users/7"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Cannot remove the last admin"),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let outcome = client.delete_user_from_project("101", "7", &token()).await;

    assert!(!outcome.ok);
    assert_eq!(outcome.status_code, Some(400));
    assert_eq!(outcome.body, "Cannot remove the last admin");
}
