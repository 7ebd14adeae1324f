//! HTTP contract tests for the service client against a mock server

use mentorlink_api::{
    ApiClientConfig, GoogleLoginRequest, HttpServiceClient, ImageUpload, LoginRequest,
    ProfileUpdate, RegisterRequest, ServiceApi,
};
use mentorlink_core::{AccountStatus, MentorlinkError, SignupRole};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> HttpServiceClient {
    HttpServiceClient::new(ApiClientConfig::new(format!("{}/api", server.uri()))).unwrap()
}

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(json!({"email": "a@x.com", "password": "p"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t1", "name": "A", "_id": "1", "role": "mentor"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .login(&LoginRequest {
            email: "a@x.com".to_string(),
            password: "p".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.token, "t1");
    assert_eq!(response.id, "1");
    assert_eq!(response.role, "mentor");
}

#[tokio::test]
async fn test_login_failure_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Your account is currently inactive, contact support"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let error = client
        .login(&LoginRequest {
            email: "a@x.com".to_string(),
            password: "p".to_string(),
        })
        .await
        .unwrap_err();

    match error {
        MentorlinkError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Your account is currently inactive, contact support");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_without_json_body_uses_reason_phrase() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let error = client.get_profile("t1").await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.user_message(), "Internal Server Error");
    assert!(error.is_recoverable());
}

#[tokio::test]
async fn test_register_sends_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/register"))
        .and(body_json(json!({"email": "s@x.com", "password": "pw", "role": "student"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "t2", "name": "S", "_id": "2", "role": "student"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .register(&RegisterRequest {
            email: "s@x.com".to_string(),
            password: "pw".to_string(),
            role: SignupRole::Student,
        })
        .await
        .unwrap();
    assert_eq!(response.name, "S");
}

#[tokio::test]
async fn test_google_login_forwards_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/google-login"))
        .and(body_json(json!({"token": "provider-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t3", "name": "G", "_id": "3", "role": "superadmin"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .google_login(&GoogleLoginRequest {
            token: "provider-token".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.role, "superadmin");
}

#[tokio::test]
async fn test_profile_requests_are_bearer_authorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "1", "name": "A", "email": "a@x.com", "profileImage": "https://cdn/x.png"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer t1"))
        .and(body_json(json!({"name": "B", "profileImage": "https://cdn/y.png"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "1", "name": "B", "email": "a@x.com", "profileImage": "https://cdn/y.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let profile = client.get_profile("t1").await.unwrap();
    assert_eq!(profile.profile_image.as_deref(), Some("https://cdn/x.png"));

    let updated = client
        .update_profile(
            "t1",
            &ProfileUpdate {
                name: "B".to_string(),
                profile_image: Some("https://cdn/y.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "B");
}

#[tokio::test]
async fn test_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/upload"))
        .and(header_exists("content-type"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"imageUrl": "https://cdn/z.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .upload_image("t1", &ImageUpload::from_bytes("z.png", vec![1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(response.image_url, "https://cdn/z.png");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_poster_empty_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/announcements/poster"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "No active poster"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.fetch_poster("t1").await.unwrap(), None);
}

#[tokio::test]
async fn test_poster_with_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/announcements/poster"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "announcement": {
                "_id": "a1",
                "title": "Mentor week",
                "message": "Join us",
                "buttonText": "Register",
                "buttonUrl": "https://example.com/week",
                "posterUntil": "2099-01-01T00:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let poster = client.fetch_poster("t1").await.unwrap().unwrap();
    assert_eq!(poster.id, "a1");
    assert_eq!(poster.button_text.as_deref(), Some("Register"));
    assert!(poster.poster_until.is_some());
}

#[tokio::test]
async fn test_poster_unauthorized_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/announcements/poster"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let error = client.fetch_poster("stale").await.unwrap_err();
    assert!(error.is_authorization_failure());
}

#[tokio::test]
async fn test_user_management_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "1", "name": "A", "email": "a@x.com", "role": "mentor", "status": "active"},
            {"_id": "2", "name": "B", "email": "b@x.com", "role": "student", "status": "banned"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/users/2/status"))
        .and(body_json(json!({"status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Updated"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let users = client.list_users("t1").await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].status, Some(AccountStatus::Banned));

    let ack = client
        .update_user_status("t1", "2", AccountStatus::Active)
        .await
        .unwrap();
    assert_eq!(ack.message.as_deref(), Some("Updated"));

    let ack = client.delete_user("t1", "2").await.unwrap();
    assert_eq!(ack.message, None);
}

#[tokio::test]
async fn test_non_json_acknowledgement_is_still_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User deleted"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let ack = client.delete_user("t1", "3").await.unwrap();
    assert_eq!(ack.message, None);
}

#[tokio::test]
async fn test_wrapped_user_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"_id": "9", "name": "Z", "email": "z@x.com", "role": "subadmin"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let users = client.list_users("t1").await.unwrap();
    assert_eq!(users[0].id, "9");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 9 of localhost
    let client = HttpServiceClient::new(ApiClientConfig::new("http://127.0.0.1:9/api")).unwrap();
    let error = client.get_profile("t1").await.unwrap_err();

    assert!(matches!(error, MentorlinkError::Network { .. }));
    assert!(error.is_recoverable());
}
