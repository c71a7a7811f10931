//! Entity Service Tests
//!
//! Tests for:
//! - Endpoint verbs, paths and bodies
//! - Login storing the session
//! - Logout revoking the refresh token and always ending the session

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kd_sdk::{
    Client, Config, CredentialStore, Decision, Error, MemoryCredentialStore, SessionEvent,
    TerminationReason,
};

fn create_client(server: &MockServer, store: Arc<MemoryCredentialStore>) -> Client {
    Client::new(Config::new(server.uri()), store).unwrap()
}

fn logged_in_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_session("T1", Some("R1"), Some("Company")))
}

#[tokio::test]
async fn test_login_stores_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Auth/Login"))
        .and(body_json(json!({ "email": "hr@acme.test", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "scope": "Company",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = create_client(&server, store.clone());

    let payload = client.auth().login("hr@acme.test", "pw").await.unwrap();

    assert_eq!(payload["scope"], "Company");
    let credentials = store.credentials();
    assert_eq!(credentials.access_token.as_deref(), Some("T1"));
    assert_eq!(credentials.refresh_token.as_deref(), Some("R1"));
    assert!(credentials.is_authenticated());
}

#[tokio::test]
async fn test_failed_login_stores_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Auth/Login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Wrong password" })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = create_client(&server, store.clone());

    let err = client.auth().login("a@b.test", "nope").await.unwrap_err();

    assert!(matches!(err, Error::Validation { status: 400, .. }));
    assert!(store.credentials().is_empty());
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Auth/Revoke"))
        .and(body_json(json!({ "token": "R1" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let client = create_client(&server, store.clone());
    let mut events = client.subscribe();

    client.auth().logout().await;

    assert!(store.credentials().is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Terminated {
            reason: TerminationReason::UserLogout,
            redirect_to: "/login".to_string(),
        }
    );
}

#[tokio::test]
async fn test_logout_survives_revoke_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Auth/Revoke"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let client = create_client(&server, store.clone());

    client.auth().logout().await;

    assert!(store.credentials().is_empty());
}

#[tokio::test]
async fn test_logout_without_refresh_token_skips_revoke() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Auth/Revoke"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::with_session("T1", None, Some("Student")));
    let client = create_client(&server, store.clone());

    client.auth().logout().await;

    assert!(store.credentials().is_empty());
}

#[tokio::test]
async fn test_job_mutations_use_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Jobs/7"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_client(&server, logged_in_store());

    client.jobs().update("7", &json!({ "title": "Senior" })).await.unwrap();
    client.jobs().delete("7").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body_json::<serde_json::Value>().unwrap()["title"], "Senior");
    assert!(requests[1].body.is_empty());
}

#[tokio::test]
async fn test_job_queries() {
    let server = MockServer::start().await;

    for route in ["/Jobs", "/Jobs/MyJobs", "/Categories", "/Jobs/3", "/Jobs/CandidateSuggestions/3"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "route": route })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = create_client(&server, logged_in_store());
    let jobs = client.jobs();

    assert_eq!(jobs.list().await.unwrap()["route"], "/Jobs");
    assert_eq!(jobs.mine().await.unwrap()["route"], "/Jobs/MyJobs");
    assert_eq!(jobs.categories().await.unwrap()["route"], "/Categories");
    assert_eq!(jobs.get("3").await.unwrap()["route"], "/Jobs/3");
    assert_eq!(
        jobs.candidate_suggestions("3").await.unwrap()["route"],
        "/Jobs/CandidateSuggestions/3"
    );
}

#[tokio::test]
async fn test_company_invitation_and_response_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/UserJobs/SendInvitation"))
        .and(body_json(json!({ "studentUserId": "u-42", "jobId": 7 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/UserJobs/RespondApplication/9"))
        .and(body_json(json!({ "status": "Accepted" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Done"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/UserJobs/RejectApplication/10"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, logged_in_store());
    let company = client.company();

    company.send_invitation("u-42", "7").await.unwrap();
    assert_eq!(
        company.respond_application("9", Decision::Accepted).await.unwrap(),
        json!("Done")
    );
    assert_eq!(company.reject_application("10").await.unwrap(), serde_json::Value::Null);
}

#[tokio::test]
async fn test_student_apply_and_respond() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/UserJobs/Apply"))
        .and(body_json(json!({ "jobId": 12 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Pending" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/UserJobs/RespondInvitation/5"))
        .and(body_json(json!({ "status": "Rejected" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/UserJobs/MyApplications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "company": { "logoUrl": "/logo.png" }, "logoUrl": "/l.png" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(
        Config::new(server.uri()).with_asset_origin("https://kodopo.tech/"),
        logged_in_store(),
    )
    .unwrap();
    let student = client.student();

    assert_eq!(student.apply("12").await.unwrap()["status"], "Pending");
    student.respond_invitation("5", Decision::Rejected).await.unwrap();

    let applications = student.my_applications().await.unwrap();
    assert_eq!(applications[0]["logoUrl"], "https://kodopo.tech/l.png");
    assert_eq!(applications[0]["company"]["logoUrl"], "/logo.png");
}
