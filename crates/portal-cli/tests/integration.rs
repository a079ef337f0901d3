#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;

const ENV_VARS: &[&str] = &[
    "PORTAL_URL",
    "PORTAL_TOKEN",
    "PORTAL_AS_EMAIL",
    "PORTAL_AS_ROLE",
    "PORTAL_PORT",
    "PORTAL_WORKFLOW_URL",
    "PORTAL_WORKFLOW_SECRET",
    "PORTAL_WORKFLOW_TIMEOUT_SECS",
    "PORTAL_DEV_EMAIL",
    "PORTAL_DEV_ROLE",
    "PORTAL_DEV_HEADERS",
];

fn portal() -> Command {
    let mut cmd = Command::cargo_bin("portal").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

// ---------------------------------------------------------------------------
// portal serve
// ---------------------------------------------------------------------------

#[test]
fn serve_refuses_to_start_without_backend() {
    portal()
        .args(["serve", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

// ---------------------------------------------------------------------------
// portal session
// ---------------------------------------------------------------------------

#[test]
fn session_prints_email_and_role() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/session")
        .match_header("x-portal-email", "teach@school.edu")
        .match_header("x-portal-role", "INSTRUCTOR")
        .with_body(
            r#"{"ok":true,"data":{"email":"teach@school.edu","role":"INSTRUCTOR","adminCapable":true}}"#,
        )
        .create();

    portal()
        .args(["session", "--url", &server.url()])
        .args(["--as-email", "teach@school.edu", "--as-role", "instructor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("teach@school.edu (INSTRUCTOR)"))
        .stdout(predicate::str::contains("admin routes: allowed"));
    mock.assert();
}

#[test]
fn session_without_credentials_reports_unauthorized() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/session")
        .with_status(401)
        .with_body(r#"{"error":"Unauthorized","code":"UNAUTHENTICATED"}"#)
        .create();

    portal()
        .args(["session", "--url", &server.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized (401 UNAUTHENTICATED)"));
}

// ---------------------------------------------------------------------------
// portal call
// ---------------------------------------------------------------------------

#[test]
fn call_posts_json_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/claims")
        .match_header("authorization", "Bearer tok-9")
        .match_body(mockito::Matcher::Json(serde_json::json!({ "questId": "q-1" })))
        .with_body(r#"{"ok":true,"data":{"claimId":"c-1"}}"#)
        .create();

    portal()
        .args(["call", "post", "/api/claims", "--url", &server.url()])
        .args(["--token", "tok-9", "--data", r#"{"questId":"q-1"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""claimId": "c-1""#));
    mock.assert();
}

#[test]
fn call_rejects_malformed_data() {
    portal()
        .args(["call", "POST", "/api/claims", "--data", "{nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data is not valid JSON"));
}
