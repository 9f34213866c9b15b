//! End-to-end flows over HTTP against a seeded in-memory desk.

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

use nexus_engine::{Credentials, FeedbackDesk};
use nexus_server::{start, ServerConfig, ServerHandle};
use nexus_store::SqliteStore;

struct Harness {
    base: String,
    client: Client,
    handle: ServerHandle,
}

impl Harness {
    async fn start() -> Self {
        let desk = FeedbackDesk::with_credentials(
            SqliteStore::in_memory().unwrap(),
            Credentials::insecure_fast(),
        );
        desk.seed_demo_data().unwrap();
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let handle = start(config, desk).await.unwrap();
        Self {
            base: format!("http://127.0.0.1:{}", handle.port),
            client: Client::new(),
            handle,
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, format!("{}{}", self.base, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, path, Some(token), None).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, path, Some(token), Some(body)).await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Id of the seeded ticket with this subject, looked up as the dean.
    async fn ticket_id(&self, dean: &str, subject: &str) -> i64 {
        let (_, list) = self.get("/api/feedback", dean).await;
        list.as_array()
            .unwrap()
            .iter()
            .find(|t| t["subject"] == subject)
            .and_then(|t| t["id"].as_i64())
            .unwrap()
    }
}

const PROJECTOR: &str = "Projector in Room 304 Malfunction";
const GRADE: &str = "Missing Grade for CS101 Midterm";
const GRANT: &str = "Prof. Alan Grant";

#[tokio::test]
async fn login_and_session_lifecycle() {
    let h = Harness::start().await;

    let (status, body) = h.call(Method::GET, "/api/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);

    let (status, body) = h
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "username": "dean", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let token = h.login("dean", "dean123").await;
    let (status, body) = h.get("/api/session", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["role"], "dean");
    assert_eq!(body["user"]["display_name"], "Dr. J Dean");

    let (status, _) = h.call(Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = h.get("/api/feedback", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    h.handle.shutdown().await;
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let h = Harness::start().await;
    for path in ["/api/feedback", "/api/stats", "/api/faculty/tasks", "/api/users/faculty"] {
        let (status, _) = h.call(Method::GET, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
    }
    let (status, _) = h.get("/api/feedback", "forged-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    h.handle.shutdown().await;
}

#[tokio::test]
async fn author_identity_depends_on_viewer() {
    let h = Harness::start().await;
    let student = h.login("student", "student123").await;
    let faculty = h.login("faculty1", "faculty123").await;
    let dean = h.login("dean", "dean123").await;

    let (_, list) = h.get("/api/feedback", &student).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert!(list.iter().all(|t| t["author_name"] == "Student User"));

    let (_, list) = h.get("/api/feedback", &faculty).await;
    for ticket in list.as_array().unwrap() {
        assert_eq!(ticket["author_name"], "Anonymous Student");
        assert!(ticket.get("author_id").is_none());
    }

    let (_, list) = h.get("/api/feedback", &dean).await;
    let list = list.as_array().unwrap();
    assert_eq!(list[0]["subject"], "Library ID Card Activation");
    assert!(list.iter().all(|t| t["author_name"] == "Student User"));
    h.handle.shutdown().await;
}

#[tokio::test]
async fn student_creates_and_comments() {
    let h = Harness::start().await;
    let student = h.login("student", "student123").await;

    let (status, body) = h
        .post(
            "/api/feedback",
            &student,
            json!({
                "category": "facility",
                "subject": "Broken heater",
                "message": "Room 12 is freezing.",
                "priority": "medium"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["assigned_to"], Value::Null);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = h
        .post(
            "/api/feedback",
            &student,
            json!({ "category": "facility", "subject": "x", "message": "y" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = h
        .post(&format!("/api/feedback/{id}/comments"), &student, json!({ "comment": "Still cold." }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author_name"], "Student User");

    let (status, detail) = h.get(&format!("/api/feedback/{id}"), &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["subject"], "Broken heater");
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);

    let (status, body) = h.put(&format!("/api/feedback/{id}"), &student, json!({ "status": "resolved" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (_, stats) = h.get("/api/stats", &student).await;
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["pending"], 2);
    h.handle.shutdown().await;
}

#[tokio::test]
async fn dean_assigns_and_faculty_resolves() {
    let h = Harness::start().await;
    let dean = h.login("dean", "dean123").await;
    let faculty = h.login("faculty1", "faculty123").await;
    let grade = h.ticket_id(&dean, GRADE).await;
    let path = format!("/api/feedback/{grade}");

    let (status, body) = h.put(&path, &faculty, json!({ "status": "processing" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "not assigned to you");

    let (status, body) = h.put(&path, &dean, json!({ "assigned_to": "Dr. Nobody" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = h
        .put(&path, &dean, json!({ "assigned_to": GRANT, "priority": "high" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_to"], GRANT);
    assert_eq!(body["priority"], "high");

    let (_, tasks) = h.get("/api/faculty/tasks", &faculty).await;
    let subjects: Vec<_> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["subject"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(subjects, vec![PROJECTOR.to_string(), GRADE.to_string()]);

    let (status, body) = h.put(&path, &faculty, json!({ "priority": "low" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "faculty may only change status");

    let (status, body) = h.put(&path, &faculty, json!({ "status": "resolved" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");

    let (_, tasks) = h.get("/api/faculty/tasks", &faculty).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    let (status, _) = h.get("/api/faculty/tasks", &dean).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    h.handle.shutdown().await;
}

#[tokio::test]
async fn missing_and_malformed_requests() {
    let h = Harness::start().await;
    let dean = h.login("dean", "dean123").await;

    let (status, body) = h.get("/api/feedback/9999", &dean).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = h.get("/api/feedback/not-a-number", &dean).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION");

    let resp = h
        .client
        .post(format!("{}/api/feedback", h.base))
        .bearer_auth(&dean)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let projector = h.ticket_id(&dean, PROJECTOR).await;
    let (status, body) = h.put(&format!("/api/feedback/{projector}"), &dean, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "no fields to update");
    h.handle.shutdown().await;
}

#[tokio::test]
async fn faculty_directory_management() {
    let h = Harness::start().await;
    let dean = h.login("dean", "dean123").await;
    let student = h.login("student", "student123").await;

    let new_faculty = json!({
        "username": "sattler",
        "password": "botany",
        "full_name": "Dr. Ellie Sattler",
        "email": "sattler@nexus.edu"
    });
    let (status, _) = h.post("/api/users/add-faculty", &student, new_faculty.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h.post("/api/users/add-faculty", &dean, new_faculty.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["display_name"], "Dr. Ellie Sattler");
    let sattler_id = body["id"].as_i64().unwrap();

    let (status, body) = h.post("/api/users/add-faculty", &dean, new_faculty).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, roster) = h.get("/api/users/faculty", &dean).await;
    assert_eq!(roster.as_array().unwrap().len(), 2);

    let (_, stats) = h.get("/api/faculty-stats", &dean).await;
    let grant = stats
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["name"] == GRANT)
        .unwrap();
    assert_eq!(grant["total_assigned"], 2);
    assert_eq!(grant["resolved"], 1);
    assert_eq!(grant["pending"], 1);

    let sattler = h.login("sattler", "botany").await;
    let (status, _) = h.get("/api/feedback", &sattler).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h
        .call(Method::DELETE, &format!("/api/users/{sattler_id}"), Some(&dean), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Dr. Ellie Sattler");

    let (status, _) = h.get("/api/feedback", &sattler).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .call(Method::DELETE, &format!("/api/users/{sattler_id}"), Some(&dean), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    h.handle.shutdown().await;
}

#[tokio::test]
async fn deleting_faculty_clears_their_assignments() {
    let h = Harness::start().await;
    let dean = h.login("dean", "dean123").await;
    let (_, roster) = h.get("/api/users/faculty", &dean).await;
    let grant_id = roster[0]["id"].as_i64().unwrap();

    let (status, body) = h
        .call(Method::DELETE, &format!("/api/users/{grant_id}"), Some(&dean), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unassigned_tickets"], 2);

    let (_, list) = h.get("/api/feedback", &dean).await;
    assert!(list
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["assigned_to"] == Value::Null));
    h.handle.shutdown().await;
}
