use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a config with database path
fn config_with_db(port: u16, db_path: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"
"#,
        port, db_path
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_ticketd"))
        .env("TICKETD_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Helper to start a server for testing
async fn start_test_server() -> (u16, tokio::process::Child, TempDir, NamedTempFile) {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_content = config_with_db(port, db_path.to_str().unwrap());

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    (port, server, temp_dir, temp_file)
}

async fn create_ticket(client: &Client, port: u16, description: &str, status: &str) -> Value {
    let response = client
        .post(format!("http://127.0.0.1:{}/api/tickets", port))
        .json(&json!({ "description": description, "status": status }))
        .send()
        .await
        .expect("Failed to create ticket");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse JSON")
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_create_ticket_forces_status_open() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/api/tickets", port))
        .json(&json!({ "description": "printer jam", "status": "Closed" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/api/tickets/1"
    );

    let json: Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(json["id"], 1);
    assert_eq!(json["description"], "printer jam");
    assert_eq!(json["status"], "Open");
    assert_eq!(json["createdAt"], json["updatedAt"]);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_create_ticket_validation() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();

    for body in [
        json!({ "status": "Open" }),
        json!({ "description": "", "status": "Open" }),
        json!({ "description": "no status" }),
    ] {
        let response = client
            .post(format!("http://127.0.0.1:{}/api/tickets", port))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body: {}", body);
    }

    server.kill().await.ok();
}

#[tokio::test]
async fn test_get_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let created = create_ticket(&client, port, "fetch me", "Open").await;

    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/tickets/{}",
            port, created["id"]
        ))
        .send()
        .await
        .expect("Failed to get ticket");

    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json, created);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_get_nonexistent_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/tickets/42", port))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_list_rejects_invalid_pagination() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();

    for query in ["pageNumber=0", "pageSize=0", "pageNumber=-3&pageSize=10"] {
        let response = client
            .get(format!("http://127.0.0.1:{}/api/tickets?{}", port, query))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "query: {}", query);
    }

    server.kill().await.ok();
}

#[tokio::test]
async fn test_list_tickets_pagination() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();

    // Create 3 tickets
    for i in 0..3 {
        create_ticket(&client, port, &format!("ticket {}", i), "Open").await;
    }

    // Second page of two holds exactly the oldest ticket
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/tickets?pageNumber=2&pageSize=2",
            port
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["description"], "ticket 0");
    assert_eq!(json["pagination"]["totalCount"], 3);
    assert_eq!(json["pagination"]["pageSize"], 2);
    assert_eq!(json["pagination"]["currentPage"], 2);
    assert_eq!(json["pagination"]["totalPages"], 2);

    // Out-of-range page is empty, not an error
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/tickets?pageNumber=5&pageSize=2",
            port
        ))
        .send()
        .await
        .unwrap();

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
    assert_eq!(json["pagination"]["totalCount"], 3);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_list_orders_by_most_recently_updated() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();

    for i in 0..3 {
        create_ticket(&client, port, &format!("ticket {}", i), "Open").await;
    }

    // Touch the oldest ticket
    let response = client
        .put(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .json(&json!({ "id": 1, "description": "ticket 0", "status": "Closed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("http://127.0.0.1:{}/api/tickets", port))
        .send()
        .await
        .unwrap();

    let json: Value = response.json().await.unwrap();
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["id"], 1);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_update_lifecycle() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let created = create_ticket(&client, port, "printer jam", "Closed").await;
    assert_eq!(created["status"], "Open");

    let response = client
        .put(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .json(&json!({ "id": 1, "description": "printer jam", "status": "Closed" }))
        .send()
        .await
        .expect("Failed to update ticket");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Updated successfully");

    let response = client
        .get(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .send()
        .await
        .unwrap();

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "Closed");
    assert_eq!(json["createdAt"], created["createdAt"]);
    assert!(timestamp(&json["updatedAt"]) > timestamp(&json["createdAt"]));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_update_id_mismatch() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    create_ticket(&client, port, "untouched", "Open").await;

    let response = client
        .put(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .json(&json!({ "id": 2, "description": "changed", "status": "Closed" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);

    // Storage must be untouched
    let response = client
        .get(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .send()
        .await
        .unwrap();

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["description"], "untouched");
    assert_eq!(json["status"], "Open");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_update_nonexistent_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .put(format!("http://127.0.0.1:{}/api/tickets/42", port))
        .json(&json!({ "id": 42, "description": "ghost", "status": "Open" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_delete_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    create_ticket(&client, port, "delete me", "Open").await;

    let response = client
        .delete(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .send()
        .await
        .expect("Failed to delete ticket");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Deleted successfully");

    // Deleted ticket is gone
    let response = client
        .get(format!("http://127.0.0.1:{}/api/tickets/1", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_delete_nonexistent_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .delete(format!("http://127.0.0.1:{}/api/tickets/42", port))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}
