//! End-to-end CLI runs against a mock management endpoint

use assert_cmd::Command;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUPS_PATH: &str = "/subscriptions/sub-1/resourcegroups";

/// Write a config whose only profile points at `server`
fn mock_config(server: &MockServer) -> TempDir {
    let dir = TempDir::new().unwrap();
    let config = format!(
        r#"default_profile = "mock"

[profiles.mock]
client_id = "client"
client_secret = "secret"
tenant_id = "tenant"
subscription_id = "sub-1"
authority_url = "{uri}"
management_url = "{uri}"
"#,
        uri = server.uri()
    );
    std::fs::write(dir.path().join("config.toml"), config).unwrap();
    dir
}

/// Run armctl off the async runtime so the mock server keeps serving
async fn run_armctl(dir: &TempDir, args: &[&str]) -> std::process::Output {
    run_armctl_with_stdin(dir, args, "").await
}

async fn run_armctl_with_stdin(dir: &TempDir, args: &[&str], stdin: &str) -> std::process::Output {
    let config = dir.path().join("config.toml");
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let stdin = stdin.to_string();
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("armctl")
            .unwrap()
            .arg("--config-file")
            .arg(config)
            .args(args)
            .env_remove("ARMCTL_PROFILE")
            .env_remove("RUST_LOG")
            .write_stdin(stdin)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

async fn mock_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "test-token"
        })))
        .mount(server)
        .await;
}

fn group_json(name: &str) -> serde_json::Value {
    json!({
        "id": format!("/subscriptions/sub-1/resourceGroups/{}", name),
        "name": name,
        "location": "westus",
        "properties": { "provisioningState": "Succeeded" }
    })
}

/// Mocks for creating `test_cli1` and `testcli1` and deleting the group
async fn mock_session_resources(server: &MockServer) {
    let group_path = format!("{}/test_cli1", GROUPS_PATH);
    Mock::given(method("HEAD"))
        .and(path(group_path.as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(group_path.as_str()))
        .and(body_partial_json(json!({ "location": "westus" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(group_json("test_cli1")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/subscriptions/sub-1/providers/Microsoft.Storage/checkNameAvailability",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nameAvailable": true })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(
            "/subscriptions/sub-1/resourceGroups/test_cli1/providers/Microsoft.Storage/storageAccounts/testcli1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "/subscriptions/sub-1/resourceGroups/test_cli1/providers/Microsoft.Storage/storageAccounts/testcli1",
            "name": "testcli1",
            "location": "westus",
            "kind": "StorageV2",
            "sku": { "name": "Standard_LRS" },
            "properties": { "provisioningState": "Succeeded" }
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(group_path.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_group_list_json() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [group_json("prod"), group_json("test_ab12")]
        })))
        .mount(&server)
        .await;
    let dir = mock_config(&server);

    let output = run_armctl(&dir, &["group", "list", "-o", "json"]).await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let groups: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(groups.as_array().unwrap().len(), 2);
    assert_eq!(groups[1]["name"], "test_ab12");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_secret_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;
    let dir = mock_config(&server);

    let output = run_armctl(&dir, &["group", "list"]).await;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Authentication failed"), "{}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_group_delete_if_exists() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/gone", GROUPS_PATH).as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "ResourceGroupNotFound", "message": "Resource group 'gone' could not be found." }
        })))
        .mount(&server)
        .await;
    let dir = mock_config(&server);

    let output = run_armctl(&dir, &["group", "delete", "gone"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Resource group 'gone' not found"));

    let output = run_armctl(&dir, &["group", "delete", "gone", "--if-exists"]).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("does not exist"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_session_scope_console_output() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "value": [group_json("prod")] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mock_session_resources(&server).await;
    let dir = mock_config(&server);

    let output = run_armctl(
        &dir,
        &[
            "run",
            "--yes",
            "--cleanup-scope",
            "session",
            "--resource-group-name",
            "test_cli1",
            "--storage-account-name",
            "testcli1",
        ],
    )
    .await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "Resource Groups:",
            "-- prod",
            "Created Resource Group: test_cli1",
            "Created Storage Account: testcli1",
            "Deleting Resource Groups:",
            "-- test_cli1 DELETED",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_json_report_after_storage_failure() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;
    let group_path = format!("{}/test_cli2", GROUPS_PATH);
    Mock::given(method("HEAD"))
        .and(path(group_path.as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(group_path.as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(group_json("test_cli2")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/subscriptions/sub-1/providers/Microsoft.Storage/checkNameAvailability",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nameAvailable": false,
            "reason": "AlreadyExists",
            "message": "The storage account named testcli2 is already taken."
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(group_path.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let dir = mock_config(&server);

    let output = run_armctl(
        &dir,
        &[
            "run",
            "--yes",
            "--cleanup-scope",
            "session",
            "--resource-group-name",
            "test_cli2",
            "--storage-account-name",
            "testcli2",
            "-o",
            "json",
        ],
    )
    .await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["resource_group"], "test_cli2");
    assert!(report["storage_account"].is_null());
    assert_eq!(report["deleted"], json!(["test_cli2"]));
    assert_eq!(report["failures"][0]["stage"], "create-storage-account");
    assert!(
        report["failures"][0]["message"]
            .as_str()
            .unwrap()
            .contains("already taken")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_json_with_enter_pause_keeps_stdout_parseable() {
    let server = MockServer::start().await;
    mock_token(&server).await;
    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;
    mock_session_resources(&server).await;
    let dir = mock_config(&server);

    let output = run_armctl_with_stdin(
        &dir,
        &[
            "run",
            "--cleanup-scope",
            "session",
            "--resource-group-name",
            "test_cli1",
            "--storage-account-name",
            "testcli1",
            "-o",
            "json",
        ],
        "\n",
    )
    .await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["storage_account"], "testcli1");
    assert_eq!(report["deleted"], json!(["test_cli1"]));
    assert_eq!(report["cancelled"], false);
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("Press Enter to delete resource groups...")
    );
}
