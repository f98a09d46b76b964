//! Integration tests for the Compose LSP server.
//!
//! These tests spawn `compose-ls lsp` as a subprocess and communicate
//! with it over stdio using JSON-RPC.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

/// Create a JSON-RPC request with the given method and params.
fn make_request(id: i32, method: &str, params: Value) -> String {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    });
    let content = serde_json::to_string(&request).unwrap();
    format!("Content-Length: {}\r\n\r\n{}", content.len(), content)
}

/// Create a JSON-RPC notification (no id) with the given method and params.
fn make_notification(method: &str, params: Value) -> String {
    let request = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params
    });
    let content = serde_json::to_string(&request).unwrap();
    format!("Content-Length: {}\r\n\r\n{}", content.len(), content)
}

/// Read a single LSP message from the reader.
fn read_message(reader: &mut BufReader<std::process::ChildStdout>) -> Value {
    // Read Content-Length header
    let mut header_line = String::new();
    reader
        .read_line(&mut header_line)
        .expect("Failed to read response header");

    let content_length: usize = header_line
        .trim()
        .strip_prefix("Content-Length: ")
        .expect("Missing Content-Length header")
        .parse()
        .expect("Invalid Content-Length");

    // Read empty line
    let mut empty_line = String::new();
    reader
        .read_line(&mut empty_line)
        .expect("Failed to read empty line");

    // Read content
    let mut content = vec![0u8; content_length];
    reader
        .read_exact(&mut content)
        .expect("Failed to read response content");
    let content_str = String::from_utf8(content).expect("Invalid UTF-8 in response");

    serde_json::from_str(&content_str).expect("Failed to parse response JSON")
}

fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path)
        .expect("absolute path")
        .to_string()
}

/// Test harness for LSP integration tests.
struct LspTestHarness {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    next_request_id: i32,
}

impl LspTestHarness {
    /// Spawn the language server.
    fn new() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_compose-ls"))
            .arg("lsp")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn compose-ls lsp");

        let stdin = child.stdin.take().expect("Failed to get stdin");
        let stdout = child.stdout.take().expect("Failed to get stdout");
        let reader = BufReader::new(stdout);

        Self {
            child,
            stdin,
            reader,
            next_request_id: 1,
        }
    }

    /// Send a request and return the response.
    fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_request_id;
        self.next_request_id += 1;

        let request = make_request(id, method, params);
        self.stdin
            .write_all(request.as_bytes())
            .expect("Failed to write request");
        self.stdin.flush().expect("Failed to flush stdin");

        // Read responses until we find one with our id
        loop {
            let response = read_message(&mut self.reader);
            if response.get("id").and_then(|i| i.as_i64()) == Some(id as i64) {
                return response;
            }
            // Continue reading (may be notifications)
        }
    }

    /// Repeat a request until it returns a non-null result.
    ///
    /// Notifications are handled asynchronously, so a request sent right
    /// after `didOpen` may still see the previous state.
    fn request_result(&mut self, method: &str, params: Value) -> Value {
        let start = Instant::now();
        loop {
            let response = self.request(method, params.clone());
            let result = response.get("result").cloned().unwrap_or(Value::Null);
            if !result.is_null() || start.elapsed() > Duration::from_secs(5) {
                return result;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Send a notification (no response expected).
    fn notify(&mut self, method: &str, params: Value) {
        let notification = make_notification(method, params);
        self.stdin
            .write_all(notification.as_bytes())
            .expect("Failed to write notification");
        self.stdin.flush().expect("Failed to flush stdin");
    }

    /// Initialize the LSP server with the given client capabilities.
    fn initialize_with(&mut self, capabilities: Value) -> Value {
        let params = json!({
            "processId": std::process::id(),
            "capabilities": capabilities,
            "rootUri": null
        });
        let response = self.request("initialize", params);

        // Send initialized notification
        self.notify("initialized", json!({}));

        response
    }

    /// Initialize the LSP server.
    fn initialize(&mut self) -> Value {
        self.initialize_with(json!({}))
    }

    /// Open a text document.
    fn open_document(&mut self, uri: &str, content: &str, version: i32) {
        let params = json!({
            "textDocument": {
                "uri": uri,
                "languageId": "dockercompose",
                "version": version,
                "text": content
            }
        });
        self.notify("textDocument/didOpen", params);
    }

    /// Change a text document (full sync).
    fn change_document(&mut self, uri: &str, content: &str, version: i32) {
        let params = json!({
            "textDocument": {
                "uri": uri,
                "version": version
            },
            "contentChanges": [
                { "text": content }
            ]
        });
        self.notify("textDocument/didChange", params);
    }

    fn position_params(uri: &str, line: u32, character: u32) -> Value {
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        })
    }
}

impl Drop for LspTestHarness {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

const COMPOSE: &str = "\
include:
  - other.yaml
services:
  web:
    depends_on:
      - redis
      - db
  db:
    image: postgres
";

const OTHER: &str = "\
services:
  redis:
    image: redis:alpine
";

/// Write the two-file project and return the URI of the including file.
fn write_project(dir: &Path) -> String {
    std::fs::write(dir.join("compose.yaml"), COMPOSE).unwrap();
    std::fs::write(dir.join("other.yaml"), OTHER).unwrap();
    file_uri(&dir.join("compose.yaml"))
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_initialize() {
    let mut harness = LspTestHarness::new();
    let response = harness.initialize();

    let result = &response["result"];
    assert_eq!(result["serverInfo"]["name"], "compose-lsp");

    let caps = &result["capabilities"];
    assert!(caps.get("textDocumentSync").is_some());
    assert_eq!(caps["documentHighlightProvider"], true);
    assert_eq!(caps["definitionProvider"], true);
    assert_eq!(caps["hoverProvider"], true);
    assert_eq!(caps["renameProvider"]["prepareProvider"], true);
}

// =============================================================================
// Reference Tests
// =============================================================================

#[test]
fn test_document_highlight() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, COMPOSE, 1);

    let result = harness.request_result(
        "textDocument/documentHighlight",
        LspTestHarness::position_params(&uri, 6, 9),
    );
    let highlights = result.as_array().expect("Expected highlights");
    assert_eq!(highlights.len(), 2);
    // 2 = Read, 3 = Write
    assert_eq!(highlights[0]["kind"], 2);
    assert_eq!(highlights[1]["kind"], 3);
    assert_eq!(highlights[1]["range"]["start"]["line"], 7);
}

#[test]
fn test_positions_use_utf16_code_units() {
    let dir = tempfile::tempdir().unwrap();
    let uri = file_uri(&dir.path().join("compose.yaml"));
    let content = "services:\n  web: {image: \"\u{1F433}\", depends_on: [db]}\n  db: {}\n";

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, content, 1);

    // The whale takes two code units, so `db` spans 34..36
    let result = harness.request_result(
        "textDocument/documentHighlight",
        LspTestHarness::position_params(&uri, 1, 35),
    );
    let highlights = result.as_array().expect("Expected highlights");
    assert_eq!(highlights.len(), 2);
    assert_eq!(highlights[0]["range"]["start"]["character"], 34);
    assert_eq!(highlights[0]["range"]["end"]["character"], 36);
    assert_eq!(highlights[1]["range"]["start"]["character"], 2);
}

#[test]
fn test_definition_in_included_file() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());
    let other_uri = file_uri(&dir.path().join("other.yaml"));

    let mut harness = LspTestHarness::new();
    harness.initialize_with(json!({
        "textDocument": { "definition": { "linkSupport": true } }
    }));
    harness.open_document(&uri, COMPOSE, 1);

    let result = harness.request_result(
        "textDocument/definition",
        LspTestHarness::position_params(&uri, 5, 9),
    );
    let links = result.as_array().expect("Expected location links");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["targetUri"], other_uri.as_str());
    assert_eq!(links[0]["targetSelectionRange"]["start"]["line"], 1);
    assert_eq!(links[0]["originSelectionRange"]["start"]["character"], 8);
}

#[test]
fn test_definition_without_link_support() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, COMPOSE, 1);

    let result = harness.request_result(
        "textDocument/definition",
        LspTestHarness::position_params(&uri, 6, 9),
    );
    assert_eq!(result["uri"], uri.as_str());
    assert_eq!(result["range"]["start"]["line"], 7);
}

#[test]
fn test_definition_after_closing_included_file() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());
    let other_uri = file_uri(&dir.path().join("other.yaml"));

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&other_uri, OTHER, 1);
    harness.open_document(&uri, COMPOSE, 1);
    harness.request_result(
        "textDocument/definition",
        LspTestHarness::position_params(&uri, 5, 9),
    );

    harness.notify(
        "textDocument/didClose",
        json!({ "textDocument": { "uri": other_uri } }),
    );
    std::thread::sleep(Duration::from_millis(200));

    let result = harness.request_result(
        "textDocument/definition",
        LspTestHarness::position_params(&uri, 5, 9),
    );
    assert_eq!(result["uri"], other_uri.as_str());
    assert_eq!(result["range"]["start"]["line"], 1);
}

#[test]
fn test_rename_and_prepare_rename() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, COMPOSE, 1);

    let range = harness.request_result(
        "textDocument/prepareRename",
        LspTestHarness::position_params(&uri, 7, 3),
    );
    assert_eq!(range["start"]["character"], 2);
    assert_eq!(range["end"]["character"], 4);

    let mut params = LspTestHarness::position_params(&uri, 7, 3);
    params["newName"] = json!("postgres");
    let edit = harness.request_result("textDocument/rename", params);
    let edits = edit["changes"][uri.as_str()]
        .as_array()
        .expect("Expected edits for the document");
    assert_eq!(edits.len(), 2);
    assert!(edits.iter().all(|edit| edit["newText"] == "postgres"));
}

#[test]
fn test_hover_shows_included_body() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, COMPOSE, 1);

    let hover = harness.request_result("textDocument/hover", LspTestHarness::position_params(&uri, 5, 9));
    assert_eq!(hover["contents"]["kind"], "markdown");
    let value = hover["contents"]["value"].as_str().unwrap();
    assert!(value.contains("other.yaml"));
    assert!(value.contains("image: redis:alpine"));
}

#[test]
fn test_requests_follow_document_changes() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, COMPOSE, 1);
    harness.request_result(
        "textDocument/documentHighlight",
        LspTestHarness::position_params(&uri, 6, 9),
    );

    harness.change_document(&uri, "networks:\n  front: {}\n", 2);
    let result = harness.request_result(
        "textDocument/documentHighlight",
        LspTestHarness::position_params(&uri, 1, 3),
    );
    assert_eq!(result.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_off_reference_requests_return_null() {
    let dir = tempfile::tempdir().unwrap();
    let uri = write_project(dir.path());

    let mut harness = LspTestHarness::new();
    harness.initialize();
    harness.open_document(&uri, COMPOSE, 1);
    // Wait until the document is stored
    harness.request_result(
        "textDocument/documentHighlight",
        LspTestHarness::position_params(&uri, 6, 9),
    );

    let response = harness.request("textDocument/hover", LspTestHarness::position_params(&uri, 8, 12));
    assert!(response["result"].is_null());
    assert!(response.get("error").is_none());
}
