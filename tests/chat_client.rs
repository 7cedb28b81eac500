//! Chat-client tests against a local HTTP server

use mdshot::{ChatClient, ChatConfig, Error};
use std::sync::{Mutex, Once, OnceLock};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

fn last_body() -> &'static Mutex<String> {
    static BODY: OnceLock<Mutex<String>> = OnceLock::new();
    BODY.get_or_init(|| Mutex::new(String::new()))
}

// Tests share one stub server; serialize them so `last_body` stays coherent.
fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Start a chat-completions stub server
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = std::io::Read::read_to_string(request.as_reader(), &mut body);
                *last_body().lock().unwrap() = body;

                let path = request.url().to_string();
                let response = match path.as_str() {
                    "/ok" => Response::from_string(
                        r#"{"choices":[{"message":{"role":"assistant","content":"  Corrected text.  "}}]}"#,
                    )
                    .with_header(
                        "Content-Type: application/json"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    "/empty" => Response::from_string(r#"{"choices":[]}"#).with_header(
                        "Content-Type: application/json"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    _ => Response::from_string(r#"{"error":"nope"}"#).with_status_code(500),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18090".to_string()
}

fn config_for(path: &str) -> ChatConfig {
    ChatConfig {
        endpoint: format!("{}{}", start_test_server(), path),
        api_key: String::new(),
        model: "test-model".to_string(),
        timeout_ms: 5000,
    }
}

#[tokio::test]
async fn grammar_correction_returns_trimmed_content() {
    let _guard = test_guard();
    let client = ChatClient::new(config_for("/ok")).unwrap();
    let corrected = client.correct_grammar("teh text").await.unwrap();
    assert_eq!(corrected, "Corrected text.");

    let body = last_body().lock().unwrap().clone();
    assert!(body.contains("\"model\":\"test-model\""));
    assert!(body.contains("Correct the grammar"));
    assert!(body.contains("teh text"));
}

#[tokio::test]
async fn translate_carries_the_target_language() {
    let _guard = test_guard();
    let client = ChatClient::new(config_for("/ok")).unwrap();
    client.translate("bonjour", "German").await.unwrap();

    let body = last_body().lock().unwrap().clone();
    assert!(body.contains("German"));
    assert!(body.contains("bonjour"));
}

#[tokio::test]
async fn server_errors_surface_as_chat_failures() {
    let _guard = test_guard();
    let client = ChatClient::new(config_for("/boom")).unwrap();
    let result = client.explain("anything").await;
    assert!(matches!(result, Err(Error::Chat(_))));
}

#[tokio::test]
async fn missing_choices_is_a_chat_failure() {
    let _guard = test_guard();
    let client = ChatClient::new(config_for("/empty")).unwrap();
    let result = client.correct_grammar("text").await;
    assert!(matches!(result, Err(Error::Chat(_))));
}
