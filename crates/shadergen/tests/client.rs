use std::time::Duration;

use shadergen::testing::{refused_endpoint, serve_once};
use shadergen::{GenerationError, GeneratorClient, GeneratorConfig, ShaderGenerator};

fn client(endpoint: &str) -> GeneratorClient {
    GeneratorClient::new(GeneratorConfig::new(endpoint, Duration::from_secs(5)).unwrap()).unwrap()
}

#[test]
fn posts_prompt_and_returns_shader_code() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"shaderCode":"void main() {}\n// Fragment Shader\nvoid main() {}"}"#,
    );
    let source = client(&endpoint).generate("swirling plasma").unwrap();

    assert_eq!(source, "void main() {}\n// Fragment Shader\nvoid main() {}");
    let request: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
    assert_eq!(request, serde_json::json!({ "prompt": "swirling plasma" }));
}

#[test]
fn error_status_is_reported_with_service_message() {
    let (endpoint, server) = serve_once(
        "500 Internal Server Error",
        r#"{"error":"model unavailable"}"#,
    );
    let err = client(&endpoint).generate("stars").unwrap_err();
    server.join().unwrap();

    match err {
        GenerationError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn body_without_shader_code_is_a_decode_error() {
    let (endpoint, server) = serve_once("200 OK", r#"{"code":"void main() {}"}"#);
    let err = client(&endpoint).generate("stars").unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, GenerationError::Decode { .. }));
}

#[test]
fn refused_connection_is_a_transport_error() {
    let err = client(&refused_endpoint()).generate("stars").unwrap_err();
    assert!(matches!(err, GenerationError::Transport { .. }));
}
