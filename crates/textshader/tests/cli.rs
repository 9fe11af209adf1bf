use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use shadergen::testing::{refused_endpoint, serve_once};
use tempfile::TempDir;

/// Runs textshader against a config file inside `root` so the user's own
/// configuration never leaks into the test.
fn textshader(root: &Path, args: &[&str]) -> Output {
    let config = root.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_textshader"))
        .env("TEXTSHADER_CONFIG", &config)
        .env_remove("TEXTSHADER_ENDPOINT")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run textshader")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn calc_evaluates_arguments() {
    let root = TempDir::new().unwrap();
    let output = textshader(root.path(), &["calc", "2 + 3 * 4", "(1 + 1) / 4", "-2 * -3"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "2 + 3 * 4 = 14\n(1 + 1) / 4 = 0.5\n-2 * -3 = 6\n");
}

#[test]
fn calc_reports_failures_and_exits_non_zero() {
    let root = TempDir::new().unwrap();
    let output = textshader(root.path(), &["calc", "1 / 0", "2 + 2", "3 ^ 2"]);

    assert!(!output.status.success());
    assert_eq!(stdout(&output), "2 + 2 = 4\n");
    let errors = stderr(&output);
    assert!(errors.contains("1 / 0: division by zero"), "{errors}");
    assert!(errors.contains("invalid character '^'"), "{errors}");
}

#[test]
fn calc_reads_stdin_and_keeps_history() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_textshader"))
        .arg("calc")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn textshader calc");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"1 + 1\n\n(2\n10 / 4\n:history\n:last\n:quit\n99\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "1 + 1 = 2\n10 / 4 = 2.5\n1 + 1 = 2\n10 / 4 = 2.5\n2.5\n"
    );
    assert!(stderr(&output).contains("mismatched parenthesis"));
}

#[test]
fn render_rejects_malformed_source_before_opening_a_window() {
    let root = TempDir::new().unwrap();
    let shader = root.path().join("shader.glsl");
    fs::write(&shader, "void main() {}\nvoid main() {}\n").unwrap();

    let output = textshader(root.path(), &["render", shader.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("Invalid shader code format"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn render_honours_configured_sentinel() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[canvas]\nsentinel = \"//--\"\n").unwrap();
    let shader = root.path().join("shader.glsl");
    fs::write(
        &shader,
        "void main() {}\n// Fragment Shader\nvoid main() {}\n",
    )
    .unwrap();

    let output = textshader(root.path(), &["render", shader.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("separator line not found"));
}

#[test]
fn config_prints_resolved_values() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[generator]\ntimeout = \"15s\"\n\n[window]\nwidth = 640\n",
    )
    .unwrap();

    let output = textshader(
        root.path(),
        &["config", "--endpoint", "https://shaders.example.com/generate"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.starts_with("# loaded from "), "{printed}");
    assert!(printed.contains("endpoint = \"https://shaders.example.com/generate\""));
    assert!(printed.contains("timeout = \"15s\""));
    assert!(printed.contains("width = 640"));
    assert!(printed.contains("height = 300"));
}

#[test]
fn invalid_config_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[canvas]\nsentinel = \"\"\n").unwrap();

    let output = textshader(root.path(), &["config"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("canvas.sentinel must not be empty"));
}

#[test]
fn generate_print_writes_service_output() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"shaderCode":"void main() {}\n// Fragment Shader\nvoid main() {}"}"#,
    );

    let root = TempDir::new().unwrap();
    let saved = root.path().join("out/shader.glsl");
    let output = textshader(
        root.path(),
        &[
            "generate",
            "  neon grid ",
            "--print",
            "--save",
            saved.to_str().unwrap(),
            "--endpoint",
            &endpoint,
        ],
    );

    assert!(output.status.success(), "{}", stderr(&output));
    let expected = "void main() {}\n// Fragment Shader\nvoid main() {}";
    assert_eq!(stdout(&output), format!("{expected}\n"));
    assert_eq!(fs::read_to_string(&saved).unwrap(), expected);
    assert_eq!(server.join().unwrap(), r#"{"prompt":"neon grid"}"#);
}

#[test]
fn generate_rejects_blank_prompt() {
    let root = TempDir::new().unwrap();
    let output = textshader(
        root.path(),
        &["generate", "   ", "--print", "--endpoint", "http://127.0.0.1:9/api"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please enter a prompt"));
}

#[test]
fn generate_reports_unreachable_service() {
    let root = TempDir::new().unwrap();
    let output = textshader(
        root.path(),
        &[
            "generate",
            "stars",
            "--print",
            "--endpoint",
            &refused_endpoint(),
        ],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error generating shader. Please try again."));
}
