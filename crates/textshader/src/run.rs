use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use evaluator::Calculator;
use renderer::split_shader_source;
use renderer::window::{self, CanvasProxy};
use shadergen::{GeneratorClient, ShaderGenerator};
use tracing_subscriber::EnvFilter;

use crate::cli::{CalcArgs, GenerateArgs, RenderArgs};
use crate::config::{self, LoadedConfig};
use crate::panel::{AttemptError, ShaderPanel};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn render(loaded: LoadedConfig, args: RenderArgs) -> Result<()> {
    let config = loaded.config;
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read shader source {}", args.file.display()))?;
    // Catch malformed files before a window opens.
    split_shader_source(&source, &config.canvas.sentinel).with_context(|| {
        format!(
            "Invalid shader code format in {}",
            args.file.display()
        )
    })?;
    tracing::info!(file = %args.file.display(), "rendering shader source");
    window::run(config.window_config(), Some(source), |_| {})
}

pub fn generate(loaded: LoadedConfig, args: GenerateArgs) -> Result<()> {
    let config = loaded.config;
    if args.prompt.trim().is_empty() {
        bail!(AttemptError::EmptyPrompt.user_message());
    }
    let client = GeneratorClient::new(config.generator_config()?)
        .context("failed to construct generation client")?;

    if args.print {
        let source = client
            .generate(args.prompt.trim())
            .map_err(|err| anyhow!("{}: {err}", err.user_message()))?;
        if let Some(path) = &args.save {
            save_source(path, &source)?;
        }
        println!("{source}");
        return Ok(());
    }

    window::run(config.window_config(), None, move |proxy| {
        prompt_loop(client, proxy, args)
    })
}

/// Runs on the window's feeder thread: submits the first prompt, then one
/// prompt per stdin line until `:quit`, end of input, or the window closing.
/// Each installed source is echoed to stdout.
fn prompt_loop(client: GeneratorClient, mut proxy: CanvasProxy, args: GenerateArgs) {
    let mut panel = ShaderPanel::new(client);
    let outcome = panel.submit(&args.prompt, &mut proxy);
    if !report(&panel, outcome, &mut io::stdout(), &mut io::stderr()) {
        return;
    }
    if let (Some(path), Some(source)) = (&args.save, panel.source()) {
        if let Err(err) = save_source(path, source) {
            eprintln!("{err:#}");
        }
    }

    eprintln!("Enter another prompt, `:clear` to reset the canvas, or `:quit` to exit.");
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let outcome = match line.trim() {
            "" => continue,
            ":quit" => break,
            ":clear" => panel.reset(&mut proxy),
            _ => panel.submit(&line, &mut proxy),
        };
        if !report(&panel, outcome, &mut io::stdout(), &mut io::stderr()) {
            return;
        }
    }
    let _ = proxy.shutdown();
}

/// Prints the outcome of one attempt: the installed source on success, the
/// user message on failure. Returns `false` once the window is gone.
fn report<G: ShaderGenerator>(
    panel: &ShaderPanel<G>,
    outcome: Result<(), AttemptError>,
    out: &mut impl Write,
    errors: &mut impl Write,
) -> bool {
    match outcome {
        Ok(()) => {
            if let Some(source) = panel.source() {
                let _ = writeln!(out, "{source}");
            }
            true
        }
        Err(AttemptError::Closed) => false,
        Err(err) => {
            let _ = writeln!(errors, "{}", err.user_message());
            true
        }
    }
}

fn save_source(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, source).with_context(|| format!("failed to save {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved generated shader");
    Ok(())
}

pub fn calc(args: CalcArgs) -> Result<()> {
    let mut calculator = Calculator::new();

    if !args.expressions.is_empty() {
        let failures = args
            .expressions
            .iter()
            .filter(|expression| !evaluate_line(&mut calculator, expression))
            .count();
        if failures > 0 {
            bail!(
                "{failures} of {} expressions failed",
                args.expressions.len()
            );
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        match line.trim() {
            "" => continue,
            ":quit" => break,
            ":last" => println!("{}", calculator.last_result()),
            ":history" => {
                for entry in calculator.history() {
                    println!("{} = {}", entry.expression, entry.result);
                }
            }
            expression => {
                evaluate_line(&mut calculator, expression);
            }
        }
    }
    Ok(())
}

fn evaluate_line(calculator: &mut Calculator, expression: &str) -> bool {
    match calculator.evaluate(expression) {
        Ok(result) => {
            println!("{} = {result}", expression.trim());
            true
        }
        Err(err) => {
            eprintln!("{}: {err}", expression.trim());
            false
        }
    }
}

pub fn show_config(loaded: &LoadedConfig) -> Result<()> {
    match (&loaded.path, config::default_path()) {
        (Some(path), _) => println!("# loaded from {}", path.display()),
        (None, Some(default)) => println!(
            "# built-in defaults (no file at {})",
            default.display()
        ),
        (None, None) => println!("# built-in defaults"),
    }
    let rendered =
        toml::to_string_pretty(&loaded.config).context("failed to serialise configuration")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use renderer::testing::{ManualFrameHost, RecordingGl};
    use renderer::{CanvasOptions, ShaderCanvas};
    use shadergen::{GenerationError, ShaderGenerator};

    use super::*;

    const SOURCE: &str = "attribute vec2 a_position;
void main() { gl_Position = vec4(a_position, 0.0, 1.0); }
// Fragment Shader
void main() { gl_FragColor = vec4(1.0); }";

    struct FixedGenerator(Option<&'static str>);

    impl ShaderGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.0.map(str::to_string).ok_or(GenerationError::Status {
                status: 500,
                body: "down".into(),
            })
        }
    }

    fn canvas() -> ShaderCanvas<RecordingGl, ManualFrameHost> {
        ShaderCanvas::new(
            RecordingGl::new(),
            ManualFrameHost::new(),
            CanvasOptions::default(),
        )
    }

    #[test]
    fn successful_attempt_echoes_source() {
        let mut canvas = canvas();
        let mut panel = ShaderPanel::new(FixedGenerator(Some(SOURCE)));
        let outcome = panel.submit("white", &mut canvas);

        let (mut out, mut errors) = (Vec::new(), Vec::new());
        assert!(report(&panel, outcome, &mut out, &mut errors));
        assert_eq!(String::from_utf8(out).unwrap(), format!("{SOURCE}\n"));
        assert!(errors.is_empty());
    }

    #[test]
    fn failed_attempt_prints_only_the_message() {
        let mut canvas = canvas();
        let mut panel = ShaderPanel::new(FixedGenerator(None));
        let outcome = panel.submit("white", &mut canvas);

        let (mut out, mut errors) = (Vec::new(), Vec::new());
        assert!(report(&panel, outcome, &mut out, &mut errors));
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(errors).unwrap(),
            "Error generating shader. Please try again.\n"
        );
    }

    #[test]
    fn reset_prints_nothing_and_closed_window_stops() {
        let mut canvas = canvas();
        let mut panel = ShaderPanel::new(FixedGenerator(Some(SOURCE)));
        panel.submit("white", &mut canvas).unwrap();
        let outcome = panel.reset(&mut canvas);

        let (mut out, mut errors) = (Vec::new(), Vec::new());
        assert!(report(&panel, outcome, &mut out, &mut errors));
        assert!(out.is_empty());
        assert!(!report(
            &panel,
            Err(AttemptError::Closed),
            &mut out,
            &mut errors
        ));
    }
}
