use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "textshader",
    author,
    version,
    about = "Turn text prompts into live GLSL shaders"
)]
pub struct Cli {
    /// Configuration file; defaults to `<config dir>/textshader/config.toml`.
    #[arg(long, global = true, value_name = "FILE", env = "TEXTSHADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Generation service endpoint, overriding `[generator].endpoint`.
    #[arg(long, global = true, value_name = "URL", env = "TEXTSHADER_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a shader source file in a window until it is closed.
    Render(RenderArgs),
    /// Generate a shader from a prompt and render it; further prompts are read from stdin.
    Generate(GenerateArgs),
    /// Evaluate arithmetic expressions.
    Calc(CalcArgs),
    /// Print the resolved configuration.
    Config,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// File holding the vertex stage, the separator line, and the fragment stage.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Description of the effect to generate.
    #[arg(value_name = "PROMPT")]
    pub prompt: String,

    /// Write the generated source to stdout and exit without opening a window.
    #[arg(long)]
    pub print: bool,

    /// Save the first generated source to this path.
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CalcArgs {
    /// Expressions to evaluate; reads lines from stdin when none are given.
    #[arg(value_name = "EXPR", allow_hyphen_values = true)]
    pub expressions: Vec<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
