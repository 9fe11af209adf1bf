//! Prompt panel: one prompt in, one shader attempt out.

use std::time::Instant;

use renderer::window::CanvasProxy;
use renderer::{FrameHost, GlBackend, ShaderCanvas, ShaderError};
use shadergen::{GenerationError, ShaderGenerator};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("canvas window is closed")]
    Closed,
}

impl AttemptError {
    pub fn user_message(&self) -> String {
        match self {
            AttemptError::EmptyPrompt => "Please enter a prompt".to_string(),
            AttemptError::Generation(err) => err.user_message().to_string(),
            AttemptError::Shader(err) => err.user_message(),
            AttemptError::Closed => "Canvas window closed".to_string(),
        }
    }
}

/// Where generated source ends up.
pub trait ShaderTarget {
    fn load(&mut self, source: &str) -> Result<(), AttemptError>;
    fn clear(&mut self) -> Result<(), AttemptError>;
}

impl<B: GlBackend, H: FrameHost> ShaderTarget for ShaderCanvas<B, H> {
    fn load(&mut self, source: &str) -> Result<(), AttemptError> {
        Ok(self.load_source(source, Instant::now())?)
    }

    fn clear(&mut self) -> Result<(), AttemptError> {
        self.teardown();
        Ok(())
    }
}

impl ShaderTarget for CanvasProxy {
    fn load(&mut self, source: &str) -> Result<(), AttemptError> {
        let outcome = CanvasProxy::load(self, source).map_err(|_| AttemptError::Closed)?;
        Ok(outcome?)
    }

    fn clear(&mut self) -> Result<(), AttemptError> {
        CanvasProxy::clear(self).map_err(|_| AttemptError::Closed)
    }
}

pub struct ShaderPanel<G> {
    generator: G,
    prompt: String,
    source: Option<String>,
    error: Option<String>,
}

impl<G: ShaderGenerator> ShaderPanel<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            prompt: String::new(),
            source: None,
            error: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Source returned by the last successful generation.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Message for the last failed attempt, cleared by the next submit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Generates source for `prompt` and loads it into `target`. A failure at
    /// any step is recorded as the panel error and returned; generation
    /// failures never reach the target.
    pub fn submit<T: ShaderTarget>(&mut self, prompt: &str, target: &mut T) -> Result<(), AttemptError> {
        self.prompt = prompt.to_string();
        self.error = None;
        let outcome = self.attempt(target);
        if let Err(err) = &outcome {
            warn!(error = %err, "shader attempt failed");
            self.error = Some(err.user_message());
        }
        outcome
    }

    fn attempt<T: ShaderTarget>(&mut self, target: &mut T) -> Result<(), AttemptError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(AttemptError::EmptyPrompt);
        }
        let source = self.generator.generate(prompt)?;
        let source = self.source.insert(source);
        target.load(source)?;
        info!(prompt, "shader from prompt installed");
        Ok(())
    }

    /// Forgets prompt, source, and error and clears `target`.
    pub fn reset<T: ShaderTarget>(&mut self, target: &mut T) -> Result<(), AttemptError> {
        self.prompt.clear();
        self.source = None;
        self.error = None;
        target.clear()
    }
}
