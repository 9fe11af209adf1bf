//! Client for the remote shader-generation service.
//!
//! The service accepts `POST {endpoint}` with `{"prompt": "..."}` and answers
//! `{"shaderCode": "..."}`: a vertex stage, a sentinel line, and a fragment
//! stage in one blob. This crate only moves text; splitting and compiling are
//! the renderer's job.

mod client;
mod error;
#[cfg(feature = "testing")]
pub mod testing;

pub use client::{
    GenerateRequest, GenerateResponse, GeneratorClient, GeneratorConfig, DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT,
};
pub use error::GenerationError;
pub use reqwest::Url;

/// Anything that can turn a prompt into shader source.
pub trait ShaderGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<T: ShaderGenerator + ?Sized> ShaderGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}
