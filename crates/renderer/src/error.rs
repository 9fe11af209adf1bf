use thiserror::Error;

use crate::types::StageKind;

/// Raised when a shader blob cannot be divided into its two stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid shader code format: separator line not found")]
    MissingSentinel,
    #[error("invalid shader code format: separator line appears {count} times")]
    DuplicateSentinel { count: usize },
    #[error("invalid shader code format: {stage} stage is empty")]
    EmptyStage { stage: StageKind },
}

/// Everything that can go wrong while turning source text into an installed
/// program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: StageKind, log: String },
    #[error("shader program failed to link: {log}")]
    Link { log: String },
    #[error("failed to create {what}: {reason}")]
    Allocation { what: &'static str, reason: String },
}

impl ShaderError {
    /// Message suitable for showing next to the canvas.
    pub fn user_message(&self) -> String {
        match self {
            ShaderError::Format(_) => "Invalid shader code format".to_string(),
            ShaderError::Compile { log, .. } => format!("Shader compilation error: {log}"),
            ShaderError::Link { log } => format!("Shader program linking error: {log}"),
            ShaderError::Allocation { what, .. } => format!("Failed to create {what}"),
        }
    }

    pub fn stage(&self) -> Option<StageKind> {
        match self {
            ShaderError::Compile { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
