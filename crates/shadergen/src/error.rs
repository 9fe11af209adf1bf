use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid generator endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected generation response: {reason}")]
    Decode { reason: String },
}

impl GenerationError {
    /// The service's failure modes all look the same to the person typing.
    pub fn user_message(&self) -> &'static str {
        "Error generating shader. Please try again."
    }
}
