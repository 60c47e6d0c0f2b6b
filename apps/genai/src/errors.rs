use thiserror::Error;

/// Failures surfaced by the generative client.
///
/// Placeholder mode (no credential) never fails; it returns placeholder
/// content instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A credential is set but no model could be resolved at startup.
    #[error("No usable generative model could be initialized")]
    NoUsableModel,

    #[error("Model '{model}' is unavailable and no fallback model could be selected")]
    ModelUnavailable { model: String },

    #[error("Provider quota exceeded after {attempts} attempts: {details}")]
    QuotaExceeded { attempts: u32, details: String },

    /// Structured generation only. `raw` is the reply exactly as received.
    #[error("Failed to parse structured response: {reason}")]
    Parse { reason: String, raw: String },

    #[error("Provider error: {0}")]
    Provider(String),
}

impl GenerationError {
    /// Short machine-readable code, used when callers report the failure upstream.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::NoUsableModel => "NO_USABLE_MODEL",
            GenerationError::ModelUnavailable { .. } => "MODEL_UNAVAILABLE",
            GenerationError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            GenerationError::Parse { .. } => "PARSE_ERROR",
            GenerationError::Provider(_) => "PROVIDER_ERROR",
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, GenerationError::QuotaExceeded { .. })
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
