use thiserror::Error;

/// The error-kind taxonomy the whole crate reasons about (§7). Callers
/// branch on the variant, never on the message text.
#[derive(Debug, Error)]
pub enum CoreError {
    /// StateStore I/O failed. Callers retry once, then degrade to
    /// in-memory-only for the rest of the request.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Network, 5xx, timeout or rate-limit from a provider. The router
    /// tries the next provider in line.
    #[error("provider '{provider}' transient failure: {reason}")]
    ProviderTransient { provider: String, reason: String },

    /// Auth, bad request, or policy rejection from a provider. No
    /// alternates are tried.
    #[error("provider '{provider}' permanent failure: {reason}")]
    ProviderPermanent { provider: String, reason: String },

    /// Outbound platform-action failure that is worth retrying
    /// (network blip, 5xx from the platform).
    #[error("platform action transient failure: {0}")]
    PlatformTransient(String),

    /// Forbidden/NotFound from the platform. Recorded and given up on.
    #[error("platform action permanent failure: {kind}")]
    PlatformPermanent { kind: PlatformErrorKind },

    /// A safety detector itself failed (not: detected a violation).
    /// Treated as fail-open — no violation, no punishment.
    #[error("safety detection error: {0}")]
    SafetyDetectionError(String),

    /// The request's deadline elapsed or an explicit shutdown signal fired.
    #[error("request cancelled")]
    Cancelled,

    /// Configuration failed to load or validate. Fatal at startup only.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Standard error-kind enumeration returned by every `PlatformActions`
/// method (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    Forbidden,
    NotFound,
    RateLimited,
    Network,
    Other,
}

impl std::fmt::Display for PlatformErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlatformErrorKind::Forbidden => "forbidden",
            PlatformErrorKind::NotFound => "not_found",
            PlatformErrorKind::RateLimited => "rate_limited",
            PlatformErrorKind::Network => "network",
            PlatformErrorKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl CoreError {
    /// Short, stable code for structured logging and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            CoreError::ProviderTransient { .. } => "PROVIDER_TRANSIENT",
            CoreError::ProviderPermanent { .. } => "PROVIDER_PERMANENT",
            CoreError::PlatformTransient(_) => "PLATFORM_TRANSIENT",
            CoreError::PlatformPermanent { .. } => "PLATFORM_PERMANENT",
            CoreError::SafetyDetectionError(_) => "SAFETY_DETECTION_ERROR",
            CoreError::Cancelled => "CANCELLED",
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
            CoreError::Io(_) => "IO_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the pipeline should try the next provider/attempt rather
    /// than giving up immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::StoreUnavailable(_)
                | CoreError::ProviderTransient { .. }
                | CoreError::PlatformTransient(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
