use thiserror::Error;
use uuid::Uuid;

/// Malformed input rejected at the boundary, before any computation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("domain '{domain}' is empty: count must be positive")]
    EmptyDomain { domain: String },

    #[error("domain '{domain}' has min {min} greater than max {max}")]
    InvertedRange { domain: String, min: u32, max: u32 },

    #[error("domain '{domain}' range [{min}, {max}] has more candidates than fit in u32")]
    RangeTooLarge { domain: String, min: u32, max: u32 },

    #[error("domain '{domain}' draws {count} numbers from only {size} candidates")]
    CountExceedsRange { domain: String, count: u32, size: u32 },

    #[error("domain '{domain}' bonus pool draws {count} numbers from only {max} candidates")]
    InvalidBonusPool { domain: String, count: u32, max: u32 },

    #[error("draw {draw_id} has no numbers")]
    EmptyDraw { draw_id: Uuid },

    #[error("draw {draw_id} contains {number}, outside [{min}, {max}]")]
    NumberOutOfRange {
        draw_id: Uuid,
        number: u32,
        min: u32,
        max: u32,
    },

    #[error("weight for strategy '{strategy}' is {weight}; weights must be finite and non-negative")]
    InvalidWeight { strategy: String, weight: f64 },

    #[error("unknown domain '{0}'")]
    UnknownDomain(String),

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by an external collaborator (history/outcome source or sink).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("history unavailable: {0}")]
    History(String),

    #[error("outcomes unavailable: {0}")]
    Outcomes(String),

    #[error("sink '{sink}' failed: {reason}")]
    Sink { sink: String, reason: String },

    #[error(transparent)]
    Input(#[from] InputError),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Serialize(e.to_string())
    }
}
