use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyLightError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Allocation Infeasible: {available} LEDs cannot light {keys} keys")]
    AllocationInfeasible { available: usize, keys: usize },

    #[error("Settings Store Error: {0}")]
    Store(String),
}

impl KeyLightError {
    /// True for errors that reject a configuration before any allocation runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            KeyLightError::Config(_) | KeyLightError::AllocationInfeasible { .. }
        )
    }
}

pub type KlResult<T> = Result<T, KeyLightError>;
