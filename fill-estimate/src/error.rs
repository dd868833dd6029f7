use thiserror::Error;

/// Result type alias for estimation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole batch or reject a resolver table.
///
/// Per-group outcomes such as "no data" or "unsupported resolver" are not
/// errors; they are carried by [`crate::Estimate`].
#[derive(Error, Debug)]
pub enum Error {
    /// A probe record arrived without a response timestamp
    #[error(
        "record {index} ({domain} from {vantage_point} via {resolver}) has no arrival time"
    )]
    MissingArrivalTime {
        /// Position of the record in the input batch
        index: usize,
        domain: String,
        vantage_point: String,
        resolver: String,
    },

    /// Resolver table failed validation
    #[error("invalid resolver table: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
