//! Exchange error taxonomy.

use thiserror::Error;

/// Failures talking to the exchange. Any variant aborts the current run;
/// actions already submitted stand, nothing is rolled back.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The request never produced a usable HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The exchange answered with an error payload.
    #[error("exchange rejected request ({status}): {message}")]
    Api { status: u16, message: String },
}
