// THEORY:
// Every failure the core can report lives in one enum. Out-of-range levels fed
// straight into the renderer are not represented here: they are a caller
// contract violation, not a runtime error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BinError {
    /// A control source named a waste type that has no compartment.
    #[error("unknown waste type `{0}` (expected `biomedical` or `general`)")]
    UnknownWasteKind(String),

    /// The renderer cannot be built with this layout. Fatal to the session.
    #[error("invalid bin geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid animation config: {0}")]
    InvalidAnimation(String),

    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The display sink refused a frame.
    #[error("display sink failed: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, BinError>;
