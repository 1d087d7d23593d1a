use thiserror::Error;

/// Reasons a pose solve produced nothing usable.
///
/// The public solver functions collapse these into `None`; they are kept
/// typed so debug logs say what went wrong.
#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum PnpError {
    #[error("need at least {needed} correspondences, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },
    #[error("object and image point counts differ ({object} vs {image})")]
    LengthMismatch { object: usize, image: usize },
    #[error("degenerate geometry: {0}")]
    Degenerate(&'static str),
    #[error("non-finite reprojection error")]
    NonFinite,
}
