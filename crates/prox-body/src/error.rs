//! Body construction errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body '{id}' declares {pairs} segment pairs but {thicknesses} thicknesses")]
    MismatchedThicknesses {
        id: String,
        pairs: usize,
        thicknesses: usize,
    },

    #[error("body '{0}' declares a negative thickness")]
    NegativeThickness(String),

    #[error("robot '{0}' must have a strictly positive message frequency")]
    ZeroMessageFrequency(String),
}
