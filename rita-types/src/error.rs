use thiserror::Error;

/// Misuse the caller can recover from. Mirrors the `assert`-driven checks in
/// the original header, but returned to the caller instead of aborting the
/// process - the one exception being [`RitaError::InternalFatal`], which
/// still indicates a bug rather than a runtime condition and is only ever
/// constructed, never expected to be handled.
#[derive(Debug, Error)]
pub enum RitaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("precondition unmet: {0}")]
    PreconditionUnmet(&'static str),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),

    #[error("internal fatal error: {0}")]
    InternalFatal(&'static str),
}

/// Errors specific to texture operations, folded into [`RitaError`] at the
/// context boundary via `From`.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("cannot create a subtexture of a subtexture")]
    NestedSubtexture,
    #[error("subtexture region is out of bounds of its parent")]
    OutOfBounds,
}

impl From<TextureError> for RitaError {
    fn from(e: TextureError) -> Self {
        match e {
            TextureError::NestedSubtexture => {
                RitaError::InvalidArgument("cannot create a subtexture of a subtexture")
            }
            TextureError::OutOfBounds => {
                RitaError::InvalidArgument("subtexture region is out of bounds of its parent")
            }
        }
    }
}

pub type RitaResult<T> = Result<T, RitaError>;
