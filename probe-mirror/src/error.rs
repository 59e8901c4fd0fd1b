//! Errors raised while defining classes.

use thiserror::Error;

use probe_core::LoaderId;

/// Failure to define a class in a [`crate::ClassLoader`].
#[derive(Debug, Error)]
pub enum DefineError {
    /// Class names cannot be blank.
    #[error("class name cannot be blank")]
    BlankName,

    /// The loader already defines a class with this name.
    #[error("class '{name}' is already defined by {loader}")]
    Duplicate {
        /// Name that was being defined
        name: String,
        /// Loader that already holds it
        loader: LoaderId,
    },
}
