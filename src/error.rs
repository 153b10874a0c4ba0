//! Errors raised while wiring and running components.

use thiserror::Error;

/// Things that can go wrong when running a component.
///
/// None of these are recovered from internally. They surface from
/// `Now::run` and `Component::run` to whoever bootstraps the application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The model produced a different number of feedback behaviors than
    /// placeholders were declared for.
    #[error("feedback arity mismatch: {expected} placeholders declared, model produced {found}")]
    ArityMismatch {
        /// Number of placeholder slots allocated.
        expected: usize,
        /// Number of behaviors the model returned.
        found: usize,
    },

    /// A placeholder was sampled before it was replaced.
    #[error("sampled a placeholder behavior before it was replaced")]
    Unresolved,

    /// A placeholder was replaced a second time.
    #[error("placeholder behavior has already been replaced")]
    AlreadyReplaced,

    /// `run_main` could not find the node to mount on.
    #[error("no mount node with id `{0}`")]
    MountNotFound(String),
}

/// Shorthand for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;
