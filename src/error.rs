use thiserror::Error;

/// Errors raised while building, interning or analysing terms.
///
/// Rule inapplicability and an exhausted search budget are not errors:
/// the former is reported as [`None`] by [`Rule::apply`](crate::Rule::apply),
/// the latter as a [`StopReason`](crate::StopReason).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two terms built from different connectors were combined.
    #[error("cannot combine `{left}` with `{right}`: they were built from different connectors")]
    ConnectorMismatch {
        /// Printed form of the left-hand term.
        left: String,
        /// Printed form of the right-hand term.
        right: String,
    },
    /// A term was reached again while it was still being analysed.
    #[error("cycle detected: `{0}` was revisited while still being analysed")]
    Cycle(String),
    /// Malformed s-expression input.
    #[error("failed to parse term: {0}")]
    Parse(String),
}

/// Result type with [`Error`] as the default error.
pub type Result<T, E = Error> = std::result::Result<T, E>;
