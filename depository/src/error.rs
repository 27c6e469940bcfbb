use thiserror::Error;

/// Errors raised while registering or resolving entries.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Key {key} has already been registered")]
  AlreadyRegistered { key: String },

  #[error("Alias {alias} has already been mapped to {target}")]
  AliasAlreadyMapped { alias: String, target: String },

  #[error("Target [{class}] is not instantiable")]
  NotInstantiable { class: String },

  #[error("Unable to resolve dependency ${parameter} for {target}")]
  UnresolvableDependency { parameter: String, target: String },

  #[error("Nothing is registered, declared or invokable under '{target}'")]
  LookupMiss { target: String },

  #[error("Circular dependency detected: {}", chain.join(" -> "))]
  CircularDependency { chain: Vec<String> },

  #[error("Resolution of '{key}' exceeded the maximum depth of {depth}")]
  DepthExceeded { key: String, depth: usize },

  #[error("Value resolved for '{key}' is not a {expected}")]
  TypeMismatch { key: String, expected: &'static str },

  #[error("Missing argument #{index} for {target}")]
  MissingArgument { index: usize, target: String },

  #[error("Failed to construct {target}: {reason}")]
  Construction { target: String, reason: String },
}

impl Error {
  /// Convenience for constructors and factories reporting their own failures.
  pub fn construction(target: impl Into<String>, reason: impl ToString) -> Self {
    Error::Construction {
      target: target.into(),
      reason: reason.to_string(),
    }
  }
}

/// A specialized `Result` type for depository operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur when building a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// Resolution depth must allow at least one level.
  #[error("maximum resolution depth cannot be zero")]
  ZeroDepth,
}
