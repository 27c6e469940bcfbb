use crate::container::Container;
use crate::error::BuildError;

use core::fmt;

const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
  pub(crate) max_depth: usize,
  pub(crate) detect_cycles: bool,
  pub(crate) shared_callable_key: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
      detect_cycles: true,
      shared_callable_key: false,
    }
  }
}

/// A builder for configuring a [`Container`].
///
/// ```
/// use fibre_depository::ContainerBuilder;
///
/// let container = ContainerBuilder::new()
///   .max_depth(32)
///   .shared_callable_key(true)
///   .build()
///   .unwrap();
/// assert!(!container.is_registered("anything"));
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
  settings: Settings,
}

impl fmt::Debug for ContainerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerBuilder")
      .field("max_depth", &self.settings.max_depth)
      .field("detect_cycles", &self.settings.detect_cycles)
      .field("shared_callable_key", &self.settings.shared_callable_key)
      .finish()
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets how many keys may be under resolution at once on one thread before
  /// `make` gives up with `DepthExceeded`.
  pub fn max_depth(mut self, depth: usize) -> Self {
    self.settings.max_depth = depth;
    self
  }

  /// Enables or disables circular dependency detection. When disabled, a
  /// cycle runs until the depth limit is hit.
  pub fn detect_cycles(mut self, enabled: bool) -> Self {
    self.settings.detect_cycles = enabled;
    self
  }

  /// When set, every anonymous callable shares the `"Callable"` key instead
  /// of receiving a unique `Callable#<n>` key.
  pub fn shared_callable_key(mut self, shared: bool) -> Self {
    self.settings.shared_callable_key = shared;
    self
  }

  pub fn build(self) -> Result<Container, BuildError> {
    if self.settings.max_depth == 0 {
      return Err(BuildError::ZeroDepth);
    }
    Ok(Container::with_settings(self.settings))
  }
}
