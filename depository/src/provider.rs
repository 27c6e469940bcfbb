//! Service providers: bundles of registrations activated eagerly at boot or
//! lazily the first time one of their keys is requested.

use crate::container::Container;
use crate::error::Result;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A deferred bulk-registration action.
///
/// A provider that [`provides`](ServiceProvider::provides) nothing is
/// initialized as soon as it is added. Otherwise the container initializes it
/// the first time one of its keys is requested and is not yet registered.
/// The container does not guard against initializing a provider twice.
pub trait ServiceProvider: Send + Sync {
  /// Keys this provider registers when initialized.
  fn provides(&self) -> &HashSet<String>;

  /// Performs the registrations.
  fn initialize(&self, container: &Container) -> Result<()>;

  fn provides_key(&self, key: &str) -> bool {
    self.provides().contains(key)
  }
}

/// The shape a class-made provider must resolve to.
pub type SharedProvider = Arc<dyn ServiceProvider>;

/// A provider assembled from a key set and a closure.
pub struct FnProvider<F> {
  provides: HashSet<String>,
  initialize: F,
}

impl<F> FnProvider<F>
where
  F: Fn(&Container) -> Result<()> + Send + Sync,
{
  /// A lazy provider registering `provides` when first needed.
  pub fn new<I, S>(provides: I, initialize: F) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      provides: provides.into_iter().map(Into::into).collect(),
      initialize,
    }
  }

  /// A provider with no declared keys, initialized as soon as it is added.
  pub fn eager(initialize: F) -> Self {
    Self {
      provides: HashSet::new(),
      initialize,
    }
  }
}

impl<F> ServiceProvider for FnProvider<F>
where
  F: Fn(&Container) -> Result<()> + Send + Sync,
{
  fn provides(&self) -> &HashSet<String> {
    &self.provides
  }

  fn initialize(&self, container: &Container) -> Result<()> {
    (self.initialize)(container)
  }
}

/// What [`Container::add_service_provider`] accepts: a provider, or the name
/// of a class that builds one.
pub enum ProviderSource {
  Instance(SharedProvider),
  Class(String),
}

impl ProviderSource {
  pub fn instance<P: ServiceProvider + 'static>(provider: P) -> Self {
    ProviderSource::Instance(Arc::new(provider))
  }
}

impl fmt::Debug for ProviderSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProviderSource::Instance(_) => write!(f, "Instance(..)"),
      ProviderSource::Class(name) => write!(f, "Class({})", name),
    }
  }
}

impl From<SharedProvider> for ProviderSource {
  fn from(provider: SharedProvider) -> Self {
    ProviderSource::Instance(provider)
  }
}

impl From<&str> for ProviderSource {
  fn from(name: &str) -> Self {
    ProviderSource::Class(name.to_owned())
  }
}

impl From<String> for ProviderSource {
  fn from(name: String) -> Self {
    ProviderSource::Class(name)
  }
}
