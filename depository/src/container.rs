//! The main `Container` struct and its associated methods.

use crate::builder::Settings;
use crate::class::{Callable, Class, Injectable};
use crate::core::{Argument, Instance, ResolutionGuard, Target};
use crate::definition::{Concrete, Definition};
use crate::error::{Error, Result};
use crate::provider::{ProviderSource, ServiceProvider, SharedProvider};

use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// An unrealized registration.
#[derive(Clone)]
pub(crate) struct Item {
  pub(crate) definition: Definition,
  pub(crate) singleton: bool,
}

/// What a registration produced: the stored instance, or the definition that
/// will build the value on first resolution.
#[derive(Clone)]
pub enum Registered {
  Instance(Instance),
  Definition(Definition),
}

impl Registered {
  pub fn definition(&self) -> Option<&Definition> {
    match self {
      Registered::Definition(definition) => Some(definition),
      Registered::Instance(_) => None,
    }
  }

  pub fn instance(&self) -> Option<&Instance> {
    match self {
      Registered::Instance(instance) => Some(instance),
      Registered::Definition(_) => None,
    }
  }
}

impl fmt::Debug for Registered {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Registered::Instance(_) => write!(f, "Instance(..)"),
      Registered::Definition(definition) => write!(f, "{:?}", definition),
    }
  }
}

/// The depository.
///
/// Maps string keys to instances, singletons and definitions, follows aliases,
/// activates service providers on demand and builds declared classes and
/// callables by autowiring their parameters.
///
/// All methods take `&self`; the stores are concurrent maps, but sequences of
/// operations are not atomic and callers that share a container across
/// threads must serialize registration themselves.
pub struct Container {
  pub(crate) id: u64,
  items: DashMap<String, Item>,
  singletons: DashMap<String, Instance>,
  aliases: DashMap<String, String>,
  providers: RwLock<Vec<SharedProvider>>,
  classes: DashMap<String, Arc<Class>>,
  functions: DashMap<String, Callable>,
  pub(crate) settings: Settings,
  pub(crate) anonymous_callables: AtomicUsize,
}

impl Default for Container {
  fn default() -> Self {
    Self::with_settings(Settings::default())
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("items", &self.items.len())
      .field("singletons", &self.singletons.len())
      .field("aliases", &self.aliases.len())
      .field("providers", &self.providers.read().len())
      .field("classes", &self.classes.len())
      .finish_non_exhaustive()
  }
}

impl Container {
  /// Creates a new, empty `Container` with default settings.
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn with_settings(settings: Settings) -> Self {
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      items: DashMap::new(),
      singletons: DashMap::new(),
      aliases: DashMap::new(),
      providers: RwLock::new(Vec::new()),
      classes: DashMap::new(),
      functions: DashMap::new(),
      settings,
      anonymous_callables: AtomicUsize::new(0),
    }
  }

  // --- Registration ---

  /// Registers `concrete` under `key`. `None` registers `key` by its own name.
  ///
  /// Instances go straight to the singleton store (aliased from `key` when
  /// their type name differs). A name that is not invokable and differs from
  /// `key` turns `key` into an alias of that name. Everything else is stored
  /// as a definition that callers may keep adding arguments to.
  pub fn register(
    &self,
    key: &str,
    concrete: impl Into<Option<Concrete>>,
    singleton: bool,
  ) -> Result<Registered> {
    if self.is_registered(key) {
      return Err(Error::AlreadyRegistered {
        key: key.to_owned(),
      });
    }

    let concrete = concrete
      .into()
      .unwrap_or_else(|| Concrete::Name(key.to_owned()));

    match concrete {
      Concrete::Instance { type_name, value } => {
        let mut key = key.to_owned();
        if key != type_name {
          self.reject_alias_cycle(&key, type_name)?;
          self.insert_alias(&key, type_name);
          key = type_name.to_owned();
        }
        self.items.remove(&key);
        self.singletons.insert(key.clone(), value.clone());
        debug!(key = %key, "registered instance");
        Ok(Registered::Instance(value))
      }
      Concrete::Name(name) if name != key && !self.is_invokable(&name) => {
        self.reject_alias_cycle(key, &name)?;

        if self.is_registered(&name) {
          // The target already has a registration of its own; keep it.
          let existing = self.existing(&name, singleton)?;
          self.insert_alias(key, &name);
          return Ok(existing);
        }
        self.insert_alias(key, &name);
        Ok(self.insert_item(&name, Concrete::Name(name.clone()), singleton))
      }
      concrete => Ok(self.insert_item(key, concrete, singleton)),
    }
  }

  /// Registers `concrete` under `key` as a singleton.
  pub fn singleton(&self, key: &str, concrete: impl Into<Option<Concrete>>) -> Result<Registered> {
    self.register(key, concrete, true)
  }

  /// Turns an existing registration into a singleton without building it, or
  /// registers `concrete` as a singleton when nothing is registered.
  pub fn make_singleton(
    &self,
    key: &str,
    concrete: impl Into<Option<Concrete>>,
  ) -> Result<Registered> {
    let terminal = self.terminal_key(key)?;

    if let Some(mut item) = self.items.get_mut(&terminal) {
      item.singleton = true;
      debug!(key = %terminal, "definition marked as singleton");
      return Ok(Registered::Definition(item.definition.clone()));
    }
    if let Some(value) = self.singletons.get(&terminal) {
      return Ok(Registered::Instance(value.clone()));
    }

    self.register(&terminal, concrete, true)
  }

  /// Maps `alias` onto `key`.
  ///
  /// Fails when `alias` is already mapped, or when the mapping would close a
  /// cycle of aliases.
  pub fn alias(&self, alias: &str, key: &str) -> Result<&Self> {
    if let Some(existing) = self.aliases.get(alias) {
      return Err(Error::AliasAlreadyMapped {
        alias: alias.to_owned(),
        target: existing.clone(),
      });
    }

    let mut chain = vec![alias.to_owned()];
    chain.extend(self.alias_chain(key)?);
    if let Some(pos) = chain.iter().skip(1).position(|k| k == alias) {
      chain.truncate(pos + 2);
      return Err(Error::CircularDependency { chain });
    }

    self.insert_alias(alias, key);
    Ok(self)
  }

  /// Removes `key` from the registry. When `key` is an alias, its target is
  /// removed as well. Unknown keys are ignored.
  pub fn remove(&self, key: &str) -> &Self {
    self.singletons.remove(key);
    self.items.remove(key);

    if let Some((_, target)) = self.aliases.remove(key) {
      self.singletons.remove(&target);
      self.items.remove(&target);
    }

    debug!(key, "removed");
    self
  }

  /// Forgets every alias, singleton and definition. Providers and declared
  /// classes stay.
  pub fn clear(&self) -> &Self {
    self.aliases.clear();
    self.singletons.clear();
    self.items.clear();
    debug!("cleared");
    self
  }

  // --- Queries ---

  pub fn is_registered(&self, key: &str) -> bool {
    self.aliases.contains_key(key) || self.singletons.contains_key(key) || self.items.contains_key(key)
  }

  /// Whether `key` resolves, through any aliases, to a realized singleton or
  /// to a definition flagged as singleton.
  pub fn is_singleton(&self, key: &str) -> bool {
    let Ok(terminal) = self.terminal_key(key) else {
      return false;
    };
    self.singletons.contains_key(&terminal)
      || self
        .items
        .get(&terminal)
        .map(|item| item.singleton)
        .unwrap_or(false)
  }

  pub fn provider_count(&self) -> usize {
    self.providers.read().len()
  }

  // --- Resolution ---

  /// Resolves `target` with no explicit arguments.
  pub fn make(&self, target: impl Into<Target>) -> Result<Instance> {
    self.make_with(target, Vec::new())
  }

  /// Resolves `target`. Explicit arguments override accumulated definition
  /// arguments and bypass parameter inference; they are ignored for
  /// singletons that already exist.
  pub fn make_with(
    &self,
    target: impl Into<Target>,
    arguments: impl IntoIterator<Item = Argument>,
  ) -> Result<Instance> {
    let arguments: Vec<Argument> = arguments.into_iter().collect();

    match target.into() {
      Target::Name(name) => {
        self.activate_providers(&name)?;
        let _guard = ResolutionGuard::enter(
          self.id,
          &name,
          self.settings.max_depth,
          self.settings.detect_cycles,
        )?;
        self.make_name(&name, arguments)
      }
      target => {
        let definition = self.build_callable(target, &arguments)?;
        definition.create(self, arguments)
      }
    }
  }

  /// Resolves `target` and downcasts the value to `T`.
  pub fn resolve<T: Any + Send + Sync>(&self, target: impl Into<Target>) -> Result<Arc<T>> {
    self.resolve_with(target, Vec::new())
  }

  pub fn resolve_with<T: Any + Send + Sync>(
    &self,
    target: impl Into<Target>,
    arguments: impl IntoIterator<Item = Argument>,
  ) -> Result<Arc<T>> {
    let target = target.into();
    let key = target.name().unwrap_or("Callable").to_owned();
    self
      .make_with(target, arguments)?
      .downcast::<T>()
      .map_err(|_| Error::TypeMismatch {
        key,
        expected: type_name::<T>(),
      })
  }

  /// Resolves the key `type_name::<T>()`.
  pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve::<T>(type_name::<T>())
  }

  fn make_name(&self, name: &str, arguments: Vec<Argument>) -> Result<Instance> {
    if self.is_registered(name) {
      return self.registered_item(name, arguments);
    }

    if let Some(class) = self.class(name) {
      let definition = self.build_class(&class, &arguments)?;
      return definition.create(self, arguments);
    }

    let definition = self.build_callable(Target::Name(name.to_owned()), &arguments)?;
    definition.create(self, arguments)
  }

  fn registered_item(&self, key: &str, arguments: Vec<Argument>) -> Result<Instance> {
    if let Some(target) = self.aliases.get(key).map(|target| target.clone()) {
      trace!(alias = key, target = %target, "following alias");
      return self.make_with(target, arguments);
    }

    if let Some(value) = self.singletons.get(key).map(|value| value.clone()) {
      trace!(key, "singleton hit");
      return Ok(value);
    }

    let definition = match self.items.get(key) {
      Some(item) => item.definition.clone(),
      None => {
        return Err(Error::LookupMiss {
          target: key.to_owned(),
        })
      }
    };
    let value = definition.create(self, arguments)?;

    let promote = self
      .items
      .get(key)
      .map(|item| item.singleton)
      .unwrap_or(false);
    if promote {
      self.items.remove(key);
      self.singletons.insert(key.to_owned(), value.clone());
      debug!(key, "promoted to singleton");
    }

    Ok(value)
  }

  /// Resolves pending arguments into values, making every key argument.
  pub(crate) fn resolve_arguments(&self, arguments: &[Argument]) -> Result<Vec<Instance>> {
    arguments
      .iter()
      .map(|argument| match argument {
        Argument::Value(value) => Ok(value.clone()),
        Argument::Key(key) => self.make(key.as_str()),
      })
      .collect()
  }

  // --- Service Providers ---

  /// Adds a provider. Providers that declare no keys are initialized right
  /// away; the rest wait until one of their keys is requested.
  pub fn add_service_provider(&self, source: impl Into<ProviderSource>) -> Result<&Self> {
    let provider = match source.into() {
      ProviderSource::Instance(provider) => provider,
      ProviderSource::Class(name) => self
        .make(name.as_str())?
        .downcast::<SharedProvider>()
        .map(|provider| (*provider).clone())
        .map_err(|_| Error::TypeMismatch {
          key: name,
          expected: type_name::<SharedProvider>(),
        })?,
    };

    if provider.provides().is_empty() {
      debug!("initializing eager service provider");
      provider.initialize(self)?;
    }

    self.providers.write().push(provider);
    Ok(self)
  }

  /// Adds a provider value. See [`add_service_provider`](Self::add_service_provider).
  pub fn add_provider<P: ServiceProvider + 'static>(&self, provider: P) -> Result<&Self> {
    self.add_service_provider(ProviderSource::instance(provider))
  }

  // Runs matching providers until `key` is registered. Each provider runs at
  // most once per call; the next matching one is tried when it registers
  // nothing.
  fn activate_providers(&self, key: &str) -> Result<()> {
    let mut activated = Vec::new();
    while !self.is_registered(key) {
      match self.activate_provider(key, &activated)? {
        Some(index) => activated.push(index),
        None => break,
      }
    }
    Ok(())
  }

  fn activate_provider(&self, key: &str, skip: &[usize]) -> Result<Option<usize>> {
    let found = self
      .providers
      .read()
      .iter()
      .enumerate()
      .find(|(index, provider)| !skip.contains(index) && provider.provides_key(key))
      .map(|(index, provider)| (index, provider.clone()));

    match found {
      Some((index, provider)) => {
        debug!(key, index, "activating service provider");
        // Guarded under the provider, not the key, so `initialize` may make
        // the keys it registers but not re-enter itself.
        let _guard = ResolutionGuard::enter(
          self.id,
          &format!("provider[{}]", index),
          self.settings.max_depth,
          self.settings.detect_cycles,
        )?;
        provider.initialize(self)?;
        Ok(Some(index))
      }
      None => Ok(None),
    }
  }

  // --- Declarations ---

  /// Declares constructor metadata for a class, replacing any earlier
  /// declaration under the same name.
  pub fn declare_class(&self, class: Class) -> &Self {
    trace!(class = class.name(), "declared class");
    self.classes.insert(class.name().to_owned(), Arc::new(class));
    self
  }

  pub fn declare<T: Injectable>(&self) -> &Self {
    self.declare_class(T::class())
  }

  /// Declares a free function reachable by `name`.
  pub fn declare_function(&self, name: &str, callable: Callable) -> &Self {
    self
      .functions
      .insert(name.to_owned(), callable.with_name(name));
    self
  }

  pub fn has_class(&self, name: &str) -> bool {
    self.classes.contains_key(name)
  }

  pub fn class(&self, name: &str) -> Option<Arc<Class>> {
    self.classes.get(name).map(|class| class.clone())
  }

  /// Finds the callable a name refers to: a declared function, or a
  /// `Class::method` path to a static function of a declared class.
  pub fn find_callable(&self, name: &str) -> Option<Callable> {
    if let Some(function) = self.functions.get(name) {
      return Some(function.clone());
    }
    let (class, function) = name.rsplit_once("::")?;
    self
      .classes
      .get(class)
      .and_then(|class| class.static_function(function).cloned())
  }

  pub fn is_invokable(&self, name: &str) -> bool {
    self.find_callable(name).is_some()
  }

  // --- PRIVATE HELPERS ---

  fn insert_alias(&self, alias: &str, target: &str) {
    debug!(alias, target, "registered alias");
    self.aliases.insert(alias.to_owned(), target.to_owned());
  }

  fn insert_item(&self, key: &str, concrete: Concrete, singleton: bool) -> Registered {
    let definition = Definition::factory(key, concrete, self);
    self.items.insert(
      key.to_owned(),
      Item {
        definition: definition.clone(),
        singleton,
      },
    );
    debug!(key, singleton, "registered definition");
    Registered::Definition(definition)
  }

  // Returns what already sits behind `key`, flagging it as a singleton when asked.
  fn existing(&self, key: &str, singleton: bool) -> Result<Registered> {
    if singleton {
      return self.make_singleton(key, None);
    }
    let terminal = self.terminal_key(key)?;
    if let Some(value) = self.singletons.get(&terminal) {
      return Ok(Registered::Instance(value.clone()));
    }
    if let Some(item) = self.items.get(&terminal) {
      return Ok(Registered::Definition(item.definition.clone()));
    }
    Ok(self.insert_item(&terminal, Concrete::Name(terminal.clone()), false))
  }

  // Fails when mapping `key` onto `target` would close an alias cycle.
  fn reject_alias_cycle(&self, key: &str, target: &str) -> Result<()> {
    let chain = self.alias_chain(target)?;
    if chain.last().map(String::as_str) == Some(key) {
      let mut cycle = vec![key.to_owned()];
      cycle.extend(chain);
      return Err(Error::CircularDependency { chain: cycle });
    }
    Ok(())
  }

  // Follows aliases until a key that is not an alias.
  fn terminal_key(&self, key: &str) -> Result<String> {
    let mut chain = self.alias_chain(key)?;
    Ok(chain.pop().unwrap_or_else(|| key.to_owned()))
  }

  // `key` followed by every alias hop, ending at the terminal key.
  fn alias_chain(&self, key: &str) -> Result<Vec<String>> {
    let mut chain = vec![key.to_owned()];
    let mut cursor = key.to_owned();
    while let Some(next) = self.aliases.get(&cursor).map(|next| next.clone()) {
      let closes_cycle = chain.contains(&next);
      chain.push(next.clone());
      if closes_cycle {
        return Err(Error::CircularDependency { chain });
      }
      cursor = next;
    }
    Ok(chain)
  }
}
