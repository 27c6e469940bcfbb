//! Core value types shared by every part of the depository.

use crate::class::Callable;
use crate::error::{Error, Result};

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// A produced value. Everything the container hands out is one of these.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a value into an [`Instance`].
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
  Arc::new(value)
}

thread_local! {
  // Keys currently being resolved on this thread, tagged with the id of the
  // container resolving them. Used to report circular dependencies instead of
  // overflowing the stack.
  static RESOLVING_STACK: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// An RAII guard tracking one key on the thread-local resolution stack.
///
/// Entering a key that the same container is already resolving on this thread
/// fails with [`Error::CircularDependency`]. Dropping the guard pops the key.
pub(crate) struct ResolutionGuard {
  container_id: u64,
}

impl ResolutionGuard {
  pub(crate) fn enter(
    container_id: u64,
    key: &str,
    max_depth: usize,
    detect_cycles: bool,
  ) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let active: Vec<&str> = stack
        .iter()
        .filter(|(id, _)| *id == container_id)
        .map(|(_, k)| k.as_str())
        .collect();

      if detect_cycles && active.contains(&key) {
        let mut chain: Vec<String> = active
          .iter()
          .skip_while(|k| **k != key)
          .map(|k| k.to_string())
          .collect();
        chain.push(key.to_owned());
        return Err(Error::CircularDependency { chain });
      }
      if active.len() >= max_depth {
        return Err(Error::DepthExceeded {
          key: key.to_owned(),
          depth: max_depth,
        });
      }

      stack.push((container_id, key.to_owned()));
      Ok(Self { container_id })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(pos) = stack.iter().rposition(|(id, _)| *id == self.container_id) {
        stack.remove(pos);
      }
    });
  }
}

/// A pending argument of a definition or of a `make` call.
#[derive(Clone)]
pub enum Argument {
  /// Passed through to the constructor as-is.
  Value(Instance),
  /// Resolved with `Container::make` when the definition is created.
  Key(String),
}

impl Argument {
  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Argument::Value(Arc::new(value))
  }

  pub fn key(key: impl Into<String>) -> Self {
    Argument::Key(key.into())
  }
}

impl fmt::Debug for Argument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Argument::Value(_) => write!(f, "Value(..)"),
      Argument::Key(key) => write!(f, "Key({})", key),
    }
  }
}

impl From<Instance> for Argument {
  fn from(value: Instance) -> Self {
    Argument::Value(value)
  }
}

/// Resolved arguments handed to constructors, callables and factories.
#[derive(Clone, Default)]
pub struct Arguments {
  target: String,
  values: Vec<Instance>,
}

impl Arguments {
  pub(crate) fn new(target: impl Into<String>, values: Vec<Instance>) -> Self {
    Self {
      target: target.into(),
      values,
    }
  }

  /// The key of the definition these arguments were resolved for.
  pub fn target(&self) -> &str {
    &self.target
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Returns the raw value at `index`.
  pub fn raw(&self, index: usize) -> Result<&Instance> {
    self.values.get(index).ok_or_else(|| Error::MissingArgument {
      index,
      target: self.target.clone(),
    })
  }

  /// Returns the value at `index` downcast to `T`.
  pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    self
      .raw(index)?
      .clone()
      .downcast::<T>()
      .map_err(|_| Error::TypeMismatch {
        key: format!("{}[{}]", self.target, index),
        expected: type_name::<T>(),
      })
  }

  /// Like [`get`](Self::get) but clones the value out of its `Arc`.
  pub fn cloned<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T> {
    self.get::<T>(index).map(|value| (*value).clone())
  }

  pub fn into_vec(self) -> Vec<Instance> {
    self.values
  }
}

impl fmt::Debug for Arguments {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Arguments")
      .field("target", &self.target)
      .field("len", &self.values.len())
      .finish()
  }
}

/// What `Container::make` is asked to produce.
#[derive(Clone)]
pub enum Target {
  /// A registered key, an alias, a declared class, a `Class::method` path or
  /// the name of a declared function.
  Name(String),
  /// An invokable described by its parameter metadata.
  Callable(Callable),
}

impl Target {
  pub(crate) fn name(&self) -> Option<&str> {
    match self {
      Target::Name(name) => Some(name),
      Target::Callable(_) => None,
    }
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Name(name) => write!(f, "Name({})", name),
      Target::Callable(callable) => write!(f, "Callable({:?})", callable.name()),
    }
  }
}

impl From<&str> for Target {
  fn from(name: &str) -> Self {
    Target::Name(name.to_owned())
  }
}

impl From<String> for Target {
  fn from(name: String) -> Self {
    Target::Name(name)
  }
}

impl From<&String> for Target {
  fn from(name: &String) -> Self {
    Target::Name(name.clone())
  }
}

impl From<Callable> for Target {
  fn from(callable: Callable) -> Self {
    Target::Callable(callable)
  }
}
