//! Deferred recipes for producing values.

use crate::autowire::wire_parameters;
use crate::class::Callable;
use crate::container::Container;
use crate::core::{Argument, Arguments, Instance};
use crate::error::{Error, Result};

use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A factory closure. Unlike a [`Callable`] it sees the container and is never
/// autowired; it receives exactly the arguments accumulated or passed to `make`.
pub type Factory = Arc<dyn Fn(&Container, Arguments) -> Result<Instance> + Send + Sync>;

/// Everything that can be registered under a key.
#[derive(Clone)]
pub enum Concrete {
  /// A class name, another key to alias, a `Class::method` path or the name
  /// of a declared function.
  Name(String),
  /// An invokable with declared parameters.
  Callable(Callable),
  /// An already-built value together with its type name.
  Instance {
    type_name: &'static str,
    value: Instance,
  },
  /// A factory closure.
  Closure(Factory),
}

impl Concrete {
  pub fn name(name: impl Into<String>) -> Self {
    Concrete::Name(name.into())
  }

  pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
    Concrete::Instance {
      type_name: type_name::<T>(),
      value: Arc::new(value),
    }
  }

  /// An already shared value. The container hands out this very `Arc`.
  pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Concrete::Instance {
      type_name: type_name::<T>(),
      value,
    }
  }

  pub fn closure<F>(factory: F) -> Self
  where
    F: Fn(&Container, Arguments) -> Result<Instance> + Send + Sync + 'static,
  {
    Concrete::Closure(Arc::new(factory))
  }
}

impl fmt::Debug for Concrete {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Concrete::Name(name) => write!(f, "Name({})", name),
      Concrete::Callable(callable) => write!(f, "Callable({:?})", callable.name()),
      Concrete::Instance { type_name, .. } => write!(f, "Instance({})", type_name),
      Concrete::Closure(_) => write!(f, "Closure"),
    }
  }
}

impl From<&str> for Concrete {
  fn from(name: &str) -> Self {
    Concrete::Name(name.to_owned())
  }
}

impl From<String> for Concrete {
  fn from(name: String) -> Self {
    Concrete::Name(name)
  }
}

impl From<Callable> for Concrete {
  fn from(callable: Callable) -> Self {
    Concrete::Callable(callable)
  }
}

#[derive(Clone)]
struct MethodCall {
  method: String,
  arguments: Vec<Argument>,
}

#[derive(Clone)]
enum DefinitionKind {
  Class { class: String, calls: Vec<MethodCall> },
  Callable(Callable),
  Closure(Factory),
}

struct DefinitionState {
  key: String,
  kind: DefinitionKind,
  arguments: Vec<Argument>,
}

/// A concrete plus the arguments accumulated for it.
///
/// Cloning a `Definition` clones the handle, not the recipe: arguments added
/// through any clone are seen by the container entry it was registered under.
#[derive(Clone)]
pub struct Definition {
  inner: Arc<Mutex<DefinitionState>>,
}

impl Definition {
  fn from_kind(key: impl Into<String>, kind: DefinitionKind) -> Self {
    Self {
      inner: Arc::new(Mutex::new(DefinitionState {
        key: key.into(),
        kind,
        arguments: Vec::new(),
      })),
    }
  }

  pub(crate) fn class(key: impl Into<String>, class: impl Into<String>) -> Self {
    Self::from_kind(
      key,
      DefinitionKind::Class {
        class: class.into(),
        calls: Vec::new(),
      },
    )
  }

  pub(crate) fn callable(key: impl Into<String>, callable: Callable) -> Self {
    Self::from_kind(key, DefinitionKind::Callable(callable))
  }

  /// Builds the right kind of definition for `concrete`.
  pub fn factory(key: &str, concrete: Concrete, container: &Container) -> Self {
    match concrete {
      Concrete::Name(name) => match container.find_callable(&name) {
        Some(callable) => Self::callable(key, callable),
        None => Self::class(key, name),
      },
      Concrete::Callable(callable) => Self::callable(key, callable),
      Concrete::Closure(factory) => Self::from_kind(key, DefinitionKind::Closure(factory)),
      Concrete::Instance { value, .. } => Self::from_kind(
        key,
        DefinitionKind::Closure(Arc::new(move |_: &Container, _: Arguments| Ok(value.clone()))),
      ),
    }
  }

  pub fn key(&self) -> String {
    self.inner.lock().key.clone()
  }

  /// Appends a pending argument.
  pub fn with(&self, argument: impl Into<Argument>) -> &Self {
    self.inner.lock().arguments.push(argument.into());
    self
  }

  pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> &Self {
    self.with(Argument::value(value))
  }

  /// Appends a dependency resolved through the container at creation time.
  pub fn with_key(&self, key: impl Into<String>) -> &Self {
    self.with(Argument::key(key))
  }

  /// Schedules `method` to run on the built instance. Ignored for callable
  /// and closure definitions.
  pub fn call(&self, method: impl Into<String>, arguments: Vec<Argument>) -> &Self {
    let mut guard = self.inner.lock();
    let state = &mut *guard;
    match &mut state.kind {
      DefinitionKind::Class { calls, .. } => calls.push(MethodCall {
        method: method.into(),
        arguments,
      }),
      _ => tracing::warn!(
        key = %state.key,
        "method calls are only supported on class definitions; ignoring"
      ),
    }
    self
  }

  pub fn arguments(&self) -> Vec<Argument> {
    self.inner.lock().arguments.clone()
  }

  /// Realizes the definition. Non-empty `overrides` replace the accumulated
  /// arguments entirely.
  pub fn create(&self, container: &Container, overrides: Vec<Argument>) -> Result<Instance> {
    let (key, kind, accumulated) = {
      let state = self.inner.lock();
      (state.key.clone(), state.kind.clone(), state.arguments.clone())
    };
    let arguments = if overrides.is_empty() {
      accumulated
    } else {
      overrides
    };

    match kind {
      DefinitionKind::Class { class, calls } => {
        let descriptor = container
          .class(&class)
          .ok_or_else(|| Error::LookupMiss {
            target: class.clone(),
          })?;
        if !descriptor.is_instantiable() {
          return Err(Error::NotInstantiable { class });
        }

        let arguments = match descriptor.constructor_params() {
          Some(params) if arguments.is_empty() && !params.is_empty() => {
            wire_parameters(params, &class)?
          }
          _ => arguments,
        };
        let values = container.resolve_arguments(&arguments)?;
        let built = descriptor.instantiate(Arguments::new(class.as_str(), values))?;

        for call in calls {
          let target = format!("{}::{}", class, call.method);
          let method = descriptor
            .instance_method(&call.method)
            .ok_or_else(|| Error::LookupMiss {
              target: target.clone(),
            })?;
          let arguments = if call.arguments.is_empty() {
            wire_parameters(method.params(), &target)?
          } else {
            call.arguments
          };
          let values = container.resolve_arguments(&arguments)?;
          method.invoke(&built, Arguments::new(target, values))?;
        }

        Ok(built)
      }
      DefinitionKind::Callable(callable) => {
        let arguments = if arguments.is_empty() {
          wire_parameters(callable.params(), &key)?
        } else {
          arguments
        };
        let values = container.resolve_arguments(&arguments)?;
        callable.call(Arguments::new(key, values))
      }
      DefinitionKind::Closure(factory) => {
        let values = container.resolve_arguments(&arguments)?;
        factory(container, Arguments::new(key, values))
      }
    }
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.inner.lock();
    let kind = match &state.kind {
      DefinitionKind::Class { class, .. } => format!("Class({})", class),
      DefinitionKind::Callable(callable) => format!("Callable({:?})", callable.name()),
      DefinitionKind::Closure(_) => "Closure".to_string(),
    };
    f.debug_struct("Definition")
      .field("key", &state.key)
      .field("kind", &kind)
      .field("arguments", &state.arguments)
      .finish()
  }
}
