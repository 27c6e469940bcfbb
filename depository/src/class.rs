//! Type metadata consulted by autowiring.
//!
//! Rust has no runtime reflection, so every class the container should be able
//! to build on demand is described up front: its name, whether it can be
//! instantiated, the parameters of its constructor and how to build it from
//! resolved arguments. Free functions and static methods are described the
//! same way with [`Callable`].

use crate::core::{Arguments, Instance};
use crate::error::{Error, Result};

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub(crate) type Constructor = Arc<dyn Fn(Arguments) -> Result<Instance> + Send + Sync>;
pub(crate) type MethodFn = Arc<dyn Fn(&Instance, Arguments) -> Result<()> + Send + Sync>;

/// A declared constructor, function or method parameter.
#[derive(Clone)]
pub struct Parameter {
  name: String,
  class: Option<String>,
  default: Option<Instance>,
}

impl Parameter {
  /// An untyped parameter. Without a default it can only be satisfied by an
  /// explicit argument.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      class: None,
      default: None,
    }
  }

  /// A parameter whose declared type is another class or alias.
  pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      class: Some(class.into()),
      default: None,
    }
  }

  /// A parameter typed as `T`, keyed by `type_name::<T>()`.
  pub fn of<T: ?Sized + Any>(name: impl Into<String>) -> Self {
    Self::class(name, type_name::<T>())
  }

  pub fn default_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
    self.default = Some(Arc::new(value));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn dependency(&self) -> Option<&str> {
    self.class.as_deref()
  }

  pub fn default(&self) -> Option<&Instance> {
    self.default.as_ref()
  }
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parameter")
      .field("name", &self.name)
      .field("class", &self.class)
      .field("has_default", &self.default.is_some())
      .finish()
  }
}

/// An invokable with declared parameters: a free function, a static method
/// or an anonymous closure.
#[derive(Clone)]
pub struct Callable {
  name: Option<String>,
  params: Vec<Parameter>,
  invoke: Constructor,
}

impl Callable {
  /// An anonymous callable.
  pub fn new<F>(invoke: F) -> Self
  where
    F: Fn(Arguments) -> Result<Instance> + Send + Sync + 'static,
  {
    Self {
      name: None,
      params: Vec::new(),
      invoke: Arc::new(invoke),
    }
  }

  pub fn named<F>(name: impl Into<String>, invoke: F) -> Self
  where
    F: Fn(Arguments) -> Result<Instance> + Send + Sync + 'static,
  {
    Self::new(invoke).with_name(name)
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn param(mut self, param: Parameter) -> Self {
    self.params.push(param);
    self
  }

  pub fn params(&self) -> &[Parameter] {
    &self.params
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn call(&self, args: Arguments) -> Result<Instance> {
    (self.invoke)(args)
  }
}

impl fmt::Debug for Callable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Callable")
      .field("name", &self.name)
      .field("params", &self.params)
      .finish_non_exhaustive()
  }
}

/// An instance method used for setter injection after construction.
#[derive(Clone)]
pub struct Method {
  params: Vec<Parameter>,
  call: MethodFn,
}

impl Method {
  pub fn params(&self) -> &[Parameter] {
    &self.params
  }

  pub(crate) fn invoke(&self, receiver: &Instance, args: Arguments) -> Result<()> {
    (self.call)(receiver, args)
  }
}

#[derive(Clone)]
enum ClassKind {
  Concrete(Constructor),
  Abstract,
}

/// Constructor metadata for one class.
#[derive(Clone)]
pub struct Class {
  name: String,
  kind: ClassKind,
  constructor: Option<Vec<Parameter>>,
  functions: HashMap<String, Callable>,
  methods: HashMap<String, Method>,
}

impl Class {
  /// A class built by `build`. Until [`constructor`](Self::constructor) is
  /// called it has no constructor and is built from empty arguments.
  pub fn new<F>(name: impl Into<String>, build: F) -> Self
  where
    F: Fn(Arguments) -> Result<Instance> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      kind: ClassKind::Concrete(Arc::new(build)),
      constructor: None,
      functions: HashMap::new(),
      methods: HashMap::new(),
    }
  }

  /// Describes `T` under its type name. `build` returns the bare value.
  pub fn of<T, F>(build: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(Arguments) -> Result<T> + Send + Sync + 'static,
  {
    Self::new(type_name::<T>(), move |args| {
      build(args).map(|value| Arc::new(value) as Instance)
    })
  }

  /// An abstract class or interface: known by name, never instantiable.
  pub fn abstract_class(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: ClassKind::Abstract,
      constructor: None,
      functions: HashMap::new(),
      methods: HashMap::new(),
    }
  }

  pub fn constructor(mut self, params: impl IntoIterator<Item = Parameter>) -> Self {
    self.constructor = Some(params.into_iter().collect());
    self
  }

  /// Declares a static method reachable as `"Class::name"`.
  pub fn function(mut self, name: impl Into<String>, callable: Callable) -> Self {
    let name = name.into();
    let callable = callable.with_name(format!("{}::{}", self.name, name));
    self.functions.insert(name, callable);
    self
  }

  /// Declares an instance method usable for setter injection. `call` receives
  /// the built instance; downcast it to reach the concrete type.
  pub fn method<F>(
    mut self,
    name: impl Into<String>,
    params: impl IntoIterator<Item = Parameter>,
    call: F,
  ) -> Self
  where
    F: Fn(&Instance, Arguments) -> Result<()> + Send + Sync + 'static,
  {
    let method = Method {
      params: params.into_iter().collect(),
      call: Arc::new(call),
    };
    self.methods.insert(name.into(), method);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_instantiable(&self) -> bool {
    matches!(self.kind, ClassKind::Concrete(_))
  }

  pub fn constructor_params(&self) -> Option<&[Parameter]> {
    self.constructor.as_deref()
  }

  pub fn static_function(&self, name: &str) -> Option<&Callable> {
    self.functions.get(name)
  }

  pub fn instance_method(&self, name: &str) -> Option<&Method> {
    self.methods.get(name)
  }

  pub(crate) fn instantiate(&self, args: Arguments) -> Result<Instance> {
    match &self.kind {
      ClassKind::Concrete(build) => build(args),
      ClassKind::Abstract => Err(Error::NotInstantiable {
        class: self.name.clone(),
      }),
    }
  }
}

impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Class")
      .field("name", &self.name)
      .field("instantiable", &self.is_instantiable())
      .field("constructor", &self.constructor)
      .field("functions", &self.functions.keys().collect::<Vec<_>>())
      .field("methods", &self.methods.keys().collect::<Vec<_>>())
      .finish()
  }
}

/// Types that describe their own constructor.
///
/// ```
/// use fibre_depository::{Class, Container, Injectable, Parameter};
///
/// struct Clock;
/// struct Scheduler {
///   clock: std::sync::Arc<Clock>,
/// }
///
/// impl Injectable for Clock {
///   fn class() -> Class {
///     Class::of::<Clock, _>(|_| Ok(Clock))
///   }
/// }
///
/// impl Injectable for Scheduler {
///   fn class() -> Class {
///     Class::of::<Scheduler, _>(|args| Ok(Scheduler { clock: args.get(0)? }))
///       .constructor([Parameter::of::<Clock>("clock")])
///   }
/// }
///
/// let container = Container::new();
/// container.declare::<Clock>().declare::<Scheduler>();
/// let scheduler = container.get::<Scheduler>().unwrap();
/// # let _ = &scheduler.clock;
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
  fn class() -> Class;
}
