//! Building definitions for classes and callables nobody registered.
//!
//! Each declared parameter is satisfied, in order of preference, by an
//! explicit argument, by its declared class (made when the definition is
//! created), or by its default value.

use crate::class::{Class, Parameter};
use crate::container::Container;
use crate::core::{Argument, Target};
use crate::definition::Definition;
use crate::error::{Error, Result};

use std::sync::atomic::Ordering;

const ANONYMOUS_CALLABLE: &str = "Callable";

/// Infers one argument per parameter.
pub(crate) fn wire_parameters(params: &[Parameter], target: &str) -> Result<Vec<Argument>> {
  params
    .iter()
    .map(|param| {
      if let Some(class) = param.dependency() {
        return Ok(Argument::Key(class.to_owned()));
      }
      match param.default() {
        Some(default) => Ok(Argument::Value(default.clone())),
        None => Err(Error::UnresolvableDependency {
          parameter: param.name().to_owned(),
          target: target.to_owned(),
        }),
      }
    })
    .collect()
}

fn bind(definition: &Definition, params: &[Parameter], target: &str, explicit: &[Argument]) -> Result<()> {
  if !explicit.is_empty() {
    for argument in explicit {
      definition.with(argument.clone());
    }
    return Ok(());
  }
  for argument in wire_parameters(params, target)? {
    definition.with(argument);
  }
  Ok(())
}

impl Container {
  pub(crate) fn build_class(&self, class: &Class, arguments: &[Argument]) -> Result<Definition> {
    if !class.is_instantiable() {
      return Err(Error::NotInstantiable {
        class: class.name().to_owned(),
      });
    }

    let definition = Definition::class(class.name(), class.name());
    if let Some(params) = class.constructor_params() {
      bind(&definition, params, class.name(), arguments)?;
    }
    Ok(definition)
  }

  pub(crate) fn build_callable(&self, target: Target, arguments: &[Argument]) -> Result<Definition> {
    let (key, callable) = match target {
      Target::Name(name) => match self.find_callable(&name) {
        Some(callable) => (name, callable),
        None => return Err(Error::LookupMiss { target: name }),
      },
      Target::Callable(callable) => {
        let key = match callable.name() {
          Some(name) => name.to_owned(),
          None => self.anonymous_callable_key(),
        };
        (key, callable)
      }
    };

    let definition = Definition::callable(key.as_str(), callable.clone());
    bind(&definition, callable.params(), &key, arguments)?;
    Ok(definition)
  }

  fn anonymous_callable_key(&self) -> String {
    if self.settings.shared_callable_key {
      return ANONYMOUS_CALLABLE.to_owned();
    }
    let n = self.anonymous_callables.fetch_add(1, Ordering::Relaxed);
    format!("{}#{}", ANONYMOUS_CALLABLE, n)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::class::Callable;
  use crate::core::instance;
  use crate::ContainerBuilder;

  #[test]
  fn class_parameters_become_pending_keys() {
    let params = [
      Parameter::class("db", "Database"),
      Parameter::new("retries").default_value(3_u8),
    ];
    let wired = wire_parameters(&params, "Repo").unwrap();
    assert!(matches!(&wired[0], Argument::Key(k) if k == "Database"));
    assert!(matches!(&wired[1], Argument::Value(_)));
  }

  #[test]
  fn untyped_parameter_without_default_is_unresolvable() {
    let err = wire_parameters(&[Parameter::new("dsn")], "Repo").unwrap_err();
    match err {
      Error::UnresolvableDependency { parameter, target } => {
        assert_eq!(parameter, "dsn");
        assert_eq!(target, "Repo");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn anonymous_callables_get_distinct_keys_unless_shared() {
    let container = Container::new();
    let a = container
      .build_callable(Callable::new(|_| Ok(instance(1))).into(), &[])
      .unwrap();
    let b = container
      .build_callable(Callable::new(|_| Ok(instance(2))).into(), &[])
      .unwrap();
    assert_ne!(a.key(), b.key());

    let shared = ContainerBuilder::new().shared_callable_key(true).build().unwrap();
    let c = shared
      .build_callable(Callable::new(|_| Ok(instance(3))).into(), &[])
      .unwrap();
    assert_eq!(c.key(), "Callable");
  }
}
