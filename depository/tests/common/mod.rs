#![allow(dead_code)]

use fibre_depository::{instance, Callable, Class, Container, Error, Parameter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Routes container logs through the test harness. Set `RUST_LOG=debug` to see them.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

// --- Fixtures ---

#[derive(Debug)]
pub struct DependencyA;

#[derive(Debug)]
pub struct Service {
  pub a: Arc<DependencyA>,
  pub name: String,
}

#[derive(Debug)]
pub struct Tokenized {
  pub token: String,
}

#[derive(Debug)]
pub struct NeedsTokenized {
  pub inner: Arc<Tokenized>,
}

pub const DEPENDENCY_A: &str = "DependencyA";
pub const SERVICE: &str = "Service";
pub const TOKENIZED: &str = "Tokenized";
pub const NEEDS_TOKENIZED: &str = "NeedsTokenized";
pub const REPOSITORY: &str = "Repository";

/// Declares the fixture classes under short names:
///
/// - `DependencyA` has no constructor.
/// - `Service(DependencyA $a, $name = "x")`.
/// - `Tokenized($token)` cannot be autowired.
/// - `NeedsTokenized(Tokenized $inner)`.
/// - `Repository` is abstract.
pub fn declare_fixtures(container: &Container) {
  container
    .declare_class(Class::new(DEPENDENCY_A, |_| Ok(instance(DependencyA))))
    .declare_class(
      Class::new(SERVICE, |args| {
        Ok(instance(Service {
          a: args.get(0)?,
          name: args.cloned(1)?,
        }))
      })
      .constructor([
        Parameter::class("a", DEPENDENCY_A),
        Parameter::new("name").default_value(String::from("x")),
      ]),
    )
    .declare_class(
      Class::new(TOKENIZED, |args| {
        Ok(instance(Tokenized {
          token: args.cloned(0)?,
        }))
      })
      .constructor([Parameter::new("token")]),
    )
    .declare_class(
      Class::new(NEEDS_TOKENIZED, |args| {
        Ok(instance(NeedsTokenized {
          inner: args.get(0)?,
        }))
      })
      .constructor([Parameter::class("inner", TOKENIZED)]),
    )
    .declare_class(Class::abstract_class(REPOSITORY));
}

/// A class that counts how many times it was constructed.
pub fn counting_class(name: &str, counter: Arc<AtomicUsize>) -> Class {
  Class::new(name, move |_| {
    let n = counter.fetch_add(1, Ordering::SeqCst);
    Ok(instance(n))
  })
}

/// A callable adding its two `i64` arguments.
pub fn adder() -> Callable {
  Callable::new(|args| {
    let a = args.get::<i64>(0)?;
    let b = args.get::<i64>(1)?;
    Ok(instance(*a + *b))
  })
  .param(Parameter::new("a"))
  .param(Parameter::new("b").default_value(10_i64))
}

pub fn expect_already_registered<T>(result: Result<T, Error>, expected_key: &str) {
  match result {
    Err(Error::AlreadyRegistered { key }) => assert_eq!(key, expected_key),
    Err(other) => panic!("expected AlreadyRegistered, got {other}"),
    Ok(_) => panic!("expected AlreadyRegistered, registration succeeded"),
  }
}
