//! An opt-in process-wide container.
//!
//! Prefer creating a [`Container`] at the composition root and passing it
//! down. The global exists for code that genuinely needs ambient access; tests
//! that use it should call [`reset_global`] to start from a clean slate.

use crate::container::Container;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

// Created empty on first access.
static GLOBAL_CONTAINER: Lazy<RwLock<Arc<Container>>> =
  Lazy::new(|| RwLock::new(Arc::new(Container::default())));

/// Returns the current global container.
///
/// The handle stays valid after [`init_global`] or [`reset_global`], but
/// refers to the container that was global when it was taken.
///
/// # Examples
///
/// ```
/// use fibre_depository::{global, Concrete};
///
/// global()
///   .register("greeting", Concrete::instance(String::from("Hello from global!")), false)
///   .unwrap();
/// let greeting = global().resolve::<String>("greeting").unwrap();
/// assert_eq!(*greeting, "Hello from global!");
/// ```
pub fn global() -> Arc<Container> {
  GLOBAL_CONTAINER.read().clone()
}

/// Installs `container` as the global container and returns the previous one.
pub fn init_global(container: Container) -> Arc<Container> {
  let mut slot = GLOBAL_CONTAINER.write();
  std::mem::replace(&mut *slot, Arc::new(container))
}

/// Replaces the global container with an empty one and returns the previous one.
pub fn reset_global() -> Arc<Container> {
  init_global(Container::default())
}
