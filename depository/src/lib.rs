//! # Fibre Depository
//!
//! A string-keyed dependency injection container with aliases, lazily
//! promoted singletons, service providers and constructor autowiring.
//!
//! ## Core Concepts
//!
//! - **Container**: the registry. Keys map to instances, singletons or
//!   definitions; aliases redirect one key to another.
//! - **Definition**: a deferred recipe (class, callable or closure plus
//!   accumulated arguments) realized on resolution.
//! - **Class metadata**: constructors are declared with [`Class`] and
//!   [`Parameter`]; when a declared class is made without a registration, its
//!   parameters are autowired from their declared classes or defaults.
//! - **Service providers**: bundles of registrations initialized eagerly, or
//!   lazily the first time one of their keys is requested.
//! - **Global container**: an opt-in shared instance via [`global()`] with
//!   [`reset_global`] for test isolation.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_depository::{Class, Container, Parameter};
//! use std::sync::Arc;
//!
//! struct Mailer {
//!   sender: String,
//! }
//!
//! struct Signup {
//!   mailer: Arc<Mailer>,
//! }
//!
//! let container = Container::new();
//! container
//!   .declare_class(
//!     Class::of::<Mailer, _>(|args| Ok(Mailer { sender: args.cloned(0)? }))
//!       .constructor([Parameter::new("sender").default_value(String::from("noreply@example.com"))]),
//!   )
//!   .declare_class(
//!     Class::of::<Signup, _>(|args| Ok(Signup { mailer: args.get(0)? }))
//!       .constructor([Parameter::of::<Mailer>("mailer")]),
//!   );
//!
//! // Share one mailer across every signup.
//! container.singleton(std::any::type_name::<Mailer>(), None).unwrap();
//!
//! let first = container.get::<Signup>().unwrap();
//! let second = container.get::<Signup>().unwrap();
//! assert_eq!(first.mailer.sender, "noreply@example.com");
//! assert!(Arc::ptr_eq(&first.mailer, &second.mailer));
//! ```

mod autowire;
mod builder;
mod class;
mod container;
mod core;
mod definition;
mod error;
mod global;
mod macros;
mod provider;

pub use builder::ContainerBuilder;
pub use class::{Callable, Class, Injectable, Method, Parameter};
pub use container::{Container, Registered};
pub use self::core::{instance, Argument, Arguments, Instance, Target};
pub use definition::{Concrete, Definition, Factory};
pub use error::{BuildError, Error, Result};
pub use global::{global, init_global, reset_global};
pub use provider::{FnProvider, ProviderSource, ServiceProvider, SharedProvider};
