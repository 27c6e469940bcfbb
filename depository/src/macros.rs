//! Public macros for ergonomic resolution.

/// Resolves a value from the global container.
///
/// `resolve!(Type)` makes the key `type_name::<Type>()`, `resolve!(Type, key)`
/// makes `key`; both downcast the result to `Arc<Type>`.
///
/// # Panics
///
/// Panics if the value cannot be resolved. For a non-panicking version, use
/// `global().resolve(...)` directly.
///
/// # Examples
///
/// ```
/// use fibre_depository::{global, resolve, Concrete};
///
/// global().register("port", Concrete::instance(8080_u16), false).unwrap();
///
/// let port = resolve!(u16, "port");
/// assert_eq!(*port, 8080);
/// ```
#[macro_export]
macro_rules! resolve {
  ($type:ty) => {
    $crate::global()
      .get::<$type>()
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service {}: {}",
          std::any::type_name::<$type>(),
          err
        )
      })
  };

  ($type:ty, $key:expr) => {
    $crate::global()
      .resolve::<$type>($key)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service '{}' as {}: {}",
          $key,
          std::any::type_name::<$type>(),
          err
        )
      })
  };
}

/// Builds a `Vec<Argument>` of plain values for `make_with`.
///
/// ```
/// use fibre_depository::{args, Argument};
///
/// let arguments: Vec<Argument> = args![1_u8, String::from("two")];
/// assert_eq!(arguments.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
  () => {
    ::std::vec::Vec::<$crate::Argument>::new()
  };
  ($($value:expr),+ $(,)?) => {
    ::std::vec![$($crate::Argument::value($value)),+]
  };
}
