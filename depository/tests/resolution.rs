mod common;

use common::*;
use fibre_depository::{
  args, instance, Argument, Callable, Class, Concrete, Container, ContainerBuilder, Error, Parameter,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_alias_resolves_like_its_target_across_hops() {
  init_tracing();
  let container = Container::new();
  container
    .register("c", Concrete::closure(|_, _| Ok(instance(String::from("from c")))), false)
    .unwrap();
  container.alias("a", "b").unwrap();
  container.alias("b", "c").unwrap();

  let via_alias = container.resolve::<String>("a").unwrap();
  let direct = container.resolve::<String>("c").unwrap();
  assert_eq!(*via_alias, *direct);
  assert_eq!(*via_alias, "from c");
}

#[test]
fn test_alias_to_unregistered_class_falls_through_to_autowiring() {
  let container = Container::new();
  declare_fixtures(&container);
  container.alias("svc", SERVICE).unwrap();

  let service = container.resolve::<Service>("svc").unwrap();
  assert_eq!(service.name, "x");
}

#[test]
fn test_singleton_resolves_to_the_same_value() {
  let container = Container::new();
  let built = Arc::new(AtomicUsize::new(0));
  container.declare_class(counting_class("Counter", built.clone()));

  container.singleton("s", Concrete::name("Counter")).unwrap();

  let first = container.make("s").unwrap();
  assert!(container.is_registered("s"));
  let second = container.make("s").unwrap();

  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(built.load(Ordering::SeqCst), 1);
  assert!(container.is_singleton("s"));
}

#[test]
fn test_non_singleton_definitions_build_every_time() {
  let container = Container::new();
  let built = Arc::new(AtomicUsize::new(0));
  container.declare_class(counting_class("Counter", built.clone()));
  container.register("Counter", None, false).unwrap();

  let first = container.resolve::<usize>("Counter").unwrap();
  let second = container.resolve::<usize>("Counter").unwrap();
  assert_eq!((*first, *second), (0, 1));
}

#[test]
fn test_singleton_ignores_arguments_once_realized() {
  let container = Container::new();
  container
    .singleton(
      "echo",
      Concrete::closure(|_, args| Ok(args.raw(0)?.clone())),
    )
    .unwrap();

  let first = container.make_with("echo", args![1_i32]).unwrap();
  let second = container.make_with("echo", args![2_i32]).unwrap();
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(*first.downcast::<i32>().unwrap(), 1);
}

#[test]
fn test_explicit_arguments_replace_accumulated_ones() {
  let container = Container::new();
  let registered = container
    .register("sum", Concrete::Callable(adder()), false)
    .unwrap();
  registered
    .definition()
    .unwrap()
    .with_value(1_i64)
    .with_value(2_i64);

  assert_eq!(*container.resolve::<i64>("sum").unwrap(), 3);
  assert_eq!(
    *container
      .resolve_with::<i64>("sum", args![20_i64, 22_i64])
      .unwrap(),
    42
  );
}

#[test]
fn test_key_arguments_are_made_at_creation_time() {
  let container = Container::new();
  container
    .register("base", Concrete::instance(40_i64), false)
    .unwrap();
  container
    .register("sum", Concrete::Callable(adder()), false)
    .unwrap()
    .definition()
    .unwrap()
    .with_key("base")
    .with_value(2_i64);

  assert_eq!(*container.resolve::<i64>("sum").unwrap(), 42);
}

#[test]
fn test_anonymous_callable_uses_defaults_for_missing_parameters() {
  let container = Container::new();
  let callable = Callable::new(|args| {
    let greeting = args.get::<String>(0)?;
    Ok(instance(format!("{}!", greeting)))
  })
  .param(Parameter::new("greeting").default_value(String::from("hi")));

  let result = container.resolve::<String>(callable).unwrap();
  assert_eq!(*result, "hi!");
}

#[test]
fn test_callable_with_explicit_arguments() {
  let container = Container::new();
  let sum = container
    .resolve_with::<i64>(adder(), vec![Argument::value(1_i64), Argument::value(2_i64)])
    .unwrap();
  assert_eq!(*sum, 3);

  match container.make(adder()) {
    Err(Error::UnresolvableDependency { parameter, target }) => {
      assert_eq!(parameter, "a");
      assert!(target.starts_with("Callable"));
    }
    _ => panic!("the first parameter has neither a type nor a default"),
  }
}

#[test]
fn test_static_method_paths_and_declared_functions() {
  let container = Container::new();
  declare_fixtures(&container);
  container.declare_class(
    Class::new("Math", |_| Ok(instance(()))).function(
      "double",
      Callable::new(|args| Ok(instance(*args.get::<i64>(0)? * 2))).param(Parameter::new("n")),
    ),
  );
  container.declare_function(
    "describe",
    Callable::new(|args| {
      let service = args.get::<Service>(0)?;
      Ok(instance(format!("service named {}", service.name)))
    })
    .param(Parameter::class("service", SERVICE)),
  );

  assert_eq!(
    *container
      .resolve_with::<i64>("Math::double", args![21_i64])
      .unwrap(),
    42
  );
  assert_eq!(
    *container.resolve::<String>("describe").unwrap(),
    "service named x"
  );
  // Nothing was registered along the way.
  assert!(!container.is_registered("describe"));
  assert!(!container.is_registered(SERVICE));
}

#[test]
fn test_unknown_targets_are_lookup_misses() {
  let container = Container::new();
  match container.make("Nowhere") {
    Err(Error::LookupMiss { target }) => assert_eq!(target, "Nowhere"),
    _ => panic!("expected a lookup miss"),
  }
  assert!(matches!(
    container.make("Nowhere::method"),
    Err(Error::LookupMiss { .. })
  ));
}

#[test]
fn test_definition_of_undeclared_class_fails_at_creation() {
  let container = Container::new();
  container.register("Ghost", None, false).unwrap();
  assert!(matches!(
    container.make("Ghost"),
    Err(Error::LookupMiss { target }) if target == "Ghost"
  ));
}

#[test]
fn test_type_mismatch_is_reported() {
  let container = Container::new();
  container
    .register("n", Concrete::instance(1_u8), false)
    .unwrap();
  assert!(matches!(
    container.resolve::<String>("n"),
    Err(Error::TypeMismatch { .. })
  ));
}

#[test]
fn test_setter_injection_runs_after_construction() {
  use fixtures::Recorder;

  let container = Container::new();
  container.declare_class(
    Class::new("Recorder", |_| Ok(instance(Recorder::default()))).method(
      "set_label",
      [Parameter::new("label").default_value(String::from("default"))],
      |receiver, args| {
        let recorder = receiver
          .clone()
          .downcast::<Recorder>()
          .map_err(|_| Error::construction("Recorder", "not a recorder"))?;
        recorder.push(args.cloned::<String>(0)?);
        Ok(())
      },
    ),
  );

  let registered = container.register("Recorder", None, false).unwrap();
  let definition = registered.definition().unwrap();
  definition.call("set_label", args![String::from("first")]);
  definition.call("set_label", vec![]);

  let recorder = container.resolve::<Recorder>("Recorder").unwrap();
  assert_eq!(recorder.labels(), vec!["first", "default"]);

  definition.call("missing", vec![]);
  assert!(matches!(
    container.make("Recorder"),
    Err(Error::LookupMiss { target }) if target == "Recorder::missing"
  ));
}

#[test]
fn test_registering_a_name_that_leads_back_is_rejected() {
  let container = Container::new();
  container.register("left", Concrete::name("middle"), false).unwrap();
  container.alias("middle", "right").unwrap();

  match container.register("right", Concrete::name("left"), false) {
    Err(Error::CircularDependency { chain }) => {
      assert_eq!(chain, vec!["right", "left", "middle", "right"])
    }
    Err(other) => panic!("expected a cycle, got {other}"),
    Ok(_) => panic!("expected a cycle"),
  }
  assert!(!container.is_registered("right"));
}

#[test]
fn test_registering_an_instance_whose_type_leads_back_is_rejected() {
  struct Db;

  let container = Container::new();
  let type_key = std::any::type_name::<Db>();
  container.alias(type_key, "db").unwrap();

  match container.register("db", Concrete::instance(Db), false) {
    Err(Error::CircularDependency { chain }) => {
      assert_eq!(chain, vec!["db", type_key, "db"])
    }
    Err(other) => panic!("expected a cycle, got {other}"),
    Ok(_) => panic!("expected a cycle"),
  }
  assert!(!container.is_registered("db"));
  assert!(matches!(
    container.make("db"),
    Err(Error::LookupMiss { .. })
  ));
}

#[test]
fn test_circular_constructors_are_detected() {
  let container = Container::new();
  container
    .declare_class(Class::new("Egg", |_| Ok(instance(()))).constructor([Parameter::class("chicken", "Chicken")]))
    .declare_class(Class::new("Chicken", |_| Ok(instance(()))).constructor([Parameter::class("egg", "Egg")]));

  match container.make("Egg") {
    Err(Error::CircularDependency { chain }) => assert_eq!(chain, vec!["Egg", "Chicken", "Egg"]),
    _ => panic!("expected a cycle"),
  }
}

#[test]
fn test_depth_limit_stops_runaway_resolution_without_cycle_detection() {
  let container = ContainerBuilder::new()
    .detect_cycles(false)
    .max_depth(8)
    .build()
    .unwrap();
  container
    .declare_class(Class::new("Loop", |_| Ok(instance(()))).constructor([Parameter::class("next", "Loop")]));

  assert!(matches!(
    container.make("Loop"),
    Err(Error::DepthExceeded { depth: 8, .. })
  ));
}

// A tiny interior-mutable fixture for setter injection.
mod fixtures {
  use std::sync::Mutex;

  #[derive(Default)]
  pub struct Recorder {
    labels: Mutex<Vec<String>>,
  }

  impl Recorder {
    pub fn push(&self, label: String) {
      self.labels.lock().unwrap().push(label);
    }

    pub fn labels(&self) -> Vec<String> {
      self.labels.lock().unwrap().clone()
    }
  }
}
