use fibre_depository::{global, instance, resolve, Concrete};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn tracker() -> Concrete {
  Concrete::closure(|_, _| {
    println!("Creating RequestTracker...");
    Ok(instance(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    }))
  })
}

fn main() {
  // Built once, on first resolution.
  global().singleton("singleton_tracker", tracker()).unwrap();

  // Built on every resolution.
  global()
    .register("transient_tracker", tracker(), false)
    .unwrap();

  println!("--- Resolving Singletons ---");
  let s1 = resolve!(RequestTracker, "singleton_tracker");
  let s2 = resolve!(RequestTracker, "singleton_tracker");
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, 0);
  assert!(
    Arc::ptr_eq(&s1, &s2),
    "Singleton instances should be identical"
  );

  println!("--- Resolving Transients ---");
  let t1 = resolve!(RequestTracker, "transient_tracker");
  let t2 = resolve!(RequestTracker, "transient_tracker");
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_eq!((t1.id, t2.id), (1, 2));

  // An existing registration can be turned into a singleton without building it.
  global().make_singleton("transient_tracker", None).unwrap();
  let t3 = resolve!(RequestTracker, "transient_tracker");
  let t4 = resolve!(RequestTracker, "transient_tracker");
  assert!(Arc::ptr_eq(&t3, &t4));
  println!("transient_tracker is now a singleton with ID {}", t3.id);
}
