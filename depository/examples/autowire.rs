use fibre_depository::{instance, Class, Concrete, Container, Parameter};
use std::sync::Arc;

struct Database {
  url: String,
}

struct UserRepository {
  db: Arc<Database>,
}

struct UserController {
  users: Arc<UserRepository>,
  page_size: usize,
}

fn declare(container: &Container) {
  container
    .declare_class(
      Class::new("Database", |args| {
        Ok(instance(Database {
          url: args.cloned(0)?,
        }))
      })
      .constructor([Parameter::new("url")]),
    )
    .declare_class(
      Class::new("UserRepository", |args| {
        Ok(instance(UserRepository { db: args.get(0)? }))
      })
      .constructor([Parameter::class("db", "Database")]),
    )
    .declare_class(
      Class::new("UserController", |args| {
        Ok(instance(UserController {
          users: args.get(0)?,
          page_size: args.cloned(1)?,
        }))
      })
      .constructor([
        Parameter::class("users", "UserRepository"),
        Parameter::new("page_size").default_value(25_usize),
      ]),
    );
}

fn main() {
  let container = Container::new();
  declare(&container);

  // `Database::url` has neither a class nor a default, so nothing can be inferred.
  match container.make("UserController") {
    Err(err) => println!("Without configuration: {}", err),
    Ok(_) => unreachable!("the database url cannot be autowired"),
  }

  // Register the one class that needs configuration; the rest is autowired.
  container
    .singleton("Database", None)
    .unwrap()
    .definition()
    .unwrap()
    .with_value(String::from("postgres://localhost/app"));
  container
    .register("users", Concrete::name("UserController"), false)
    .unwrap();

  let controller = container.resolve::<UserController>("users").unwrap();
  println!(
    "Controller pages by {} against {}",
    controller.page_size, controller.users.db.url
  );

  let other = container.resolve::<UserController>("users").unwrap();
  assert!(!Arc::ptr_eq(&controller.users, &other.users));
  assert!(Arc::ptr_eq(&controller.users.db, &other.users.db));
  println!("Repositories are rebuilt, the database singleton is shared.");
}
