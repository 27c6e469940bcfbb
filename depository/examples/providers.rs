use fibre_depository::{instance, Concrete, Container, FnProvider};

struct Mailer {
  host: String,
}

fn main() {
  let container = Container::new();

  // Eager: runs as soon as it is added.
  container
    .add_provider(FnProvider::eager(|container: &Container| {
      println!("Booting configuration provider");
      container.register("smtp.host", Concrete::instance(String::from("mail.local")), false)?;
      Ok(())
    }))
    .unwrap();

  // Lazy: runs the first time "mailer" is requested.
  container
    .add_provider(FnProvider::new(["mailer"], |container: &Container| {
      println!("Booting mail provider");
      container.singleton(
        "mailer",
        Concrete::closure(|container, _| {
          let host = container.resolve::<String>("smtp.host")?;
          Ok(instance(Mailer {
            host: (*host).clone(),
          }))
        }),
      )?;
      Ok(())
    }))
    .unwrap();

  println!("Providers registered: {}", container.provider_count());
  assert!(!container.is_registered("mailer"));

  let mailer = container.resolve::<Mailer>("mailer").unwrap();
  println!("Mailer connected to {}", mailer.host);
  assert!(container.is_singleton("mailer"));
}
