use cordwork::{Handler, Manifest};

mod greeting;

pub fn manifest() -> Manifest<dyn Handler> {
    Manifest::new().with(greeting::export())
}
