//! The process-wide default collection.

use std::sync::Arc;

use ataad::prelude::*;

#[ataad::resource]
fn counter(args: &Args, _: &Resources) -> Result<Setup<u32>, BoxError> {
    Ok(Setup::new(args.keyword_or("start", 0u32)?))
}

fn setup() -> &'static Resources {
    let resources = ataad::global();
    resources.register_mod(module_path!());
    resources
}

#[test]
fn global_scoped_acquisition() {
    let resources = setup();
    let value = resources
        .ctx("counter")
        .unwrap()
        .kwarg("start", 5u32)
        .named("global_scoped")
        .scope(|n: Arc<u32>| *n)
        .unwrap();

    assert_eq!(value, 5);
    assert!(!resources.contains("global_scoped"));
}

#[test]
fn global_manager_is_singleton() {
    let resources = setup();
    let mgr = resources.mgr("counter").unwrap();
    assert_eq!(mgr, ataad::global().mgr("counter").unwrap());

    mgr.start(Args::new().named("global_managed")).unwrap();
    assert_eq!(*resources.get::<u32>("global_managed").unwrap(), 0);
    ataad::global().mgr("counter").unwrap().stop(Some("global_managed")).unwrap();
    assert!(!resources.contains("global_managed"));
}
