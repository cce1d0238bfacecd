//! Integration tests for the dependency container.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use telekit_di::{Container, DiError, DiResult, FnModule, Injectable, Injector, Module};

fn module<F>(name: &str, configure: F) -> Arc<dyn Module>
where
    F: Fn(&mut telekit_di::Binder) -> DiResult<()> + Send + Sync + 'static,
{
    Arc::new(FnModule::new(name, configure))
}

struct Counter(usize);

#[test]
fn unbound_type_fails_instead_of_returning_nothing() {
    let container = Container::new();
    container
        .configure(&[module("host", |b| {
            b.instance(Arc::new(1_u8));
            Ok(())
        })])
        .unwrap();

    let err = container.resolve::<String>().err().unwrap();
    assert!(matches!(err, DiError::UnresolvedDependency { .. }));
    assert!(err.is_unresolved());
    assert!(container.try_resolve::<String>().unwrap().is_none());
}

#[test]
fn concurrent_singleton_resolution_runs_factory_once() {
    const THREADS: usize = 32;
    let calls = Arc::new(AtomicUsize::new(0));
    let factory_calls = Arc::clone(&calls);

    let container = Container::new();
    container
        .configure(&[module("host", move |b| {
            let calls = Arc::clone(&factory_calls);
            b.singleton(move |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(5));
                Ok(Arc::new(Counter(n)))
            });
            Ok(())
        })])
        .unwrap();

    let barrier = Barrier::new(THREADS);
    let instances: Vec<Arc<Counter>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    container.resolve::<Counter>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    assert_eq!(instances[0].0, 0);
}

#[test]
fn transient_resolution_yields_distinct_instances() {
    let container = Container::new();
    container
        .configure(&[module("host", |b| {
            b.transient(|_| Ok(Arc::new(Counter(0))));
            Ok(())
        })])
        .unwrap();

    let instances: Vec<Arc<Counter>> = (0..8)
        .map(|_| container.resolve::<Counter>().unwrap())
        .collect();
    for (i, a) in instances.iter().enumerate() {
        for b in instances.iter().skip(i.saturating_add(1)) {
            assert!(!Arc::ptr_eq(a, b));
        }
    }
}

#[test]
fn reconfiguration_replaces_previous_bindings() {
    let container = Container::new();
    let module_a = module("a", |b| {
        b.instance(Arc::new(String::from("from a")));
        b.instance(Arc::new(7_u16));
        Ok(())
    });
    let module_b = module("b", |b| {
        b.instance(Arc::new(String::from("from b")));
        Ok(())
    });

    container.configure(&[module_a]).unwrap();
    assert_eq!(*container.resolve::<String>().unwrap(), "from a");

    container.configure(&[module_b]).unwrap();
    assert_eq!(*container.resolve::<String>().unwrap(), "from b");
    assert!(container.resolve::<u16>().unwrap_err().is_unresolved());
}

#[test]
fn singletons_depend_on_other_bindings() {
    struct Greeter {
        greeting: Arc<String>,
    }

    let container = Container::new();
    container
        .configure(&[
            module("strings", |b| {
                b.instance(Arc::new(String::from("hello")));
                Ok(())
            }),
            module("greeter", |b| {
                b.singleton(|r| {
                    Ok(Arc::new(Greeter {
                        greeting: r.resolve::<String>()?,
                    }))
                });
                Ok(())
            }),
        ])
        .unwrap();

    assert_eq!(*container.resolve::<Greeter>().unwrap().greeting, "hello");
}

#[test]
fn field_injection_and_providers_use_the_same_bindings() {
    #[derive(Default)]
    struct Panel {
        title: Option<Arc<String>>,
        width: Option<Arc<u32>>,
    }

    impl Injectable for Panel {
        fn inject(&mut self, injector: &mut Injector<'_>) -> DiResult<()> {
            self.title = Some(injector.required::<String>("title")?);
            self.width = injector.optional::<u32>("width")?;
            Ok(())
        }
    }

    let container = Container::new();
    let provider = container.resolve_provider::<String>();
    container
        .configure(&[module("host", |b| {
            b.instance(Arc::new(String::from("Tools")));
            Ok(())
        })])
        .unwrap();

    let mut panel = Panel::default();
    container.inject_fields(&mut panel).unwrap();
    assert_eq!(panel.title.as_deref().map(String::as_str), Some("Tools"));
    assert!(panel.width.is_none());
    assert!(Arc::ptr_eq(&provider.get().unwrap(), panel.title.as_ref().unwrap()));
}
