use crate::{
    bootstrap, inject, injectable, module, DynSvc, Emitter, FactoryProvider,
    InjectError, InjectResult, Injector, Invoke, Locals, Module, Provide,
    Subscriber, Svc, TypedProvider,
};
use futures::{channel::oneshot, executor::block_on};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

struct Svc1(pub i32);

struct Svc2 {
    pub dep1: Svc<Svc1>,
}

impl Svc2 {
    pub fn new(dep1: Svc<Svc1>) -> Self {
        Svc2 { dep1 }
    }
}

#[derive(Default)]
struct Svc1Provider {
    value: Mutex<i32>,
}

impl TypedProvider for Svc1Provider {
    type Result = Svc1;

    fn get(&self) -> Svc<dyn Invoke<Svc1>> {
        let value = *self.value.lock().unwrap();
        Svc::new(injectable!(move || Svc1(value)))
    }
}

fn start(module: &Module) -> Injector {
    bootstrap(module).unwrap().into_injector()
}

fn expect_error<T>(result: InjectResult<T>) -> InjectError {
    match result {
        Err(error) => error,
        Ok(_) => unreachable!("expected an error"),
    }
}

#[test]
fn every_provider_kind_is_resolved_once() {
    let module = Module::new("app");
    module
        .value("value", Svc1(1))
        .constant("constant", Svc1(2))
        .factory("factory", || Svc1(3))
        .service("service", inject(["factory"], Svc2::new))
        .provider("provider", Svc1Provider::default());

    let injector = start(&module);
    for name in ["value", "constant", "factory", "provider"] {
        let first: Svc<Svc1> = injector.get(name).unwrap();
        let second: Svc<Svc1> = injector.get(name).unwrap();
        assert!(Svc::ptr_eq(&first, &second), "{name} was created twice");
    }

    assert_eq!(1, injector.get::<Svc<Svc1>>("value").unwrap().0);
    assert_eq!(2, injector.get::<Svc<Svc1>>("constant").unwrap().0);
    assert_eq!(0, injector.get::<Svc<Svc1>>("provider").unwrap().0);

    let service: Svc<Svc2> = injector.get("service").unwrap();
    let factory: Svc<Svc1> = injector.get("factory").unwrap();
    assert!(Svc::ptr_eq(&factory, &service.dep1));
    assert!(Svc::ptr_eq(&service, &injector.get::<Svc<Svc2>>("service").unwrap()));
}

#[test]
fn factory_runs_once() {
    let count = Svc::new(AtomicUsize::new(0));
    let counter = count.clone();

    let module = Module::new("app");
    module.factory("counted", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Svc1(0)
    });
    module.run(injectable!(|counted: Svc<Svc1>| assert_eq!(0, counted.0)));

    let injector = start(&module);
    let _: Svc<Svc1> = injector.get("counted").unwrap();
    let _: Svc<Svc1> = injector.get("counted").unwrap();
    assert_eq!(1, count.load(Ordering::SeqCst));
}

#[test]
fn constructor_function_and_closure_are_equivalent() {
    struct Person {
        name: String,
        age: u32,
    }

    impl Person {
        fn new(name: Svc<&'static str>, age: Svc<u32>) -> Self {
            Person {
                name: name.to_string(),
                age: *age,
            }
        }
    }

    let module = Module::new("app");
    module
        .constant("name", "alice")
        .constant("age", 30u32)
        .service("from_fn", inject(["name", "age"], Person::new))
        .service(
            "from_closure",
            injectable!(|name: Svc<&'static str>, age: Svc<u32>| Person {
                name: name.to_string(),
                age: *age
            }),
        );

    let injector = start(&module);
    let from_fn: Svc<Person> = injector.get("from_fn").unwrap();
    let from_closure: Svc<Person> = injector.get("from_closure").unwrap();
    assert_eq!(from_fn.name, from_closure.name);
    assert_eq!(from_fn.age, from_closure.age);
    assert_eq!("alice", from_fn.name);
    assert_eq!(30, from_fn.age);
}

#[test]
fn unknown_service_fails_with_provider_name() {
    let injector = start(&Module::new("app"));
    let error = expect_error(injector.get::<Svc<i32>>("qwe"));
    assert_eq!("Unknown provider: qweProvider", error.to_string());
}

#[test]
fn emit_provider_is_unknown_during_config() {
    let module = Module::new("app");
    module.config(inject(["$emitProvider"], |_: Svc<Emitter>| ()));

    match bootstrap(&module) {
        Err(error @ InjectError::UnknownProvider { .. }) => {
            assert_eq!("Unknown provider: $emitProvider", error.to_string());
        }
        Err(error) => Err(error).unwrap(),
        Ok(_) => unreachable!("$emitProvider should not exist"),
    }
}

#[test]
fn emit_is_injectable_during_run() {
    let emitted = Svc::new(AtomicUsize::new(0));
    let sink = emitted.clone();

    let module = Module::new("app");
    module.run(inject(["$emit", "$on"], move |emit: Svc<Emitter>, on: Svc<Subscriber>| {
        let sink = sink.clone();
        on.on("started", move |_: &DynSvc| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(1, emit.emit("started", ()));
    }));

    start(&module);
    assert_eq!(1, emitted.load(Ordering::SeqCst));
}

#[test]
fn deferred_emit_reaches_handler_once() {
    let (sender, receiver) = oneshot::channel::<()>();
    let receiver = Mutex::new(Some(receiver));

    let module = Module::new("app");
    module.run_async(inject(["$emit"], move |emit: Svc<Emitter>| {
        let receiver = receiver.lock().unwrap().take();
        async move {
            if let Some(receiver) = receiver {
                receiver.await.map_err(|error| InjectError::activation(error))?;
            }
            emit.emit("test", 123i32);
            Ok::<(), InjectError>(())
        }
    }));

    let app = bootstrap(&module).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    app.on("test", move |data: &DynSvc| {
        sink.lock().unwrap().push(*data.downcast_ref::<i32>().unwrap());
    });
    assert!(received.lock().unwrap().is_empty());

    sender.send(()).unwrap();
    let injector = block_on(app).unwrap();
    assert_eq!(vec![123], *received.lock().unwrap());
    assert!(injector.has("$emit"));
}

#[test]
fn provide_value_overrides_factory() {
    let module = Module::new("app");
    module.factory("test", || 123i32);
    module.config(
        inject(["$provide"], |provide: Svc<Provide>| provide.value("test", 456i32)).fallible(),
    );

    let injector = start(&module);
    assert_eq!(456, *injector.get::<Svc<i32>>("test").unwrap());
}

#[test]
fn provided_service_is_visible_to_later_config() {
    let dependencies = Arc::new(Mutex::new(None));
    let sink = dependencies.clone();

    let module = Module::new("app");
    module.constant("abc", 1i32);
    module.config(
        inject(["$provide"], |provide: Svc<Provide>| {
            provide.factory("late", injectable!(|abc: Svc<i32>| *abc + 1))
        })
        .fallible(),
    );
    module.config(inject(["lateProvider"], move |provider: Svc<FactoryProvider>| {
        *sink.lock().unwrap() = Some(provider.dependencies().to_vec());
    }));

    let injector = start(&module);
    assert_eq!(Some(vec!["abc".to_owned()]), *dependencies.lock().unwrap());
    assert_eq!(2, *injector.get::<Svc<i32>>("late").unwrap());
}

#[test]
fn constant_is_the_same_everywhere() {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let module = Module::new("app");
    module.constant("abc", 123i32);
    let config_seen = seen.clone();
    module.config(injectable!(move |abc: Svc<i32>| config_seen.lock().unwrap().push(*abc)));
    let run_seen = seen.clone();
    module.run(injectable!(move |abc: Svc<i32>| run_seen.lock().unwrap().push(*abc)));

    let injector = start(&module);
    seen.lock()
        .unwrap()
        .push(*injector.get::<Svc<i32>>("abc").unwrap());
    assert_eq!(vec![123, 123, 123], *seen.lock().unwrap());
}

#[test]
fn config_runs_once_in_dependency_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let track = |module: &Module| {
        let order = order.clone();
        let name = module.name();
        module.config(move || order.lock().unwrap().push(name.clone()));
    };

    let base = Module::new("base");
    let left = module("left", [&base]);
    let right = module("right", [&base]);
    let app = module("app", [&left, &right]);
    for module in [&base, &left, &right, &app] {
        track(module);
    }

    start(&app);
    assert_eq!(vec!["base", "left", "right", "app"], *order.lock().unwrap());
}

#[test]
fn circular_dependency_is_reported() {
    let module = Module::new("app");
    module
        .factory("a", injectable!(|b: Svc<i32>| *b))
        .factory("b", injectable!(|a: Svc<i32>| *a));

    let injector = start(&module);
    let error = expect_error(injector.get::<Svc<i32>>("a"));
    assert_eq!("Circular dependency found: a <- b <- a", error.to_string());
}

#[test]
fn provider_is_configured_then_realized() {
    struct Http;

    struct UserConfig {
        name: String,
    }

    struct UserService {
        config: Svc<UserConfig>,
        http: Svc<Http>,
    }

    #[derive(Default)]
    struct UserProvider {
        default_name: Mutex<String>,
    }

    impl UserProvider {
        fn set_default_name(&self, name: &str) {
            *self.default_name.lock().unwrap() = name.to_owned();
        }
    }

    impl TypedProvider for UserProvider {
        type Result = UserService;

        fn get(&self) -> Svc<dyn Invoke<UserService>> {
            let name = self.default_name.lock().unwrap().clone();
            Svc::new(
                inject(["$injector"], move |injector: Injector| {
                    let config = UserConfig { name: name.clone() };
                    injector.instantiate_with(
                        inject(
                            ["config", "$http"],
                            |config: Svc<UserConfig>, http: Svc<Http>| UserService {
                                config,
                                http,
                            },
                        ),
                        &Locals::new().with("config", config),
                    )
                })
                .fallible(),
            )
        }
    }

    let module = Module::new("app");
    module.value("$http", Http);
    module.provider_with("user", UserProvider::default);
    module.config(inject(["userProvider"], |provider: Svc<UserProvider>| {
        provider.set_default_name("helen");
    }));

    let injector = start(&module);
    let user: Svc<UserService> = injector.get("user").unwrap();
    assert_eq!("helen", user.config.name);

    let http: Svc<Http> = injector.get("$http").unwrap();
    assert!(Svc::ptr_eq(&http, &user.http));
}

#[test]
fn reserved_names_cannot_be_registered() {
    for name in ["$injector", "$provide", "$emit", "$on"] {
        let module = Module::new("app");
        module.value(name, 1i32);
        match bootstrap(&module) {
            Err(InjectError::ReservedName { name: reserved }) => assert_eq!(name, reserved),
            Err(error) => Err(error).unwrap(),
            Ok(_) => unreachable!("{name} should be reserved"),
        }
    }
}

#[test]
fn failing_run_callback_fails_bootstrap() {
    let module = Module::new("app");
    module.run(injectable!(|| Err::<(), _>(InjectError::activation("boom"))).fallible());

    let error = expect_error(bootstrap(&module));
    assert_eq!("boom", error.to_string());
}

#[test]
fn first_async_failure_rejects_bootstrap() {
    let module = Module::new("app");
    module
        .run_async(|| async { Ok::<(), InjectError>(()) })
        .run_async(|| async { Err::<(), _>(InjectError::activation("first")) })
        .run_async(|| async { Err::<(), _>(InjectError::activation("second")) });

    let error = expect_error(block_on(bootstrap(&module).unwrap()));
    assert_eq!("first", error.to_string());
}

#[test]
fn injector_is_injectable() {
    let module = Module::new("app");
    module.constant("answer", 42i32);
    module.config(inject(["$injector"], |injector: Injector| {
        assert!(injector.has("answer"));
        assert!(!injector.has("$emit"));
    }));
    module.run(inject(["$injector"], |injector: Injector| {
        assert!(injector.has("$emit"));
        assert_eq!(42, *injector.get::<Svc<i32>>("answer").unwrap());
    }));

    start(&module);
}

#[test]
fn provide_is_rejected_after_configuration() {
    let kept: Arc<Mutex<Option<Svc<Provide>>>> = Arc::default();
    let keeper = kept.clone();
    let module = Module::new("app");
    module.config(inject(["$provide"], move |provide: Svc<Provide>| {
        *keeper.lock().unwrap() = Some(provide);
    }));

    let injector = start(&module);
    let provide = kept.lock().unwrap().take().unwrap();
    match provide.value("late", 1i32) {
        Err(InjectError::Sealed { name }) => assert_eq!("late", name),
        Err(error) => Err(error).unwrap(),
        Ok(()) => unreachable!("registration after configuration should fail"),
    }
    assert!(!injector.has("late"));
}

#[test]
fn services_are_listed_and_resolved_by_name() {
    struct ServiceA {
        test: i32,
    }

    struct ServiceB {
        test: i32,
    }

    impl ServiceB {
        fn new() -> Self {
            ServiceB { test: 456 }
        }
    }

    let app = Module::new("app");
    app.service("serviceA", || ServiceA { test: 123 })
        .service("serviceB", ServiceB::new);

    let injector = start(&app);
    let services = injector.services();
    assert_eq!(
        vec!["$emit", "$on", "serviceA", "serviceB"],
        services.names()
    );
    assert!(services.contains("serviceA"));
    assert!(!services.contains("serviceC"));

    assert_eq!(123, services.get::<Svc<ServiceA>>("serviceA").unwrap().test);
    assert_eq!(456, services.get::<Svc<ServiceB>>("serviceB").unwrap().test);
    assert_eq!(
        "Unknown provider: serviceCProvider",
        expect_error(services.get_dyn("serviceC")).to_string()
    );
}

#[test]
fn handler_added_after_emit_is_not_called() {
    let module = Module::new("app");
    module.run(inject(
        ["$emit", "$on"],
        |emit: Svc<Emitter>, on: Svc<Subscriber>| {
            assert_eq!(0, emit.emit("test", 1i32));
            on.on("test", |_: &DynSvc| {});
        },
    ));

    let injector = start(&module);
    let emit: Svc<Emitter> = injector.get("$emit").unwrap();
    assert_eq!(1, emit.emit("test", 2i32));
}

#[test]
fn invoke_and_instantiate_accept_locals() {
    let module = Module::new("app");
    module.constant("base", 2i32);
    let injector = start(&module);

    let sum = injector
        .invoke(inject(["base"], |base: Svc<i32>| *base + 1))
        .unwrap();
    assert_eq!(3, sum);

    let locals = Locals::new().with("base", 10i32);
    let sum = injector
        .invoke_with(inject(["base"], |base: Svc<i32>| *base + 1), &locals)
        .unwrap();
    assert_eq!(11, sum);

    let created: Svc1 = injector
        .instantiate_with(inject(["base"], |base: Svc<i32>| Svc1(*base)), &locals)
        .unwrap();
    assert_eq!(10, created.0);
    assert!(!injector.has("created"));
}
