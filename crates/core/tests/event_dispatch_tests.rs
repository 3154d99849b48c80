//! Event dispatch after the application is ready: ordering, payload
//! injection, handler failure isolation and shutdown.

use std::sync::{Arc, Mutex};

use trellis_core::{
    Application, ApplicationBootstrapper, BaseProvider, BootConfig, CoreError, Extras,
    Injectable, InvocationSite, ProviderError, PAYLOAD, READY_EVENT, REQUEST, RESPONSE,
    SHUTDOWN_EVENT,
};

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log, entry: &str) -> Injectable {
    let log = log.clone();
    let entry = entry.to_string();
    Injectable::from_fn(Vec::<String>::new(), move |_| {
        log.lock().unwrap().push(entry.clone());
        Ok(())
    })
}

fn listener(name: &str, event: &str, log: &Log) -> BaseProvider {
    BaseProvider::new(name)
        .with_handler("on_event", recorder(log, name))
        .listen(event, "on_event")
}

async fn boot(providers: Vec<BaseProvider>) -> Application {
    let mut bootstrapper = ApplicationBootstrapper::new(BootConfig::new());
    for provider in providers {
        bootstrapper.add_provider(provider);
    }
    bootstrapper.run().await.unwrap()
}

#[tokio::test]
async fn test_ready_is_dispatched_in_boot_order() {
    let log: Log = Arc::default();
    let _app = boot(vec![
        listener("server", READY_EVENT, &log).with_requires(["router"]),
        listener("router", READY_EVENT, &log),
        BaseProvider::new("quiet"),
    ])
    .await;

    assert_eq!(*log.lock().unwrap(), vec!["router", "server"]);
}

#[tokio::test]
async fn test_failing_handler_does_not_stop_others() {
    let log: Log = Arc::default();
    let app = boot(vec![
        BaseProvider::new("audit")
            .with_handler(
                "record",
                Injectable::from_fn(Vec::<String>::new(), |_| {
                    Err(ProviderError::failed("audit store offline"))
                }),
            )
            .listen("order.placed", "record"),
        listener("mailer", "order.placed", &log),
    ])
    .await;

    let report = app.emit("order.placed", None).await;
    assert_eq!(report.handled, vec!["mailer"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].provider, "audit");
    assert_eq!(report.failures[0].method, "record");
    assert!(!report.is_success());
    assert_eq!(report.invoked(), 2);
    assert_eq!(*log.lock().unwrap(), vec!["mailer"]);
}

#[tokio::test]
async fn test_unbound_handler_method_is_reported() {
    let app = boot(vec![BaseProvider::new("metrics").listen("tick", "on_tick")]).await;

    let report = app.emit("tick", None).await;
    assert!(report.handled.is_empty());
    assert!(matches!(
        report.failures[0].error,
        CoreError::HandlerNotFound { ref method, .. } if method == "on_tick"
    ));
}

#[tokio::test]
async fn test_event_without_listeners_is_a_no_op() {
    let app = boot(vec![BaseProvider::new("config")]).await;

    let report = app.emit("nobody.cares", None).await;
    assert!(report.is_success());
    assert_eq!(report.invoked(), 0);
}

#[tokio::test]
async fn test_payload_is_injected_by_name() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let app = boot(vec![BaseProvider::new("mailer")
        .with_handler(
            "welcome",
            Injectable::from_fn([PAYLOAD], move |deps| {
                *sink.lock().unwrap() = Some(deps.get::<String>(PAYLOAD)?.to_string());
                Ok(())
            }),
        )
        .listen("user.created", "welcome")])
    .await;

    let report = app
        .emit("user.created", Some(Arc::new(String::from("ada@example.com"))))
        .await;
    assert!(report.is_success());
    assert_eq!(seen.lock().unwrap().as_deref(), Some("ada@example.com"));

    // Without a payload the reserved name is unbound
    let report = app.emit("user.created", None).await;
    assert!(report.failures[0].error.is_missing_dependency());
}

#[tokio::test]
async fn test_raised_events_are_delivered_on_dispatch_pending() {
    let log: Log = Arc::default();
    let mut app = boot(vec![
        BaseProvider::new("orders")
            .with_handler(
                "place",
                Injectable::from_fn(["app"], |deps| {
                    deps.app().raise("order.placed", None)?;
                    Ok(())
                }),
            )
            .listen("checkout", "place"),
        listener("mailer", "order.placed", &log),
    ])
    .await;

    app.context().raise("checkout", None).unwrap();
    assert!(log.lock().unwrap().is_empty());

    // Events raised by a handler wait for the next drain
    let reports = app.dispatch_pending().await;
    let events: Vec<&str> = reports.iter().map(|r| r.event.as_str()).collect();
    assert_eq!(events, vec!["checkout"]);
    assert!(log.lock().unwrap().is_empty());

    let reports = app.dispatch_pending().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].event, "order.placed");
    assert_eq!(*log.lock().unwrap(), vec!["mailer"]);

    assert!(app.dispatch_pending().await.is_empty());
}

#[tokio::test]
async fn test_self_raising_handler_is_delivered_once_per_drain() {
    let ticks = Arc::new(Mutex::new(0_u32));
    let counter = ticks.clone();
    let mut app = boot(vec![BaseProvider::new("ticker")
        .with_handler(
            "on_tick",
            Injectable::from_fn(["app"], move |deps| {
                *counter.lock().unwrap() += 1;
                deps.app().raise("tick", None)?;
                Ok(())
            }),
        )
        .listen("tick", "on_tick")])
    .await;

    app.context().raise("tick", None).unwrap();
    assert_eq!(app.dispatch_pending().await.len(), 1);
    assert_eq!(app.dispatch_pending().await.len(), 1);
    assert_eq!(*ticks.lock().unwrap(), 2);

    let report = app.shutdown().await;
    assert!(report.is_success());
    assert_eq!(*ticks.lock().unwrap(), 3);
}

#[tokio::test]
async fn test_ready_report_is_kept_on_the_application() {
    let log: Log = Arc::default();
    let app = boot(vec![
        BaseProvider::new("server")
            .with_handler(
                "announce",
                Injectable::from_fn(Vec::<String>::new(), |_| {
                    Err(ProviderError::failed("address in use"))
                }),
            )
            .listen(READY_EVENT, "announce"),
        listener("metrics", READY_EVENT, &log),
    ])
    .await;

    let report = app.ready_report();
    assert_eq!(report.event, READY_EVENT);
    assert_eq!(report.handled, vec!["metrics"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].provider, "server");
    assert_eq!(report.failures[0].method, "announce");
}

#[tokio::test]
async fn test_shutdown_runs_in_reverse_boot_order() {
    let log: Log = Arc::default();
    let app = boot(vec![
        listener("database", SHUTDOWN_EVENT, &log),
        listener("cache", SHUTDOWN_EVENT, &log).with_requires(["database"]),
        listener("server", SHUTDOWN_EVENT, &log).with_requires(["cache"]),
    ])
    .await;

    let report = app.shutdown().await;
    assert_eq!(report.event, SHUTDOWN_EVENT);
    assert_eq!(report.handled, vec!["server", "cache", "database"]);
    assert_eq!(*log.lock().unwrap(), vec!["server", "cache", "database"]);
}

#[tokio::test]
async fn test_request_scoped_invoke_uses_extras() {
    let app = boot(vec![BaseProvider::new("config").on_register(Injectable::from_fn(
        Vec::<String>::new(),
        |deps| {
            deps.services().register("greeting", String::from("hello"), None)?;
            Ok(())
        },
    ))])
    .await;

    let body = Arc::new(Mutex::new(String::new()));
    let handler = Injectable::from_fn([REQUEST, RESPONSE, "greeting"], |deps| {
        let path = deps.get::<&str>(REQUEST)?;
        let greeting = deps.get::<String>("greeting")?;
        let response = deps.get::<Arc<Mutex<String>>>(RESPONSE)?;
        *response.lock().unwrap() = format!("{} from {}", greeting, path);
        Ok(())
    });

    let extras = Extras::new()
        .with(REQUEST, "/home")
        .with(RESPONSE, body.clone());
    app.invoke(InvocationSite::new("router", "home"), &handler, &extras)
        .await
        .unwrap();
    assert_eq!(*body.lock().unwrap(), "hello from /home");

    let err = app
        .invoke(InvocationSite::new("router", "home"), &handler, &Extras::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::MissingDependency { ref parameter, .. } if parameter == REQUEST
    ));
}
