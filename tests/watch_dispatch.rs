// tests/watch_dispatch.rs

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use notify::EventKind;
use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind};
use sitepipe::errors::SitepipeError;
use sitepipe::server::{ReloadHandle, ReloadSignal};
use sitepipe::site::Site;
use sitepipe::watch::path_utils::watch_roots;
use sitepipe::watch::{
    Dispatcher, Reaction, WatchEvent, is_content_change, serve_and_watch_until, site_bindings,
    spawn_watcher,
};
use sitepipe_test_utils::builders::{ConfigFileBuilder, SiteFixture};
use sitepipe_test_utils::fake_executor::FakeExecutor;
use sitepipe_test_utils::{init_tracing, with_timeout};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

fn dispatcher(fixture: &SiteFixture, fake: &FakeExecutor, reload: &ReloadHandle) -> Dispatcher {
    let site = fixture.default_site();
    Dispatcher::new(
        fixture.root(),
        site_bindings(&site),
        common::fake_runner(fake),
        Some(reload.clone()),
    )
}

#[tokio::test]
async fn one_save_runs_the_bound_task_once_and_reloads_once() {
    init_tracing();
    let fixture = SiteFixture::new();
    let fake = FakeExecutor::new();
    let reload = ReloadHandle::new();
    let mut client = reload.subscribe();

    let (tx, rx) = mpsc::unbounded_channel();
    let app_js = fixture.path("src/app.js");
    // Editors often produce several events for one save.
    tx.send(WatchEvent::Changed(vec![app_js.clone()])).unwrap();
    tx.send(WatchEvent::Changed(vec![app_js.clone(), app_js])).unwrap();
    tx.send(WatchEvent::Shutdown).unwrap();

    with_timeout(dispatcher(&fixture, &fake, &reload).run(rx))
        .await
        .unwrap();

    assert_eq!(fake.started(), vec!["copyJs"]);
    assert_eq!(client.try_recv(), Ok(ReloadSignal::Reload));
    assert_eq!(client.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn stylesheet_changes_inject_css() {
    init_tracing();
    let fixture = SiteFixture::new();
    let fake = FakeExecutor::new();
    let reload = ReloadHandle::new();
    let mut client = reload.subscribe();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(WatchEvent::Changed(vec![fixture.path("src/css/_vars.scss")]))
        .unwrap();
    tx.send(WatchEvent::Shutdown).unwrap();

    with_timeout(dispatcher(&fixture, &fake, &reload).run(rx))
        .await
        .unwrap();

    assert_eq!(fake.started(), vec!["style"]);
    assert_eq!(client.try_recv(), Ok(ReloadSignal::InjectCss));
}

#[tokio::test]
async fn failed_task_sends_no_signal_and_does_not_stop_watching() {
    init_tracing();
    let fixture = SiteFixture::new();
    let fake = FakeExecutor::new().failing("genHtml");
    let reload = ReloadHandle::new();
    let mut client = reload.subscribe();

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(dispatcher(&fixture, &fake, &reload).run(rx));

    tx.send(WatchEvent::Changed(vec![fixture.path("src/pages/index.pug")]))
        .unwrap();
    with_timeout(async {
        while fake.completed() < 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    tx.send(WatchEvent::Changed(vec![fixture.path("src/assets/images/a.png")]))
        .unwrap();
    tx.send(WatchEvent::Shutdown).unwrap();
    with_timeout(handle).await.unwrap().unwrap();

    assert_eq!(fake.started(), vec!["genHtml", "copyImages"]);
    assert_eq!(client.try_recv(), Ok(ReloadSignal::Reload));
    assert_eq!(client.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn unrelated_paths_run_nothing() {
    let fixture = SiteFixture::new();
    let fake = FakeExecutor::new();
    let reload = ReloadHandle::new();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(WatchEvent::Changed(vec![
        fixture.path("README.md"),
        fixture.path("build/app.js"),
        fixture.path("src/notes.txt"),
    ]))
    .unwrap();
    drop(tx);

    with_timeout(dispatcher(&fixture, &fake, &reload).run(rx))
        .await
        .unwrap();

    assert!(fake.started().is_empty());
}

#[test]
fn batch_matching_fires_each_binding_once_in_order() {
    let fixture = SiteFixture::new();
    let fake = FakeExecutor::new();
    let dispatcher = dispatcher(&fixture, &fake, &ReloadHandle::new());

    let hits = dispatcher.matching(&[
        fixture.path("src/assets/fonts/a.ttf"),
        fixture.path("src/main.scss"),
        fixture.path("src/other.scss"),
        fixture.path("src/index.pug"),
    ]);

    // Bindings: styles, templates, scripts, fonts, images.
    assert_eq!(hits, vec![0, 1, 3]);
}

#[test]
fn built_in_bindings() {
    let fixture = SiteFixture::new();
    let site = fixture.default_site();
    let bindings = site_bindings(&site);

    let summary: Vec<(&str, Reaction)> = bindings
        .iter()
        .map(|b| (b.task(), b.reaction()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("style", Reaction::InjectCss),
            ("genHtml", Reaction::Reload),
            ("copyJs", Reaction::Reload),
            ("copyFonts", Reaction::Reload),
            ("copyImages", Reaction::Reload),
        ]
    );
    assert!(bindings[3].matches("src/assets/fonts/x/y.woff"));
    assert!(!bindings[3].matches("src/assets/fonts/y.otf"));
}

#[test]
fn watch_roots_collapse_to_existing_ancestors() {
    let fixture = SiteFixture::new();
    fixture.write("src/app.js", "");
    let site = fixture.default_site();
    let bindings = site_bindings(&site);

    let roots = watch_roots(fixture.root(), bindings.iter().map(|b| b.glob().base()));

    // src/assets/fonts and src/assets/images do not exist yet; their
    // nearest existing ancestor is src.
    assert_eq!(roots, vec![fixture.path("src")]);
}

#[test]
fn only_content_changes_count() {
    assert!(is_content_change(&EventKind::Create(CreateKind::File)));
    assert!(is_content_change(&EventKind::Remove(RemoveKind::File)));
    assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(
        DataChange::Content
    ))));
    assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::Permissions
    ))));
    assert!(!is_content_change(&EventKind::Access(AccessKind::Read)));
}

#[tokio::test]
async fn real_file_writes_reach_the_event_channel() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture.write("src/.keep", "");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(&[fixture.path("src")], tx).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    fixture.write("src/app.js", "console.log(1);\n");

    let seen = with_timeout(async {
        loop {
            match rx.recv().await {
                Some(WatchEvent::Changed(paths))
                    if paths.iter().any(|p| p.ends_with("app.js")) =>
                {
                    break paths;
                }
                Some(_) => continue,
                None => panic!("watcher channel closed"),
            }
        }
    })
    .await;

    assert!(!seen.is_empty());
}

/// Overwrite `rel` in place with one write call, so the save produces a
/// single data-change event.
fn overwrite(fixture: &SiteFixture, rel: &str, contents: &str) {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(fixture.path(rel))
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

#[tokio::test]
async fn saving_a_script_copies_it_to_build_and_reloads_once() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture.write("src/app.js", "old contents\n");
    let cfg = ConfigFileBuilder::new().build();
    let site = fixture.site(&cfg);
    let reload = ReloadHandle::new();
    let mut client = reload.subscribe();

    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(&[fixture.path("src")], tx.clone()).unwrap();
    let dispatcher = Dispatcher::new(
        fixture.root(),
        site_bindings(&site),
        common::pipeline_runner(&fixture, &cfg),
        Some(reload.clone()),
    );
    let handle = tokio::spawn(dispatcher.run(rx));

    tokio::time::sleep(Duration::from_millis(100)).await;
    overwrite(&fixture, "src/app.js", "new contents\n");

    assert_eq!(with_timeout(client.recv()).await, Ok(ReloadSignal::Reload));
    assert_eq!(fixture.read("build/app.js"), "new contents\n");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(client.try_recv(), Err(TryRecvError::Empty));

    tx.send(WatchEvent::Shutdown).unwrap();
    with_timeout(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn watch_leaf_rebuilds_until_shutdown() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture.write("src/app.js", "old contents\n");
    let cfg = ConfigFileBuilder::new().with_port(0).build();
    let site = Arc::new(fixture.site(&cfg));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(serve_and_watch_until(
        site,
        common::pipeline_runner(&fixture, &cfg),
        async move {
            let _ = stop_rx.await;
        },
    ));

    // The watcher starts after the server; keep saving until a copy lands.
    with_timeout(async {
        loop {
            overwrite(&fixture, "src/app.js", "new contents\n");
            tokio::time::sleep(Duration::from_millis(100)).await;
            if std::fs::read_to_string(fixture.path("build/app.js")).ok().as_deref()
                == Some("new contents\n")
            {
                break;
            }
        }
    })
    .await;

    stop_tx.send(()).unwrap();
    with_timeout(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn watch_leaf_needs_an_existing_source_directory() {
    let fixture = SiteFixture::new();
    let cfg = ConfigFileBuilder::new().with_port(0).build();
    let site = Arc::new(Site::new(fixture.path("gone"), &cfg).unwrap());
    let runner = common::fake_runner(&FakeExecutor::new());

    match with_timeout(serve_and_watch_until(site, runner, std::future::pending())).await {
        Err(SitepipeError::ConfigError(msg)) => assert!(msg.contains("nothing to watch"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    // Nothing was created or started.
    assert!(!fixture.exists("gone"));
}

#[tokio::test]
async fn watch_leaf_reports_server_startup_failure() {
    let fixture = SiteFixture::new();
    fixture.write("src/app.js", "");
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let cfg = ConfigFileBuilder::new().with_port(port).build();
    let site = Arc::new(fixture.site(&cfg));
    let runner = common::fake_runner(&FakeExecutor::new());

    match with_timeout(serve_and_watch_until(site, runner, std::future::pending())).await {
        Err(SitepipeError::Server(msg)) => assert!(msg.contains("cannot listen"), "{msg}"),
        other => panic!("expected Server error, got {other:?}"),
    }
}
