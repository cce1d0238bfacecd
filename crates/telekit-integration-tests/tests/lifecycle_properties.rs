//! Integration tests for plugin lifecycle transitions.

mod common;

use std::sync::Arc;

use telekit_plugins::{FailureStage, PluginError, PluginEvent, PluginId, PluginState};
use telekit_test::{MockPlugin, init_test_tracing, test_descriptor, test_descriptor_requiring};
use tokio::sync::broadcast;

use common::{Tool, bar_contribution, foo_contribution, manager_with_tool_point, tool_labels};

fn drain(rx: &mut broadcast::Receiver<PluginEvent>) -> Vec<(PluginId, PluginState)> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PluginEvent::StateChanged { plugin_id, to, .. } = event {
            seen.push((plugin_id, to));
        }
    }
    seen
}

#[tokio::test]
async fn incompatible_plugin_fails_without_loading() {
    init_test_tracing();
    let mut manager = manager_with_tool_point();
    let mut events = manager.subscribe();
    let counts = {
        let mock = MockPlugin::new().with_extension(foo_contribution());
        let counts = mock.counts();
        manager
            .discover(mock.into_unit(test_descriptor_requiring("future", ">=2.0.0")))
            .unwrap();
        counts
    };
    let id = PluginId::from_static("future");

    let err = manager.install(&id).unwrap_err();
    assert!(matches!(err, PluginError::Incompatible { .. }));
    assert_eq!(manager.state(&id), Some(PluginState::Failed));
    assert_eq!(
        manager.record(&id).unwrap().failure.unwrap().stage,
        FailureStage::Install
    );

    let states: Vec<PluginState> = drain(&mut events).into_iter().map(|(_, s)| s).collect();
    assert_eq!(states, vec![PluginState::Discovered, PluginState::Failed]);
    assert_eq!(counts.constructions(), 0);
    assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
}

#[tokio::test]
async fn stopping_removes_all_contributions() {
    let mut manager = manager_with_tool_point();
    let unit = MockPlugin::new()
        .with_extension(foo_contribution())
        .with_binding(Arc::new(String::from("plugin service")))
        .into_unit(test_descriptor("stoppable"));
    let id = unit.descriptor().id().clone();
    manager.discover(unit).unwrap();
    manager.boot_all().await;

    assert!(manager.registry().provides_extensions_of_type::<dyn Tool>());
    assert!(manager.container().has_binding::<String>());

    manager.stop(&id).await.unwrap();
    assert_eq!(manager.state(&id), Some(PluginState::Stopped));
    assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
    assert!(!manager.container().has_binding::<String>());
}

#[tokio::test]
async fn failing_start_leaves_no_contributions() {
    for mock in [
        MockPlugin::new().failing_start(),
        MockPlugin::new().panicking_start(),
    ] {
        let mut manager = manager_with_tool_point();
        let unit = mock
            .with_extension(foo_contribution())
            .into_unit(test_descriptor("flaky"));
        let id = unit.descriptor().id().clone();
        manager.discover(unit).unwrap();

        let report = manager.boot_all().await;
        assert!(report.started.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].failure.stage, FailureStage::Start);
        assert_eq!(manager.state(&id), Some(PluginState::Failed));
        assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
    }
}

#[tokio::test]
async fn one_failure_does_not_block_other_plugins() {
    let mut manager = manager_with_tool_point();
    manager
        .discover(
            MockPlugin::new()
                .with_extension(foo_contribution())
                .panicking_entry_point()
                .into_unit(test_descriptor("broken")),
        )
        .unwrap();
    manager
        .discover(
            MockPlugin::new()
                .with_extension(bar_contribution())
                .into_unit(test_descriptor("healthy")),
        )
        .unwrap();

    let report = manager.boot_all().await;
    assert_eq!(report.started, vec![PluginId::from_static("healthy")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].plugin_id.as_str(), "broken");
    assert_eq!(tool_labels(&manager), vec!["bar"]);

    let failures = manager.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].failure.message.contains("panicked"));
}

#[tokio::test]
async fn failing_stop_still_stops_and_unwires() {
    let mut manager = manager_with_tool_point();
    let mock = MockPlugin::new()
        .with_extension(foo_contribution())
        .failing_stop();
    let counts = mock.counts();
    let unit = mock.into_unit(test_descriptor("sticky"));
    let id = unit.descriptor().id().clone();
    manager.discover(unit).unwrap();
    manager.boot_all().await;

    let errors = manager.stop_all().await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], PluginError::StopFailed { .. }));
    assert_eq!(counts.stop_calls(), 1);
    assert_eq!(manager.state(&id), Some(PluginState::Stopped));
    assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
}

#[tokio::test]
async fn disable_and_enable_round_trip() {
    let registry = telekit_plugins::ExtensionRegistry::new();
    registry.register_extension_point::<dyn Tool>();
    let mut manager = telekit_plugins::PluginManager::builder(telekit_test::test_host_version())
        .registry(registry)
        .disabled([PluginId::from_static("optional")])
        .build()
        .unwrap();
    let mock = MockPlugin::new().with_extension(foo_contribution());
    let counts = mock.counts();
    manager
        .discover(mock.into_unit(test_descriptor("optional")))
        .unwrap();
    let id = PluginId::from_static("optional");

    let report = manager.boot_all().await;
    assert_eq!(report.disabled, vec![id.clone()]);
    assert_eq!(manager.state(&id), Some(PluginState::Disabled));
    assert_eq!(counts.constructions(), 0);

    assert_eq!(manager.enable(&id).await.unwrap(), PluginState::Started);
    assert!(!manager.is_disabled(&id));
    assert_eq!(tool_labels(&manager), vec!["foo"]);

    manager.disable(&id).await.unwrap();
    assert_eq!(manager.state(&id), Some(PluginState::Disabled));
    assert!(tool_labels(&manager).is_empty());
}
