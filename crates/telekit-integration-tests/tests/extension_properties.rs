//! Integration tests for extension registration through the lifecycle manager.

mod common;

use telekit_plugins::{PluginError, PluginState};
use telekit_test::{MockPlugin, test_descriptor};

use common::{
    BarExtension, FooExtension, Tool, bar_contribution, foo_contribution,
    manager_with_tool_point, tool_labels,
};

#[tokio::test]
async fn plugin_with_only_foo_does_not_provide_bar() {
    let mut manager = manager_with_tool_point();
    let unit = MockPlugin::new()
        .with_extension(foo_contribution())
        .into_unit(test_descriptor("foo"));
    manager.discover(unit).unwrap();
    assert!(manager.boot_all().await.is_clean());

    let registry = manager.registry();
    assert!(registry.provides_extensions_of_type::<dyn Tool>());
    assert!(registry.provides_extension_impl::<FooExtension>());
    assert!(!registry.provides_extension_impl::<BarExtension>());
    assert_eq!(tool_labels(&manager), vec!["foo"]);
}

#[tokio::test]
async fn extensions_keep_plugin_load_order() {
    let mut manager = manager_with_tool_point();
    manager
        .discover(
            MockPlugin::new()
                .with_extension(foo_contribution())
                .into_unit(test_descriptor("plugin-a")),
        )
        .unwrap();
    manager
        .discover(
            MockPlugin::new()
                .with_extension(bar_contribution())
                .into_unit(test_descriptor("plugin-b")),
        )
        .unwrap();

    let report = manager.boot_all().await;
    assert_eq!(report.started.len(), 2);
    assert_eq!(tool_labels(&manager), vec!["foo", "bar"]);

    let contributors: Vec<String> = manager
        .registry()
        .extensions_of_type::<dyn Tool>()
        .iter()
        .map(|e| e.plugin_id().to_string())
        .collect();
    assert_eq!(contributors, vec!["plugin-a", "plugin-b"]);
}

#[tokio::test]
async fn contribution_to_undeclared_point_fails_load() {
    trait Undeclared: Send + Sync {}
    struct Impl;
    impl Undeclared for Impl {}

    let mut manager = manager_with_tool_point();
    let unit = MockPlugin::new()
        .with_extension(foo_contribution())
        .with_extension(telekit_plugins::ExtensionContribution::new::<dyn Undeclared, Impl, _>(
            |_| Ok(std::sync::Arc::new(Impl) as std::sync::Arc<dyn Undeclared>),
        ))
        .into_unit(test_descriptor("rogue"));
    let id = unit.descriptor().id().clone();
    manager.discover(unit).unwrap();
    manager.install(&id).unwrap();

    let err = manager.load(&id).unwrap_err();
    assert!(matches!(err, PluginError::LoadFailed { .. }));
    assert_eq!(manager.state(&id), Some(PluginState::Failed));
    assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
}
