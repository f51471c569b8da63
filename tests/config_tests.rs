mod common;

use common::setup_config_manager;
use planner_core::config::Config;

#[test]
fn missing_file_loads_defaults() {
    let manager = setup_config_manager();
    assert!(!manager.path().exists());
    let config = manager.load().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.simulation, "Default");
    assert_eq!(config.request_timeout_secs, 30);
}

#[test]
fn save_replaces_file_atomically() {
    let manager = setup_config_manager();
    let config = Config {
        api_base_url: "https://planner.example".into(),
        simulation: "Raise".into(),
        log_filter: Some("planner_core=debug".into()),
        ..Config::default()
    };
    manager.save(&config).unwrap();
    assert!(manager.path().ends_with("config/config.json"));
    assert!(!manager.path().with_extension("json.tmp").exists());
    assert_eq!(manager.load().unwrap(), config);

    let updated = Config {
        loading_debounce_ms: 400,
        ..config
    };
    manager.save(&updated).unwrap();
    assert_eq!(manager.load().unwrap().loading_debounce_ms, 400);
}

#[test]
fn corrupt_file_is_an_error() {
    let manager = setup_config_manager();
    std::fs::write(manager.path(), "{ not json").unwrap();
    assert!(manager.load().is_err());
}
