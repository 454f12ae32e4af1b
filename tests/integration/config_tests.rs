use clap::Parser;
use dupfind::actions::Action;
use dupfind::cli::Cli;
use dupfind::config::{Config, ConfigError};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

use crate::ENV_MUTEX;

fn clear_env() {
    for key in [
        "DUPFIND_MIN_SIZE",
        "DUPFIND_ACTION",
        "DUPFIND_EXTENSION_SENSITIVE",
        "DUPFIND_CHANNEL_CAPACITY",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config = Config::from_figment(figment).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.action, "print");
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
min_size = 2048
extension_sensitive = false
action = "verbose"
channel_capacity = 8
exclude = ["node_modules", ".git"]
"#,
    )
    .unwrap();

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&path));
    let config = Config::from_figment(figment).unwrap();

    assert_eq!(config.min_size, 2048);
    assert!(!config.extension_sensitive);
    assert_eq!(config.action, "verbose");
    assert_eq!(config.channel_capacity, 8);
    assert_eq!(config.exclude, vec!["node_modules", ".git"]);
    // Unset keys keep their defaults
    assert!(!config.permanent);
}

#[test]
fn test_config_invalid_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = \"lots\"").unwrap();

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&path));
    assert!(matches!(
        Config::from_figment(figment),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_config_load_from_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    std::env::set_var("DUPFIND_MIN_SIZE", "512");
    std::env::set_var("DUPFIND_ACTION", "dontask");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("DUPFIND_"));
    let config = Config::from_figment(figment).unwrap();

    assert_eq!(config.min_size, 512);
    assert_eq!(config.action, "dontask");

    clear_env();
}

#[test]
fn test_layer_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 100\naction = \"verbose\"\nchannel_capacity = 5\n").unwrap();

    // env beats file
    std::env::set_var("DUPFIND_MIN_SIZE", "200");
    std::env::set_var("DUPFIND_CHANNEL_CAPACITY", "7");

    let cli = Cli::try_parse_from(["dupfind", "-s", "300"]).unwrap();
    let config = Config::load(Some(&path)).unwrap().with_cli_overrides(&cli);
    clear_env();

    // CLI beats env, env beats file, file beats defaults
    assert_eq!(config.min_size, 300);
    assert_eq!(config.channel_capacity, 7);
    assert_eq!(config.action, "verbose");
    assert!(config.extension_sensitive);
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn test_resolve_from_toml_action() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "action = \"delete\"\npermanent = true\nassume_yes = true\n").unwrap();

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&path));
    let settings = Config::from_figment(figment)
        .unwrap()
        .resolve(Some(dir.path()))
        .unwrap();

    assert_eq!(settings.action, Action::Delete);
    assert!(settings.delete.permanent);
    assert!(settings.assume_yes);
}
