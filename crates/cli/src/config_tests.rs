// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn explicit_data_dir_wins() {
    let dir = resolve_data_dir(Some(PathBuf::from("/srv/fitsync"))).unwrap();
    assert_eq!(dir, PathBuf::from("/srv/fitsync"));
}

#[test]
fn paths_live_under_data_dir() {
    let dir = Path::new("/srv/fitsync");
    assert_eq!(config_path(dir), PathBuf::from("/srv/fitsync/config.toml"));
    assert_eq!(db_path(dir), PathBuf::from("/srv/fitsync/sync.db"));
}

#[test]
fn init_creates_nested_dir_with_default_config() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("nested").join("fitsync");

    let config = init_data_dir(&data_dir, false).unwrap();
    assert_eq!(config, SyncConfig::default());
    assert_eq!(load_config(&data_dir).unwrap(), SyncConfig::default());
}

#[test]
fn init_twice_requires_force() {
    let temp = TempDir::new().unwrap();
    init_data_dir(temp.path(), false).unwrap();

    let err = init_data_dir(temp.path(), false).unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized(_)));
    assert!(init_data_dir(temp.path(), true).is_ok());
}

#[test]
fn load_without_init_is_not_initialized() {
    let temp = TempDir::new().unwrap();
    let err = load_config(temp.path()).unwrap_err();
    assert!(matches!(err, Error::NotInitialized(path) if path.ends_with("config.toml")));
}

#[test]
fn invalid_config_reports_path() {
    let temp = TempDir::new().unwrap();
    fs::write(config_path(temp.path()), "[processor]\nbatch_size = 0\n").unwrap();

    let err = load_config(temp.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("config.toml"));
}
