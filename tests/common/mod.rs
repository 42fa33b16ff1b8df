/*!
 * Common test utilities for the rpgmtl test suite
 */

use anyhow::Result;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use rpgmtl::resource::{ContentClass, TranslationUnit};

/// Route library logs to the test harness output once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A small roster with a null hole, an empty nickname and a note that must survive
pub fn sample_roster() -> Value {
    json!([
        null,
        {
            "id": 1,
            "name": "ハロルド",
            "nickname": "勇者",
            "profile": "王国の騎士。\n正義感が強い。",
            "note": "<Tag:1>",
            "classId": 1,
            "initialLevel": 1
        },
        null,
        {
            "id": 3,
            "name": "テレーズ",
            "nickname": "",
            "profile": "魔法使い",
            "note": "",
            "classId": 2,
            "initialLevel": 5
        }
    ])
}

/// Writes `sample_roster()` as `<dir>/data/Actors.json`
pub fn create_test_roster(dir: &Path) -> Result<PathBuf> {
    create_test_file(dir, "data/Actors.json", &serde_json::to_string(&sample_roster())?)
}

/// `count` name units with distinct sources "unit 1", "unit 2", ...
pub fn numbered_units(count: usize) -> Vec<TranslationUnit> {
    (1..=count)
        .map(|i| {
            TranslationUnit::new(i.to_string(), "name", format!("unit {}", i), "data/Actors.json")
                .with_context("Character name")
                .with_content_class(ContentClass::Name)
        })
        .collect()
}
