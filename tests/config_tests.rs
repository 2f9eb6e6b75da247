// Integration tests for configuration loading

use anyhow::Result;
use lingua_rooms::Config;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("absent");

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.service.http.port, 8080);
    assert_eq!(cfg.rooms.max_participants, 50);
    assert!(cfg.rooms.allowed_languages.is_empty());
    assert_eq!(cfg.speech.confidence_threshold, 0.6);
    assert_eq!(cfg.speech.silence_timeout_ms, 5_000);
    assert_eq!(cfg.translation.timeout_secs, 10);
    assert!(cfg.synthesis.auto_speak);

    Ok(())
}

#[test]
fn test_file_values_override_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("lingua.toml");
    fs::write(
        &path,
        r#"
[service.http]
port = 9100

[rooms]
max_participants = 4
allowed_languages = ["en", "es"]

[speech]
max_retries = 5

[[translation.providers]]
name = "primary"
endpoint = "http://translate.local"

[synthesis]
auto_speak = false

[synthesis.voice]
rate = 1.25
"#,
    )?;

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.service.http.port, 9100);
    assert_eq!(cfg.service.http.bind, "127.0.0.1");
    assert_eq!(cfg.rooms.max_participants, 4);
    assert_eq!(cfg.rooms.allowed_languages, vec!["en", "es"]);
    assert_eq!(cfg.speech.max_retries, 5);
    assert_eq!(cfg.speech.confidence_threshold, 0.6);
    assert_eq!(cfg.translation.providers.len(), 1);
    assert_eq!(cfg.translation.providers[0].default_confidence, 0.9);
    assert!(!cfg.synthesis.auto_speak);
    assert_eq!(cfg.synthesis.voice.rate, 1.25);
    assert_eq!(cfg.synthesis.voice.volume, 1.0);

    Ok(())
}
