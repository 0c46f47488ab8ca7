use promptlib_config::PromptlibConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
data_dir: ./library-data
scraper:
  token: "${PROMPTLIB_TEST_APIFY}"
  search_term: "Seedance 2.0 prompt"
  poll_interval_secs: 5
classifier:
  api_key: "${PROMPTLIB_TEST_GEMINI}"
  batch_size: 10
extraction:
  bot_handle: grok
  news_threshold: 3
site:
  title: "Test Gallery"
  "#;
    let p = write_yaml(&tmp, "promptlib.yaml", file_yaml);

    temp_env::with_vars(
        [
            ("PROMPTLIB_TEST_APIFY", Some("apify-secret")),
            ("PROMPTLIB_TEST_GEMINI", Some("gemini-secret")),
        ],
        || {
            let config = PromptlibConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load pipeline config");

            assert_eq!(config.data_dir, PathBuf::from("./library-data"));
            assert_eq!(config.scraper.resolved_token().as_deref(), Some("apify-secret"));
            assert_eq!(config.scraper.search_term, "Seedance 2.0 prompt");
            assert_eq!(config.scraper.poll_interval_secs, 5);
            assert_eq!(
                config.classifier.resolved_api_key().as_deref(),
                Some("gemini-secret")
            );
            assert_eq!(config.classifier.batch_size, 10);
            assert_eq!(config.classifier.max_prompt_chars, 200);
            assert_eq!(config.extraction.news_threshold, 3);
            assert_eq!(config.extraction.news_indicators.len(), 5);
            assert_eq!(config.site.title, "Test Gallery");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = PromptlibConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load without a file");

    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert_eq!(config.classifier.batch_size, 25);
    assert_eq!(config.extraction.tool_name, "seedance");
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "promptlib.yaml", "classifier:\n  batch_size: 10\n");

    temp_env::with_var("PROMPTLIB__CLASSIFIER__BATCH_SIZE", Some("7"), || {
        let config = PromptlibConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load with env override");
        assert_eq!(config.classifier.batch_size, 7);
    });
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = PromptlibConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
