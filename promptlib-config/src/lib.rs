//! Loader for pipeline configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: the defaults baked into the structs below, an
//! optional `promptlib.yaml`, then `PROMPTLIB__`-prefixed environment
//! variables (`PROMPTLIB__CLASSIFIER__BATCH_SIZE=10`). String values may
//! reference other variables as `${VAR}`; expansion is recursive and capped.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const APIFY_TOKEN_ENV: &str = "APIFY_TOKEN";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptlibConfig {
    /// Root for `all_tweets.json`, `prompt_library.json`, `raw/` and the blacklist.
    pub data_dir: PathBuf,
    pub scraper: ScraperConfig,
    pub classifier: ClassifierConfig,
    pub extraction: ExtractionConfig,
    pub site: SiteConfig,
}

impl Default for PromptlibConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            scraper: ScraperConfig::default(),
            classifier: ClassifierConfig::default(),
            extraction: ExtractionConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

impl PromptlibConfig {
    pub fn all_tweets_path(&self) -> PathBuf {
        self.data_dir.join("all_tweets.json")
    }

    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join("prompt_library.json")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn blacklist_path(&self) -> PathBuf {
        self.data_dir.join("blacklist.txt")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub token: Option<String>,
    pub actor_id: String,
    pub search_term: String,
    pub poll_interval_secs: u64,
    pub base_url: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            token: None,
            actor_id: "apidojo/tweet-scraper".into(),
            search_term: "Seedance prompt".into(),
            poll_interval_secs: 10,
            base_url: "https://api.apify.com/v2/".into(),
        }
    }
}

impl ScraperConfig {
    /// Scraper credential, falling back to `APIFY_TOKEN`.
    pub fn resolved_token(&self) -> Option<String> {
        resolve_secret(self.token.as_deref(), APIFY_TOKEN_ENV)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub batch_size: usize,
    pub batch_delay_secs: u64,
    pub rate_limit_cooldown_secs: u64,
    pub max_prompt_chars: usize,
    pub base_url: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".into(),
            batch_size: 25,
            batch_delay_secs: 3,
            rate_limit_cooldown_secs: 30,
            max_prompt_chars: 200,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

impl ClassifierConfig {
    /// Classifier credential, falling back to `GEMINI_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_secret(self.api_key.as_deref(), GEMINI_API_KEY_ENV)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Product name whose mention unlocks the quoted-span fallback.
    pub tool_name: String,
    /// Handle of the automated reply account to ignore.
    pub bot_handle: String,
    /// Boilerplate phrases of syndicated news coverage.
    pub news_indicators: Vec<String>,
    pub news_threshold: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tool_name: "seedance".into(),
            bot_handle: "grok".into(),
            news_indicators: [
                "Chinese company ByteDance released",
                "Someone tested the new version",
                "It is impossible to distinguish",
                "just 48 hours ago",
                "Lu Huang, an AI consultant",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            news_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub readme_path: PathBuf,
    pub html_path: PathBuf,
    pub gallery_url: String,
    pub repo_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Seedance Prompt Library".into(),
            readme_path: PathBuf::from("README.md"),
            html_path: PathBuf::from("docs").join("index.html"),
            gallery_url: "https://promptlib.miemieweaver.com".into(),
            repo_url: "https://github.com/yangyuwen-bri/seedance-prompt-library".into(),
        }
    }
}

/// `${NAME}` or `$NAME` left behind when the variable was unset.
fn is_unexpanded_placeholder(value: &str) -> bool {
    let Some(rest) = value.strip_prefix('$') else {
        return false;
    };
    let name = match rest.strip_prefix('{') {
        Some(braced) => match braced.strip_suffix('}') {
            Some(name) => name,
            None => return false,
        },
        None => rest,
    };
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_usable_secret(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && !is_unexpanded_placeholder(v)
}

fn resolve_secret(configured: Option<&str>, env_key: &str) -> Option<String> {
    configured
        .filter(|v| is_usable_secret(v))
        .map(|v| v.trim().to_string())
        .or_else(|| {
            std::env::var(env_key)
                .ok()
                .filter(|v| is_usable_secret(v))
                .map(|v| v.trim().to_string())
        })
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix("PROMPTLIB")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("extraction.news_indicators")
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PromptlibConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PromptlibConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptlibConfigLoader {
    /// Start from struct defaults; `PROMPTLIB__` env overrides are layered on at load time.
    ///
    /// ```
    /// use promptlib_config::PromptlibConfigLoader;
    ///
    /// let config = PromptlibConfigLoader::new()
    ///     .with_yaml_str("data_dir: fixtures\nclassifier:\n  batch_size: 5\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.data_dir.to_str(), Some("fixtures"));
    /// assert_eq!(config.classifier.batch_size, 5);
    /// assert_eq!(config.classifier.rate_limit_cooldown_secs, 30);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, for headless runs driven only by env.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use promptlib_config::PromptlibConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_GEMINI_KEY", "injected-from-env"); }
    ///
    /// let config = PromptlibConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// classifier:
    ///   api_key: "${DOCTEST_GEMINI_KEY}"
    ///   model: "gemini-2.0-flash"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.classifier.resolved_api_key().as_deref(), Some("injected-from-env"));
    /// assert_eq!(config.scraper.actor_id, "apidojo/tweet-scraper");
    ///
    /// unsafe { std::env::remove_var("DOCTEST_GEMINI_KEY"); }
    /// ```
    pub fn load(self) -> Result<PromptlibConfig, ConfigError> {
        let cfg = self.builder.add_source(env_overrides()).build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PromptlibConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!(["hello-$CITY", { "loc": "${CITY}-${STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unexpanded_placeholder_is_not_a_credential() {
        temp_env::with_var_unset(APIFY_TOKEN_ENV, || {
            let scraper = ScraperConfig {
                token: Some("${APIFY_TOKEN}".into()),
                ..ScraperConfig::default()
            };
            assert_eq!(scraper.resolved_token(), None);
        });
    }

    #[test]
    fn only_placeholder_shapes_are_rejected() {
        for placeholder in ["${GEMINI_API_KEY}", "$GEMINI_API_KEY", "$apify_token", "${_X1}"] {
            assert!(!is_usable_secret(placeholder), "{placeholder}");
        }
        for secret in ["$9abc-real", "$ecret.Key/1", "$$double", "${unterminated", "$", "abc$DEF"] {
            assert!(is_usable_secret(secret), "{secret}");
        }
    }

    #[test]
    fn dollar_leading_credential_is_kept() {
        temp_env::with_var_unset(APIFY_TOKEN_ENV, || {
            let scraper = ScraperConfig {
                token: Some(" $k3y-with.dots ".into()),
                ..ScraperConfig::default()
            };
            assert_eq!(scraper.resolved_token().as_deref(), Some("$k3y-with.dots"));
        });
    }

    #[test]
    fn credential_falls_back_to_environment() {
        temp_env::with_var(GEMINI_API_KEY_ENV, Some("  key-from-env  "), || {
            let classifier = ClassifierConfig::default();
            assert_eq!(classifier.resolved_api_key().as_deref(), Some("key-from-env"));
        });
    }

    #[test]
    fn blank_credential_is_missing() {
        temp_env::with_var_unset(GEMINI_API_KEY_ENV, || {
            let classifier = ClassifierConfig {
                api_key: Some("   ".into()),
                ..ClassifierConfig::default()
            };
            assert!(classifier.resolved_api_key().is_none());
        });
    }

    #[test]
    fn data_paths_hang_off_data_dir() {
        let cfg = PromptlibConfig {
            data_dir: PathBuf::from("/srv/lib"),
            ..PromptlibConfig::default()
        };
        assert_eq!(cfg.library_path(), PathBuf::from("/srv/lib/prompt_library.json"));
        assert_eq!(cfg.raw_dir(), PathBuf::from("/srv/lib/raw"));
        assert_eq!(cfg.blacklist_path(), PathBuf::from("/srv/lib/blacklist.txt"));
    }
}
