//! Startup configuration for ragchat.
//!
//! Configuration is resolved once, validated, and then passed by reference. Values
//! come from builder setters (CLI flags), then the process environment, then
//! defaults. A `.env` file can seed the environment before building but never
//! overrides variables that are already set.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable holding the API key unless another name is configured.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable for the RAG service base URL.
pub const BASE_URL_VAR: &str = "RAG_BASE_URL";
/// Environment variable for the RAG application identifier.
pub const APP_ID_VAR: &str = "RAG_APP_ID";
/// Environment variable for the native library directory.
pub const LIB_DIR_VAR: &str = "RAG_LIB_DIR";
/// Environment variable for comma-separated ingestion sources.
pub const SOURCES_VAR: &str = "RAG_SOURCES";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_APP_ID: &str = "default";

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is absent or blank
    #[error("missing secret: environment variable {name} is not set")]
    MissingSecret { name: String },

    /// The configured native library directory does not exist
    #[error("missing native dependency: library directory {} does not exist", path.display())]
    MissingNativeDependency { path: PathBuf },

    /// The RAG service URL does not parse or cannot carry request paths
    #[error("invalid RAG service URL: {0}")]
    InvalidUrl(String),

    /// The page metadata file could not be read
    #[error("failed to read page file {}: {source}", path.display())]
    PageFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The page metadata file is not valid JSON for a page
    #[error("invalid page file {}: {source}", path.display())]
    PageFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The `.env` file exists but could not be read or parsed
    #[error("failed to load environment file: {0}")]
    EnvFile(#[source] dotenvy::Error),
}

/// API key for the RAG service.
///
/// `Debug` output is redacted so the key never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key for use in request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Horizontal direction of page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Page metadata: every user-visible string plus text direction.
///
/// One interaction handler serves every page variant; the variants differ only in
/// this record. Page files are JSON objects using the field names below; missing
/// fields keep their English defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub subtitle: String,
    pub input_label: String,
    pub submit_label: String,
    pub busy_text: String,
    pub answer_label: String,
    pub error_prefix: String,
    pub empty_warning: String,
    pub sidebar_header: String,
    pub load_label: String,
    pub load_busy_text: String,
    pub load_success: String,
    pub load_error_prefix: String,
    pub direction: TextDirection,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Ask the Assistant".to_string(),
            subtitle: "This assistant answers your questions. What's on your mind?".to_string(),
            input_label: "Enter your question".to_string(),
            submit_label: "Ask".to_string(),
            busy_text: "Processing your question...".to_string(),
            answer_label: "Answer:".to_string(),
            error_prefix: "An error occurred".to_string(),
            empty_warning: "Please enter a question before pressing 'Ask'.".to_string(),
            sidebar_header: "Additional options".to_string(),
            load_label: "Load files".to_string(),
            load_busy_text: "Loading files...".to_string(),
            load_success: "Files loaded successfully.".to_string(),
            load_error_prefix: "Error loading files".to_string(),
            direction: TextDirection::Ltr,
        }
    }
}

impl PageConfig {
    /// The Arabic right-to-left page.
    pub fn arabic() -> Self {
        Self {
            title: "اسأل الدكتور رائد".to_string(),
            subtitle: "هذا المساعد الذكي يجيب على اسئلتك ! ماذا يدور في عقلك".to_string(),
            input_label: "أدخل سؤالك هنا:".to_string(),
            submit_label: "اسأل".to_string(),
            busy_text: "جاري معالجة سؤالك...".to_string(),
            answer_label: "الإجابة:".to_string(),
            error_prefix: "حدث خطأ".to_string(),
            empty_warning: "يرجى إدخال سؤال قبل الضغط على 'اسأل'.".to_string(),
            sidebar_header: "خيارات إضافية".to_string(),
            load_label: "تحميل الملفات".to_string(),
            load_busy_text: "جاري تحميل الملفات...".to_string(),
            load_success: "تم تحميل الملفات بنجاح.".to_string(),
            load_error_prefix: "خطأ في تحميل الملفات".to_string(),
            direction: TextDirection::Rtl,
        }
    }

    /// Reads page metadata from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::PageFile` if the file cannot be read and
    /// `ConfigError::PageFormat` if it is not a valid page object.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::PageFile {
            path: path.to_path_buf(),
            source,
        })?;
        let page = serde_json::from_str(&contents).map_err(|source| ConfigError::PageFormat {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded page file");
        Ok(page)
    }

    /// Returns a copy with the given text direction.
    #[must_use]
    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Returns a copy with the given page title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Connection settings for the RAG service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub app_id: String,
    pub api_key: ApiKey,
}

/// Validated configuration record.
#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub page: PageConfig,
    /// Number of `-v` flags given on the command line
    pub verbosity: u8,
    /// Directory holding native libraries the service bindings need.
    ///
    /// Only checked for existence at startup; nothing is loaded from it and it is
    /// never exported into the environment.
    pub lib_dir: Option<PathBuf>,
    /// Sources handed to the load-files control
    pub sources: Vec<String>,
}

/// Builder for `Config`.
///
/// # Examples
///
/// ```
/// use ragchat::config::{ApiKey, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .api_key(ApiKey::new("sk-example"))
///     .base_url("http://localhost:9000")
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.service.base_url, "http://localhost:9000");
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<ApiKey>,
    api_key_var: Option<String>,
    base_url: Option<String>,
    app_id: Option<String>,
    lib_dir: Option<PathBuf>,
    sources: Vec<String>,
    page: Option<PageConfig>,
    verbosity: u8,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies the API key directly instead of reading it from the environment.
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Names the environment variable holding the API key.
    pub fn api_key_var(mut self, name: impl Into<String>) -> Self {
        self.api_key_var = Some(name.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lib_dir = Some(dir.into());
        self
    }

    /// Sets ingestion sources. A non-empty list replaces `RAG_SOURCES`.
    pub fn sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn page(mut self, page: PageConfig) -> Self {
        self.page = Some(page);
        self
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Resolves and validates the configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingSecret` if no non-blank API key is available
    /// - `ConfigError::InvalidUrl` if the base URL does not parse or cannot be a
    ///   base for request paths
    /// - `ConfigError::MissingNativeDependency` if a library directory is
    ///   configured but absent
    pub fn build(self) -> Result<Config, ConfigError> {
        let key_var = self.api_key_var.unwrap_or_else(|| API_KEY_VAR.to_string());
        let api_key = match self.api_key {
            Some(key) => key,
            None => read_env(&key_var)
                .map(ApiKey::new)
                .ok_or_else(|| ConfigError::MissingSecret {
                    name: key_var.clone(),
                })?,
        };
        if api_key.expose().trim().is_empty() {
            return Err(ConfigError::MissingSecret { name: key_var });
        }

        let base_url = self
            .base_url
            .or_else(|| read_env(BASE_URL_VAR))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        validate_base_url(&base_url).map_err(ConfigError::InvalidUrl)?;

        let app_id = self
            .app_id
            .or_else(|| read_env(APP_ID_VAR))
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());

        let lib_dir = self.lib_dir.or_else(|| read_env(LIB_DIR_VAR).map(PathBuf::from));
        if let Some(dir) = &lib_dir {
            validate_lib_dir(dir)?;
        }

        let sources = if self.sources.is_empty() {
            read_env(SOURCES_VAR)
                .map(|value| parse_sources(&value))
                .unwrap_or_default()
        } else {
            self.sources
        };

        debug!(%base_url, %app_id, sources = sources.len(), "configuration resolved");

        Ok(Config {
            service: ServiceConfig {
                base_url,
                app_id,
                api_key,
            },
            page: self.page.unwrap_or_default(),
            verbosity: self.verbosity,
            lib_dir,
            sources,
        })
    }
}

/// Loads a `.env` file into the process environment.
///
/// With an explicit path the file must exist. Without one, `.env` is searched for in
/// the current directory and its ancestors and silently skipped when absent.
/// Variables already present in the environment are never overridden.
///
/// Returns the path that was loaded, if any.
///
/// # Errors
///
/// Returns `ConfigError::EnvFile` if the file cannot be read or parsed.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(ConfigError::EnvFile)?,
        None => match dotenvy::dotenv() {
            Ok(path) => Some(path),
            Err(e) if e.not_found() => None,
            Err(e) => return Err(ConfigError::EnvFile(e)),
        },
    };

    if let Some(path) = &loaded {
        info!(path = %path.display(), "loaded environment file");
    }
    Ok(loaded)
}

/// Parses a comma-separated list of sources.
///
/// Splits on commas, trims whitespace from each entry, and drops empty entries.
///
/// # Examples
///
/// ```
/// use ragchat::config::parse_sources;
///
/// let sources = parse_sources("docs/a.pdf, https://example.com ,");
/// assert_eq!(sources, vec!["docs/a.pdf", "https://example.com"]);
/// ```
pub fn parse_sources(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Checks that a RAG service URL parses and can carry request paths.
///
/// # Errors
///
/// Returns a message naming the URL and the problem.
///
/// # Examples
///
/// ```
/// use ragchat::config::validate_base_url;
///
/// assert!(validate_base_url("http://localhost:8080").is_ok());
/// assert!(validate_base_url("mailto:rag@example.com").is_err());
/// ```
pub fn validate_base_url(url: &str) -> Result<reqwest::Url, String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("{}: {}", url, e))?;
    if parsed.cannot_be_a_base() {
        return Err(format!("{}: cannot be used as a base URL", url));
    }
    Ok(parsed)
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_lib_dir(dir: &Path) -> Result<(), ConfigError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::MissingNativeDependency {
            path: dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            for var in [API_KEY_VAR, BASE_URL_VAR, APP_ID_VAR, LIB_DIR_VAR, SOURCES_VAR] {
                std::env::remove_var(var);
            }
            std::env::remove_var("RAGCHAT_TEST_KEY");
        }
    }

    #[test]
    #[serial]
    fn build_fails_without_api_key() {
        clear_env();

        let result = ConfigBuilder::new().build();
        match result {
            Err(ConfigError::MissingSecret { name }) => assert_eq!(name, API_KEY_VAR),
            other => panic!("Expected MissingSecret, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn build_treats_blank_api_key_as_missing() {
        clear_env();
        unsafe {
            std::env::set_var(API_KEY_VAR, "   ");
        }

        let result = ConfigBuilder::new().build();
        assert!(matches!(result, Err(ConfigError::MissingSecret { .. })));

        let result = ConfigBuilder::new().api_key(ApiKey::new("")).build();
        assert!(matches!(result, Err(ConfigError::MissingSecret { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn build_reads_api_key_from_environment() {
        clear_env();
        unsafe {
            std::env::set_var(API_KEY_VAR, "sk-from-env");
        }

        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.service.api_key.expose(), "sk-from-env");
        assert_eq!(config.service.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.service.app_id, DEFAULT_APP_ID);
        assert!(config.sources.is_empty());
        assert!(config.lib_dir.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn api_key_var_selects_a_different_variable() {
        clear_env();
        unsafe {
            std::env::set_var("RAGCHAT_TEST_KEY", "sk-custom");
        }

        let config = ConfigBuilder::new()
            .api_key_var("RAGCHAT_TEST_KEY")
            .build()
            .unwrap();
        assert_eq!(config.service.api_key.expose(), "sk-custom");

        let result = ConfigBuilder::new().build();
        assert!(matches!(result, Err(ConfigError::MissingSecret { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn builder_values_take_precedence_over_environment() {
        clear_env();
        unsafe {
            std::env::set_var(API_KEY_VAR, "sk-env");
            std::env::set_var(BASE_URL_VAR, "http://env-host:8080");
            std::env::set_var(APP_ID_VAR, "env-app");
            std::env::set_var(SOURCES_VAR, "env.txt");
        }

        let config = ConfigBuilder::new()
            .api_key(ApiKey::new("sk-builder"))
            .base_url("http://builder-host:8080")
            .app_id("builder-app")
            .sources(vec!["builder.txt".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.service.api_key.expose(), "sk-builder");
        assert_eq!(config.service.base_url, "http://builder-host:8080");
        assert_eq!(config.service.app_id, "builder-app");
        assert_eq!(config.sources, vec!["builder.txt"]);

        clear_env();
    }

    #[test]
    #[serial]
    fn sources_fall_back_to_environment_list() {
        clear_env();
        unsafe {
            std::env::set_var(SOURCES_VAR, "notes.md, https://example.com/faq,,");
        }

        let config = ConfigBuilder::new()
            .api_key(ApiKey::new("sk"))
            .build()
            .unwrap();
        assert_eq!(config.sources, vec!["notes.md", "https://example.com/faq"]);

        clear_env();
    }

    #[test]
    #[serial]
    fn build_rejects_invalid_base_url() {
        clear_env();

        let result = ConfigBuilder::new()
            .api_key(ApiKey::new("sk"))
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    #[serial]
    fn build_rejects_urls_that_cannot_be_a_base() {
        clear_env();

        let result = ConfigBuilder::new()
            .api_key(ApiKey::new("sk"))
            .base_url("mailto:rag@example.com")
            .build();
        match result {
            Err(ConfigError::InvalidUrl(message)) => {
                assert!(message.contains("cannot be used as a base URL"))
            }
            other => panic!("Expected InvalidUrl, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn build_rejects_missing_lib_dir() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = ConfigBuilder::new()
            .api_key(ApiKey::new("sk"))
            .lib_dir(&missing)
            .build();
        match result {
            Err(ConfigError::MissingNativeDependency { path }) => assert_eq!(path, missing),
            other => panic!("Expected MissingNativeDependency, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn build_accepts_existing_lib_dir_without_touching_environment() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let before = std::env::var_os("LD_LIBRARY_PATH");

        let config = ConfigBuilder::new()
            .api_key(ApiKey::new("sk"))
            .lib_dir(dir.path())
            .build()
            .unwrap();

        assert_eq!(config.lib_dir.as_deref(), Some(dir.path()));
        assert_eq!(std::env::var_os("LD_LIBRARY_PATH"), before);
    }

    #[test]
    #[serial]
    fn load_env_file_seeds_missing_variables_only() {
        clear_env();
        unsafe {
            std::env::set_var(APP_ID_VAR, "already-set");
        }
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        std::fs::write(
            &env_path,
            format!("{API_KEY_VAR}=sk-dotenv\n{APP_ID_VAR}=from-file\n"),
        )
        .unwrap();

        let loaded = load_env_file(Some(env_path.as_path())).unwrap();
        assert_eq!(loaded.as_deref(), Some(env_path.as_path()));

        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.service.api_key.expose(), "sk-dotenv");
        assert_eq!(config.service.app_id, "already-set");

        clear_env();
    }

    #[test]
    #[serial]
    fn load_env_file_with_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_env_file(Some(dir.path().join("absent.env").as_path()));
        assert!(matches!(result, Err(ConfigError::EnvFile(_))));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-very-secret");
        let debug = format!("{key:?}");
        assert!(!debug.contains("sk-very-secret"));

        let service = ServiceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            api_key: key,
        };
        assert!(!format!("{service:?}").contains("sk-very-secret"));
    }

    #[test]
    fn parse_sources_with_whitespace_and_empty_elements() {
        assert_eq!(parse_sources(" a.pdf ,, b.txt "), vec!["a.pdf", "b.txt"]);
        assert!(parse_sources("").is_empty());
        assert!(parse_sources("  ,  ,  ").is_empty());
    }

    #[test]
    fn page_config_builders_replace_single_fields() {
        let page = PageConfig::default()
            .with_direction(TextDirection::Rtl)
            .with_title("Ask Dr. Raed");
        assert_eq!(page.direction, TextDirection::Rtl);
        assert_eq!(page.title, "Ask Dr. Raed");
        assert_eq!(page.submit_label, PageConfig::default().submit_label);
    }

    #[test]
    fn arabic_page_is_right_to_left() {
        let page = PageConfig::arabic();
        assert_eq!(page.direction, TextDirection::Rtl);
        assert_eq!(page.title, "اسأل الدكتور رائد");
        assert_eq!(page.error_prefix, "حدث خطأ");
        assert_ne!(page.load_success, PageConfig::default().load_success);
    }

    #[test]
    fn page_file_overrides_only_listed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        std::fs::write(
            &path,
            r#"{"title": "Clinic Desk", "busy_text": "Thinking...", "direction": "rtl"}"#,
        )
        .unwrap();

        let page = PageConfig::from_path(&path).unwrap();
        assert_eq!(page.title, "Clinic Desk");
        assert_eq!(page.busy_text, "Thinking...");
        assert_eq!(page.direction, TextDirection::Rtl);
        assert_eq!(page.submit_label, PageConfig::default().submit_label);
    }

    #[test]
    fn page_file_errors_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            PageConfig::from_path(&missing),
            Err(ConfigError::PageFile { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, r#"{"title": 42}"#).unwrap();
        assert!(matches!(
            PageConfig::from_path(&broken),
            Err(ConfigError::PageFormat { .. })
        ));
    }
}
