//! Configuration management for wikipdf.
//!
//! Parses `wikipdf.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `export.path`, `export.attachments_path`, `export.single`, `export.filter`
//! - `html.css`, `html.mermaid_js_path`
//! - `pdf.output`, `pdf.chrome_path`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use expand::{expand_env, expand_opt};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the export directory.
    pub path: Option<PathBuf>,
    /// Override the PDF output path.
    pub output: Option<PathBuf>,
    /// Override the attachments directory.
    pub attachments_path: Option<PathBuf>,
    /// Override exclusion patterns.
    pub exclude_paths: Option<Vec<String>>,
    /// Override the single-page target.
    pub single: Option<String>,
    /// Override the include unlisted pages flag.
    pub include_unlisted_pages: Option<bool>,
    /// Override the global table of contents title.
    pub global_toc: Option<String>,
    /// Override the global table of contents position.
    pub global_toc_position: Option<usize>,
    /// Override the page title flag.
    pub heading: Option<bool>,
    /// Override the page path flag.
    pub path_to_heading: Option<bool>,
    /// Override the page break flag.
    pub break_page: Option<bool>,
    /// Override the front matter filter.
    pub filter: Option<String>,
    /// Override the stylesheet.
    pub css: Option<PathBuf>,
    /// Override mermaid conversion.
    pub convert_mermaid: Option<bool>,
    /// Override math rendering.
    pub math: Option<bool>,
    /// Override code highlighting.
    pub highlight_code: Option<bool>,
    /// Override the browser executable.
    pub chrome_path: Option<PathBuf>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "wikipdf.toml";

const DEFAULT_OUTPUT: &str = "export.pdf";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Export configuration (paths are relative strings from TOML).
    export: ExportConfigRaw,
    /// HTML document configuration (paths are relative strings from TOML).
    html: HtmlConfigRaw,
    /// PDF configuration (paths are relative strings from TOML).
    pdf: PdfConfigRaw,

    /// Resolved export configuration (set after loading).
    #[serde(skip)]
    pub export_resolved: ExportConfig,
    /// Resolved HTML configuration (set after loading).
    #[serde(skip)]
    pub html_resolved: HtmlConfig,
    /// Resolved PDF configuration (set after loading).
    #[serde(skip)]
    pub pdf_resolved: PdfConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw export configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ExportConfigRaw {
    path: Option<String>,
    attachments_path: Option<String>,
    exclude_paths: Option<Vec<String>>,
    single: Option<String>,
    include_unlisted_pages: Option<bool>,
    global_toc: Option<String>,
    global_toc_position: Option<usize>,
    heading: Option<bool>,
    path_to_heading: Option<bool>,
    break_page: Option<bool>,
    filter: Option<String>,
    ascii_only_ids: Option<bool>,
    auto_link_headings: Option<bool>,
}

/// Resolved export configuration with absolute paths.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExportConfig {
    /// Directory to export.
    pub path: PathBuf,
    /// Directory `.attachments` URLs resolve against.
    pub attachments_path: Option<PathBuf>,
    /// Page exclusion patterns.
    pub exclude_paths: Vec<String>,
    /// Single-page target (path substring or `.md` file).
    pub single: Option<String>,
    /// Export pages missing from `.order` files.
    pub include_unlisted_pages: bool,
    /// Global table of contents title; enables the page.
    pub global_toc: Option<String>,
    /// Global table of contents position.
    pub global_toc_position: usize,
    /// Prepend a title derived from the file name.
    pub heading: bool,
    /// Prepend the page's relative path.
    pub path_to_heading: bool,
    /// Page break after every page but the last.
    pub break_page: bool,
    /// Front matter `key:value` filter.
    pub filter: Option<String>,
    /// ASCII-only heading ids.
    pub ascii_only_ids: bool,
    /// Resolve `[Heading Text]` references within a page.
    pub auto_link_headings: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            attachments_path: None,
            exclude_paths: Vec::new(),
            single: None,
            include_unlisted_pages: false,
            global_toc: None,
            global_toc_position: 0,
            heading: false,
            path_to_heading: false,
            break_page: false,
            filter: None,
            ascii_only_ids: true,
            auto_link_headings: true,
        }
    }
}

/// Raw HTML configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct HtmlConfigRaw {
    css: Option<String>,
    convert_mermaid: Option<bool>,
    mermaid_js_path: Option<String>,
    math: Option<bool>,
    highlight_code: Option<bool>,
    highlight_style: Option<String>,
}

/// Resolved HTML document configuration.
#[derive(Debug, Default)]
pub struct HtmlConfig {
    /// Custom stylesheet.
    pub css: Option<PathBuf>,
    /// Draw mermaid diagrams.
    pub convert_mermaid: bool,
    /// Local mermaid.js build.
    pub mermaid_js_path: Option<PathBuf>,
    /// Render math with KaTeX.
    pub math: bool,
    /// Highlight code with highlight.js.
    pub highlight_code: bool,
    /// highlight.js theme.
    pub highlight_style: Option<String>,
}

/// Raw PDF configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PdfConfigRaw {
    output: Option<String>,
    chrome_path: Option<String>,
    timeout_secs: Option<u64>,
    print_background: Option<bool>,
    keep_html: Option<bool>,
}

/// Resolved PDF configuration.
#[derive(Debug)]
pub struct PdfConfig {
    /// PDF output path.
    pub output: PathBuf,
    /// Browser executable; searched on `PATH` when unset.
    pub chrome_path: Option<PathBuf>,
    /// Conversion timeout in seconds.
    pub timeout_secs: u64,
    /// Keep background colors when printing.
    pub print_background: bool,
    /// Keep the HTML document next to the PDF.
    pub keep_html: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            chrome_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            print_background: true,
            keep_html: false,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`export.path`").
        field: String,
        /// Error message (e.g., "${`WIKI_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require an optional path field to point at an existing file.
fn require_file(path: Option<&Path>, field: &str) -> Result<(), ConfigError> {
    if let Some(path) = path
        && !path.is_file()
    {
        return Err(ConfigError::Validation(format!(
            "{field} does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wikipdf.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let export = &mut self.export_resolved;
        if let Some(path) = &settings.path {
            export.path.clone_from(path);
        }
        if let Some(attachments_path) = &settings.attachments_path {
            export.attachments_path = Some(attachments_path.clone());
        }
        if let Some(exclude_paths) = &settings.exclude_paths {
            export.exclude_paths.clone_from(exclude_paths);
        }
        if let Some(single) = &settings.single {
            export.single = Some(single.clone());
        }
        if let Some(include_unlisted_pages) = settings.include_unlisted_pages {
            export.include_unlisted_pages = include_unlisted_pages;
        }
        if let Some(global_toc) = &settings.global_toc {
            export.global_toc = Some(global_toc.clone());
        }
        if let Some(position) = settings.global_toc_position {
            export.global_toc_position = position;
        }
        if let Some(heading) = settings.heading {
            export.heading = heading;
        }
        if let Some(path_to_heading) = settings.path_to_heading {
            export.path_to_heading = path_to_heading;
        }
        if let Some(break_page) = settings.break_page {
            export.break_page = break_page;
        }
        if let Some(filter) = &settings.filter {
            export.filter = Some(filter.clone());
        }

        let html = &mut self.html_resolved;
        if let Some(css) = &settings.css {
            html.css = Some(css.clone());
        }
        if let Some(convert_mermaid) = settings.convert_mermaid {
            html.convert_mermaid = convert_mermaid;
        }
        if let Some(math) = settings.math {
            html.math = math;
        }
        if let Some(highlight_code) = settings.highlight_code {
            html.highlight_code = highlight_code;
        }

        let pdf = &mut self.pdf_resolved;
        if let Some(output) = &settings.output {
            pdf.output.clone_from(output);
        }
        if let Some(chrome_path) = &settings.chrome_path {
            pdf.chrome_path = Some(chrome_path.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            export: ExportConfigRaw::default(),
            html: HtmlConfigRaw::default(),
            pdf: PdfConfigRaw::default(),
            export_resolved: ExportConfig {
                path: base.to_path_buf(),
                ..ExportConfig::default()
            },
            html_resolved: HtmlConfig::default(),
            pdf_resolved: PdfConfig {
                output: base.join(DEFAULT_OUTPUT),
                ..PdfConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_export()?;
        self.validate_html()?;
        self.validate_pdf()?;
        Ok(())
    }

    fn validate_export(&self) -> Result<(), ConfigError> {
        if let Some(global_toc) = &self.export_resolved.global_toc {
            require_non_empty(global_toc, "export.global_toc")?;
        }
        if let Some(single) = &self.export_resolved.single {
            require_non_empty(single, "export.single")?;
        }
        Ok(())
    }

    fn validate_html(&self) -> Result<(), ConfigError> {
        require_file(self.html_resolved.css.as_deref(), "html.css")?;
        require_file(
            self.html_resolved.mermaid_js_path.as_deref(),
            "html.mermaid_js_path",
        )?;
        Ok(())
    }

    fn validate_pdf(&self) -> Result<(), ConfigError> {
        if self.pdf_resolved.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "pdf.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        require_file(self.pdf_resolved.chrome_path.as_deref(), "pdf.chrome_path")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand_opt(&mut self.export.path, "export.path")?;
        expand_opt(&mut self.export.attachments_path, "export.attachments_path")?;
        expand_opt(&mut self.export.single, "export.single")?;
        expand_opt(&mut self.export.filter, "export.filter")?;

        expand_opt(&mut self.html.css, "html.css")?;
        expand_opt(&mut self.html.mermaid_js_path, "html.mermaid_js_path")?;

        expand_opt(&mut self.pdf.output, "pdf.output")?;
        expand_opt(&mut self.pdf.chrome_path, "pdf.chrome_path")?;

        if let Some(patterns) = &mut self.export.exclude_paths {
            for pattern in patterns.iter_mut() {
                *pattern = expand_env(pattern, "export.exclude_paths")?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>| path.map(|p| config_dir.join(p));
        let export = &self.export;
        let defaults = ExportConfig::default();

        self.export_resolved = ExportConfig {
            path: config_dir.join(export.path.as_deref().unwrap_or(".")),
            attachments_path: resolve(export.attachments_path.as_deref()),
            exclude_paths: export.exclude_paths.clone().unwrap_or_default(),
            single: export.single.clone(),
            include_unlisted_pages: export
                .include_unlisted_pages
                .unwrap_or(defaults.include_unlisted_pages),
            global_toc: export.global_toc.clone(),
            global_toc_position: export
                .global_toc_position
                .unwrap_or(defaults.global_toc_position),
            heading: export.heading.unwrap_or(defaults.heading),
            path_to_heading: export.path_to_heading.unwrap_or(defaults.path_to_heading),
            break_page: export.break_page.unwrap_or(defaults.break_page),
            filter: export.filter.clone(),
            ascii_only_ids: export.ascii_only_ids.unwrap_or(defaults.ascii_only_ids),
            auto_link_headings: export
                .auto_link_headings
                .unwrap_or(defaults.auto_link_headings),
        };

        let html = &self.html;
        self.html_resolved = HtmlConfig {
            css: resolve(html.css.as_deref()),
            convert_mermaid: html.convert_mermaid.unwrap_or(false),
            mermaid_js_path: resolve(html.mermaid_js_path.as_deref()),
            math: html.math.unwrap_or(false),
            highlight_code: html.highlight_code.unwrap_or(false),
            highlight_style: html.highlight_style.clone(),
        };

        let pdf = &self.pdf;
        let defaults = PdfConfig::default();
        self.pdf_resolved = PdfConfig {
            output: config_dir.join(pdf.output.as_deref().unwrap_or(DEFAULT_OUTPUT)),
            chrome_path: resolve(pdf.chrome_path.as_deref()),
            timeout_secs: pdf.timeout_secs.unwrap_or(defaults.timeout_secs),
            print_background: pdf.print_background.unwrap_or(defaults.print_background),
            keep_html: pdf.keep_html.unwrap_or(defaults.keep_html),
        };
    }
}
