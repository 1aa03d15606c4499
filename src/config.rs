use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the per-project config file, looked up in the workspace root.
pub const CONFIG_FILE: &str = ".yiiref.toml";

/// Directory names and naming conventions the resolver searches under.
/// Core operations take this by reference and never fall back to their own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionConfig {
    /// Method-name prefix that marks an action (`action`).
    pub action_prefix: String,
    /// Class-name suffix of controller files (`Controller`).
    pub controller_suffix: String,
    /// Controllers directory name inside the protected dir or a module.
    pub controllers_dir: String,
    /// Framework checkout, relative to the workspace root. Base of `system.*` and `zii.*`.
    pub framework_dir: String,
    /// Modules directory name inside the protected dir.
    pub modules_dir: String,
    /// Application directory, relative to the workspace root.
    pub protected_dir: String,
    /// View file extension including the dot (`.php`).
    pub view_extension: String,
    /// Views directory name inside the protected dir or a module.
    pub views_dir: String,
}

impl Default for ConventionConfig {
    fn default() -> Self {
        return Self {
            action_prefix: "action".to_string(),
            controller_suffix: "Controller".to_string(),
            controllers_dir: "controllers".to_string(),
            framework_dir: "framework".to_string(),
            modules_dir: "modules".to_string(),
            protected_dir: "protected".to_string(),
            view_extension: ".php".to_string(),
            views_dir: "views".to_string(),
        };
    }
}

/// Raw TOML structure for `.yiiref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct YiirefTomlConfig {
    #[serde(default)]
    conventions: ConventionsTable,
}

/// The `[conventions]` table; every key is optional.
#[derive(Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConventionsTable {
    action_prefix: Option<String>,
    controller_suffix: Option<String>,
    controllers_dir: Option<String>,
    framework_dir: Option<String>,
    modules_dir: Option<String>,
    protected_dir: Option<String>,
    view_extension: Option<String>,
    views_dir: Option<String>,
}

impl ConventionConfig {
    /// Load config from `.yiiref.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist; a file that exists but
    /// is malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if a value is unusable.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no {CONFIG_FILE} in {}, using defaults", root.display());
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if a value is unusable.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: YiirefTomlConfig = toml::from_str(content)?;
        let table = raw.conventions;
        let defaults = Self::default();

        let config = Self {
            action_prefix: table.action_prefix.unwrap_or(defaults.action_prefix),
            controller_suffix: table.controller_suffix.unwrap_or(defaults.controller_suffix),
            controllers_dir: table.controllers_dir.unwrap_or(defaults.controllers_dir),
            framework_dir: table.framework_dir.unwrap_or(defaults.framework_dir),
            modules_dir: table.modules_dir.unwrap_or(defaults.modules_dir),
            protected_dir: table.protected_dir.unwrap_or(defaults.protected_dir),
            view_extension: table.view_extension.unwrap_or(defaults.view_extension),
            views_dir: table.views_dir.unwrap_or(defaults.views_dir),
        };
        config.validate()?;
        return Ok(config);
    }

    /// Reject values the path algorithm cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` naming the first bad key.
    fn validate(&self) -> Result<(), Error> {
        let segments = [
            ("controllers_dir", &self.controllers_dir),
            ("modules_dir", &self.modules_dir),
            ("views_dir", &self.views_dir),
        ];
        for (key, value) in segments {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(Error::ConfigInvalid {
                    reason: format!("`{key}` must be a single directory name, got `{value}`"),
                });
            }
        }
        if self.protected_dir.is_empty() {
            return Err(Error::ConfigInvalid {
                reason: "`protected_dir` must not be empty".to_string(),
            });
        }
        if !self.view_extension.starts_with('.') {
            return Err(Error::ConfigInvalid {
                reason: format!(
                    "`view_extension` must start with `.`, got `{}`",
                    self.view_extension
                ),
            });
        }
        if self.action_prefix.is_empty() {
            return Err(Error::ConfigInvalid {
                reason: "`action_prefix` must not be empty".to_string(),
            });
        }
        return Ok(());
    }
}

/// A workspace root paired with the conventions that apply inside it.
#[derive(Debug, Clone)]
pub struct Project {
    /// Conventions for this workspace.
    pub config: ConventionConfig,
    /// Workspace root directory.
    pub root: PathBuf,
}

impl Project {
    /// Pair a root with an explicit config.
    pub const fn new(root: PathBuf, config: ConventionConfig) -> Self {
        return Self { config, root };
    }

    /// Load the config from `root` and pair it with `root`.
    ///
    /// # Errors
    ///
    /// Returns config loading errors.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let config = ConventionConfig::load(root)?;
        return Ok(Self::new(root.to_path_buf(), config));
    }

    /// `<root>/<protected_dir>/<controllers_dir>`.
    pub fn app_controllers_dir(&self) -> PathBuf {
        return self.protected_root().join(&self.config.controllers_dir);
    }

    /// `<root>/<protected_dir>/<views_dir>`, the non-module views root.
    pub fn app_views_dir(&self) -> PathBuf {
        return self.protected_root().join(&self.config.views_dir);
    }

    /// `<root>/<protected_dir>`.
    pub fn protected_root(&self) -> PathBuf {
        return self.root.join(&self.config.protected_dir);
    }
}
