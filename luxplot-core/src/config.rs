use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

const DEFAULT_TEMPLATE: &str = "generic";
const DEFAULT_INTENSITY_PARAM: &str = "Intens";
const DEFAULT_SUMMARY_WIDTH: usize = 16;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    editor: EditorConfig,
    #[serde(default)]
    ascii: AsciiConfig,
    #[serde(default)]
    cli: CliConfig,
    #[serde(default)]
    data: DataConfig,
}

#[derive(Deserialize, Default)]
struct EditorConfig {
    fallback_template: Option<String>,
    intensity_param: Option<String>,
}

#[derive(Deserialize, Default)]
struct AsciiConfig {
    conventional_template: Option<String>,
}

#[derive(Deserialize, Default)]
struct CliConfig {
    registry_summary_width: Option<usize>,
}

#[derive(Deserialize, Default)]
struct DataConfig {
    dirs: Option<Vec<String>>,
}

pub struct Config {
    editor: EditorConfig,
    ascii: AsciiConfig,
    cli: CliConfig,
    data: DataConfig,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if present.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    /// Embedded defaults merged with the file at `path`. A missing or
    /// malformed file is logged and ignored.
    pub fn load_from(path: Option<&Path>) -> Self {
        let mut base: ConfigFile = match toml::from_str(DEFAULT_CONFIG) {
            Ok(base) => base,
            Err(e) => {
                log::error!(target: "config", "embedded config.toml is invalid: {}", e);
                ConfigFile::default()
            }
        };

        if let Some(path) = path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            editor: base.editor,
            ascii: base.ascii,
            cli: base.cli,
            data: base.data,
        }
    }

    pub fn settings(&self) -> EditorSettings {
        EditorSettings {
            fallback_template: self
                .editor
                .fallback_template
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            intensity_param: self
                .editor
                .intensity_param
                .clone()
                .unwrap_or_else(|| DEFAULT_INTENSITY_PARAM.to_string()),
            conventional_template: self
                .ascii
                .conventional_template
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            registry_summary_width: self
                .cli
                .registry_summary_width
                .unwrap_or(DEFAULT_SUMMARY_WIDTH)
                .clamp(1, 64),
        }
    }

    /// Template search directories, highest priority first.
    pub fn data_dirs(&self) -> Vec<PathBuf> {
        self.data
            .dirs
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|d| expand_home(d))
            .collect()
    }
}

/// Editor behaviour knobs resolved from config.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    pub fallback_template: String,
    pub intensity_param: String,
    pub conventional_template: String,
    pub registry_summary_width: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            fallback_template: DEFAULT_TEMPLATE.to_string(),
            intensity_param: DEFAULT_INTENSITY_PARAM.to_string(),
            conventional_template: DEFAULT_TEMPLATE.to_string(),
            registry_summary_width: DEFAULT_SUMMARY_WIDTH,
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("luxplot").join("config.toml"))
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    }
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.editor.fallback_template.is_some() {
        base.editor.fallback_template = user.editor.fallback_template;
    }
    if user.editor.intensity_param.is_some() {
        base.editor.intensity_param = user.editor.intensity_param;
    }
    if user.ascii.conventional_template.is_some() {
        base.ascii.conventional_template = user.ascii.conventional_template;
    }
    if user.cli.registry_summary_width.is_some() {
        base.cli.registry_summary_width = user.cli.registry_summary_width;
    }
    if user.data.dirs.is_some() {
        base.data.dirs = user.data.dirs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_config() {
        let config = Config::load_from(None);
        let settings = config.settings();
        assert_eq!(settings, EditorSettings::default());
        assert_eq!(config.data_dirs().len(), 2);
        assert_eq!(config.data_dirs()[1], PathBuf::from("/usr/share/luxplot"));
    }

    #[test]
    fn test_user_file_overrides_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[editor]\nintensity_param = \"Intensity\"\n[cli]\nregistry_summary_width = 32\n",
        )
        .unwrap();

        let settings = Config::load_from(Some(&path)).settings();
        assert_eq!(settings.intensity_param, "Intensity");
        assert_eq!(settings.registry_summary_width, 32);
        assert_eq!(settings.fallback_template, "generic");
    }

    #[test]
    fn test_malformed_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[editor\nbroken").unwrap();

        let settings = Config::load_from(Some(&path)).settings();
        assert_eq!(settings, EditorSettings::default());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/opt/plots"), PathBuf::from("/opt/plots"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.luxplot"), home.join(".luxplot"));
        }
    }
}
