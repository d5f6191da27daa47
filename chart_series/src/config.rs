use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use config::{Config, ConfigError, File, FileFormat};
use chart_series_report_types::ReportKind;
use thiserror::Error;

use crate::policy::{OverflowLabel, PolicyRegistry};

/// File name of the repository-local override file.
const CONFIG_FILE_NAME: &str = ".chartseriesconfig";

/// Failure to assemble the policy registry from configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not read policy configuration: {0}")]
    Config(#[from] ConfigError),
}

fn find_config_path() -> Option<PathBuf> {
    if let Ok(mut current_dir) = env::current_dir() {
        loop {
            let candidate = current_dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current_dir.pop() {
                break;
            }
        }
    }

    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        let candidate = Path::new(&xdg_config_home)
            .join("chart-series")
            .join("config.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if let Some(home) = dirs_next::home_dir() {
        let candidate = home.join(".config").join("chart-series").join("config.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}

/// Read hierarchical configuration (system -> local override).
pub fn read_hierarchical_config() -> Result<Config, ConfigError> {
    let mut builder = Config::builder();

    // 1. System-wide config (XDG_CONFIG_HOME or ~/.config/chart-series/config.toml)
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        let system_config_path = Path::new(&xdg_config_home)
            .join("chart-series")
            .join("config.toml");
        builder = builder.add_source(
            File::from(system_config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    } else if let Some(home) = dirs_next::home_dir() {
        let system_config_path = home.join(".config").join("chart-series").join("config.toml");
        builder = builder.add_source(
            File::from(system_config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    // 2. Local config - this overrides system config
    if let Some(local_path) = find_config_path() {
        builder = builder.add_source(
            File::from(local_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    builder.build()
}

/// Returns the configured record limit for a report, if overridden.
pub fn max_records_override(config: &Config, kind: ReportKind) -> Option<usize> {
    match config.get_int(&format!("report.{}.max_records", kind)) {
        Ok(records) if records > 0 => Some(records as usize),
        Ok(records) => {
            log::warn!("Ignoring non-positive max_records override: {}", records);
            None
        }
        Err(_) => None,
    }
}

/// Returns the configured top-N stack window for a report, if overridden.
pub fn top_n_override(config: &Config, kind: ReportKind) -> Option<usize> {
    match config.get_int(&format!("report.{}.top_n_stacks", kind)) {
        Ok(top_n) if top_n > 0 => Some(top_n as usize),
        Ok(top_n) => {
            log::warn!("Ignoring non-positive top_n_stacks override: {}", top_n);
            None
        }
        Err(_) => None,
    }
}

/// Returns the configured overflow label for a report, if overridden.
pub fn overflow_label_override(config: &Config, kind: ReportKind) -> Option<OverflowLabel> {
    let label = config
        .get_string(&format!("report.{}.overflow_label", kind))
        .ok()?;
    match label.parse::<OverflowLabel>() {
        Ok(label) => Some(label),
        Err(err) => {
            log::warn!("{}", err);
            None
        }
    }
}

/// Applies per-report overrides from a parsed configuration onto a
/// registry. Unknown keys and absent sections keep the built-ins.
pub fn apply_overrides(registry: &mut PolicyRegistry, config: &Config) {
    for kind in ReportKind::ALL {
        let Some(policy) = registry.get_mut(kind) else {
            continue;
        };
        if let Some(max_records) = max_records_override(config, kind) {
            policy.max_records = max_records;
        }
        if let Some(top_n) = top_n_override(config, kind) {
            policy.top_n_stacks = top_n;
        }
        if let Some(label) = overflow_label_override(config, kind) {
            policy.overflow_label = label;
        }
    }
}

/// Builds the registry used by a hosting process: built-in policies plus
/// any overrides found on disk. Unreadable configuration degrades to the
/// built-ins.
pub fn load_registry() -> PolicyRegistry {
    match try_load_registry() {
        Ok(registry) => registry,
        Err(err) => {
            // Expected when no config exists
            log::debug!("{}", err);
            PolicyRegistry::builtin()
        }
    }
}

/// Strict variant of [`load_registry`] for hosts that prefer surfacing a
/// broken configuration over silently running on built-ins.
pub fn try_load_registry() -> Result<PolicyRegistry, RegistryError> {
    let config = read_hierarchical_config()?;
    let mut registry = PolicyRegistry::builtin();
    apply_overrides(&mut registry, &config);
    Ok(registry)
}

/// Builds a registry from an explicit override file, bypassing the
/// hierarchical search.
pub fn load_registry_from(path: &Path) -> anyhow::Result<PolicyRegistry> {
    if !path.exists() {
        bail!("Policy override file not found: {}", path.display());
    }
    let config = Config::builder()
        .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml))
        .build()
        .with_context(|| format!("Failed to read policy override file {}", path.display()))?;

    let mut registry = PolicyRegistry::builtin();
    apply_overrides(&mut registry, &config);
    Ok(registry)
}
