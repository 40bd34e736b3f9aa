#![forbid(unsafe_code)]

//! Config precedence chain (§6): built-in defaults -> user-home config file
//! -> project-local config file -> environment variables -> invocation
//! flags. Each layer is parsed as a TOML table and merged over the
//! previous one (later layers win key-by-key, recursing into nested
//! tables), then the merged table is deserialized once into `Config`.

use lore_core::Config;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigLoadError {
    Read { path: PathBuf, detail: String },
    Parse { path: PathBuf, detail: String },
    Invalid(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, detail } => write!(f, "cannot read {}: {detail}", path.display()),
            Self::Parse { path, detail } => write!(f, "cannot parse {}: {detail}", path.display()),
            Self::Invalid(detail) => write!(f, "invalid config: {detail}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

fn user_home_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| Path::new(&home).join(".config").join("lore").join("config.toml"))
}

fn read_toml_table(path: &Path) -> Result<Option<toml::value::Table>, ConfigLoadError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigLoadError::Read {
                path: path.to_path_buf(),
                detail: err.to_string(),
            })
        }
    };
    let value: toml::Value = toml::from_str(&raw).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    match value {
        toml::Value::Table(table) => Ok(Some(table)),
        _ => Err(ConfigLoadError::Parse {
            path: path.to_path_buf(),
            detail: "top-level config must be a table".to_string(),
        }),
    }
}

/// Recursively overlays `overlay` onto `base`: scalar and array keys are
/// replaced wholesale, nested tables are merged key-by-key.
fn merge_tables(base: &mut toml::value::Table, overlay: toml::value::Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Environment variables recognized at the top level; nested keys use a
/// double underscore (`LORE_LEARNING__CONFIDENCE_MIN`).
const ENV_PREFIX: &str = "LORE_";

fn env_overlay() -> toml::value::Table {
    let mut table = toml::value::Table::new();
    for (name, value) in std::env::vars() {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let path: Vec<String> = rest.split("__").map(|segment| segment.to_lowercase()).collect();
        insert_dotted(&mut table, &path, &value);
    }
    table
}

fn insert_dotted(table: &mut toml::value::Table, path: &[String], raw_value: &str) {
    let parsed = parse_scalar(raw_value);
    if path.len() == 1 {
        table.insert(path[0].clone(), parsed);
        return;
    }
    let entry = table
        .entry(path[0].clone())
        .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
    if let toml::Value::Table(nested) = entry {
        insert_dotted(nested, &path[1..], raw_value);
    }
}

fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(int) = raw.parse::<i64>() {
        return toml::Value::Integer(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return toml::Value::Float(float);
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return toml::Value::Boolean(boolean);
    }
    toml::Value::String(raw.to_string())
}

/// One invocation-flag override, parsed by the CLI's manual arg loop
/// (dotted key matching `Config`'s TOML shape, e.g. `learning.confidence_min`).
pub struct FlagOverride {
    pub key: String,
    pub value: String,
}

fn flag_overlay(flags: &[FlagOverride]) -> toml::value::Table {
    let mut table = toml::value::Table::new();
    for flag in flags {
        let path: Vec<String> = flag.key.split('.').map(str::to_string).collect();
        insert_dotted(&mut table, &path, &flag.value);
    }
    table
}

pub fn load_config(project_local_path: &Path, flags: &[FlagOverride]) -> Result<Config, ConfigLoadError> {
    let mut merged = toml::value::Table::new();

    if let Some(home_path) = user_home_config_path() {
        if let Some(table) = read_toml_table(&home_path)? {
            merge_tables(&mut merged, table);
        }
    }
    if let Some(table) = read_toml_table(project_local_path)? {
        merge_tables(&mut merged, table);
    }
    merge_tables(&mut merged, env_overlay());
    merge_tables(&mut merged, flag_overlay(flags));

    let defaults = toml::Value::try_from(Config::default())
        .map_err(|err| ConfigLoadError::Invalid(err.to_string()))?;
    let mut base = match defaults {
        toml::Value::Table(table) => table,
        _ => unreachable!("Config always serializes to a table"),
    };
    merge_tables(&mut base, merged);

    let config: Config = toml::Value::Table(base)
        .try_into()
        .map_err(|err: toml::de::Error| ConfigLoadError::Invalid(err.to_string()))?;
    config.validate().map_err(|detail| ConfigLoadError::Invalid(detail.to_string()))?;
    Ok(config)
}
