use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories_next::BaseDirs;
use renderer::window::WindowConfig;
use renderer::{
    BindingNames, CanvasOptions, DEFAULT_POSITION_ATTRIBUTE, DEFAULT_SENTINEL,
    DEFAULT_TIME_UNIFORM,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use shadergen::{GeneratorConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

const APPLICATION: &str = "textshader";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub generator: GeneratorSection,
    pub canvas: CanvasSection,
    pub window: WindowSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    pub endpoint: String,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasSection {
    pub sentinel: String,
    pub position_attribute: String,
    pub time_uniform: String,
    pub clear_color: [f32; 4],
}

impl Default for CanvasSection {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            position_attribute: DEFAULT_POSITION_ATTRIBUTE.to_string(),
            time_uniform: DEFAULT_TIME_UNIFORM.to_string(),
            clear_color: CanvasOptions::default().clear_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: APPLICATION.to_string(),
            width: 400,
            height: 300,
            vsync: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.sentinel.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "canvas.sentinel must not be empty".into(),
            ));
        }
        for (field, value) in [
            ("canvas.position_attribute", &self.canvas.position_attribute),
            ("canvas.time_uniform", &self.canvas.time_uniform),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero (got {}x{})",
                self.window.width, self.window.height
            )));
        }
        if self.generator.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "generator.timeout must be greater than zero".into(),
            ));
        }
        self.generator_config()?;
        Ok(())
    }

    pub fn generator_config(&self) -> Result<GeneratorConfig, ConfigError> {
        GeneratorConfig::new(&self.generator.endpoint, self.generator.timeout)
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub fn canvas_options(&self) -> CanvasOptions {
        CanvasOptions {
            sentinel: self.canvas.sentinel.clone(),
            bindings: BindingNames {
                position_attribute: self.canvas.position_attribute.clone(),
                time_uniform: self.canvas.time_uniform.clone(),
            },
            clear_color: self.canvas.clear_color,
        }
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            title: self.window.title.clone(),
            size: (self.window.width, self.window.height),
            vsync: self.window.vsync,
            canvas: self.canvas_options(),
        }
    }
}

/// Configuration plus the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
}

/// Reads `explicit` when given, otherwise the per-user default file. Only a
/// missing default file falls back to built-in values.
pub fn load(explicit: Option<&Path>, endpoint: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    let (mut config, path) = match explicit {
        Some(path) => (read(path)?, Some(path.to_path_buf())),
        None => match default_path() {
            Some(path) if path.is_file() => (read(&path)?, Some(path)),
            _ => (Config::default(), None),
        },
    };
    if let Some(endpoint) = endpoint {
        config.generator.endpoint = endpoint.to_string();
        config.validate()?;
    }
    tracing::debug!(
        path = ?path,
        endpoint = %config.generator.endpoint,
        "resolved textshader configuration"
    );
    Ok(LoadedConfig { config, path })
}

pub fn default_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(APPLICATION).join(CONFIG_FILE))
}

fn read(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&contents)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must be non-negative"))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}
