//! Layered service configuration: built-in defaults, then an optional TOML
//! file, then `HWC_` environment variables (`__` separates sections).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::runner::CommandSpec;

/// Consulted when no `--config` path is given; skipped if absent.
pub const DEFAULT_CONFIG_FILE: &str = "hwc.toml";
pub const ENV_PREFIX: &str = "HWC_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    MissingFile(String),

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid bind address {0:?}: {1}")]
    InvalidBind(String, String),

    #[error("route fragment for {0} is empty")]
    EmptyRoute(&'static str),

    #[error("route fragments are ambiguous: {0:?} ({1}) contains {2:?} ({3})")]
    AmbiguousRoutes(String, &'static str, String, &'static str),

    #[error("invalid log format {0:?}: expected \"text\" or \"json\"")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HwcConfig {
    pub server: ServerSection,
    pub runner: RunnerSection,
    pub log: LogSection,
    pub routes: RoutesSection,
    pub commands: CommandsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// 0 waits for a command indefinitely.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,  // trace|debug|info|warn|error
    pub format: String, // text|json
    pub no_ansi: bool,
}

/// Path fragments, matched by substring against the request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesSection {
    pub lscpu: String,
    pub lspci: String,
    pub cpu_info: String,
    pub lshw: String,
    pub lsusb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsSection {
    pub lscpu: CommandSpec,
    pub lspci: CommandSpec,
    pub cpu_info: CommandSpec,
    pub lshw: CommandSpec,
    pub lsusb: CommandSpec,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:54331".to_string(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            no_ansi: false,
        }
    }
}

impl Default for RoutesSection {
    fn default() -> Self {
        Self {
            lscpu: "/hal/hwc/lscpu".to_string(),
            lspci: "/hal/hwc/lspci".to_string(),
            cpu_info: "/hal/hwc/cpu_info".to_string(),
            lshw: "/hal/hwc/lshw".to_string(),
            lsusb: "/hal/hwc/lsusb".to_string(),
        }
    }
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            lscpu: CommandSpec::new("lscpu", Vec::<String>::new()),
            lspci: CommandSpec::new("lspci", ["-mm", "-nn"]),
            cpu_info: CommandSpec::new("cat", ["/proc/cpuinfo"]),
            lshw: CommandSpec::new("lshw", ["-json"]),
            lsusb: CommandSpec::new("lsusb", Vec::<String>::new()),
        }
    }
}

impl RoutesSection {
    /// Fragments in dispatch priority order, each with its route name.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("lscpu", self.lscpu.as_str()),
            ("lspci", self.lspci.as_str()),
            ("cpu_info", self.cpu_info.as_str()),
            ("lshw", self.lshw.as_str()),
            ("lsusb", self.lsusb.as_str()),
        ]
    }

    /// No fragment may be empty or contain another, so at most one route can
    /// ever match a path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = self.entries();
        for (name, fragment) in entries {
            if fragment.is_empty() {
                return Err(ConfigError::EmptyRoute(name));
            }
        }
        for (i, &(outer_name, outer)) in entries.iter().enumerate() {
            for (j, &(inner_name, inner)) in entries.iter().enumerate() {
                if i != j && outer.contains(inner) {
                    return Err(ConfigError::AmbiguousRoutes(
                        outer.to_string(),
                        outer_name,
                        inner.to_string(),
                        inner_name,
                    ));
                }
            }
        }
        Ok(())
    }
}

impl HwcConfig {
    /// Load from `path` (which must exist) or from [`DEFAULT_CONFIG_FILE`]
    /// when present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) if !p.exists() => {
                return Err(ConfigError::MissingFile(p.display().to_string()));
            }
            Some(p) => Toml::file(p),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        let figment = Figment::from(Serialized::defaults(HwcConfig::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: HwcConfig = figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.routes.validate()?;
        let format = self.log.format.as_str();
        if !format.eq_ignore_ascii_case("text") && !format.eq_ignore_ascii_case("json") {
            return Err(ConfigError::InvalidLogFormat(self.log.format.clone()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidBind(self.server.bind.clone(), e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn with_toml(toml: &str) -> Result<HwcConfig, ConfigError> {
        HwcConfig::from_figment(
            Figment::from(Serialized::defaults(HwcConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = HwcConfig::default();
        config.validate().unwrap();
        assert_eq!(config.runner.timeout_ms, 0);
        assert_eq!(config.commands.lspci.to_string(), "lspci -mm -nn");
        assert_eq!(config.commands.cpu_info.to_string(), "cat /proc/cpuinfo");
        assert_eq!(config.commands.lshw.to_string(), "lshw -json");
    }

    #[test]
    fn test_toml_overrides_merge_with_defaults() {
        let config = with_toml(
            r#"
            [server]
            bind = "0.0.0.0:8080"

            [runner]
            timeout_ms = 5000

            [commands]
            lsusb = ["lsusb", "-v"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.runner.timeout_ms, 5000);
        assert_eq!(config.commands.lsusb.args, vec!["-v"]);
        assert_eq!(config.commands.lscpu.program, "lscpu");
        assert_eq!(config.routes, RoutesSection::default());
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = with_toml("[commands]\nlshw = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_ambiguous_routes_rejected() {
        let err = with_toml("[routes]\ncpu_info = \"/hal/hwc/lscpu/raw\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousRoutes(_, "cpu_info", _, "lscpu")));
    }

    #[test]
    fn test_empty_route_rejected() {
        let err = with_toml("[routes]\nlsusb = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRoute("lsusb")));
    }

    #[test]
    fn test_bad_bind_rejected() {
        let err = with_toml("[server]\nbind = \"localhost\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind(_, _)));
    }

    #[test]
    fn test_bad_log_format_rejected() {
        let err = with_toml("[log]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"debug\"\nformat = \"json\"").unwrap();
        let config = HwcConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                "[server]\nbind = \"127.0.0.1:8000\"\n\n[runner]\ntimeout_ms = 1000\n",
            )?;
            jail.set_env("HWC_SERVER__BIND", "0.0.0.0:9000");
            jail.set_env("HWC_RUNNER__TIMEOUT_MS", "2500");

            let config = HwcConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.bind, "0.0.0.0:9000");
            assert_eq!(config.runner.timeout_ms, 2500);
            assert_eq!(config.log, LogSection::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_file_rejected() {
        let err = HwcConfig::load(Some(Path::new("/nonexistent/hwc.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }
}
