use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `STROKESET_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("STROKESET_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid.cell_size > 0.0) || !self.grid.cell_size.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "grid.cell_size 必须为正数，当前为 {}",
                self.grid.cell_size
            )));
        }
        if self.renderer.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "renderer.timeout_secs 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 网格几何。
#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "GridConfig::default_cell_size")]
    pub cell_size: f64,
}

impl GridConfig {
    fn default_cell_size() -> f64 {
        100.0
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: Self::default_cell_size(),
        }
    }
}

/// 外部渲染程序（`rnote-cli`）的调用参数。
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "RendererConfig::default_program")]
    pub program: PathBuf,
    /// 放在 `export ...` 之前的参数，例如通过 flatpak 调用时的 `run --command=rnote-cli <app-id>`。
    #[serde(default)]
    pub leading_args: Vec<String>,
    #[serde(default = "RendererConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RendererConfig {
    fn default_program() -> PathBuf {
        PathBuf::from("rnote-cli")
    }

    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            leading_args: Vec::new(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "ExportConfig::default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "ExportConfig::default_write_info")]
    pub write_info: bool,
    /// 写入 `info.json` 的组名，留空时由人工补充。
    #[serde(default)]
    pub set_name: String,
}

impl ExportConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from("sets")
    }

    fn default_write_info() -> bool {
        true
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
            write_info: Self::default_write_info(),
            set_name: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置无效: {0}")]
    Invalid(String),
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
