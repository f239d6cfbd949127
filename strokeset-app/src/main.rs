use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use strokeset_config::{AppConfig, ConfigError};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 将 Rnote 网格笔记按行拆分为字符 / 拼音卡片图片。
#[derive(Debug, Parser)]
#[command(name = "strokeset", version)]
struct Cli {
    /// 源 `.rnote` 文档
    input: PathBuf,
    /// 输出目录，覆盖配置中的 `export.output_dir`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 指定配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 单元格边长
    #[arg(long)]
    cell_size: Option<f64>,
    /// 渲染程序路径
    #[arg(long)]
    renderer: Option<PathBuf>,
    /// 单个单元格的渲染超时（秒）
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// 组名，写入 info.json
    #[arg(long)]
    name: Option<String>,
    /// 不生成 info.json
    #[arg(long)]
    no_info: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (mut config, load_error) = match load_configuration(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    apply_overrides(&mut config, &cli);
    init_logging(&config);

    // 配置错误须在日志初始化之后报告。
    if let Some(err) = load_error {
        match &cli.config {
            Some(path) => {
                error!(path = %path.display(), error = %err, "加载指定配置失败");
                return ExitCode::FAILURE;
            }
            None => warn!(error = %err, "加载默认配置失败，使用内建默认值"),
        }
    }

    if !(config.grid.cell_size > 0.0) || config.renderer.timeout_secs == 0 {
        error!(
            cell_size = config.grid.cell_size,
            timeout_secs = config.renderer.timeout_secs,
            "单元格边长与渲染超时必须为正数"
        );
        return ExitCode::FAILURE;
    }

    match strokeset_export::run_export(&cli.input, &config) {
        Ok(summary) => {
            for set in &summary.sets {
                println!("Exported set {} ({} entries)", set.letter, set.entries);
            }
            if summary.failed.is_empty() {
                println!("Exported all sets");
            } else {
                println!(
                    "Exported all sets, {} cell(s) failed to render",
                    summary.failed.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, input = %cli.input.display(), "导出失败");
            ExitCode::FAILURE
        }
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.export.output_dir = output.clone();
    }
    if let Some(cell_size) = cli.cell_size {
        config.grid.cell_size = cell_size;
    }
    if let Some(program) = &cli.renderer {
        config.renderer.program = program.clone();
    }
    if let Some(timeout) = cli.timeout_secs {
        config.renderer.timeout_secs = timeout;
    }
    if let Some(name) = &cli.name {
        config.export.set_name = name.clone();
    }
    if cli.no_info {
        config.export.write_info = false;
    }
}

/// 显式指定的配置文件出错时由调用方中止运行，自动发现的配置出错时回退到默认值。
fn load_configuration(override_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
    info!("启动 strokeset");
}
