pub mod emitter;
pub mod errors;
pub mod exporter;
pub mod info;
pub mod renderer;

use std::path::Path;

use errors::ExportError;
use exporter::{ExportOptions, ExportSummary, SymbolExporter};
use renderer::RnoteCliRenderer;
use strokeset_config::AppConfig;
use tracing::info;

/// 使用配置中的 `rnote-cli` 导出源文档中的全部字母组。
pub fn run_export(input: &Path, config: &AppConfig) -> Result<ExportSummary, ExportError> {
    let renderer = RnoteCliRenderer::from_config(&config.renderer);
    let options = ExportOptions::from_config(config);
    info!(
        input = %input.display(),
        output = %options.output_dir.display(),
        cell_size = options.layout.cell_size(),
        "开始导出"
    );
    SymbolExporter::new(renderer, options).export(input)
}
