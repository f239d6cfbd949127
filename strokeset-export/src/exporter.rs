use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use strokeset_config::AppConfig;
use strokeset_core::document::Document;
use strokeset_engine::{Column, GridLayout, GridPartitioner, SymbolSet, assemble_sets};
use strokeset_io::{DocumentLoader, RnoteFacade};
use tracing::{debug, info, warn};

use crate::emitter::SubDocumentEmitter;
use crate::errors::ExportError;
use crate::info::{SetInfo, write_skeleton};
use crate::renderer::Renderer;

/// 每列图片所在的子目录。
pub fn column_dir(column: Column) -> &'static str {
    match column {
        Column::Symbol => "characters",
        Column::Annotation => "pinyin",
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub layout: GridLayout,
    pub write_info: bool,
    pub set_name: String,
}

impl ExportOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            output_dir: config.export.output_dir.clone(),
            layout: GridLayout::new(config.grid.cell_size),
            write_info: config.export.write_info,
            set_name: config.export.set_name.clone(),
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 渲染失败而被跳过的单元格。
#[derive(Debug, Clone, PartialEq)]
pub struct FailedCell {
    pub letter: char,
    pub index: usize,
    pub column: Column,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSummary {
    pub letter: char,
    pub entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub sets: Vec<SetSummary>,
    pub rendered: usize,
    pub failed: Vec<FailedCell>,
}

/// 读取源文档、组装字母组并逐格导出图片。
pub struct SymbolExporter<R> {
    facade: RnoteFacade,
    emitter: SubDocumentEmitter<RnoteFacade, R>,
    options: ExportOptions,
}

impl<R: Renderer> SymbolExporter<R> {
    pub fn new(renderer: R, options: ExportOptions) -> Self {
        let facade = RnoteFacade::new();
        Self {
            emitter: SubDocumentEmitter::new(facade.clone(), renderer),
            facade,
            options,
        }
    }

    pub fn renderer(&self) -> &R {
        self.emitter.renderer()
    }

    pub fn export(&self, input: &Path) -> Result<ExportSummary, ExportError> {
        let document = self.facade.load(input)?;
        info!(
            path = %input.display(),
            strokes = document.strokes().len(),
            "已加载源文档"
        );
        self.export_document(&document)
    }

    /// 先完成全部组装再写文件，容量错误不会留下半成品目录。
    pub fn export_document(&self, document: &Document) -> Result<ExportSummary, ExportError> {
        let partitioner = GridPartitioner::new(document, self.options.layout);
        let sets = assemble_sets(&partitioner)?;

        let mut summary = ExportSummary::default();
        create_dir(&self.options.output_dir)?;
        for set in &sets {
            self.export_set(set, &mut summary)?;
        }

        info!(
            sets = summary.sets.len(),
            rendered = summary.rendered,
            failed = summary.failed.len(),
            "全部字母组导出完成"
        );
        Ok(summary)
    }

    fn export_set(&self, set: &SymbolSet<'_>, summary: &mut ExportSummary) -> Result<(), ExportError> {
        let set_dir = self.options.output_dir.join(set.letter.to_string());
        for column in Column::ALL {
            create_dir(&set_dir.join(column_dir(column)))?;
        }

        for entry in &set.entries {
            for column in Column::ALL {
                let strokes = entry.strokes(column);
                let output = set_dir
                    .join(column_dir(column))
                    .join(format!("{}.png", entry.index));
                match self.emitter.emit(strokes, &output) {
                    Ok(()) => summary.rendered += 1,
                    Err(err) => {
                        warn!(
                            letter = %set.letter,
                            index = entry.index,
                            column = column_dir(column),
                            error = %err,
                            "单元格渲染失败，已跳过"
                        );
                        discard_stale(&output);
                        summary.failed.push(FailedCell {
                            letter: set.letter,
                            index: entry.index,
                            column,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        if self.options.write_info {
            write_skeleton(&set_dir, &SetInfo::skeleton(&self.options.set_name, set.len()))?;
        }

        info!(letter = %set.letter, entries = set.len(), "已导出字母组");
        summary.sets.push(SetSummary {
            letter: set.letter,
            entries: set.len(),
        });
        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(path).map_err(|source| ExportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// 删除上次导出遗留在失败单元格路径上的图片。
fn discard_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "已删除旧图片"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "无法删除旧图片"),
    }
}
