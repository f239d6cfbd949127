use std::fs;
use std::path::Path;

use strokeset_core::document::Stroke;
use strokeset_io::DocumentSaver;
use tracing::debug;

use crate::errors::RenderError;
use crate::renderer::Renderer;

/// 将一个单元格的笔画写成最小子文档，交给渲染器，再把图像写到目标路径。
pub struct SubDocumentEmitter<S, R> {
    saver: S,
    renderer: R,
}

impl<S, R> SubDocumentEmitter<S, R>
where
    S: DocumentSaver,
    R: Renderer,
{
    pub fn new(saver: S, renderer: R) -> Self {
        Self { saver, renderer }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn emit(&self, strokes: &[&Stroke], output: &Path) -> Result<(), RenderError> {
        let document = self.saver.encode(strokes)?;
        let image = self.renderer.render(&document)?;
        fs::write(output, &image).map_err(|source| RenderError::WriteImage {
            path: output.to_path_buf(),
            source,
        })?;
        debug!(
            output = %output.display(),
            strokes = strokes.len(),
            bytes = image.len(),
            "单元格已导出"
        );
        Ok(())
    }
}
