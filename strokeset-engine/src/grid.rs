use strokeset_core::document::{Document, Stroke, StrokeId};
use strokeset_core::geometry::Bounds2D;
use tracing::{debug, warn};

use crate::errors::EngineError;

/// 参考文档中单元格的边长。
pub const DEFAULT_CELL_SIZE: f64 = 100.0;

/// 每行固定的两列：左侧写字符，右侧写注音。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Symbol,
    Annotation,
}

impl Column {
    pub const ALL: [Column; 2] = [Column::Symbol, Column::Annotation];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Column::Symbol => 0,
            Column::Annotation => 1,
        }
    }

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Column::Symbol),
            1 => Some(Column::Annotation),
            _ => None,
        }
    }
}

/// 网格几何：单元格 `(row, col)` 覆盖
/// `[col * cell, row * cell, (col + 1) * cell, (row + 1) * cell]`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    cell_size: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl GridLayout {
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_bounds(&self, row: usize, column: Column) -> Bounds2D {
        let size = self.cell_size;
        let col = column.index() as f64;
        let row = row as f64;
        Bounds2D::from_extents(col * size, row * size, (col + 1.0) * size, (row + 1.0) * size)
    }

    pub fn row_count(&self, document: &Document) -> usize {
        document.row_count(self.cell_size)
    }
}

/// 笔画的轴对齐边界框 `[min_x, min_y, max_x, max_y]`。
pub fn stroke_bounds(stroke: &Stroke) -> Result<Bounds2D, EngineError> {
    stroke.bounds().ok_or(EngineError::Geometry {
        stroke: stroke.id().get(),
    })
}

/// 单行划分结果，两个列表都保持笔画在源文档中的顺序。
#[derive(Debug, Clone, PartialEq)]
pub struct RowCells<'a> {
    pub row: usize,
    pub symbol: Vec<&'a Stroke>,
    pub annotation: Vec<&'a Stroke>,
}

impl<'a> RowCells<'a> {
    pub fn empty(row: usize) -> Self {
        Self {
            row,
            symbol: Vec::new(),
            annotation: Vec::new(),
        }
    }

    /// 两列都至少有一笔。
    #[inline]
    pub fn is_complete(&self) -> bool {
        !self.symbol.is_empty() && !self.annotation.is_empty()
    }
}

/// 按行把笔画分到两个单元格。边界框在构造时计算一次并缓存。
#[derive(Debug)]
pub struct GridPartitioner<'a> {
    layout: GridLayout,
    rows: usize,
    placed: Vec<(&'a Stroke, Bounds2D)>,
    excluded: Vec<StrokeId>,
}

impl<'a> GridPartitioner<'a> {
    /// 行数由文档高度推出。
    pub fn new(document: &'a Document, layout: GridLayout) -> Self {
        Self::from_strokes(document.strokes(), layout.row_count(document), layout)
    }

    pub fn from_strokes(strokes: &'a [Stroke], rows: usize, layout: GridLayout) -> Self {
        let mut placed = Vec::with_capacity(strokes.len());
        let mut excluded = Vec::new();
        for stroke in strokes {
            match stroke_bounds(stroke) {
                Ok(bounds) => placed.push((stroke, bounds)),
                Err(err) => {
                    warn!(stroke = stroke.id().get(), error = %err, "笔画缺少路径数据，已排除");
                    excluded.push(stroke.id());
                }
            }
        }

        let partitioner = Self {
            layout,
            rows,
            placed,
            excluded,
        };
        partitioner.report_unplaced();
        partitioner
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// 因几何错误被排除的笔画。
    pub fn excluded(&self) -> &[StrokeId] {
        &self.excluded
    }

    /// 返回严格落在该行字符格、注音格内的笔画。
    pub fn partition_row(&self, row: usize) -> RowCells<'a> {
        let symbol_cell = self.layout.cell_bounds(row, Column::Symbol);
        let annotation_cell = self.layout.cell_bounds(row, Column::Annotation);
        let mut cells = RowCells::empty(row);
        for &(stroke, bounds) in &self.placed {
            if symbol_cell.strictly_contains(&bounds) {
                cells.symbol.push(stroke);
            } else if annotation_cell.strictly_contains(&bounds) {
                cells.annotation.push(stroke);
            }
        }
        cells
    }

    /// 查找严格包含该边界框的单元格。
    pub fn locate(&self, bounds: &Bounds2D) -> Option<(usize, Column)> {
        let size = self.layout.cell_size;
        if !(size > 0.0) || bounds.min().x() < 0.0 || bounds.min().y() < 0.0 {
            return None;
        }
        let row = (bounds.min().y() / size).floor() as usize;
        let column = Column::from_index((bounds.min().x() / size).floor() as usize)?;
        (row < self.rows && self.layout.cell_bounds(row, column).strictly_contains(bounds))
            .then_some((row, column))
    }

    /// 压线或越出网格的笔画不会进入任何单元格，这里只记录诊断信息。
    fn report_unplaced(&self) {
        let mut unplaced = 0usize;
        for (stroke, bounds) in &self.placed {
            if self.locate(bounds).is_none() {
                unplaced += 1;
                debug!(
                    stroke = stroke.id().get(),
                    bounds = ?bounds.to_extents(),
                    "笔画未严格落入任何单元格"
                );
            }
        }
        if unplaced > 0 {
            debug!(unplaced, "存在未归入网格的笔画");
        }
    }
}
