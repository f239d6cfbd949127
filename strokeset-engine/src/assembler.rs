use std::mem;

use strokeset_core::document::Stroke;
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::grid::{Column, GridPartitioner, RowCells};

/// 每组占用一个拉丁字母，A 到 Z。
pub const MAX_SETS: usize = 26;

/// 第 `index` 组对应的字母。
pub fn set_letter(index: usize) -> Option<char> {
    (index < MAX_SETS).then(|| char::from(b'A' + index as u8))
}

/// 组内的一条：同一行的字符格与注音格笔画。
#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry<'a> {
    pub index: usize,
    pub row: usize,
    pub symbol: Vec<&'a Stroke>,
    pub annotation: Vec<&'a Stroke>,
}

impl<'a> SetEntry<'a> {
    pub fn strokes(&self, column: Column) -> &[&'a Stroke] {
        match column {
            Column::Symbol => &self.symbol,
            Column::Annotation => &self.annotation,
        }
    }
}

/// 连续若干完整行构成的一组。
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSet<'a> {
    pub letter: char,
    pub entries: Vec<SetEntry<'a>>,
}

impl SymbolSet<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// 当前字母尚无条目。
    NoSet,
    /// 当前字母已有至少一条。
    InSet,
}

/// `push_row` 之后是否继续扫描。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// 按行号递增顺序消费行的状态机。
///
/// - 完整行：追加条目，进入 `InSet`。
/// - `InSet` 中遇到空缺行：当前组完成，切换到下一个字母，回到 `NoSet`。
/// - `NoSet` 中遇到空缺行：若是第一行则忽略，否则停止整个扫描。
/// - 扫描结束时仍在 `InSet`：由 [`SetAssembler::finish`] 收尾。
#[derive(Debug)]
pub struct SetAssembler<'a> {
    state: AssemblerState,
    set_index: usize,
    current: Vec<SetEntry<'a>>,
    completed: Vec<SymbolSet<'a>>,
    rows_seen: usize,
}

impl Default for SetAssembler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SetAssembler<'a> {
    pub fn new() -> Self {
        Self {
            state: AssemblerState::NoSet,
            set_index: 0,
            current: Vec::new(),
            completed: Vec::new(),
            rows_seen: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// 已完成的组。
    pub fn completed(&self) -> &[SymbolSet<'a>] {
        &self.completed
    }

    /// 当前待分配的字母。
    pub fn pending_letter(&self) -> Option<char> {
        set_letter(self.set_index)
    }

    pub fn push_row(&mut self, cells: RowCells<'a>) -> Result<Flow, EngineError> {
        let first_row = self.rows_seen == 0;
        self.rows_seen += 1;

        if cells.is_complete() {
            if self.current.is_empty() && self.set_index >= MAX_SETS {
                return Err(EngineError::Capacity { limit: MAX_SETS });
            }
            let index = self.current.len();
            debug!(
                row = cells.row,
                index,
                symbol = cells.symbol.len(),
                annotation = cells.annotation.len(),
                "追加条目"
            );
            self.current.push(SetEntry {
                index,
                row: cells.row,
                symbol: cells.symbol,
                annotation: cells.annotation,
            });
            self.state = AssemblerState::InSet;
            return Ok(Flow::Continue);
        }

        match self.state {
            AssemblerState::InSet => {
                self.close_current();
                Ok(Flow::Continue)
            }
            AssemblerState::NoSet if first_row => {
                debug!(row = cells.row, "跳过首行空缺");
                Ok(Flow::Continue)
            }
            AssemblerState::NoSet => {
                debug!(row = cells.row, "空缺行之后没有新的组，停止扫描");
                Ok(Flow::Stop)
            }
        }
    }

    /// 结束扫描，未关闭的组一并输出。
    pub fn finish(mut self) -> Vec<SymbolSet<'a>> {
        if self.state == AssemblerState::InSet {
            self.close_current();
        }
        self.completed
    }

    fn close_current(&mut self) {
        let entries = mem::take(&mut self.current);
        // `push_row` 在开新组前已检查容量。
        let letter = set_letter(self.set_index).unwrap_or('?');
        info!(letter = %letter, entries = entries.len(), "字母组已完成");
        self.completed.push(SymbolSet { letter, entries });
        self.set_index += 1;
        self.state = AssemblerState::NoSet;
    }
}

/// 从第 0 行开始依次划分并组装所有组。
pub fn assemble_sets<'a>(
    partitioner: &GridPartitioner<'a>,
) -> Result<Vec<SymbolSet<'a>>, EngineError> {
    let mut assembler = SetAssembler::new();
    for row in 0..partitioner.row_count() {
        if assembler.push_row(partitioner.partition_row(row))? == Flow::Stop {
            break;
        }
    }
    Ok(assembler.finish())
}
