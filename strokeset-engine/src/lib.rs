pub mod assembler;
pub mod grid;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("stroke {stroke} has no path segments, its extent is undefined")]
        Geometry { stroke: usize },
        #[error("document yields more than {limit} sets, letters A-Z are exhausted")]
        Capacity { limit: usize },
    }
}

pub use assembler::{
    AssemblerState, Flow, MAX_SETS, SetAssembler, SetEntry, SymbolSet, assemble_sets, set_letter,
};
pub use errors::EngineError;
pub use grid::{Column, DEFAULT_CELL_SIZE, GridLayout, GridPartitioner, RowCells, stroke_bounds};
