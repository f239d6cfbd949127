use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use strokeset_engine::EngineError;
use strokeset_io::IoError;
use thiserror::Error;

/// 单个单元格的渲染失败，只影响该单元格。
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode sub-document: {0}")]
    Encode(#[from] IoError),
    #[error("failed to launch renderer {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("renderer exited with {status}")]
    Exit { status: ExitStatus },
    #[error("renderer did not finish within {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("failed waiting for renderer: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
    #[error("renderer scratch file {path:?}: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image {path:?}: {source}")]
    WriteImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 中止整个导出的结构性错误。
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot read source document: {0}")]
    Document(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    WriteInfo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize set info: {source}")]
    SerializeInfo {
        #[source]
        source: serde_json::Error,
    },
}
