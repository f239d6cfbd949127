use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ExportError;

pub const INFO_FILE: &str = "info.json";

/// `info.json` 中的一条，字符、拼音与释义由人工填写。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub chars: String,
    pub pinyin: String,
    pub english: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    pub name: String,
    pub set: Vec<EntryInfo>,
}

impl SetInfo {
    /// 按条目数生成空白骨架。
    pub fn skeleton(name: impl Into<String>, entries: usize) -> Self {
        Self {
            name: name.into(),
            set: (0..entries)
                .map(|index| EntryInfo {
                    chars: String::new(),
                    pinyin: String::new(),
                    english: String::new(),
                    index,
                })
                .collect(),
        }
    }
}

/// 写出 `info.json`；文件已存在时保留人工内容，返回 `false`。
pub fn write_skeleton(dir: &Path, info: &SetInfo) -> Result<bool, ExportError> {
    let path = dir.join(INFO_FILE);
    if path.exists() {
        debug!(path = %path.display(), "info.json 已存在，跳过");
        return Ok(false);
    }
    let json =
        serde_json::to_vec_pretty(info).map_err(|source| ExportError::SerializeInfo { source })?;
    fs::write(&path, json).map_err(|source| ExportError::WriteInfo { path, source })?;
    Ok(true)
}
