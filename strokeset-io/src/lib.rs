pub mod template;

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Deserialize;
use serde_json::Value;
use strokeset_core::{
    document::{Document, Stroke, StrokeId},
    geometry::Point2,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::template::SubDocumentTemplate;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decompress document: {source}")]
    Decompress {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compress document: {source}")]
    Compress {
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document json: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

impl IoError {
    /// 源文档本身无法解析（解压、JSON 或结构错误），属于致命的格式错误。
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            IoError::Decompress { .. } | IoError::Json { .. } | IoError::InvalidDocument(_)
        )
    }
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

pub trait DocumentSaver {
    /// 将笔画写入模板文档并压缩为容器字节。
    fn encode(&self, strokes: &[&Stroke]) -> Result<Vec<u8>, IoError>;

    fn save(&self, strokes: &[&Stroke], path: &Path) -> Result<(), IoError> {
        let bytes = self.encode(strokes)?;
        fs::write(path, bytes).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Rnote `.rnote` 文件（gzip 包裹的 JSON）的读写入口。
#[derive(Debug, Clone, Default)]
pub struct RnoteFacade {
    template: SubDocumentTemplate,
}

impl RnoteFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析已经读入内存的压缩文档。
    pub fn parse_bytes(&self, compressed: &[u8]) -> Result<Document, IoError> {
        let json = decompress(compressed)?;
        let raw: RawFile =
            serde_json::from_slice(&json).map_err(|source| IoError::Json { source })?;
        build_document(raw)
    }
}

impl DocumentLoader for RnoteFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let document = self.parse_bytes(&data)?;
        debug!(
            path = %path.display(),
            strokes = document.strokes().len(),
            height = document.height(),
            "已读取 Rnote 文档"
        );
        Ok(document)
    }
}

impl DocumentSaver for RnoteFacade {
    fn encode(&self, strokes: &[&Stroke]) -> Result<Vec<u8>, IoError> {
        let json = self
            .template
            .to_json(strokes.iter().map(|stroke| stroke.component()))
            .map_err(|source| IoError::Json { source })?;
        compress(&json)
    }
}

/// 解压 gzip 字节。
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>, IoError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|source| IoError::Decompress { source })?;
    Ok(json)
}

/// 以默认压缩级别写出 gzip 字节。头部不含时间戳，相同输入得到相同输出。
pub fn compress(json: &[u8]) -> Result<Vec<u8>, IoError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json)
        .map_err(|source| IoError::Compress { source })?;
    encoder
        .finish()
        .map_err(|source| IoError::Compress { source })
}

#[derive(Debug, Deserialize)]
struct RawFile {
    data: RawData,
}

#[derive(Debug, Deserialize)]
struct RawData {
    engine_snapshot: RawSnapshot,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    document: RawDocument,
    stroke_components: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    width: f64,
    height: f64,
}

fn build_document(raw: RawFile) -> Result<Document, IoError> {
    let snapshot = raw.data.engine_snapshot;
    let mut document = Document::new(snapshot.document.width, snapshot.document.height);
    let total = snapshot.stroke_components.len();

    for (index, component) in snapshot.stroke_components.into_iter().enumerate() {
        let Some(brushstroke) = brushstroke_payload(&component) else {
            trace!(index, "跳过非笔画组件");
            continue;
        };
        let endpoints = segment_endpoints(index, brushstroke)?;
        document.push_stroke(Stroke::new(StrokeId::new(index), endpoints, component));
    }

    debug!(
        components = total,
        strokes = document.strokes().len(),
        "已过滤笔画组件"
    );
    Ok(document)
}

/// 取出组件中的 brushstroke 负载；空值、空对象以及其他类型的组件返回 `None`。
fn brushstroke_payload(component: &Value) -> Option<&Value> {
    let payload = component.get("value")?.get("brushstroke")?;
    let present = match payload {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        Value::Number(_) => true,
    };
    present.then_some(payload)
}

/// 读取 `path.segments` 中每一段的终点。缺少路径数据时返回空列表，由上层按几何错误处理；
/// 段存在但坐标格式错误则视为文档格式错误。
fn segment_endpoints(index: usize, brushstroke: &Value) -> Result<Vec<Point2>, IoError> {
    let Some(segments) = brushstroke.get("path").and_then(|path| path.get("segments")) else {
        return Ok(Vec::new());
    };
    let segments = segments.as_array().ok_or_else(|| {
        IoError::InvalidDocument(format!("笔画组件 {index} 的 segments 不是数组"))
    })?;

    segments
        .iter()
        .enumerate()
        .map(|(segment_index, segment)| {
            segment_end(segment).ok_or_else(|| {
                IoError::InvalidDocument(format!(
                    "笔画组件 {index} 的第 {segment_index} 段缺少数值终点 end.pos"
                ))
            })
        })
        .collect()
}

/// 段为单键对象（`lineto` / `quadbezto` / `cubbezto`），其内容带有 `end.pos = [x, y]`。
fn segment_end(segment: &Value) -> Option<Point2> {
    let body = segment
        .as_object()?
        .values()
        .find(|body| body.get("end").is_some())?;
    let pos = body.get("end")?.get("pos")?.as_array()?;
    match pos.as_slice() {
        [x, y] => Some(Point2::from([x.as_f64()?, y.as_f64()?])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn segment_end_accepts_curve_variants() {
        let line = json!({ "lineto": { "end": { "pos": [1.0, 2.0], "pressure": 0.5 } } });
        let quad = json!({ "quadbezto": { "cp": { "pos": [9.0, 9.0] }, "end": { "pos": [3.0, 4.0] } } });
        let cubic = json!({
            "cubbezto": { "cp1": { "pos": [0.0, 0.0] }, "cp2": { "pos": [0.0, 0.0] }, "end": { "pos": [5, 6] } }
        });
        assert_eq!(segment_end(&line), Some(Point2::new(1.0, 2.0)));
        assert_eq!(segment_end(&quad), Some(Point2::new(3.0, 4.0)));
        assert_eq!(segment_end(&cubic), Some(Point2::new(5.0, 6.0)));
        assert_eq!(segment_end(&json!({ "lineto": { "end": { "pos": ["a", 1] } } })), None);
        assert_eq!(segment_end(&json!({ "lineto": { "end": { "pos": [1.0] } } })), None);
        assert_eq!(segment_end(&json!([1.0, 2.0])), None);
    }

    #[test]
    fn brushstroke_payload_filters_empty_values() {
        assert!(brushstroke_payload(&json!({ "value": null, "version": 0 })).is_none());
        assert!(brushstroke_payload(&json!({ "value": { "brushstroke": {} } })).is_none());
        assert!(brushstroke_payload(&json!({ "value": { "shapestroke": { "a": 1 } } })).is_none());
        assert!(brushstroke_payload(&json!({ "value": { "brushstroke": { "path": {} } } })).is_some());
    }

    #[test]
    fn compress_roundtrip_is_deterministic() {
        let first = compress(b"{\"a\":1}").expect("压缩");
        let second = compress(b"{\"a\":1}").expect("压缩");
        assert_eq!(first, second);
        assert_eq!(decompress(&first).expect("解压"), b"{\"a\":1}".to_vec());
    }

    #[test]
    fn garbage_input_is_a_format_error() {
        let err = RnoteFacade::new()
            .parse_bytes(b"definitely not gzip")
            .expect_err("非 gzip 数据应失败");
        assert!(err.is_format_error(), "unexpected error: {err}");
    }
}
