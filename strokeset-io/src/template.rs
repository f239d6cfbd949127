//! 子文档模板：导出单个单元格时写出的最小 Rnote 文档骨架。
//!
//! 除 `stroke_components` 外的字段全部取自 [`DEFAULT_TEMPLATE`]，
//! 这样同一组笔画总是序列化为完全相同的字节。

use serde::Serialize;
use serde_json::Value;

/// 模板对应的 Rnote 文件格式版本。
pub const FILE_VERSION: &str = "0.11.0";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatSettings {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
    pub orientation: &'static str,
    pub border_color: Color,
    pub show_borders: bool,
    pub show_origin_indicator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundSettings {
    pub color: Color,
    pub pattern: &'static str,
    pub pattern_size: [f64; 2],
    pub pattern_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSettings {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub format: FormatSettings,
    pub background: BackgroundSettings,
    pub layout: &'static str,
    pub snap_positions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSettings {
    pub offset: [f64; 2],
    pub size: [f64; 2],
    pub zoom: f64,
}

/// 子文档的固定部分。
#[derive(Debug, Clone, PartialEq)]
pub struct SubDocumentTemplate {
    pub version: &'static str,
    pub document: DocumentSettings,
    pub camera: CameraSettings,
}

pub const DEFAULT_TEMPLATE: SubDocumentTemplate = SubDocumentTemplate {
    version: FILE_VERSION,
    document: DocumentSettings {
        x: 0.0,
        y: 0.0,
        width: 1024.0,
        height: 1024.0,
        format: FormatSettings {
            width: 1024.0,
            height: 1024.0,
            dpi: 96.0,
            orientation: "portrait",
            border_color: Color::BLACK,
            show_borders: false,
            show_origin_indicator: false,
        },
        background: BackgroundSettings {
            color: Color::BLACK,
            pattern: "none",
            pattern_size: [64.0, 64.0],
            pattern_color: Color::WHITE,
        },
        layout: "continuous_vertical",
        snap_positions: false,
    },
    camera: CameraSettings {
        offset: [-96.0, -96.0],
        size: [949.0, 933.0],
        zoom: 1.0,
    },
};

impl Default for SubDocumentTemplate {
    fn default() -> Self {
        DEFAULT_TEMPLATE
    }
}

/// 空组件，模板约定下标 0 保留为空。
#[derive(Debug, Clone, Copy, Serialize)]
struct EmptyComponent {
    value: Option<()>,
    version: u64,
}

const EMPTY_COMPONENT: EmptyComponent = EmptyComponent {
    value: None,
    version: 0,
};

#[derive(Serialize)]
#[serde(untagged)]
enum ComponentSlot<'a> {
    Empty(EmptyComponent),
    Stroke(&'a Value),
}

#[derive(Serialize)]
struct EngineSnapshot<'a> {
    document: &'a DocumentSettings,
    camera: &'a CameraSettings,
    stroke_components: Vec<ComponentSlot<'a>>,
    chrono_components: [EmptyComponent; 1],
    chrono_counter: u64,
}

#[derive(Serialize)]
struct EngineData<'a> {
    engine_snapshot: EngineSnapshot<'a>,
}

#[derive(Serialize)]
struct RnoteFile<'a> {
    version: &'static str,
    data: EngineData<'a>,
}

impl SubDocumentTemplate {
    /// 以模板为骨架，将给定组件追加在保留的空组件之后，序列化为 JSON 字节。
    pub fn to_json<'a, I>(&self, components: I) -> serde_json::Result<Vec<u8>>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut stroke_components = vec![ComponentSlot::Empty(EMPTY_COMPONENT)];
        stroke_components.extend(components.into_iter().map(ComponentSlot::Stroke));
        let file = RnoteFile {
            version: self.version,
            data: EngineData {
                engine_snapshot: EngineSnapshot {
                    document: &self.document,
                    camera: &self.camera,
                    stroke_components,
                    chrono_components: [EMPTY_COMPONENT],
                    chrono_counter: 0,
                },
            },
        };
        serde_json::to_vec(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_template_reserves_first_component() {
        let bytes = DEFAULT_TEMPLATE
            .to_json(std::iter::empty())
            .expect("序列化模板");
        let value: Value = serde_json::from_slice(&bytes).expect("模板应为合法 JSON");
        assert_eq!(value["version"], json!("0.11.0"));
        let snapshot = &value["data"]["engine_snapshot"];
        assert_eq!(
            snapshot["stroke_components"],
            json!([{ "value": null, "version": 0 }])
        );
        assert_eq!(snapshot["document"]["background"]["pattern"], json!("none"));
        assert_eq!(snapshot["document"]["format"]["dpi"], json!(96.0));
        assert_eq!(snapshot["camera"]["offset"], json!([-96.0, -96.0]));
        assert_eq!(snapshot["chrono_counter"], json!(0));
    }

    #[test]
    fn components_follow_placeholder_in_order() {
        let first = json!({ "value": { "brushstroke": { "id": 1 } }, "version": 3 });
        let second = json!({ "value": { "brushstroke": { "id": 2 } }, "version": 0 });
        let bytes = SubDocumentTemplate::default()
            .to_json([&first, &second])
            .expect("序列化模板");
        let value: Value = serde_json::from_slice(&bytes).expect("合法 JSON");
        let components = value["data"]["engine_snapshot"]["stroke_components"]
            .as_array()
            .expect("stroke_components 数组");
        assert_eq!(components.len(), 3);
        assert!(components[0]["value"].is_null());
        assert_eq!(components[1], first);
        assert_eq!(components[2], second);
    }
}
