use std::fs;

use serde_json::{Value, json};
use strokeset_core::document::{Stroke, StrokeId};
use strokeset_core::geometry::Point2;
use strokeset_io::{DocumentLoader, DocumentSaver, IoError, RnoteFacade, compress, decompress};

fn lineto(x: f64, y: f64) -> Value {
    json!({ "lineto": { "end": { "pos": [x, y], "pressure": 0.5 } } })
}

fn brush(segments: Vec<Value>) -> Value {
    json!({
        "value": { "brushstroke": { "path": { "start": { "pos": [0.0, 0.0] }, "segments": segments } } },
        "version": 1
    })
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let bytes = compress(&serde_json::to_vec(contents).expect("序列化夹具")).expect("压缩夹具");
    fs::write(&path, bytes).expect("写入夹具");
    path
}

fn snapshot(height: Value, components: Vec<Value>) -> Value {
    json!({
        "version": "0.11.0",
        "data": {
            "engine_snapshot": {
                "document": { "x": 0.0, "y": 0.0, "width": 400.0, "height": height },
                "stroke_components": components,
            }
        }
    })
}

#[test]
fn load_filters_non_stroke_components() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let contents = snapshot(
        json!(300.0),
        vec![
            json!({ "value": null, "version": 0 }),
            brush(vec![lineto(10.0, 20.0), lineto(30.0, 40.0)]),
            json!({ "value": { "textstroke": { "text": "hi" } }, "version": 0 }),
            json!({ "value": { "brushstroke": {} }, "version": 0 }),
            brush(vec![lineto(150.0, 50.0)]),
        ],
    );
    let path = write_fixture(&dir, "sample.rnote", &contents);

    let doc = RnoteFacade::new().load(&path).expect("读取 Rnote 失败");
    assert_eq!(doc.height(), 300.0);
    assert_eq!(doc.width(), 400.0);
    assert_eq!(doc.row_count(100.0), 3);

    let ids: Vec<usize> = doc.strokes().iter().map(|s| s.id().get()).collect();
    assert_eq!(ids, vec![1, 4]);

    let first = &doc.strokes()[0];
    assert_eq!(
        first.endpoints(),
        &[Point2::new(10.0, 20.0), Point2::new(30.0, 40.0)]
    );
    assert_eq!(first.component()["version"], json!(1));
}

#[test]
fn stroke_without_path_is_kept_with_no_segments() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let contents = snapshot(
        json!(100.0),
        vec![json!({ "value": { "brushstroke": { "style": "smooth" } }, "version": 0 })],
    );
    let path = write_fixture(&dir, "no_path.rnote", &contents);

    let doc = RnoteFacade::new().load(&path).expect("缺少路径的笔画不是格式错误");
    assert_eq!(doc.strokes().len(), 1);
    assert_eq!(doc.strokes()[0].segment_count(), 0);
    assert!(doc.strokes()[0].bounds().is_none());
}

#[test]
fn non_numeric_height_is_rejected() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = write_fixture(&dir, "bad_height.rnote", &snapshot(json!("tall"), Vec::new()));

    let err = RnoteFacade::new().load(&path).expect_err("非数值高度应失败");
    assert!(matches!(err, IoError::Json { .. }), "unexpected error: {err}");
    assert!(err.is_format_error());
}

#[test]
fn missing_snapshot_is_rejected() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = write_fixture(&dir, "empty.rnote", &json!({ "version": "0.11.0", "data": {} }));

    let err = RnoteFacade::new().load(&path).expect_err("缺少 engine_snapshot 应失败");
    assert!(err.is_format_error());
}

#[test]
fn malformed_segment_position_is_rejected() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let contents = snapshot(
        json!(100.0),
        vec![brush(vec![
            lineto(1.0, 1.0),
            json!({ "lineto": { "end": { "pos": "nowhere" } } }),
        ])],
    );
    let path = write_fixture(&dir, "bad_segment.rnote", &contents);

    let err = RnoteFacade::new().load(&path).expect_err("坐标格式错误应失败");
    assert!(
        matches!(err, IoError::InvalidDocument(ref message) if message.contains("第 1 段")),
        "unexpected error: {err}"
    );
}

#[test]
fn missing_file_reports_read_error() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let err = RnoteFacade::new()
        .load(&dir.path().join("absent.rnote"))
        .expect_err("文件不存在应失败");
    assert!(matches!(err, IoError::ReadError { .. }));
    assert!(!err.is_format_error());
}

#[test]
fn saved_sub_document_loads_back_with_same_strokes() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let strokes = [
        Stroke::polyline(
            StrokeId::new(7),
            [Point2::new(10.0, 10.0), Point2::new(60.0, 80.0)],
        ),
        Stroke::polyline(StrokeId::new(9), [Point2::new(20.0, 30.0)]),
    ];
    let refs: Vec<&Stroke> = strokes.iter().collect();
    let path = dir.path().join("cell.rnote");

    let facade = RnoteFacade::new();
    facade.save(&refs, &path).expect("写出子文档");

    let raw: Value = serde_json::from_slice(
        &decompress(&fs::read(&path).expect("读取子文档")).expect("解压子文档"),
    )
    .expect("子文档 JSON");
    let components = raw["data"]["engine_snapshot"]["stroke_components"]
        .as_array()
        .expect("stroke_components");
    assert_eq!(components.len(), 3);
    assert!(components[0]["value"].is_null());
    assert_eq!(&components[1], strokes[0].component());

    let reloaded = facade.load(&path).expect("子文档应可重新读取");
    assert_eq!(reloaded.height(), 1024.0);
    assert_eq!(reloaded.strokes().len(), 2);
    assert_eq!(reloaded.strokes()[0].endpoints(), strokes[0].endpoints());
    assert_eq!(reloaded.strokes()[1].endpoints(), strokes[1].endpoints());
}

#[test]
fn encoding_is_byte_identical_across_runs() {
    let stroke = Stroke::polyline(
        StrokeId::new(1),
        [Point2::new(5.0, 5.0), Point2::new(50.0, 50.0)],
    );
    let facade = RnoteFacade::new();
    let first = facade.encode(&[&stroke]).expect("编码");
    let second = facade.encode(&[&stroke]).expect("编码");
    assert_eq!(first, second);
}
