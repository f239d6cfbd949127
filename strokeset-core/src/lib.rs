pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标单位与 Rnote 文档一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    impl From<[f64; 2]> for Point2 {
        fn from(value: [f64; 2]) -> Self {
            Self::new(value[0], value[1])
        }
    }

    /// 轴对齐边界框，用于笔画范围与网格单元格。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        /// 以 `[min_x, min_y, max_x, max_y]` 的形式构造。
        #[inline]
        pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
            Self::new(Point2::new(min_x, min_y), Point2::new(max_x, max_y))
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        /// 覆盖全部点的最小矩形；没有点时返回 `None`。
        pub fn from_points<I>(points: I) -> Option<Self>
        where
            I: IntoIterator<Item = Point2>,
        {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(point);
            }
            (!bounds.is_empty()).then_some(bounds)
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn to_extents(&self) -> [f64; 4] {
            [self.min.x(), self.min.y(), self.max.x(), self.max.y()]
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        /// 严格包含：`inner` 的四条边都必须落在 `self` 内部，与边界重合即视为不包含。
        pub fn strictly_contains(&self, inner: &Bounds2D) -> bool {
            if self.is_empty() || inner.is_empty() {
                return false;
            }
            inner.min.x() > self.min.x()
                && inner.min.y() > self.min.y()
                && inner.max.x() < self.max.x()
                && inner.max.y() < self.max.y()
        }
    }
}

pub mod document {
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};

    use crate::geometry::{Bounds2D, Point2};

    /// 笔画在源文档 `stroke_components` 中的位置。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct StrokeId(usize);

    impl StrokeId {
        #[inline]
        pub fn new(raw: usize) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> usize {
            self.0
        }
    }

    /// 一笔手写笔迹。`endpoints` 为各路径段的终点，`component` 保留原始组件 JSON，
    /// 以便原样写回子文档。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Stroke {
        id: StrokeId,
        endpoints: Vec<Point2>,
        component: Value,
    }

    impl Stroke {
        pub fn new(id: StrokeId, endpoints: Vec<Point2>, component: Value) -> Self {
            Self {
                id,
                endpoints,
                component,
            }
        }

        /// 构造一条由 `lineto` 段组成的折线笔画，组件结构与 Rnote 的 brushstroke 一致。
        pub fn polyline<I>(id: StrokeId, points: I) -> Self
        where
            I: IntoIterator<Item = Point2>,
        {
            let endpoints: Vec<Point2> = points.into_iter().collect();
            let start = endpoints
                .first()
                .map(|p| [p.x(), p.y()])
                .unwrap_or([0.0, 0.0]);
            let segments: Vec<Value> = endpoints
                .iter()
                .map(|p| json!({ "lineto": { "end": { "pos": [p.x(), p.y()], "pressure": 0.5 } } }))
                .collect();
            let component = json!({
                "value": {
                    "brushstroke": {
                        "path": {
                            "start": { "pos": start, "pressure": 0.5 },
                            "segments": segments,
                        },
                        "style": {
                            "smooth": {
                                "stroke_width": 2.0,
                                "stroke_color": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0 },
                                "fill_color": null,
                                "pressure_curve": "linear",
                                "line_style": "solid",
                                "line_cap": "round",
                            }
                        },
                    }
                },
                "version": 0,
            });
            Self::new(id, endpoints, component)
        }

        #[inline]
        pub fn id(&self) -> StrokeId {
            self.id
        }

        #[inline]
        pub fn endpoints(&self) -> &[Point2] {
            &self.endpoints
        }

        #[inline]
        pub fn segment_count(&self) -> usize {
            self.endpoints.len()
        }

        /// 原始 `{value, version}` 组件。
        #[inline]
        pub fn component(&self) -> &Value {
            &self.component
        }

        /// 由全部段终点推导的边界框；没有路径段时为 `None`。
        pub fn bounds(&self) -> Option<Bounds2D> {
            Bounds2D::from_points(self.endpoints.iter().copied())
        }
    }

    /// 已过滤出笔画组件的文档视图。只读，每次导出从源文件重新构建。
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Document {
        width: f64,
        height: f64,
        strokes: Vec<Stroke>,
    }

    impl Document {
        pub fn new(width: f64, height: f64) -> Self {
            Self {
                width,
                height,
                strokes: Vec::new(),
            }
        }

        pub fn with_strokes(width: f64, height: f64, strokes: Vec<Stroke>) -> Self {
            Self {
                width,
                height,
                strokes,
            }
        }

        pub fn push_stroke(&mut self, stroke: Stroke) {
            self.strokes.push(stroke);
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.width
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.height
        }

        #[inline]
        pub fn strokes(&self) -> &[Stroke] {
            &self.strokes
        }

        /// 文档高度按单元格尺寸划分出的行数（向下取整）。
        pub fn row_count(&self, cell_size: f64) -> usize {
            if !(cell_size > 0.0) || !(self.height > 0.0) {
                return 0;
            }
            (self.height / cell_size).floor() as usize
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn polyline_bounds_cover_all_points() {
            let stroke = Stroke::polyline(
                StrokeId::new(3),
                [
                    Point2::new(12.0, 40.0),
                    Point2::new(30.0, 15.0),
                    Point2::new(25.0, 80.0),
                ],
            );
            let bounds = stroke.bounds().expect("折线应有边界框");
            assert_eq!(bounds.to_extents(), [12.0, 15.0, 30.0, 80.0]);
            assert_eq!(stroke.segment_count(), 3);
            assert_eq!(stroke.id().get(), 3);

            let segments = stroke.component()["value"]["brushstroke"]["path"]["segments"]
                .as_array()
                .expect("segments 应为数组");
            assert_eq!(segments.len(), 3);
            assert_eq!(segments[1]["lineto"]["end"]["pos"], json!([30.0, 15.0]));
        }

        #[test]
        fn stroke_without_segments_has_no_bounds() {
            let stroke = Stroke::new(StrokeId::new(0), Vec::new(), Value::Null);
            assert!(stroke.bounds().is_none());
        }

        #[test]
        fn row_count_floors_height() {
            assert_eq!(Document::new(200.0, 300.0).row_count(100.0), 3);
            assert_eq!(Document::new(200.0, 350.9).row_count(100.0), 3);
            assert_eq!(Document::new(200.0, 99.0).row_count(100.0), 0);
            assert_eq!(Document::new(200.0, 300.0).row_count(0.0), 0);
            assert_eq!(Document::new(200.0, -10.0).row_count(100.0), 0);
        }
    }
}
