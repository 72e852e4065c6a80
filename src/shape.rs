use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// 直线半长
const LINE_HALF_LENGTH: f64 = 200.0;
/// 三角形顶点到中心的距离
const TRIANGLE_APEX_OFFSET: f64 = 150.0;
const TRIANGLE_BASE_HALF_WIDTH: f64 = 130.0;
const TRIANGLE_BASE_OFFSET: f64 = 100.0;
const CIRCLE_RADIUS: f64 = 150.0;
/// 圆的渲染分段数
const CIRCLE_SEGMENTS: usize = 90;
const S_CURVE_LENGTH: f64 = 300.0;
const S_CURVE_AMPLITUDE: f64 = 100.0;
const S_CURVE_SEGMENTS: usize = 100;

/// 引导图形种类
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    HorizontalLine,
    VerticalLine,
    Triangle,
    Circle,
    SCurve,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::HorizontalLine,
        ShapeKind::VerticalLine,
        ShapeKind::Triangle,
        ShapeKind::Circle,
        ShapeKind::SCurve,
    ];

    /// 界面和记录文件中使用的名称
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::HorizontalLine => "Horizontal Line",
            ShapeKind::VerticalLine => "Vertical Line",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::SCurve => "S Curve",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 引导图形：渲染路径加起点/终点锚点
#[derive(Clone, Debug, PartialEq)]
pub struct GuideShape {
    pub kind: ShapeKind,
    pub start_anchor: Point,
    pub end_anchor: Point,
    pub path: Vec<Point>,
    /// 路径是否首尾相连（三角形、圆）
    pub closed: bool,
}

impl GuideShape {
    /// 按图形种类生成引导图形
    ///
    /// 反向只交换锚点，不改变渲染路径。圆的起点与终点重合，反向后不变。
    pub fn generate(kind: ShapeKind, center: Point, inverted: bool) -> Self {
        let (cx, cy) = (center.x, center.y);

        let (start_anchor, end_anchor, path, closed) = match kind {
            ShapeKind::HorizontalLine => {
                let start = Point::new(cx - LINE_HALF_LENGTH, cy);
                let end = Point::new(cx + LINE_HALF_LENGTH, cy);
                (start, end, vec![start, end], false)
            }
            ShapeKind::VerticalLine => {
                let start = Point::new(cx, cy - LINE_HALF_LENGTH);
                let end = Point::new(cx, cy + LINE_HALF_LENGTH);
                (start, end, vec![start, end], false)
            }
            ShapeKind::Triangle => {
                let apex = Point::new(cx, cy - TRIANGLE_APEX_OFFSET);
                let left = Point::new(cx - TRIANGLE_BASE_HALF_WIDTH, cy + TRIANGLE_BASE_OFFSET);
                let right = Point::new(cx + TRIANGLE_BASE_HALF_WIDTH, cy + TRIANGLE_BASE_OFFSET);
                // 只有两个标记点：顶点和第二个底角
                (apex, right, vec![apex, left, right], true)
            }
            ShapeKind::Circle => {
                let top = Point::new(cx, cy - CIRCLE_RADIUS);
                let path = (0..CIRCLE_SEGMENTS)
                    .map(|i| {
                        let angle = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
                        Point::new(cx + CIRCLE_RADIUS * angle.sin(), cy - CIRCLE_RADIUS * angle.cos())
                    })
                    .collect();
                (top, top, path, true)
            }
            ShapeKind::SCurve => {
                let path = (0..=S_CURVE_SEGMENTS)
                    .map(|i| {
                        let t = i as f64 / S_CURVE_SEGMENTS as f64;
                        let y = cy - S_CURVE_LENGTH / 2.0 + t * S_CURVE_LENGTH;
                        let x = cx + S_CURVE_AMPLITUDE * (t * 2.0 * PI).sin();
                        Point::new(x, y)
                    })
                    .collect();
                let start = Point::new(cx, cy - S_CURVE_LENGTH / 2.0);
                let end = Point::new(cx, cy + S_CURVE_LENGTH / 2.0);
                (start, end, path, false)
            }
        };

        let (start_anchor, end_anchor) = if inverted {
            (end_anchor, start_anchor)
        } else {
            (start_anchor, end_anchor)
        };

        Self {
            kind,
            start_anchor,
            end_anchor,
            path,
            closed,
        }
    }
}
