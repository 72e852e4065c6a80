use eframe::egui;
use egui::{Color32, Pos2, Shape, Stroke};
use crate::app::app_core::TraceApp;
use crate::types::Point;

fn color([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// 画布坐标转换到屏幕坐标（画布左上角为原点）
fn to_screen(origin: Pos2, point: Point) -> Pos2 {
    egui::pos2(origin.x + point.x as f32, origin.y + point.y as f32)
}

pub fn render_canvas(app: &mut TraceApp, ctx: &egui::Context) {
    let canvas = &app.config.canvas;

    egui::CentralPanel::default().show(ctx, |ui| {
        let size = egui::vec2(canvas.width as f32, canvas.height as f32);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let origin = response.rect.min;

        painter.rect_filled(response.rect, 0.0, color(canvas.colors.background));

        // 引导图形
        let guide = &app.state.guide;
        let points: Vec<Pos2> = guide.path.iter().map(|p| to_screen(origin, *p)).collect();
        let stroke = Stroke::new(canvas.stroke_width, color(canvas.colors.guide));
        if guide.closed {
            painter.add(Shape::closed_line(points, stroke));
        } else {
            painter.add(Shape::line(points, stroke));
        }

        // 终点先画，圆形起终点重合时起点标记在上
        painter.circle_filled(
            to_screen(origin, guide.end_anchor),
            canvas.marker_radius,
            color(canvas.colors.end_marker),
        );
        painter.circle_filled(
            to_screen(origin, guide.start_anchor),
            canvas.marker_radius,
            color(canvas.colors.start_marker),
        );

        if let Some(snapshot) = &app.state.snapshot {
            painter.circle_filled(
                to_screen(origin, snapshot.cursor.to_point()),
                canvas.cursor_radius,
                color(canvas.colors.cursor),
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_points_are_offset_by_panel_origin() {
        let p = to_screen(egui::pos2(8.0, 48.0), Point::new(400.0, 300.0));
        assert_eq!(p, egui::pos2(408.0, 348.0));
    }
}
