use eframe::egui;
use crate::app::app_core::TraceApp;
use crate::shape::ShapeKind;

/// 配置面板：图形选择、方向反转、光标复位
pub fn render_controls(app: &mut TraceApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("controls")
        .min_height(40.0)
        .show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.add_enabled_ui(app.state.is_connected(), |ui| {
                    let mut selected = app.state.controls.selected_shape;
                    egui::ComboBox::from_label("Shape")
                        .selected_text(selected.label())
                        .show_ui(ui, |ui| {
                            for kind in ShapeKind::ALL {
                                ui.selectable_value(&mut selected, kind, kind.label());
                            }
                        });
                    if selected != app.state.controls.selected_shape {
                        app.select_shape(selected);
                    }

                    ui.separator();

                    let invert_text = if app.state.controls.inverted {
                        "⇄ Invert direction (on)"
                    } else {
                        "⇄ Invert direction"
                    };
                    if ui.button(invert_text).clicked() {
                        app.toggle_direction();
                    }

                    if ui.button("⟲ Reset cursor").clicked() {
                        app.reset_cursor();
                    }
                });
            });
            ui.add_space(5.0);
        });
}
