use eframe::egui;
use egui::Color32;
use crate::app::app_core::TraceApp;
use crate::app::state::ConnectionState;
use crate::types::StatusTone;

pub fn render_status_bar(app: &mut TraceApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("status_bar")
        .min_height(40.0)
        .show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.label("Status:");

                let status = app.state.status_line();
                ui.colored_label(tone_color(status.tone), status.text);

                ui.separator();

                if let Some(snapshot) = &app.state.snapshot {
                    let mode = if snapshot.familiarizing { "Familiarization" } else { "Assessment" };
                    ui.label(format!("Mode: {}", mode));

                    ui.separator();
                    ui.label(format!("Phase: {}", snapshot.phase.label()));

                    ui.separator();
                    ui.label(format!(
                        "Repetitions: {}/{}",
                        snapshot.repetitions_completed, app.config.trial.repetitions_per_cycle
                    ));

                    ui.separator();
                    ui.label(format!("Samples logged: {}", snapshot.accepted_samples));
                }

                // 最右边显示连接信息
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match &app.state.connection {
                        ConnectionState::Connected { port } => {
                            ui.colored_label(Color32::from_rgb(0, 150, 0), format!("● {}", port));
                        }
                        ConnectionState::Failed { reason } => {
                            ui.colored_label(Color32::from_rgb(150, 0, 0), "● Offline")
                                .on_hover_text(reason);
                        }
                        ConnectionState::Connecting => {
                            ui.colored_label(Color32::from_rgb(255, 165, 0), "● Connecting");
                        }
                        ConnectionState::Stopped => {
                            ui.colored_label(Color32::from_rgb(150, 0, 0), "● Stopped");
                        }
                    }
                });
            });
            ui.add_space(5.0);
        });
}

fn tone_color(tone: StatusTone) -> Color32 {
    match tone {
        StatusTone::Neutral => Color32::from_rgb(60, 60, 60),
        StatusTone::Active => Color32::from_rgb(0, 150, 0), // 绿色
        StatusTone::Waiting => Color32::from_rgb(255, 165, 0), // 橙色
        StatusTone::Rest => Color32::from_rgb(30, 100, 200), // 蓝色
        StatusTone::Error => Color32::from_rgb(150, 0, 0), // 红色
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_tone_has_its_own_color() {
        let tones = [
            StatusTone::Neutral,
            StatusTone::Active,
            StatusTone::Waiting,
            StatusTone::Rest,
            StatusTone::Error,
        ];
        let colors: Vec<Color32> = tones.iter().map(|t| tone_color(*t)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(tone_color(StatusTone::Active), Color32::from_rgb(0, 150, 0));
    }
}
