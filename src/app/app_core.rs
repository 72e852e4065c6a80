use std::time::Duration;
use eframe::{egui, Frame};
use log::info;

use crate::config::AppConfig;
use crate::types::{PipelineEvent, SessionCommand};
use super::state::AppState;

pub struct TraceApp {
    // 统一的状态管理
    pub state: AppState,

    pub config: AppConfig,
}

impl TraceApp {
    pub fn new(
        event_receiver: crossbeam_channel::Receiver<PipelineEvent>,
        command_sender: crossbeam_channel::Sender<SessionCommand>,
        config: AppConfig,
    ) -> Self {
        let state = AppState::new(event_receiver, command_sender, &config.canvas);

        info!("Trace window ready, waiting for sensor");

        TraceApp { state, config }
    }
}

impl eframe::App for TraceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ctx.set_visuals(egui::Visuals::light());

        // 先处理事件，再渲染最新状态
        self.handle_pipeline_events();

        crate::app::ui::render_status_bar(self, ctx);
        crate::app::ui::render_controls(self, ctx);
        crate::app::ui::render_canvas(self, ctx);

        ctx.request_repaint_after(Duration::from_millis(self.config.window.repaint_interval_ms));
    }
}
