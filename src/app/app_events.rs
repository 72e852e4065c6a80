use log::{info, warn};

use crate::shape::ShapeKind;
use crate::types::SessionCommand;
use super::app_core::TraceApp;
use super::state::ConnectionState;

impl TraceApp {
    pub fn handle_pipeline_events(&mut self) {
        while let Ok(event) = self.state.channels.event_receiver.try_recv() {
            self.state.apply_event(event);
        }
    }

    /// 选择图形；与当前相同时不发送，发送失败时保持原选择
    pub fn select_shape(&mut self, kind: ShapeKind) {
        if kind == self.state.controls.selected_shape {
            return;
        }
        if self.dispatch(SessionCommand::SelectShape(kind)) {
            self.state.controls.selected_shape = kind;
        }
    }

    pub fn toggle_direction(&mut self) {
        if self.dispatch(SessionCommand::ToggleDirection) {
            self.state.controls.inverted = !self.state.controls.inverted;
        }
    }

    pub fn reset_cursor(&mut self) {
        self.dispatch(SessionCommand::ResetCursor);
    }

    fn dispatch(&mut self, command: SessionCommand) -> bool {
        let sent = self.state.send_command(command);
        if sent {
            info!("Sent {:?}", command);
        } else if matches!(self.state.connection, ConnectionState::Connected { .. }) {
            warn!("Pipeline did not accept {:?}", command);
        }
        sent
    }
}
