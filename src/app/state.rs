use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::warn;

use crate::config::CanvasConfig;
use crate::shape::{GuideShape, ShapeKind};
use crate::types::{PipelineEvent, Point, SessionCommand, SessionSnapshot, StatusLine, StatusTone};

/// 应用状态管理模块
/// 界面只持有采集线程发来的最新快照，会话本身由采集线程独占

/// 传感器连接状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected { port: String },
    Failed { reason: String },
    Stopped,
}

/// 配置面板状态
#[derive(Debug, Clone)]
pub struct ControlState {
    pub selected_shape: ShapeKind,
    pub inverted: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            selected_shape: ShapeKind::default(),
            inverted: false,
        }
    }
}

/// 与采集线程之间的通道
#[derive(Debug)]
pub struct UiChannels {
    pub event_receiver: Receiver<PipelineEvent>,
    pub command_sender: Sender<SessionCommand>,
}

/// 统一的应用状态管理
#[derive(Debug)]
pub struct AppState {
    pub connection: ConnectionState,
    pub snapshot: Option<SessionSnapshot>,
    pub controls: ControlState,
    pub channels: UiChannels,
    /// 按快照中的图形种类和方向重新生成的引导图形
    pub guide: GuideShape,
    canvas_center: Point,
}

impl AppState {
    pub fn new(
        event_receiver: Receiver<PipelineEvent>,
        command_sender: Sender<SessionCommand>,
        canvas: &CanvasConfig,
    ) -> Self {
        let (cx, cy) = canvas.center();
        let canvas_center = Point::new(f64::from(cx), f64::from(cy));
        Self {
            connection: ConnectionState::Connecting,
            snapshot: None,
            controls: ControlState::default(),
            channels: UiChannels {
                event_receiver,
                command_sender,
            },
            guide: GuideShape::generate(ShapeKind::default(), canvas_center, false),
            canvas_center,
        }
    }

    /// 处理一条采集线程事件
    pub fn apply_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Connected { port } => self.connection = ConnectionState::Connected { port },
            PipelineEvent::ConnectionFailed { reason } => self.connection = ConnectionState::Failed { reason },
            PipelineEvent::Stopped => self.connection = ConnectionState::Stopped,
            PipelineEvent::Snapshot(snapshot) => {
                if self.guide.kind != snapshot.shape || self.snapshot.as_ref().map(|s| s.inverted) != Some(snapshot.inverted) {
                    self.guide = GuideShape::generate(snapshot.shape, self.canvas_center, snapshot.inverted);
                }
                self.snapshot = Some(snapshot);
            }
        }
    }

    /// 发送会话命令，采集线程不在时返回 false
    pub fn send_command(&self, command: SessionCommand) -> bool {
        match self.channels.command_sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Command queue full, dropping {:?}", command);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionState::Connected { .. })
    }

    /// 状态栏显示的文字
    pub fn status_line(&self) -> StatusLine {
        match &self.connection {
            ConnectionState::Failed { .. } => StatusLine::new("Could not connect to sensor", StatusTone::Error),
            ConnectionState::Connecting => StatusLine::new("Connecting to sensor...", StatusTone::Waiting),
            ConnectionState::Stopped => StatusLine::new("Sensor disconnected", StatusTone::Error),
            ConnectionState::Connected { .. } => match &self.snapshot {
                Some(snapshot) => snapshot.status.clone(),
                None => StatusLine::new("Waiting for sensor data...", StatusTone::Waiting),
            },
        }
    }
}
