use crate::shape::ShapeKind;
use crate::trial::TrialPhase;
use super::CursorPosition;

/// 状态栏文字的语气，对应界面颜色
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Neutral,
    Active,
    Waiting,
    Rest,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, tone: StatusTone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// 采集线程每处理一轮后发布的会话快照
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub cursor: CursorPosition,
    pub shape: ShapeKind,
    pub inverted: bool,
    pub phase: TrialPhase,
    pub repetitions_completed: u32,
    pub familiarizing: bool,
    pub accepted_samples: u64,
    pub status: StatusLine,
}

/// 采集线程发往界面的事件
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    Connected { port: String },
    ConnectionFailed { reason: String },
    Snapshot(SessionSnapshot),
    Stopped,
}
