use std::time::Instant;

use chrono::Local;
use log::{debug, info};

use crate::config::AppConfig;
use crate::motion::{CanvasBounds, MotionIntegrator, VelocityEstimator};
use crate::serial::{decode_line, DecodeResult, SkipReason};
use crate::shape::{GuideShape, ShapeKind};
use crate::types::{AcceptedSample, CursorPosition, Point, SessionCommand, SessionSnapshot};
use super::machine::{SampleOutcome, TimerEvent, TrialMachine, TrialTiming};

/// 一行串口数据的处理结果
#[derive(Clone, Debug, PartialEq)]
pub enum LineOutcome {
    /// 解码失败，光标不动
    Skipped(SkipReason),
    /// 冷却、休息或复位倒计时中，样本被丢弃
    Paused,
    Processed {
        cursor: CursorPosition,
        velocity: f64,
        outcome: SampleOutcome,
        record: Option<AcceptedSample>,
    },
}

/// 会话上下文：光标、图形和试次状态只在采集线程中持有和修改
pub struct SessionContext {
    bounds: CanvasBounds,
    shape_kind: ShapeKind,
    inverted: bool,
    shape: GuideShape,
    motion: MotionIntegrator,
    velocity: VelocityEstimator,
    trial: TrialMachine,
    accepted_samples: u64,
}

impl SessionContext {
    pub fn new(config: &AppConfig, now: Instant) -> Self {
        let bounds = CanvasBounds::new(config.canvas.width, config.canvas.height);
        let timing = TrialTiming::from_config(&config.motion, &config.trial);
        Self::with_parts(bounds, config.motion.sensitivity, timing, ShapeKind::default(), now)
    }

    pub fn with_parts(
        bounds: CanvasBounds,
        sensitivity: f64,
        timing: TrialTiming,
        shape_kind: ShapeKind,
        now: Instant,
    ) -> Self {
        let motion = MotionIntegrator::new(bounds, sensitivity);
        let velocity = VelocityEstimator::new(motion.position(), now);
        Self {
            bounds,
            shape_kind,
            inverted: false,
            shape: GuideShape::generate(shape_kind, center_point(bounds), false),
            motion,
            velocity,
            trial: TrialMachine::new(timing),
            accepted_samples: 0,
        }
    }

    pub fn cursor(&self) -> CursorPosition {
        self.motion.position()
    }

    #[cfg(test)]
    pub fn shape(&self) -> &GuideShape {
        &self.shape
    }

    #[cfg(test)]
    pub fn trial(&self) -> &TrialMachine {
        &self.trial
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn accepted_samples(&self) -> u64 {
        self.accepted_samples
    }

    /// 应用界面命令；图形、光标和试次状态一起复位
    pub fn apply_command(&mut self, command: SessionCommand, now: Instant) {
        match command {
            SessionCommand::SelectShape(kind) => {
                info!("Shape changed: {} -> {}", self.shape_kind, kind);
                self.shape_kind = kind;
            }
            SessionCommand::ToggleDirection => {
                self.inverted = !self.inverted;
                info!("Trace direction inverted: {}", self.inverted);
            }
            SessionCommand::ResetCursor => {
                info!("Manual cursor reset");
            }
        }
        self.trial.override_reset(now);
        self.reset_cursor_and_shape(now);
    }

    /// 推进计时器，休息结束时复位光标和图形
    pub fn tick(&mut self, now: Instant) -> Option<TimerEvent> {
        let event = self.trial.tick(now)?;
        match event {
            TimerEvent::CooldownElapsed { long_rest: true } => {
                info!("Cycle completed, long rest of {:?}", self.trial.timing().long_rest)
            }
            TimerEvent::CooldownElapsed { long_rest: false } => {
                info!("Short rest of {:?}", self.trial.timing().short_rest)
            }
            TimerEvent::RestElapsed => {
                self.reset_cursor_and_shape(now);
                info!("Rest finished, cursor recentered");
            }
            TimerEvent::CountdownElapsed => debug!("Reset countdown finished"),
        }
        Some(event)
    }

    /// 解码 → 积分 → 测速 → 状态机
    pub fn process_line(&mut self, line: &str, now: Instant) -> LineOutcome {
        let sample = match decode_line(line) {
            DecodeResult::Sample(sample) => sample,
            DecodeResult::Skip(reason) => return LineOutcome::Skipped(reason),
        };

        if self.trial.is_paused(now) {
            return LineOutcome::Paused;
        }

        let cursor = self.motion.apply(sample);
        let velocity = self.velocity.update(cursor, now);
        let outcome = self.trial.on_sample(
            now,
            cursor,
            velocity,
            self.shape.start_anchor,
            self.shape.end_anchor,
        );

        let record = outcome.accepted.map(|repetition| {
            self.accepted_samples += 1;
            AcceptedSample::new(Local::now(), self.shape_kind, repetition, cursor.x, cursor.y)
        });

        LineOutcome::Processed {
            cursor,
            velocity,
            outcome,
            record,
        }
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            cursor: self.cursor(),
            shape: self.shape_kind,
            inverted: self.is_inverted(),
            phase: self.trial.phase(),
            repetitions_completed: self.trial.repetitions_completed(),
            familiarizing: self.trial.is_familiarizing(),
            accepted_samples: self.accepted_samples,
            status: self.trial.status(now),
        }
    }

    fn reset_cursor_and_shape(&mut self, now: Instant) {
        let center = self.motion.recenter();
        self.velocity.reset(center, now);
        self.shape = GuideShape::generate(self.shape_kind, center_point(self.bounds), self.inverted);
    }
}

fn center_point(bounds: CanvasBounds) -> Point {
    bounds.center().to_point()
}
