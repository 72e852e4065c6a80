use std::time::{Duration, Instant};

use crate::config::{MotionConfig, TrialConfig};
use crate::types::{CursorPosition, Point, StatusLine, StatusTone};

/// 试次阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialPhase {
    /// 熟悉阶段：光标自由移动，不记录
    Familiarizing,
    /// 等待进入起点区域
    WaitingAtStart,
    Recording,
    /// 刚完成第 n 次重复
    RepCooldown(u32),
    ShortRest,
    LongRest,
}

impl TrialPhase {
    /// 冷却和休息阶段忽略所有样本
    pub fn is_pause(self) -> bool {
        matches!(self, TrialPhase::RepCooldown(_) | TrialPhase::ShortRest | TrialPhase::LongRest)
    }

    pub fn label(self) -> &'static str {
        match self {
            TrialPhase::Familiarizing => "Familiarizing",
            TrialPhase::WaitingAtStart => "Waiting at start",
            TrialPhase::Recording => "Recording",
            TrialPhase::RepCooldown(_) => "Cooldown",
            TrialPhase::ShortRest => "Short rest",
            TrialPhase::LongRest => "Long rest",
        }
    }
}

/// 流程参数
#[derive(Clone, Debug, PartialEq)]
pub struct TrialTiming {
    pub zone_radius: f64,
    pub vel_min: f64,
    pub vel_max: f64,
    pub repetitions_per_cycle: u32,
    pub cooldown: Duration,
    pub short_rest: Duration,
    pub long_rest: Duration,
    pub reset_countdown: Duration,
}

impl TrialTiming {
    pub fn from_config(motion: &MotionConfig, trial: &TrialConfig) -> Self {
        Self {
            zone_radius: trial.zone_radius_px,
            vel_min: motion.vel_min,
            vel_max: motion.vel_max,
            repetitions_per_cycle: trial.repetitions_per_cycle,
            cooldown: Duration::from_secs_f64(trial.cooldown_secs),
            short_rest: Duration::from_secs_f64(trial.short_rest_secs),
            long_rest: Duration::from_secs_f64(trial.long_rest_secs),
            reset_countdown: Duration::from_secs_f64(trial.reset_countdown_secs),
        }
    }

    pub fn velocity_in_window(&self, velocity: f64) -> bool {
        // NaN 不满足任何比较，自然被排除
        self.vel_min <= velocity && velocity <= self.vel_max
    }
}

impl Default for TrialTiming {
    fn default() -> Self {
        Self::from_config(&MotionConfig::default(), &TrialConfig::default())
    }
}

/// 样本触发的流程事件
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialEvent {
    /// 熟悉阶段进入起点，只提示不记录
    PracticeStarted,
    RecordingStarted,
    RepetitionCompleted { completed: u32, practice: bool },
}

/// 计时器到期产生的事件
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    CooldownElapsed { long_rest: bool },
    /// 休息结束，调用方需要复位光标并重新生成图形
    RestElapsed,
    CountdownElapsed,
}

/// 单个样本的处理结果
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleOutcome {
    /// 通过门限时为当前重复序号
    pub accepted: Option<u32>,
    pub start_cue: bool,
    pub event: Option<TrialEvent>,
}

/// 试次状态机，会话中唯一的流程状态
#[derive(Clone, Debug)]
pub struct TrialMachine {
    timing: TrialTiming,
    phase: TrialPhase,
    repetitions_completed: u32,
    familiarizing: bool,
    /// 熟悉阶段已确认进入起点
    start_acknowledged: bool,
    /// 本次描画开始后光标已离开起点区域
    left_start_zone: bool,
    deadline: Option<Instant>,
    countdown_until: Option<Instant>,
}

impl TrialMachine {
    pub fn new(timing: TrialTiming) -> Self {
        Self {
            timing,
            phase: TrialPhase::Familiarizing,
            repetitions_completed: 0,
            familiarizing: true,
            start_acknowledged: false,
            left_start_zone: false,
            deadline: None,
            countdown_until: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn repetitions_completed(&self) -> u32 {
        self.repetitions_completed
    }

    pub fn is_familiarizing(&self) -> bool {
        self.familiarizing
    }

    pub fn timing(&self) -> &TrialTiming {
        &self.timing
    }

    pub fn is_recording(&self) -> bool {
        self.phase == TrialPhase::Recording
    }

    /// 复位倒计时剩余时间
    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        self.countdown_until
            .map(|until| until.saturating_duration_since(now))
            .filter(|remaining| !remaining.is_zero())
    }

    /// 冷却/休息剩余时间
    pub fn pause_remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(now))
    }

    /// 暂停期间样本被读出后直接丢弃
    pub fn is_paused(&self, now: Instant) -> bool {
        self.phase.is_pause() || self.countdown_remaining(now).is_some()
    }

    /// 图形、方向或手动复位：立即回到起点等待，计数清零，重新进入熟悉阶段
    pub fn override_reset(&mut self, now: Instant) {
        self.phase = TrialPhase::WaitingAtStart;
        self.repetitions_completed = 0;
        self.familiarizing = true;
        self.clear_trace();
        self.deadline = None;
        self.start_countdown(now);
    }

    /// 推进计时器，每次最多一个阶段转换
    pub fn tick(&mut self, now: Instant) -> Option<TimerEvent> {
        if let Some(until) = self.countdown_until {
            if now >= until {
                self.countdown_until = None;
                return Some(TimerEvent::CountdownElapsed);
            }
        }

        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        match self.phase {
            TrialPhase::RepCooldown(completed) => {
                if completed >= self.timing.repetitions_per_cycle {
                    // 一轮结束：计数清零，熟悉阶段在长休息结束后才退出
                    self.repetitions_completed = 0;
                    self.phase = TrialPhase::LongRest;
                    self.deadline = Some(now + self.timing.long_rest);
                    Some(TimerEvent::CooldownElapsed { long_rest: true })
                } else {
                    self.phase = TrialPhase::ShortRest;
                    self.deadline = Some(now + self.timing.short_rest);
                    Some(TimerEvent::CooldownElapsed { long_rest: false })
                }
            }
            TrialPhase::ShortRest | TrialPhase::LongRest => {
                if self.phase == TrialPhase::LongRest {
                    self.familiarizing = false;
                }
                self.phase = TrialPhase::WaitingAtStart;
                self.deadline = None;
                self.clear_trace();
                self.start_countdown(now);
                Some(TimerEvent::RestElapsed)
            }
            _ => {
                self.deadline = None;
                None
            }
        }
    }

    /// 处理一个已积分的样本：先判断起点，再做速度门限，最后判断终点
    pub fn on_sample(
        &mut self,
        now: Instant,
        cursor: CursorPosition,
        velocity: f64,
        start_anchor: Point,
        end_anchor: Point,
    ) -> SampleOutcome {
        let mut outcome = SampleOutcome::default();
        if self.is_paused(now) {
            return outcome;
        }

        let point = cursor.to_point();
        let in_start = point.distance_to(start_anchor) < self.timing.zone_radius;
        let in_end = point.distance_to(end_anchor) < self.timing.zone_radius;

        match self.phase {
            TrialPhase::WaitingAtStart if in_start => {
                self.left_start_zone = false;
                if self.familiarizing {
                    self.phase = TrialPhase::Familiarizing;
                    self.start_acknowledged = true;
                    outcome.event = Some(TrialEvent::PracticeStarted);
                } else {
                    self.phase = TrialPhase::Recording;
                    outcome.start_cue = true;
                    outcome.event = Some(TrialEvent::RecordingStarted);
                }
            }
            TrialPhase::Familiarizing if in_start && !self.start_acknowledged => {
                self.start_acknowledged = true;
                self.left_start_zone = false;
                outcome.event = Some(TrialEvent::PracticeStarted);
            }
            _ => {}
        }

        let tracing = match self.phase {
            TrialPhase::Recording => true,
            TrialPhase::Familiarizing => self.start_acknowledged,
            _ => false,
        };
        if !tracing {
            return outcome;
        }

        if !in_start {
            self.left_start_zone = true;
        }

        if self.is_recording() && self.timing.velocity_in_window(velocity) {
            outcome.accepted = Some(self.repetitions_completed);
        }

        if in_end && self.left_start_zone {
            let practice = self.phase == TrialPhase::Familiarizing;
            self.repetitions_completed += 1;
            self.phase = TrialPhase::RepCooldown(self.repetitions_completed);
            self.deadline = Some(now + self.timing.cooldown);
            self.clear_trace();
            outcome.event = Some(TrialEvent::RepetitionCompleted {
                completed: self.repetitions_completed,
                practice,
            });
        }

        outcome
    }

    /// 当前状态的提示文字
    pub fn status(&self, now: Instant) -> StatusLine {
        let cycle = self.timing.repetitions_per_cycle;

        if let Some(remaining) = self.countdown_remaining(now) {
            return StatusLine::new(format!("Restarting in {}...", ceil_secs(remaining)), StatusTone::Waiting);
        }

        match self.phase {
            TrialPhase::Familiarizing if self.start_acknowledged => {
                StatusLine::new("Familiarization in progress...", StatusTone::Neutral)
            }
            TrialPhase::Familiarizing => {
                StatusLine::new("Familiarization: move to the green marker", StatusTone::Neutral)
            }
            TrialPhase::WaitingAtStart if self.familiarizing => {
                StatusLine::new("Familiarization: move to the green marker", StatusTone::Neutral)
            }
            TrialPhase::WaitingAtStart => StatusLine::new("Move to the green marker to start", StatusTone::Neutral),
            TrialPhase::Recording => StatusLine::new(
                format!("Recording... (repetition {}/{})", self.repetitions_completed + 1, cycle),
                StatusTone::Active,
            ),
            TrialPhase::RepCooldown(completed) => {
                StatusLine::new(format!("Repetition {}/{} finished", completed, cycle), StatusTone::Waiting)
            }
            TrialPhase::ShortRest => StatusLine::new(
                format!("Short rest: {}s", ceil_secs(self.pause_remaining(now).unwrap_or_default())),
                StatusTone::Rest,
            ),
            TrialPhase::LongRest => StatusLine::new(
                format!("Long rest: {}s", ceil_secs(self.pause_remaining(now).unwrap_or_default())),
                StatusTone::Rest,
            ),
        }
    }

    fn clear_trace(&mut self) {
        self.start_acknowledged = false;
        self.left_start_zone = false;
    }

    fn start_countdown(&mut self, now: Instant) {
        self.countdown_until = Some(now + self.timing.reset_countdown);
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
