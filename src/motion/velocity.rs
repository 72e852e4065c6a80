use std::time::Instant;

use crate::types::CursorPosition;

/// 两个位置之间的瞬时速度 (px/s)
///
/// 不做平滑。dt 为 0 时得到 inf（或 0/0 = NaN），两者都无法通过速度门限。
pub fn velocity_between(previous: CursorPosition, current: CursorPosition, dt_secs: f64) -> f64 {
    previous.distance_to(current) / dt_secs
}

/// 记录上一个有效样本的位置和时间
#[derive(Clone, Debug)]
pub struct VelocityEstimator {
    last_position: CursorPosition,
    last_time: Instant,
}

impl VelocityEstimator {
    pub fn new(position: CursorPosition, now: Instant) -> Self {
        Self {
            last_position: position,
            last_time: now,
        }
    }

    /// 计算速度并推进基准点
    pub fn update(&mut self, position: CursorPosition, now: Instant) -> f64 {
        let dt = now.saturating_duration_since(self.last_time).as_secs_f64();
        let velocity = velocity_between(self.last_position, position, dt);
        self.last_position = position;
        self.last_time = now;
        velocity
    }

    /// 光标复位后重新设定基准点
    pub fn reset(&mut self, position: CursorPosition, now: Instant) {
        self.last_position = position;
        self.last_time = now;
    }
}
