use crate::types::{CursorPosition, OrientationSample};

/// 画布边界，光标坐标取值范围为 [0, width) × [0, height)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasBounds {
    pub width: i32,
    pub height: i32,
}

impl CanvasBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> CursorPosition {
        CursorPosition::new(self.width / 2, self.height / 2)
    }

    pub fn clamp(&self, x: i64, y: i64) -> CursorPosition {
        let x = x.clamp(0, i64::from(self.width - 1));
        let y = y.clamp(0, i64::from(self.height - 1));
        // 已经限制在 i32 范围内
        CursorPosition::new(x as i32, y as i32)
    }
}

/// 姿态角到光标位移的积分器
#[derive(Clone, Debug)]
pub struct MotionIntegrator {
    position: CursorPosition,
    bounds: CanvasBounds,
    sensitivity: f64,
}

impl MotionIntegrator {
    pub fn new(bounds: CanvasBounds, sensitivity: f64) -> Self {
        Self {
            position: bounds.center(),
            bounds,
            sensitivity,
        }
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// 偏航角控制水平位移，俯仰角控制垂直位移（抬头向上，所以取反）
    ///
    /// 位移按灵敏度相除后向零截断，不做四舍五入。
    pub fn apply(&mut self, sample: OrientationSample) -> CursorPosition {
        let dx = (sample.yaw / self.sensitivity).trunc() as i64;
        let dy = (sample.pitch / self.sensitivity).trunc() as i64;

        self.position = self.bounds.clamp(
            i64::from(self.position.x).saturating_add(dx),
            i64::from(self.position.y).saturating_sub(dy),
        );
        self.position
    }

    /// 光标回到画布中心
    pub fn recenter(&mut self) -> CursorPosition {
        self.position = self.bounds.center();
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn integrator() -> MotionIntegrator {
        MotionIntegrator::new(CanvasBounds::new(800, 600), 20.0)
    }

    #[test]
    fn starts_at_canvas_center() {
        assert_eq!(integrator().position(), CursorPosition::new(400, 300));
    }

    #[test]
    fn yaw_moves_right_by_yaw_over_sensitivity() {
        let mut motion = integrator();
        let pos = motion.apply(OrientationSample::new(0.0, 400.0));
        assert_eq!(pos, CursorPosition::new(420, 300));
    }

    #[test]
    fn positive_pitch_moves_cursor_up() {
        let mut motion = integrator();
        let pos = motion.apply(OrientationSample::new(100.0, 0.0));
        assert_eq!(pos, CursorPosition::new(400, 295));
    }

    #[test]
    fn fractional_displacement_is_truncated_toward_zero() {
        let mut motion = integrator();
        // 39/20 = 1.95 -> 1, -39/20 = -1.95 -> -1
        assert_eq!(motion.apply(OrientationSample::new(0.0, 39.0)), CursorPosition::new(401, 300));
        assert_eq!(motion.apply(OrientationSample::new(0.0, -39.0)), CursorPosition::new(400, 300));
        // 小于一个像素的抖动不移动光标
        assert_eq!(motion.apply(OrientationSample::new(19.9, -19.9)), CursorPosition::new(400, 300));
    }

    #[test]
    fn clamps_at_every_edge() {
        let mut motion = integrator();
        assert_eq!(motion.apply(OrientationSample::new(0.0, 1.0e6)).x, 799);
        assert_eq!(motion.apply(OrientationSample::new(0.0, -1.0e6)).x, 0);
        assert_eq!(motion.apply(OrientationSample::new(1.0e6, 0.0)).y, 0);
        assert_eq!(motion.apply(OrientationSample::new(-1.0e6, 0.0)).y, 599);
    }

    #[test]
    fn huge_values_saturate_instead_of_wrapping() {
        let mut motion = integrator();
        let pos = motion.apply(OrientationSample::new(-1.0e300, 1.0e300));
        assert_eq!(pos, CursorPosition::new(799, 599));
    }

    #[test]
    fn random_walk_stays_inside_canvas() {
        let mut rng = rand::rng();
        let mut motion = integrator();
        for _ in 0..10_000 {
            let sample = OrientationSample::new(rng.random_range(-5000.0..5000.0), rng.random_range(-5000.0..5000.0));
            let pos = motion.apply(sample);
            assert!((0..800).contains(&pos.x), "x out of bounds: {:?}", pos);
            assert!((0..600).contains(&pos.y), "y out of bounds: {:?}", pos);
        }
    }

    #[test]
    fn recenter_returns_to_middle() {
        let mut motion = integrator();
        motion.apply(OrientationSample::new(300.0, -700.0));
        assert_eq!(motion.recenter(), CursorPosition::new(400, 300));
    }
}
