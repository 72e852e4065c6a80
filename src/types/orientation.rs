/// 传感器一行数据解码后的姿态角
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientationSample {
    pub pitch: f64,
    pub yaw: f64,
}

impl OrientationSample {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}
