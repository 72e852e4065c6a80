use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 应用配置管理模块
/// 集中管理所有配置项，提供默认值和配置验证

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/tracehub.toml";

/// 环境变量：覆盖串口设备
pub const ENV_SERIAL_PORT: &str = "TRACEHUB_SERIAL_PORT";
/// 环境变量：覆盖波特率
pub const ENV_BAUD_RATE: &str = "TRACEHUB_BAUD_RATE";

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub serial: SerialConfig,
    pub canvas: CanvasConfig,
    pub motion: MotionConfig,
    pub trial: TrialConfig,
    pub log: LogConfig,
    pub channels: ChannelConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub resizable: bool,
    pub vsync: bool,
    pub hardware_acceleration: bool,
    /// 界面刷新间隔
    pub repaint_interval_ms: u64,
}

/// 串口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// 打开串口后等待设备稳定的时间
    pub settle_ms: u64,
    /// 单次读取超时，超时后检查关闭信号和计时器
    pub read_timeout_ms: u64,
    /// 单行最大长度，超过后整行丢弃
    pub max_line_len: usize,
}

/// 画布配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: i32,
    pub height: i32,
    pub stroke_width: f32,
    pub marker_radius: f32,
    pub cursor_radius: f32,
    pub colors: CanvasColors,
}

/// 画布颜色配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasColors {
    pub background: [u8; 3],
    pub guide: [u8; 3],
    pub start_marker: [u8; 3],
    pub end_marker: [u8; 3],
    pub cursor: [u8; 3],
}

/// 光标运动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// 角度到像素的除数
    pub sensitivity: f64,
    /// 记录所需的最小速度 (px/s)
    pub vel_min: f64,
    /// 记录允许的最大速度 (px/s)
    pub vel_max: f64,
}

/// 试次流程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub zone_radius_px: f64,
    pub repetitions_per_cycle: u32,
    pub cooldown_secs: f64,
    pub short_rest_secs: f64,
    pub long_rest_secs: f64,
    /// 光标复位后的倒计时
    pub reset_countdown_secs: f64,
    pub cue_frequency_hz: f32,
    pub cue_duration_ms: u64,
}

/// 记录文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: String,
    /// chrono 格式串，%p 会被替换为下面的上午/下午标记
    pub timestamp_format: String,
    pub am_marker: String,
    pub pm_marker: String,
    pub auto_create_dir: bool,
}

/// 通道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub command_channel_capacity: usize,
    pub event_channel_capacity: usize,
    pub sample_channel_capacity: usize,
    pub cue_channel_capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "TraceHub - Fine Motor Assessment".to_string(),
            resizable: false,
            vsync: true,
            hardware_acceleration: true,
            repaint_interval_ms: 30,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "COM5".to_string(),
            baud_rate: 115_200,
            settle_ms: 2000,
            read_timeout_ms: 100,
            max_line_len: 256,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            stroke_width: 20.0,
            marker_radius: 5.0,
            cursor_radius: 3.0,
            colors: CanvasColors::default(),
        }
    }
}

impl Default for CanvasColors {
    fn default() -> Self {
        Self {
            background: [255, 255, 255], // 白色
            guide: [0, 0, 255],          // 蓝色
            start_marker: [0, 160, 0],   // 绿色
            end_marker: [220, 0, 0],     // 红色
            cursor: [255, 0, 0],
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sensitivity: 20.0,
            vel_min: 20.0,
            vel_max: 400.0,
        }
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            zone_radius_px: 10.0,
            repetitions_per_cycle: 5,
            cooldown_secs: 1.0,
            short_rest_secs: 10.0,
            long_rest_secs: 60.0,
            reset_countdown_secs: 5.0,
            cue_frequency_hz: 1000.0,
            cue_duration_ms: 300,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: "data/trace_session.csv".to_string(),
            timestamp_format: "%d/%m/%Y\t%I:%M %p".to_string(),
            am_marker: "a. m.".to_string(),
            pm_marker: "p. m.".to_string(),
            auto_create_dir: true,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_channel_capacity: 64,
            event_channel_capacity: 256,
            sample_channel_capacity: 5000,
            cue_channel_capacity: 8,
        }
    }
}

impl SerialConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl CanvasConfig {
    /// 画布中心（整数像素）
    pub fn center(&self) -> (i32, i32) {
        (self.width / 2, self.height / 2)
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        std::fs::write(path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// 用环境变量覆盖串口设置
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var(ENV_SERIAL_PORT) {
            self.serial.port = port;
        }
        if let Ok(baud) = env::var(ENV_BAUD_RATE) {
            self.serial.baud_rate = baud.trim().parse::<u32>().map_err(|e| {
                ConfigError::ValidationError(format!("{} is not a valid baud rate: {}", ENV_BAUD_RATE, e))
            })?;
        }
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width <= 0 || self.canvas.height <= 0 {
            return Err(ConfigError::ValidationError("Canvas dimensions must be positive".to_string()));
        }

        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::ValidationError("Serial port must not be empty".to_string()));
        }

        if self.serial.baud_rate == 0 {
            return Err(ConfigError::ValidationError("Baud rate must be positive".to_string()));
        }

        if self.serial.max_line_len == 0 {
            return Err(ConfigError::ValidationError("Maximum line length must be positive".to_string()));
        }

        if !(self.motion.sensitivity.is_finite() && self.motion.sensitivity > 0.0) {
            return Err(ConfigError::ValidationError("Sensitivity must be a positive number".to_string()));
        }

        let window_finite = self.motion.vel_min.is_finite() && self.motion.vel_max.is_finite();
        if !window_finite || self.motion.vel_min < 0.0 || self.motion.vel_min > self.motion.vel_max {
            return Err(ConfigError::ValidationError(
                "Velocity window must satisfy 0 <= vel_min <= vel_max".to_string(),
            ));
        }

        if !(self.trial.zone_radius_px.is_finite() && self.trial.zone_radius_px > 0.0) {
            return Err(ConfigError::ValidationError("Zone radius must be positive".to_string()));
        }

        if self.trial.repetitions_per_cycle == 0 {
            return Err(ConfigError::ValidationError("A cycle needs at least one repetition".to_string()));
        }

        let durations = [
            self.trial.cooldown_secs,
            self.trial.short_rest_secs,
            self.trial.long_rest_secs,
            self.trial.reset_countdown_secs,
        ];
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ConfigError::ValidationError("Pause durations must be non-negative".to_string()));
        }

        if self.log.path.trim().is_empty() {
            return Err(ConfigError::ValidationError("Log path must not be empty".to_string()));
        }

        let capacities = [
            self.channels.command_channel_capacity,
            self.channels.event_channel_capacity,
            self.channels.sample_channel_capacity,
            self.channels.cue_channel_capacity,
        ];
        if capacities.contains(&0) {
            return Err(ConfigError::ValidationError("Channel capacities must be positive".to_string()));
        }

        Ok(())
    }

}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 配置管理器
pub struct ConfigManager {
    config: AppConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// 使用默认配置，保存时写到指定路径
    pub fn with_defaults<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config: AppConfig::default(),
            config_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = AppConfig::load_from_file(&path)?;
        Ok(Self {
            config,
            config_path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// 启动时加载：先读 .env，配置文件存在则使用，否则写出一份默认配置
    pub fn load_startup() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = Path::new(DEFAULT_CONFIG_PATH);
        let mut manager = if path.exists() {
            Self::load_from_file(path)?
        } else {
            let manager = Self::with_defaults(path);
            match manager.save() {
                Ok(()) => info!("Default configuration written to {}", path.display()),
                Err(e) => warn!("Could not write default configuration: {}", e),
            }
            manager
        };

        // 环境变量只影响本次运行，不写回文件
        manager.config.apply_env_overrides()?;
        manager.config.validate()?;
        Ok(manager)
    }

    /// 获取当前配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 配置文件路径
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 保存配置，必要时创建目录
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.config_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
            }
            self.config.save_to_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_experiment_constants() {
        let config = AppConfig::default();
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!((config.canvas.width, config.canvas.height), (800, 600));
        assert_eq!(config.motion.sensitivity, 20.0);
        assert_eq!((config.motion.vel_min, config.motion.vel_max), (20.0, 400.0));
        assert_eq!(config.trial.repetitions_per_cycle, 5);
        assert_eq!(config.trial.zone_radius_px, 10.0);
        assert_eq!(config.log.timestamp_format, "%d/%m/%Y\t%I:%M %p");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracehub.toml");

        let mut config = AppConfig::default();
        config.serial.port = "/dev/ttyUSB0".to_string();
        config.trial.long_rest_secs = 30.0;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.serial.port, "/dev/ttyUSB0");
        assert_eq!(loaded.trial.long_rest_secs, 30.0);
        // 制表符经过 TOML 转义后保持不变
        assert_eq!(loaded.log.timestamp_format, config.log.timestamp_format);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[motion]\nsensitivity = 10.0\n").unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.motion.sensitivity, 10.0);
        assert_eq!(loaded.motion.vel_max, 400.0);
        assert_eq!(loaded.serial.baud_rate, 115_200);
    }

    #[test]
    fn rejects_inverted_velocity_window() {
        let mut config = AppConfig::default();
        config.motion.vel_min = 500.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_nan_in_velocity_window_and_zone_radius() {
        let mut config = AppConfig::default();
        config.motion.vel_min = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AppConfig::default();
        config.motion.vel_max = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AppConfig::default();
        config.motion.vel_max = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AppConfig::default();
        config.trial.zone_radius_px = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn manager_save_creates_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("tracehub.toml");
        let manager = ConfigManager::with_defaults(&path);

        manager.save().unwrap();

        let reloaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(reloaded.config_path(), Some(path.as_path()));
        assert_eq!(reloaded.get_config().serial.port, "COM5");
    }

    #[test]
    fn rejects_zero_sensitivity() {
        let mut config = AppConfig::default();
        config.motion.sensitivity = 0.0;
        assert!(config.validate().is_err());
    }
}
