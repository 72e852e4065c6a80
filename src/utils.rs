use chrono::{DateTime, Local, Timelike};

use crate::config::LogConfig;

/// 按记录文件配置格式化本地时间
///
/// 格式串中的 `%p` 替换为配置的上午/下午标记，其余交给 chrono。
pub fn format_log_timestamp(timestamp: &DateTime<Local>, config: &LogConfig) -> String {
    let marker = if timestamp.hour() < 12 {
        config.am_marker.as_str()
    } else {
        config.pm_marker.as_str()
    };
    // 标记中可能含有 `%`，先转义再代入
    let format = config.timestamp_format.replace("%p", &marker.replace('%', "%%"));
    timestamp.format(&format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn morning_uses_am_marker() {
        let t = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_log_timestamp(&t, &LogConfig::default()), "07/03/2024\t09:05 a. m.");
    }

    #[test]
    fn afternoon_uses_pm_marker_and_twelve_hour_clock() {
        let t = Local.with_ymd_and_hms(2024, 12, 31, 15, 42, 10).unwrap();
        assert_eq!(format_log_timestamp(&t, &LogConfig::default()), "31/12/2024\t03:42 p. m.");
    }

    #[test]
    fn custom_format_without_marker() {
        let config = LogConfig {
            timestamp_format: "%Y-%m-%dT%H:%M:%S".to_string(),
            ..LogConfig::default()
        };
        let t = Local.with_ymd_and_hms(2024, 1, 2, 23, 0, 1).unwrap();
        assert_eq!(format_log_timestamp(&t, &config), "2024-01-02T23:00:01");
    }
}
