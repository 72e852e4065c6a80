use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::config::LogConfig;
use crate::types::AcceptedSample;
use crate::utils::format_log_timestamp;

/// 记录文件表头
pub const HEADER: &str = "Timestamp,Shape,Repetition,X,Y";
const DELIMITER: char = ',';

/// 样本记录错误类型
#[derive(Debug, thiserror::Error)]
pub enum SampleLogError {
    #[error("could not create sample log {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write sample log: {0}")]
    Write(#[from] io::Error),
}

/// CSV 样本记录文件，每次启动时重新创建
pub struct CsvSampleLog {
    writer: BufWriter<File>,
    path: PathBuf,
    config: LogConfig,
    rows: u64,
}

impl CsvSampleLog {
    /// 截断（或新建）记录文件并写入表头
    pub fn create(config: &LogConfig) -> Result<Self, SampleLogError> {
        let path = PathBuf::from(&config.path);
        let log = Self::open_fresh(&path, config).map_err(|source| SampleLogError::Create {
            path: path.clone(),
            source,
        })?;
        info!("Sample log initialized at {}", log.path.display());
        Ok(log)
    }

    fn open_fresh(path: &Path, config: &LogConfig) -> io::Result<Self> {
        if config.auto_create_dir {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            config: config.clone(),
            rows: 0,
        })
    }

    /// 追加一行并立即刷新
    pub fn append(&mut self, sample: &AcceptedSample) -> Result<(), SampleLogError> {
        let timestamp = format_log_timestamp(&sample.timestamp, &self.config);
        writeln!(
            self.writer,
            "{}{d}{}{d}{}{d}{}{d}{}",
            quote_field(&timestamp),
            quote_field(sample.shape.label()),
            sample.repetition,
            sample.x,
            sample.y,
            d = DELIMITER,
        )?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}

/// 含分隔符、引号或换行的字段用双引号包裹
fn quote_field(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;
    use chrono::{Local, TimeZone};

    fn config_in(dir: &Path, file: &str) -> LogConfig {
        LogConfig {
            path: dir.join(file).to_string_lossy().into_owned(),
            ..LogConfig::default()
        }
    }

    #[test]
    fn fresh_log_discards_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "session.csv");
        fs::write(&config.path, "stale,data\n1,2\n").unwrap();

        let log = CsvSampleLog::create(&config).unwrap();

        assert_eq!(fs::read_to_string(log.path()).unwrap(), "Timestamp,Shape,Repetition,X,Y\n");
        assert_eq!(log.rows_written(), 0);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "nested/deeper/session.csv");

        let log = CsvSampleLog::create(&config).unwrap();

        assert!(log.path().exists());
    }

    #[test]
    fn missing_directory_without_auto_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            auto_create_dir: false,
            ..config_in(dir.path(), "missing/session.csv")
        };

        assert!(matches!(CsvSampleLog::create(&config), Err(SampleLogError::Create { .. })));
    }

    #[test]
    fn rows_are_flushed_as_they_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "session.csv");
        let mut log = CsvSampleLog::create(&config).unwrap();
        let at = Local.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();

        log.append(&AcceptedSample::new(at, ShapeKind::SCurve, 2, 412, 287)).unwrap();

        // 不关闭文件也能读到完整的行
        let content = fs::read_to_string(&config.path).unwrap();
        assert_eq!(
            content,
            "Timestamp,Shape,Repetition,X,Y\n01/05/2024\t02:30 p. m.,S Curve,2,412,287\n"
        );
        assert_eq!(log.rows_written(), 1);
    }

    #[test]
    fn fields_with_delimiter_are_quoted() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("1,5"), "\"1,5\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
