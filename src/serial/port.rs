use std::io::{self, BufRead, BufReader};
use std::thread;

use log::{info, warn};
use serialport::SerialPort;

use crate::config::SerialConfig;

/// 串口错误类型
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// 无法打开串口，采集线程不会启动
    #[error("could not open serial port {port} @ {baud}: {source}")]
    Open {
        port: String,
        baud: u32,
        #[source]
        source: serialport::Error,
    },
    /// 打开后读取失败，按暂时性错误处理
    #[error("serial read failed: {0}")]
    Read(#[from] io::Error),
}

/// 按行读取的数据源
///
/// `Ok(None)` 表示本次读取超时或尚未凑成完整的一行。
pub trait LineSource {
    fn read_line(&mut self) -> Result<Option<String>, SerialError>;
}

/// 跨超时拼接整行，超长的行整行丢弃
#[derive(Debug)]
pub struct LineAssembler {
    pending: Vec<u8>,
    max_line_len: usize,
    /// 溢出后丢弃到下一个换行
    discarding: bool,
}

impl LineAssembler {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(max_line_len),
            max_line_len,
            discarding: false,
        }
    }

    /// 从 `reader` 读取一次；凑成完整且未超长的一行时返回
    ///
    /// 超时不算错误，已读到的半行保留到下一次调用。
    pub fn poll<R: BufRead>(&mut self, reader: &mut R) -> io::Result<Option<String>> {
        match reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => Ok(None),
            Ok(_) if self.pending.last() == Some(&b'\n') => Ok(self.finish_line()),
            Ok(_) => Ok(self.check_overflow()),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(self.check_overflow()),
            Err(e) => {
                self.pending.clear();
                self.discarding = false;
                Err(e)
            }
        }
    }

    fn finish_line(&mut self) -> Option<String> {
        // 不计换行符
        let too_long = self.pending.len() - 1 > self.max_line_len;
        let line = if self.discarding {
            self.discarding = false;
            None
        } else if too_long {
            warn!("Serial line exceeded {} bytes, dropping it", self.max_line_len);
            None
        } else {
            Some(String::from_utf8_lossy(&self.pending).into_owned())
        };
        self.pending.clear();
        line
    }

    /// 超长的半行直接丢弃，等待下一个换行重新同步
    fn check_overflow(&mut self) -> Option<String> {
        if self.pending.len() > self.max_line_len {
            if !self.discarding {
                warn!("Serial line exceeded {} bytes, dropping it", self.max_line_len);
            }
            self.pending.clear();
            self.discarding = true;
        }
        None
    }
}

/// 基于 serialport 的行读取器
pub struct SerialLineSource {
    reader: BufReader<Box<dyn SerialPort>>,
    assembler: LineAssembler,
    port_name: String,
}

impl SerialLineSource {
    /// 打开串口并等待设备稳定
    pub fn open(config: &SerialConfig) -> Result<Self, SerialError> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| SerialError::Open {
                port: config.port.clone(),
                baud: config.baud_rate,
                source,
            })?;

        info!("Serial port {} opened at {} baud, settling for {}ms", config.port, config.baud_rate, config.settle_ms);
        thread::sleep(config.settle_delay());

        // 丢掉稳定期间积压的半行数据
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            warn!("Failed to clear serial input buffer: {}", e);
        }

        Ok(Self {
            reader: BufReader::new(port),
            assembler: LineAssembler::new(config.max_line_len),
            port_name: config.port.clone(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl LineSource for SerialLineSource {
    fn read_line(&mut self) -> Result<Option<String>, SerialError> {
        Ok(self.assembler.poll(&mut self.reader)?)
    }
}
