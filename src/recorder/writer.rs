use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{error, info};

use crate::types::AcceptedSample;
use super::sample_log::CsvSampleLog;

/// 关闭后等待采集线程送出最后几条样本的时间
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// 记录线程：从通道接收样本并逐行写入
///
/// 收到关闭信号后继续写入，直到通道断开或 `DRAIN_TIMEOUT` 内没有新样本。
pub fn run_log_writer(
    mut log: CsvSampleLog,
    sample_receiver: Receiver<AcceptedSample>,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Log writer thread started");

    while !shutdown_signal.load(Ordering::Relaxed) {
        match sample_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => write_sample(&mut log, &sample),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("Log writer: sample channel disconnected");
                break;
            }
        }
    }

    while let Ok(sample) = sample_receiver.recv_timeout(DRAIN_TIMEOUT) {
        write_sample(&mut log, &sample);
    }

    info!("Log writer thread exiting, {} rows in {}", log.rows_written(), log.path().display());
    Ok(())
}

fn write_sample(log: &mut CsvSampleLog, sample: &AcceptedSample) {
    // 单行写入失败不终止记录线程
    if let Err(e) = log.append(sample) {
        error!("Log writer: {}", e);
    }
}
