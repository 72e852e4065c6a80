use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use rodio::source::SineWave;
use rodio::{OutputStreamBuilder, Sink, Source};

use crate::config::TrialConfig;

/// 提示音音量
const CUE_AMPLITUDE: f32 = 0.2;

/// 提示音线程命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueCommand {
    /// 进入起点区域时的提示音
    PlayStartTone,
    Shutdown,
}

/// 提示音错误类型
#[derive(Debug, thiserror::Error)]
pub enum CueError {
    #[error("audio output unavailable: {0}")]
    Stream(#[from] rodio::StreamError),
}

/// 提示音参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration: Duration,
}

impl ToneSpec {
    pub fn from_config(config: &TrialConfig) -> Self {
        Self {
            frequency_hz: config.cue_frequency_hz,
            duration: Duration::from_millis(config.cue_duration_ms),
        }
    }
}

/// 提示音播放器
///
/// 输出流只在工作线程中创建和持有；没有音频设备时提示音被静默丢弃。
pub struct CuePlayer {
    command_sender: Sender<CueCommand>,
    worker_handle: Option<JoinHandle<()>>,
}

impl CuePlayer {
    pub fn new(tone: ToneSpec, capacity: usize) -> Self {
        let (command_sender, command_receiver) = bounded(capacity);

        let worker_handle = thread::spawn(move || {
            if let Err(e) = cue_worker_thread(command_receiver, tone) {
                warn!("Start tone disabled: {}", e);
            }
        });

        Self {
            command_sender,
            worker_handle: Some(worker_handle),
        }
    }

    /// 供采集线程使用的发送端
    pub fn sender(&self) -> Sender<CueCommand> {
        self.command_sender.clone()
    }
}

impl Drop for CuePlayer {
    fn drop(&mut self) {
        let _ = self.command_sender.send(CueCommand::Shutdown);

        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

fn cue_worker_thread(command_receiver: Receiver<CueCommand>, tone: ToneSpec) -> Result<(), CueError> {
    let stream = OutputStreamBuilder::open_default_stream()?;
    info!("Cue thread started ({} Hz, {:?})", tone.frequency_hz, tone.duration);

    loop {
        match command_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(CueCommand::PlayStartTone) => {
                let sink = Sink::connect_new(stream.mixer());
                sink.append(
                    SineWave::new(tone.frequency_hz)
                        .take_duration(tone.duration)
                        .amplify(CUE_AMPLITUDE),
                );
                // 播放完自行结束，不阻塞后续命令
                sink.detach();
                debug!("Start tone played");
            }
            Ok(CueCommand::Shutdown) => {
                info!("Cue thread shutting down");
                break;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_follows_trial_config() {
        let tone = ToneSpec::from_config(&TrialConfig::default());
        assert_eq!(tone.frequency_hz, 1000.0);
        assert_eq!(tone.duration, Duration::from_millis(300));
    }

    #[test]
    fn player_shuts_down_with_or_without_audio_device() {
        let player = CuePlayer::new(ToneSpec::from_config(&TrialConfig::default()), 4);
        let sender = player.sender();
        // 设备不可用时工作线程已退出，发送失败也不应 panic
        let _ = sender.try_send(CueCommand::PlayStartTone);
        drop(player);
    }
}
