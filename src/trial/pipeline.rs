use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, error, info, trace, warn};

use crate::audio::CueCommand;
use crate::config::AppConfig;
use crate::serial::{LineSource, SerialError, SerialLineSource};
use crate::types::{AcceptedSample, PipelineEvent, SessionCommand};
use super::machine::TrialEvent;
use super::session::{LineOutcome, SessionContext};

/// 读取错误日志的最小间隔
const READ_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// 读取出错后等待再重试，设备拔出时不空转
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// 采集线程使用的通道
pub struct PipelineChannels {
    pub commands: Receiver<SessionCommand>,
    pub events: Sender<PipelineEvent>,
    pub samples: Sender<AcceptedSample>,
    pub cues: Sender<CueCommand>,
}

/// 采集线程入口：打开串口后进入主循环
///
/// 串口打不开时只通知界面并返回，应用其余部分继续可用。
pub fn start_pipeline(
    config: AppConfig,
    channels: PipelineChannels,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<(), SerialError> {
    let mut source = match SerialLineSource::open(&config.serial) {
        Ok(source) => source,
        Err(e) => {
            error!("Could not connect to sensor: {}", e);
            let _ = channels.events.try_send(PipelineEvent::ConnectionFailed { reason: e.to_string() });
            return Err(e);
        }
    };

    info!("Sensor connected on {}", source.port_name());
    let _ = channels.events.try_send(PipelineEvent::Connected {
        port: source.port_name().to_string(),
    });

    let mut session = SessionContext::new(&config, Instant::now());
    run_pipeline(&mut source, &mut session, &channels, &shutdown_signal);

    // source 在这里被释放，串口随之关闭
    let _ = channels.events.try_send(PipelineEvent::Stopped);
    info!("Pipeline stopped after {} accepted samples", session.accepted_samples());
    Ok(())
}

/// 主循环：读一行 → 应用命令 → 推进计时器 → 处理样本 → 发布快照
///
/// 命令在处理样本之前统一生效，复位不会打断一个样本的处理过程。
pub fn run_pipeline<S: LineSource>(
    source: &mut S,
    session: &mut SessionContext,
    channels: &PipelineChannels,
    shutdown_signal: &AtomicBool,
) {
    let mut last_read_error: Option<Instant> = None;
    let mut suppressed_errors: u64 = 0;

    while !shutdown_signal.load(Ordering::Relaxed) {
        let read = source.read_line();
        let now = Instant::now();

        while let Ok(command) = channels.commands.try_recv() {
            session.apply_command(command, now);
        }

        while session.tick(now).is_some() {}

        match read {
            Ok(Some(line)) => handle_line(session, &line, now, channels),
            Ok(None) => {}
            Err(e) => {
                // 读取失败按暂时性错误处理，限频记录
                let should_log = last_read_error.map_or(true, |t| now.duration_since(t) >= READ_ERROR_LOG_INTERVAL);
                if should_log {
                    warn!("{} ({} similar errors suppressed)", e, suppressed_errors);
                    last_read_error = Some(now);
                    suppressed_errors = 0;
                } else {
                    suppressed_errors += 1;
                }
                thread::sleep(READ_ERROR_BACKOFF);
            }
        }

        match channels.events.try_send(PipelineEvent::Snapshot(session.snapshot(now))) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                // 通道断开表示界面已关闭
                info!("Event channel disconnected, pipeline exiting");
                break;
            }
        }
    }

    info!("Pipeline received shutdown signal, exiting");
}

fn handle_line(session: &mut SessionContext, line: &str, now: Instant, channels: &PipelineChannels) {
    match session.process_line(line, now) {
        LineOutcome::Skipped(reason) => debug!("Skipped serial line {:?}: {}", line.trim(), reason),
        LineOutcome::Paused => {}
        LineOutcome::Processed {
            cursor,
            velocity,
            outcome,
            record,
        } => {
            trace!("Cursor ({}, {}) at {:.1} px/s, accepted: {}", cursor.x, cursor.y, velocity, outcome.accepted.is_some());

            if outcome.start_cue {
                if let Err(e) = channels.cues.try_send(CueCommand::PlayStartTone) {
                    debug!("Start tone not played: {}", e);
                }
            }

            if let Some(record) = record {
                if let Err(e) = channels.samples.send(record) {
                    error!("Sample log channel closed, sample lost: {:?}", e.into_inner());
                }
            }

            match outcome.event {
                Some(TrialEvent::PracticeStarted) => info!("Familiarization trace started"),
                Some(TrialEvent::RecordingStarted) => info!("Recording started"),
                Some(TrialEvent::RepetitionCompleted { completed, practice }) => {
                    info!("Repetition {} completed (practice: {})", completed, practice)
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::CanvasBounds;
    use crate::shape::ShapeKind;
    use crate::trial::machine::TrialTiming;
    use crate::types::CursorPosition;
    use crossbeam_channel::bounded;
    use std::collections::VecDeque;
    use std::io;

    /// 预设行序列，读完后触发关闭信号
    struct ScriptedSource {
        lines: VecDeque<Result<Option<String>, SerialError>>,
        shutdown: Arc<AtomicBool>,
        before_read: Option<Box<dyn FnMut()>>,
    }

    impl ScriptedSource {
        fn new(lines: Vec<Result<Option<String>, SerialError>>, shutdown: Arc<AtomicBool>) -> Self {
            Self {
                lines: lines.into(),
                shutdown,
                before_read: None,
            }
        }
    }

    impl LineSource for ScriptedSource {
        fn read_line(&mut self) -> Result<Option<String>, SerialError> {
            if let Some(hook) = self.before_read.as_mut() {
                hook();
            }
            match self.lines.pop_front() {
                Some(line) => line,
                None => {
                    self.shutdown.store(true, Ordering::Relaxed);
                    Ok(None)
                }
            }
        }
    }

    struct Harness {
        channels: PipelineChannels,
        command_tx: Sender<SessionCommand>,
        event_rx: Receiver<PipelineEvent>,
        sample_rx: Receiver<AcceptedSample>,
        cue_rx: Receiver<CueCommand>,
    }

    fn harness() -> Harness {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = bounded(1024);
        let (sample_tx, sample_rx) = bounded(1024);
        let (cue_tx, cue_rx) = bounded(16);
        Harness {
            channels: PipelineChannels {
                commands: command_rx,
                events: event_tx,
                samples: sample_tx,
                cues: cue_tx,
            },
            command_tx,
            event_rx,
            sample_rx,
            cue_rx,
        }
    }

    fn last_snapshot_cursor(event_rx: &Receiver<PipelineEvent>) -> Option<CursorPosition> {
        event_rx
            .try_iter()
            .filter_map(|event| match event {
                PipelineEvent::Snapshot(snapshot) => Some(snapshot.cursor),
                _ => None,
            })
            .last()
    }

    #[test]
    fn survives_garbage_and_read_errors() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(
            vec![
                Ok(Some("1,0,100\n".to_string())),
                Ok(Some("\u{fffd}\u{fffd},,\n".to_string())),
                Err(SerialError::Read(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))),
                Ok(None),
                Ok(Some("1,0,2\n".to_string())),
                Ok(Some("2,0,60\n".to_string())),
            ],
            Arc::clone(&shutdown),
        );
        let h = harness();
        let mut session = SessionContext::new(&AppConfig::default(), Instant::now());

        run_pipeline(&mut source, &mut session, &h.channels, &shutdown);

        // 100/20 = 5, 2/20 = 0, 60/20 = 3
        assert_eq!(session.cursor(), CursorPosition::new(408, 300));
        assert_eq!(last_snapshot_cursor(&h.event_rx), Some(CursorPosition::new(408, 300)));
        assert!(h.sample_rx.try_recv().is_err());
    }

    #[test]
    fn commands_apply_before_the_next_sample() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(vec![Ok(Some("1,0,200\n".to_string()))], Arc::clone(&shutdown));
        let h = harness();
        let mut session = SessionContext::new(&AppConfig::default(), Instant::now());

        h.command_tx
            .send(SessionCommand::SelectShape(crate::shape::ShapeKind::Circle))
            .unwrap();
        run_pipeline(&mut source, &mut session, &h.channels, &shutdown);

        // 复位倒计时中，这一行被丢弃
        assert_eq!(session.cursor(), CursorPosition::new(400, 300));
        assert_eq!(session.shape().kind, crate::shape::ShapeKind::Circle);
        assert!(session.trial().is_familiarizing());
    }

    #[test]
    fn command_sent_during_read_takes_effect_for_that_line() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let h = harness();
        let command_tx = h.command_tx.clone();
        let mut sent = false;
        let mut source = ScriptedSource::new(
            vec![Ok(Some("1,0,100\n".to_string())), Ok(Some("1,0,100\n".to_string()))],
            Arc::clone(&shutdown),
        );
        let mut reads = 0;
        source.before_read = Some(Box::new(move || {
            reads += 1;
            if reads == 2 && !sent {
                command_tx.send(SessionCommand::ResetCursor).unwrap();
                sent = true;
            }
        }));
        let mut session = SessionContext::new(&AppConfig::default(), Instant::now());

        run_pipeline(&mut source, &mut session, &h.channels, &shutdown);

        // 第一行移动 5px，第二行前收到复位，光标回到中心且该行被丢弃
        assert_eq!(session.cursor(), CursorPosition::new(400, 300));
        assert_eq!(session.trial().phase(), crate::trial::TrialPhase::WaitingAtStart);
    }

    fn lines(yaws: &[i32]) -> Vec<Result<Option<String>, SerialError>> {
        yaws.iter().map(|yaw| Ok(Some(format!("1,0,{}\n", yaw)))).collect()
    }

    #[test]
    fn arming_plays_one_cue_and_accepted_samples_reach_the_log() {
        let shutdown = Arc::new(AtomicBool::new(false));
        // 灵敏度 20：-4000 -> 起点 (200,300)，+4000 -> 中心，再 +4000 -> 终点 (600,300)
        let mut script = Vec::new();
        script.extend(lines(&[-4000, 4000, 4000])); // 熟悉 1
        script.extend(lines(&[-4000, 4000, 4000])); // 熟悉 2，随后长休息结束熟悉阶段
        script.extend(lines(&[-4000, 4000, 4000])); // 记录第 0 次
        script.extend(lines(&[-4000, 8000])); // 记录第 1 次
        let mut source = ScriptedSource::new(script, Arc::clone(&shutdown));
        // 保证相邻样本的 dt 大于 0
        source.before_read = Some(Box::new(|| thread::sleep(Duration::from_millis(2))));

        let timing = TrialTiming {
            zone_radius: 10.0,
            vel_min: 0.0,
            // 休息结束后的第一个样本与复位同一时刻，dt 为 0
            vel_max: f64::INFINITY,
            repetitions_per_cycle: 2,
            cooldown: Duration::ZERO,
            short_rest: Duration::ZERO,
            long_rest: Duration::ZERO,
            reset_countdown: Duration::ZERO,
        };
        let mut session = SessionContext::with_parts(
            CanvasBounds::new(800, 600),
            20.0,
            timing,
            ShapeKind::HorizontalLine,
            Instant::now(),
        );
        let h = harness();

        run_pipeline(&mut source, &mut session, &h.channels, &shutdown);

        let cues: Vec<CueCommand> = h.cue_rx.try_iter().collect();
        assert_eq!(cues, vec![CueCommand::PlayStartTone, CueCommand::PlayStartTone]);

        let records: Vec<(ShapeKind, u32, i32, i32)> = h
            .sample_rx
            .try_iter()
            .map(|r| (r.shape, r.repetition, r.x, r.y))
            .collect();
        assert_eq!(
            records,
            vec![
                (ShapeKind::HorizontalLine, 0, 200, 300),
                (ShapeKind::HorizontalLine, 0, 400, 300),
                (ShapeKind::HorizontalLine, 0, 600, 300),
                (ShapeKind::HorizontalLine, 1, 200, 300),
                (ShapeKind::HorizontalLine, 1, 600, 300),
            ]
        );
        assert_eq!(session.accepted_samples(), 5);
    }

    #[test]
    fn read_errors_back_off_before_retrying() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let errors = (0..3)
            .map(|_| Err(SerialError::Read(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))))
            .collect();
        let mut source = ScriptedSource::new(errors, Arc::clone(&shutdown));
        let h = harness();
        let mut session = SessionContext::new(&AppConfig::default(), Instant::now());

        let started = Instant::now();
        run_pipeline(&mut source, &mut session, &h.channels, &shutdown);

        assert!(started.elapsed() >= READ_ERROR_BACKOFF * 3);
        // 每次读取一个快照，出错时不会连续刷新
        let snapshots = h
            .event_rx
            .try_iter()
            .filter(|e| matches!(e, PipelineEvent::Snapshot(_)))
            .count();
        assert_eq!(snapshots, 4);
    }

    #[test]
    fn stops_when_event_channel_disconnects() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut source = ScriptedSource::new(
            vec![Ok(Some("1,0,20\n".to_string())), Ok(Some("1,0,20\n".to_string()))],
            Arc::clone(&shutdown),
        );
        let h = harness();
        drop(h.event_rx);
        let mut session = SessionContext::new(&AppConfig::default(), Instant::now());

        run_pipeline(&mut source, &mut session, &h.channels, &shutdown);

        // 第一轮后发现界面已关闭，第二行不再处理
        assert_eq!(session.cursor(), CursorPosition::new(401, 300));
        assert!(!shutdown.load(Ordering::Relaxed));
        assert!(h.cue_rx.try_recv().is_err());
    }

    #[test]
    fn unreachable_port_reports_connection_failure() {
        let mut config = AppConfig::default();
        config.serial.port = "/dev/tracehub-no-such-port".to_string();
        config.serial.settle_ms = 0;
        let h = harness();

        let result = start_pipeline(config, h.channels, Arc::new(AtomicBool::new(false)));

        assert!(result.is_err());
        assert!(matches!(h.event_rx.try_recv(), Ok(PipelineEvent::ConnectionFailed { .. })));
    }
}
