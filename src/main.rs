mod app;
mod audio;
mod config;
mod logger;
mod motion;
mod recorder;
mod serial;
mod shape;
mod trial;
mod types;
mod utils;

use crossbeam_channel::bounded;
use eframe::egui;
use log::{error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use app::TraceApp;
use audio::{CuePlayer, ToneSpec};
use config::ConfigManager;
use recorder::{run_log_writer, CsvSampleLog};
use trial::{start_pipeline, PipelineChannels};

/// 控制面板和状态栏占用的高度
const PANEL_HEIGHT: f32 = 100.0;

fn main() {
    logger::init_logger();
    info!("Application starting");

    let config = match ConfigManager::load_startup() {
        Ok(manager) => {
            if let Some(path) = manager.config_path() {
                info!("Configuration: {}", path.display());
            }
            info!("Sensor port {} @ {} baud", manager.get_config().serial.port, manager.get_config().serial.baud_rate);
            manager.get_config().clone()
        }
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 记录文件每次启动只初始化一次
    let sample_log = match CsvSampleLog::create(&config.log) {
        Ok(log) => log,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let channels = &config.channels;
    let (command_sender, command_receiver) = bounded(channels.command_channel_capacity);
    let (event_sender, event_receiver) = bounded(channels.event_channel_capacity);
    let (sample_sender, sample_receiver) = bounded(channels.sample_channel_capacity);
    let shutdown_signal = Arc::new(AtomicBool::new(false));

    let writer_shutdown = Arc::clone(&shutdown_signal);
    let writer_handle = thread::spawn(move || {
        if let Err(e) = run_log_writer(sample_log, sample_receiver, writer_shutdown) {
            error!("Log writer thread failed: {}", e);
        }
    });

    let cue_player = CuePlayer::new(ToneSpec::from_config(&config.trial), channels.cue_channel_capacity);

    let pipeline_channels = PipelineChannels {
        commands: command_receiver,
        events: event_sender,
        samples: sample_sender,
        cues: cue_player.sender(),
    };
    let pipeline_config = config.clone();
    let pipeline_shutdown = Arc::clone(&shutdown_signal);
    let pipeline_handle = thread::spawn(move || {
        // 连接失败已经通知界面，这里不再处理
        let _ = start_pipeline(pipeline_config, pipeline_channels, pipeline_shutdown);
    });

    let window = &config.window;
    let options = eframe::NativeOptions {
        vsync: window.vsync,
        hardware_acceleration: if window.hardware_acceleration {
            eframe::HardwareAcceleration::Preferred
        } else {
            eframe::HardwareAcceleration::Off
        },
        renderer: eframe::Renderer::Glow,
        viewport: egui::ViewportBuilder::default()
            .with_title(window.title.clone())
            .with_inner_size([config.canvas.width as f32 + 16.0, config.canvas.height as f32 + PANEL_HEIGHT])
            .with_resizable(window.resizable),
        ..Default::default()
    };

    let title = window.title.clone();
    let app_config = config.clone();
    if let Err(e) = eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(TraceApp::new(event_receiver, command_sender, app_config)))),
    ) {
        error!("GUI failed: {}", e);
    }

    // GUI 关闭后通知各线程退出
    info!("GUI closed, signaling worker threads to shutdown");
    shutdown_signal.store(true, Ordering::Relaxed);

    // 采集线程最多阻塞一个读取超时
    if pipeline_handle.join().is_err() {
        warn!("Pipeline thread panicked");
    }
    if writer_handle.join().is_err() {
        warn!("Log writer thread panicked");
    }
    drop(cue_player);

    info!("Application exited");
}
