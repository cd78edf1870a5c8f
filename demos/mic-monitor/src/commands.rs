use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use mic_stream_core::{
    CaptureController, HostMessage, HostParams, HostSink, RecorderPlugin, PERMISSION_RECHECK_DELAY,
};
use mic_stream_cpal::{list_input_devices, CpalMicDevice, CpalPermissions};

use crate::Args;

/// How long to wait for the final `stop` message after stopping.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

pub fn list_devices() -> Result<()> {
    let devices = list_input_devices().context("listing input devices")?;
    if devices.is_empty() {
        eprintln!("No input devices found");
    }
    let mut out = io::stdout().lock();
    for device in devices {
        serde_json::to_writer(&mut out, &device)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn record(args: &Args) -> Result<()> {
    let (device, permissions) = match &args.device {
        Some(name) => (CpalMicDevice::with_name(name), CpalPermissions::for_device(name)),
        None => (CpalMicDevice::default_device(), CpalPermissions::new()),
    };

    let controller = CaptureController::with_dispatch_thread(device, permissions);
    log::info!("Using input device '{}'", controller.device_info().name);
    let mut plugin = RecorderPlugin::new(controller);

    let status = plugin.request_permission(PERMISSION_RECHECK_DELAY);
    print_json(&status)?;
    if !status.granted {
        bail!("{}", status.message);
    }

    let params = HostParams {
        label: Some(args.label.clone()),
        sample_rate: Some(args.sample_rate),
    };
    let sink: Arc<dyn HostSink> = Arc::new(|message: &HostMessage| match message.to_json() {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("Failed to serialize message: {}", e),
    });
    plugin.start_record(params, sink);

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline {
        if plugin.state().is_idle() {
            log::warn!("Capture ended before the requested duration");
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    let ack = plugin.stop_record();
    print_json(&ack)?;

    let stop_deadline = Instant::now() + STOP_TIMEOUT;
    while !plugin.state().is_idle() && Instant::now() < stop_deadline {
        thread::sleep(Duration::from_millis(10));
    }

    let diagnostics = plugin.controller().diagnostics();
    log::info!(
        "{} blocks read, {} frames sent, {} empty reads, {} samples dropped",
        diagnostics.blocks_read,
        diagnostics.frames_dispatched,
        diagnostics.empty_reads,
        diagnostics.dropped_samples
    );
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
