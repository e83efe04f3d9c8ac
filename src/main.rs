//! Netkey - relays a serial CW key line over UDP with a local sidetone.
//!
//! Startup order: sidetone first (waveforms, device, render thread),
//! then the serial line, then the socket, then the control loop on the
//! main thread until Ctrl+C or a fatal error.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use netkey::audio::sink::CpalSink;
use netkey::audio::waveform::{tone_in_range, WaveformSet};
use netkey::key::line::{SerialLine, DEFAULT_LINE_PATH};
use netkey::net::socket::{UdpLink, KEYER_PORT};
use netkey::{ControlLoop, KeyState, ToneEngine, DEFAULT_TONE_HZ, SAMPLE_RATE};

/// Remote peer used when `-a` is not given.
const DEFAULT_REMOTE: &str = "rob.synchro.net";

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {program} -p <serial port> -a <remote address> -b <local bind address> -t <tone frequency>"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p PORT   Serial device carrying the key on DSR (default: {DEFAULT_LINE_PATH})");
    eprintln!("  -a ADDR   Remote peer address (default: {DEFAULT_REMOTE})");
    eprintln!("  -b ADDR   Local address to bind (default: all interfaces)");
    eprintln!("  -t FREQ   Sidetone frequency in Hz (default: {DEFAULT_TONE_HZ})");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("netkey=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("netkey");

    let mut remote = DEFAULT_REMOTE.to_string();
    let mut local: Option<String> = None;
    let mut line_path = DEFAULT_LINE_PATH.to_string();
    let mut tone_hz = DEFAULT_TONE_HZ;

    let mut i = 1;
    while i < args.len() {
        if i + 1 >= args.len() {
            print_usage(program);
            return Ok(());
        }
        match args[i].as_str() {
            "-a" => remote = args[i + 1].clone(),
            "-b" => local = Some(args[i + 1].clone()),
            "-p" => line_path = args[i + 1].clone(),
            "-t" => match args[i + 1].parse::<u32>() {
                Ok(freq) => tone_hz = freq,
                Err(_) => {
                    print_usage(program);
                    return Ok(());
                }
            },
            _ => {
                print_usage(program);
                return Ok(());
            }
        }
        i += 2;
    }

    if !tone_in_range(tone_hz, SAMPLE_RATE) {
        warn!("invalid tone ({tone_hz} Hz), using {DEFAULT_TONE_HZ} Hz");
        tone_hz = DEFAULT_TONE_HZ;
    }

    info!("netkey v{}", netkey::VERSION);

    // Sidetone: precomputed waveforms, device, dedicated render thread.
    let key = Arc::new(KeyState::new());
    let waveforms = WaveformSet::new(tone_hz, SAMPLE_RATE);
    info!(
        "sidetone {tone_hz} Hz requested, rendering {:.1} Hz",
        waveforms.rendered_hz()
    );
    let (sink, writer) = CpalSink::open(SAMPLE_RATE)?;
    ToneEngine::new(waveforms, Arc::clone(&key)).spawn(writer)?;

    // Key line and network.
    let line = SerialLine::open(&line_path)?;
    let socket = UdpLink::open(local.as_deref(), &remote)?;
    info!(
        "relaying {line_path} to {remote}:{KEYER_PORT}{}",
        local
            .as_deref()
            .map(|l| format!(" (bound to {l})"))
            .unwrap_or_default()
    );

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;

    let mut control = ControlLoop::new(line, socket, key)?;
    control.run(&running)?;

    info!("stopped");
    drop(sink);
    Ok(())
}
