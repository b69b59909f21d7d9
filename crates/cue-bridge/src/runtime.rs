//! Process-level wiring: open the backend output, start the monitor, bind the
//! listeners and hand them to the engine.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use cue_player::{MonitorSink, Sleeper, ThreadSleeper};

use crate::backend::Backend;
use crate::config::{BackendConfig, ServeConfig};
use crate::engine::{Engine, SessionFactory};
use crate::monitor::{LogMonitor, TcpMonitor};
use crate::net::TcpSessionFactory;

/// How long a single frame write may wait for the line to drain.
const UART_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Open the output a backend writes to.
pub fn open_backend(config: &BackendConfig) -> Result<Backend> {
    match config {
        BackendConfig::Text => Ok(Backend::Text {
            console: Arc::new(Mutex::new(std::io::stdout())),
        }),
        BackendConfig::Uart { device, baud } => {
            let port = open_uart(device, *baud)?;
            tracing::info!(device = ?device, baud, "uart opened");
            Ok(Backend::Uart {
                port: Arc::new(Mutex::new(port)),
            })
        }
    }
}

/// Raw 8N1 line without flow control, so frame bytes reach the wire as-is.
fn open_uart(device: &Path, baud: u32) -> Result<Box<dyn serialport::SerialPort>> {
    let path = device.to_string_lossy();
    serialport::new(path.as_ref(), baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(UART_WRITE_TIMEOUT)
        .open()
        .with_context(|| format!("open uart device {device:?} at {baud} baud"))
}

/// Serve controller connections until the process is killed.
pub fn run_serve(config: ServeConfig, install_ctrlc: bool) -> Result<()> {
    if install_ctrlc {
        let _ = ctrlc::set_handler(|| {
            tracing::info!("interrupted; shutting down");
            std::process::exit(130);
        });
    }

    let backend = open_backend(&config.backend)?;
    let monitor: Arc<dyn MonitorSink> = match config.monitor {
        Some(monitor) => {
            tracing::info!(monitor = %monitor.addr, queue_depth = monitor.queue_depth, "monitor events enabled");
            Arc::new(TcpMonitor::spawn(monitor))
        }
        None => Arc::new(LogMonitor),
    };
    let sleeper: Arc<dyn Sleeper> = Arc::new(ThreadSleeper);

    let mut factories: Vec<Box<dyn SessionFactory>> = Vec::with_capacity(config.binds.len());
    for bind in &config.binds {
        let factory = TcpSessionFactory::bind(
            *bind,
            backend.clone(),
            monitor.clone(),
            sleeper.clone(),
            config.session.clone(),
        )
        .with_context(|| format!("bind {bind}"))?;
        factories.push(Box::new(factory));
    }

    let mut engine = Engine::new(factories, config.engine)?;
    engine.run()
}

/// Write the timeline `payload` would produce, one action per line.
pub fn inspect(backend: &BackendConfig, payload: &[u8], out: &mut impl Write) -> Result<()> {
    let backend = match backend {
        BackendConfig::Text => Backend::Text {
            console: Arc::new(Mutex::new(std::io::sink())),
        },
        BackendConfig::Uart { .. } => Backend::Uart {
            port: Arc::new(Mutex::new(std::io::sink())),
        },
    };
    let factory = backend.playback_factory(Arc::new(LogMonitor), Arc::new(ThreadSleeper));
    let playback = factory
        .create_playback(payload)
        .context("payload does not build a timeline")?;

    for (index, action) in playback.actions().iter().enumerate() {
        writeln!(out, "{index:>4}  {action:?}")?;
    }
    writeln!(out, "{} actions", playback.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn inspect_lists_the_layout() {
        let mut out = Vec::new();
        inspect(&BackendConfig::Text, b"1000:hello&0:world", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "   0  action@0\n   1  delay@0(1000ms)\n   2  action@1000\n3 actions\n"
        );
    }

    #[test]
    fn inspect_rejects_malformed_payloads() {
        let mut out = Vec::new();
        let uart = BackendConfig::Uart {
            device: PathBuf::from("/dev/null"),
            baud: 115_200,
        };
        assert!(inspect(&uart, b"A#B", &mut out).is_err());
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn uart_frames_reach_the_line_unaltered() {
        use serialport::{SerialPort, TTYPort};
        use std::io::{ErrorKind, Read};
        use std::time::Instant;

        let (mut line, slave) = TTYPort::pair().unwrap();
        let device = PathBuf::from(slave.name().unwrap());
        drop(slave);

        let backend = open_backend(&BackendConfig::Uart {
            device,
            baud: 115_200,
        })
        .unwrap();
        let factory = backend.playback_factory(Arc::new(LogMonitor), Arc::new(ThreadSleeper));
        let mut playback = factory.create_playback(b"0.AB#0.C\nD").unwrap();
        while playback.execute_action().is_ok() {}

        // no CR inserted before either newline
        let expected = b"AB\nC\nD\n";
        let mut received = Vec::new();
        let mut buf = [0u8; 64];
        let deadline = Instant::now() + Duration::from_secs(5);
        while received.len() < expected.len() && Instant::now() < deadline {
            match line.read(&mut buf) {
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
                Err(e) => panic!("line read failed: {e}"),
            }
        }
        assert_eq!(received, expected.to_vec());
    }

    #[test]
    fn missing_uart_device_is_reported() {
        let err = open_backend(&BackendConfig::Uart {
            device: PathBuf::from("/nonexistent/cue-bridge-tty"),
            baud: 115_200,
        })
        .err()
        .unwrap();
        assert!(format!("{err:#}").contains("open uart device"));
    }
}
