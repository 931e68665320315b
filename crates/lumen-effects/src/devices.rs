//! Pixel devices implementing [`PixelSink`].
//!
//! - [`NullDevice`] discards frames
//! - [`TerminalDevice`] draws a 24-bit color bar on stderr
//! - [`OpcDevice`] streams Open Pixel Control frames over TCP
//! - [`MemoryDevice`] keeps every frame in a shared buffer

use std::fmt;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::{ParamError, PixelSink, Rgb};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// OPC command byte for "set pixel colors".
const OPC_SET_PIXELS: u8 = 0;
/// Widest bar the terminal device draws.
const TERMINAL_COLUMNS: usize = 120;
/// Upper bound on one OPC connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(100);
/// Upper bound on writing one OPC frame.
const WRITE_TIMEOUT: Duration = Duration::from_millis(100);
/// Minimum spacing between OPC connection attempts after a failure.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Built-in device selection for `devices.LEDOutput`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// [`NullDevice`].
    #[default]
    Null,
    /// [`TerminalDevice`].
    Terminal,
    /// [`OpcDevice`].
    Opc,
}

impl DeviceKind {
    /// Parameter spellings, in declaration order.
    pub const NAMES: &'static [&'static str] = &["null", "terminal", "opc"];

    /// Parameter spelling.
    pub fn name(self) -> &'static str {
        match self {
            DeviceKind::Null => "null",
            DeviceKind::Terminal => "terminal",
            DeviceKind::Opc => "opc",
        }
    }

    /// Opens the device. `server` and `channel` are only used by OPC.
    pub fn open(self, server: &str, channel: u8) -> Box<dyn PixelSink> {
        match self {
            DeviceKind::Null => Box::new(NullDevice),
            DeviceKind::Terminal => Box::new(TerminalDevice::default()),
            DeviceKind::Opc => Box::new(OpcDevice::new(server, channel)),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceKind {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(DeviceKind::Null),
            "terminal" => Ok(DeviceKind::Terminal),
            "opc" => Ok(DeviceKind::Opc),
            other => Err(ParamError::InvalidChoice {
                name: "device".into(),
                value: other.into(),
                options: Self::NAMES.join(", "),
            }),
        }
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDevice;

impl PixelSink for NullDevice {
    fn name(&self) -> &str {
        "null"
    }

    fn write(&mut self, _pixels: &[Rgb]) -> io::Result<()> {
        Ok(())
    }
}

/// Draws each frame as one line of colored blocks on stderr, redrawn in place.
///
/// Strips wider than the terminal are downsampled by nearest pixel.
#[derive(Debug, Clone)]
pub struct TerminalDevice {
    columns: usize,
}

impl Default for TerminalDevice {
    fn default() -> Self {
        Self {
            columns: TERMINAL_COLUMNS,
        }
    }
}

impl TerminalDevice {
    /// Renders one frame as an ANSI line, without writing it.
    pub fn render(&self, pixels: &[Rgb]) -> String {
        let width = pixels.len().min(self.columns);
        let mut line = String::from("\r");
        for col in 0..width {
            let p = pixels[col * pixels.len() / width].clamped();
            line.push_str(&format!("\x1b[38;2;{};{};{}m\u{2588}", p.r as u8, p.g as u8, p.b as u8));
        }
        line.push_str("\x1b[0m");
        line
    }
}

impl PixelSink for TerminalDevice {
    fn name(&self) -> &str {
        "terminal"
    }

    fn write(&mut self, pixels: &[Rgb]) -> io::Result<()> {
        let mut err = io::stderr().lock();
        err.write_all(self.render(pixels).as_bytes())?;
        err.flush()
    }
}

/// Encodes one OPC "set pixel colors" message.
pub fn opc_frame(channel: u8, pixels: &[Rgb]) -> io::Result<Vec<u8>> {
    let len = u16::try_from(pixels.len() * 3)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large for OPC"))?;
    let mut frame = Vec::with_capacity(4 + usize::from(len));
    frame.push(channel);
    frame.push(OPC_SET_PIXELS);
    frame.extend_from_slice(&len.to_be_bytes());
    for p in pixels {
        let p = p.clamped();
        frame.extend_from_slice(&[p.r as u8, p.g as u8, p.b as u8]);
    }
    Ok(frame)
}

/// Open Pixel Control client.
///
/// Connects on the first write. A failed write drops the connection so a
/// later frame reconnects. Connecting and writing each time out after
/// 100 ms. After a failed connect no new attempt is made for one second;
/// frames written in that window fail immediately with
/// [`io::ErrorKind::NotConnected`].
#[derive(Debug)]
pub struct OpcDevice {
    server: String,
    channel: u8,
    stream: Option<TcpStream>,
    retry_at: Option<Instant>,
    connect_attempts: u64,
}

impl OpcDevice {
    /// Creates a client for `server` (`host:port`).
    pub fn new(server: impl Into<String>, channel: u8) -> Self {
        Self {
            server: server.into(),
            channel,
            stream: None,
            retry_at: None,
            connect_attempts: 0,
        }
    }

    /// True while a connection is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self) -> io::Result<TcpStream> {
        let now = Instant::now();
        if self.retry_at.is_some_and(|at| now < at) {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("OPC server {} unreachable, waiting to reconnect", self.server),
            ));
        }

        self.connect_attempts += 1;
        match open_stream(&self.server) {
            Ok(stream) => {
                self.retry_at = None;
                tracing::info!(server = %self.server, channel = self.channel, "connected to OPC server");
                Ok(stream)
            }
            Err(e) => {
                self.retry_at = Some(now + RECONNECT_BACKOFF);
                tracing::warn!(server = %self.server, error = %e, "OPC connect failed");
                Err(e)
            }
        }
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect()?,
        };
        self.stream.insert(stream).write_all(frame)
    }
}

/// Tries each resolved address of `server` with a bounded connect.
fn open_stream(server: &str) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in server.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("no address for OPC server {server}"))
    }))
}

impl PixelSink for OpcDevice {
    fn name(&self) -> &str {
        "opc"
    }

    fn write(&mut self, pixels: &[Rgb]) -> io::Result<()> {
        let frame = opc_frame(self.channel, pixels)?;
        let result = self.send(&frame);
        if result.is_err() {
            self.stream = None;
        }
        result
    }
}

/// Records every frame; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryDevice {
    frames: Arc<Mutex<Vec<Vec<Rgb>>>>,
}

impl MemoryDevice {
    /// Creates an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every frame written so far.
    pub fn frames(&self) -> Vec<Vec<Rgb>> {
        self.frames.lock().clone()
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<Vec<Rgb>> {
        self.frames.lock().last().cloned()
    }

    /// Number of frames written.
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PixelSink for MemoryDevice {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&mut self, pixels: &[Rgb]) -> io::Result<()> {
        self.frames.lock().push(pixels.to_vec());
        Ok(())
    }
}
