//! Scripted transports
//!
//! Each connection replays a fixed list of read steps. Every read hands out
//! at most one step, so a `BufReader` never buffers past the line it is
//! working on and `delivered` shows exactly how far the client has read.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mpdwire::config::{Config, Endpoint};
use mpdwire::network::{Connector, Transport};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Fail(io::ErrorKind),
}

/// What one connection will say
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
    fail_writes: bool,
}

impl Script {
    /// A connection that greets with protocol 0.23.5
    pub fn hello() -> Self {
        Script::default().line("OK MPD 0.23.5")
    }

    pub fn line(mut self, line: &str) -> Self {
        self.steps.push(Step::Data(format!("{}\n", line).into_bytes()));
        self
    }

    /// One step per line of `text`
    pub fn lines(mut self, text: &str) -> Self {
        for line in text.lines() {
            self = self.line(line);
        }
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.steps.push(Step::Data(bytes.to_vec()));
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.steps.push(Step::Fail(kind));
        self
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

/// Shared view of everything the scripted connections saw
#[derive(Clone, Default)]
pub struct Probe {
    pub connects: Arc<AtomicUsize>,
    pub delivered: Arc<AtomicUsize>,
    pub written: Arc<Mutex<Vec<u8>>>,
}

impl Probe {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written.lock()).into_owned()
    }
}

pub struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    probe: Probe,
}

impl ScriptedConnector {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> (Self, Probe) {
        let probe = Probe::default();
        let connector = Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            probe: probe.clone(),
        };
        (connector, probe)
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, _endpoint: &Endpoint, _config: &Config) -> io::Result<Box<dyn Transport>> {
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "no more scripts"))?;
        Ok(Box::new(ScriptedStream {
            steps: script.steps.into_iter().collect(),
            pending: VecDeque::new(),
            fail_writes: script.fail_writes,
            probe: self.probe.clone(),
        }))
    }
}

struct ScriptedStream {
    steps: VecDeque<Step>,
    pending: VecDeque<u8>,
    fail_writes: bool,
    probe: Probe,
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.steps.pop_front() {
                None => return Ok(0),
                Some(Step::Fail(kind)) => return Err(io::Error::new(kind, "scripted failure")),
                Some(Step::Data(data)) => self.pending.extend(data),
            }
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        self.probe.delivered.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure"));
        }
        self.probe.written.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
