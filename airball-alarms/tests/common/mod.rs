//! Shared test doubles for the alarm sessions

#![allow(dead_code)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use airball_alarms::{ActuatorError, ActuatorResult, AlarmEntry, AlarmLadder, AudioOutput};

/// What the fake audio backend was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Volume(u8),
    Start(PathBuf),
    Stop,
}

/// Audio backend that records calls
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    pub events: Arc<Mutex<Vec<AudioEvent>>>,
    /// Set to make the current clip report itself finished
    pub finished: Arc<AtomicBool>,
    /// Number of upcoming volume changes that fail
    pub failing_volume: Arc<AtomicUsize>,
}

impl RecordingOutput {
    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn starts_of(&self, path: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == AudioEvent::Start(PathBuf::from(path)))
            .count()
    }
}

impl AudioOutput for RecordingOutput {
    fn set_volume(&mut self, volume: u8) -> ActuatorResult<()> {
        if take_one(&self.failing_volume) {
            return Err(ActuatorError::Io(io::Error::new(io::ErrorKind::Other, "mixer busy")));
        }
        self.events.lock().unwrap().push(AudioEvent::Volume(volume));
        Ok(())
    }

    fn start(&mut self, path: &Path) -> ActuatorResult<()> {
        self.finished.store(false, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(AudioEvent::Start(path.to_path_buf()));
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        !self.finished.load(Ordering::SeqCst)
    }

    fn stop(&mut self) -> ActuatorResult<()> {
        self.events.lock().unwrap().push(AudioEvent::Stop);
        Ok(())
    }
}

/// In-memory serial line
#[derive(Debug, Clone, Default)]
pub struct SharedLink {
    pub bytes: Arc<Mutex<Vec<u8>>>,
    /// Number of upcoming writes that fail
    pub failing_writes: Arc<AtomicUsize>,
}

impl SharedLink {
    pub fn text(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if take_one(&self.failing_writes) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "line busy"));
        }
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Three-rung ladder used throughout
pub fn ladder() -> AlarmLadder {
    AlarmLadder::new(vec![
        AlarmEntry::new(3.0, 60, "caution.wav"),
        AlarmEntry::new(5.0, 80, "warning.wav"),
        AlarmEntry::new(8.0, 100, "stall.wav"),
    ])
}

/// Poll until `cond` holds; false after two seconds
pub fn wait_until<F: FnMut() -> bool>(mut cond: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
