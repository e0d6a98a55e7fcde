//! Aural warning session
//!
//! Plays the ladder clip for the current danger level in a loop until the
//! danger drops below every threshold. The session worker owns the audio
//! backend; the signal callback only leaves commands in the mailbox.
//!
//! Behaviour of the worker:
//!
//! - the mixer volume is set only when it differs from the last one set
//! - a play request for the clip already playing changes nothing else
//! - a finished clip is started again, so a warning repeats until stopped
//!
//! Audio decoding and the sound device are left to external programs
//! through [`AudioOutput`]; [`CommandOutput`] drives `aplay`/`amixer` style
//! tools.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::AlarmConfig;
use crate::error::ActuatorResult;
use crate::ladder::AlarmLadder;
use crate::mailbox::{Mailbox, Received};
use crate::{ActuatorStats, DangerSink};

/// How often the worker checks whether the clip finished
pub const REPLAY_POLL: Duration = Duration::from_millis(100);

/// Audio backend
pub trait AudioOutput: Send {
    /// Set the mixer volume in percent
    fn set_volume(&mut self, volume: u8) -> ActuatorResult<()>;

    /// Start playing a clip once
    fn start(&mut self, path: &Path) -> ActuatorResult<()>;

    /// Whether the last started clip is still playing
    fn is_playing(&mut self) -> bool;

    /// Stop playback; no-op when idle
    fn stop(&mut self) -> ActuatorResult<()>;
}

/// Backend driving an external player and mixer
#[derive(Debug)]
pub struct CommandOutput {
    player: String,
    mixer: String,
    device: Option<String>,
    control: String,
    child: Option<Child>,
}

impl CommandOutput {
    /// Backend with the default mixer control and playback device
    pub fn new(player: impl Into<String>, mixer: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            mixer: mixer.into(),
            device: None,
            control: "Master,0".to_string(),
            child: None,
        }
    }

    /// Backend from the alarm configuration
    pub fn from_config(config: &AlarmConfig) -> Self {
        let mut output = Self::new(&config.player_command, &config.mixer_command);
        if let Some((control, id)) = &config.amixer {
            output = output.with_control(control, *id);
        }
        if let Some((device, index)) = &config.aplayer {
            output = output.with_device(device, *index);
        }
        output
    }

    /// Mixer control `name,id`
    pub fn with_control(mut self, control: &str, id: u32) -> Self {
        self.control = format!("{},{}", control, id);
        self
    }

    /// Playback device `name:index`
    pub fn with_device(mut self, device: &str, index: u32) -> Self {
        self.device = Some(format!("{}:{}", device, index));
        self
    }

    /// Arguments for the mixer program
    pub fn mixer_args(&self, volume: u8) -> Vec<String> {
        vec![
            "-q".to_string(),
            "sset".to_string(),
            self.control.clone(),
            format!("{}%", volume),
        ]
    }

    /// Arguments for the player program
    pub fn player_args(&self, path: &Path) -> Vec<String> {
        let mut args = vec!["-q".to_string()];
        if let Some(device) = &self.device {
            args.push("-D".to_string());
            args.push(device.clone());
        }
        args.push(path.display().to_string());
        args
    }
}

impl AudioOutput for CommandOutput {
    fn set_volume(&mut self, volume: u8) -> ActuatorResult<()> {
        let status = Command::new(&self.mixer)
            .args(self.mixer_args(volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()?;
        if !status.success() {
            log::warn!("{} exited with {}", self.mixer, status);
        }
        Ok(())
    }

    fn start(&mut self, path: &Path) -> ActuatorResult<()> {
        self.stop()?;
        let child = Command::new(&self.player)
            .args(self.player_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()?;
        self.child = Some(child);
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_))) | None => false,
            Some(Err(e)) => {
                log::warn!("Could not poll {}: {}", self.player, e);
                false
            }
        }
    }

    fn stop(&mut self) -> ActuatorResult<()> {
        if let Some(mut child) = self.child.take() {
            // Already exited is fine
            let _ = child.kill();
            child.wait()?;
        }
        Ok(())
    }
}

impl Drop for CommandOutput {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Could not stop {}: {}", self.player, e);
        }
    }
}

/// Aural session command
#[derive(Debug, Clone, PartialEq)]
pub enum AuralCommand {
    /// Play a clip in a loop at a volume
    Play {
        /// Clip
        path: PathBuf,
        /// Volume in percent
        volume: u8,
    },
    /// Silence
    Stop,
    /// Silence and end the session
    Quit,
}

/// Looping aural warnings driven by the danger level
pub struct AuralSession {
    ladder: AlarmLadder,
    mailbox: Arc<Mailbox<AuralCommand>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<Mutex<ActuatorStats>>,
}

impl std::fmt::Debug for AuralSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuralSession")
            .field("rungs", &self.ladder.len())
            .field("closed", &self.mailbox.is_closed())
            .finish()
    }
}

impl AuralSession {
    /// Start a session on a backend
    pub fn new<O>(ladder: AlarmLadder, output: O) -> ActuatorResult<Self>
    where
        O: AudioOutput + 'static,
    {
        let mailbox = Arc::new(Mailbox::new());
        let stats = Arc::new(Mutex::new(ActuatorStats::default()));

        let worker = {
            let mailbox = Arc::clone(&mailbox);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name("aural-warnings".into())
                .spawn(move || Worker::new(output, &stats).run(&mailbox))?
        };

        Ok(Self {
            ladder,
            mailbox,
            worker: Mutex::new(Some(worker)),
            stats,
        })
    }

    /// Session using the configured player and mixer programs
    pub fn from_config(config: &AlarmConfig) -> ActuatorResult<Self> {
        Self::new(config.ladder(), CommandOutput::from_config(config))
    }

    /// Ladder in use
    pub fn ladder(&self) -> &AlarmLadder {
        &self.ladder
    }

    /// Play the clip for a danger level, or stop below every threshold
    pub fn set_danger(&self, danger_level: f64) -> ActuatorResult<()> {
        let command = match self.ladder.select(danger_level) {
            Some(entry) => AuralCommand::Play {
                path: entry.path.clone(),
                volume: entry.volume,
            },
            None => AuralCommand::Stop,
        };
        self.mailbox.post(command)
    }

    /// Silence the current warning
    pub fn stop(&self) -> ActuatorResult<()> {
        self.mailbox.post(AuralCommand::Stop)
    }

    /// Silence and join the worker
    pub fn quit(&self) {
        if self.mailbox.close_with(AuralCommand::Quit).is_err() {
            return;
        }
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("Aural warning worker panicked");
            }
        }
    }

    /// Session counters
    pub fn stats(&self) -> ActuatorStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DangerSink for AuralSession {
    fn name(&self) -> &'static str {
        "aural warnings"
    }

    fn on_danger(&self, danger_level: f64) -> ActuatorResult<()> {
        self.set_danger(danger_level)
    }

    fn quit(&self) {
        AuralSession::quit(self);
    }

    fn stats(&self) -> ActuatorStats {
        AuralSession::stats(self)
    }
}

impl Drop for AuralSession {
    fn drop(&mut self) {
        self.quit();
    }
}

struct Worker<'a, O> {
    output: O,
    stats: &'a Mutex<ActuatorStats>,
    playing: Option<PathBuf>,
    volume: Option<u8>,
}

impl<'a, O: AudioOutput> Worker<'a, O> {
    fn new(output: O, stats: &'a Mutex<ActuatorStats>) -> Self {
        Self {
            output,
            stats,
            playing: None,
            volume: None,
        }
    }

    fn record(&self, what: &str, result: ActuatorResult<()>) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(()) => stats.commands_applied += 1,
            Err(e) => {
                log::warn!("Aural warning {} failed: {}", what, e);
                stats.record_failure(e.to_string());
            }
        }
    }

    fn run(mut self, mailbox: &Mailbox<AuralCommand>) {
        loop {
            match mailbox.recv_timeout(REPLAY_POLL) {
                Received::Message(AuralCommand::Play { path, volume }) => self.play(path, volume),
                Received::Message(AuralCommand::Stop) => self.stop(),
                Received::Message(AuralCommand::Quit) | Received::Closed => {
                    self.stop();
                    break;
                }
                Received::Timeout => self.replay(),
            }
        }
        log::debug!("Aural warning session ended");
    }

    fn play(&mut self, path: PathBuf, volume: u8) {
        if self.volume != Some(volume) {
            let result = self.output.set_volume(volume);
            if result.is_ok() {
                self.volume = Some(volume);
            }
            self.record("volume", result);
        }
        if self.playing.as_ref() == Some(&path) {
            return;
        }
        let result = self.output.start(&path);
        let started = result.is_ok();
        self.record("playback", result);
        if started {
            self.playing = Some(path);
        }
    }

    fn stop(&mut self) {
        if self.playing.take().is_some() {
            let result = self.output.stop();
            self.record("stop", result);
        }
    }

    fn replay(&mut self) {
        let Some(path) = self.playing.clone() else {
            return;
        };
        if !self.output.is_playing() {
            let result = self.output.start(&path);
            if result.is_err() {
                self.playing = None;
            }
            self.record("replay", result);
        }
    }
}
