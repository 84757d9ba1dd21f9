//! Speech engine backed by the `espeak-ng` command line synthesizer.
//!
//! Each utterance runs on its own worker thread: espeak renders WAV to
//! stdout, rodio decodes and plays it, and the worker reports progress back
//! over the engine event channel tagged with the utterance id.

use crate::cancellation::UtteranceControl;
use anyhow::{Context, Result};
use read_aloud_core::engine::{EngineEventSender, UtteranceRequest};
use read_aloud_core::{EngineEvent, SpeechEngine, UtteranceErrorKind, UtteranceEvent, UtteranceId, Voice};
use rodio::{Decoder, OutputStream, Sink};
use std::io::{Cursor, ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const ESPEAK_PROGRAM: &str = "espeak-ng";
const ESPEAK_BASE_WPM: f32 = 175.0;
const ESPEAK_MIN_WPM: f32 = 80.0;
const ESPEAK_MAX_WPM: f32 = 450.0;
const ESPEAK_BASE_PITCH: f32 = 50.0;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct ActiveUtterance {
    id: UtteranceId,
    control: UtteranceControl,
    worker: JoinHandle<()>,
}

pub struct EspeakEngine {
    program: String,
    events: EngineEventSender,
    current: Option<ActiveUtterance>,
}

impl EspeakEngine {
    pub fn new(events: EngineEventSender) -> Self {
        Self {
            program: ESPEAK_PROGRAM.to_string(),
            events,
            current: None,
        }
    }
}

impl SpeechEngine for EspeakEngine {
    fn is_available(&self) -> bool {
        match Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(err) => {
                warn!(program = %self.program, "Speech synthesizer not runnable: {err}");
                false
            }
        }
    }

    fn speak(&mut self, request: UtteranceRequest) -> Result<(), UtteranceErrorKind> {
        if request.text.trim().is_empty() {
            return Err(UtteranceErrorKind::InvalidArgument);
        }
        if let Some(stale) = self.current.take() {
            stale.control.cancel();
        }

        let id = request.id;
        let control = UtteranceControl::new();
        let worker_control = control.clone();
        let events = self.events.clone();
        let program = self.program.clone();
        let worker = thread::Builder::new()
            .name(format!("utterance-{}", id.0))
            .spawn(move || run_utterance(&program, request, &worker_control, &events))
            .map_err(|err| {
                warn!("Failed to spawn utterance worker: {err}");
                UtteranceErrorKind::AudioBusy
            })?;

        self.current = Some(ActiveUtterance {
            id,
            control,
            worker,
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(active) = self.current.take() {
            debug!(utterance = %active.id, "Cancelling utterance");
            active.control.cancel();
        }
    }

    fn pause(&mut self) {
        if let Some(active) = &self.current {
            active.control.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(active) = &self.current {
            active.control.resume();
        }
    }

    fn is_speaking(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|active| !active.worker.is_finished())
    }

    fn list_voices(&self) -> Vec<Voice> {
        match Command::new(&self.program).arg("--voices").output() {
            Ok(output) if output.status.success() => {
                parse_voice_list(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(status = %output.status, "Listing voices failed");
                Vec::new()
            }
            Err(err) => {
                warn!("Listing voices failed: {err}");
                Vec::new()
            }
        }
    }
}

fn run_utterance(
    program: &str,
    request: UtteranceRequest,
    control: &UtteranceControl,
    events: &EngineEventSender,
) {
    let id = request.id;
    let send = |event: UtteranceEvent| {
        let _ = events.send(EngineEvent::Utterance { id, event });
    };

    let wav = match synthesize(program, &request) {
        Ok(wav) => wav,
        Err(kind) => {
            send(UtteranceEvent::Failed(kind));
            return;
        }
    };
    if control.check_cancelled("synthesis").is_err() {
        send(UtteranceEvent::Failed(UtteranceErrorKind::Canceled));
        return;
    }

    if let Err(err) = play_wav(wav, &request, control, &send) {
        warn!(utterance = %id, "Playback failed: {err:?}");
        send(UtteranceEvent::Failed(UtteranceErrorKind::AudioHardware));
    }
}

fn play_wav(
    wav: Vec<u8>,
    request: &UtteranceRequest,
    control: &UtteranceControl,
    send: &dyn Fn(UtteranceEvent),
) -> Result<()> {
    let (_stream, handle) = OutputStream::try_default().context("Opening audio output")?;
    let sink = Sink::try_new(&handle).context("Creating sink")?;
    let source = Decoder::new(Cursor::new(wav)).context("Decoding synthesized audio")?;
    sink.set_volume(request.volume);
    sink.append(source);
    sink.play();
    send(UtteranceEvent::Started);
    debug!(utterance = %request.id, index = request.index, "Utterance playing");

    loop {
        if control.is_cancelled() {
            sink.stop();
            send(UtteranceEvent::Failed(UtteranceErrorKind::Canceled));
            return Ok(());
        }
        if control.is_paused() != sink.is_paused() {
            if control.is_paused() {
                sink.pause();
            } else {
                sink.play();
            }
        }
        if sink.empty() {
            send(UtteranceEvent::Finished);
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn synthesize(program: &str, request: &UtteranceRequest) -> Result<Vec<u8>, UtteranceErrorKind> {
    let args = espeak_args(request);
    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            warn!(program, "Failed to start synthesizer: {err}");
            if err.kind() == ErrorKind::NotFound {
                UtteranceErrorKind::SynthesisUnavailable
            } else {
                UtteranceErrorKind::SynthesisFailed
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(request.text.as_bytes()) {
            warn!("Failed to send text to synthesizer: {err}");
            return Err(UtteranceErrorKind::SynthesisFailed);
        }
    }

    let output = child.wait_with_output().map_err(|err| {
        warn!("Synthesizer did not finish: {err}");
        UtteranceErrorKind::SynthesisFailed
    })?;
    if !output.status.success() || output.stdout.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(status = %output.status, stderr = %stderr.trim(), "Synthesizer failed");
        if request.voice_id.is_some() && stderr.contains("voice") {
            return Err(UtteranceErrorKind::VoiceUnavailable);
        }
        return Err(UtteranceErrorKind::SynthesisFailed);
    }
    Ok(output.stdout)
}

fn espeak_args(request: &UtteranceRequest) -> Vec<String> {
    let wpm = (ESPEAK_BASE_WPM * request.rate).clamp(ESPEAK_MIN_WPM, ESPEAK_MAX_WPM);
    let pitch = (ESPEAK_BASE_PITCH * request.pitch).clamp(0.0, 99.0);
    let mut args = vec![
        "--stdout".to_string(),
        "--stdin".to_string(),
        "-s".to_string(),
        format!("{}", wpm.round() as u32),
        "-p".to_string(),
        format!("{}", pitch.round() as u32),
    ];
    if let Some(voice) = &request.voice_id {
        args.push("-v".to_string());
        args.push(voice.clone());
    }
    args
}

/// Parse `espeak-ng --voices` output:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
fn parse_voice_list(raw: &str) -> Vec<Voice> {
    raw.lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(Voice {
                id: language.to_string(),
                name: name.replace('_', " "),
                locale: language.to_string(),
            })
        })
        .collect()
}
