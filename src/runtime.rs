//! Terminal event loop: stdin commands, engine callbacks and the keep-alive
//! timer all funnel into the one thread that owns the controller.

use anyhow::{Context, Result};
use read_aloud_core::config::AppConfig;
use read_aloud_core::controller::ACTION_VOICES_CHANGED;
use read_aloud_core::engine::EngineEventReceiver;
use read_aloud_core::keepalive::KeepAlive;
use read_aloud_core::shortcuts::{KeyPress, command_for_key};
use read_aloud_core::{PlaybackCommand, PlaybackController, PlaybackEvent, PlaybackStatus, SpeechEngine};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_millis(50);

pub const HELP: &str = "\
commands:
  space | escape | left | right | shift+left | shift+right
  play | pause | stop | toggle
  seek N        jump to sentence N (1-based)
  seek N%       jump to N percent of the article
  rate X | pitch X | volume X | voice ID
  voices | status | snapshot | hide | show | help | quit";

#[derive(Debug)]
enum RuntimeInput {
    Line(String),
    Interrupt,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCommand {
    Key(KeyPress),
    Playback(PlaybackCommand),
    Voices,
    Status,
    Snapshot,
    Hidden(bool),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<TerminalCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let word = word.to_ascii_lowercase();

    let command = match word.as_str() {
        "" => return None,
        "play" => TerminalCommand::Playback(PlaybackCommand::Play),
        "pause" => TerminalCommand::Playback(PlaybackCommand::Pause),
        "stop" => TerminalCommand::Playback(PlaybackCommand::Stop),
        "toggle" => TerminalCommand::Playback(PlaybackCommand::TogglePlayPause),
        "seek" => parse_seek(rest)?,
        "rate" => TerminalCommand::Playback(PlaybackCommand::SetRate {
            rate: rest.parse().ok()?,
        }),
        "pitch" => TerminalCommand::Playback(PlaybackCommand::SetPitch {
            pitch: rest.parse().ok()?,
        }),
        "volume" => TerminalCommand::Playback(PlaybackCommand::SetVolume {
            volume: rest.parse().ok()?,
        }),
        "voice" => TerminalCommand::Playback(PlaybackCommand::SetVoice {
            voice_id: rest.to_string(),
        }),
        "voices" => TerminalCommand::Voices,
        "status" => TerminalCommand::Status,
        "snapshot" => TerminalCommand::Snapshot,
        "hide" => TerminalCommand::Hidden(true),
        "show" => TerminalCommand::Hidden(false),
        "help" | "?" => TerminalCommand::Help,
        "quit" | "exit" | "q" => TerminalCommand::Quit,
        _ if rest.is_empty() => TerminalCommand::Key(KeyPress::parse(&word)?),
        _ => return None,
    };
    Some(command)
}

fn parse_seek(arg: &str) -> Option<TerminalCommand> {
    let command = if let Some(percent) = arg.strip_suffix('%') {
        let percent: f64 = percent.trim().parse().ok()?;
        PlaybackCommand::SeekFraction {
            fraction: percent / 100.0,
        }
    } else {
        let position: usize = arg.parse().ok()?;
        PlaybackCommand::Seek {
            index: position.checked_sub(1)?,
        }
    };
    Some(TerminalCommand::Playback(command))
}

pub fn run<E: SpeechEngine>(
    controller: &mut PlaybackController<E>,
    engine_events: EngineEventReceiver,
    config: &AppConfig,
) -> Result<()> {
    let (input_tx, input_rx) = mpsc::channel();
    spawn_stdin_reader(input_tx.clone())?;
    let interrupt_tx = input_tx;
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(RuntimeInput::Interrupt);
    })
    .context("Installing Ctrl-C handler")?;

    let changes = controller.subscribe();
    let mut keep_alive = KeepAlive::from_secs(config.keep_alive_interval_secs);
    let mut stdin_open = true;
    let mut last_cursor = None;

    info!(
        keep_alive_secs = keep_alive.interval().as_secs(),
        "Read-aloud session running; type `help` for commands"
    );
    loop {
        let wait = keep_alive
            .time_until_due(Instant::now())
            .map_or(TICK, |due| due.min(TICK));
        match input_rx.recv_timeout(wait) {
            Ok(RuntimeInput::Line(line)) => {
                if !handle_line(controller, &mut keep_alive, config, &line) {
                    controller.stop();
                    break;
                }
            }
            Ok(RuntimeInput::Interrupt) => {
                info!("Interrupted; stopping playback");
                controller.stop();
                break;
            }
            Ok(RuntimeInput::Eof) => {
                debug!("stdin closed; exiting once playback ends");
                stdin_open = false;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => stdin_open = false,
        }

        while let Ok(event) = engine_events.try_recv() {
            if let Some(failure) = controller.handle_engine_event(event) {
                println!("{failure}");
            }
        }
        if keep_alive.poll(Instant::now()) {
            controller.keep_alive_nudge();
        }
        report_changes(&changes, &mut last_cursor);

        if !stdin_open && controller.status() == PlaybackStatus::Idle {
            break;
        }
    }
    Ok(())
}

/// Returns `false` when the session should end.
fn handle_line<E: SpeechEngine>(
    controller: &mut PlaybackController<E>,
    keep_alive: &mut KeepAlive,
    config: &AppConfig,
    line: &str,
) -> bool {
    let Some(command) = parse_command(line) else {
        if !line.trim().is_empty() {
            println!("unrecognized command: {} (try `help`)", line.trim());
        }
        return true;
    };

    match command {
        TerminalCommand::Key(key) => match command_for_key(config, &key, controller.state()) {
            Some(command) => {
                controller.apply_command(command);
            }
            None => debug!(key = %key.key, "Key ignored in current state"),
        },
        TerminalCommand::Playback(command) => {
            controller.apply_command(command);
        }
        TerminalCommand::Voices => {
            let snapshot = controller.snapshot();
            if snapshot.voices.is_empty() {
                println!("no voices reported by the engine");
            }
            for voice in snapshot.voices {
                let marker = if voice.selected { '*' } else { ' ' };
                println!("{marker} {:<12} {} ({})", voice.id, voice.display_name, voice.locale);
            }
        }
        TerminalCommand::Status => println!("{}", controller.snapshot().status_line),
        TerminalCommand::Snapshot => match serde_json::to_string_pretty(&controller.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => warn!("Could not encode snapshot: {err}"),
        },
        TerminalCommand::Hidden(hidden) => keep_alive.set_hidden(hidden, Instant::now()),
        TerminalCommand::Help => println!("{HELP}"),
        TerminalCommand::Quit => return false,
    }
    true
}

/// Print each newly highlighted sentence.
fn report_changes(changes: &Receiver<PlaybackEvent>, last_cursor: &mut Option<usize>) {
    for event in changes.try_iter() {
        let snapshot = &event.snapshot;
        if snapshot.cursor != *last_cursor {
            if let (Some(index), Some(text)) = (snapshot.cursor, &snapshot.current_text) {
                println!("[{}/{}] {}", index + 1, snapshot.sentence_count, text);
            }
            *last_cursor = snapshot.cursor;
        }
        debug!(action = event.action, status = ?snapshot.status, "Playback changed");
        if event.action == ACTION_VOICES_CHANGED {
            debug!(voices = snapshot.voices.len(), "Voices changed");
        }
    }
}

fn spawn_stdin_reader(tx: Sender<RuntimeInput>) -> Result<()> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(RuntimeInput::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!("Reading stdin failed: {err}");
                        break;
                    }
                }
            }
            let _ = tx.send(RuntimeInput::Eof);
        })
        .context("Spawning stdin reader")?;
    Ok(())
}
