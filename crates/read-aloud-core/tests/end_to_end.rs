use read_aloud_core::config::{AppConfig, parse_config};
use read_aloud_core::engine::{EngineEventReceiver, EngineEventSender, UtteranceRequest, event_channel};
use read_aloud_core::{
    EngineEvent, PlaybackController, PlaybackStatus, Segmenter, SpeechEngine, UtteranceErrorKind,
    UtteranceEvent, UtteranceId, Voice,
};
use std::cell::RefCell;
use std::rc::Rc;

const ARTICLE: &str = r#"
<html><body>
  <nav><p>Home</p></nav>
  <article>
    <h1>Reading Aloud</h1>
    <p>The first paragraph opens here. It has a second sentence!</p>
    <p>Another paragraph follows. Does it end with a question?</p>
  </article>
</body></html>
"#;

/// Engine that completes every utterance immediately by queueing its
/// callbacks on the event channel.
struct InstantEngine {
    events: EngineEventSender,
    active: Option<UtteranceId>,
    spoken: Rc<RefCell<Vec<UtteranceRequest>>>,
}

impl SpeechEngine for InstantEngine {
    fn speak(&mut self, request: UtteranceRequest) -> Result<(), UtteranceErrorKind> {
        let id = request.id;
        self.active = Some(id);
        self.spoken.borrow_mut().push(request);
        for event in [UtteranceEvent::Started, UtteranceEvent::Finished] {
            let _ = self.events.send(EngineEvent::Utterance { id, event });
        }
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(id) = self.active.take() {
            let _ = self.events.send(EngineEvent::Utterance {
                id,
                event: UtteranceEvent::Failed(UtteranceErrorKind::Canceled),
            });
        }
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    fn list_voices(&self) -> Vec<Voice> {
        vec![Voice {
            id: "en-us".to_string(),
            name: "English (America)".to_string(),
            locale: "en-US".to_string(),
        }]
    }
}

fn session() -> (
    PlaybackController<InstantEngine>,
    EngineEventReceiver,
    Rc<RefCell<Vec<UtteranceRequest>>>,
) {
    let mut config = AppConfig::default();
    config.min_article_chars = 20;
    let sentences = Segmenter::from_config(&config).segment_html(ARTICLE).unwrap();
    let (events, receiver) = event_channel();
    let spoken = Rc::new(RefCell::new(Vec::new()));
    let engine = InstantEngine {
        events,
        active: None,
        spoken: Rc::clone(&spoken),
    };
    let controller = PlaybackController::new(engine, sentences, &config).unwrap();
    (controller, receiver, spoken)
}

fn drain(controller: &mut PlaybackController<InstantEngine>, receiver: &EngineEventReceiver) {
    while let Ok(event) = receiver.try_recv() {
        controller.handle_engine_event(event);
    }
}

#[test]
fn article_is_read_in_order_then_session_goes_idle() {
    let (mut controller, receiver, spoken) = session();
    assert_eq!(controller.state().paragraph_boundaries(), &[0, 1, 3]);

    controller.play();
    drain(&mut controller, &receiver);

    let texts: Vec<String> = spoken.borrow().iter().map(|r| r.text.clone()).collect();
    assert_eq!(
        texts,
        vec![
            "Reading Aloud",
            "The first paragraph opens here.",
            "It has a second sentence!",
            "Another paragraph follows.",
            "Does it end with a question?",
        ]
    );
    assert_eq!(controller.status(), PlaybackStatus::Idle);
    assert_eq!(controller.cursor(), None);
    assert!(spoken.borrow().iter().all(|r| r.voice_id.as_deref() == Some("en-us")));
}

#[test]
fn stale_callbacks_after_skip_do_not_double_advance() {
    let (mut controller, receiver, spoken) = session();
    controller.play();
    controller.skip_forward();
    drain(&mut controller, &receiver);

    let indices: Vec<usize> = spoken.borrow().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(controller.status(), PlaybackStatus::Idle);
    assert!(controller.snapshot().last_error.is_none());
}

#[test]
fn config_file_drives_segmenting_and_voice_params() {
    let config = parse_config(
        r#"
        [content]
        selector = "article"
        min_article_chars = 5000

        [playback]
        default_rate = 1.1
        "#,
    )
    .unwrap();
    let sentences = Segmenter::from_config(&config).segment_html(ARTICLE).unwrap();
    assert_eq!(sentences.len(), 5);

    let (events, _receiver) = event_channel();
    let spoken = Rc::new(RefCell::new(Vec::new()));
    let engine = InstantEngine {
        events,
        active: None,
        spoken: Rc::clone(&spoken),
    };
    let mut controller = PlaybackController::new(engine, sentences, &config).unwrap();
    controller.play();
    assert!((spoken.borrow()[0].rate - 1.1).abs() < f32::EPSILON);
    assert!(controller.snapshot().status_line.starts_with("Playing · 1.1x · 1/5"));
}
