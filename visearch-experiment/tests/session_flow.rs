use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use visearch_core::{KeyInput, ResponseKey, Screen, Shape, Target, TrialState};
use visearch_experiment::{
    ExperimentConfig, ExperimentEvent, ExperimentStateMachine, IconPool, LoadedConfig, Page,
    Participant, SessionArtifacts, SessionMeta, SessionRecorder,
};
use visearch_timing::ManualTimer;

type Machine = ExperimentStateMachine<ManualTimer, StdRng>;

fn config(experimental: usize, blocks: usize, show_feedback: bool) -> ExperimentConfig {
    let mut cfg = ExperimentConfig::default();
    cfg.trials.training = 0;
    cfg.trials.experimental = experimental;
    cfg.trials.blocks = blocks;
    cfg.show_feedback = show_feedback;
    cfg
}

fn machine(cfg: ExperimentConfig, output_dir: &Path) -> (Machine, ManualTimer) {
    let loaded = LoadedConfig {
        path: "config_test.ini".into(),
        source: cfg.to_ini(),
        config: cfg.clone(),
    };
    let meta = SessionMeta::new(Participant::new("p1"), loaded.path.clone());
    let recorder = SessionRecorder::new(meta, &loaded, output_dir);
    let timer = ManualTimer::new();
    let m = ExperimentStateMachine::new(
        cfg,
        recorder,
        IconPool::default(),
        timer.clone(),
        StdRng::seed_from_u64(7),
    );
    (m, timer)
}

fn expected_key(m: &Machine) -> ResponseKey {
    let run = m.current_trial().expect("no trial running");
    let layout = run.layout();
    let target = match layout.slots[layout.target_index].shape {
        Shape::Triangle => Target::Triangle,
        _ => Target::Diamond,
    };
    m.config().version.expected_key(target)
}

/// Walks the current trial to its response window and answers correctly
/// 500 ms after onset.
fn answer(m: &mut Machine, timer: &ManualTimer) -> Vec<ExperimentEvent> {
    timer.advance_ms(500);
    assert!(m.update().is_empty());
    assert!(m.screen().is_stimulus());
    timer.advance_ms(100);
    assert!(m.update().is_empty());
    timer.advance_ms(400);
    let key = expected_key(m);
    m.handle_key(KeyInput::Response(key))
}

fn exit_of(events: &[ExperimentEvent]) -> Option<(bool, Option<SessionArtifacts>)> {
    events.iter().find_map(|e| match e {
        ExperimentEvent::Exit { aborted, saved } => {
            let saved = saved.as_ref().expect("session write failed").clone();
            Some((*aborted, saved))
        }
        _ => None,
    })
}

fn read_rows(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn blocks_are_announced_before_their_trials() {
    let dir = tempfile::tempdir().unwrap();
    let (mut m, timer) = machine(config(32, 4, false), dir.path());
    assert_eq!(m.trials_planned(), 32);

    // one entry per block prompt, counting the trials that follow it
    let mut blocks: Vec<(usize, usize)> = Vec::new();
    let mut exit = None;
    while !m.is_finished() {
        let events = match m.current_page() {
            Some(_) => m.handle_key(KeyInput::Space),
            None => answer(&mut m, &timer),
        };
        for e in &events {
            match e {
                ExperimentEvent::BlockStarted(b) => blocks.push((*b, 0)),
                ExperimentEvent::TrialRecorded { .. } => {
                    blocks.last_mut().expect("trial outside a block").1 += 1
                }
                ExperimentEvent::Exit { .. } => {}
            }
        }
        if let Some(x) = exit_of(&events) {
            exit = Some(x);
        }
    }

    assert_eq!(blocks, vec![(1, 8), (2, 8), (3, 8), (4, 8)]);
    let (aborted, artifacts) = exit.expect("session never exited");
    assert!(!aborted);
    let artifacts = artifacts.expect("nothing written");
    let rows = read_rows(&artifacts.table);
    assert_eq!(rows.len(), 33);
    assert!(rows[1..].iter().all(|r| r.split(';').count() == 27));

    let summary = std::fs::read_to_string(&artifacts.summary).unwrap();
    assert!(summary.contains("Overall accuracy: 100.0%"));
    assert!(summary.contains("Mean reaction time (correct): 500.0 ms"));
    assert_eq!(m.recorder().summary().experimental_trials, 32);
}

#[test]
fn escape_during_fifth_trial_keeps_four_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (mut m, timer) = machine(config(32, 4, false), dir.path());

    while m.current_trial().is_none() {
        m.handle_key(KeyInput::Space);
    }
    for _ in 0..4 {
        let events = answer(&mut m, &timer);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ExperimentEvent::TrialRecorded { correct: true, .. }))
        );
    }

    let run = m.current_trial().expect("fifth trial should be running");
    assert_eq!(run.context().trial_number, 5);
    timer.advance_ms(500);
    m.update();
    timer.advance_ms(200);
    m.update();
    assert_eq!(
        m.current_trial().map(|t| t.state()),
        Some(TrialState::AwaitingResponse)
    );

    let events = m.handle_key(KeyInput::Escape);
    let (aborted, artifacts) = exit_of(&events).expect("escape should end the session");
    assert!(aborted);
    assert!(m.is_finished());
    assert_eq!(m.screen(), Screen::Blank);

    let rows = read_rows(&artifacts.expect("four trials were recorded").table);
    assert_eq!(rows.len(), 5);
    let trial_numbers: Vec<&str> = rows[1..]
        .iter()
        .map(|r| r.split(';').nth(1).unwrap())
        .collect();
    assert_eq!(trial_numbers, ["1", "2", "3", "4"]);

    // the session is over, further input does nothing
    assert!(m.handle_key(KeyInput::Escape).is_empty());
    assert!(m.update().is_empty());
}

#[test]
fn escape_before_any_trial_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut m, _timer) = machine(config(8, 1, false), dir.path());
    assert_eq!(m.current_page(), Some(Page::Welcome));

    let events = m.handle_key(KeyInput::Escape);
    assert_eq!(exit_of(&events), Some((true, None)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn feedback_screen_waits_for_space() {
    let dir = tempfile::tempdir().unwrap();
    let (mut m, timer) = machine(config(8, 1, true), dir.path());
    while m.current_trial().is_none() {
        m.handle_key(KeyInput::Space);
    }

    assert!(answer(&mut m, &timer).is_empty());
    assert!(matches!(m.screen(), Screen::Feedback(_)));
    timer.advance_ms(10_000);
    assert!(m.update().is_empty());

    let events = m.handle_key(KeyInput::Space);
    assert!(matches!(
        events.as_slice(),
        [ExperimentEvent::TrialRecorded {
            trial_number: 1,
            practice: false,
            correct: true,
        }]
    ));
    assert_eq!(m.current_trial().map(|t| t.context().trial_number), Some(2));
}

#[test]
fn timeouts_are_recorded_without_input() {
    let dir = tempfile::tempdir().unwrap();
    let (mut m, timer) = machine(config(8, 1, false), dir.path());
    while m.current_trial().is_none() {
        m.handle_key(KeyInput::Space);
    }

    timer.advance_ms(500);
    m.update();
    timer.advance_ms(2000);
    let events = m.update();
    assert!(matches!(
        events.as_slice(),
        [ExperimentEvent::TrialRecorded { correct: false, .. }]
    ));
    let recorded = &m.recorder().results()[0];
    assert_eq!(recorded.reaction_time_ms, None);
    assert_eq!(recorded.response, None);
}

#[test]
fn recorder_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(8, 1, false);
    let (mut m, timer) = machine(cfg.clone(), dir.path());
    while m.current_trial().is_none() {
        m.handle_key(KeyInput::Space);
    }
    answer(&mut m, &timer);
    let result = m.recorder().results()[0].clone();

    let loaded = LoadedConfig {
        path: "config.ini".into(),
        source: cfg.to_ini(),
        config: cfg,
    };
    let mut recorder = SessionRecorder::new(
        SessionMeta::new(Participant::new("p2"), "config.ini"),
        &loaded,
        dir.path().join("out"),
    );
    recorder.record(result.clone());

    let first = recorder.flush().unwrap().expect("first flush writes");
    assert!(first.table.exists());
    assert!(first.config.exists());
    assert!(first.summary.exists());
    assert!(first.metadata.exists());
    assert!(recorder.is_flushed());

    assert_eq!(recorder.flush().unwrap(), None);
    recorder.record(result);
    assert_eq!(recorder.results().len(), 1);
    assert_eq!(read_rows(&first.table).len(), 2);
}
