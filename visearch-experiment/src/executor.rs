use crate::classify::{Classification, Response, classify};
use crate::config::ExperimentConfig;
use crate::layout::{IconPool, generate_layout};
use rand::Rng;
use std::time::Duration;
use tracing::debug;
use visearch_core::{
    KeyInput, ResponseKey, Screen, StimulusLayout, TrialResult, TrialSpec, TrialState,
};

/// Where a trial sits in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialContext {
    pub participant_id: String,
    pub trial_number: usize,
    pub block_number: usize,
    pub practice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialDurations {
    pub fixation_ns: u64,
    pub stimulus_ns: u64,
    /// Stimulus onset to end of the response window
    pub max_response_ns: u64,
}

impl TrialDurations {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        let ns = |d: Duration| d.as_nanos() as u64;
        Self {
            fixation_ns: ns(config.timing.fixation),
            stimulus_ns: ns(config.timing.stimulus),
            max_response_ns: ns(config.timing.stimulus + config.timing.response_window()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialEvent {
    /// Escape was pressed; the trial leaves no record
    Abort,
    Completed(TrialResult),
}

/// One running trial: fixation, stimulus, response window, feedback.
#[derive(Debug, Clone)]
pub struct TrialRun {
    spec: TrialSpec,
    context: TrialContext,
    layout: StimulusLayout,
    expected: ResponseKey,
    durations: TrialDurations,
    show_feedback: bool,
    state: TrialState,
    fixation_start_ns: u64,
    stimulus_start_ns: Option<u64>,
    response: Option<Response>,
    outcome: Option<Classification>,
}

/// Lays out a trial and starts its fixation period at `now_ns`.
pub fn start_trial<R: Rng + ?Sized>(
    spec: TrialSpec,
    context: TrialContext,
    config: &ExperimentConfig,
    icons: &IconPool,
    rng: &mut R,
    now_ns: u64,
) -> TrialRun {
    let layout = generate_layout(&spec, config, icons, rng);
    TrialRun::new(spec, context, layout, config, now_ns)
}

impl TrialRun {
    pub fn new(
        spec: TrialSpec,
        context: TrialContext,
        layout: StimulusLayout,
        config: &ExperimentConfig,
        now_ns: u64,
    ) -> Self {
        debug!(
            trial = context.trial_number,
            block = context.block_number,
            practice = context.practice,
            target = %spec.target,
            app = %spec.app_category,
            side = %spec.app_side,
            target_position = layout.target_index,
            "trial started"
        );
        Self {
            spec,
            expected: config.version.expected_key(spec.target),
            context,
            layout,
            durations: TrialDurations::from_config(config),
            show_feedback: config.show_feedback,
            state: TrialState::Fixation,
            fixation_start_ns: now_ns,
            stimulus_start_ns: None,
            response: None,
            outcome: None,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn layout(&self) -> &StimulusLayout {
        &self.layout
    }

    pub fn context(&self) -> &TrialContext {
        &self.context
    }

    pub fn screen(&self) -> Screen<'_> {
        match self.state {
            TrialState::Fixation | TrialState::AwaitingResponse => Screen::Fixation {
                size: self.layout.fixation_size,
            },
            TrialState::Stimulus => Screen::Stimulus(&self.layout),
            TrialState::Feedback => match self.outcome {
                Some(c) => Screen::Feedback(c.feedback),
                None => Screen::Blank,
            },
            TrialState::Complete => Screen::Blank,
        }
    }

    /// Timestamp of the next timed transition, if one is pending.
    pub fn next_deadline_ns(&self) -> Option<u64> {
        match (self.state, self.stimulus_start_ns) {
            (TrialState::Fixation, _) => Some(self.fixation_start_ns + self.durations.fixation_ns),
            (TrialState::Stimulus, Some(onset)) => Some(onset + self.durations.stimulus_ns),
            (TrialState::AwaitingResponse, Some(onset)) => {
                Some(onset + self.durations.max_response_ns)
            }
            _ => None,
        }
    }

    /// Applies every timed transition due at `now_ns`.
    pub fn update(&mut self, now_ns: u64) -> Option<TrialEvent> {
        loop {
            let due = self.next_deadline_ns().is_some_and(|d| now_ns >= d);
            if !due {
                return None;
            }
            match self.state {
                TrialState::Fixation => {
                    self.state = TrialState::Stimulus;
                    self.stimulus_start_ns = Some(now_ns);
                    debug!(at_ns = now_ns, "stimulus onset");
                }
                TrialState::Stimulus => {
                    self.state = TrialState::AwaitingResponse;
                    debug!(at_ns = now_ns, "response window opened");
                }
                TrialState::AwaitingResponse => {
                    debug!(at_ns = now_ns, "response window timed out");
                    return self.resolve(None);
                }
                TrialState::Feedback | TrialState::Complete => return None,
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyInput, now_ns: u64) -> Option<TrialEvent> {
        if key == KeyInput::Escape {
            self.state = TrialState::Complete;
            return Some(TrialEvent::Abort);
        }
        // a key that arrives after the deadline does not count
        if let Some(event) = self.update(now_ns) {
            return Some(event);
        }
        match (self.state, key) {
            (TrialState::AwaitingResponse, KeyInput::Response(k)) => {
                let onset = self.stimulus_start_ns.unwrap_or(now_ns);
                let response = Response {
                    key: k,
                    reaction_time_ms: now_ns.saturating_sub(onset) as f64 / 1_000_000.0,
                };
                self.resolve(Some(response))
            }
            (TrialState::Feedback, KeyInput::Space) => {
                self.state = TrialState::Complete;
                Some(TrialEvent::Completed(self.result()))
            }
            _ => None,
        }
    }

    fn resolve(&mut self, response: Option<Response>) -> Option<TrialEvent> {
        let outcome = classify(response, self.expected);
        self.response = response;
        self.outcome = Some(outcome);
        debug!(
            trial = self.context.trial_number,
            rt_ms = response.map(|r| r.reaction_time_ms),
            correct = outcome.correct,
            feedback = outcome.feedback.message(),
            "trial classified"
        );
        if self.show_feedback {
            self.state = TrialState::Feedback;
            None
        } else {
            self.state = TrialState::Complete;
            Some(TrialEvent::Completed(self.result()))
        }
    }

    fn result(&self) -> TrialResult {
        let outcome = self.outcome.unwrap_or_else(|| classify(None, self.expected));
        TrialResult {
            participant_id: self.context.participant_id.clone(),
            trial_number: self.context.trial_number,
            block_number: self.context.block_number,
            practice: self.context.practice,
            app_category: self.spec.app_category,
            app_side: self.spec.app_side,
            target: self.spec.target,
            icon: self.layout.icon.as_ref().map(|i| i.file.clone()),
            notification: self.layout.icon.as_ref().is_some_and(|i| i.notification),
            target_position: self.layout.target_index,
            shapes: self.layout.shapes(),
            colors: self.layout.colors(),
            response: self.response.map(|r| r.key),
            expected_key: self.expected,
            correct: outcome.correct,
            reaction_time_ms: self.response.map(|r| r.reaction_time_ms),
            feedback: outcome.feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use visearch_core::{AppCategory, Feedback, Side, Target, Version};

    const MS: u64 = 1_000_000;

    fn run(config: &ExperimentConfig, target: Target) -> TrialRun {
        let mut rng = StdRng::seed_from_u64(42);
        start_trial(
            TrialSpec {
                target,
                app_category: AppCategory::Social,
                app_side: Side::Left,
            },
            TrialContext {
                participant_id: "p1".into(),
                trial_number: 1,
                block_number: 1,
                practice: false,
            },
            config,
            &IconPool::default(),
            &mut rng,
            0,
        )
    }

    fn quiet() -> ExperimentConfig {
        ExperimentConfig {
            show_feedback: false,
            ..ExperimentConfig::default()
        }
    }

    fn completed(event: Option<TrialEvent>) -> TrialResult {
        match event {
            Some(TrialEvent::Completed(r)) => r,
            other => panic!("expected a completed trial, got {other:?}"),
        }
    }

    #[test]
    fn walks_through_the_phases() {
        let mut t = run(&quiet(), Target::Triangle);
        assert_eq!(t.state(), TrialState::Fixation);
        assert!(matches!(t.screen(), Screen::Fixation { .. }));
        assert_eq!(t.update(499 * MS), None);
        t.update(500 * MS);
        assert_eq!(t.state(), TrialState::Stimulus);
        assert!(t.screen().is_stimulus());
        t.update(600 * MS);
        assert_eq!(t.state(), TrialState::AwaitingResponse);
        assert_eq!(t.next_deadline_ns(), Some(2500 * MS));
    }

    #[test]
    fn keys_before_the_window_are_ignored() {
        let mut t = run(&quiet(), Target::Triangle);
        assert_eq!(t.handle_key(KeyInput::Response(ResponseKey::LeftShift), 100 * MS), None);
        t.update(500 * MS);
        assert_eq!(t.handle_key(KeyInput::Response(ResponseKey::LeftShift), 550 * MS), None);
        assert_eq!(t.state(), TrialState::Stimulus);
    }

    #[test]
    fn correct_response_is_timed_from_onset() {
        let mut t = run(&quiet(), Target::Triangle);
        t.update(500 * MS);
        t.update(600 * MS);
        let r = completed(t.handle_key(KeyInput::Response(ResponseKey::LeftShift), 1100 * MS));
        assert!(r.correct);
        assert_eq!(r.reaction_time_ms, Some(600.0));
        assert_eq!(r.response, Some(ResponseKey::LeftShift));
        assert_eq!(r.feedback, Feedback::Correct);
        assert_eq!(r.expected_key, ResponseKey::LeftShift);
    }

    #[test]
    fn timeout_leaves_rt_empty() {
        let mut t = run(&quiet(), Target::Diamond);
        t.update(500 * MS);
        t.update(600 * MS);
        assert_eq!(t.update(2499 * MS), None);
        let r = completed(t.update(2500 * MS));
        assert!(!r.correct);
        assert_eq!(r.reaction_time_ms, None);
        assert_eq!(r.response, None);
        assert_eq!(r.feedback, Feedback::TooSlow);
    }

    #[test]
    fn late_key_counts_as_timeout() {
        let mut t = run(&quiet(), Target::Diamond);
        t.update(500 * MS);
        t.update(600 * MS);
        let r = completed(t.handle_key(KeyInput::Response(ResponseKey::RightShift), 3000 * MS));
        assert_eq!(r.response, None);
        assert_eq!(r.feedback, Feedback::TooSlow);
    }

    #[test]
    fn feedback_waits_for_space() {
        let mut t = run(&ExperimentConfig::default(), Target::Triangle);
        t.update(500 * MS);
        t.update(600 * MS);
        assert_eq!(t.handle_key(KeyInput::Response(ResponseKey::RightShift), 900 * MS), None);
        assert_eq!(t.state(), TrialState::Feedback);
        assert_eq!(t.screen(), Screen::Feedback(Feedback::Wrong));
        assert_eq!(t.update(60_000 * MS), None);
        assert_eq!(t.handle_key(KeyInput::Response(ResponseKey::LeftShift), 60_001 * MS), None);
        let r = completed(t.handle_key(KeyInput::Space, 60_002 * MS));
        assert!(!r.correct);
        assert_eq!(r.reaction_time_ms, Some(400.0));
    }

    #[test]
    fn escape_aborts_anywhere() {
        let mut t = run(&ExperimentConfig::default(), Target::Triangle);
        assert_eq!(t.handle_key(KeyInput::Escape, 10 * MS), Some(TrialEvent::Abort));

        let mut t = run(&ExperimentConfig::default(), Target::Triangle);
        t.update(500 * MS);
        t.update(600 * MS);
        t.update(3000 * MS);
        assert_eq!(t.state(), TrialState::Feedback);
        assert_eq!(t.handle_key(KeyInput::Escape, 3001 * MS), Some(TrialEvent::Abort));
    }

    #[test]
    fn version_b_maps_diamond_to_left() {
        let config = ExperimentConfig {
            version: Version::B,
            ..quiet()
        };
        let mut t = run(&config, Target::Diamond);
        t.update(500 * MS);
        t.update(600 * MS);
        let r = completed(t.handle_key(KeyInput::Response(ResponseKey::LeftShift), 1100 * MS));
        assert!(r.correct);
    }

    #[test]
    fn anticipation_is_too_fast() {
        let mut t = run(&quiet(), Target::Triangle);
        t.update(500 * MS);
        t.update(600 * MS);
        let r = completed(t.handle_key(KeyInput::Response(ResponseKey::LeftShift), 650 * MS));
        assert!(!r.correct);
        assert_eq!(r.feedback, Feedback::TooFast);
        assert_eq!(r.reaction_time_ms, Some(150.0));
    }
}
