use crate::config::ExperimentConfig;
use crate::error::SessionError;
use crate::executor::{TrialContext, TrialEvent, TrialRun, start_trial};
use crate::instructions::Page;
use crate::layout::IconPool;
use crate::session::{SessionArtifacts, SessionRecorder};
use crate::trials::{block_ranges, experimental_trials, training_trials};
use rand::Rng;
use std::collections::VecDeque;
use tracing::{error, info};
use visearch_core::{KeyInput, Screen, TrialSpec};
use visearch_timing::Timer;

/// One scheduled step of the session
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Page(Page),
    Trial {
        spec: TrialSpec,
        context: TrialContext,
    },
}

/// Lays out the whole session: instructions, practice, then blocks
/// separated by breaks.
pub fn build_plan<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    participant_id: &str,
    rng: &mut R,
) -> VecDeque<Step> {
    let context = |trial_number, block_number, practice| TrialContext {
        participant_id: participant_id.to_string(),
        trial_number,
        block_number,
        practice,
    };

    let mut plan = VecDeque::new();
    plan.push_back(Step::Page(Page::Welcome));
    plan.push_back(Step::Page(Page::Task));
    plan.push_back(Step::Page(Page::TrainingIntro));

    for (i, spec) in training_trials(config, rng).into_iter().enumerate() {
        plan.push_back(Step::Trial {
            spec,
            context: context(i + 1, 0, true),
        });
    }

    plan.push_back(Step::Page(Page::ExperimentIntro));

    let trials = experimental_trials(config, rng);
    let ranges = block_ranges(config, trials.len());
    let last = ranges.len().saturating_sub(1);
    for (b, range) in ranges.into_iter().enumerate() {
        plan.push_back(Step::Page(Page::BlockIntro(b + 1)));
        let block_start = range.start;
        for (i, spec) in trials[range].iter().enumerate() {
            plan.push_back(Step::Trial {
                spec: *spec,
                context: context(block_start + i + 1, b + 1, false),
            });
        }
        if b < last {
            plan.push_back(Step::Page(Page::Break(b + 1)));
        }
    }

    plan.push_back(Step::Page(Page::Goodbye));
    plan
}

#[derive(Debug)]
pub enum ExperimentEvent {
    /// A trial finished and was recorded
    TrialRecorded {
        trial_number: usize,
        practice: bool,
        correct: bool,
    },
    BlockStarted(usize),
    /// The session is over and has been written out
    Exit {
        aborted: bool,
        saved: Result<Option<SessionArtifacts>, SessionError>,
    },
}

#[derive(Debug)]
enum Current {
    Page { page: Page, text: String },
    Trial(TrialRun),
    Finished,
}

/// Drives a complete session from the first instruction to the last page
pub struct ExperimentStateMachine<T, R>
where
    T: Timer,
    R: Rng,
{
    pub timer: T,
    rng: R,
    config: ExperimentConfig,
    icons: IconPool,
    recorder: SessionRecorder,
    plan: VecDeque<Step>,
    current: Current,
    trials_planned: usize,
}

impl<T, R> ExperimentStateMachine<T, R>
where
    T: Timer,
    R: Rng,
{
    pub fn new(
        config: ExperimentConfig,
        recorder: SessionRecorder,
        icons: IconPool,
        timer: T,
        mut rng: R,
    ) -> Self {
        let plan = build_plan(&config, &recorder.meta().participant.id, &mut rng);
        let trials_planned = plan
            .iter()
            .filter(|s| matches!(s, Step::Trial { .. }))
            .count();
        info!(
            participant = %recorder.meta().participant.id,
            trials = trials_planned,
            blocks = config.trials.blocks,
            per_block = config.trials_per_block(),
            "session planned"
        );
        let mut machine = Self {
            timer,
            rng,
            config,
            icons,
            recorder,
            plan,
            current: Current::Finished,
            trials_planned,
        };
        let mut events = Vec::new();
        machine.advance(&mut events);
        machine
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    pub fn trials_planned(&self) -> usize {
        self.trials_planned
    }

    pub fn current_page(&self) -> Option<Page> {
        match &self.current {
            Current::Page { page, .. } => Some(*page),
            _ => None,
        }
    }

    pub fn current_trial(&self) -> Option<&TrialRun> {
        match &self.current {
            Current::Trial(run) => Some(run),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.current, Current::Finished)
    }

    pub fn screen(&self) -> Screen<'_> {
        match &self.current {
            Current::Page { text, .. } => Screen::Instruction(text),
            Current::Trial(run) => run.screen(),
            Current::Finished => Screen::Blank,
        }
    }

    pub fn next_deadline_ns(&self) -> Option<u64> {
        self.current_trial().and_then(TrialRun::next_deadline_ns)
    }

    /// Applies timed transitions of the running trial.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let now = self.timer.now();
        let mut events = Vec::new();
        let outcome = match &mut self.current {
            Current::Trial(run) => run.update(now),
            _ => None,
        };
        if let Some(outcome) = outcome {
            self.on_trial_event(outcome, &mut events);
        }
        events
    }

    pub fn handle_key(&mut self, key: KeyInput) -> Vec<ExperimentEvent> {
        let now = self.timer.now();
        let mut events = Vec::new();
        let outcome = match &mut self.current {
            Current::Finished => None,
            Current::Trial(run) => run.handle_key(key, now),
            Current::Page { page, .. } => {
                let page = *page;
                match key {
                    KeyInput::Escape => {
                        info!(?page, "session aborted");
                        self.exit(true, &mut events);
                    }
                    KeyInput::Space => self.advance(&mut events),
                    KeyInput::Response(_) => {}
                }
                None
            }
        };
        if let Some(outcome) = outcome {
            self.on_trial_event(outcome, &mut events);
        }
        events
    }

    fn on_trial_event(&mut self, outcome: TrialEvent, events: &mut Vec<ExperimentEvent>) {
        match outcome {
            TrialEvent::Abort => {
                if let Some(run) = self.current_trial() {
                    info!(trial = run.context().trial_number, "session aborted during trial");
                }
                self.exit(true, events);
            }
            TrialEvent::Completed(result) => {
                events.push(ExperimentEvent::TrialRecorded {
                    trial_number: result.trial_number,
                    practice: result.practice,
                    correct: result.correct,
                });
                self.recorder.record(result);
                self.advance(events);
            }
        }
    }

    /// Activates the next planned step.
    fn advance(&mut self, events: &mut Vec<ExperimentEvent>) {
        let Some(step) = self.plan.pop_front() else {
            self.exit(false, events);
            return;
        };
        self.current = match step {
            Step::Page(page) => {
                if let Page::BlockIntro(b) = page {
                    events.push(ExperimentEvent::BlockStarted(b));
                }
                Current::Page {
                    page,
                    text: page.text(&self.config),
                }
            }
            Step::Trial { spec, context } => Current::Trial(start_trial(
                spec,
                context,
                &self.config,
                &self.icons,
                &mut self.rng,
                self.timer.now(),
            )),
        };
    }

    fn exit(&mut self, aborted: bool, events: &mut Vec<ExperimentEvent>) {
        self.current = Current::Finished;
        self.plan.clear();
        let saved = self.recorder.flush();
        match &saved {
            Ok(Some(artifacts)) => info!(
                aborted,
                trials = self.recorder.results().len(),
                table = %artifacts.table.display(),
                "session written"
            ),
            Ok(None) => info!(aborted, "no trials recorded, nothing written"),
            Err(e) => error!(error = %e, "failed to write session"),
        }
        events.push(ExperimentEvent::Exit { aborted, saved });
    }
}
