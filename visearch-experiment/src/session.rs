use crate::config::{ExperimentConfig, LoadedConfig};
use crate::error::SessionError;
use crate::participant::Participant;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use visearch_core::{TABLE_COLUMNS, TrialResult};

const DELIMITER: char = ';';
const RULE_HEAVY: &str = "============================================================";
const RULE_LIGHT: &str = "------------------------------------------------------------";

/// Identifying data of one run
#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    pub participant: Participant,
    pub started_at: DateTime<Local>,
    pub config_path: PathBuf,
}

impl SessionMeta {
    pub fn new(participant: Participant, config_path: impl Into<PathBuf>) -> Self {
        Self {
            participant,
            started_at: Local::now(),
            config_path: config_path.into(),
        }
    }

    /// Suffix shared by every artifact of this session
    pub fn file_stamp(&self) -> String {
        format!(
            "{}_{}",
            self.participant.id,
            self.started_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }
}

/// Accuracy and speed over the experimental (non-practice) trials
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub experimental_trials: usize,
    pub correct_trials: usize,
    pub accuracy_pct: f64,
    /// Mean over correct experimental trials only
    pub mean_rt_ms: f64,
}

impl Summary {
    pub fn from_results(results: &[TrialResult]) -> Self {
        let experimental: Vec<&TrialResult> = results.iter().filter(|r| !r.practice).collect();
        let correct: Vec<&TrialResult> =
            experimental.iter().copied().filter(|r| r.correct).collect();
        let rts: Vec<f64> = correct.iter().filter_map(|r| r.reaction_time_ms).collect();

        let accuracy_pct = if experimental.is_empty() {
            0.0
        } else {
            correct.len() as f64 / experimental.len() as f64 * 100.0
        };
        let mean_rt_ms = if rts.is_empty() {
            0.0
        } else {
            rts.iter().sum::<f64>() / rts.len() as f64
        };

        Self {
            experimental_trials: experimental.len(),
            correct_trials: correct.len(),
            accuracy_pct,
            mean_rt_ms,
        }
    }
}

/// Files written by a flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArtifacts {
    pub table: PathBuf,
    pub config: PathBuf,
    pub summary: PathBuf,
    pub metadata: PathBuf,
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    meta: &'a SessionMeta,
    ended_at: DateTime<Local>,
    config: &'a ExperimentConfig,
    trials_recorded: usize,
    summary: Summary,
}

/// Accumulates trial results and writes them out once.
#[derive(Debug)]
pub struct SessionRecorder {
    meta: SessionMeta,
    config: ExperimentConfig,
    config_source: String,
    output_dir: PathBuf,
    results: Vec<TrialResult>,
    flushed: bool,
}

impl SessionRecorder {
    pub fn new(meta: SessionMeta, loaded: &LoadedConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta,
            config: loaded.config.clone(),
            config_source: loaded.source.clone(),
            output_dir: output_dir.into(),
            results: Vec::new(),
            flushed: false,
        }
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    pub fn record(&mut self, result: TrialResult) {
        if self.flushed {
            warn!(
                trial = result.trial_number,
                "session already written, dropping late trial result"
            );
            return;
        }
        self.results.push(result);
    }

    pub fn summary(&self) -> Summary {
        Summary::from_results(&self.results)
    }

    pub fn flush(&mut self) -> Result<Option<SessionArtifacts>, SessionError> {
        self.flush_at(Local::now())
    }

    /// Writes the trial table, config snapshot, summary and metadata.
    ///
    /// Does nothing when no trial was recorded or the session was already
    /// written.
    pub fn flush_at(
        &mut self,
        ended_at: DateTime<Local>,
    ) -> Result<Option<SessionArtifacts>, SessionError> {
        if self.flushed || self.results.is_empty() {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| SessionError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let stamp = self.meta.file_stamp();
        let artifacts = SessionArtifacts {
            table: self.output_dir.join(format!("result_{stamp}.csv")),
            config: self.output_dir.join(format!("config_{stamp}.ini")),
            summary: self.output_dir.join(format!("summary_{stamp}.txt")),
            metadata: self.output_dir.join(format!("session_{stamp}.json")),
        };
        let summary = self.summary();

        write_file(&artifacts.table, &trial_table(&self.results))?;
        info!(path = %artifacts.table.display(), rows = self.results.len(), "results saved");

        write_file(&artifacts.config, &self.config_source)?;
        info!(path = %artifacts.config.display(), "configuration saved");

        let text = summary_text(&self.meta, &self.config, &summary, ended_at);
        write_file(&artifacts.summary, &text)?;
        info!(path = %artifacts.summary.display(), "summary saved");

        let record = SessionRecord {
            meta: &self.meta,
            ended_at,
            config: &self.config,
            trials_recorded: self.results.len(),
            summary,
        };
        write_file(&artifacts.metadata, &serde_json::to_string_pretty(&record)?)?;

        self.flushed = true;
        Ok(Some(artifacts))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), SessionError> {
    std::fs::write(path, contents).map_err(|source| SessionError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn escape_cell(cell: &str) -> String {
    if cell.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn join_row<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| escape_cell(c.as_ref()))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// Delimited table with a header row and one row per trial.
pub fn trial_table(results: &[TrialResult]) -> String {
    let mut out = join_row(&TABLE_COLUMNS);
    out.push('\n');
    for r in results {
        out.push_str(&join_row(&r.table_row()));
        out.push('\n');
    }
    out
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

pub fn summary_text(
    meta: &SessionMeta,
    config: &ExperimentConfig,
    summary: &Summary,
    ended_at: DateTime<Local>,
) -> String {
    let p = &meta.participant;
    let ms = |d: std::time::Duration| d.as_millis();
    format!(
        "{RULE_HEAVY}\n\
         EXPERIMENT SESSION SUMMARY\n\
         {RULE_HEAVY}\n\n\
         Participant ID: {id}\n\
         Date: {date}\n\
         Start time: {start}\n\
         End time: {end}\n\
         Config file: {config_path}\n\
         Config name: {config_name}\n\
         Version: {version}\n\n\
         {RULE_LIGHT}\n\
         DEMOGRAPHICS\n\
         {RULE_LIGHT}\n\
         Age: {age}\n\
         Sex: {sex}\n\
         Phone OS: {phone_os}\n\
         Handedness: {handedness}\n\
         Vision correction: {vision}\n\
         Notes: {notes}\n\n\
         {RULE_LIGHT}\n\
         RESULTS\n\
         {RULE_LIGHT}\n\
         Training trials: {training}\n\
         Experimental trials: {experimental}\n\
         Overall accuracy: {accuracy:.1}%\n\
         Mean reaction time (correct): {mean_rt:.1} ms\n\n\
         {RULE_LIGHT}\n\
         PARAMETERS\n\
         {RULE_LIGHT}\n\
         Fixation time: {fixation} ms\n\
         Stimulus time: {stimulus} ms\n\
         Max response time: {max_response} ms\n\
         Icon in centre: {icon_in_center}\n\
         Coloured shapes: {use_colors}\n\
         Unique shapes: {unique_shapes}\n\
         Fullscreen: {fullscreen}\n",
        id = p.id,
        date = meta.started_at.format("%Y-%m-%d"),
        start = meta.started_at.format("%H:%M:%S"),
        end = ended_at.format("%H:%M:%S"),
        config_path = meta.config_path.display(),
        config_name = config.name,
        version = config.version,
        age = p.age,
        sex = p.sex,
        phone_os = p.phone_os,
        handedness = p.handedness,
        vision = p.vision,
        notes = p.notes,
        training = config.trials.training,
        experimental = summary.experimental_trials,
        accuracy = summary.accuracy_pct,
        mean_rt = summary.mean_rt_ms,
        fixation = ms(config.timing.fixation),
        stimulus = ms(config.timing.stimulus),
        max_response = ms(config.timing.max_response),
        icon_in_center = yes_no(config.icon.in_center),
        use_colors = yes_no(config.shapes.use_colors),
        unique_shapes = yes_no(config.shapes.unique_shapes),
        fullscreen = yes_no(config.display.fullscreen),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use visearch_core::{AppCategory, Feedback, ResponseKey, Shape, ShapeColor, Side, Target};

    fn result(practice: bool, correct: bool, rt: Option<f64>) -> TrialResult {
        TrialResult {
            participant_id: "p1".into(),
            trial_number: 1,
            block_number: if practice { 0 } else { 1 },
            practice,
            app_category: AppCategory::Neutral,
            app_side: Side::Right,
            target: Target::Triangle,
            icon: None,
            notification: false,
            target_position: 0,
            shapes: [
                Shape::Triangle,
                Shape::Circle,
                Shape::Square,
                Shape::Hexagon,
                Shape::Trapezoid,
                Shape::Circle,
            ],
            colors: [ShapeColor::White; 6],
            response: rt.map(|_| ResponseKey::LeftShift),
            expected_key: ResponseKey::LeftShift,
            correct,
            reaction_time_ms: rt,
            feedback: if correct { Feedback::Correct } else { Feedback::TooSlow },
        }
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let s = Summary::from_results(&[]);
        assert_eq!(s.accuracy_pct, 0.0);
        assert_eq!(s.mean_rt_ms, 0.0);

        let practice_only = Summary::from_results(&[result(true, true, Some(400.0))]);
        assert_eq!(practice_only.experimental_trials, 0);
        assert_eq!(practice_only.accuracy_pct, 0.0);
        assert_eq!(practice_only.mean_rt_ms, 0.0);
    }

    #[test]
    fn summary_ignores_practice_and_errors() {
        let results = vec![
            result(true, true, Some(100.0)),
            result(false, true, Some(400.0)),
            result(false, true, Some(600.0)),
            result(false, false, Some(900.0)),
            result(false, false, None),
        ];
        let s = Summary::from_results(&results);
        assert_eq!(s.experimental_trials, 4);
        assert_eq!(s.correct_trials, 2);
        assert_eq!(s.accuracy_pct, 50.0);
        assert_eq!(s.mean_rt_ms, 500.0);
    }

    #[test]
    fn table_has_header_and_rows() {
        let table = trial_table(&[result(false, true, Some(412.5))]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(';').count(), 27);
        assert_eq!(lines[1].split(';').count(), 27);
        assert!(lines[0].starts_with("participant_id;trial;block"));
        assert!(lines[1].contains(";412.50;"));
    }

    #[test]
    fn summary_text_lists_sections_in_order() {
        let participant = Participant {
            id: "p7".into(),
            age: "24".into(),
            sex: "f".into(),
            phone_os: "android".into(),
            handedness: "right".into(),
            vision: "none".into(),
            notes: String::new(),
        };
        let meta = SessionMeta::new(participant, "config/config_test.ini");
        let config = ExperimentConfig::default();
        let results = [result(false, true, Some(450.0)), result(false, false, None)];
        let text = summary_text(&meta, &config, &Summary::from_results(&results), Local::now());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], RULE_HEAVY);
        assert_eq!(lines[1], "EXPERIMENT SESSION SUMMARY");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Participant ID: p7");
        assert!(lines.contains(&"Phone OS: android"));
        assert!(lines.contains(&"Overall accuracy: 50.0%"));
        assert!(lines.contains(&"Mean reaction time (correct): 450.0 ms"));
        assert!(lines.contains(&"Max response time: 2000 ms"));
        assert_eq!(lines.last(), Some(&"Fullscreen: yes"));
        let order: Vec<usize> = ["DEMOGRAPHICS", "RESULTS", "PARAMETERS"]
            .iter()
            .filter_map(|h| lines.iter().position(|l| l == h))
            .collect();
        assert_eq!(order.len(), 3);
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cells_with_delimiters_are_quoted() {
        assert_eq!(escape_cell("a;b"), "\"a;b\"");
        assert_eq!(escape_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_cell("plain"), "plain");
    }
}
