use crate::error::{ConfigError, ConfigErrors, FieldError};
use ini::{Ini, ParseOption};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use visearch_core::Version;

/// Sectioned `key = value` document.
///
/// Section and key names are case-insensitive. Lines starting with `#` or
/// `;` are comments, and indented lines continue the previous value. Keys
/// outside any section are ignored.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    ini: Ini,
}

impl IniDocument {
    /// Parses `text`; a document that cannot be read at all yields an
    /// empty one, so every field falls back to its default.
    pub fn parse(text: &str) -> Self {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            enabled_indented_mutiline_value: true,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, opt).unwrap_or_else(|e| {
            warn!(error = %e, "unreadable config, using defaults");
            Ini::new()
        });
        Self { ini }
    }

    /// Value of `key` in `section`; the last occurrence wins.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini
            .section_all(Some(section))
            .flat_map(|props| props.get_all(key))
            .last()
            .map(str::trim)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub fullscreen: bool,
    pub screen_width: u32,
    pub screen_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSettings {
    pub in_center: bool,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSettings {
    pub use_colors: bool,
    pub unique_shapes: bool,
    pub target_size: f32,
    pub distractor_size: f32,
    pub fixation_size: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    pub fixation: Duration,
    pub stimulus: Duration,
    pub max_response: Duration,
    pub feedback: Duration,
}

impl TimingSettings {
    /// How long the response window stays open after the stimulus is gone.
    pub fn response_window(&self) -> Duration {
        self.max_response.saturating_sub(self.stimulus)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialCounts {
    pub training: usize,
    pub experimental: usize,
    pub blocks: usize,
}

impl TrialCounts {
    /// Integer division; an uneven split silently drops the remainder.
    pub fn trials_per_block(&self) -> usize {
        self.experimental.checked_div(self.blocks).unwrap_or(0)
    }
}

/// Experiment parameters, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub description: String,
    pub display: DisplaySettings,
    pub version: Version,
    pub icon: IconSettings,
    pub shapes: ShapeSettings,
    pub timing: TimingSettings,
    pub trials: TrialCounts,
    pub show_feedback: bool,
    pub social_apps: Vec<String>,
    pub neutral_apps: Vec<String>,
}

const DEFAULT_SOCIAL_APPS: &str = "tiktok.png, messenger.png, instagram.png";
const DEFAULT_NEUTRAL_APPS: &str = "calculator.png, calendar.png, weather.png";
const FULL_NEUTRAL_APPS: &str =
    "calculator.png, calendar.png, weather.png, notes.png, clock.png, maps.png";

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "badanie".to_string(),
            description: String::new(),
            display: DisplaySettings {
                fullscreen: true,
                screen_width: 1920,
                screen_height: 1080,
            },
            version: Version::A,
            icon: IconSettings {
                in_center: true,
                size: 0.04,
            },
            shapes: ShapeSettings {
                use_colors: false,
                unique_shapes: true,
                target_size: 0.06,
                distractor_size: 0.06,
                fixation_size: 0.008,
                radius: 0.25,
            },
            timing: TimingSettings {
                fixation: Duration::from_millis(500),
                stimulus: Duration::from_millis(100),
                max_response: Duration::from_millis(2000),
                feedback: Duration::from_millis(500),
            },
            trials: TrialCounts {
                training: 32,
                experimental: 320,
                blocks: 4,
            },
            show_feedback: true,
            social_apps: split_list(DEFAULT_SOCIAL_APPS),
            neutral_apps: split_list(DEFAULT_NEUTRAL_APPS),
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split([',', '\n'])
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn parse_secs(s: &str) -> Option<Duration> {
    s.trim()
        .parse::<f64>()
        .ok()
        .and_then(|v| Duration::try_from_secs_f64(v).ok())
}

/// Typed lookups that fall back to a default and warn on garbage
struct Fallback<'a> {
    doc: &'a IniDocument,
}

impl Fallback<'_> {
    fn value<T>(&self, section: &str, key: &str, default: T, parse: impl Fn(&str) -> Option<T>) -> T {
        match self.doc.get(section, key) {
            None => default,
            Some(raw) => parse(raw).unwrap_or_else(|| {
                warn!(section, key, value = raw, "malformed config value, using default");
                default
            }),
        }
    }

    fn string(&self, section: &str, key: &str, default: &str) -> String {
        self.doc
            .get(section, key)
            .unwrap_or(default)
            .to_string()
    }

    fn bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.value(section, key, default, parse_bool)
    }

    fn parsed<T: FromStr>(&self, section: &str, key: &str, default: T) -> T {
        self.value(section, key, default, |s| s.trim().parse().ok())
    }

    fn secs(&self, section: &str, key: &str, default: Duration) -> Duration {
        self.value(section, key, default, parse_secs)
    }
}

impl ExperimentConfig {
    /// Reads every field, substituting the default for anything missing or
    /// malformed. Never fails.
    pub fn from_ini(doc: &IniDocument) -> Self {
        let d = Self::default();
        let r = Fallback { doc };

        let version = r.value("version", "version", d.version, |s| s.parse().ok());

        Self {
            name: r.string("experiment", "name", &d.name),
            description: r.string("experiment", "description", &d.description),
            display: DisplaySettings {
                fullscreen: r.bool("display", "fullscreen", d.display.fullscreen),
                screen_width: r.parsed("display", "screen_width", d.display.screen_width),
                screen_height: r.parsed("display", "screen_height", d.display.screen_height),
            },
            version,
            icon: IconSettings {
                in_center: r.bool("icon", "icon_in_center", d.icon.in_center),
                size: r.parsed("icon", "icon_size", d.icon.size),
            },
            shapes: ShapeSettings {
                use_colors: r.bool("shapes", "use_colors", d.shapes.use_colors),
                unique_shapes: r.bool("shapes", "unique_shapes", d.shapes.unique_shapes),
                target_size: r.parsed("shapes", "target_size", d.shapes.target_size),
                distractor_size: r.parsed("shapes", "distractor_size", d.shapes.distractor_size),
                fixation_size: r.parsed("shapes", "fixation_size", d.shapes.fixation_size),
                radius: r.parsed("shapes", "radius", d.shapes.radius),
            },
            timing: TimingSettings {
                fixation: r.secs("timing", "fixation_time", d.timing.fixation),
                stimulus: r.secs("timing", "stimulus_time", d.timing.stimulus),
                max_response: r.secs("timing", "max_response_time", d.timing.max_response),
                feedback: r.secs("timing", "feedback_time", d.timing.feedback),
            },
            trials: TrialCounts {
                training: r.parsed("trials", "n_training_trials", d.trials.training),
                experimental: r.parsed("trials", "n_experimental_trials", d.trials.experimental),
                blocks: r.parsed("trials", "n_blocks", d.trials.blocks),
            },
            show_feedback: r.bool("feedback", "show_feedback", d.show_feedback),
            social_apps: split_list(&r.string("apps", "social_apps", DEFAULT_SOCIAL_APPS)),
            neutral_apps: split_list(&r.string("apps", "neutral_apps", DEFAULT_NEUTRAL_APPS)),
        }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_ini(&IniDocument::parse(text))
    }

    pub fn trials_per_block(&self) -> usize {
        self.trials.trials_per_block()
    }

    /// Renders this configuration in the format `from_ini` reads.
    pub fn to_ini(&self) -> String {
        let secs = |d: Duration| d.as_secs_f64();
        format!(
            "# ==================== {name} ====================\n\
             [experiment]\n\
             name = {name}\n\
             description = {description}\n\
             \n\
             [display]\n\
             fullscreen = {fullscreen}\n\
             screen_width = {screen_width}\n\
             screen_height = {screen_height}\n\
             \n\
             [version]\n\
             # A: Left Shift = triangle, Right Shift = diamond\n\
             # B: Left Shift = diamond, Right Shift = triangle\n\
             version = {version}\n\
             \n\
             [icon]\n\
             icon_in_center = {icon_in_center}\n\
             icon_size = {icon_size}\n\
             \n\
             [shapes]\n\
             use_colors = {use_colors}\n\
             unique_shapes = {unique_shapes}\n\
             target_size = {target_size}\n\
             distractor_size = {distractor_size}\n\
             fixation_size = {fixation_size}\n\
             radius = {radius}\n\
             \n\
             [timing]\n\
             fixation_time = {fixation_time}\n\
             stimulus_time = {stimulus_time}\n\
             max_response_time = {max_response_time}\n\
             feedback_time = {feedback_time}\n\
             \n\
             [trials]\n\
             n_training_trials = {training}\n\
             n_experimental_trials = {experimental}\n\
             n_blocks = {blocks}\n\
             \n\
             [feedback]\n\
             show_feedback = {show_feedback}\n\
             \n\
             [apps]\n\
             social_apps = {social_apps}\n\
             neutral_apps = {neutral_apps}\n",
            name = self.name,
            description = self.description,
            fullscreen = self.display.fullscreen,
            screen_width = self.display.screen_width,
            screen_height = self.display.screen_height,
            version = self.version,
            icon_in_center = self.icon.in_center,
            icon_size = self.icon.size,
            use_colors = self.shapes.use_colors,
            unique_shapes = self.shapes.unique_shapes,
            target_size = self.shapes.target_size,
            distractor_size = self.shapes.distractor_size,
            fixation_size = self.shapes.fixation_size,
            radius = self.shapes.radius,
            fixation_time = secs(self.timing.fixation),
            stimulus_time = secs(self.timing.stimulus),
            max_response_time = secs(self.timing.max_response),
            feedback_time = secs(self.timing.feedback),
            training = self.trials.training,
            experimental = self.trials.experimental,
            blocks = self.trials.blocks,
            show_feedback = self.show_feedback,
            social_apps = self.social_apps.join(", "),
            neutral_apps = self.neutral_apps.join(", "),
        )
    }
}

/// A configuration together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    /// Verbatim file contents, copied into the session output
    pub source: String,
    pub config: ExperimentConfig,
}

impl LoadedConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = ExperimentConfig::parse(&source);
        info!(
            path = %path.display(),
            name = %config.name,
            version = %config.version,
            training = config.trials.training,
            experimental = config.trials.experimental,
            "loaded configuration"
        );
        Ok(Self {
            path,
            source,
            config,
        })
    }
}

/// Built-in configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Shortened run for checking the setup
    Test,
    /// Full study session
    Study,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Test, Preset::Study];

    pub fn file_name(&self) -> &'static str {
        match self {
            Preset::Test => "config_test.ini",
            Preset::Study => "config_study.ini",
        }
    }

    pub fn config(&self) -> ExperimentConfig {
        let base = ExperimentConfig {
            neutral_apps: split_list(FULL_NEUTRAL_APPS),
            ..ExperimentConfig::default()
        };
        match self {
            Preset::Test => ExperimentConfig {
                name: "test".into(),
                description: "Test mode - shortened session".into(),
                display: DisplaySettings {
                    fullscreen: false,
                    ..base.display.clone()
                },
                trials: TrialCounts {
                    training: 8,
                    experimental: 32,
                    blocks: 2,
                },
                ..base
            },
            Preset::Study => ExperimentConfig {
                name: "study".into(),
                description: "Full experimental session".into(),
                ..base
            },
        }
    }
}

/// Lists `config_*.ini` files in `dir`, sorted by name.
pub fn find_config_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("config_") && n.ends_with(".ini"))
        })
        .collect();
    files.sort();
    files
}

/// Writes the presets into `dir` when it holds no configuration yet.
pub fn ensure_presets(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let existing = find_config_files(dir);
    if !existing.is_empty() {
        return Ok(existing);
    }
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    for preset in Preset::ALL {
        let path = dir.join(preset.file_name());
        write_config(&path, &preset.config())?;
        info!(path = %path.display(), "created default configuration");
    }
    Ok(find_config_files(dir))
}

pub fn write_config(path: &Path, config: &ExperimentConfig) -> Result<(), ConfigError> {
    std::fs::write(path, config.to_ini()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Raw, unvalidated field values for building a configuration by hand
#[derive(Debug, Clone, Default)]
pub struct ConfigInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub fullscreen: Option<String>,
    pub screen_width: Option<String>,
    pub screen_height: Option<String>,
    pub icon_in_center: Option<String>,
    pub icon_size: Option<String>,
    pub use_colors: Option<String>,
    pub unique_shapes: Option<String>,
    pub target_size: Option<String>,
    pub distractor_size: Option<String>,
    pub fixation_size: Option<String>,
    pub radius: Option<String>,
    pub fixation_time: Option<String>,
    pub stimulus_time: Option<String>,
    pub max_response_time: Option<String>,
    pub feedback_time: Option<String>,
    pub n_training_trials: Option<String>,
    pub n_experimental_trials: Option<String>,
    pub n_blocks: Option<String>,
    pub show_feedback: Option<String>,
    pub social_apps: Option<String>,
    pub neutral_apps: Option<String>,
}

/// Collects field errors instead of stopping at the first one
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn field<T>(
        &mut self,
        field: &'static str,
        raw: &Option<String>,
        default: T,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> T
    where
        T: Clone,
    {
        match raw {
            None => default,
            Some(s) => match parse(s) {
                Ok(v) => v,
                Err(message) => {
                    self.fail(field, message);
                    default
                }
            },
        }
    }

    fn bool(&mut self, field: &'static str, raw: &Option<String>, default: bool) -> bool {
        self.field(field, raw, default, |s| {
            parse_bool(s).ok_or_else(|| format!("'{s}' is not a boolean"))
        })
    }

    fn count(&mut self, field: &'static str, raw: &Option<String>, default: usize) -> usize {
        self.field(field, raw, default, |s| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| format!("'{s}' is not a non-negative integer"))
        })
    }

    fn size(&mut self, field: &'static str, raw: &Option<String>, default: f32) -> f32 {
        self.field(field, raw, default, |s| match s.trim().parse::<f32>() {
            Ok(v) if v > 0.0 && v.is_finite() => Ok(v),
            Ok(_) => Err(format!("'{s}' must be positive")),
            Err(_) => Err(format!("'{s}' is not a number")),
        })
    }

    fn secs(&mut self, field: &'static str, raw: &Option<String>, default: Duration) -> Duration {
        self.field(field, raw, default, |s| match s.trim().parse::<f64>() {
            Ok(v) if v > 0.0 && v.is_finite() => Ok(Duration::from_secs_f64(v)),
            Ok(_) => Err(format!("'{s}' must be a positive number of seconds")),
            Err(_) => Err(format!("'{s}' is not a number")),
        })
    }
}

impl ConfigInput {
    /// Validates every present field; absent fields take their defaults.
    pub fn build(&self) -> Result<ExperimentConfig, ConfigErrors> {
        let d = ExperimentConfig::default();
        let mut c = Checker::default();

        let name = match &self.name {
            Some(n) if n.trim().is_empty() => {
                c.fail("name", "must not be empty");
                d.name.clone()
            }
            Some(n) if n.contains(['/', '\\']) => {
                c.fail("name", "must not contain path separators");
                d.name.clone()
            }
            Some(n) => n.trim().to_string(),
            None => d.name.clone(),
        };
        let version = c.field("version", &self.version, d.version, |s| s.parse());
        let screen_width = c.field("screen_width", &self.screen_width, d.display.screen_width, |s| {
            match s.trim().parse::<u32>() {
                Ok(v) if v > 0 => Ok(v),
                _ => Err(format!("'{s}' is not a positive integer")),
            }
        });
        let screen_height =
            c.field("screen_height", &self.screen_height, d.display.screen_height, |s| {
                match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => Ok(v),
                    _ => Err(format!("'{s}' is not a positive integer")),
                }
            });

        let timing = TimingSettings {
            fixation: c.secs("fixation_time", &self.fixation_time, d.timing.fixation),
            stimulus: c.secs("stimulus_time", &self.stimulus_time, d.timing.stimulus),
            max_response: c.secs(
                "max_response_time",
                &self.max_response_time,
                d.timing.max_response,
            ),
            feedback: c.secs("feedback_time", &self.feedback_time, d.timing.feedback),
        };
        if timing.stimulus >= timing.max_response {
            c.fail(
                "max_response_time",
                "must be longer than stimulus_time",
            );
        }

        let trials = TrialCounts {
            training: c.count("n_training_trials", &self.n_training_trials, d.trials.training),
            experimental: c.count(
                "n_experimental_trials",
                &self.n_experimental_trials,
                d.trials.experimental,
            ),
            blocks: c.count("n_blocks", &self.n_blocks, d.trials.blocks),
        };
        if trials.blocks == 0 {
            c.fail("n_blocks", "must be at least 1");
        }

        let config = ExperimentConfig {
            name,
            description: self.description.clone().unwrap_or(d.description),
            display: DisplaySettings {
                fullscreen: c.bool("fullscreen", &self.fullscreen, d.display.fullscreen),
                screen_width,
                screen_height,
            },
            version,
            icon: IconSettings {
                in_center: c.bool("icon_in_center", &self.icon_in_center, d.icon.in_center),
                size: c.size("icon_size", &self.icon_size, d.icon.size),
            },
            shapes: ShapeSettings {
                use_colors: c.bool("use_colors", &self.use_colors, d.shapes.use_colors),
                unique_shapes: c.bool("unique_shapes", &self.unique_shapes, d.shapes.unique_shapes),
                target_size: c.size("target_size", &self.target_size, d.shapes.target_size),
                distractor_size: c.size(
                    "distractor_size",
                    &self.distractor_size,
                    d.shapes.distractor_size,
                ),
                fixation_size: c.size("fixation_size", &self.fixation_size, d.shapes.fixation_size),
                radius: c.size("radius", &self.radius, d.shapes.radius),
            },
            timing,
            trials,
            show_feedback: c.bool("show_feedback", &self.show_feedback, d.show_feedback),
            social_apps: self
                .social_apps
                .as_deref()
                .map(split_list)
                .unwrap_or(d.social_apps),
            neutral_apps: self
                .neutral_apps
                .as_deref()
                .map(split_list)
                .unwrap_or(d.neutral_apps),
        };

        if c.errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigErrors(c.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# comment
[Experiment]
name = pilot
description = first pilot

[display]
fullscreen = False
screen_width = 1280

[version]
version = b

[timing]
fixation_time = 0.25
stimulus_time = oops

[trials]
n_experimental_trials = 32
n_blocks = 4

[apps]
social_apps = a.png, , b.png
";

    #[test]
    fn reads_values_and_falls_back() {
        let cfg = ExperimentConfig::parse(SAMPLE);
        assert_eq!(cfg.name, "pilot");
        assert_eq!(cfg.description, "first pilot");
        assert!(!cfg.display.fullscreen);
        assert_eq!(cfg.display.screen_width, 1280);
        assert_eq!(cfg.display.screen_height, 1080);
        assert_eq!(cfg.version, Version::B);
        assert_eq!(cfg.timing.fixation, Duration::from_millis(250));
        // malformed value keeps the default
        assert_eq!(cfg.timing.stimulus, Duration::from_millis(100));
        assert_eq!(cfg.trials_per_block(), 8);
        assert_eq!(cfg.trials.training, 32);
        assert_eq!(cfg.social_apps, vec!["a.png", "b.png"]);
        assert_eq!(cfg.neutral_apps.len(), 3);
    }

    #[test]
    fn indented_lines_continue_a_value() {
        let cfg = ExperimentConfig::parse(
            "[apps]\nsocial_apps = tiktok.png,\n    messenger.png,\n    instagram.png\n\n[Trials]\nN_Blocks: 2\n",
        );
        assert_eq!(cfg.social_apps, vec!["tiktok.png", "messenger.png", "instagram.png"]);
        assert_eq!(cfg.trials.blocks, 2);
    }

    #[test]
    fn later_duplicates_override() {
        let cfg = ExperimentConfig::parse(
            "[trials]\nn_blocks = 2\nn_blocks = 5\n[TRIALS]\nn_training_trials = 16\n",
        );
        assert_eq!(cfg.trials.blocks, 5);
        assert_eq!(cfg.trials.training, 16);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ExperimentConfig::parse(""), ExperimentConfig::default());
    }

    #[test]
    fn uneven_blocks_truncate() {
        let cfg = ExperimentConfig::parse("[trials]\nn_experimental_trials = 30\nn_blocks = 4\n");
        assert_eq!(cfg.trials_per_block(), 7);
        let zero = ExperimentConfig::parse("[trials]\nn_blocks = 0\n");
        assert_eq!(zero.trials_per_block(), 0);
    }

    #[test]
    fn rendered_ini_reads_back() {
        for preset in Preset::ALL {
            let cfg = preset.config();
            assert_eq!(ExperimentConfig::parse(&cfg.to_ini()), cfg);
        }
    }

    #[test]
    fn negative_durations_fall_back() {
        let cfg = ExperimentConfig::parse("[timing]\nfeedback_time = -1\n");
        assert_eq!(cfg.timing.feedback, Duration::from_millis(500));
    }

    #[test]
    fn response_window_excludes_stimulus() {
        let cfg = ExperimentConfig::default();
        assert_eq!(cfg.timing.response_window(), Duration::from_millis(1900));
    }

    #[test]
    fn builder_accepts_defaults() {
        assert_eq!(ConfigInput::default().build(), Ok(ExperimentConfig::default()));
    }

    #[test]
    fn builder_reports_every_bad_field() {
        let input = ConfigInput {
            name: Some("  ".into()),
            version: Some("C".into()),
            radius: Some("-0.2".into()),
            n_blocks: Some("0".into()),
            stimulus_time: Some("3".into()),
            fullscreen: Some("maybe".into()),
            ..ConfigInput::default()
        };
        let errors = input.build().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        for f in [
            "name",
            "version",
            "radius",
            "n_blocks",
            "max_response_time",
            "fullscreen",
        ] {
            assert!(fields.contains(&f), "missing error for {f}: {errors}");
        }
    }

    #[test]
    fn builder_parses_custom_values() {
        let input = ConfigInput {
            name: Some("custom".into()),
            version: Some("B".into()),
            n_training_trials: Some("16".into()),
            n_experimental_trials: Some("64".into()),
            n_blocks: Some("2".into()),
            show_feedback: Some("False".into()),
            use_colors: Some("True".into()),
            ..ConfigInput::default()
        };
        let cfg = input.build().unwrap();
        assert_eq!(cfg.name, "custom");
        assert_eq!(cfg.version, Version::B);
        assert_eq!(cfg.trials_per_block(), 32);
        assert!(!cfg.show_feedback);
        assert!(cfg.shapes.use_colors);
    }
}
