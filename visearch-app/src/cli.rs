use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use visearch_experiment::{
    ConfigInput, IdProblem, LoadedConfig, Participant, Preset, check_id, ensure_presets,
    find_config_files, write_config,
};

#[derive(Parser)]
#[command(name = "visearch", version, about = "Visual search reaction-time experiment")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file to run
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Directory searched for config_*.ini files
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    #[arg(long)]
    pub participant: Option<String>,

    #[command(flatten)]
    pub demographics: Demographics,

    /// Where result tables and summaries are written
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Directory the configured icon files are resolved against
    #[arg(long, default_value = ".")]
    pub icons_dir: PathBuf,

    /// TrueType font for instructions and feedback
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Run in a window even if the configuration asks for fullscreen
    #[arg(long)]
    pub windowed: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Demographics {
    #[arg(long, default_value = "")]
    pub age: String,
    #[arg(long, default_value = "")]
    pub sex: String,
    #[arg(long, default_value = "")]
    pub phone_os: String,
    #[arg(long, default_value = "")]
    pub handedness: String,
    #[arg(long, default_value = "")]
    pub vision: String,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PresetArg {
    Test,
    Study,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Test => Preset::Test,
            PresetArg::Study => Preset::Study,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a custom configuration and save it as config_<name>.ini
    NewConfig(NewConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NewConfigArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Counterbalancing version, A or B
    #[arg(long = "design-version")]
    pub design_version: Option<String>,
    #[arg(long)]
    pub fullscreen: Option<String>,
    #[arg(long)]
    pub screen_width: Option<String>,
    #[arg(long)]
    pub screen_height: Option<String>,
    #[arg(long)]
    pub icon_in_center: Option<String>,
    #[arg(long)]
    pub icon_size: Option<String>,
    #[arg(long)]
    pub use_colors: Option<String>,
    #[arg(long)]
    pub unique_shapes: Option<String>,
    #[arg(long)]
    pub target_size: Option<String>,
    #[arg(long)]
    pub distractor_size: Option<String>,
    #[arg(long)]
    pub fixation_size: Option<String>,
    #[arg(long)]
    pub radius: Option<String>,
    #[arg(long)]
    pub fixation_time: Option<String>,
    #[arg(long)]
    pub stimulus_time: Option<String>,
    #[arg(long)]
    pub max_response_time: Option<String>,
    #[arg(long)]
    pub feedback_time: Option<String>,
    #[arg(long)]
    pub n_training_trials: Option<String>,
    #[arg(long)]
    pub n_experimental_trials: Option<String>,
    #[arg(long)]
    pub n_blocks: Option<String>,
    #[arg(long)]
    pub show_feedback: Option<String>,
    #[arg(long)]
    pub social_apps: Option<String>,
    #[arg(long)]
    pub neutral_apps: Option<String>,
}

impl From<NewConfigArgs> for ConfigInput {
    fn from(a: NewConfigArgs) -> Self {
        ConfigInput {
            name: Some(a.name),
            description: a.description,
            version: a.design_version,
            fullscreen: a.fullscreen,
            screen_width: a.screen_width,
            screen_height: a.screen_height,
            icon_in_center: a.icon_in_center,
            icon_size: a.icon_size,
            use_colors: a.use_colors,
            unique_shapes: a.unique_shapes,
            target_size: a.target_size,
            distractor_size: a.distractor_size,
            fixation_size: a.fixation_size,
            radius: a.radius,
            fixation_time: a.fixation_time,
            stimulus_time: a.stimulus_time,
            max_response_time: a.max_response_time,
            feedback_time: a.feedback_time,
            n_training_trials: a.n_training_trials,
            n_experimental_trials: a.n_experimental_trials,
            n_blocks: a.n_blocks,
            show_feedback: a.show_feedback,
            social_apps: a.social_apps,
            neutral_apps: a.neutral_apps,
        }
    }
}

/// Builds a configuration from the arguments and writes it into `dir`.
pub fn new_config(dir: &Path, args: NewConfigArgs) -> Result<PathBuf> {
    let input = ConfigInput::from(args);
    let config = match input.build() {
        Ok(c) => c,
        Err(errors) => {
            for e in &errors.0 {
                warn!(field = e.field, "{}", e.message);
            }
            return Err(errors.into());
        }
    };

    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("config_{}.ini", config.name));
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    write_config(&path, &config)?;
    info!(path = %path.display(), "configuration saved");
    Ok(path)
}

/// Picks the configuration to run: an explicit file, a preset, or the
/// first file in the config directory (seeded with the presets).
pub fn resolve_config(cli: &Cli) -> Result<LoadedConfig> {
    if let Some(path) = &cli.config {
        return Ok(LoadedConfig::load(path)?);
    }

    let available = ensure_presets(&cli.config_dir)?;
    if let Some(preset) = cli.preset {
        let preset = Preset::from(preset);
        let path = cli.config_dir.join(preset.file_name());
        if !path.exists() {
            write_config(&path, &preset.config())?;
        }
        return Ok(LoadedConfig::load(path)?);
    }

    for path in &available {
        info!(path = %path.display(), "configuration available");
    }
    let first = find_config_files(&cli.config_dir)
        .into_iter()
        .next()
        .with_context(|| format!("no config_*.ini in {}", cli.config_dir.display()))?;
    Ok(LoadedConfig::load(first)?)
}

fn describe(problem: IdProblem) -> &'static str {
    match problem {
        IdProblem::Empty => "the participant ID cannot be empty",
        IdProblem::Invalid => "the participant ID contains characters not allowed in file names",
        IdProblem::AlreadyUsed => "results for this participant ID already exist",
    }
}

/// Collects a fresh participant ID, asking on stdin until one is usable.
pub fn participant(cli: &Cli) -> Result<Participant> {
    let stdin = std::io::stdin();
    let mut candidate = cli.participant.clone();

    let id = loop {
        if let Some(id) = candidate.take() {
            match check_id(&cli.output_dir, &id) {
                Ok(()) => break id.trim().to_string(),
                Err(problem) => warn!(id = %id.trim(), "{}", describe(problem)),
            }
        }

        print!("Participant ID: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no participant ID given");
        }
        candidate = Some(line);
    };

    let d = &cli.demographics;
    Ok(Participant {
        id,
        age: d.age.clone(),
        sex: d.sex.clone(),
        phone_os: d.phone_os.clone(),
        handedness: d.handedness.clone(),
        vision: d.vision.clone(),
        notes: d.notes.clone(),
    })
}
