pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod instructions;
pub mod layout;
pub mod participant;
pub mod session;
pub mod state;
pub mod trials;

pub use classify::{Classification, Response, classify};
pub use config::{
    ConfigInput, ExperimentConfig, IniDocument, LoadedConfig, Preset, ensure_presets,
    find_config_files, write_config,
};
pub use error::{ConfigError, ConfigErrors, FieldError, SessionError};
pub use executor::{TrialContext, TrialDurations, TrialEvent, TrialRun, start_trial};
pub use instructions::Page;
pub use layout::{DistractorPolicy, IconPool, generate_layout};
pub use participant::{IdProblem, Participant, check_id, participant_exists};
pub use session::{SessionArtifacts, SessionMeta, SessionRecorder, Summary};
pub use state::{ExperimentEvent, ExperimentStateMachine, Step, build_plan};
pub use trials::{block_ranges, build_trials, experimental_trials, training_trials};
