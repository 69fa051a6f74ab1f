use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identifier and demographic answers collected before the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub age: String,
    pub sex: String,
    pub phone_os: String,
    pub handedness: String,
    pub vision: String,
    pub notes: String,
}

impl Participant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Why an identifier cannot be used for a new session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdProblem {
    Empty,
    /// Contains characters that cannot appear in an output file name
    Invalid,
    AlreadyUsed,
}

/// True when a trial table for `id` already exists in `output_dir`.
pub fn participant_exists(output_dir: &Path, id: &str) -> bool {
    let prefix = format!("result_{id}_");
    let Ok(entries) = std::fs::read_dir(output_dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|e| {
        e.file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".csv"))
    })
}

pub fn check_id(output_dir: &Path, id: &str) -> Result<(), IdProblem> {
    let id = id.trim();
    if id.is_empty() {
        return Err(IdProblem::Empty);
    }
    if id.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']) {
        return Err(IdProblem::Invalid);
    }
    if participant_exists(output_dir, id) {
        return Err(IdProblem::AlreadyUsed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_existing_results() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("result_p07_2026-01-01_10-00-00.csv"), "").unwrap();
        std::fs::write(dir.path().join("summary_p08_2026-01-01_10-00-00.txt"), "").unwrap();

        assert!(participant_exists(dir.path(), "p07"));
        assert!(!participant_exists(dir.path(), "p08"));
        assert!(!participant_exists(dir.path(), "p0"));
        assert_eq!(check_id(dir.path(), "p07"), Err(IdProblem::AlreadyUsed));
        assert_eq!(check_id(dir.path(), "p08"), Ok(()));
    }

    #[test]
    fn rejects_unusable_ids() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_id(dir.path(), "  "), Err(IdProblem::Empty));
        assert_eq!(check_id(dir.path(), "a/b"), Err(IdProblem::Invalid));
    }

    #[test]
    fn missing_directory_has_no_participants() {
        assert!(!participant_exists(Path::new("/nonexistent/visearch"), "p1"));
    }
}
