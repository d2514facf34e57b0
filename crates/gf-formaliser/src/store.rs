//! Output layout for prompts, artifacts and session logs.
//!
//! ```text
//! <out_dir>/
//!   prompts/  <game>_prompt_<timestamp>_r<rep>.txt
//!   axioms/   <game>_game_axioms_<timestamp>_r<rep>_a<attempt>.pl
//!   logs/     log_<game>_<timestamp>_r<rep>[_<OUTCOME>].txt
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use gf_core::FormalizationOutcome;

/// Timestamp format used in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// Identifies one formalisation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// Game file stem
    pub game: String,
    /// Batch timestamp
    pub timestamp: String,
    /// Repetition index within the batch
    pub repetition: u32,
}

impl SessionId {
    pub fn new(game: impl Into<String>, timestamp: impl Into<String>, repetition: u32) -> Self {
        Self {
            game: game.into(),
            timestamp: timestamp.into(),
            repetition,
        }
    }

    /// Session for a game file, stamped with the given time.
    pub fn for_game_file(path: &Path, at: DateTime<Local>, repetition: u32) -> Self {
        let game = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "game".to_string());
        Self::new(game, at.format(TIMESTAMP_FORMAT).to_string(), repetition)
    }

    fn stem(&self) -> String {
        format!("{}_{}_r{}", self.game, self.timestamp, self.repetition)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.game, self.timestamp, self.repetition)
    }
}

/// Where session files live.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join("prompts")
    }

    pub fn axioms_dir(&self) -> PathBuf {
        self.root.join("axioms")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Create the directory layout.
    pub async fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [self.prompts_dir(), self.axioms_dir(), self.logs_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    pub fn prompt_path(&self, session: &SessionId) -> PathBuf {
        self.prompts_dir().join(format!(
            "{}_prompt_{}_r{}.txt",
            session.game, session.timestamp, session.repetition
        ))
    }

    pub fn artifact_path(&self, session: &SessionId, attempt_index: u32) -> PathBuf {
        self.axioms_dir().join(format!(
            "{}_game_axioms_{}_r{}_a{}.pl",
            session.game, session.timestamp, session.repetition, attempt_index
        ))
    }

    /// Log path while the session is running.
    pub fn log_path(&self, session: &SessionId) -> PathBuf {
        self.logs_dir().join(format!("log_{}.txt", session.stem()))
    }

    /// Log path once the outcome is known.
    pub fn tagged_log_path(&self, session: &SessionId, outcome: FormalizationOutcome) -> PathBuf {
        self.logs_dir()
            .join(format!("log_{}_{}.txt", session.stem(), outcome.name()))
    }

    /// Persist the rendered instruction prompt.
    pub async fn write_prompt(&self, session: &SessionId, prompt: &str) -> std::io::Result<PathBuf> {
        let path = self.prompt_path(session);
        tokio::fs::write(&path, prompt).await?;
        Ok(path)
    }

    /// Persist one attempt's artifact.
    pub async fn write_artifact(
        &self,
        session: &SessionId,
        attempt_index: u32,
        artifact: &str,
    ) -> std::io::Result<PathBuf> {
        let path = self.artifact_path(session, attempt_index);
        tokio::fs::write(&path, artifact).await?;
        Ok(path)
    }

    /// Rename the session log to carry its outcome.
    pub async fn tag_log(
        &self,
        session: &SessionId,
        outcome: FormalizationOutcome,
    ) -> std::io::Result<PathBuf> {
        let tagged = self.tagged_log_path(session, outcome);
        tokio::fs::rename(self.log_path(session), &tagged).await?;
        Ok(tagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session() -> SessionId {
        SessionId::new("tic_tac_toe", "20240102_0304", 1)
    }

    #[test]
    fn test_session_from_game_file() {
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = SessionId::for_game_file(Path::new("DATA/games/tic_tac_toe.txt"), at, 1);
        assert_eq!(id, session());
        assert_eq!(id.to_string(), "tic_tac_toe@20240102_0304#1");
    }

    #[test]
    fn test_paths_are_attempt_addressable() {
        let store = ArtifactStore::new("OUTPUT");
        let id = session();
        assert_eq!(
            store.artifact_path(&id, 0),
            PathBuf::from("OUTPUT/axioms/tic_tac_toe_game_axioms_20240102_0304_r1_a0.pl")
        );
        assert_ne!(store.artifact_path(&id, 0), store.artifact_path(&id, 1));
        assert_eq!(
            store.tagged_log_path(&id, FormalizationOutcome::Fixed),
            PathBuf::from("OUTPUT/logs/log_tic_tac_toe_20240102_0304_r1_FIXED.txt")
        );
    }

    #[tokio::test]
    async fn test_write_and_tag() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.ensure_layout().await.unwrap();
        let id = session();

        let artifact = store.write_artifact(&id, 2, "player(x).\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(artifact).unwrap(), "player(x).\n");

        let prompt = store.write_prompt(&id, "Formalise tic-tac-toe").await.unwrap();
        assert!(prompt.exists());

        std::fs::write(store.log_path(&id), "###PROMPT##\n~\n").unwrap();
        let tagged = store.tag_log(&id, FormalizationOutcome::Correct).await.unwrap();
        assert!(tagged.exists());
        assert!(!store.log_path(&id).exists());
    }
}
