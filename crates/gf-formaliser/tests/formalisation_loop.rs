//! End-to-end behaviour of the formalisation loop with scripted collaborators.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gf_core::{Conversation, FormalizationOutcome, Message, Role, SolverQuery, ValidationResult};
use gf_formaliser::{
    parse_log, ArtifactStore, FeedbackComposer, FormaliseError, FormalizationLoop, Generator,
    GeneratorError, LogEntry, LoopConfig, SessionId, SessionLog,
};
use gf_solver::SolverGateway;
use tempfile::TempDir;

const TEMPLATE: &str = "Formalise the following game in Prolog between @ signs.\n{game_description}\n";
const BAD_TRACE: &str = "ERROR: game.pl:1:4: Syntax error: Operator expected";

/// Replies from a fixed script and records what it was sent.
struct ScriptedGenerator {
    replies: VecDeque<String>,
    conversation: Conversation,
    sent: Vec<Vec<Message>>,
    clears: usize,
}

impl ScriptedGenerator {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            conversation: Conversation::new(None, true),
            sent: Vec::new(),
            clears: 0,
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn prompt(&mut self, instruction: &str, _max_tokens: u32) -> Result<String, GeneratorError> {
        self.conversation.push_user(instruction);
        self.sent.push(self.conversation.messages().to_vec());
        self.replies
            .pop_front()
            .ok_or_else(|| GeneratorError::EmptyResponse("scripted".to_string()))
    }

    fn add_response(&mut self, text: &str) {
        self.conversation.push_assistant(text);
    }

    fn clear_context(&mut self) {
        self.clears += 1;
        self.conversation.clear();
    }
}

/// Rejects any persisted artifact containing `bad`.
struct ContentGateway {
    base: PathBuf,
    queries: Mutex<Vec<SolverQuery>>,
}

impl ContentGateway {
    fn new(base: PathBuf) -> Self {
        Self {
            base,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SolverGateway for ContentGateway {
    fn name(&self) -> &str {
        "content"
    }

    fn base_program(&self) -> &Path {
        &self.base
    }

    async fn validate(&self, query: &SolverQuery) -> ValidationResult {
        self.queries.lock().unwrap().push(query.clone());
        match std::fs::read_to_string(query.artifact()) {
            Ok(code) if code.contains("bad") => ValidationResult::fail(BAD_TRACE),
            Ok(_) => ValidationResult::pass(),
            Err(e) => ValidationResult::fail(e.to_string()),
        }
    }
}

struct Fixture {
    dir: TempDir,
    template: PathBuf,
    base: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("prompt_template.txt");
        std::fs::write(&template, TEMPLATE).unwrap();
        let base = dir.path().join("solver.pl");
        std::fs::write(&base, "legal(M) :- move(M).\n").unwrap();
        Self {
            dir,
            template,
            base,
        }
    }

    fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.dir.path().join("OUTPUT"))
    }

    fn formaliser(
        &self,
        replies: &[&str],
        max_attempts: u32,
    ) -> FormalizationLoop<ScriptedGenerator, ContentGateway> {
        FormalizationLoop::new(
            ScriptedGenerator::new(replies),
            ContentGateway::new(self.base.clone()),
            self.store(),
            &self.template,
            LoopConfig {
                max_attempts,
                ..Default::default()
            },
        )
    }
}

fn session(game: &str) -> SessionId {
    SessionId::new(game, "20240101_1200", 0)
}

async fn run(
    formaliser: &mut FormalizationLoop<ScriptedGenerator, ContentGateway>,
    game: &str,
    description: &str,
) -> (gf_formaliser::SessionReport, String) {
    formaliser.store().ensure_layout().await.unwrap();
    let mut log = SessionLog::in_memory();
    let report = formaliser
        .formalise(&session(game), description, &mut log)
        .await
        .unwrap();
    (report, log.contents())
}

#[tokio::test]
async fn first_attempt_success_is_correct() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["Here you go:\n@move(rock).@"], 5);

    let (report, _) = run(&mut formaliser, "rps", "Rock paper scissors.").await;

    assert_eq!(report.outcome, FormalizationOutcome::Correct);
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.artifact(), Some("move(rock)."));
    assert_eq!(formaliser.gateway().query_count(), 1);
}

#[tokio::test]
async fn recovered_success_is_fixed_and_stops() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(
        &["@bad(.@", "@bad again.@", "@move(rock).@", "@never used.@"],
        5,
    );

    let (report, _) = run(&mut formaliser, "rps", "Rock paper scissors.").await;

    assert_eq!(report.outcome, FormalizationOutcome::Fixed);
    assert_eq!(report.attempts.len(), 3);
    assert_eq!(formaliser.generator().sent.len(), 3);
    let indices: Vec<u32> = report.attempts.iter().map(|a| a.attempt_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(report.attempts[2].is_valid());
}

#[tokio::test]
async fn exhaustion_is_faulty() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@bad.@", "@bad.@", "@bad.@"], 3);

    let (report, _) = run(&mut formaliser, "rps", "Rock paper scissors.").await;

    assert_eq!(report.outcome, FormalizationOutcome::Faulty);
    assert_eq!(report.attempts.len(), 3);
    assert!(report.attempts.iter().all(|a| a.trace() == BAD_TRACE));
    assert_eq!(report.artifact(), None);
}

#[tokio::test]
async fn missing_delimiter_consumes_an_attempt() {
    let fixture = Fixture::new();
    let mut formaliser =
        fixture.formaliser(&["I am not sure how to write this.", "@move(rock).@"], 3);

    let (report, _) = run(&mut formaliser, "rps", "Rock paper scissors.").await;

    assert_eq!(report.outcome, FormalizationOutcome::Fixed);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.attempts[0].extracted_artifact, None);
    assert_eq!(report.attempts[0].trace(), "no artifact delimiter found");
    // Nothing reached the solver for the first attempt.
    assert_eq!(formaliser.gateway().query_count(), 1);
}

#[tokio::test]
async fn feedback_follows_faulty_reply_on_accumulated_context() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@bad(.@", "@move(rock).@"], 3);

    run(&mut formaliser, "rps", "Rock paper scissors.").await;

    let sent = &formaliser.generator().sent;
    assert_eq!(sent[0].len(), 1);
    assert!(sent[0][0].content.contains("Rock paper scissors."));

    let second = &sent[1];
    assert_eq!(
        second.iter().map(|m| m.role).collect::<Vec<_>>(),
        vec![Role::User, Role::Assistant, Role::User]
    );
    assert_eq!(second[1].content, "@bad(.@");
    assert_eq!(second[2].content, FeedbackComposer::compose(BAD_TRACE));
    // The instruction prompt is only sent once.
    let instruction_count = second
        .iter()
        .filter(|m| m.content.contains("Formalise the following game"))
        .count();
    assert_eq!(instruction_count, 1);
}

#[tokio::test]
async fn sessions_do_not_share_context() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@bad.@", "@move(rock).@", "@take(1).@"], 3);

    let (first, _) = run(&mut formaliser, "rps", "Rock paper scissors.").await;
    let (second, _) = run(&mut formaliser, "nim", "Players take stones.").await;

    assert_eq!(first.outcome, FormalizationOutcome::Fixed);
    assert_eq!(second.outcome, FormalizationOutcome::Correct);
    assert_eq!(formaliser.generator().clears, 2);

    let opening = &formaliser.generator().sent[2];
    assert_eq!(opening.len(), 1);
    assert!(opening[0].content.contains("Players take stones."));
    assert!(opening
        .iter()
        .all(|m| !m.content.contains("Rock paper") && !m.content.contains("move(rock)")));
}

#[tokio::test]
async fn session_log_is_tagged_by_attempt() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@bad.@", "@move(rock).@"], 3);

    let (_, log) = run(&mut formaliser, "rps", "Rock paper scissors.").await;
    let entries = parse_log(&log);

    assert!(matches!(&entries[0], LogEntry::Prompt(p) if p.contains("Rock paper scissors.")));
    assert_eq!(entries[1], LogEntry::Attempt(0));
    assert_eq!(entries[2], LogEntry::Response("@bad.@".to_string()));
    assert_eq!(entries[3], LogEntry::Trace(BAD_TRACE.to_string()));
    assert!(matches!(&entries[4], LogEntry::Correction(c) if c.contains(BAD_TRACE)));
    assert_eq!(entries[5], LogEntry::Attempt(1));
    assert_eq!(entries[7], LogEntry::Trace(String::new()));
    assert_eq!(entries.len(), 8);
}

#[tokio::test]
async fn artifacts_and_prompt_are_persisted() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@bad.@", "@move(rock).@"], 3);

    run(&mut formaliser, "rps", "Rock paper scissors.").await;

    let store = fixture.store();
    let id = session("rps");
    assert_eq!(
        std::fs::read_to_string(store.artifact_path(&id, 0)).unwrap(),
        "bad."
    );
    assert_eq!(
        std::fs::read_to_string(store.artifact_path(&id, 1)).unwrap(),
        "move(rock)."
    );
    let prompt = std::fs::read_to_string(store.prompt_path(&id)).unwrap();
    assert!(prompt.contains("Rock paper scissors."));
}

#[tokio::test]
async fn run_session_tags_log_with_outcome() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@move(rock).@"], 3);
    let id = session("rps");

    let report = formaliser
        .run_session(&id, "Rock paper scissors.")
        .await
        .unwrap();
    assert_eq!(report.outcome, FormalizationOutcome::Correct);

    let store = fixture.store();
    assert!(!store.log_path(&id).exists());
    let tagged = store.tagged_log_path(&id, FormalizationOutcome::Correct);
    let entries = parse_log(&std::fs::read_to_string(tagged).unwrap());
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn missing_template_aborts_session() {
    let fixture = Fixture::new();
    std::fs::remove_file(&fixture.template).unwrap();
    let mut formaliser = fixture.formaliser(&["@move(rock).@"], 3);
    formaliser.store().ensure_layout().await.unwrap();

    let mut log = SessionLog::in_memory();
    let result = formaliser
        .formalise(&session("rps"), "Rock paper scissors.", &mut log)
        .await;

    assert!(matches!(result, Err(FormaliseError::Template(_))));
    assert!(formaliser.generator().sent.is_empty());
}

#[tokio::test]
async fn missing_base_program_aborts_session() {
    let fixture = Fixture::new();
    std::fs::remove_file(&fixture.base).unwrap();
    let mut formaliser = fixture.formaliser(&["@move(rock).@"], 3);
    let id = session("rps");

    let result = formaliser.run_session(&id, "Rock paper scissors.").await;

    assert!(matches!(result, Err(FormaliseError::Solver(_))));
    assert!(formaliser.generator().sent.is_empty());
    // The log still gets closed and tagged.
    assert!(fixture
        .store()
        .tagged_log_path(&id, FormalizationOutcome::Start)
        .exists());
}

#[tokio::test]
async fn generator_failure_propagates() {
    let fixture = Fixture::new();
    let mut formaliser = fixture.formaliser(&["@bad.@"], 3);

    formaliser.store().ensure_layout().await.unwrap();
    let mut log = SessionLog::in_memory();
    let result = formaliser
        .formalise(&session("rps"), "Rock paper scissors.", &mut log)
        .await;

    assert!(matches!(
        result,
        Err(FormaliseError::Generator(GeneratorError::EmptyResponse(_)))
    ));
}

/// Never answers.
struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn prompt(&mut self, _instruction: &str, _max_tokens: u32) -> Result<String, GeneratorError> {
        std::future::pending().await
    }

    fn add_response(&mut self, _text: &str) {}

    fn clear_context(&mut self) {}
}

#[tokio::test]
async fn generator_timeout_aborts_session() {
    let fixture = Fixture::new();
    let mut formaliser = FormalizationLoop::new(
        StalledGenerator,
        ContentGateway::new(fixture.base.clone()),
        fixture.store(),
        &fixture.template,
        LoopConfig {
            generation_timeout: Duration::from_millis(50),
            ..Default::default()
        },
    );
    assert_eq!(formaliser.config().generation_timeout, Duration::from_millis(50));
    assert_eq!(formaliser.template_path(), fixture.template.as_path());

    formaliser.store().ensure_layout().await.unwrap();
    let mut log = SessionLog::in_memory();
    let result = formaliser
        .formalise(&session("rps"), "Rock paper scissors.", &mut log)
        .await;

    assert!(matches!(
        result,
        Err(FormaliseError::Generator(GeneratorError::Timeout(t))) if t == Duration::from_millis(50)
    ));
    assert_eq!(formaliser.gateway().query_count(), 0);
}
