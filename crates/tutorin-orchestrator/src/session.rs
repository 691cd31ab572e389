//! The per-request tutoring protocol.
//!
//! One call to [`Tutor::solve`] is one turn: load the exercise record,
//! classify the statement, render the current sub-step, compare the answer,
//! pick a hint when it is wrong, and persist progress and history together.
//! Turns for the same exercise id are serialized in-process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use tutorin_steps::{engine_for, Cycle, StepResult, StepStatus, Topic};
use tutorin_store::{NewHistory, ProgressRecord, ProgressStore, MAX_ERROR_COUNT};

use crate::answer::{answers_match, is_unknown_answer};
use crate::error::Result;
use crate::hints::{HintKey, HintRequest, HintSelector};
use crate::nlu::{classify, Nlu};

/// Prefix of the reply to a correct answer.
pub const CORRECT_MESSAGE: &str = "✅ ¡Correcto! 👍";

/// Prefix of the reply to a wrong answer.
pub const WRONG_PREFIX: &str = "❌ No es exactamente. ";

/// Used when a hint comes back empty.
pub const HINT_FALLBACK: &str = "🧠 Pista: piensa paso a paso y revisa los números.";

/// Reply when the engine cannot read the statement.
pub const PARSE_FAILURE_MESSAGE: &str = "No pude procesar este ejercicio.";

/// Reply when the statement matches no topic.
pub const CLARIFY_MESSAGE: &str =
    "No sé exactamente qué tipo de ejercicio es. ¿Podrías explicarlo un poco más?";

/// User id recorded when the request names none.
pub const ANONYMOUS_USER: &str = "anon";

/// Unused lock entries are pruned once the map grows past this size.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

// ============================================================================
// Wire types
// ============================================================================

/// Outcome of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    /// A sub-step is waiting for an answer.
    Ask,
    /// The exercise is finished.
    Done,
    /// The pupil asked for help.
    Hint,
    /// The answer was wrong.
    Feedback,
    /// The statement could not be worked through.
    Error,
    /// The statement matched no topic.
    Clarify,
}

impl From<StepStatus> for SolveStatus {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Ask => Self::Ask,
            StepStatus::Done => Self::Done,
            StepStatus::Error => Self::Error,
        }
    }
}

/// Body of `POST /solve`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SolveRequest {
    /// Pupil sending the turn.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Exercise statement.
    pub question: String,
    /// Answer to the step shown last; empty on a first visit.
    #[serde(default)]
    pub last_answer: Option<String>,
    /// Exercise to continue; a new id is minted when absent.
    #[serde(default)]
    pub exercise_id: Option<String>,
    /// Transcript held by the client, used to seed a fresh record.
    #[serde(default)]
    pub context: Option<String>,
    /// School cycle (`c1`, `c2`, `c3`).
    #[serde(default)]
    pub cycle: Option<String>,
}

/// Reply of `POST /solve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    /// Exercise the turn belongs to.
    pub exercise_id: String,
    /// Outcome of the turn.
    pub status: SolveStatus,
    /// Step index after the turn.
    pub step: usize,
    /// Consecutive errors after the turn.
    pub error_count: u8,
    /// Text shown to the pupil.
    pub message: String,
    /// Value the next answer must match, when one is expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    /// Transcript after the turn.
    pub context: String,
    /// Classification of the statement.
    pub nlu: Nlu,
}

/// What a turn decided, before it is persisted.
struct Turn {
    status: SolveStatus,
    message: String,
    expected_answer: Option<String>,
}

impl Turn {
    fn new(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            expected_answer: None,
        }
    }

    fn from_step(step: StepResult) -> Self {
        let expected_answer = match step.status {
            StepStatus::Ask => step.expected_answer,
            StepStatus::Done | StepStatus::Error => None,
        };
        Self {
            status: step.status.into(),
            message: step.message,
            expected_answer,
        }
    }
}

// ============================================================================
// Tutor
// ============================================================================

/// Runs turns against a shared store.
#[derive(Debug)]
pub struct Tutor {
    store: Arc<ProgressStore>,
    hints: HintSelector,
    default_cycle: Cycle,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Tutor {
    /// Creates a tutor over `store`.
    #[must_use]
    pub fn new(store: Arc<ProgressStore>, hints: HintSelector, default_cycle: Cycle) -> Self {
        Self {
            store,
            hints,
            default_cycle,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Holds the turn lock of one exercise until the guard drops.
    async fn lock_exercise(&self, exercise_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > LOCK_PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(exercise_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Runs one turn.
    ///
    /// Only storage failures are errors; everything else the pupil can cause
    /// is reported through [`SolveStatus`].
    pub async fn solve(&self, request: SolveRequest) -> Result<SolveResponse> {
        let exercise_id = non_empty(request.exercise_id.as_deref())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        let user_id = non_empty(request.user_id.as_deref()).unwrap_or(ANONYMOUS_USER);
        let cycle = request
            .cycle
            .as_deref()
            .map_or(self.default_cycle, Cycle::parse_lenient);
        let answer = request.last_answer.as_deref().unwrap_or_default().trim();

        let _guard = self.lock_exercise(&exercise_id).await;
        let mut record = self.store.get(&exercise_id, user_id)?;
        if record.context.is_empty() {
            if let Some(seed) = non_empty(request.context.as_deref()) {
                record.context = seed.trim().to_string();
            }
        }

        let nlu = classify(&request.question);
        let turn = match resolve_topic(&nlu, &record) {
            None => Turn::new(SolveStatus::Clarify, CLARIFY_MESSAGE),
            Some(topic) => {
                self.play(topic, &request.question, answer, cycle, &mut record)
                    .await
            }
        };

        record.push_context(&turn.message);
        let entry = NewHistory {
            user_id: user_id.to_string(),
            exercise_id: exercise_id.clone(),
            question: request.question.clone(),
            last_answer: answer.to_string(),
            response: turn.message.clone(),
            step: record.current_step,
            error_count: record.error_count,
        };
        let saved = self.store.record_turn(&record, &entry)?;

        info!(
            exercise_id = %exercise_id,
            topic = %nlu.intent,
            step = saved.current_step,
            error_count = saved.error_count,
            status = ?turn.status,
            "Turn recorded"
        );

        Ok(SolveResponse {
            exercise_id,
            status: turn.status,
            step: saved.current_step,
            error_count: saved.error_count,
            message: turn.message,
            expected_answer: turn.expected_answer,
            context: saved.context,
            nlu,
        })
    }

    /// Works one turn of a classified exercise, mutating `record` in place.
    async fn play(
        &self,
        topic: Topic,
        question: &str,
        answer: &str,
        cycle: Cycle,
        record: &mut ProgressRecord,
    ) -> Turn {
        let engine = engine_for(topic);
        let Some(expression) = engine
            .canonical_expression(question)
            .or_else(|| cached_operands(record, topic))
        else {
            debug!(topic = %topic, "Statement does not parse");
            return Turn::new(SolveStatus::Error, PARSE_FAILURE_MESSAGE);
        };
        record.state.topic = Some(topic.as_str().to_string());
        record.state.operands = Some(expression.clone());

        if is_unknown_answer(answer) {
            record.error_count = bump(record.error_count);
            let hint = self
                .hint(topic, HintKey::Synthetic(record.current_step), question, None, cycle, record)
                .await;
            return Turn::new(SolveStatus::Hint, hint);
        }

        let step = match engine.compute_step(&expression, record.current_step, cycle) {
            Ok(step) => step,
            Err(e) => {
                debug!(topic = %topic, error = %e, "Engine rejected the statement");
                return Turn::new(SolveStatus::Error, PARSE_FAILURE_MESSAGE);
            }
        };

        let expected = match (step.status, step.expected_answer.as_deref()) {
            (StepStatus::Ask, Some(expected)) if !answer.is_empty() => expected.to_string(),
            _ => return Turn::from_step(step),
        };

        if answers_match(answer, &expected) {
            record.current_step = step.next_step;
            record.error_count = 0;
            return match engine.compute_step(&expression, record.current_step, cycle) {
                Ok(next) => {
                    let mut turn = Turn::from_step(next);
                    turn.message = format!("{CORRECT_MESSAGE}\n\n{}", turn.message);
                    turn
                }
                Err(_) => Turn::new(SolveStatus::Ask, CORRECT_MESSAGE),
            };
        }

        record.error_count = bump(record.error_count);
        let hint = self
            .hint(
                topic,
                HintKey::Tag(step.hint_type),
                question,
                Some(&expected),
                cycle,
                record,
            )
            .await;
        Turn {
            status: SolveStatus::Feedback,
            message: format!("{WRONG_PREFIX}{hint}"),
            expected_answer: Some(expected),
        }
    }

    async fn hint(
        &self,
        topic: Topic,
        key: HintKey,
        question: &str,
        expected_answer: Option<&str>,
        cycle: Cycle,
        record: &ProgressRecord,
    ) -> String {
        let request = HintRequest {
            topic: Some(topic),
            key,
            step: record.current_step,
            error_count: record.error_count,
            question,
            context: &record.context,
            expected_answer,
            operands: record.state.operands.as_deref(),
            cycle,
        };
        let hint = self.hints.select(&request).await;
        if hint.trim().is_empty() {
            HINT_FALLBACK.to_string()
        } else {
            hint
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

const fn bump(error_count: u8) -> u8 {
    if error_count < MAX_ERROR_COUNT {
        error_count + 1
    } else {
        MAX_ERROR_COUNT
    }
}

/// The classified topic, or the cached one when the statement no longer
/// names an operation but the record still holds its operands.
fn resolve_topic(nlu: &Nlu, record: &ProgressRecord) -> Option<Topic> {
    nlu.topic().or_else(|| {
        record.state.operands.as_ref()?;
        record.state.topic.as_deref().and_then(Topic::from_name)
    })
}

fn cached_operands(record: &ProgressRecord, topic: Topic) -> Option<String> {
    let cached_topic = record.state.topic.as_deref().and_then(Topic::from_name)?;
    (cached_topic == topic)
        .then(|| record.state.operands.clone())
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::hints::tests::CannedBackend;

    fn tutor() -> Tutor {
        let store = Arc::new(ProgressStore::open_in_memory().unwrap());
        Tutor::new(store, HintSelector::default(), Cycle::C2)
    }

    fn turn(id: &str, question: &str, answer: &str) -> SolveRequest {
        SolveRequest {
            exercise_id: Some(id.to_string()),
            question: question.to_string(),
            last_answer: Some(answer.to_string()),
            ..SolveRequest::default()
        }
    }

    #[tokio::test]
    async fn test_first_visit_asks_without_touching_errors() {
        let tutor = tutor();
        let reply = tutor.solve(turn("ex-1", "32458 + 6541", "")).await.unwrap();

        assert_eq!(reply.status, SolveStatus::Ask);
        assert_eq!(reply.step, 0);
        assert_eq!(reply.error_count, 0);
        assert_eq!(reply.expected_answer.as_deref(), Some("9"));
        assert_eq!(reply.nlu.intent, "suma");
        assert_eq!(reply.context, reply.message);
    }

    #[tokio::test]
    async fn test_correct_answer_advances_and_renders_next_step() {
        let tutor = tutor();
        tutor.solve(turn("ex-1", "32458 + 6541", "")).await.unwrap();
        let reply = tutor.solve(turn("ex-1", "32458 + 6541", " 9 ")).await.unwrap();

        assert_eq!(reply.status, SolveStatus::Ask);
        assert_eq!(reply.step, 1);
        assert_eq!(reply.error_count, 0);
        assert!(reply.message.starts_with(CORRECT_MESSAGE));
        assert_eq!(reply.expected_answer.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_wrong_answers_escalate_and_reset_on_advance() {
        let tutor = tutor();
        let mut messages = Vec::new();
        for expected_errors in 1..=3 {
            let reply = tutor.solve(turn("ex-2", "3457 / 3", "7")).await.unwrap();
            assert_eq!(reply.status, SolveStatus::Feedback);
            assert_eq!(reply.step, 0);
            assert_eq!(reply.error_count, expected_errors);
            assert!(reply.message.starts_with(WRONG_PREFIX));
            messages.push(reply.message);
        }
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);

        let reply = tutor.solve(turn("ex-2", "3457 / 3", "3")).await.unwrap();
        assert_eq!(reply.step, 1);
        assert_eq!(reply.error_count, 0);
    }

    #[tokio::test]
    async fn test_error_count_is_capped() {
        let tutor = tutor();
        let mut last = 0;
        for _ in 0..12 {
            last = tutor.solve(turn("ex-3", "2 + 2", "5")).await.unwrap().error_count;
        }
        assert_eq!(last, MAX_ERROR_COUNT);
    }

    #[tokio::test]
    async fn test_unknown_answer_gives_hint_without_expected() {
        let tutor = tutor();
        let reply = tutor.solve(turn("ex-4", "2/3 + 1/4", "no sé")).await.unwrap();

        assert_eq!(reply.status, SolveStatus::Hint);
        assert_eq!(reply.error_count, 1);
        assert_eq!(reply.step, 0);
        assert!(reply.expected_answer.is_none());
        assert!(reply.message.contains('3') && reply.message.contains('4'), "{}", reply.message);
    }

    #[tokio::test]
    async fn test_unclassified_statement_asks_for_clarification() {
        let tutor = tutor();
        let reply = tutor.solve(turn("ex-5", "hola, ¿qué tal?", "")).await.unwrap();
        assert_eq!(reply.status, SolveStatus::Clarify);
        assert_eq!(reply.message, CLARIFY_MESSAGE);
        assert_eq!(tutor.store().list_history(None, 10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_word_problem_reaches_its_engine() {
        let tutor = tutor();
        let first = tutor.solve(turn("ex-wp", "dividir 24 entre 6", "")).await.unwrap();
        assert_eq!(first.status, SolveStatus::Ask);
        assert_eq!(first.nlu.intent, "problemas");
        assert!(first.message.starts_with("🧩"), "{}", first.message);
        assert_eq!(first.expected_answer.as_deref(), Some("24"));

        let second = tutor.solve(turn("ex-wp", "dividir 24 entre 6", "24")).await.unwrap();
        assert_eq!(second.step, 1);
        assert_eq!(second.expected_answer.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_conversion_with_short_units_reaches_its_engine() {
        let tutor = tutor();
        let reply = tutor.solve(turn("ex-mg", "500 mg a g", "")).await.unwrap();
        assert_eq!(reply.status, SolveStatus::Ask);
        assert_eq!(reply.nlu.intent, "medidas");
        assert_eq!(reply.expected_answer.as_deref(), Some("menor"));
    }

    #[tokio::test]
    async fn test_unparseable_statement_is_an_error_turn() {
        let tutor = tutor();
        let reply = tutor
            .solve(turn("ex-6", "calcula el área de un triángulo", ""))
            .await
            .unwrap();
        assert_eq!(reply.status, SolveStatus::Error);
        assert_eq!(reply.error_count, 0);
        assert_eq!(reply.step, 0);
    }

    #[tokio::test]
    async fn test_cached_operands_carry_later_turns() {
        let tutor = tutor();
        tutor.solve(turn("ex-7", "2/3 + 1/4", "")).await.unwrap();
        let reply = tutor.solve(turn("ex-7", "sigue", "no")).await.unwrap();

        assert_eq!(reply.step, 1);
        assert_eq!(reply.expected_answer.as_deref(), Some("12"));
        let record = tutor.store().find("ex-7").unwrap().unwrap();
        assert_eq!(record.state.operands.as_deref(), Some("2/3+1/4"));
    }

    #[tokio::test]
    async fn test_missing_exercise_id_is_minted() {
        let tutor = tutor();
        let reply = tutor
            .solve(SolveRequest {
                question: "5 × 3".into(),
                ..SolveRequest::default()
            })
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(&reply.exercise_id).is_ok());
        assert_eq!(reply.status, SolveStatus::Ask);
    }

    #[tokio::test]
    async fn test_done_is_absorbing() {
        let tutor = tutor();
        tutor.solve(turn("ex-8", "2 + 2", "")).await.unwrap();
        let finished = tutor.solve(turn("ex-8", "2 + 2", "4")).await.unwrap();
        assert_eq!(finished.status, SolveStatus::Done);

        let again = tutor.solve(turn("ex-8", "2 + 2", "lo que sea")).await.unwrap();
        assert_eq!(again.status, SolveStatus::Done);
        assert_eq!(again.step, finished.step);
        assert_eq!(again.error_count, 0);
    }

    #[tokio::test]
    async fn test_every_turn_is_in_history() {
        let tutor = tutor();
        for answer in ["", "1", "9"] {
            tutor.solve(turn("ex-9", "32458 + 6541", answer)).await.unwrap();
        }
        let history = tutor.store().list_history(Some(ANONYMOUS_USER), 10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].last_answer, "9");
        assert_eq!(history[0].step, 1);
    }

    #[tokio::test]
    async fn test_scripted_hint_skips_backend() {
        let backend = Arc::new(CannedBackend {
            reply: Some("Cuenta con los dedos.".into()),
            ..CannedBackend::default()
        });
        let store = Arc::new(ProgressStore::open_in_memory().unwrap());
        let tutor = Tutor::new(store, HintSelector::new(Some(backend.clone())), Cycle::C2);

        let reply = tutor.solve(turn("ex-10", "3 km a m", "menor")).await.unwrap();
        assert_eq!(reply.status, SolveStatus::Feedback);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(reply.message.contains("más grande o más pequeña"), "{}", reply.message);
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_exercise_are_serialized() {
        let tutor = Arc::new(tutor());
        tutor.solve(turn("ex-11", "45 + 38", "")).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let tutor = Arc::clone(&tutor);
                tokio::spawn(async move { tutor.solve(turn("ex-11", "45 + 38", "0")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let record = tutor.store().find("ex-11").unwrap().unwrap();
        assert_eq!(record.error_count, 8);
        assert_eq!(record.version, 9);
    }

    #[test]
    fn test_request_accepts_minimal_body() {
        let request: SolveRequest = serde_json::from_str(r#"{"question": "2 + 2"}"#).unwrap();
        assert_eq!(request.question, "2 + 2");
        assert!(request.exercise_id.is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&SolveStatus::Feedback).unwrap(), "\"feedback\"");
        assert_eq!(serde_json::to_string(&SolveStatus::Clarify).unwrap(), "\"clarify\"");
    }
}
