//! Escalating hints for a wrong or missing answer.
//!
//! The number of consecutive errors at a step picks a [`Tier`]. Scripted
//! hints exist for every asking step of every topic; anything else goes to
//! the generative backend, and when that is absent or fails a fixed nudge is
//! returned. Nothing in here can fail the request.

mod backend;
mod catalog;
mod column;
mod division;
mod fractions;
mod staged;

pub use backend::{HintBackend, OpenAiBackend};
pub use catalog::is_cataloged;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use tutorin_steps::{engine_for, Cycle, StepTag, Topic};

/// System prompt of the generative backend.
pub const SYSTEM_PROMPT: &str = "Eres Tutorín, un profesor de Primaria en España. Da una pista \
                                 breve, concreta y motivadora para ayudar al alumno a avanzar en \
                                 su razonamiento sin resolverle todo.";

/// Returned when no generative backend is configured.
pub const NO_BACKEND_HINT: &str =
    "Pista: piensa paso a paso, revisa el número y vuelve a intentarlo.";

/// Returned when the generative backend fails or times out.
pub const BACKEND_FAILURE_HINT: &str =
    "No tengo una pista clara ahora mismo, intenta explicar cómo lo estás haciendo.";

/// Characters of the transcript sent to the backend.
const CONTEXT_TAIL_CHARS: usize = 600;

// ============================================================================
// Keys and tiers
// ============================================================================

/// What the hint is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKey {
    /// A wrong answer at a known sub-step.
    Tag(StepTag),
    /// The pupil said they don't know; only the step index is known.
    Synthetic(usize),
}

impl fmt::Display for HintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag.as_str()),
            Self::Synthetic(step) => write!(f, "hint_{step}"),
        }
    }
}

/// Hint escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Where to look.
    Nudge,
    /// The rule that applies.
    Rule,
    /// A worked example on other numbers.
    Example,
    /// The value itself.
    Solution,
}

impl Tier {
    /// Tier for an error count; counts are clamped into `1..=4`.
    #[must_use]
    pub const fn from_errors(error_count: u8) -> Self {
        match error_count {
            0 | 1 => Self::Nudge,
            2 => Self::Rule,
            3 => Self::Example,
            _ => Self::Solution,
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// Everything a hint may draw on.
#[derive(Debug, Clone)]
pub struct HintRequest<'a> {
    /// Topic the statement was classified as.
    pub topic: Option<Topic>,
    /// Step tag or synthetic key.
    pub key: HintKey,
    /// Current step index.
    pub step: usize,
    /// Error count after this turn.
    pub error_count: u8,
    /// Statement as received.
    pub question: &'a str,
    /// Transcript so far.
    pub context: &'a str,
    /// Expected answer of the step, when the caller consulted it.
    pub expected_answer: Option<&'a str>,
    /// Cached canonical expression.
    pub operands: Option<&'a str>,
    /// Pupil's cycle.
    pub cycle: Cycle,
}

impl HintRequest<'_> {
    /// Canonical expression for `topic`, from the cached operands or the
    /// question, routing word problems first when needed.
    pub(crate) fn expression_for(&self, topic: Topic) -> Option<String> {
        let engine = engine_for(topic);
        [self.operands, Some(self.question)]
            .into_iter()
            .flatten()
            .find_map(|source| {
                engine.canonical_expression(source).or_else(|| {
                    engine_for(Topic::Problemas)
                        .canonical_expression(source)
                        .and_then(|routed| engine.canonical_expression(&routed))
                })
            })
    }

    fn user_prompt(&self) -> String {
        format!(
            "Consigna: {}\nPaso: {}\nErrores: {}\nContexto: {}",
            self.question,
            self.key,
            self.error_count.clamp(1, 9),
            context_tail(self.context)
        )
    }
}

/// The last few hundred characters of the transcript, cut on a char boundary.
fn context_tail(context: &str) -> &str {
    context
        .char_indices()
        .rev()
        .nth(CONTEXT_TAIL_CHARS - 1)
        .map_or(context, |(index, _)| &context[index..])
}

// ============================================================================
// Selector
// ============================================================================

/// Picks the hint for a request.
#[derive(Clone, Default)]
pub struct HintSelector {
    backend: Option<Arc<dyn HintBackend>>,
}

impl fmt::Debug for HintSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintSelector")
            .field("backend", &self.backend.is_some())
            .finish()
    }
}

impl HintSelector {
    /// Creates a selector with an optional generative backend.
    #[must_use]
    pub fn new(backend: Option<Arc<dyn HintBackend>>) -> Self {
        Self { backend }
    }

    /// Whether a generative backend is configured.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Returns the hint for `request`. Never fails.
    pub async fn select(&self, request: &HintRequest<'_>) -> String {
        let tier = Tier::from_errors(request.error_count);
        let tag = resolve_tag(request);

        match (request.topic, tag) {
            (Some(topic), Some(tag)) if !is_cataloged(topic, tag) => {
                warn!(topic = %topic, hint_type = %tag, "Hint type not in catalog");
            }
            (None, _) | (_, None) => {
                warn!(key = %request.key, "Hint requested without a known topic and step");
            }
            _ => {}
        }

        if let Some(text) = tag.and_then(|tag| scripted(tag, tier, request)) {
            debug!(key = %request.key, ?tier, "Scripted hint");
            return text;
        }
        self.generative(request).await
    }

    async fn generative(&self, request: &HintRequest<'_>) -> String {
        let Some(backend) = &self.backend else {
            return NO_BACKEND_HINT.to_string();
        };
        backend
            .generate(SYSTEM_PROMPT, &request.user_prompt())
            .await
            .unwrap_or_else(|| BACKEND_FAILURE_HINT.to_string())
    }
}

/// The step tag the hint is about. Synthetic keys ask the engine which step
/// sits at that index.
fn resolve_tag(request: &HintRequest<'_>) -> Option<StepTag> {
    match request.key {
        HintKey::Tag(tag) => Some(tag),
        HintKey::Synthetic(step) => {
            let topic = request.topic?;
            let source = request.operands.unwrap_or(request.question);
            engine_for(topic)
                .compute_step(source, step, request.cycle)
                .ok()
                .map(|result| result.hint_type)
        }
    }
}

/// Scripted hint for `tag`, dispatched on the topic that emits it.
fn scripted(tag: StepTag, tier: Tier, request: &HintRequest<'_>) -> Option<String> {
    match tag.topic() {
        Topic::Suma | Topic::Resta | Topic::Multiplicacion => column::hint(tag, tier, request),
        Topic::Division => division::hint(tag, tier, request),
        Topic::Fracciones => fractions::hint(tag, tier, request),
        Topic::Decimales
        | Topic::Geometria
        | Topic::Medidas
        | Topic::Porcentajes
        | Topic::Estadistica
        | Topic::Problemas => staged::hint(tag, tier, request.expected_answer),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Backend that answers with a fixed text and counts calls.
    #[derive(Default)]
    pub(crate) struct CannedBackend {
        pub(crate) reply: Option<String>,
        pub(crate) calls: AtomicUsize,
    }

    #[async_trait]
    impl HintBackend for CannedBackend {
        async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Option<String> {
            assert_eq!(system_prompt, SYSTEM_PROMPT);
            assert!(user_prompt.starts_with("Consigna: "));
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    pub(crate) fn request<'a>(
        topic: Topic,
        key: HintKey,
        step: usize,
        error_count: u8,
        question: &'a str,
    ) -> HintRequest<'a> {
        HintRequest {
            topic: Some(topic),
            key,
            step,
            error_count,
            question,
            context: "",
            expected_answer: None,
            operands: None,
            cycle: Cycle::C2,
        }
    }

    #[test]
    fn test_tier_clamping() {
        assert_eq!(Tier::from_errors(0), Tier::Nudge);
        assert_eq!(Tier::from_errors(1), Tier::Nudge);
        assert_eq!(Tier::from_errors(3), Tier::Example);
        assert_eq!(Tier::from_errors(9), Tier::Solution);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(HintKey::Tag(StepTag::DivQdigit).to_string(), "div_qdigit");
        assert_eq!(HintKey::Synthetic(3).to_string(), "hint_3");
    }

    #[test]
    fn test_context_tail_is_char_safe() {
        let long = "ñ".repeat(CONTEXT_TAIL_CHARS + 10);
        assert_eq!(context_tail(&long).chars().count(), CONTEXT_TAIL_CHARS);
        assert_eq!(context_tail("corto"), "corto");
    }

    #[tokio::test]
    async fn test_tiers_escalate_with_distinct_text() {
        let selector = HintSelector::default();
        let mut seen = Vec::new();
        for errors in 1..=4 {
            let req = request(Topic::Suma, HintKey::Tag(StepTag::AddCol), 1, errors, "32458 + 6541");
            seen.push(selector.select(&req).await);
        }
        for pair in seen.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn test_synthetic_key_resolves_through_engine() {
        let selector = HintSelector::default();
        let req = request(Topic::Division, HintKey::Synthetic(1), 1, 1, "3457 / 3");
        let hint = selector.select(&req).await;
        assert!(hint.contains('3'), "{hint}");
        assert_ne!(hint, NO_BACKEND_HINT);
    }

    #[tokio::test]
    async fn test_unscripted_without_backend_uses_fixed_nudge() {
        let selector = HintSelector::default();
        let req = request(Topic::Suma, HintKey::Tag(StepTag::AddResultado), 5, 1, "2 + 2");
        assert_eq!(selector.select(&req).await, NO_BACKEND_HINT);

        let req = HintRequest {
            topic: None,
            ..request(Topic::Suma, HintKey::Synthetic(0), 0, 1, "hola")
        };
        assert_eq!(selector.select(&req).await, NO_BACKEND_HINT);
    }

    #[tokio::test]
    async fn test_unscripted_goes_to_backend() {
        let backend = Arc::new(CannedBackend {
            reply: Some("Piensa en cuántas decenas hay.".into()),
            ..CannedBackend::default()
        });
        let selector = HintSelector::new(Some(backend.clone()));
        let req = request(Topic::Suma, HintKey::Tag(StepTag::AddResultado), 5, 2, "2 + 2");

        assert_eq!(selector.select(&req).await, "Piensa en cuántas decenas hay.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let scripted = request(Topic::Suma, HintKey::Tag(StepTag::AddCol), 0, 1, "2 + 2");
        selector.select(&scripted).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backend_failure_falls_back() {
        let selector = HintSelector::new(Some(Arc::new(CannedBackend::default())));
        let req = request(Topic::Suma, HintKey::Tag(StepTag::AddResultado), 5, 1, "2 + 2");
        let hint = tokio_test::block_on(selector.select(&req));
        assert_eq!(hint, BACKEND_FAILURE_HINT);
    }

    #[test]
    fn test_expression_for_routes_word_problems() {
        let req = request(
            Topic::Problemas,
            HintKey::Tag(StepTag::AddCol),
            0,
            1,
            "Ana tiene 12 caramelos y le dan 5 más",
        );
        assert_eq!(req.expression_for(Topic::Suma).as_deref(), Some("12+5"));

        let cached = HintRequest {
            operands: Some("2/3+1/4"),
            ..request(Topic::Fracciones, HintKey::Synthetic(2), 2, 1, "sigue")
        };
        assert_eq!(cached.expression_for(Topic::Fracciones).as_deref(), Some("2/3+1/4"));
    }
}
