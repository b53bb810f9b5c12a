//! Planner state machine.
//!
//! Drives the research → verify → synthesize loop for one session:
//! 1. INIT: create or adopt the session row
//! 2. RESEARCH: cache lookup (retries only), then one research pass
//! 3. VERIFY: consult the meta-control policy, write one audit trace
//! 4. SYNTHESIZE: persist the answer and evidence, cache on ACCEPT
//! 5. DONE / FAILED: terminal
//!
//! The planner owns all retry state (attempt count, strategy history,
//! document escalation, no-progress tracking). Only decisions and
//! evidence are persisted; prompts and oracle output never reach the
//! store.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::agents::meta::{Decision, DecisionKind, VerificationAgent};
use crate::agents::research::Researcher;
use crate::error::{Error, Result};
use crate::storage::store::SqliteStore;
use crate::synthesis::ResearchOutcome;
use crate::verification::types::{Confidence, ConfidenceLevel, VerifiedClaim};

/// Cache entries written on ACCEPT live this long.
const CACHE_TTL_HOURS: i64 = 24;

/// Planner lifecycle states. Persisted as the session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlannerState {
    Init,
    Research,
    Verify,
    Synthesize,
    Done,
    Failed,
}

impl std::fmt::Display for PlannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::Research => write!(f, "RESEARCH"),
            Self::Verify => write!(f, "VERIFY"),
            Self::Synthesize => write!(f, "SYNTHESIZE"),
            Self::Done => write!(f, "DONE"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Named query-modification recipes used to vary a retry's search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStrategy {
    Base,
    BroadenQuery,
    AuthoritativeSites,
    ResearchFocused,
}

impl SearchStrategy {
    /// Canonical rotation order.
    pub const ORDER: [SearchStrategy; 4] = [
        SearchStrategy::Base,
        SearchStrategy::BroadenQuery,
        SearchStrategy::AuthoritativeSites,
        SearchStrategy::ResearchFocused,
    ];
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "BASE"),
            Self::BroadenQuery => write!(f, "BROADEN_QUERY"),
            Self::AuthoritativeSites => write!(f, "AUTHORITATIVE_SITES"),
            Self::ResearchFocused => write!(f, "RESEARCH_FOCUSED"),
        }
    }
}

/// Process-local planner execution state. Persisted only through audit
/// rows, never directly.
#[derive(Debug, Clone)]
pub struct PlannerContext {
    pub current_state: PlannerState,
    pub attempt_count: u32,
    pub max_attempts: u32,

    pub confidence_history: Vec<ConfidenceLevel>,
    pub decision_history: Vec<DecisionKind>,

    pub strategy_history: Vec<SearchStrategy>,
    pub current_strategy: SearchStrategy,

    pub last_confidence: Option<ConfidenceLevel>,
    pub last_decision: Option<DecisionKind>,
    pub no_progress_count: u32,

    pub num_docs: usize,
    pub max_docs: usize,

    pub exhausted_reason: Option<String>,
}

impl PlannerContext {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            current_state: PlannerState::Init,
            attempt_count: 0,
            max_attempts,
            confidence_history: Vec::new(),
            decision_history: Vec::new(),
            strategy_history: Vec::new(),
            current_strategy: SearchStrategy::Base,
            last_confidence: None,
            last_decision: None,
            no_progress_count: 0,
            num_docs: 5,
            max_docs: 20,
            exhausted_reason: None,
        }
    }

    fn record_strategy(&mut self, strategy: SearchStrategy) {
        self.strategy_history.push(strategy);
        self.current_strategy = strategy;
    }

    /// Track whether the loop is making progress: an unchanged
    /// (confidence, decision) pair counts against the session.
    fn record_progress(&mut self, confidence: ConfidenceLevel, decision: DecisionKind) {
        if self.last_confidence == Some(confidence) && self.last_decision == Some(decision) {
            self.no_progress_count += 1;
        } else {
            self.no_progress_count = 0;
        }

        self.last_confidence = Some(confidence);
        self.last_decision = Some(decision);
    }
}

/// Lowercase, trim, and collapse inner whitespace.
pub fn normalize_question(question: &str) -> String {
    question
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 fingerprint of `normalize(question)|strategy|num_docs`.
pub fn compute_fingerprint(question: &str, strategy: SearchStrategy, num_docs: usize) -> String {
    let key = format!("{}|{}|{}", normalize_question(question), strategy, num_docs);
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The planner. One instance drives exactly one session to a terminal
/// state.
pub struct Planner {
    researcher: Arc<dyn Researcher>,
    meta: VerificationAgent,
    store: Arc<SqliteStore>,
    context: PlannerContext,
    session_id: Option<Uuid>,
    research_result: Option<ResearchOutcome>,
    last_fingerprint: Option<String>,
    final_result: Option<ResearchOutcome>,
}

impl Planner {
    pub fn new(researcher: Arc<dyn Researcher>, store: Arc<SqliteStore>) -> Self {
        Self {
            researcher,
            meta: VerificationAgent,
            store,
            context: PlannerContext::new(3),
            session_id: None,
            research_result: None,
            last_fingerprint: None,
            final_result: None,
        }
    }

    /// Override the retry budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.context = PlannerContext::new(max_attempts);
        self
    }

    /// Adopt a session the API already created instead of creating one.
    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Read access for assertions and diagnostics.
    pub fn context(&self) -> &PlannerContext {
        &self.context
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Drive the state machine to a terminal state and return the
    /// outcome. Storage failures propagate; the caller marks the
    /// session FAILED best-effort.
    pub async fn run(&mut self, question: &str) -> Result<ResearchOutcome> {
        loop {
            match self.context.current_state {
                PlannerState::Init => self.handle_init(question)?,
                PlannerState::Research => self.handle_research(question).await?,
                PlannerState::Verify => self.handle_verify()?,
                PlannerState::Synthesize => self.handle_synthesize()?,
                PlannerState::Done => {
                    return self
                        .final_result
                        .take()
                        .ok_or_else(|| Error::Internal("planner finished without a result".into()));
                }
                PlannerState::Failed => return self.handle_failed(),
            }
        }
    }

    fn handle_init(&mut self, question: &str) -> Result<()> {
        if self.session_id.is_none() {
            let session = self.store.create_session(question)?;
            self.session_id = Some(session.id);
        }

        self.context.attempt_count = 1;
        self.context.current_strategy = SearchStrategy::Base;
        self.context.current_state = PlannerState::Research;
        self.persist_status(PlannerState::Research)?;

        tracing::debug!(session = %self.session_id.unwrap_or_default(), "planner initialized");
        Ok(())
    }

    async fn handle_research(&mut self, question: &str) -> Result<()> {
        self.persist_status(PlannerState::Research)?;

        let fingerprint = compute_fingerprint(
            question,
            self.context.current_strategy,
            self.context.num_docs,
        );
        self.last_fingerprint = Some(fingerprint.clone());

        // Cache lookup happens only on retries, never on the first attempt.
        if self.context.attempt_count > 1 {
            if let Some(cached) = self.load_cached_result(&fingerprint)? {
                tracing::debug!(
                    attempt = self.context.attempt_count,
                    "cache hit, skipping research"
                );
                self.research_result = Some(cached);
                self.context.current_state = PlannerState::Verify;
                self.persist_status(PlannerState::Verify)?;
                return Ok(());
            }
        }

        let query_used = modify_query(question, self.context.current_strategy);
        let outcome = self
            .researcher
            .research(&query_used, self.context.num_docs)
            .await;

        if let Some(session_id) = self.session_id {
            self.store.log_search(
                &session_id,
                self.context.attempt_count,
                &query_used,
                self.context.num_docs as u32,
                true,
            )?;
        }

        self.research_result = Some(outcome);
        self.context.current_state = PlannerState::Verify;
        self.persist_status(PlannerState::Verify)?;
        Ok(())
    }

    /// Resolve a cache entry to a prior accepted result. Dangling
    /// references (missing session, missing snapshot, uninterpretable
    /// rows) fall through to fresh research.
    fn load_cached_result(&self, fingerprint: &str) -> Result<Option<ResearchOutcome>> {
        let Some(entry) = self.store.cache_get_valid(fingerprint, Utc::now())? else {
            return Ok(None);
        };

        let Some(snapshot) = self.store.latest_answer(&entry.session_id)? else {
            return Ok(None);
        };

        let Ok(level) = snapshot.confidence_level.parse::<ConfidenceLevel>() else {
            return Ok(None);
        };

        let evidence = self
            .store
            .list_evidence(&entry.session_id)?
            .into_iter()
            .filter_map(|row| {
                row.verification_status
                    .parse()
                    .ok()
                    .map(|status| VerifiedClaim {
                        claim: row.claim_text,
                        sources: row.source_urls,
                        status,
                    })
            })
            .collect();

        Ok(Some(ResearchOutcome {
            answer: snapshot.answer_text,
            confidence: Confidence {
                level,
                reason: snapshot.confidence_reason,
            },
            evidence,
            notes: None,
        }))
    }

    fn handle_verify(&mut self) -> Result<()> {
        self.persist_status(PlannerState::Verify)?;

        let Some(result) = self.research_result.clone() else {
            self.context.exhausted_reason =
                Some("No research result available to synthesize.".to_string());
            self.context.current_state = PlannerState::Failed;
            return Ok(());
        };

        let confidence_level = result.confidence.level;
        let confidence_reason = result.confidence.reason.clone();
        self.context.confidence_history.push(confidence_level);

        let decision = self.meta.decide(
            &result.evidence,
            Some(confidence_level),
            self.context.attempt_count,
            self.context.max_attempts,
        );

        if let Some(session_id) = self.session_id {
            self.store.log_trace(
                &session_id,
                self.context.attempt_count,
                &PlannerState::Verify.to_string(),
                &decision.kind().to_string(),
                &self.context.current_strategy.to_string(),
                self.context.num_docs as u32,
                Some(decision.reason()),
            )?;
        }

        self.context.decision_history.push(decision.kind());
        self.context
            .record_progress(confidence_level, decision.kind());

        tracing::debug!(
            attempt = self.context.attempt_count,
            decision = %decision.kind(),
            level = %confidence_level,
            "verification decision"
        );

        match decision {
            Decision::Accept { .. } => {
                self.context.current_state = PlannerState::Synthesize;
                self.persist_status(PlannerState::Synthesize)?;
            }
            Decision::Stop { reason } => {
                if let Some(result) = self.research_result.as_mut() {
                    result.notes = Some(reason);
                }
                self.context.current_state = PlannerState::Synthesize;
                self.persist_status(PlannerState::Synthesize)?;
            }
            Decision::Retry { recommendation, .. } => {
                // Stop-checks run before incrementing so attempt_count
                // reflects attempts actually executed.
                if self.should_stop() {
                    self.context.current_state = PlannerState::Failed;
                    return Ok(());
                }

                self.context.attempt_count += 1;

                if self.context.num_docs < self.context.max_docs {
                    self.context.num_docs =
                        (self.context.num_docs * 2).min(self.context.max_docs);
                }

                self.update_strategy(&confidence_reason, recommendation.as_deref());
                if self.context.current_state == PlannerState::Failed {
                    return Ok(());
                }

                self.context.current_state = PlannerState::Research;
                self.persist_status(PlannerState::Research)?;
            }
        }

        Ok(())
    }

    fn handle_synthesize(&mut self) -> Result<()> {
        self.persist_status(PlannerState::Synthesize)?;

        let Some(result) = self.research_result.clone() else {
            self.context.exhausted_reason =
                Some("No research result available to synthesize.".to_string());
            self.context.current_state = PlannerState::Failed;
            return Ok(());
        };

        if let Some(session_id) = self.session_id {
            self.store.create_answer(
                &session_id,
                &result.answer,
                &result.confidence.level.to_string(),
                &result.confidence.reason,
                result.notes.as_deref(),
            )?;

            if !result.evidence.is_empty() {
                self.store.insert_evidence(&session_id, &result.evidence)?;
            }

            self.store.update_final_status(
                &session_id,
                &PlannerState::Done.to_string(),
                &result.confidence.level.to_string(),
                &result.confidence.reason,
            )?;

            // Only accepted outcomes are cacheable; STOP synthesizes
            // without leaving a cache entry behind.
            if self.context.last_decision == Some(DecisionKind::Accept) {
                if let Some(fingerprint) = &self.last_fingerprint {
                    self.store.cache_store(
                        fingerprint,
                        &session_id,
                        Utc::now() + Duration::hours(CACHE_TTL_HOURS),
                    )?;
                }
            }
        }

        self.final_result = Some(result);
        self.context.current_state = PlannerState::Done;
        Ok(())
    }

    fn handle_failed(&mut self) -> Result<ResearchOutcome> {
        if let Some(session_id) = self.session_id {
            // Persist partial evidence if any survived the attempts.
            if let Some(result) = &self.research_result {
                if !result.evidence.is_empty() {
                    self.store.insert_evidence(&session_id, &result.evidence)?;
                }
            }

            self.store.update_final_status(
                &session_id,
                &PlannerState::Failed.to_string(),
                &ConfidenceLevel::Low.to_string(),
                self.context
                    .exhausted_reason
                    .as_deref()
                    .unwrap_or("Planner terminated execution safely."),
            )?;
        }

        tracing::debug!(
            reason = self.context.exhausted_reason.as_deref().unwrap_or("none"),
            "planner failed"
        );

        Ok(ResearchOutcome {
            answer: "The system could not confidently answer the question.".to_string(),
            confidence: Confidence::low("Planner stopped after repeated unsuccessful attempts."),
            evidence: self
                .research_result
                .as_ref()
                .map(|r| r.evidence.clone())
                .unwrap_or_default(),
            notes: Some(
                self.context
                    .exhausted_reason
                    .clone()
                    .unwrap_or_else(|| "Planner stopped safely.".to_string()),
            ),
        })
    }

    fn should_stop(&mut self) -> bool {
        if self.context.attempt_count >= self.context.max_attempts {
            self.context.exhausted_reason = Some("Maximum retry attempts reached.".to_string());
            return true;
        }

        if self.context.no_progress_count >= 3 {
            self.context.exhausted_reason =
                Some("No progress across multiple attempts.".to_string());
            return true;
        }

        false
    }

    /// Pick the next strategy from the confidence reason (the scorer's
    /// short string, never free-form oracle text) and the meta agent's
    /// recommendation.
    fn update_strategy(&mut self, confidence_reason: &str, recommendation: Option<&str>) {
        let reason = confidence_reason.to_lowercase();

        let preferred = if reason.contains("single source") {
            SearchStrategy::BroadenQuery
        } else if reason.contains("conflict") {
            SearchStrategy::AuthoritativeSites
        } else if recommendation.is_some_and(|r| !r.is_empty()) {
            SearchStrategy::ResearchFocused
        } else {
            SearchStrategy::BroadenQuery
        };

        if !self.context.strategy_history.contains(&preferred) {
            self.context.record_strategy(preferred);
            return;
        }

        for strategy in SearchStrategy::ORDER {
            if !self.context.strategy_history.contains(&strategy) {
                self.context.record_strategy(strategy);
                return;
            }
        }

        // Every strategy has been tried.
        self.context.current_state = PlannerState::Failed;
    }

    fn persist_status(&self, state: PlannerState) -> Result<()> {
        if let Some(session_id) = self.session_id {
            self.store.update_status(&session_id, &state.to_string())?;
        }
        Ok(())
    }
}

/// Deterministic query modification per strategy.
pub fn modify_query(question: &str, strategy: SearchStrategy) -> String {
    match strategy {
        SearchStrategy::Base => question.to_string(),
        SearchStrategy::BroadenQuery => format!("{} explanation overview", question),
        SearchStrategy::AuthoritativeSites => format!("{} site:gov OR site:edu", question),
        SearchStrategy::ResearchFocused => format!("{} research report policy", question),
    }
}
