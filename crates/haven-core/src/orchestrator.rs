//! Per-message decision tree
//!
//! One `handle` call per inbound message: command check → risk
//! assessment → crisis or normal branch → storage writes → outbound send
//! → session update. State between messages lives only in the session;
//! the next message re-enters at the top with whatever was left behind.
//!
//! Failure discipline: storage writes are logged and swallowed; a failed
//! generation substitutes a fixed safe text; a failed send gets one
//! retry with a minimal text; anything that still escapes is caught at
//! the `handle` boundary and turned into a hotline fallback message plus
//! a structured failure outcome.

use crate::commands::{command_reply, Command};
use crate::error::{Error, Result};
use crate::signals::{derive_mood, derive_topic};
use chrono::Utc;
use haven_llm::ResponseGenerator;
use haven_risk::{assess_risk, crisis_response, preview, RiskAssessment, RiskLevel};
use haven_sms::SmsTransport;
use haven_store::{
    ConversationRecord, CrisisEventRecord, Direction, DurableStore, SessionManager,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sent when generation fails for a user not flagged in-crisis
const SAFE_FALLBACK_TEXT: &str =
    "I'm having a little trouble finding my words right now, but I'm \
     still here with you. Tell me more?";

/// Sent when generation fails for a user flagged in-crisis
const CRISIS_SAFE_FALLBACK_TEXT: &str =
    "I'm here with you. If things feel like too much right now, you can \
     call or text 988 any time - the Suicide & Crisis Lifeline is open \
     24/7.";

/// Minimal retry body after a failed send
const MINIMAL_FALLBACK_TEXT: &str = "I'm here. If you need help right now, call or text 988.";

/// Last-resort message when handling itself fails
const FAILURE_FALLBACK_TEXT: &str =
    "Something went wrong on my end. I'm still here - and if you need \
     immediate support, call or text 988.";

/// Structured result of handling one inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleOutcome {
    /// Whether handling completed without an unrecovered failure
    pub success: bool,
    /// The assistant text sent to the user, if any
    pub response: Option<String>,
    /// The assessed risk level (absent for commands and no-ops)
    pub risk_level: Option<RiskLevel>,
    /// Failure description when `success` is false
    pub error: Option<String>,
}

impl HandleOutcome {
    fn replied(response: String, risk_level: Option<RiskLevel>) -> Self {
        Self {
            success: true,
            response: Some(response),
            risk_level,
            error: None,
        }
    }

    fn ignored() -> Self {
        Self {
            success: true,
            response: None,
            risk_level: None,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            response: None,
            risk_level: None,
            error: Some(error),
        }
    }
}

/// Conversation orchestrator, constructed once at startup
pub struct Orchestrator {
    sessions: Arc<SessionManager>,
    durable: Arc<dyn DurableStore>,
    generator: Arc<dyn ResponseGenerator>,
    transport: Arc<dyn SmsTransport>,
    max_inbound_chars: usize,
}

impl Orchestrator {
    /// Create an orchestrator over the given collaborators
    #[must_use]
    pub fn new(
        sessions: Arc<SessionManager>,
        durable: Arc<dyn DurableStore>,
        generator: Arc<dyn ResponseGenerator>,
        transport: Arc<dyn SmsTransport>,
    ) -> Self {
        Self {
            sessions,
            durable,
            generator,
            transport,
            max_inbound_chars: haven_sms::MAX_SMS_LENGTH,
        }
    }

    /// Override the inbound length cap
    #[must_use]
    pub fn with_max_inbound_chars(mut self, max: usize) -> Self {
        self.max_inbound_chars = max;
        self
    }

    /// Handle one inbound message from `user_id`.
    ///
    /// Never returns an error and never panics across the boundary; every
    /// failure mode degrades into the structured outcome.
    pub async fn handle(&self, user_id: &str, message_text: &str) -> HandleOutcome {
        let text = message_text.trim();
        if text.is_empty() || text.chars().count() > self.max_inbound_chars {
            debug!(user_id = %user_id, len = text.len(), "inbound message ignored");
            return HandleOutcome::ignored();
        }

        match self.handle_inner(user_id, text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "message handling failed");
                // Exactly one fallback attempt, then give up.
                if let Err(send_err) = self.transport.send(user_id, FAILURE_FALLBACK_TEXT).await {
                    warn!(user_id = %user_id, error = %send_err, "failure fallback send failed");
                }
                HandleOutcome::failed(e.to_string())
            }
        }
    }

    async fn handle_inner(&self, user_id: &str, text: &str) -> Result<HandleOutcome> {
        if let Some(command) = Command::parse(text) {
            return self.handle_command(user_id, text, command).await;
        }

        let assessment = assess_risk(text);
        self.record_user_activity(user_id, assessment.level).await;

        if assessment.level.is_crisis() {
            self.handle_crisis(user_id, text, &assessment).await
        } else {
            self.handle_normal(user_id, text, &assessment).await
        }
    }

    /// Command branch: canned reply, no risk assessment.
    async fn handle_command(
        &self,
        user_id: &str,
        text: &str,
        command: Command,
    ) -> Result<HandleOutcome> {
        info!(user_id = %user_id, command = command.as_str(), "command received");

        match command {
            Command::Stop => {
                if let Err(e) = self.durable.set_user_active(user_id, false).await {
                    warn!(user_id = %user_id, error = %e, "could not deactivate user");
                }
            }
            Command::Start => {
                if let Err(e) = self.durable.set_user_active(user_id, true).await {
                    warn!(user_id = %user_id, error = %e, "could not reactivate user");
                }
            }
            Command::Resources => {
                self.sessions.mark_resources_seen(user_id).await;
            }
            Command::Help => {}
        }

        let reply = command_reply(command);
        self.store_exchange(user_id, text, &reply, None).await;
        self.send_with_retry(user_id, &reply).await?;

        Ok(HandleOutcome::replied(reply, None))
    }

    /// Crisis branch: mandatory canned response first, optional generated
    /// follow-up second. The follow-up's outcome never gates, delays, or
    /// rolls back the crisis delivery.
    async fn handle_crisis(
        &self,
        user_id: &str,
        text: &str,
        assessment: &RiskAssessment,
    ) -> Result<HandleOutcome> {
        let event = CrisisEventRecord {
            id: None,
            phone_number: user_id.to_string(),
            risk_level: assessment.level,
            risk_categories: assessment.categories.clone(),
            message_preview: preview(text),
            escalated: assessment.level.requires_human_escalation(),
            resolved: false,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.durable.record_crisis_event(&event).await {
            warn!(user_id = %user_id, error = %e, "crisis event not persisted");
        }

        warn!(
            user_id = %user_id,
            level = %assessment.level,
            categories = ?assessment.categories,
            immediate = assessment.requires_immediate_intervention,
            "crisis intervention triggered"
        );

        // The template covers every crisis level; the fallback literal is
        // unreachable but keeps the send unconditional.
        let crisis_text =
            crisis_response(assessment).unwrap_or_else(|| CRISIS_SAFE_FALLBACK_TEXT.to_string());

        self.store_exchange(user_id, text, &crisis_text, Some(assessment))
            .await;
        self.send_with_retry(user_id, &crisis_text).await?;

        // Independent follow-up with risk context injected.
        let followup = self.try_crisis_followup(user_id, text, assessment).await;

        let assistant_turn = match &followup {
            Some(f) => format!("{}\n{}", crisis_text, f),
            None => crisis_text,
        };
        let session = self
            .sessions
            .update_context(user_id, text, &assistant_turn, assessment)
            .await;
        debug!(user_id = %user_id, in_crisis = session.flags.in_crisis, "crisis session updated");

        Ok(HandleOutcome::replied(
            assistant_turn,
            Some(assessment.level),
        ))
    }

    /// Best-effort conversational follow-up after a crisis send.
    async fn try_crisis_followup(
        &self,
        user_id: &str,
        text: &str,
        assessment: &RiskAssessment,
    ) -> Option<String> {
        let mut snapshot = self.sessions.get_context_for_ai(user_id).await;
        snapshot.in_crisis = true;
        if assessment.level > snapshot.risk_level {
            snapshot.risk_level = assessment.level;
        }

        let generated = match self.generator.generate(text, &snapshot).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "crisis follow-up generation failed");
                return None;
            }
        };

        match self.transport.send(user_id, &generated).await {
            Ok(_) => {
                self.store_outgoing(user_id, &generated).await;
                Some(generated)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "crisis follow-up send failed");
                None
            }
        }
    }

    /// Normal branch: generated reply with safe fallback, then session
    /// bookkeeping and mood/topic derivation.
    async fn handle_normal(
        &self,
        user_id: &str,
        text: &str,
        assessment: &RiskAssessment,
    ) -> Result<HandleOutcome> {
        self.close_open_checkin(user_id, text).await;

        let snapshot = self.sessions.get_context_for_ai(user_id).await;
        let reply = match self.generator.generate(text, &snapshot).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "generation failed, substituting safe text");
                if snapshot.in_crisis {
                    CRISIS_SAFE_FALLBACK_TEXT.to_string()
                } else {
                    SAFE_FALLBACK_TEXT.to_string()
                }
            }
        };

        self.store_exchange(user_id, text, &reply, Some(assessment))
            .await;
        self.send_with_retry(user_id, &reply).await?;
        self.sessions
            .update_context(user_id, text, &reply, assessment)
            .await;

        let mood = derive_mood(text);
        self.sessions.update_mood(user_id, mood).await;
        if let Some(topic) = derive_topic(text) {
            self.sessions.set_topic(user_id, topic).await;
        }

        Ok(HandleOutcome::replied(reply, Some(assessment.level)))
    }

    /// Send with one bounded retry: on failure, log and try once more
    /// with the minimal fallback text, then give up.
    async fn send_with_retry(&self, user_id: &str, body: &str) -> Result<()> {
        match self.transport.send(user_id, body).await {
            Ok(sid) => {
                debug!(user_id = %user_id, sid = %sid, "reply sent");
                Ok(())
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "send failed, retrying with minimal text");
                self.transport
                    .send(user_id, MINIMAL_FALLBACK_TEXT)
                    .await
                    .map(|_| ())
                    .map_err(Error::from)
            }
        }
    }

    /// Best-effort profile upkeep for one handled message.
    async fn record_user_activity(&self, user_id: &str, level: RiskLevel) {
        if let Err(e) = self.durable.upsert_user_activity(user_id, level).await {
            warn!(user_id = %user_id, error = %e, "user activity not recorded");
        }
    }

    /// Best-effort conversation-log writes for both sides of an exchange.
    async fn store_exchange(
        &self,
        user_id: &str,
        inbound: &str,
        outbound: &str,
        assessment: Option<&RiskAssessment>,
    ) {
        let incoming = ConversationRecord {
            phone_number: user_id.to_string(),
            message: inbound.to_string(),
            direction: Direction::Incoming,
            risk_level: assessment.map_or(RiskLevel::None, |a| a.level),
            risk_categories: assessment.map_or_else(Vec::new, |a| a.categories.clone()),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.durable.record_conversation(&incoming).await {
            warn!(user_id = %user_id, error = %e, "incoming message not logged");
        }

        self.store_outgoing(user_id, outbound).await;
    }

    async fn store_outgoing(&self, user_id: &str, outbound: &str) {
        let record = ConversationRecord {
            phone_number: user_id.to_string(),
            message: outbound.to_string(),
            direction: Direction::Outgoing,
            risk_level: RiskLevel::None,
            risk_categories: Vec::new(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.durable.record_conversation(&record).await {
            warn!(user_id = %user_id, error = %e, "outgoing message not logged");
        }
    }

    /// Mark the most recent unresponded check-in answered by this message.
    async fn close_open_checkin(&self, user_id: &str, text: &str) {
        match self.durable.open_checkin(user_id).await {
            Ok(Some(checkin)) => {
                if let Err(e) = self.durable.mark_checkin_responded(checkin.id, text).await {
                    warn!(user_id = %user_id, error = %e, "check-in not marked responded");
                } else {
                    debug!(user_id = %user_id, checkin_id = checkin.id, "check-in responded");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(user_id = %user_id, error = %e, "check-in lookup failed"),
        }
    }
}
