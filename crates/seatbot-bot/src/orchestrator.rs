// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message reply pipeline.
//!
//! For each inbound message the orchestrator runs, in order: self/broadcast
//! and empty-text exits, conversation bookkeeping, the group and contact
//! filters, per-chat pause, global pause, the tenant enabled flag, then the
//! reply path (skills or the language model, order capture, markup cleanup,
//! paced delivery). Any failure on the reply path ends in the tenant's
//! fallback message; the customer never sees an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use seatbot_core::{
    ChannelAdapter, ChatMessage, ConversationTurn, GenerationRequest, InboundMessage,
    OutboundMessage, Presence, ProviderAdapter, SeatbotError, Speaker, TenantConfig,
};
use tracing::{debug, error, info, warn};

use crate::history::{normalize_history, normalize_turns};
use crate::order::{OrderExtractor, OrderOrigin, strip_order_tags};
use crate::skills::SkillRegistry;
use crate::state::BotState;
use crate::text::{is_broadcast_chat, is_saved_contact, strip_markup};

/// Sent when the model fails and the tenant has no fallback message.
pub const GENERIC_APOLOGY: &str =
    "Disculpa, en este momento no puedo responder. Un asesor te atenderá en breve.";

/// Sent when a reply carried only the order marker.
pub fn order_confirmation(platform: &str) -> String {
    format!("¡Listo! Tu pedido de {platform} quedó registrado. En breve te enviamos los datos de acceso.")
}

/// Why a message got no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    FromSelf,
    Broadcast,
    EmptyText,
    GroupFiltered,
    SavedFiltered,
    UnsavedFiltered,
    ChatPaused,
    GlobalPause,
    TenantDisabled,
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Model,
    Skill,
    Fallback,
}

/// Outcome of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Ignored(IgnoreReason),
    Replied { text: String, source: ReplySource },
}

impl Disposition {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

/// Chat facts captured while the conversation lock was held.
struct ChatView {
    chat_id: String,
    display_name: String,
    phone: String,
    history: Vec<ChatMessage>,
}

/// The tenant's fallback text, or the generic apology when unset.
pub fn fallback_text(config: &TenantConfig) -> String {
    if config.fallback_message.trim().is_empty() {
        GENERIC_APOLOGY.to_string()
    } else {
        config.fallback_message.clone()
    }
}

pub struct ResponseOrchestrator {
    state: Arc<BotState>,
    channel: Arc<dyn ChannelAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    skills: SkillRegistry,
    extractor: OrderExtractor,
}

impl ResponseOrchestrator {
    pub fn new(
        state: Arc<BotState>,
        channel: Arc<dyn ChannelAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        skills: SkillRegistry,
    ) -> Self {
        let extractor = OrderExtractor::new(state.ledger.clone());
        Self {
            state,
            channel,
            provider,
            skills,
            extractor,
        }
    }

    pub fn state(&self) -> &Arc<BotState> {
        &self.state
    }

    pub fn channel(&self) -> &Arc<dyn ChannelAdapter> {
        &self.channel
    }

    /// Runs the full pipeline for one inbound message.
    pub async fn handle_inbound(&self, msg: InboundMessage) -> Disposition {
        if msg.from_me {
            return ignored(&msg.chat_id, IgnoreReason::FromSelf);
        }
        if is_broadcast_chat(&msg.chat_id) {
            return ignored(&msg.chat_id, IgnoreReason::Broadcast);
        }
        let text = msg.text.trim();
        if text.is_empty() {
            return ignored(&msg.chat_id, IgnoreReason::EmptyText);
        }

        let slot = self
            .state
            .conversations
            .get_or_create(&msg.chat_id, msg.push_name.as_deref());
        let _turn = slot.lock_turn().await;

        let (view, is_group, chat_paused) = {
            let mut conversation = slot.state().await;
            conversation.refresh_display_name(msg.push_name.as_deref());
            let stored = conversation.messages();
            let skip = stored.len().saturating_sub(self.state.limits.history_turns);
            let history: Vec<ChatMessage> = stored.iter().skip(skip).cloned().collect();
            conversation.append(Speaker::Customer, text, Utc::now());
            conversation.unread_count = conversation.unread_count.saturating_add(1);
            (
                ChatView {
                    chat_id: conversation.chat_id.clone(),
                    display_name: conversation.display_name.clone(),
                    phone: conversation.phone_number.clone(),
                    history,
                },
                conversation.is_group,
                conversation.paused,
            )
        };

        let config = self.state.tenant_config().await;
        let settings = self.state.settings().await;

        if is_group && !settings.respond_groups {
            return ignored(&view.chat_id, IgnoreReason::GroupFiltered);
        }
        if !is_group {
            let saved = is_saved_contact(&view.display_name, &view.phone);
            if saved && !settings.respond_saved {
                return ignored(&view.chat_id, IgnoreReason::SavedFiltered);
            }
            if !saved && !settings.respond_unsaved {
                return ignored(&view.chat_id, IgnoreReason::UnsavedFiltered);
            }
        }
        if chat_paused {
            return ignored(&view.chat_id, IgnoreReason::ChatPaused);
        }
        if self.state.is_globally_paused() {
            return ignored(&view.chat_id, IgnoreReason::GlobalPause);
        }
        if !config.enabled {
            return ignored(&view.chat_id, IgnoreReason::TenantDisabled);
        }

        match self.reply(&view, text, &config).await {
            Ok(disposition) => {
                if let Disposition::Replied { text, source } = &disposition {
                    slot.state().await.append(Speaker::Bot, text.clone(), Utc::now());
                    info!(chat_id = %view.chat_id, ?source, "reply delivered");
                }
                disposition
            }
            Err(e) => {
                error!(chat_id = %view.chat_id, error = %e, "reply pipeline failed, sending fallback");
                let fallback = fallback_text(&config);
                self.send_best_effort(&view.chat_id, &fallback).await;
                slot.state().await.append(Speaker::Bot, fallback.clone(), Utc::now());
                Disposition::Replied {
                    text: fallback,
                    source: ReplySource::Fallback,
                }
            }
        }
    }

    async fn reply(
        &self,
        view: &ChatView,
        text: &str,
        config: &TenantConfig,
    ) -> Result<Disposition, SeatbotError> {
        if let Err(e) = self.channel.mark_read(&view.chat_id).await {
            debug!(chat_id = %view.chat_id, error = %e, "mark read failed");
        }
        if let Err(e) = self.channel.set_presence(&view.chat_id, Presence::Composing).await {
            debug!(chat_id = %view.chat_id, error = %e, "composing presence failed");
        }

        let (raw, source) = match self.skills.try_handle(text).await? {
            Some(response) => (response, ReplySource::Skill),
            None => {
                let max_tokens = config.max_tokens.unwrap_or(self.state.limits.live_max_tokens);
                match self.generate(config, &view.history, text, max_tokens).await {
                    Ok(reply) if !reply.trim().is_empty() => (reply, ReplySource::Model),
                    Ok(_) => {
                        warn!(chat_id = %view.chat_id, "model returned empty reply, using fallback");
                        (fallback_text(config), ReplySource::Fallback)
                    }
                    Err(e) => {
                        warn!(chat_id = %view.chat_id, error = %e, "model call failed, using fallback");
                        (fallback_text(config), ReplySource::Fallback)
                    }
                }
            }
        };

        let (cleaned, source) = match source {
            ReplySource::Fallback => (raw, source),
            _ => {
                let origin = OrderOrigin {
                    chat_id: &view.chat_id,
                    phone: &view.phone,
                    display_name: &view.display_name,
                };
                let extraction = self.extractor.extract(&raw, origin).await;
                if let Some(order) = &extraction.order {
                    info!(chat_id = %view.chat_id, order_id = order.id, "order captured from reply");
                }
                let cleaned = strip_markup(&extraction.cleaned_text);
                match (cleaned.is_empty(), &extraction.order) {
                    (false, _) => (cleaned, source),
                    (true, Some(order)) => (order_confirmation(&order.platform), source),
                    (true, None) => (fallback_text(config), ReplySource::Fallback),
                }
            }
        };

        self.pace().await;
        match self.deliver(&view.chat_id, &cleaned).await {
            Ok(()) => {}
            Err(e) => {
                error!(chat_id = %view.chat_id, error = %e, "reply send failed");
                let fallback = fallback_text(config);
                if fallback != cleaned {
                    self.send_best_effort(&view.chat_id, &fallback).await;
                }
            }
        }
        if let Err(e) = self.channel.set_presence(&view.chat_id, Presence::Paused).await {
            debug!(chat_id = %view.chat_id, error = %e, "paused presence failed");
        }

        Ok(Disposition::Replied { text: cleaned, source })
    }

    async fn generate(
        &self,
        config: &TenantConfig,
        history: &[ChatMessage],
        text: &str,
        max_tokens: u32,
    ) -> Result<String, SeatbotError> {
        let turns = normalize_history(history, text, self.state.limits.history_turns);
        self.call_model(config, turns, max_tokens).await
    }

    async fn call_model(
        &self,
        config: &TenantConfig,
        turns: Vec<ConversationTurn>,
        max_tokens: u32,
    ) -> Result<String, SeatbotError> {
        let inventory = self.state.available_accounts().await;
        let system_prompt = self.state.prompt.build_system_prompt(config, &inventory).await;
        let request = GenerationRequest::new(system_prompt, turns, max_tokens);

        let timeout = self.state.limits.reply_timeout;
        match tokio::time::timeout(timeout, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(SeatbotError::Timeout { duration: timeout }),
        }
    }

    /// Answers a message outside any chat: no history is stored, no order is
    /// recorded and no pause or filter applies.
    pub async fn generate_stateless(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, SeatbotError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SeatbotError::InvalidInput("message must not be empty".into()));
        }

        let config = self.state.tenant_config().await;
        let max_tokens = config.max_tokens.unwrap_or(self.state.limits.api_max_tokens);
        let turns = normalize_turns(
            history
                .iter()
                .cloned()
                .chain(std::iter::once(ConversationTurn::user(message))),
        );

        let reply = match self.call_model(&config, turns, max_tokens).await {
            Ok(reply) => strip_markup(&strip_order_tags(&reply)),
            Err(e) => {
                warn!(error = %e, "stateless generation failed, using fallback");
                String::new()
            }
        };
        if reply.is_empty() {
            return Ok(fallback_text(&config));
        }
        Ok(reply)
    }

    /// Sends an operator-typed message into an existing chat.
    pub async fn send_agent_reply(&self, chat_id: &str, text: &str) -> Result<ChatMessage, SeatbotError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SeatbotError::InvalidInput("reply text must not be empty".into()));
        }
        let slot = self
            .state
            .conversations
            .get(chat_id)
            .ok_or_else(|| SeatbotError::conversation_not_found(chat_id))?;

        self.deliver(chat_id, text).await?;
        let message = slot.state().await.append(Speaker::Agent, text, Utc::now());
        info!(chat_id, "agent reply sent");
        Ok(message)
    }

    /// Sends through the channel and counts the delivery.
    pub(crate) async fn deliver(&self, chat_id: &str, text: &str) -> Result<(), SeatbotError> {
        self.channel
            .send(OutboundMessage {
                chat_id: chat_id.to_string(),
                text: text.to_string(),
            })
            .await?;
        self.state.record_sent();
        Ok(())
    }

    async fn send_best_effort(&self, chat_id: &str, text: &str) {
        if let Err(e) = self.deliver(chat_id, text).await {
            error!(chat_id, error = %e, "fallback send failed");
        }
    }

    async fn pace(&self) {
        let delay = pacing_delay(
            self.state.limits.reply_delay_min_ms,
            self.state.limits.reply_delay_max_ms,
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn ignored(chat_id: &str, reason: IgnoreReason) -> Disposition {
    debug!(chat_id, ?reason, "message ignored");
    Disposition::Ignored(reason)
}

/// Uniform random delay in `[min_ms, max_ms]`.
fn pacing_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbot_config::model::BotConfig;
    use seatbot_test_utils::{MockChannel, MockProvider, MockSkill};

    fn inbound(chat_id: &str, text: &str) -> InboundMessage {
        InboundMessage {
            id: "wamid.1".into(),
            chat_id: chat_id.into(),
            from_me: false,
            push_name: Some("Ana".into()),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    fn bot_config() -> BotConfig {
        BotConfig {
            reply_delay_min_ms: 0,
            reply_delay_max_ms: 0,
            ..BotConfig::default()
        }
    }

    fn orchestrator(
        provider: Arc<MockProvider>,
        channel: Arc<MockChannel>,
        skills: SkillRegistry,
    ) -> ResponseOrchestrator {
        let state = BotState::new(&bot_config(), None);
        ResponseOrchestrator::new(state, channel, provider, skills)
    }

    #[tokio::test]
    async fn self_broadcast_and_empty_leave_no_trace() {
        let channel = Arc::new(MockChannel::new());
        let orch = orchestrator(Arc::new(MockProvider::new()), channel.clone(), SkillRegistry::new());

        let mut own = inbound("1@s.whatsapp.net", "hola");
        own.from_me = true;
        assert_eq!(orch.handle_inbound(own).await, Disposition::Ignored(IgnoreReason::FromSelf));
        assert_eq!(
            orch.handle_inbound(inbound("status@broadcast", "hola")).await,
            Disposition::Ignored(IgnoreReason::Broadcast)
        );
        assert_eq!(
            orch.handle_inbound(inbound("1@s.whatsapp.net", "   ")).await,
            Disposition::Ignored(IgnoreReason::EmptyText)
        );
        assert!(orch.state().conversations.is_empty());
        assert!(channel.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn model_reply_is_cleaned_and_recorded() {
        let provider = Arc::new(MockProvider::new());
        provider.push_reply("**¡Hola Ana!** Tenemos Netflix disponible.").await;
        let channel = Arc::new(MockChannel::new());
        let orch = orchestrator(provider.clone(), channel.clone(), SkillRegistry::new());

        let disposition = orch.handle_inbound(inbound("1@s.whatsapp.net", "hola")).await;
        assert_eq!(
            disposition,
            Disposition::Replied {
                text: "¡Hola Ana! Tenemos Netflix disponible.".into(),
                source: ReplySource::Model
            }
        );

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "¡Hola Ana! Tenemos Netflix disponible.");
        assert_eq!(orch.state().sent_count(), 1);
        let presence = channel.presence_log().await;
        assert_eq!(
            presence.last(),
            Some(&("1@s.whatsapp.net".to_string(), Presence::Paused))
        );

        let request = provider.last_request().await.unwrap();
        assert_eq!(request.max_tokens, 600);
        assert_eq!(request.turns, vec![ConversationTurn::user("hola")]);

        let detail = orch.state().conversations.detail("1@s.whatsapp.net").await.unwrap();
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[1].from, Speaker::Bot);
        assert_eq!(detail.summary.unread_count, 1);
    }

    #[tokio::test]
    async fn skill_answer_skips_model() {
        let provider = Arc::new(MockProvider::new());
        let channel = Arc::new(MockChannel::new());
        let mut skills = SkillRegistry::new();
        skills.register(Arc::new(MockSkill::new("code", "fn main").responding("Ese código compila.")));
        let orch = orchestrator(provider.clone(), channel.clone(), skills);

        let disposition = orch.handle_inbound(inbound("1@s.whatsapp.net", "fn main() {}")).await;
        assert_eq!(
            disposition,
            Disposition::Replied {
                text: "Ese código compila.".into(),
                source: ReplySource::Skill
            }
        );
        assert_eq!(provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn skill_error_sends_fallback() {
        let channel = Arc::new(MockChannel::new());
        let mut skills = SkillRegistry::new();
        skills.register(Arc::new(MockSkill::new("code", "fn").failing()));
        let orch = orchestrator(Arc::new(MockProvider::new()), channel.clone(), skills);

        let disposition = orch.handle_inbound(inbound("1@s.whatsapp.net", "fn x")).await;
        assert_eq!(
            disposition,
            Disposition::Replied {
                text: GENERIC_APOLOGY.into(),
                source: ReplySource::Fallback
            }
        );
        assert_eq!(channel.sent_messages().await[0].text, GENERIC_APOLOGY);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_model_times_out_to_fallback() {
        let provider = Arc::new(MockProvider::new());
        provider.hang_next().await;
        let channel = Arc::new(MockChannel::new());
        let orch = orchestrator(provider, channel.clone(), SkillRegistry::new());

        let disposition = orch.handle_inbound(inbound("1@s.whatsapp.net", "hola")).await;
        assert_eq!(
            disposition,
            Disposition::Replied {
                text: GENERIC_APOLOGY.into(),
                source: ReplySource::Fallback
            }
        );
    }

    #[tokio::test]
    async fn send_failure_still_records_intended_reply() {
        let provider = Arc::new(MockProvider::new());
        provider.push_reply("Claro, ¿cuántos perfiles?").await;
        let channel = Arc::new(MockChannel::new());
        channel.fail_sends(true);
        let orch = orchestrator(provider, channel.clone(), SkillRegistry::new());

        orch.handle_inbound(inbound("1@s.whatsapp.net", "quiero netflix")).await;
        let detail = orch.state().conversations.detail("1@s.whatsapp.net").await.unwrap();
        assert_eq!(detail.messages.last().unwrap().text, "Claro, ¿cuántos perfiles?");
        assert_eq!(orch.state().sent_count(), 0);
    }

    #[tokio::test]
    async fn tag_only_reply_confirms_the_order() {
        let channel = Arc::new(MockChannel::new());
        let provider = Arc::new(MockProvider::new());
        provider
            .push_reply("[PEDIDO_CONFIRMADO]{\"plataforma\":\"Netflix\",\"cantidad\":1}")
            .await;
        let orch = orchestrator(provider, channel.clone(), SkillRegistry::new());

        let disposition = orch.handle_inbound(inbound("1@s.whatsapp.net", "sí, confirmo")).await;
        let expected = order_confirmation("Netflix");
        assert_eq!(
            disposition,
            Disposition::Replied {
                text: expected.clone(),
                source: ReplySource::Model,
            }
        );
        assert_eq!(channel.sent_messages().await[0].text, expected);
        assert_ne!(expected, GENERIC_APOLOGY);
        assert_eq!(orch.state().ledger.list().await.len(), 1);
    }

    #[tokio::test]
    async fn stateless_generation_uses_api_token_cap_and_strips_tags() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_reply("Listo. [PEDIDO_CONFIRMADO]{\"plataforma\":\"Netflix\"}")
            .await;
        let orch = orchestrator(provider.clone(), Arc::new(MockChannel::new()), SkillRegistry::new());

        let history = [
            ConversationTurn::assistant("¡Hola!"),
            ConversationTurn::user("quiero netflix"),
        ];
        let reply = orch.generate_stateless("sí, confirmo", &history).await.unwrap();
        assert_eq!(reply, "Listo.");
        assert!(orch.state().ledger.is_empty().await);
        assert!(orch.state().conversations.is_empty());

        let request = provider.last_request().await.unwrap();
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.turns, vec![ConversationTurn::user("quiero netflix\nsí, confirmo")]);

        assert!(matches!(
            orch.generate_stateless("  ", &[]).await,
            Err(SeatbotError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn agent_reply_requires_known_chat() {
        let channel = Arc::new(MockChannel::new());
        let provider = Arc::new(MockProvider::new());
        provider.push_reply("hola").await;
        let orch = orchestrator(provider, channel.clone(), SkillRegistry::new());

        assert!(orch.send_agent_reply("9@s.whatsapp.net", "hola").await.unwrap_err().is_not_found());

        orch.handle_inbound(inbound("1@s.whatsapp.net", "hola")).await;
        let message = orch.send_agent_reply("1@s.whatsapp.net", "Te atiende Luis").await.unwrap();
        assert_eq!(message.from, Speaker::Agent);
        assert_eq!(channel.sent_messages().await.last().unwrap().text, "Te atiende Luis");
    }

    #[test]
    fn pacing_delay_stays_in_range() {
        for _ in 0..100 {
            let delay = pacing_delay(800, 2300);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(2300));
        }
        assert_eq!(pacing_delay(0, 0), Duration::ZERO);
    }

    #[test]
    fn fallback_prefers_tenant_text() {
        let config = TenantConfig {
            fallback_message: " Te escribimos pronto ".into(),
            ..TenantConfig::default()
        };
        assert_eq!(fallback_text(&config), " Te escribimos pronto ");
        assert_eq!(fallback_text(&TenantConfig::default()), GENERIC_APOLOGY);
    }
}
