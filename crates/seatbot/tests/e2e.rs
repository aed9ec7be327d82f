// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete reply pipeline.
//!
//! Each test builds an isolated TestHarness with mock channel, provider and
//! tenant data. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use seatbot_bot::{
    BotRuntime, Disposition, IgnoreReason, OrderDraft, ReplySource, RuntimeOptions,
    run_due_schedules,
};
use seatbot_core::{BotSettings, InventoryEntry, OrderStatus, Speaker, TenantConfig, TurnRole};
use seatbot_test_utils::{MockSkill, TestHarness, inbound};
use tokio_util::sync::CancellationToken;

const CUSTOMER: &str = "5215550001111@s.whatsapp.net";
const GROUP: &str = "120363025555555555@g.us";

fn tenant(fallback: &str) -> TenantConfig {
    TenantConfig {
        business_name: "Streamy".into(),
        fallback_message: fallback.into(),
        ..TenantConfig::default()
    }
}

// ---- Message-to-response pipeline ----

#[tokio::test]
async fn test_customer_message_gets_model_reply() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["¡Hola! Tenemos **Netflix** disponible.".to_string()])
        .with_inventory(vec![InventoryEntry {
            platform: "Netflix".into(),
            total_seats: 5,
            occupied_seats: 2,
        }])
        .build()
        .await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    assert_eq!(
        outcome,
        Disposition::Replied {
            text: "¡Hola! Tenemos Netflix disponible.".into(),
            source: ReplySource::Model,
        }
    );

    let sent = harness.mock_channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, CUSTOMER);
    assert_eq!(harness.state.sent_count(), 1);

    let request = harness.mock_provider.last_request().await.unwrap();
    assert!(request.system_prompt.contains("StreamBot"));
    assert!(request.system_prompt.contains("Netflix: 3 perfiles disponibles"));

    let slot = harness.state.conversations.get(CUSTOMER).unwrap();
    let conversation = slot.state().await;
    let froms: Vec<Speaker> = conversation.messages().iter().map(|m| m.from).collect();
    assert_eq!(froms, vec![Speaker::Customer, Speaker::Bot]);
    assert_eq!(conversation.display_name, "Ana");
}

// ---- Filters ----

#[tokio::test]
async fn test_group_message_is_stored_but_not_answered() {
    let harness = TestHarness::builder().build().await;

    let outcome = harness.send_message(GROUP, Some("Familia"), "¿alguien tiene Netflix?").await;
    assert_eq!(outcome, Disposition::Ignored(IgnoreReason::GroupFiltered));

    assert_eq!(harness.mock_channel.sent_count().await, 0);
    assert_eq!(harness.mock_provider.call_count().await, 0);

    let summary = harness.state.conversations.list().await;
    assert_eq!(summary.len(), 1);
    assert!(summary[0].is_group);
    assert_eq!(summary[0].unread_count, 1);
}

#[tokio::test]
async fn test_groups_answered_when_enabled() {
    let harness = TestHarness::builder()
        .with_tenant_config(TenantConfig {
            settings: BotSettings {
                respond_groups: true,
                ..BotSettings::default()
            },
            ..TenantConfig::default()
        })
        .build()
        .await;

    let outcome = harness.send_message(GROUP, Some("Familia"), "precios?").await;
    assert!(!outcome.is_ignored());
}

#[tokio::test]
async fn test_saved_and_unsaved_contact_filters() {
    let harness = TestHarness::builder()
        .with_tenant_config(TenantConfig {
            settings: BotSettings {
                respond_saved: false,
                respond_unsaved: true,
                respond_groups: false,
            },
            ..TenantConfig::default()
        })
        .build()
        .await;

    let saved = harness.send_message(CUSTOMER, Some("Ana López"), "hola").await;
    assert_eq!(saved, Disposition::Ignored(IgnoreReason::SavedFiltered));

    let unsaved = harness
        .send_message("5215550002222@s.whatsapp.net", Some("+52 1 555 000 2222"), "hola")
        .await;
    assert!(!unsaved.is_ignored());
}

#[tokio::test]
async fn test_global_pause_skips_the_model() {
    let harness = TestHarness::builder().build().await;
    harness.state.set_globally_paused(true);

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    assert_eq!(outcome, Disposition::Ignored(IgnoreReason::GlobalPause));
    assert_eq!(harness.mock_provider.call_count().await, 0);
    assert_eq!(harness.mock_channel.sent_count().await, 0);

    // The customer message is still kept for the operator.
    let detail = harness.state.conversations.detail(CUSTOMER).await.unwrap();
    assert_eq!(detail.messages.len(), 1);
}

#[tokio::test]
async fn test_disabled_tenant_is_silent() {
    let harness = TestHarness::builder()
        .with_tenant_config(TenantConfig {
            enabled: false,
            ..TenantConfig::default()
        })
        .build()
        .await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    assert_eq!(outcome, Disposition::Ignored(IgnoreReason::TenantDisabled));
}

#[tokio::test]
async fn test_own_and_broadcast_messages_are_dropped() {
    let harness = TestHarness::builder().build().await;

    let mut own = inbound(CUSTOMER, None, "mensaje propio");
    own.from_me = true;
    assert_eq!(
        harness.orchestrator.handle_inbound(own).await,
        Disposition::Ignored(IgnoreReason::FromSelf)
    );

    let status = harness.send_message("status@broadcast", None, "historia").await;
    assert_eq!(status, Disposition::Ignored(IgnoreReason::Broadcast));

    assert!(harness.state.conversations.is_empty());
}

// ---- Fallback ----

#[tokio::test]
async fn test_llm_outage_sends_exact_fallback() {
    let fallback = "Un asesor te responde en unos minutos 🙏";
    let harness = TestHarness::builder()
        .with_tenant_config(tenant(fallback))
        .build()
        .await;
    harness.mock_provider.push_error("quota exceeded").await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    assert_eq!(
        outcome,
        Disposition::Replied {
            text: fallback.into(),
            source: ReplySource::Fallback,
        }
    );

    let sent = harness.mock_channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, fallback);

    let slot = harness.state.conversations.get(CUSTOMER).unwrap();
    let last = slot.state().await.messages().back().cloned().unwrap();
    assert_eq!(last.from, Speaker::Bot);
    assert_eq!(last.text, fallback);
}

#[tokio::test(start_paused = true)]
async fn test_hung_model_times_out_to_fallback() {
    let harness = TestHarness::builder()
        .with_tenant_config(tenant("Dame un momento"))
        .build()
        .await;
    harness.mock_provider.hang_next().await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    assert_eq!(
        outcome,
        Disposition::Replied {
            text: "Dame un momento".into(),
            source: ReplySource::Fallback,
        }
    );
}

// ---- Orders ----

#[tokio::test]
async fn test_order_tag_is_recorded_and_hidden() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "¡Listo, Ana! Tu pedido quedó registrado.\n[PEDIDO_CONFIRMADO] {\"plataforma\": \"Netflix\", \"cantidad\": 2}"
                .to_string(),
        ])
        .build()
        .await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "quiero 2 de Netflix").await;
    assert_eq!(
        outcome,
        Disposition::Replied {
            text: "¡Listo, Ana! Tu pedido quedó registrado.".into(),
            source: ReplySource::Model,
        }
    );

    let sent = harness.mock_channel.sent_messages().await;
    assert!(!sent[0].text.contains("PEDIDO_CONFIRMADO"));

    let orders = harness.state.ledger.list().await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.platform, "Netflix");
    assert_eq!(order.customer_name, "Ana");
    assert_eq!(order.phone_number, "5215550001111");
    assert_eq!(order.quantity, 2);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.source_chat_id, CUSTOMER);
}

#[tokio::test]
async fn test_malformed_order_tag_records_nothing() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["Perfecto [PEDIDO_CONFIRMADO] {plataforma: Netflix".to_string()])
        .build()
        .await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "va").await;
    assert_eq!(
        outcome,
        Disposition::Replied {
            text: "Perfecto".into(),
            source: ReplySource::Model,
        }
    );
    assert!(harness.state.ledger.is_empty().await);
}

#[tokio::test]
async fn test_ledger_keeps_latest_500_orders() {
    let harness = TestHarness::builder().build().await;
    for i in 0..501 {
        harness
            .state
            .ledger
            .record(OrderDraft {
                platform: "Netflix".into(),
                customer_name: format!("cliente {i}"),
                phone_number: "5215550001111".into(),
                quantity: 1,
                source_chat_id: CUSTOMER.into(),
            })
            .await;
    }

    let orders = harness.state.ledger.list().await;
    assert_eq!(orders.len(), 500);
    assert!(orders.iter().all(|o| o.id != 1));
    assert!(orders.iter().any(|o| o.id == 501));
}

// ---- History ----

#[tokio::test]
async fn test_history_is_normalized_before_the_model_call() {
    let harness = TestHarness::builder().build().await;
    {
        let slot = harness.state.conversations.get_or_create(CUSTOMER, Some("Ana"));
        let mut conversation = slot.state().await;
        let now = Utc::now();
        conversation.append(Speaker::Bot, "b1", now);
        conversation.append(Speaker::Bot, "b2", now);
        conversation.append(Speaker::Customer, "c1", now);
        conversation.append(Speaker::Customer, "c2", now);
    }

    harness.send_message(CUSTOMER, Some("Ana"), "c3").await;

    let request = harness.mock_provider.last_request().await.unwrap();
    assert_eq!(request.turns.len(), 1);
    assert_eq!(request.turns[0].role, TurnRole::User);
    assert_eq!(request.turns[0].text, "c1\nc2\nc3");
}

#[tokio::test]
async fn test_conversation_keeps_last_50_messages() {
    let harness = TestHarness::builder().build().await;
    for i in 1..=30 {
        harness
            .send_message(CUSTOMER, Some("Ana"), &format!("m{i}"))
            .await;
    }

    let detail = harness.state.conversations.detail(CUSTOMER).await.unwrap();
    assert_eq!(detail.messages.len(), 50);
    assert_eq!(detail.messages[0].text, "m6");
    assert_eq!(detail.messages[0].from, Speaker::Customer);
}

#[tokio::test]
async fn test_alternating_turns_reach_the_model() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["r1".into(), "r2".into()])
        .build()
        .await;

    harness.send_message(CUSTOMER, Some("Ana"), "q1").await;
    harness.send_message(CUSTOMER, Some("Ana"), "q2").await;

    let request = harness.mock_provider.last_request().await.unwrap();
    let roles: Vec<TurnRole> = request.turns.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![TurnRole::User, TurnRole::Assistant, TurnRole::User]);
    assert_eq!(request.turns[2].text, "q2");
}

// ---- Skills and manual replies ----

#[tokio::test]
async fn test_skill_answers_before_the_model() {
    let harness = TestHarness::builder()
        .with_skill(Arc::new(
            MockSkill::new("precios", "precio").responding("Netflix: $50 al mes"),
        ))
        .build()
        .await;

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "¿precio de netflix?").await;
    assert_eq!(
        outcome,
        Disposition::Replied {
            text: "Netflix: $50 al mes".into(),
            source: ReplySource::Skill,
        }
    );
    assert_eq!(harness.mock_provider.call_count().await, 0);
}

#[tokio::test]
async fn test_paused_chat_accepts_agent_reply() {
    let harness = TestHarness::builder().build().await;
    harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    harness
        .state
        .conversations
        .set_paused(CUSTOMER, true)
        .await
        .unwrap();

    let outcome = harness.send_message(CUSTOMER, Some("Ana"), "¿hay alguien?").await;
    assert_eq!(outcome, Disposition::Ignored(IgnoreReason::ChatPaused));

    let message = harness
        .orchestrator
        .send_agent_reply(CUSTOMER, "Sí, aquí estoy")
        .await
        .unwrap();
    assert_eq!(message.from, Speaker::Agent);
    let sent = harness.mock_channel.sent_messages().await;
    assert_eq!(sent.last().unwrap().text, "Sí, aquí estoy");
}

// ---- Scheduler, sweep and runtime ----

#[tokio::test]
async fn test_due_schedule_is_delivered_once() {
    let harness = TestHarness::builder().build().await;
    harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    harness.mock_channel.clear_sent().await;

    harness
        .state
        .schedules
        .create(
            CUSTOMER,
            "Promo: Disney+ a mitad de precio",
            Utc::now() - chrono::Duration::seconds(1),
            false,
            0,
        )
        .await
        .unwrap();

    assert_eq!(run_due_schedules(&harness.orchestrator, Utc::now()).await, 1);
    assert_eq!(run_due_schedules(&harness.orchestrator, Utc::now()).await, 0);

    let sent = harness.mock_channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "Promo: Disney+ a mitad de precio");

    let detail = harness.state.conversations.detail(CUSTOMER).await.unwrap();
    let last = detail.messages.last().unwrap();
    assert_eq!(last.from, Speaker::Bot);
    assert_eq!(last.text, "Promo: Disney+ a mitad de precio");
}

#[tokio::test]
async fn test_sweep_drops_idle_unpaused_conversations() {
    let harness = TestHarness::builder().build().await;
    harness.send_message(CUSTOMER, Some("Ana"), "hola").await;
    harness
        .send_message("5215550003333@s.whatsapp.net", Some("Luis"), "hola")
        .await;
    harness
        .state
        .conversations
        .set_paused(CUSTOMER, true)
        .await
        .unwrap();

    let later = Utc::now() + chrono::Duration::hours(25);
    assert_eq!(harness.state.conversations.sweep(later), 1);
    assert!(harness.state.conversations.get(CUSTOMER).is_some());
}

#[tokio::test]
async fn test_runtime_answers_injected_messages() {
    let harness = TestHarness::builder().build().await;
    let mut runtime = BotRuntime::new(
        harness.orchestrator.clone(),
        RuntimeOptions {
            sweep_interval: Duration::from_secs(3600),
            scheduler_interval: Duration::from_secs(3600),
            worker_idle: Duration::from_secs(60),
            drain_timeout: Duration::from_secs(5),
        },
    );
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move { runtime.run(loop_cancel).await });

    harness
        .mock_channel
        .inject_message(inbound(CUSTOMER, Some("Ana"), "hola"))
        .await;
    harness
        .mock_channel
        .inject_message(inbound("5215550004444@s.whatsapp.net", Some("Eva"), "buenas"))
        .await;

    let sent = harness
        .mock_channel
        .wait_for_sent(2, Duration::from_secs(5))
        .await;
    assert_eq!(sent.len(), 2);

    cancel.cancel();
    handle.await.unwrap().unwrap();
    assert_eq!(harness.state.conversations.len(), 2);
}

// ---- Stateless endpoint ----

#[tokio::test]
async fn test_stateless_generation_leaves_no_trace() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "Claro [PEDIDO_CONFIRMADO] {\"plataforma\": \"Max\"}".to_string(),
        ])
        .build()
        .await;

    let reply = harness
        .orchestrator
        .generate_stateless("quiero Max", &[])
        .await
        .unwrap();
    assert_eq!(reply, "Claro");
    assert!(harness.state.ledger.is_empty().await);
    assert!(harness.state.conversations.is_empty());
    assert_eq!(harness.mock_channel.sent_count().await, 0);

    let request = harness.mock_provider.last_request().await.unwrap();
    assert_eq!(request.max_tokens, 512);
}
