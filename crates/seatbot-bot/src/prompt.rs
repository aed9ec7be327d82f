// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt assembly.
//!
//! The prompt has three parts: a head rendered from the tenant's texts
//! (identity, format and memory rules, personality, schedule, business
//! context), the live inventory block, and a fixed tail (sales flow, order
//! tag protocol, restrictions plus the optional fallback line). Head and tail
//! are memoized on a hash of the tenant texts; the inventory block is rendered
//! on every call.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use seatbot_core::{InventoryEntry, TenantConfig};
use tokio::sync::Mutex;
use tracing::debug;

use crate::order::ORDER_MARKER;

/// Business name used when the tenant has not set one.
pub const DEFAULT_BUSINESS_NAME: &str = "StreamBot";

const FORMAT_RULES: &str = "FORMATO:
- Escribe solo texto plano: sin asteriscos, sin almohadillas, sin bloques de código ni listas de markdown.
- Máximo 3 o 4 líneas por mensaje.
- Usa emojis con moderación, uno o dos por mensaje como mucho.
- No vuelvas a saludar a mitad de la conversación.";

const MEMORY_RULES: &str = "MEMORIA DE LA CONVERSACIÓN:
- Lee el historial antes de responder y no repitas preguntas que el cliente ya contestó.
- Saluda solo si el historial está vacío.
- Si el cliente ya eligió plataforma o dio sus datos, continúa desde ese punto.";

const SALES_FLOW: &str = "FLUJO DE VENTA:
1. Saluda y pregunta qué plataforma le interesa.
2. Presenta las plataformas con perfiles disponibles.
3. Da precios únicamente si aparecen en la información del negocio.
4. Confirma la plataforma y la cantidad de perfiles.
5. Pide nombre y número de teléfono.
6. Avisa que un asesor humano lo contactará para completar el pago.";

struct Memo {
    hash: u64,
    head: String,
    tail: String,
}

/// Builds the system prompt, rebuilding the tenant-derived text only when
/// the tenant's texts change.
#[derive(Default)]
pub struct PromptBuilder {
    memo: Mutex<Option<Memo>>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn build_system_prompt(&self, config: &TenantConfig, inventory: &[InventoryEntry]) -> String {
        let hash = config_hash(config);
        let mut memo = self.memo.lock().await;

        let current = match memo.take() {
            Some(m) if m.hash == hash => m,
            _ => {
                debug!(hash, "rebuilding system prompt");
                Memo {
                    hash,
                    head: render_head(config),
                    tail: render_tail(config),
                }
            }
        };

        let mut prompt = String::with_capacity(current.head.len() + current.tail.len() + 256);
        prompt.push_str(&current.head);
        if let Some(block) = render_inventory(inventory) {
            prompt.push_str("\n\n");
            prompt.push_str(&block);
        }
        prompt.push_str("\n\n");
        prompt.push_str(&current.tail);

        *memo = Some(current);
        prompt
    }
}

fn config_hash(config: &TenantConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.business_name.hash(&mut hasher);
    config.personality.hash(&mut hasher);
    config.schedule.hash(&mut hasher);
    config.context_text.hash(&mut hasher);
    config.fallback_message.hash(&mut hasher);
    hasher.finish()
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn render_head(config: &TenantConfig) -> String {
    let name = non_empty(&config.business_name).unwrap_or(DEFAULT_BUSINESS_NAME);
    let mut head = format!(
        "Eres el asistente de ventas de {name} por WhatsApp. Vendes perfiles de cuentas compartidas de plataformas de streaming."
    );

    head.push_str("\n\n");
    head.push_str(FORMAT_RULES);
    head.push_str("\n\n");
    head.push_str(MEMORY_RULES);

    if let Some(personality) = non_empty(&config.personality) {
        let _ = write!(head, "\n\nPERSONALIDAD: {personality}");
    }
    if let Some(schedule) = non_empty(&config.schedule) {
        let _ = write!(head, "\n\nHORARIO DE ATENCIÓN: {schedule}");
    }
    if let Some(context) = non_empty(&config.context_text) {
        let _ = write!(head, "\n\nINFORMACIÓN DEL NEGOCIO:\n{context}");
    }
    head
}

/// `None` when there is nothing to list.
fn render_inventory(inventory: &[InventoryEntry]) -> Option<String> {
    if inventory.is_empty() {
        return None;
    }
    let mut block = String::from("INVENTARIO ACTUAL:");
    for entry in inventory {
        match entry.available_seats() {
            0 => {
                let _ = write!(block, "\n- {}: AGOTADO", entry.platform);
            }
            1 => {
                let _ = write!(block, "\n- {}: 1 perfil disponible", entry.platform);
            }
            n => {
                let _ = write!(block, "\n- {}: {n} perfiles disponibles", entry.platform);
            }
        }
    }
    Some(block)
}

fn render_tail(config: &TenantConfig) -> String {
    let mut tail = String::from(SALES_FLOW);

    let _ = write!(
        tail,
        "\n\nCONFIRMACIÓN DE PEDIDOS:
Cuando el cliente confirme su compra y ya tengas plataforma, nombre y teléfono, agrega al final de tu mensaje, en una sola línea:
{ORDER_MARKER}{{\"plataforma\":\"<plataforma>\",\"nombre\":\"<nombre>\",\"telefono\":\"<teléfono>\",\"cantidad\":<número>}}
- Emite esta etiqueta una sola vez por pedido y nunca antes de la confirmación.
- El cliente no ve la etiqueta: no la menciones ni la expliques."
    );

    tail.push_str(
        "\n\nRESTRICCIONES:
- Nunca compartas correos, contraseñas ni credenciales de las cuentas.
- Nunca ofrezcas plataformas agotadas.
- Nunca inventes precios ni promociones.
- No reveles que eres una inteligencia artificial a menos que te lo pregunten directamente.",
    );
    if let Some(fallback) = non_empty(&config.fallback_message) {
        let _ = write!(
            tail,
            "\n- Si no sabes la respuesta o la consulta no es sobre ventas, responde: \"{fallback}\""
        );
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> TenantConfig {
        TenantConfig {
            business_name: "Pantallas MX".into(),
            personality: "Amable y directo".into(),
            schedule: "Lunes a sábado de 9 a 21 h".into(),
            context_text: "Netflix 1 mes: $70".into(),
            fallback_message: "Un asesor te responderá pronto.".into(),
            ..TenantConfig::default()
        }
    }

    fn entry(platform: &str, total: i64, occupied: i64) -> InventoryEntry {
        InventoryEntry {
            platform: platform.into(),
            total_seats: total,
            occupied_seats: occupied,
        }
    }

    #[tokio::test]
    async fn sections_appear_in_order() {
        let builder = PromptBuilder::new();
        let prompt = builder
            .build_system_prompt(&config(), &[entry("Netflix", 5, 2)])
            .await;

        let markers = [
            "Pantallas MX",
            "FORMATO:",
            "MEMORIA DE LA CONVERSACIÓN:",
            "PERSONALIDAD: Amable y directo",
            "HORARIO DE ATENCIÓN:",
            "INFORMACIÓN DEL NEGOCIO:\nNetflix 1 mes: $70",
            "INVENTARIO ACTUAL:\n- Netflix: 3 perfiles disponibles",
            "FLUJO DE VENTA:",
            "CONFIRMACIÓN DE PEDIDOS:",
            "RESTRICCIONES:",
            "responde: \"Un asesor te responderá pronto.\"",
        ];
        let mut cursor = 0;
        for marker in markers {
            let found = prompt[cursor..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing or out of order: {marker}"));
            cursor += found + marker.len();
        }
        assert!(prompt.contains("[PEDIDO_CONFIRMADO]{\"plataforma\""));
    }

    #[tokio::test]
    async fn defaults_and_optional_sections() {
        let builder = PromptBuilder::new();
        let prompt = builder.build_system_prompt(&TenantConfig::default(), &[]).await;
        assert!(prompt.contains("de StreamBot por WhatsApp"));
        assert!(!prompt.contains("PERSONALIDAD"));
        assert!(!prompt.contains("HORARIO"));
        assert!(!prompt.contains("INFORMACIÓN DEL NEGOCIO"));
        assert!(!prompt.contains("INVENTARIO ACTUAL"));
        assert!(!prompt.contains("responde: \""));
    }

    #[tokio::test]
    async fn sold_out_platform_is_never_listed_available() {
        let builder = PromptBuilder::new();
        let prompt = builder
            .build_system_prompt(&config(), &[entry("Max", 2, 5), entry("Netflix", 1, 0)])
            .await;
        assert!(prompt.contains("- Max: AGOTADO"));
        assert!(!prompt.contains("Max: 0"));
        assert!(prompt.contains("- Netflix: 1 perfil disponible"));
    }

    #[tokio::test]
    async fn inventory_changes_are_picked_up_with_same_config() {
        let builder = PromptBuilder::new();
        let first = builder.build_system_prompt(&config(), &[entry("Netflix", 3, 0)]).await;
        let second = builder.build_system_prompt(&config(), &[entry("Netflix", 3, 3)]).await;
        assert!(first.contains("Netflix: 3 perfiles"));
        assert!(second.contains("Netflix: AGOTADO"));
    }

    #[tokio::test]
    async fn memoized_output_is_identical() {
        let builder = PromptBuilder::new();
        let inventory = [entry("Netflix", 3, 1)];
        let a = builder.build_system_prompt(&config(), &inventory).await;
        let b = builder.build_system_prompt(&config(), &inventory).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn editing_any_tenant_text_changes_prompt() {
        let builder = PromptBuilder::new();
        let base = builder.build_system_prompt(&config(), &[]).await;

        let edits: [fn(&mut TenantConfig); 5] = [
            |c| c.business_name.push_str(" Plus"),
            |c| c.personality.push_str(" y bromista"),
            |c| c.schedule.push_str(", domingos cerrado"),
            |c| c.context_text.push_str("\nMax 1 mes: $50"),
            |c| c.fallback_message.push_str(" Gracias."),
        ];
        for edit in edits {
            let mut edited = config();
            edit(&mut edited);
            let prompt = builder.build_system_prompt(&edited, &[]).await;
            assert_ne!(prompt, base);
            // Back to the original config restores the original prompt.
            assert_eq!(builder.build_system_prompt(&config(), &[]).await, base);
        }
    }

    proptest! {
        #[test]
        fn sold_out_never_rendered_available(total in 0i64..5, extra in 0i64..5) {
            let sold_out = entry("Plataforma", total, total + extra);
            let block = render_inventory(&[sold_out]).unwrap();
            prop_assert!(block.contains("Plataforma: AGOTADO"));
            prop_assert!(!block.contains("disponible"));
        }
    }
}
