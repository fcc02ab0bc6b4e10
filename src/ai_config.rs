//! Behaviour rules for a tenant's AI attendant that do not need the database.

use serde::Serialize;
use serde_json::{Value, json};

use crate::models::AiConfig;

pub const MIN_FORMALITY: i32 = 1;
pub const MAX_FORMALITY: i32 = 10;

/// Empty knowledge-base skeleton the dashboard edits field by field.
pub fn default_knowledge() -> Value {
    json!({
        "company": {
            "name": "",
            "segment": "",
            "products": "",
            "values": "",
            "mission": "",
        },
        "contact": {
            "hours": "",
            "phones": "",
            "address": "",
            "email": "",
        },
        "products": "",
        "policies": "",
        "keywords": "",
        "sensitive": "",
    })
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemoryStatus {
    pub percentage: u32,
    pub label: &'static str,
}

fn filled(value: Option<&Value>) -> usize {
    match value {
        Some(Value::String(s)) => usize::from(!s.trim().is_empty()),
        Some(Value::Object(map)) => map.values().map(|v| filled(Some(v))).sum(),
        _ => 0,
    }
}

/// How much of the knowledge base is filled in: company and contact fields plus
/// the products and policies texts, ten slots in total.
pub fn memory_status(knowledge: Option<&Value>) -> MemoryStatus {
    const SLOTS: usize = 10;

    let count = knowledge.map_or(0, |k| {
        filled(k.get("company"))
            + filled(k.get("contact"))
            + filled(k.get("products"))
            + filled(k.get("policies"))
    });
    let percentage = ((count.min(SLOTS) * 100) as f64 / SLOTS as f64).round() as u32;

    let label = match percentage {
        80.. => "Memória otimizada",
        50..=79 => "Memória parcial",
        _ => "Necessita configuração",
    };
    MemoryStatus { percentage, label }
}

/// Canned answer shown by the dashboard's test box. Echoes the configured greeting
/// and style without calling the language model.
pub fn preview_reply(config: &AiConfig) -> String {
    format!(
        "Olá! Baseado nas informações configuradas, eu responderia: '{}'. \
         A resposta foi gerada considerando o tom {} e nível de formalidade {}/10.",
        config.welcome_message, config.tone, config.formality_level
    )
}
