use serde_json::{json, Value};

use crate::model::Language;

/// The instruction prompt sent alongside every produce image.
///
/// Loaded from `prompt.txt` at compile time. Contains a `{{LANGUAGE}}`
/// placeholder that `inject_language` replaces with the human-readable
/// label of the requested output language.
pub const PRODUCE_ANALYSIS_PROMPT: &str = include_str!("prompt.txt");

/// Number of recipes the model is asked to return
pub const RECIPE_COUNT: usize = 3;

/// Injects the language label into the prompt template.
pub fn inject_language(language: Language) -> String {
    PRODUCE_ANALYSIS_PROMPT.replace("{{LANGUAGE}}", language.label())
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// Structured output schema declared to the model (Gemini `responseSchema`).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "foodName": { "type": "STRING" },
            "description": { "type": "STRING" },
            "nutrients": {
                "type": "OBJECT",
                "properties": {
                    "calories": { "type": "STRING" },
                    "protein": { "type": "STRING" },
                    "carbs": { "type": "STRING" },
                    "fiber": { "type": "STRING" },
                    "vitamins": string_array(),
                    "minerals": string_array()
                },
                "required": ["calories", "protein", "carbs", "fiber", "vitamins", "minerals"]
            },
            "recipes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "ingredients": string_array(),
                        "steps": string_array(),
                        "culturalNote": { "type": "STRING" },
                        "healthyPairings": string_array(),
                        "mealBalanceReason": { "type": "STRING" }
                    },
                    "required": [
                        "name",
                        "ingredients",
                        "steps",
                        "culturalNote",
                        "healthyPairings",
                        "mealBalanceReason"
                    ]
                }
            },
            "healthAdvice": { "type": "STRING" },
            "seasonalInfo": { "type": "STRING" }
        },
        "required": [
            "foodName",
            "description",
            "nutrients",
            "recipes",
            "healthAdvice",
            "seasonalInfo"
        ]
    })
}
