use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nutrition facts and recipes returned for one scanned item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub food_name: String,
    pub description: String,
    pub nutrients: Nutrients,
    pub recipes: Vec<Recipe>,
    pub health_advice: String,
    pub seasonal_info: String,
}

/// Nutrient values as free text (e.g. "18 kcal per 100g")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrients {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fiber: String,
    pub vitamins: Vec<String>,
    pub minerals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub cultural_note: String,
    pub healthy_pairings: Vec<String>,
    pub meal_balance_reason: String,
}

/// Output language for the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sn,
    Nd,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Sn, Language::Nd];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sn => "sn",
            Language::Nd => "nd",
        }
    }

    /// Label placed in the prompt and shown in language pickers
    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Sn => "Shona (ChiShona)",
            Language::Nd => "Ndebele (isiNdebele)",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "sn" => Ok(Language::Sn),
            "nd" => Ok(Language::Nd),
            other => Err(format!(
                "unsupported language '{}' (expected one of: en, sn, nd)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes_round_trip() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
        assert_eq!(" SN ".parse::<Language>().unwrap(), Language::Sn);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_default_language_is_english() {
        assert_eq!(Language::default(), Language::En);
        assert_eq!(Language::default().label(), "English");
    }

    #[test]
    fn test_scan_result_uses_camel_case_fields() {
        let nutrients = Nutrients {
            calories: "18 kcal".to_string(),
            protein: "0.9 g".to_string(),
            carbs: "3.9 g".to_string(),
            fiber: "1.2 g".to_string(),
            vitamins: vec!["Vitamin C".to_string()],
            minerals: vec!["Potassium".to_string()],
        };
        let value = serde_json::to_value(&nutrients).unwrap();
        assert_eq!(value["calories"], "18 kcal");

        let recipe = Recipe {
            name: "Tomato relish".to_string(),
            ingredients: vec![],
            steps: vec![],
            cultural_note: "Served with sadza".to_string(),
            healthy_pairings: vec!["Zviyo sadza".to_string()],
            meal_balance_reason: "Adds vitamins".to_string(),
        };
        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(value["culturalNote"], "Served with sadza");
        assert_eq!(value["healthyPairings"][0], "Zviyo sadza");
        assert_eq!(value["mealBalanceReason"], "Adds vitamins");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"{"foodName": "Tomato", "description": "Red fruit"}"#;
        assert!(serde_json::from_str::<ScanResult>(json).is_err());
    }
}
