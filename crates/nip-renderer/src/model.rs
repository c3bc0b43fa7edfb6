//! Panel data: product, template, nutrient values and keyed ingredient rows.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use nip_common::Region;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub title: String,
    #[serde(default)]
    pub product_type: String,
    pub online_store_url: String,
}

impl Product {
    pub fn new(title: impl Into<String>, online_store_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            product_type: String::new(),
            online_store_url: online_store_url.into(),
        }
    }
}

/// Label layout family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Protein,
    Supplements,
    Complex,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::Protein, Template::Supplements, Template::Complex];

    pub fn name(self) -> &'static str {
        match self {
            Template::Protein => "protein",
            Template::Supplements => "supplements",
            Template::Complex => "complex",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("unknown template {0:?}")]
#[diagnostic(
    code(nip::template),
    help("templates are protein, supplements or complex")
)]
pub struct UnknownTemplate(pub String);

impl FromStr for Template {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "protein" => Ok(Template::Protein),
            "supplements" => Ok(Template::Supplements),
            "complex" => Ok(Template::Complex),
            _ => Err(UnknownTemplate(s.to_owned())),
        }
    }
}

/// Bottom border weight of a table row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderWeight {
    #[default]
    #[serde(rename = "light")]
    Light,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "xl")]
    Xl,
    #[serde(rename = "2xl")]
    TwoXl,
}

impl BorderWeight {
    pub fn pixels(self) -> u8 {
        match self {
            BorderWeight::Light => 1,
            BorderWeight::Medium => 2,
            BorderWeight::Large => 3,
            BorderWeight::Xl => 4,
            BorderWeight::TwoXl => 5,
        }
    }

    /// Inline style for the row's bottom border.
    pub fn style(self) -> String {
        format!("border-bottom: {}px solid black", self.pixels())
    }
}

/// Nutrient values as entered, e.g. `"1,600"`.
///
/// Values are kept as text so thousands separators and `"<1"` survive.
/// Rows beyond the standard set live in `extra`, keyed like the standard
/// ones (`gaba_serve`, `vitamin_c_100g`, `protein_dv`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionalData {
    #[serde(rename = "servingSize")]
    pub serving_size: String,
    #[serde(rename = "servingsPerPack")]
    pub servings_per_pack: String,
    pub energy_kj_serve: String,
    pub energy_kj_100g: String,
    pub energy_cal_serve: String,
    pub energy_cal_100g: String,
    pub protein_serve: String,
    pub protein_100g: String,
    pub fat_serve: String,
    pub fat_100g: String,
    pub saturated_fat_serve: String,
    pub saturated_fat_100g: String,
    pub carbs_serve: String,
    pub carbs_100g: String,
    pub sugars_serve: String,
    pub sugars_100g: String,
    pub sodium_serve: String,
    pub sodium_100g: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl NutritionalData {
    fn slot(&self, key: &str) -> Option<&String> {
        let value = match key {
            "servingSize" => &self.serving_size,
            "servingsPerPack" => &self.servings_per_pack,
            "energy_kj_serve" => &self.energy_kj_serve,
            "energy_kj_100g" => &self.energy_kj_100g,
            "energy_cal_serve" => &self.energy_cal_serve,
            "energy_cal_100g" => &self.energy_cal_100g,
            "protein_serve" => &self.protein_serve,
            "protein_100g" => &self.protein_100g,
            "fat_serve" => &self.fat_serve,
            "fat_100g" => &self.fat_100g,
            "saturated_fat_serve" => &self.saturated_fat_serve,
            "saturated_fat_100g" => &self.saturated_fat_100g,
            "carbs_serve" => &self.carbs_serve,
            "carbs_100g" => &self.carbs_100g,
            "sugars_serve" => &self.sugars_serve,
            "sugars_100g" => &self.sugars_100g,
            "sodium_serve" => &self.sodium_serve,
            "sodium_100g" => &self.sodium_100g,
            other => return self.extra.get(other),
        };
        Some(value)
    }

    fn slot_mut(&mut self, key: &str) -> &mut String {
        match key {
            "servingSize" => &mut self.serving_size,
            "servingsPerPack" => &mut self.servings_per_pack,
            "energy_kj_serve" => &mut self.energy_kj_serve,
            "energy_kj_100g" => &mut self.energy_kj_100g,
            "energy_cal_serve" => &mut self.energy_cal_serve,
            "energy_cal_100g" => &mut self.energy_cal_100g,
            "protein_serve" => &mut self.protein_serve,
            "protein_100g" => &mut self.protein_100g,
            "fat_serve" => &mut self.fat_serve,
            "fat_100g" => &mut self.fat_100g,
            "saturated_fat_serve" => &mut self.saturated_fat_serve,
            "saturated_fat_100g" => &mut self.saturated_fat_100g,
            "carbs_serve" => &mut self.carbs_serve,
            "carbs_100g" => &mut self.carbs_100g,
            "sugars_serve" => &mut self.sugars_serve,
            "sugars_100g" => &mut self.sugars_100g,
            "sodium_serve" => &mut self.sodium_serve,
            "sodium_100g" => &mut self.sodium_100g,
            other => self.extra.entry(other.to_owned()).or_default(),
        }
    }

    /// Value for `key`, or `"0"` when missing or empty.
    pub fn value(&self, key: &str) -> &str {
        match self.slot(key) {
            Some(v) if !v.is_empty() => v.as_str(),
            _ => "0",
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        *self.slot_mut(key) = value.into();
    }
}

/// A labelled ingredient row with per-serve and per-100 g amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionalRow {
    pub label: String,
    pub serve: String,
    pub per100g: String,
    #[serde(default)]
    pub border_thickness: BorderWeight,
}

impl CompositionalRow {
    pub fn new(label: &str, serve: &str, per100g: &str) -> Self {
        Self {
            label: label.to_owned(),
            serve: serve.to_owned(),
            per100g: per100g.to_owned(),
            border_thickness: BorderWeight::Light,
        }
    }
}

/// One line of an amino acid profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AminoAcidRow {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub border_thickness: BorderWeight,
}

impl AminoAcidRow {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_owned(),
            value: value.to_owned(),
            border_thickness: BorderWeight::Light,
        }
    }

    pub fn with_border(mut self, border: BorderWeight) -> Self {
        self.border_thickness = border;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_render_as_zero() {
        let mut data = NutritionalData::default();
        assert_eq!(data.value("protein_serve"), "0");
        assert_eq!(data.value("gaba_serve"), "0");

        data.set("protein_serve", "26.4");
        data.set("gaba_serve", "2,000");
        assert_eq!(data.value("protein_serve"), "26.4");
        assert_eq!(data.value("gaba_serve"), "2,000");
        assert_eq!(data.extra.len(), 1);
    }

    #[test]
    fn test_serde_keeps_original_keys() {
        let json = r#"{"servingSize":"30g","protein_serve":"26.4","vitamin_c_100g":"629"}"#;
        let data: NutritionalData = serde_json::from_str(json).unwrap();
        assert_eq!(data.serving_size, "30g");
        assert_eq!(data.value("vitamin_c_100g"), "629");

        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["servingSize"], "30g");
        assert_eq!(back["vitamin_c_100g"], "629");
    }

    #[test]
    fn test_template_and_border_names() {
        assert_eq!("Complex".parse::<Template>().unwrap(), Template::Complex);
        assert!("keto".parse::<Template>().is_err());
        assert_eq!(serde_json::to_string(&BorderWeight::TwoXl).unwrap(), "\"2xl\"");
        assert_eq!(BorderWeight::Large.style(), "border-bottom: 3px solid black");
    }
}
