//! The panel being edited: field values plus the template defaults they start
//! from.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nip_editor_core::{DraftSink, RichTextEditor};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::{
    AminoAcidRow, BorderWeight, CompositionalRow, NutritionalData, Product, Region, Template,
};

/// Rich-text fields of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Directions,
    Ingredients,
    AllergenAdvice,
    Storage,
    SupplementaryInfo,
    ServingScoopInfo,
}

impl FieldId {
    pub const ALL: [FieldId; 6] = [
        FieldId::Directions,
        FieldId::Ingredients,
        FieldId::AllergenAdvice,
        FieldId::Storage,
        FieldId::SupplementaryInfo,
        FieldId::ServingScoopInfo,
    ];

    /// Key used on the command line and in snapshots.
    pub fn key(self) -> &'static str {
        match self {
            FieldId::Directions => "directions",
            FieldId::Ingredients => "ingredients",
            FieldId::AllergenAdvice => "allergenAdvice",
            FieldId::Storage => "storage",
            FieldId::SupplementaryInfo => "supplementaryInfo",
            FieldId::ServingScoopInfo => "servingScoopInfo",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("unknown field {0:?}")]
#[diagnostic(
    code(nip::field),
    help("fields are directions, ingredients, allergenAdvice, storage, supplementaryInfo or servingScoopInfo")
)]
pub struct UnknownField(pub String);

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        FieldId::ALL
            .into_iter()
            .find(|f| f.key().to_ascii_lowercase() == wanted)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

/// Everything the panel renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelDraft {
    pub product: Product,
    pub template: Template,
    pub region: Region,
    pub directions: String,
    pub serving_size: String,
    pub ingredients: String,
    pub allergen_advice: String,
    pub storage: String,
    pub supplementary_info: String,
    pub serving_scoop_info: String,
    pub consumption_warning: String,
    pub nutritional_data: NutritionalData,
    pub amino_acid_data: Vec<AminoAcidRow>,
    pub compositional_data: Vec<CompositionalRow>,
}

const STORAGE_ADVICE: &str =
    "To maximise freshness, keep sealed and store in a cool dry place out of direct sunlight.";

const SUPPLEMENTARY_INFO: &str = "FORMULATED SUPPLEMENTARY SPORTS FOOD. This product is not to be used as a sole source of nutrition. It must be used in conjunction with a balanced diet and a suitable physical training or exercise program. Not suitable for children under 15 years of age. Not suitable for pregnant women. Should only be used under medical or dietetic supervision.";

const SCOOP_INFO: &str = "SERVING SCOOP INCLUDED, but may settle to the bottom of the bag during transit. Content sold by weight not volume, some settling may occur.";

const CONSUMPTION_WARNING: &str = "CONSUME WITHIN 60 DAYS OF OPENING";

impl PanelDraft {
    /// A draft pre-filled with the defaults for `template`, in the AU region.
    pub fn for_template(product: Product, template: Template) -> Self {
        let complex = template == Template::Complex;
        let text = |complex_value: &str, other: &str| {
            (if complex { complex_value } else { other }).to_owned()
        };

        Self {
            product,
            template,
            region: Region::Au,
            directions: text(
                "Mix 1 scoop (6.2g) with 200-300mL of water. Consume 30 minutes before training.",
                "Add 1 heaped scoop (30g) to 200mL of water or low fat milk. Stir or shake for 20 seconds, or until completely dispersed.",
            ),
            serving_size: text("6.2 grams", "30 grams"),
            ingredients: text(
                "Creatine Monohydrate, Beta Alanine, Arginine Alpha-ketoglutarate, Natural Flavour, Citrulline Malate, Caffeine, L-Tyrosine, Sweetener (Sucralose), Calcium Ascorbate, Citric Acid, Silica Dioxide, Pyridoxine HCl, Pteroylglutamic Acid, Cyanocobalamin, Colour.",
                "Whey Protein Isolate (Milk)(Emulsifier (Soy Lecithin)), Flavour, Xanthan, Sucralose.",
            ),
            allergen_advice: text(
                "Contains Caffeine.",
                "Contains Milk and less than 1% Soy Lecithin (as instantiser).",
            ),
            storage: STORAGE_ADVICE.to_owned(),
            supplementary_info: SUPPLEMENTARY_INFO.to_owned(),
            serving_scoop_info: SCOOP_INFO.to_owned(),
            consumption_warning: CONSUMPTION_WARNING.to_owned(),
            nutritional_data: default_nutrition(template),
            amino_acid_data: default_amino_acids(),
            compositional_data: default_composition(),
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Storage key of this draft's product.
    pub fn key(&self) -> smol_str::SmolStr {
        nip_common::storage_key(&self.product.online_store_url)
    }

    pub fn field(&self, field: FieldId) -> &str {
        match field {
            FieldId::Directions => &self.directions,
            FieldId::Ingredients => &self.ingredients,
            FieldId::AllergenAdvice => &self.allergen_advice,
            FieldId::Storage => &self.storage,
            FieldId::SupplementaryInfo => &self.supplementary_info,
            FieldId::ServingScoopInfo => &self.serving_scoop_info,
        }
    }

    fn field_mut(&mut self, field: FieldId) -> &mut String {
        match field {
            FieldId::Directions => &mut self.directions,
            FieldId::Ingredients => &mut self.ingredients,
            FieldId::AllergenAdvice => &mut self.allergen_advice,
            FieldId::Storage => &mut self.storage,
            FieldId::SupplementaryInfo => &mut self.supplementary_info,
            FieldId::ServingScoopInfo => &mut self.serving_scoop_info,
        }
    }

    /// Replace one field's serialized value.
    pub fn on_change(&mut self, field: FieldId, value: String) {
        trace!(%field, len = value.len(), "field changed");
        *self.field_mut(field) = value;
    }

    /// Editor for one field, seeded with its current value.
    pub fn editor(&self, field: FieldId, echo_window: Duration) -> RichTextEditor {
        RichTextEditor::with_echo_window(self.field(field), echo_window)
    }

    /// Sink that writes an editor's changes back into `field`.
    pub fn sink(&mut self, field: FieldId) -> FieldSink<'_> {
        FieldSink { draft: self, field }
    }
}

/// Routes an editor's changes into one draft field.
pub struct FieldSink<'a> {
    draft: &'a mut PanelDraft,
    field: FieldId,
}

impl DraftSink for FieldSink<'_> {
    fn on_change(&mut self, value: String) {
        self.draft.on_change(self.field, value);
    }
}

fn default_nutrition(template: Template) -> NutritionalData {
    // (key, protein, supplements, complex)
    const PER_TEMPLATE: &[(&str, &str, &str, &str)] = &[
        ("servingSize", "30g", "2g", "6.2g"),
        ("servingsPerPack", "33", "100", "30"),
        ("energy_kj_serve", "480", "0", "56"),
        ("energy_kj_100g", "1,600", "0", "905"),
        ("energy_cal_serve", "115", "0", "13"),
        ("energy_cal_100g", "382", "0", "215"),
        ("protein_serve", "26.4", "0", "2.7"),
        ("protein_100g", "88.0", "0", "43"),
        ("fat_serve", "0.2", "0", "0"),
        ("fat_100g", "0.7", "0", "0.1"),
        ("saturated_fat_serve", "0.1", "0", "0"),
        ("saturated_fat_100g", "0.2", "0", "0.1"),
        ("carbs_serve", "1.5", "0", "0.7"),
        ("carbs_100g", "4.9", "0", "10.6"),
        ("sugars_serve", "0.8", "0", "0.6"),
        ("sugars_100g", "2.5", "0", "9.2"),
        ("sodium_serve", "43", "0", "0.3"),
        ("sodium_100g", "145", "0", "4.9"),
    ];
    const SHARED: &[(&str, &str)] = &[
        ("protein_dv", "53%"),
        ("fat_dv", "0%"),
        ("saturated_fat_dv", "0%"),
        ("carbs_dv", "1%"),
        ("sodium_dv", "3%"),
        ("gaba_serve", "2,000"),
        ("gaba_100g", "100,000"),
        ("vitamin_b6_serve", "1.0"),
        ("vitamin_b6_100g", "16.1"),
        ("folate_serve", "100"),
        ("folate_100g", "1,610"),
        ("vitamin_b12_serve", "5.0"),
        ("vitamin_b12_100g", "80.7"),
        ("vitamin_c_serve", "39.0"),
        ("vitamin_c_100g", "629"),
    ];

    let mut data = NutritionalData::default();
    for (key, protein, supplements, complex) in PER_TEMPLATE {
        let value = match template {
            Template::Protein => protein,
            Template::Supplements => supplements,
            Template::Complex => complex,
        };
        data.set(key, *value);
    }
    for (key, value) in SHARED {
        data.set(key, *value);
    }
    data
}

fn default_composition() -> Vec<CompositionalRow> {
    vec![
        CompositionalRow::new("AAKG (g)", "1.7", "19.1"),
        CompositionalRow::new("Beta Alanine (mg)", "1,560", "25,100"),
        CompositionalRow::new("Arginine (mg)", "232", "3,740"),
        CompositionalRow::new("Citrulline Malate (g)", "0.4", "7.3"),
        CompositionalRow::new("Creatine Monohydrate (g)", "1.9", "30.3"),
        CompositionalRow::new("L-Tyrosine (mg)", "97", "1,560"),
    ]
}

fn default_amino_acids() -> Vec<AminoAcidRow> {
    vec![
        AminoAcidRow::new("Alanine (mg)", "5,010"),
        AminoAcidRow::new("Arginine (mg)", "2,160"),
        AminoAcidRow::new("Aspartic acid (mg)", "10,500"),
        AminoAcidRow::new("Cysteine (mg)", "2,430"),
        AminoAcidRow::new("Glutamic acid (mg)", "17,000"),
        AminoAcidRow::new("Glycine (mg)", "1,620"),
        AminoAcidRow::new("Histidine (mg)", "1,550"),
        AminoAcidRow::new("Isoleucine (mg)*", "6,340"),
        AminoAcidRow::new("Leucine (mg)*", "10,300"),
        AminoAcidRow::new("Lysine (mg)", "10,000"),
        AminoAcidRow::new("Methionine (mg)", "2,150"),
        AminoAcidRow::new("Phenylalanine (mg)", "2,980"),
        AminoAcidRow::new("Proline (mg)", "6,050"),
        AminoAcidRow::new("Serine (mg)", "4,590"),
        AminoAcidRow::new("Threonine (mg)", "6,710"),
        AminoAcidRow::new("Tryptophan (mg)", "2,300"),
        AminoAcidRow::new("Tyrosine (mg)", "2,840"),
        AminoAcidRow::new("Valine (mg)*", "5,450").with_border(BorderWeight::Large),
    ]
}
