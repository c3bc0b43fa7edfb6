//! Panel markup for the three label layouts.
//!
//! Rich-text fields are already markup and are written as they are. Plain
//! values (serving size, nutrient amounts, row labels) are escaped.

use markdown_weaver_escape::{FmtWriter, StrWrite, escape_html, escape_html_body_text};
use tracing::debug;

use crate::draft::PanelDraft;
use crate::model::{Region, Template};

/// Which label layout a panel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// US supplements: "Supplement Facts" with per-serve amounts only.
    SupplementFacts,
    /// AU complex: nutrition table followed by compositional rows.
    AuComplex,
    /// Everything else: "NUTRITION INFORMATION" per serve and per 100 g.
    NutritionInformation,
}

impl Layout {
    pub fn for_panel(region: Region, template: Template) -> Self {
        match (region, template) {
            (Region::Us, Template::Supplements) => Layout::SupplementFacts,
            (Region::Au, Template::Complex) => Layout::AuComplex,
            _ => Layout::NutritionInformation,
        }
    }
}

/// Standard table rows: label, per-serve key, per-100 g key, bold label.
const NUTRITION_ROWS: &[(&str, &str, &str, bool)] = &[
    ("Energy (kJ)", "energy_kj_serve", "energy_kj_100g", true),
    ("Energy (Cal)", "energy_cal_serve", "energy_cal_100g", true),
    ("Protein (g)", "protein_serve", "protein_100g", false),
    ("Total Fat (g)", "fat_serve", "fat_100g", false),
    ("Saturated Fat (g)", "saturated_fat_serve", "saturated_fat_100g", false),
    ("Carbohydrate (g)", "carbs_serve", "carbs_100g", false),
    ("Sugars (g)", "sugars_serve", "sugars_100g", false),
    ("Sodium (mg)", "sodium_serve", "sodium_100g", false),
];

/// Supplement Facts rows: label, per-serve key, unit suffix.
const SUPPLEMENT_FACTS_ROWS: &[(&str, &str, &str)] = &[
    ("Energy", "energy_cal_serve", " cal"),
    ("Protein", "protein_serve", "g"),
    ("Total Fat", "fat_serve", "g"),
    ("Total Carbohydrate", "carbs_serve", "g"),
    ("Sugars", "sugars_serve", "g"),
    ("Sodium", "sodium_serve", "mg"),
];

const ROW_RULE: &str = "border-b border-gray-400";

/// Render the panel markup for a draft.
pub fn render_panel(draft: &PanelDraft) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_panel(draft, FmtWriter(&mut out));
    out
}

/// Render the panel into any writer.
pub fn write_panel<W: StrWrite>(draft: &PanelDraft, writer: W) -> Result<(), W::Error> {
    let layout = Layout::for_panel(draft.region, draft.template);
    debug!(?layout, region = %draft.region, template = %draft.template, "rendering panel");
    PanelWriter::new(draft, writer).run(layout)
}

struct PanelWriter<'a, W> {
    draft: &'a PanelDraft,
    writer: W,
}

impl<'a, W: StrWrite> PanelWriter<'a, W> {
    fn new(draft: &'a PanelDraft, writer: W) -> Self {
        Self { draft, writer }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    /// Plain text, escaped.
    #[inline]
    fn text(&mut self, s: &str) -> Result<(), W::Error> {
        escape_html_body_text(&mut self.writer, s)
    }

    fn run(mut self, layout: Layout) -> Result<(), W::Error> {
        self.write(
            "<div class=\"max-w-2xl mx-auto bg-white text-black p-8 font-sans text-sm leading-tight\">\n",
        )?;
        match layout {
            Layout::SupplementFacts => self.supplement_facts()?,
            Layout::AuComplex => self.nutrition_information(true)?,
            Layout::NutritionInformation => self.nutrition_information(false)?,
        }
        if self.draft.template == Template::Protein && layout != Layout::SupplementFacts {
            self.amino_acids()?;
        }
        self.text_sections()?;
        self.write("</div>\n")
    }

    fn serving_size(&mut self, class: &str) -> Result<(), W::Error> {
        self.write("<div class=\"")?;
        self.write(class)?;
        self.write("\"><span class=\"font-bold\">Serving Size:</span> ")?;
        let draft = self.draft;
        self.text(&draft.serving_size)?;
        self.write("</div>\n")
    }

    fn supplement_facts(&mut self) -> Result<(), W::Error> {
        self.write("<div class=\"border-2 border-black p-4 mb-4\">\n")?;
        self.write("<h2 class=\"text-lg font-bold mb-2\">Supplement Facts</h2>\n")?;
        self.serving_size("border-b border-black pb-1 mb-2")?;
        self.write("<table class=\"w-full\">\n<tbody>\n")?;
        self.write(
            "<tr class=\"border-b border-black\"><td class=\"font-bold py-1\">Amount Per Serving</td><td class=\"text-right font-bold\">% Daily Value</td></tr>\n",
        )?;

        let draft = self.draft;
        let data = &draft.nutritional_data;
        for (i, (label, key, unit)) in SUPPLEMENT_FACTS_ROWS.iter().enumerate() {
            let last = i + 1 == SUPPLEMENT_FACTS_ROWS.len();
            self.write(if last { "<tr>" } else { "<tr class=\"border-b border-gray-400\">" })?;
            self.write("<td class=\"py-1\">")?;
            self.text(label)?;
            self.write("</td><td class=\"text-right\">")?;
            self.text(data.value(key))?;
            self.write(unit)?;
            self.write("</td></tr>\n")?;
        }
        self.write("</tbody>\n</table>\n</div>\n")
    }

    fn nutrition_information(&mut self, with_composition: bool) -> Result<(), W::Error> {
        self.write("<div class=\"border-2 border-black mb-4\">\n")?;
        self.write(
            "<h2 class=\"bg-black text-white p-2 text-center font-bold\">NUTRITION INFORMATION</h2>\n",
        )?;
        self.write("<div class=\"p-4\">\n")?;
        self.serving_size("mb-2")?;
        self.write("<table class=\"w-full border-collapse\">\n<thead>\n")?;
        self.write(
            "<tr class=\"border-b-2 border-black\"><th class=\"text-left py-2\"></th><th class=\"text-center py-2\">Per Serve</th><th class=\"text-center py-2\">Per 100g</th></tr>\n",
        )?;
        self.write("</thead>\n<tbody>\n")?;

        let draft = self.draft;
        let composition = if with_composition {
            draft.compositional_data.as_slice()
        } else {
            &[]
        };
        let data = &draft.nutritional_data;
        for (i, (label, serve, per100, bold)) in NUTRITION_ROWS.iter().enumerate() {
            let last = i + 1 == NUTRITION_ROWS.len() && composition.is_empty();
            let rule = if last { None } else { Some(ROW_RULE) };
            self.row(rule, None, label, *bold, data.value(serve), data.value(per100))?;
        }
        for row in composition {
            let style = row.border_thickness.style();
            self.row(None, Some(&style), &row.label, false, &row.serve, &row.per100g)?;
        }

        self.write("</tbody>\n</table>\n</div>\n</div>\n")
    }

    fn row(
        &mut self,
        class: Option<&str>,
        style: Option<&str>,
        label: &str,
        bold: bool,
        serve: &str,
        per100: &str,
    ) -> Result<(), W::Error> {
        self.write("<tr")?;
        if let Some(class) = class {
            self.write(" class=\"")?;
            self.write(class)?;
            self.write("\"")?;
        }
        if let Some(style) = style {
            self.write(" style=\"")?;
            escape_html(&mut self.writer, style)?;
            self.write("\"")?;
        }
        self.write(if bold {
            "><td class=\"py-1 font-bold\">"
        } else {
            "><td class=\"py-1\">"
        })?;
        self.text(label)?;
        self.write("</td><td class=\"text-center\">")?;
        self.text(if serve.is_empty() { "0" } else { serve })?;
        self.write("</td><td class=\"text-center\">")?;
        self.text(if per100.is_empty() { "0" } else { per100 })?;
        self.write("</td></tr>\n")
    }

    fn amino_acids(&mut self) -> Result<(), W::Error> {
        let draft = self.draft;
        let rows = &draft.amino_acid_data;
        if rows.is_empty() {
            return Ok(());
        }
        self.write("<div class=\"border-2 border-black mb-4\">\n")?;
        self.write(
            "<h2 class=\"bg-black text-white p-2 text-center font-bold\">TYPICAL AMINO ACID PROFILE</h2>\n",
        )?;
        self.write("<table class=\"w-full border-collapse\">\n<tbody>\n")?;
        for row in rows {
            self.write("<tr style=\"")?;
            escape_html(&mut self.writer, &row.border_thickness.style())?;
            self.write("\"><td class=\"px-4 py-1\">")?;
            self.text(&row.label)?;
            self.write("</td><td class=\"px-4 py-1 text-right\">")?;
            self.text(if row.value.is_empty() { "0" } else { &row.value })?;
            self.write("</td></tr>\n")?;
        }
        self.write("</tbody>\n</table>\n")?;
        self.write("<p class=\"px-4 py-1 text-xs\">*Branched Chain Amino Acids (BCAAs)</p>\n")?;
        self.write("</div>\n")
    }

    fn section(&mut self, heading: &str, body: &str) -> Result<(), W::Error> {
        self.write("<div class=\"mb-4\">\n<h3 class=\"font-bold mb-2\">")?;
        self.write(heading)?;
        self.write("</h3>\n<p>")?;
        self.write(body)?;
        self.write("</p>\n</div>\n")
    }

    fn text_sections(&mut self) -> Result<(), W::Error> {
        let draft = self.draft;
        self.section("Directions:", &draft.directions)?;
        self.section("Ingredients:", &draft.ingredients)?;
        self.section("Allergen Advice:", &draft.allergen_advice)?;
        self.section("Storage:", &draft.storage)?;

        self.write("<div class=\"mb-4\">\n<p class=\"text-xs\">")?;
        self.write(&draft.supplementary_info)?;
        self.write("</p>\n</div>\n")?;

        self.write("<div>\n<p class=\"text-xs font-bold\">")?;
        self.write(&draft.serving_scoop_info)?;
        self.write("</p>\n")?;
        if !draft.consumption_warning.is_empty() {
            self.write("<p class=\"text-xs font-bold\">")?;
            self.text(&draft.consumption_warning)?;
            self.write("</p>\n")?;
        }
        self.write("</div>\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Product;

    fn draft(region: Region, template: Template) -> PanelDraft {
        PanelDraft::for_template(Product::new("Iso Whey", "iso-whey"), template).with_region(region)
    }

    #[test]
    fn test_layout_selection() {
        assert_eq!(
            Layout::for_panel(Region::Us, Template::Supplements),
            Layout::SupplementFacts
        );
        assert_eq!(Layout::for_panel(Region::Au, Template::Complex), Layout::AuComplex);
        assert_eq!(
            Layout::for_panel(Region::Au, Template::Supplements),
            Layout::NutritionInformation
        );
        assert_eq!(
            Layout::for_panel(Region::Us, Template::Complex),
            Layout::NutritionInformation
        );
    }

    #[test]
    fn test_missing_values_render_zero() {
        let mut d = draft(Region::Au, Template::Supplements);
        d.nutritional_data.protein_serve.clear();
        let html = render_panel(&d);
        assert!(html.contains("<td class=\"py-1\">Protein (g)</td><td class=\"text-center\">0</td>"));
    }

    #[test]
    fn test_last_standard_row_has_no_rule_without_composition() {
        let html = render_panel(&draft(Region::Au, Template::Protein));
        assert!(html.contains("<tr><td class=\"py-1\">Sodium (mg)</td>"));

        let html = render_panel(&draft(Region::Au, Template::Complex));
        assert!(html.contains("<tr class=\"border-b border-gray-400\"><td class=\"py-1\">Sodium (mg)</td>"));
        assert!(html.contains(
            "<tr style=\"border-bottom: 1px solid black\"><td class=\"py-1\">AAKG (g)</td><td class=\"text-center\">1.7</td><td class=\"text-center\">19.1</td></tr>"
        ));
    }

    #[test]
    fn test_rich_text_inlined_plain_text_escaped() {
        let mut d = draft(Region::Au, Template::Protein);
        d.directions = "Mix <strong>1 scoop</strong> &amp; shake".into();
        d.serving_size = "30 g <approx>".into();
        let html = render_panel(&d);
        assert!(html.contains("<p>Mix <strong>1 scoop</strong> &amp; shake</p>"));
        assert!(html.contains("<span class=\"font-bold\">Serving Size:</span> 30 g &lt;approx&gt;</div>"));
    }
}
