//! Standalone page wrapping a rendered panel.

use markdown_weaver_escape::{FmtWriter, escape_html_body_text};

use crate::draft::PanelDraft;
use crate::panel::render_panel;

/// Comment in [`PAGE_SHELL`] that the panel markup replaces.
pub const NIP_MARKER: &str = "<!-- The NIP content will be rendered here -->";

const TITLE_MARKER: &str = "{{title}}";

/// Page skeleton. `{{title}}` takes the escaped product title.
pub const PAGE_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}} - Nutritional Information</title>
<script src="https://cdn.tailwindcss.com"></script>
<link href="https://fonts.googleapis.com/css2?family=Roboto:wght@300;400;500;700&display=swap" rel="stylesheet">
<style>
body { font-family: 'Roboto', sans-serif; }
</style>
</head>
<body>
<div id="nip-content">
<!-- The NIP content will be rendered here -->
</div>
</body>
</html>
"#;

/// Full HTML document for a draft.
pub fn render_page(draft: &PanelDraft) -> String {
    let mut title = String::new();
    let _ = escape_html_body_text(FmtWriter(&mut title), &draft.product.title);
    PAGE_SHELL
        .replacen(TITLE_MARKER, &title, 1)
        .replacen(NIP_MARKER, &render_panel(draft), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Product, Template};

    #[test]
    fn test_page_embeds_panel_and_title() {
        let draft = PanelDraft::for_template(Product::new("Mass & Gain", "mass-gain"), Template::Protein);
        let page = render_page(&draft);

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Mass &amp; Gain - Nutritional Information</title>"));
        assert!(!page.contains(NIP_MARKER));
        assert!(page.contains("<div id=\"nip-content\">\n<div class=\"max-w-2xl"));
        assert!(page.contains(&render_panel(&draft)));
    }
}
