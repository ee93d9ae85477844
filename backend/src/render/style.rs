//! Style block generation for rendered tables.

use crate::models::{FormattingOptions, StylePreset};

/// CSS class put on every rendered `<table>`.
pub const TABLE_CLASS: &str = "psm-table";
/// CSS class of full-width group rows.
pub const GROUP_ROW_CLASS: &str = "psm-group";

/// Border and shading rules of a preset, scoped to [`TABLE_CLASS`].
fn preset_rules(preset: StylePreset) -> String {
    let t = TABLE_CLASS;
    let g = GROUP_ROW_CLASS;
    match preset {
        StylePreset::None => format!("table.{t} th, table.{t} td {{ border: none; }}\n"),
        // Three rules, bold headings, shaded group rows
        StylePreset::Nejm => format!(
            "table.{t} {{ border-top: 2px solid #000; border-bottom: 2px solid #000; }}\n\
             table.{t} thead tr:last-child th {{ border-bottom: 1px solid #000; }}\n\
             table.{t} th {{ font-weight: bold; }}\n\
             table.{t} tr.{g} td {{ background-color: #fff7e6; }}\n"
        ),
        // Full grid, grey header
        StylePreset::Jama => format!(
            "table.{t} th, table.{t} td {{ border: 1px solid #7f7f7f; }}\n\
             table.{t} thead th {{ background-color: #e7e6e6; font-weight: bold; }}\n\
             table.{t} tr.{g} td {{ background-color: #f2f2f2; }}\n"
        ),
        // Horizontal hairlines between body rows
        StylePreset::Lancet => format!(
            "table.{t} {{ border-top: 1px solid #000; border-bottom: 1px solid #000; }}\n\
             table.{t} thead th {{ border-bottom: 1px solid #000; font-weight: bold; }}\n\
             table.{t} tbody td {{ border-bottom: 1px solid #d9d9d9; }}\n\
             table.{t} tr.{g} td {{ font-style: italic; }}\n"
        ),
        // APA: rules above and below the header and at the bottom only
        StylePreset::Apa => format!(
            "table.{t} {{ border-bottom: 1px solid #000; }}\n\
             table.{t} thead tr:first-child th {{ border-top: 1px solid #000; }}\n\
             table.{t} thead tr:last-child th {{ border-bottom: 1px solid #000; font-weight: normal; }}\n\
             table.{t} tr.{g} td {{ font-style: italic; }}\n"
        ),
    }
}

/// The `<style>` block for `options`.
pub fn style_block(options: &FormattingOptions) -> String {
    let t = TABLE_CLASS;
    let g = GROUP_ROW_CLASS;
    let mut css = String::from("<style>\n");
    css.push_str(&format!(
        "table.{t} {{ border-collapse: collapse; font-family: Arial, Helvetica, sans-serif; font-size: {}pt; }}\n",
        options.font_size_pt()
    ));
    css.push_str(&format!(
        "table.{t} th, table.{t} td {{ text-align: {}; vertical-align: {}; padding: 2px 6px; }}\n",
        options.horizontal_align.as_css(),
        options.vertical_align.as_css()
    ));
    css.push_str(&format!(
        "table.{t} tr.{g} td {{ text-align: left; font-weight: bold; }}\n"
    ));
    css.push_str(&preset_rules(options.style_preset));
    css.push_str("</style>\n");
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HorizontalAlign, VerticalAlign};

    #[test]
    fn test_style_block_carries_options() {
        let options = FormattingOptions {
            font_size: 9,
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Top,
            ..Default::default()
        };
        let css = style_block(&options);

        assert!(css.starts_with("<style>"));
        assert!(css.contains("font-size: 9pt"));
        assert!(css.contains("text-align: center; vertical-align: top"));
    }

    #[test]
    fn test_presets_are_distinct() {
        let presets = [
            StylePreset::None,
            StylePreset::Nejm,
            StylePreset::Jama,
            StylePreset::Lancet,
            StylePreset::Apa,
        ];
        let rules: std::collections::HashSet<String> =
            presets.iter().map(|p| preset_rules(*p)).collect();
        assert_eq!(rules.len(), presets.len());
    }
}
