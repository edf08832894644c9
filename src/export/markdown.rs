//! Markdown table dialect

use super::table::TableModel;

/// BBCode tags removed from cell text
const BBCODE_TAGS: [&str; 9] = ["url", "b", "i", "u", "s", "size", "color", "img", "spoiler"];

/// Render a table as a pipe table with a `---` separator row
pub fn render_table(table: &TableModel) -> String {
    let mut out = format_row(table.header.iter().map(|h| escape(h)));
    out.push_str(&format_row((0..table.column_count()).map(|_| "---".to_string())));

    for row in &table.rows {
        out.push_str(&format_row(row.iter().map(|cell| escape(&strip_bbcode(&cell.text)))));
    }

    out
}

fn format_row(cells: impl Iterator<Item = String>) -> String {
    format!("| {} |\n", cells.collect::<Vec<_>>().join(" | "))
}

/// Escape characters that would break a table cell
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Remove known BBCode tags, keeping bracketed text that is not markup
pub fn strip_bbcode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];

        match candidate.find(']') {
            Some(close) if is_bbcode_tag(&candidate[1..close]) => {
                rest = &candidate[close + 1..];
            }
            _ => {
                out.push('[');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_bbcode_tag(inner: &str) -> bool {
    let name = inner.strip_prefix('/').unwrap_or(inner);
    let name = name.split('=').next().unwrap_or_default();
    BBCODE_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}
