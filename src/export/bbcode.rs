//! BBCode table dialect

use super::table::TableModel;

/// Render a table as `[table]` markup with a bold header row
pub fn render_table(table: &TableModel) -> String {
    let mut out = String::from("[table]\n[tr]\n");
    for label in &table.header {
        out.push_str(&format!("[td][b]{}[/b][/td]\n", label));
    }
    out.push_str("[/tr]\n");

    for row in &table.rows {
        out.push_str("[tr]\n");
        for cell in row {
            if cell.link {
                out.push_str(&format!("[td][url]{}[/url][/td]\n", cell.text));
            } else {
                out.push_str(&format!("[td]{}[/td]\n", cell.text));
            }
        }
        out.push_str("[/tr]\n");
    }

    out.push_str("[/table]");
    out
}
