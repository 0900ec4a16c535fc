use serde::Serialize;

pub const UNCHANGED_MARKER: &str = "--";

pub const WORDS_HEADING: &str = "Words";
pub const FINAL_HEADING: &str = "Final";
pub const IPA_HEADING: &str = "IPA";

/// One cell of the history table.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DisplayCell {
    /// The generated word before any rule ran.
    Word(String),
    /// The rule at this column left the word as it was.
    Unchanged,
    /// The rule at this column produced a new form.
    Changed(String),
    Final(String),
    Ipa(String),
}

impl DisplayCell {
    /// Text without any emphasis, e.g. for terminals and CSV-like dumps.
    pub fn plain(&self) -> String {
        match self {
            DisplayCell::Word(text) | DisplayCell::Changed(text) | DisplayCell::Final(text) => {
                text.clone()
            }
            DisplayCell::Unchanged => UNCHANGED_MARKER.to_string(),
            DisplayCell::Ipa(text) => format!("/{}/", text),
        }
    }

    /// Markup fragment handed to an HTML table widget.
    pub fn markup(&self) -> String {
        match self {
            DisplayCell::Word(text) => escape_html(text),
            DisplayCell::Unchanged => UNCHANGED_MARKER.to_string(),
            DisplayCell::Changed(text) => {
                format!("<b style=\"color: red\">{}</b>", escape_html(text))
            }
            DisplayCell::Final(text) => format!("<b>{}</b>", escape_html(text)),
            DisplayCell::Ipa(text) => format!("<i>/{}/</i>", escape_html(text)),
        }
    }
}

/// Table handed to the presentation layer: headings plus row-major cells.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayTable {
    pub headings: Vec<String>,
    pub rows: Vec<Vec<DisplayCell>>,
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_per_cell_kind() {
        assert_eq!(DisplayCell::Word("kato".into()).plain(), "kato");
        assert_eq!(DisplayCell::Unchanged.plain(), "--");
        assert_eq!(DisplayCell::Changed("kado".into()).plain(), "kado");
        assert_eq!(DisplayCell::Ipa("kado".into()).plain(), "/kado/");
    }

    #[test]
    fn markup_distinguishes_change_from_final() {
        assert_eq!(
            DisplayCell::Changed("kado".into()).markup(),
            "<b style=\"color: red\">kado</b>"
        );
        assert_eq!(DisplayCell::Final("kado".into()).markup(), "<b>kado</b>");
        assert_eq!(DisplayCell::Ipa("ʃa".into()).markup(), "<i>/ʃa/</i>");
    }

    #[test]
    fn markup_escapes_engine_text() {
        assert_eq!(DisplayCell::Word("a<b".into()).markup(), "a&lt;b");
    }
}
