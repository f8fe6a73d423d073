use crate::shift::ClockTime;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// One employee's first check-in of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub first_in: String,
}

impl AttendanceRecord {
    pub fn entry_time(&self) -> Result<ClockTime, crate::error::ClockTimeError> {
        self.first_in.parse()
    }
}

// Column layout of the first-in/last-out report
const NAME_COL: usize = 1;
const FIRST_IN_COL: usize = 6;

/// Compiles one of the fixed patterns below.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("RAMS scraping pattern should compile")
}

static INPUT_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<input\b[^>]*>"));
static FORM_KEY_NAME: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)\bname\s*=\s*["']_formkey["']"#));
static VALUE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)\bvalue\s*=\s*["']([^"']*)["']"#));

static TABLE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<table\b[^>]*>(.*?)</table>"));
static ROW: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<tr\b[^>]*>(.*?)</tr>"));
static CELL: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<td\b[^>]*>(.*?)</td>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<[^>]*>"));
static FIRST_IN_TIME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\d{1,2}:\d{2}(:\d{2})?$"));

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));"));

/// Decode the entities RAMS emits in cell text: decimal and hex character
/// references plus the common named ones. Unknown or invalid references are
/// left as written.
fn decode_entities(s: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(s, |c: &Captures| {
        let code = match (c.get(1), c.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            (None, None) => None,
        };
        match code.and_then(char::from_u32) {
            Some(ch) => ch.to_string(),
            None => c[0].to_string(),
        }
    });

    // `&amp;` last so an escaped reference is not decoded twice
    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Value of the hidden `_formkey` input on the login page.
pub fn extract_form_key(html: &str) -> Option<String> {
    INPUT_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| FORM_KEY_NAME.is_match(tag))
        .find_map(|tag| VALUE_ATTR.captures(tag).map(|c| c[1].to_string()))
}

/// Whether the page is the login form (i.e. the session is gone).
pub fn is_login_page(html: &str) -> bool {
    html.contains(r#"name="_formname" value="login""#)
}

pub fn is_invalid_login(html: &str) -> bool {
    html.contains("Invalid login") || html.contains("invalid credentials")
}

/// Rows of every table that carry a name and a valid first-in time.
///
/// The first row seen for a name wins.
pub fn parse_attendance_table(html: &str) -> Vec<AttendanceRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for table in TABLE.captures_iter(html) {
        for row in ROW.captures_iter(&table[1]) {
            let cells: Vec<String> = CELL
                .captures_iter(&row[1])
                .map(|c| decode_entities(&TAG.replace_all(&c[1], "")).trim().to_string())
                .collect();
            if cells.len() <= FIRST_IN_COL {
                continue;
            }

            let name = &cells[NAME_COL];
            let first_in = &cells[FIRST_IN_COL];
            if name.is_empty() || !FIRST_IN_TIME.is_match(first_in) || seen.contains(name) {
                continue;
            }
            seen.insert(name.clone());
            records.push(AttendanceRecord {
                name: name.clone(),
                first_in: first_in.clone(),
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, first_in: &str) -> String {
        format!(
            "<tr><td>+</td><td>{}</td><td>0170</td><td>Ops</td><td>2026-03-02</td>\
             <td>Gate</td><td>{}</td><td>Gate</td><td>-</td><td></td><td>1:00</td></tr>",
            name, first_in
        )
    }

    #[test]
    fn test_extract_form_key_any_attribute_order() {
        let html = r#"<form><input type="hidden" value="k-123" name="_formkey"/>
            <input name="_formname" value="login" type="hidden"></form>"#;
        assert_eq!(extract_form_key(html), Some("k-123".to_string()));
    }

    #[test]
    fn test_extract_form_key_missing() {
        assert_eq!(extract_form_key("<form></form>"), None);
    }

    #[test]
    fn test_parse_table_filters_and_dedupes() {
        let html = format!(
            "<table><thead><tr><th>Name</th></tr></thead><tbody>{}{}{}{}</tbody></table>",
            row("Sakib (100031)", "08:47:12"),
            row("Yasmin (100040)", "-"),
            row("Sakib (100031)", "13:02:00"),
            row("<b>Ador</b> (100002)", "9:05")
        );
        let records = parse_attendance_table(&html);
        assert_eq!(
            records,
            vec![
                AttendanceRecord {
                    name: "Sakib (100031)".to_string(),
                    first_in: "08:47:12".to_string()
                },
                AttendanceRecord {
                    name: "Ador (100002)".to_string(),
                    first_in: "9:05".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_table_skips_short_rows() {
        let html = "<table><tr><td>a</td><td>b</td></tr></table>";
        assert!(parse_attendance_table(html).is_empty());
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("Ren&#233;e"), "Renée");
        assert_eq!(decode_entities("Ren&#xE9;e &#X2013; ops"), "Renée \u{2013} ops");
        assert_eq!(decode_entities("O&#39;Neil &amp; Co"), "O'Neil & Co");
        assert_eq!(decode_entities("a&nbsp;b"), "a b");
    }

    #[test]
    fn test_decode_leaves_invalid_references() {
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&amp;#233;"), "&#233;");
        assert_eq!(decode_entities("&#;"), "&#;");
    }

    #[test]
    fn test_parse_table_decodes_names() {
        let html = format!("<table>{}</table>", row("Ren&#233;e (100050)", "09:10"));
        let records = parse_attendance_table(&html);
        assert_eq!(records[0].name, "Renée (100050)");
    }

    #[test]
    fn test_entry_time_from_record() {
        let record = AttendanceRecord {
            name: "x".to_string(),
            first_in: "08:47:12".to_string(),
        };
        assert_eq!(record.entry_time().unwrap(), ClockTime::new(8, 47).unwrap());
    }

    #[test]
    fn test_login_page_markers() {
        assert!(is_login_page(r#"<input name="_formname" value="login">"#));
        assert!(is_invalid_login("<div>Invalid login</div>"));
        assert!(!is_invalid_login("<table></table>"));
    }
}
