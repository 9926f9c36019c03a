use crate::cli::OutputFormat;
use crate::error::CliResult;
use catalog_db_api::fields::render_field;
use catalog_db_api::{CatalogRecord, FieldView};
use colored::Colorize;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` as JSON, or run `text` to print it for people.
pub fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T),
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            text(value);
            Ok(())
        }
    }
}

/// Leader line, then one line per field.
pub fn format_record(record: &CatalogRecord) -> String {
    let mut lines = vec![format!("LDR    {}", record.leader.as_str())];
    lines.extend(record.fields.iter().map(render_field));
    lines.join("\n")
}

pub fn format_field_views(views: &[FieldView]) -> String {
    views
        .iter()
        .map(|v| {
            let body = match &v.value {
                Some(value) => value.clone(),
                None => v
                    .subfields
                    .iter()
                    .map(|sf| format!("${} {}", sf.code, sf.value))
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            let ind = if v.value.is_some() {
                "  ".to_string()
            } else {
                format!("{}{}", v.ind1, v.ind2)
            };
            format!("{:>4}  {} {} {}", v.index.to_string().dimmed(), v.tag.bold(), ind, body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Key/value lines with aligned keys.
pub fn format_pairs(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{:width$}  {v}", k.cyan()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_db_api::Field;
    use catalog_db_core::{Indicators, Tag};

    #[test]
    fn record_lines() {
        colored::control::set_override(false);
        let mut rec = CatalogRecord::new();
        rec.push(Field::control(Tag::from_static(b"001"), "abc"));
        rec.push(
            Field::data(Tag::from_static(b"245"), Indicators::new('1', '0')).subfield('a', "Title"),
        );
        let text = format_record(&rec);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("LDR    "));
        assert_eq!(lines[1], "001 abc");
        assert_eq!(lines[2], "245 10 $a Title");
    }

    #[test]
    fn pairs_align() {
        colored::control::set_override(false);
        let text = format_pairs(&[("id", "1".into()), ("is_host", "true".into())]);
        assert_eq!(text, "id       1\nis_host  true");
    }
}
