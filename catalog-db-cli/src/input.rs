use crate::cli::{FieldArgs, HoldingsArgs};
use crate::error::{CliError, CliResult};
use catalog_db_api::{FieldInput, HoldingsData, RecordId};

/// A record named on the command line: a numeric id, or an external
/// identifier such as `(OCoLC)12345`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordRef {
    Id(RecordId),
    External(String),
}

pub fn parse_record_ref(s: &str) -> CliResult<RecordRef> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CliError::Usage("empty record reference".into()));
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        let id = s
            .parse::<RecordId>()
            .map_err(|e| CliError::Usage(format!("invalid record id '{s}': {e}")))?;
        return Ok(RecordRef::Id(id));
    }
    Ok(RecordRef::External(s.to_string()))
}

/// `a=Annual report` → (`a`, `Annual report`).
pub fn parse_subfield(s: &str) -> CliResult<(char, String)> {
    let (code, value) = s
        .split_once('=')
        .ok_or_else(|| CliError::Usage(format!("subfield '{s}' must look like code=value")))?;
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok((c, value.to_string())),
        _ => Err(CliError::Usage(format!(
            "subfield code must be one character, got '{code}'"
        ))),
    }
}

pub fn field_input(args: &FieldArgs) -> CliResult<FieldInput> {
    if let Some(value) = &args.value {
        return Ok(FieldInput::control(args.tag.clone(), value.clone()));
    }
    let mut ind = args.ind.chars();
    let (ind1, ind2) = match (ind.next(), ind.next(), ind.next()) {
        (Some(a), Some(b), None) => (a, b),
        (Some(a), None, None) => (a, ' '),
        (None, _, _) => (' ', ' '),
        _ => {
            return Err(CliError::Usage(format!(
                "indicators must be at most two characters, got '{}'",
                args.ind
            )))
        }
    };
    let mut input = FieldInput::data(args.tag.clone(), ind1, ind2);
    for raw in &args.subfields {
        let (code, value) = parse_subfield(raw)?;
        input = input.subfield(code, value);
    }
    Ok(input)
}

pub fn holdings(args: &HoldingsArgs) -> Option<HoldingsData> {
    let data = HoldingsData {
        barcode: args.barcode.clone(),
        call_number: args.call_number.clone(),
        location: args.location.clone(),
        note: args.item_note.clone(),
    };
    (!data.is_empty()).then_some(data)
}
