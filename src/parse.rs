use super::*;

use std::collections::BTreeSet;

use lalrpop_util::lalrpop_mod;
use lalrpop_util::ParseError;
lalrpop_mod!(grammar);

pub fn load_chips_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Vec<ChipDef>, Vec<HdlError>> {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return Err(vec![HdlError::Io(path.to_owned(), e.to_string())]),
    };
    let source_info = SourceInfo::from_file(path, &text);
    chips_from_string(source_info, &text)
}

/// Parses every `CHIP` block in `text`.
pub fn parse_chips(text: &str) -> Result<Vec<ChipDef>, Vec<HdlError>> {
    let source_info = SourceInfo::from_string(text);
    chips_from_string(source_info, text)
}

/// Parses text holding exactly one `CHIP` block.
pub fn parse_chip(text: &str) -> Result<ChipDef, Vec<HdlError>> {
    let mut chips = parse_chips(text)?;
    if chips.len() == 1 {
        Ok(chips.remove(0))
    } else {
        let message = format!("Expected one CHIP definition, found {}", chips.len());
        Err(vec![HdlError::ParseError(Loc::unknown(), message)])
    }
}

fn chips_from_string(source_info: SourceInfo, text: &str) -> Result<Vec<ChipDef>, Vec<HdlError>> {
    let chips: Vec<ChipDef> = match grammar::ChipsParser::new().parse(&source_info, text) {
        Ok(chips) => chips,
        Err(ParseError::UnrecognizedToken { token, expected }) => {
            let (start_idx, _token, end_idx) = token;
            let loc = Loc::from(&source_info, start_idx, end_idx);
            let message = format!("Parse error at {}: Expected one of {}", loc.start(), expected.join(" "));
            return Err(vec![HdlError::ParseError(loc, message)]);
        },
        Err(ParseError::UnrecognizedEof { location, expected }) => {
            let loc = Loc::from(&source_info, location, location);
            let message = format!("Parse error at {}: Unexpected end of file, expected one of {}", loc.start(), expected.join(" "));
            return Err(vec![HdlError::ParseError(loc, message)]);
        },
        Err(ParseError::InvalidToken { location }) => {
            let loc = Loc::from(&source_info, location, location);
            let message = format!("Parse error at {}: Invalid token", loc.start());
            return Err(vec![HdlError::ParseError(loc, message)]);
        },
        Err(ParseError::ExtraToken { token }) => {
            let (start_idx, _token, end_idx) = token;
            let loc = Loc::from(&source_info, start_idx, end_idx);
            let message = format!("Parse error at {}: Unexpected token", loc.start());
            return Err(vec![HdlError::ParseError(loc, message)]);
        },
        Err(ParseError::User { error }) => {
            return Err(vec![HdlError::ParseError(Loc::unknown(), format!("Parse error: {error}"))]);
        },
    };

    if chips.is_empty() {
        return Err(vec![HdlError::ParseError(Loc::unknown(), "Invalid HDL: no CHIP definition found".to_string())]);
    }

    let mut errors = vec![];
    let mut seen = BTreeSet::new();
    for chip in &chips {
        if !seen.insert(chip.name()) {
            errors.push(HdlError::DuplicateChip(chip.loc(), chip.name().to_string()));
        }
        errors.extend(registry::duplicate_pins(chip));
        for part in chip.parts() {
            let mut formals = BTreeSet::new();
            for connection in part.connections() {
                if !formals.insert(connection.formal()) {
                    errors.push(HdlError::DuplicatePin(part.loc(), chip.name().to_string(), connection.formal().to_string()));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(chips)
    } else {
        Err(errors)
    }
}
