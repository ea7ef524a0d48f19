//! Pager-script parser.
//!
//! Parses pager-script source into a [`PageQuery`] using the pest PEG
//! parser. Every field must appear exactly once; duplicates and omissions
//! are parse errors.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::PageQuery;
use crate::{PagerError, Result};

#[derive(Parser)]
#[grammar = "../grammar/pager.pest"]
struct PagerParser;

/// Parse pager-script source into a page query.
///
/// # Arguments
///
/// * `source` - The pager-script source to parse
///
/// # Returns
///
/// The parsed query or a parse error with line/column information
pub fn parse(source: &str) -> Result<PageQuery> {
    let mut pairs = PagerParser::parse(Rule::program, source).map_err(|e| {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        PagerError::Parse {
            line,
            column,
            message: e.variant.message().to_string(),
        }
    })?;

    let mut operation = None;
    let mut contract = None;
    let mut owner = None;
    let mut skip = None;
    let mut take = None;
    let mut page_pos = (1, 1);

    if let Some(program) = pairs.next() {
        for pair in program.into_inner() {
            if pair.as_rule() != Rule::page {
                continue;
            }
            page_pos = position(&pair);

            for field in pair.into_inner() {
                let (line, column) = position(&field);
                match field.as_rule() {
                    Rule::ident => {
                        operation = Some(field.as_str().to_string());
                    }
                    Rule::contract_field => {
                        let value = parse_hex_field(field, "contract")?;
                        if contract.replace(value).is_some() {
                            return Err(duplicate_field("contract", line, column));
                        }
                    }
                    Rule::owner_field => {
                        let value = parse_hex_field(field, "owner")?;
                        if owner.replace(value).is_some() {
                            return Err(duplicate_field("owner", line, column));
                        }
                    }
                    Rule::skip_field => {
                        let value = parse_int_field(field, "skip")?;
                        if skip.replace(value).is_some() {
                            return Err(duplicate_field("skip", line, column));
                        }
                    }
                    Rule::take_field => {
                        let value = parse_int_field(field, "take")?;
                        if take.replace(value).is_some() {
                            return Err(duplicate_field("take", line, column));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    let (line, column) = page_pos;
    Ok(PageQuery {
        operation: operation.ok_or_else(|| missing_field("operation", line, column))?,
        contract: contract.ok_or_else(|| missing_field("contract", line, column))?,
        owner: owner.ok_or_else(|| missing_field("owner", line, column))?,
        skip: skip.ok_or_else(|| missing_field("skip", line, column))?,
        take: take.ok_or_else(|| missing_field("take", line, column))?,
    })
}

fn position(pair: &Pair<Rule>) -> (usize, usize) {
    pair.as_span().start_pos().line_col()
}

fn missing_field(field: &str, line: usize, column: usize) -> PagerError {
    PagerError::Parse {
        line,
        column,
        message: format!("missing required field `{field}`"),
    }
}

fn duplicate_field(field: &str, line: usize, column: usize) -> PagerError {
    PagerError::Parse {
        line,
        column,
        message: format!("duplicate field `{field}`"),
    }
}

/// Decode a `0x`-prefixed hex literal field into bytes.
fn parse_hex_field(pair: Pair<Rule>, field: &'static str) -> Result<Vec<u8>> {
    let (line, column) = position(&pair);
    let literal = pair
        .into_inner()
        .next()
        .ok_or_else(|| missing_field(field, line, column))?;
    let digits = &literal.as_str()[2..];

    hex::decode(digits).map_err(|e| PagerError::Parse {
        line,
        column,
        message: format!("invalid hex in `{field}`: {e}"),
    })
}

/// Parse a decimal integer field.
fn parse_int_field(pair: Pair<Rule>, field: &'static str) -> Result<u64> {
    let (line, column) = position(&pair);
    let literal = pair
        .into_inner()
        .next()
        .ok_or_else(|| missing_field(field, line, column))?;

    literal.as_str().parse::<u64>().map_err(|e| PagerError::Parse {
        line,
        column,
        message: format!("invalid `{field}` count: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "page tokensOf {\n\
        \x20   contract 0xaabbcc;\n\
        \x20   owner 0x1234;\n\
        \x20   skip 10;\n\
        \x20   take 5;\n\
        }\n";

    #[test]
    fn test_parse_full_script() {
        let query = parse(SOURCE).unwrap();
        assert_eq!(query.operation, "tokensOf");
        assert_eq!(query.contract, vec![0xaa, 0xbb, 0xcc]);
        assert_eq!(query.owner, vec![0x12, 0x34]);
        assert_eq!(query.skip, 10);
        assert_eq!(query.take, 5);
    }

    #[test]
    fn test_fields_in_any_order() {
        let source = "page tokensOf { take 5; skip 10; owner 0x1234; contract 0xaabbcc; }";
        let query = parse(source).unwrap();
        assert_eq!(query.skip, 10);
        assert_eq!(query.take, 5);
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "// one page of tokens\npage tokensOf {\n\
            contract 0xaabbcc; // target\n\
            owner 0x1234;\nskip 0;\ntake 1;\n}";
        assert!(parse(source).is_ok());
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let source = "page tokensOf { contract 0xaabbcc; owner 0x1234; skip 0; }";
        let err = parse(source).unwrap_err();
        match err {
            PagerError::Parse { message, .. } => {
                assert!(message.contains("take"), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_field_is_an_error() {
        let source = "page tokensOf { contract 0xaabbcc; owner 0x1234; skip 0; take 1; take 2; }";
        let err = parse(source).unwrap_err();
        match err {
            PagerError::Parse { message, .. } => {
                assert!(message.contains("duplicate"), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_odd_length_hex_is_an_error() {
        let source = "page tokensOf { contract 0xaabbcc; owner 0x123; skip 0; take 1; }";
        let err = parse(source).unwrap_err();
        match err {
            PagerError::Parse { message, .. } => {
                assert!(message.contains("owner"), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_hex_contract_is_rejected() {
        let source = "page tokensOf { contract 0x12g4; owner 0x1234; skip 0; take 1; }";
        assert!(matches!(
            parse(source).unwrap_err(),
            PagerError::Parse { .. }
        ));
    }

    #[test]
    fn test_empty_hex_literal_decodes_to_no_bytes() {
        let source = "page tokensOf { contract 0x; owner 0x1234; skip 0; take 1; }";
        let query = parse(source).unwrap();
        assert!(query.contract.is_empty());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(parse("").unwrap_err(), PagerError::Parse { .. }));
    }

    #[test]
    fn test_parse_error_carries_position() {
        let err = parse("page tokensOf {").unwrap_err();
        match err {
            PagerError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
