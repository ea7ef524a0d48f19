//! Pager-script rendering.
//!
//! Renders a [`PageRequest`] into pager-script source text. The output
//! depends only on the request, so rendering is deterministic. The contract
//! hash is embedded literally as given; the owner address is re-encoded
//! from its decoded bytes, which canonicalizes it to lowercase hex.

use crate::ast::PageRequest;
use crate::Result;

/// Enumeration entry point invoked on the target contract.
pub const OPERATION: &str = "tokensOf";

/// Render a request into pager-script source.
///
/// The `skip` field carries `page * limit` verbatim; `take` carries the
/// page limit.
pub fn render(request: &PageRequest) -> Result<String> {
    let start = request.start()?;

    Ok(format!(
        "page {operation} {{\n\
        \x20   contract 0x{contract};\n\
        \x20   owner 0x{owner};\n\
        \x20   skip {start};\n\
        \x20   take {take};\n\
        }}\n",
        operation = OPERATION,
        contract = request.contract,
        owner = hex::encode(&request.owner),
        start = start,
        take = request.limit,
    ))
}
