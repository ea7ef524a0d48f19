//! Page request and query definitions.
//!
//! A [`PageRequest`] holds the raw tool inputs after address decoding; a
//! [`PageQuery`] is the parsed form of a pager script, ready for code
//! generation.

use crate::{PagerError, Result};

/// Raw inputs to the generator, with the owner address already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Script hash of the deployed contract, passed through as given.
    pub contract: String,
    /// Decoded owner address bytes.
    pub owner: Vec<u8>,
    /// Zero-based page index.
    pub page: u64,
    /// Maximum number of items per page.
    pub limit: u64,
}

impl PageRequest {
    /// Build a request from the raw textual inputs.
    ///
    /// The owner address must be valid hexadecimal; odd-length or non-hex
    /// text fails with a decode error. The contract hash is not validated
    /// here — an unusable hash surfaces as a compile error later.
    pub fn new(
        contract: impl Into<String>,
        address_hex: &str,
        page: u64,
        limit: u64,
    ) -> Result<Self> {
        let owner = hex::decode(address_hex).map_err(|source| PagerError::Hex {
            field: "address",
            source,
        })?;

        Ok(Self {
            contract: contract.into(),
            owner,
            page,
            limit,
        })
    }

    /// Number of enumerated items to skip before collecting: `page * limit`.
    pub fn start(&self) -> Result<u64> {
        self.page
            .checked_mul(self.limit)
            .ok_or(PagerError::Overflow {
                page: self.page,
                limit: self.limit,
            })
    }
}

/// A parsed pager script: one paginated call against a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Remote operation to invoke, e.g. `tokensOf`.
    pub operation: String,
    /// Script hash bytes of the target contract, big-endian as written.
    pub contract: Vec<u8>,
    /// Owner address bytes, passed as the single call argument.
    pub owner: Vec<u8>,
    /// Items to skip before collecting.
    pub skip: u64,
    /// Maximum number of items to collect.
    pub take: u64,
}
