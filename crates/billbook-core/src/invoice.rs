//! Invoice number generation.
//!
//! Invoice numbers look like `INV-2024-007`: a fixed prefix, the four digit
//! creation year and a sequence zero-padded to three digits.

use serde::{Deserialize, Serialize};

const PREFIX: &str = "INV";

/// How the sequence part of a new invoice number is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceSequence {
    /// Number of stored records plus one. Deleting a record and saving a new
    /// one can hand out a number that is still in use.
    #[default]
    RecordCount,
    /// Highest sequence already issued for the same year plus one.
    NextAfterHighest,
}

impl InvoiceSequence {
    pub fn next<'a>(&self, year: i32, existing: impl ExactSizeIterator<Item = &'a str>) -> u32 {
        match self {
            InvoiceSequence::RecordCount => existing.len() as u32 + 1,
            InvoiceSequence::NextAfterHighest => {
                existing
                    .filter_map(parse_invoice_number)
                    .filter(|(y, _)| *y == year)
                    .map(|(_, seq)| seq)
                    .max()
                    .unwrap_or(0)
                    + 1
            }
        }
    }
}

pub fn format_invoice_number(year: i32, sequence: u32) -> String {
    format!("{}-{:04}-{:03}", PREFIX, year, sequence)
}

pub fn parse_invoice_number(s: &str) -> Option<(i32, u32)> {
    let mut parts = s.splitn(3, '-');
    if parts.next()? != PREFIX {
        return None;
    }
    let year = parts.next()?;
    let sequence = parts.next()?;
    if year.len() != 4 || sequence.len() < 3 {
        return None;
    }
    Some((year.parse().ok()?, sequence.parse().ok()?))
}
