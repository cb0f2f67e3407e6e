use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest column the xlsx format supports (XFD).
const MAX_COL: u32 = 16_384;

/// A cell reference such as `A1` or `AB12`: a base-26 column part with no
/// zero digit (A=1, Z=26, AA=27, ...) followed by a 1-based row number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid cell address: {0}")]
pub struct AddressError(pub String);

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        CellAddress { row, col }
    }

    pub fn col_to_letters(col: u16) -> String {
        let mut col = col;
        let mut result = String::new();
        while col > 0 {
            col -= 1;
            result.push(((col % 26) as u8 + b'A') as char);
            col /= 26;
        }
        result.chars().rev().collect()
    }

    pub fn letters_to_col(letters: &str) -> Option<u16> {
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }
        let mut col: u32 = 0;
        for c in letters.chars() {
            col = col
                .checked_mul(26)?
                .checked_add(c as u32 - 'A' as u32 + 1)?;
        }
        if col > MAX_COL {
            return None;
        }
        Some(col as u16)
    }

    /// Zero-based (row, col) pair as the xlsx writer expects them.
    pub fn to_indices(self) -> (u32, u16) {
        (self.row - 1, self.col - 1)
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);
        let col =
            CellAddress::letters_to_col(letters).ok_or_else(|| AddressError(s.to_string()))?;
        let row: u32 = digits.parse().map_err(|_| AddressError(s.to_string()))?;
        if row == 0 {
            return Err(AddressError(s.to_string()));
        }
        Ok(CellAddress { row, col })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellAddress::col_to_letters(self.col), self.row)
    }
}
