//! Positional entry of the 6-digit verification code.
//!
//! Each position is settable on its own, mirroring one input box per digit.
//! The entry never touches any UI: focus movement is signalled as a
//! [`FocusRequest`] and performed by whoever renders the boxes.

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// A request to move input focus to the digit box at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRequest {
    /// The position that should receive focus next.
    pub index: usize,
}

/// Accumulates a verification code from independent positions.
///
/// Invariant: every position is either empty or holds exactly one decimal
/// digit. Anything else offered to [`CodeEntry::set_digit`] is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEntry {
    digits: [Option<char>; CODE_LENGTH],
}

impl CodeEntry {
    /// An all-empty code entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `index`.
    ///
    /// An empty `value` clears the position. A single decimal digit fills it
    /// and, unless this was the last position, asks for focus on the next
    /// one. Everything else (multiple characters, non-digits, out-of-range
    /// indices) is silently ignored.
    pub fn set_digit(&mut self, index: usize, value: &str) -> Option<FocusRequest> {
        if index >= CODE_LENGTH {
            return None;
        }

        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                self.digits[index] = None;
                None
            }
            (Some(digit), None) if digit.is_ascii_digit() => {
                self.digits[index] = Some(digit);
                (index + 1 < CODE_LENGTH).then_some(FocusRequest { index: index + 1 })
            }
            _ => None,
        }
    }

    /// React to backspace in the box at `index`: when that box is already
    /// empty, focus should move back one position so the previous digit can
    /// be edited.
    pub fn handle_backspace(&self, index: usize) -> Option<FocusRequest> {
        if index > 0 && index < CODE_LENGTH && self.digits[index].is_none() {
            Some(FocusRequest { index: index - 1 })
        } else {
            None
        }
    }

    /// The code as entered so far, all positions concatenated in order.
    pub fn assemble(&self) -> String {
        self.digits.iter().flatten().collect()
    }

    /// Whether all positions are filled in.
    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    /// Clear all positions and put focus back on the first box.
    pub fn reset(&mut self) -> FocusRequest {
        self.digits = Default::default();
        FocusRequest { index: 0 }
    }
}
