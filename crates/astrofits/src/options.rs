//! Read-time configuration.

/// How an ASCII table treats a numeric field that is entirely blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlankPolicy {
    /// Fail with [`Error::Parse`](crate::Error::Parse).
    #[default]
    Reject,
    /// Substitute 0 for integers and NaN for floats.
    Sentinel,
}

/// Options applied while reading HDUs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Check mandatory keyword presence and order before decoding a body.
    pub validate_keywords: bool,
    /// Reject binary tables whose column widths do not sum to NAXIS1.
    /// When off, the mismatch is logged and decoding continues.
    pub check_row_width: bool,
    pub blank_fields: BlankPolicy,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            validate_keywords: true,
            check_row_width: true,
            blank_fields: BlankPolicy::Reject,
        }
    }
}

impl ReadOptions {
    pub fn with_validate_keywords(mut self, on: bool) -> Self {
        self.validate_keywords = on;
        self
    }

    pub fn with_check_row_width(mut self, on: bool) -> Self {
        self.check_row_width = on;
        self
    }

    pub fn with_blank_fields(mut self, policy: BlankPolicy) -> Self {
        self.blank_fields = policy;
        self
    }
}
