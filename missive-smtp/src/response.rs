//! SMTP reply parsing.
//!
//! Only the first three bytes of a reply are interpreted. Continuation lines
//! (`250-...`) are not aggregated; whatever a single read returned is kept
//! verbatim in [`SmtpResponse::raw`].

/// One server reply, as read in a single receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    /// The status code, or `0` if the reply does not start with three digits.
    pub code: u16,
    /// Everything the server sent in this read.
    pub raw: String,
}

impl SmtpResponse {
    pub fn parse(data: &[u8]) -> Self {
        Self {
            code: parse_code(data),
            raw: String::from_utf8_lossy(data).into_owned(),
        }
    }

    /// `true` if this reply carries `expected`. A code of `0` never matches.
    #[must_use]
    pub const fn matches(&self, expected: u16) -> bool {
        self.code != 0 && self.code == expected
    }

    /// The reply without its trailing line break, for log lines.
    pub fn message(&self) -> &str {
        self.raw.trim_end_matches(['\r', '\n'])
    }
}

fn parse_code(data: &[u8]) -> u16 {
    match data {
        [a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() => {
            u16::from(a - b'0') * 100 + u16::from(b - b'0') * 10 + u16::from(c - b'0')
        }
        _ => 0,
    }
}
