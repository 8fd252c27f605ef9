//! The mail-data record handed from the collector to the MIME builder.

use serde::Deserialize;

/// 512 KiB, the ceiling for the body and for an encoded attachment.
pub const DEFAULT_MAX_DATA_SIZE: usize = 512 * 1024;

/// RFC 5321 caps a path at 256 octets; 320 leaves room for display names.
pub const DEFAULT_MAX_ADDRESS_LEN: usize = 320;

/// The RFC 5322 hard line limit.
pub const DEFAULT_MAX_SUBJECT_LEN: usize = 998;

/// Ceiling for a single read of a server reply.
pub const DEFAULT_MAX_REPLY_SIZE: usize = 1024 * 1024;

/// Size ceilings applied to a message and to the session buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_address_len: usize,
    pub max_subject_len: usize,
    /// Applies to the body and to the base64-encoded attachment.
    pub max_data_size: usize,
    pub max_reply_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_address_len: DEFAULT_MAX_ADDRESS_LEN,
            max_subject_len: DEFAULT_MAX_SUBJECT_LEN,
            max_data_size: DEFAULT_MAX_DATA_SIZE,
            max_reply_size: DEFAULT_MAX_REPLY_SIZE,
        }
    }
}

/// A file attached to a message.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    bytes: Vec<u8>,
}

impl Attachment {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// An attachment with no name or no content is treated as absent.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() || self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Everything needed to compose and send one message to one recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl MailMessage {
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Clip every text field to its ceiling, on a character boundary.
    ///
    /// The attachment is left alone; the MIME builder decides whether it fits.
    pub fn truncate_to(&mut self, limits: &Limits) {
        truncate(&mut self.from, limits.max_address_len);
        truncate(&mut self.to, limits.max_address_len);
        truncate(&mut self.subject, limits.max_subject_len);
        truncate(&mut self.body, limits.max_data_size);
    }
}

fn truncate(value: &mut String, max: usize) {
    if value.len() <= max {
        return;
    }

    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_data_size, 512 * 1024);
        assert_eq!(limits.max_reply_size, 1024 * 1024);
    }

    #[test]
    fn test_partial_limits_from_ron() {
        let limits: Limits = ron::from_str("(max_data_size: 1024)").unwrap();
        assert_eq!(limits.max_data_size, 1024);
        assert_eq!(limits.max_subject_len, DEFAULT_MAX_SUBJECT_LEN);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut message = MailMessage::new("a@x.com", "b@x.com", "héllo", "body");
        let limits = Limits {
            max_subject_len: 2,
            ..Limits::default()
        };

        message.truncate_to(&limits);

        // 'é' is two bytes, so only 'h' fits.
        assert_eq!(message.subject, "h");
        assert_eq!(message.body, "body");
    }

    #[test]
    fn test_empty_attachment() {
        assert!(Attachment::new("", b"data".to_vec()).is_empty());
        assert!(Attachment::new("a.png", Vec::new()).is_empty());
        assert!(!Attachment::new("a.png", vec![0x89]).is_empty());
    }

    #[test]
    fn test_attachment_debug_omits_content() {
        let attachment = Attachment::new("a.png", vec![1, 2, 3]);
        assert_eq!(
            format!("{attachment:?}"),
            "Attachment { name: \"a.png\", len: 3 }"
        );
    }
}
