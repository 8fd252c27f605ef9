//! MIME `multipart/mixed` assembly for the DATA payload.
//!
//! The output is a list of CRLF-terminated lines grouped by the script step
//! that sends them. Nothing in the output depends on the clock or on
//! randomness, so the same [`MailMessage`] always produces the same bytes.

use missive_common::{Attachment, Limits, MailMessage, tracing};

use crate::{base64, error::AttachmentError, script::Step};

/// Separator between the parts of every message.
pub const BOUNDARY: &str = "MISSIVE-5f3c2a9e-BOUNDARY";

/// Maximum base64 characters per line (RFC 2045 §6.8).
pub const LINE_WIDTH: usize = 76;

const CRLF: &str = "\r\n";

/// A message ready to be written between `DATA` and the final `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMessage {
    headers: Vec<String>,
    body: Vec<String>,
    attachment: Option<Vec<String>>,
    closing: Vec<String>,
}

impl MimeMessage {
    /// Lay out `message` as a multipart message.
    ///
    /// An attachment that is empty or whose encoded size exceeds
    /// [`Limits::max_data_size`] is dropped with a warning; the rest of the
    /// message is built as if there had been none.
    pub fn build(message: &MailMessage, limits: &Limits) -> Self {
        let attachment = message.attachment.as_ref().and_then(|attachment| {
            attachment_part(attachment, limits)
                .inspect_err(|err| {
                    tracing::warn!(name = attachment.name(), %err, "Dropping attachment");
                })
                .ok()
        });

        Self {
            headers: header_block(message),
            body: body_part(&message.body),
            attachment,
            closing: vec![line(format_args!("--{BOUNDARY}--"))],
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn attachment(&self) -> Option<&[String]> {
        self.attachment.as_deref()
    }

    pub fn closing(&self) -> &[String] {
        &self.closing
    }

    pub const fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// The lines sent during `step`.
    ///
    /// The closing delimiter travels with the last part, so it belongs to
    /// [`Step::Attachment`] when there is one and to [`Step::Body`] otherwise.
    /// Steps outside the DATA payload have no lines.
    pub fn section(&self, step: Step) -> Vec<&str> {
        let closing = self.closing.iter().map(String::as_str);

        match (step, &self.attachment) {
            (Step::Headers, _) => self.headers.iter().map(String::as_str).collect(),
            (Step::Body, None) => self.body.iter().map(String::as_str).chain(closing).collect(),
            (Step::Body, Some(_)) => self.body.iter().map(String::as_str).collect(),
            (Step::Attachment, Some(lines)) => {
                lines.iter().map(String::as_str).chain(closing).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Every line in wire order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .chain(&self.body)
            .chain(self.attachment.iter().flatten())
            .chain(&self.closing)
            .map(String::as_str)
    }

    /// The whole payload as one string.
    pub fn to_wire(&self) -> String {
        self.lines().collect()
    }
}

fn line(content: impl std::fmt::Display) -> String {
    format!("{content}{CRLF}")
}

/// Header values must stay on one line.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn header_block(message: &MailMessage) -> Vec<String> {
    vec![
        line(format_args!("Subject: {}", header_value(&message.subject))),
        line(format_args!("From: {}", header_value(&message.from))),
        line(format_args!("To: {}", header_value(&message.to))),
        line("MIME-Version: 1.0"),
        line(format_args!(
            "Content-Type: multipart/mixed; boundary=\"{BOUNDARY}\""
        )),
        CRLF.to_string(),
    ]
}

fn body_part(body: &str) -> Vec<String> {
    let mut lines = vec![
        line(format_args!("--{BOUNDARY}")),
        line("Content-Type: text/plain; charset=\"utf-8\""),
        line("Content-Transfer-Encoding: 7bit"),
        CRLF.to_string(),
    ];

    // A bare CR is a line break too; DATA may only carry CR as part of CRLF.
    lines.extend(
        body.lines()
            .flat_map(|text| text.split('\r'))
            .map(|text| line(dot_stuff(text))),
    );
    lines.push(CRLF.to_string());
    lines
}

/// A body line starting with `.` gets a second one so it cannot end DATA.
fn dot_stuff(text: &str) -> String {
    if text.starts_with('.') {
        format!(".{text}")
    } else {
        text.to_string()
    }
}

fn attachment_part(
    attachment: &Attachment,
    limits: &Limits,
) -> Result<Vec<String>, AttachmentError> {
    if attachment.is_empty() {
        return Err(AttachmentError::Empty);
    }

    let encoded_len = base64::encoded_len(attachment.bytes().len());
    if encoded_len > limits.max_data_size {
        return Err(AttachmentError::TooLarge {
            encoded: encoded_len,
            limit: limits.max_data_size,
        });
    }

    let name = header_value(attachment.name()).replace('"', "'");
    let mut lines = vec![
        line(format_args!("--{BOUNDARY}")),
        line(format_args!("Content-Type: image/png; name=\"{name}\"")),
        line("Content-Transfer-Encoding: base64"),
        line(format_args!(
            "Content-Disposition: attachment; filename=\"{name}\""
        )),
        CRLF.to_string(),
    ];

    let encoded = base64::encode(attachment.bytes());
    lines.extend(
        encoded
            .as_bytes()
            .chunks(LINE_WIDTH)
            .map(|chunk| line(chunk.iter().copied().map(char::from).collect::<String>())),
    );
    lines.push(CRLF.to_string());

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn hello() -> MailMessage {
        MailMessage::new("a@x.com", "b@x.com", "Hi", "Hello")
    }

    #[test]
    fn test_plain_message_bytes() {
        let mime = MimeMessage::build(&hello(), &Limits::default());

        assert_eq!(
            mime.to_wire(),
            "Subject: Hi\r\n\
             From: a@x.com\r\n\
             To: b@x.com\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"MISSIVE-5f3c2a9e-BOUNDARY\"\r\n\
             \r\n\
             --MISSIVE-5f3c2a9e-BOUNDARY\r\n\
             Content-Type: text/plain; charset=\"utf-8\"\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             Hello\r\n\
             \r\n\
             --MISSIVE-5f3c2a9e-BOUNDARY--\r\n"
        );
        assert!(!mime.has_attachment());
    }

    #[test]
    fn test_attachment_part_bytes() {
        let message =
            hello().with_attachment(Attachment::new("dot.png", b"Man".to_vec()));
        let mime = MimeMessage::build(&message, &Limits::default());

        assert_eq!(
            mime.section(Step::Attachment),
            vec![
                "--MISSIVE-5f3c2a9e-BOUNDARY\r\n",
                "Content-Type: image/png; name=\"dot.png\"\r\n",
                "Content-Transfer-Encoding: base64\r\n",
                "Content-Disposition: attachment; filename=\"dot.png\"\r\n",
                "\r\n",
                "TWFu\r\n",
                "\r\n",
                "--MISSIVE-5f3c2a9e-BOUNDARY--\r\n",
            ]
        );
        assert_eq!(mime.section(Step::Body).last(), Some(&"\r\n"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let message = hello().with_attachment(Attachment::new("a.png", vec![7; 500]));
        let limits = Limits::default();

        assert_eq!(
            MimeMessage::build(&message, &limits).to_wire(),
            MimeMessage::build(&message, &limits).to_wire()
        );
    }

    #[test]
    fn test_oversized_attachment_is_dropped() {
        let limits = Limits {
            max_data_size: 8,
            ..Limits::default()
        };
        // 7 bytes encode to 12 characters.
        let message = hello().with_attachment(Attachment::new("big.png", vec![0; 7]));

        let mime = MimeMessage::build(&message, &limits);

        assert!(!mime.has_attachment());
        assert!(mime.section(Step::Attachment).is_empty());
        assert_eq!(mime.to_wire(), MimeMessage::build(&hello(), &limits).to_wire());
    }

    #[test]
    fn test_attachment_at_limit_is_kept() {
        let limits = Limits {
            max_data_size: 8,
            ..Limits::default()
        };
        let message = hello().with_attachment(Attachment::new("ok.png", vec![0; 6]));

        assert!(MimeMessage::build(&message, &limits).has_attachment());
    }

    #[test]
    fn test_empty_attachment_is_dropped() {
        let message = hello().with_attachment(Attachment::new("a.png", Vec::new()));
        assert!(!MimeMessage::build(&message, &Limits::default()).has_attachment());

        assert_eq!(
            attachment_part(&Attachment::new("", vec![1]), &Limits::default()),
            Err(AttachmentError::Empty)
        );
    }

    #[test]
    fn test_base64_is_wrapped() {
        let message = hello().with_attachment(Attachment::new("a.png", vec![0xAB; 100]));
        let mime = MimeMessage::build(&message, &Limits::default());

        let payload: Vec<usize> = mime.attachment().unwrap_or_default()[5..]
            .iter()
            .map(|line| line.trim_end().len())
            .collect();

        // 100 bytes encode to 136 characters.
        assert_eq!(payload, vec![76, 60, 0]);
    }

    #[test]
    fn test_body_is_normalised_and_dot_stuffed() {
        let message = MailMessage::new("a@x.com", "b@x.com", "Hi", "one\n.\r\n..two\nthree");
        let mime = MimeMessage::build(&message, &Limits::default());

        assert_eq!(
            &mime.body()[4..],
            &["one\r\n", "..\r\n", "...two\r\n", "three\r\n", "\r\n"]
        );
    }

    #[test]
    fn test_bare_carriage_return_becomes_line_break() {
        let message = MailMessage::new("a@x.com", "b@x.com", "Hi", "one\rtwo\r.three\r\nfour");
        let mime = MimeMessage::build(&message, &Limits::default());

        assert_eq!(
            &mime.body()[4..],
            &["one\r\n", "two\r\n", "..three\r\n", "four\r\n", "\r\n"]
        );
        assert!(
            mime.lines()
                .all(|line| !line.trim_end_matches("\r\n").contains('\r'))
        );
    }

    #[test]
    fn test_header_values_stay_on_one_line() {
        let message = MailMessage::new("a@x.com", "b@x.com", "Hi\r\nBcc: c@x.com", "");
        let mime = MimeMessage::build(&message, &Limits::default());

        assert_eq!(mime.headers()[0], "Subject: Hi  Bcc: c@x.com\r\n");
    }

    #[test]
    fn test_sections_cover_every_line() {
        let message = hello().with_attachment(Attachment::new("a.png", vec![1, 2, 3]));
        let mime = MimeMessage::build(&message, &Limits::default());

        let sections: Vec<&str> = [Step::Headers, Step::Body, Step::Attachment]
            .into_iter()
            .flat_map(|step| mime.section(step))
            .collect();

        assert_eq!(sections, mime.lines().collect::<Vec<_>>());
        assert!(mime.section(Step::Quit).is_empty());
        assert_eq!(mime.closing(), &["--MISSIVE-5f3c2a9e-BOUNDARY--\r\n"]);
    }
}
