//! Interactive collection of the message.
//!
//! Fields already given on the command line are taken as-is; the rest are
//! asked for on the writer and read from the reader, one line each. The
//! body runs until a line holding only `.` or the end of input.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use missive_common::{Attachment, Limits, MailMessage, internal};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Unable to read input: {0}")]
    Io(#[from] io::Error),

    /// Input ended before a required field was given.
    #[error("No value given for {0}")]
    Missing(&'static str),

    #[error("Unable to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Attachment path {} has no file name", .0.display())]
    AttachmentName(PathBuf),
}

/// Message fields known before prompting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachment: Option<PathBuf>,
}

impl MessageDraft {
    /// Nothing left to ask for.
    pub const fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some() && self.subject.is_some() && self.body.is_some()
    }
}

pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Fill in the missing fields of `draft` and clip the result to `limits`.
    ///
    /// The attachment is only asked for when something else had to be asked
    /// too, so a fully specified command line never blocks on input.
    ///
    /// # Errors
    /// [`PromptError::Missing`] if input ends before the sender or recipient
    /// is known, and [`PromptError::Attachment`] if the attachment cannot be
    /// read.
    pub fn collect(
        &mut self,
        draft: MessageDraft,
        limits: &Limits,
    ) -> Result<MailMessage, PromptError> {
        let interactive = !draft.is_complete();

        let from = self.required(draft.from, "From", "sender")?;
        let to = self.required(draft.to, "To", "recipient")?;
        let subject = match draft.subject {
            Some(subject) => subject,
            None => self.ask("Subject")?.unwrap_or_default(),
        };
        let body = match draft.body {
            Some(body) => body,
            None => self.body()?,
        };

        let attachment_path = match draft.attachment {
            Some(path) => Some(path),
            None if interactive => self
                .ask("Attachment (path, blank for none)")?
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            None => None,
        };

        let mut message = MailMessage::new(from, to, subject, body);
        if let Some(path) = attachment_path {
            message = message.with_attachment(load_attachment(&path)?);
        }

        message.truncate_to(limits);
        Ok(message)
    }

    fn required(
        &mut self,
        value: Option<String>,
        label: &str,
        field: &'static str,
    ) -> Result<String, PromptError> {
        if let Some(value) = value {
            return Ok(value);
        }

        loop {
            match self.ask(label)? {
                Some(answer) if !answer.is_empty() => return Ok(answer),
                Some(_) => {}
                None => return Err(PromptError::Missing(field)),
            }
        }
    }

    /// One trimmed line, or `None` at end of input.
    fn ask(&mut self, label: &str) -> Result<Option<String>, PromptError> {
        write!(self.writer, "{label}: ")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_string()))
    }

    fn body(&mut self) -> Result<String, PromptError> {
        writeln!(self.writer, "Body (end with a line containing only '.'):")?;
        self.writer.flush()?;

        let mut lines = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }

            let text = line.trim_end_matches(['\r', '\n']);
            if text == "." {
                break;
            }
            lines.push(text.to_string());
        }

        Ok(lines.join("\n"))
    }
}

/// Read a file to attach; its file name becomes the attachment name.
///
/// # Errors
/// [`PromptError::AttachmentName`] for a path without a file name and
/// [`PromptError::Attachment`] if reading fails.
pub fn load_attachment(path: &Path) -> Result<Attachment, PromptError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PromptError::AttachmentName(path.to_path_buf()))?;

    let bytes = std::fs::read(path).map_err(|source| PromptError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;

    internal!(level = DEBUG, "Attaching {} ({} bytes)", name, bytes.len());
    Ok(Attachment::new(name, bytes))
}
