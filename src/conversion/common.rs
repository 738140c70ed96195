use csv::{QuoteStyle, Terminator};
use serde::{Serialize, Serializer};
use std::{
    borrow::{Borrow, Cow},
    io::Write,
};

/// [TextCell] holds a scalar column value. It is written to the CSV bare
/// unless its content forces quoting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextCell(String);

/// [TranscriptCell] holds a newline-joined transcript. Transcripts are always
/// written quoted, even when they fit on a single line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranscriptCell(String);

/// [MessageCount] is the number of patron and library messages in a record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageCount(pub u32);

impl MessageCount {
    /// Mutates the [MessageCount] by 1.
    pub fn increase_by_one(&mut self) {
        self.0 += 1
    }
}

impl TextCell {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextCell {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TextCell {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl TranscriptCell {
    /// Joins the messages with newlines and trims the surrounding whitespace
    /// of the result (not of the single messages).
    pub fn from_messages<S: Borrow<str>>(messages: &[S]) -> Self {
        Self(messages.join("\n").trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TranscriptCell {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// The CSV writer runs with `QuoteStyle::Never`, so every cell arrives here
// already escaped.
impl Serialize for TextCell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&escape_cell(&self.0, false))
    }
}

impl Serialize for TranscriptCell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&escape_cell(&self.0, true))
    }
}

/// Returns the CSV writer used for the output rows: comma separated,
/// CRLF terminated, no automatic header. Quoting is left to the cells
/// themselves (see [escape_cell]), so the writer never adds quotes.
pub fn row_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::CRLF)
        .from_writer(writer)
}

/// Applies standard CSV escaping: the value is wrapped in double quotes when
/// `always_quote` is set or when it contains a delimiter, a quote or a line
/// break, and embedded quotes are doubled.
pub fn escape_cell(value: &str, always_quote: bool) -> Cow<'_, str> {
    let needs_quotes =
        always_quote || value.contains(|c: char| matches!(c, ',' | '"' | '\r' | '\n'));
    if !needs_quotes {
        return Cow::Borrowed(value);
    }
    Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
}
