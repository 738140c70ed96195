use roxmltree::Node;
use serde::Serialize;

use super::common::{MessageCount, TextCell, TranscriptCell};

/// [ChatRecord] is one `Record` element flattened into the output row.
/// The field order is the column order of the CSV file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRecord {
    pub record_id: TextCell,
    pub category: TextCell,
    pub initial_inquiry: TextCell,
    pub user_transcript: TranscriptCell,
    pub support_transcript: TranscriptCell,
    pub started_at: TextCell,
    pub finished_at: TextCell,
    pub message_count: MessageCount,
    pub referer: TextCell,
    pub wait_time: TextCell,
    pub session_duration: TextCell,
    pub resolution: TextCell,
}

impl ChatRecord {
    pub const HEADERS: [&'static str; 12] = [
        "RecordID",
        "Category",
        "Initial Inquiry",
        "Transcript (User)",
        "Transcript (Support)",
        "Timestamp Started",
        "Timestamp Finished",
        "Message Count",
        "Referer",
        "Wait Time",
        "Session Duration",
        "Resolution",
    ];

    /// Extracts a [ChatRecord] from a `Record` element. Every lookup is
    /// tolerant: a missing element yields an empty cell.
    pub fn from_node(record: Node<'_, '_>) -> Self {
        let transcript = Transcript::collect(record);

        // the last <Date> in document order closes the conversation
        let finished_at = record
            .descendants()
            .filter(|node| node.has_tag_name("Date"))
            .last();

        let referer = form_field_data(record, "Referer")
            .or_else(|| find(record, &["Header", "QuestionFormField", "Data"]));

        Self {
            record_id: text_of(find(record, &["QuestionId"])).into(),
            category: text_of(form_field_data(record, "Category")).into(),
            initial_inquiry: text_of(find(record, &["Transcript", "PatronQuestion", "Text"])).into(),
            user_transcript: TranscriptCell::from_messages(&transcript.user),
            support_transcript: TranscriptCell::from_messages(&transcript.support),
            started_at: text_of(find(record, &["Transcript", "PatronQuestion", "Date"])).into(),
            finished_at: text_of(finished_at).into(),
            message_count: transcript.message_count,
            referer: text_of(referer).into(),
            wait_time: text_of(find(record, &["Header", "WaitTime"])).into(),
            session_duration: text_of(find(record, &["Header", "SessionTime"])).into(),
            resolution: text_of(find(record, &["Header", "Resolution"])).into(),
        }
    }
}

/// [Speaker] tells who wrote a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    /// [Speaker::Patron] is the user asking the question (`PatronIncident`).
    Patron,

    /// [Speaker::Library] is the support side answering (`LibraryIncident`).
    Library,
}

impl Speaker {
    fn from_node(node: Node<'_, '_>) -> Option<Self> {
        if !node.is_element() {
            return None;
        }
        match node.tag_name().name() {
            "PatronIncident" => Some(Self::Patron),
            "LibraryIncident" => Some(Self::Library),
            _ => None,
        }
    }
}

/// Messages of a `Transcript` split by speaker, in document order.
#[derive(Debug, Default)]
struct Transcript {
    user: Vec<String>,
    support: Vec<String>,
    message_count: MessageCount,
}

impl Transcript {
    fn collect(record: Node<'_, '_>) -> Self {
        let mut transcript = Self::default();
        let Some(container) = find(record, &["Transcript"]) else {
            return transcript;
        };
        for message in container.children() {
            let Some(speaker) = Speaker::from_node(message) else {
                continue;
            };
            let text = text_of(find(message, &["Text"]));
            match speaker {
                Speaker::Patron => transcript.user.push(text),
                Speaker::Library => transcript.support.push(text),
            }
            transcript.message_count.increase_by_one();
        }
        transcript
    }
}

/// Returns the first element matching `path` below `node`. Every candidate
/// is tried at each step, so a later sibling can satisfy the rest of the
/// path when an earlier one does not.
fn find<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    let Some((name, rest)) = path.split_first() else {
        return Some(node);
    };
    node.children()
        .filter(|child| child.is_element() && child.has_tag_name(*name))
        .find_map(|child| find(child, rest))
}

/// Looks up `Header/QuestionFormField[Label=label]/Data`.
fn form_field_data<'a, 'input>(record: Node<'a, 'input>, label: &str) -> Option<Node<'a, 'input>> {
    record
        .children()
        .filter(|node| node.has_tag_name("Header"))
        .flat_map(|header| header.children())
        .filter(|node| node.has_tag_name("QuestionFormField"))
        .filter(|field| {
            field
                .children()
                .any(|node| node.has_tag_name("Label") && inner_text(node) == label)
        })
        .find_map(|field| find(field, &["Data"]))
}

/// Leading text of an element: every text (or CDATA) child up to the first
/// child element, with comments and processing instructions skipped. Empty
/// when the element is missing.
fn text_of(node: Option<Node<'_, '_>>) -> String {
    let Some(node) = node else {
        return String::new();
    };
    node.children()
        .take_while(|child| !child.is_element())
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

/// Concatenation of all text below `node`.
fn inner_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|node| node.is_text())
        .filter_map(|node| node.text())
        .collect()
}
