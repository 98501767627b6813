//! Decoding of result rows into the shared models.

use chrono::{DateTime, SecondsFormat, Utc};
use murmur_types::models::{Conversation, Message, Participant};

use crate::{Row, Rows, StorageError};

/// A history row: the message joined with its read receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub message: Message,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, StorageError>;
}

impl Rows {
    pub fn decode<T: FromRow>(&self) -> Result<Vec<T>, StorageError> {
        self.iter().map(T::from_row).collect()
    }
}

/// Timestamps are stored as RFC 3339 text with millisecond precision, so that
/// lexical order matches chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, StorageError> {
    let raw: String = row.get(column)?;
    parse_timestamp(column, &raw)
}

fn optional_timestamp(row: &Row, column: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
    row.get::<Option<String>>(column)?
        .map(|raw| parse_timestamp(column, &raw))
        .transpose()
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode {
            column: column.to_string(),
            reason: format!("{e} in {raw:?}"),
        })
}

impl FromRow for Conversation {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            id: row.get("id")?,
            status: row.get("status")?,
            updated_at: timestamp(row, "updatedAt")?,
        })
    }
}

impl FromRow for Participant {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            last_name: row.get("lastName")?,
            avatar: row.get("avatar")?,
        })
    }
}

impl FromRow for Message {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            id: row.get("id")?,
            conversation_id: row.get("conversationId")?,
            sender_id: row.get("senderId")?,
            content: row.get("content")?,
            message_type: row.get("messageType")?,
            attachment_url: row.get("attachmentUrl")?,
            created_at: timestamp(row, "createdAt")?,
            updated_at: timestamp(row, "updatedAt")?,
            status: row.get("status")?,
        })
    }
}

impl FromRow for HistoryRow {
    fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            message: Message::from_row(row)?,
            is_read: row.get("isRead")?,
            read_at: optional_timestamp(row, "readAt")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_keep_millisecond_precision() {
        let at = Utc.timestamp_millis_opt(1_792_400_000_123).unwrap();
        let text = format_timestamp(at);
        assert!(text.ends_with(".123Z"), "{}", text);
        assert_eq!(parse_timestamp("createdAt", &text).unwrap(), at);
    }

    #[test]
    fn garbage_timestamp_names_the_column() {
        let err = parse_timestamp("readAt", "yesterday").unwrap_err();
        assert!(matches!(err, StorageError::Decode { ref column, .. } if column == "readAt"));
    }
}
