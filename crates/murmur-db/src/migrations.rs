use rusqlite::Connection;
use tracing::info;

use crate::StorageError;

/// Create the relay's tables. Conversations, participants and users are
/// written by other systems; the relay only inserts messages and receipts.
pub fn run(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS User (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            lastName    TEXT NOT NULL DEFAULT '',
            avatar      TEXT
        );

        CREATE TABLE IF NOT EXISTS Conversation (
            id          TEXT PRIMARY KEY,
            status      INTEGER NOT NULL DEFAULT 1,
            createdAt   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updatedAt   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS ConversationParticipant (
            conversationId  TEXT NOT NULL REFERENCES Conversation(id),
            userId          TEXT NOT NULL,
            status          INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (conversationId, userId)
        );

        CREATE INDEX IF NOT EXISTS idx_participant_user
            ON ConversationParticipant(userId);

        CREATE TABLE IF NOT EXISTS Message (
            id              TEXT PRIMARY KEY,
            conversationId  TEXT NOT NULL REFERENCES Conversation(id),
            senderId        TEXT NOT NULL,
            content         TEXT NOT NULL,
            messageType     TEXT NOT NULL DEFAULT 'text',
            attachmentUrl   TEXT,
            createdAt       TEXT NOT NULL,
            updatedAt       TEXT NOT NULL,
            status          INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_message_conversation
            ON Message(conversationId, createdAt);

        CREATE TABLE IF NOT EXISTS MessageStatus (
            id          TEXT PRIMARY KEY,
            messageId   TEXT NOT NULL REFERENCES Message(id),
            userId      TEXT NOT NULL,
            isRead      INTEGER NOT NULL DEFAULT 0,
            readAt      TEXT,
            createdAt   TEXT NOT NULL,
            updatedAt   TEXT NOT NULL,
            UNIQUE(messageId, userId)
        );

        CREATE INDEX IF NOT EXISTS idx_message_status_message
            ON MessageStatus(messageId);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('User', 'Conversation', 'ConversationParticipant', 'Message', 'MessageStatus')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }
}
