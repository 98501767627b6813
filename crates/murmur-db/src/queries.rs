use murmur_types::models::{Conversation, Message, Participant};

use crate::models::{HistoryRow, format_timestamp};
use crate::{Database, Statement, StorageError};

// Rows are decoded by column name, so every column is aliased
const HISTORY_COLUMNS: &str = "m.id AS id, m.conversationId AS conversationId, m.senderId AS senderId,
     m.content AS content, m.messageType AS messageType, m.attachmentUrl AS attachmentUrl,
     m.createdAt AS createdAt, m.updatedAt AS updatedAt, m.status AS status,
     ms.isRead AS isRead, ms.readAt AS readAt";

impl Database {
    // -- Conversations --

    /// True if the conversation exists, whatever its status.
    pub fn conversation_exists(&self, conversation_id: &str) -> Result<bool, StorageError> {
        let rows = self.execute(
            &Statement::new("SELECT id FROM Conversation WHERE id = ?1")
                .bind(conversation_id.to_string()),
        )?;
        Ok(!rows.is_empty())
    }

    pub fn is_active_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<bool, StorageError> {
        let rows = self.execute(
            &Statement::new(
                "SELECT userId FROM ConversationParticipant
                 WHERE conversationId = ?1 AND userId = ?2 AND status = ?3",
            )
            .bind(conversation_id.to_string())
            .bind(user_id.to_string())
            .bind(true),
        )?;
        Ok(!rows.is_empty())
    }

    /// Active conversations the user actively participates in, most recently updated first.
    pub fn user_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, StorageError> {
        self.execute(
            &Statement::new(
                "SELECT c.id AS id, c.status AS status, c.updatedAt AS updatedAt
                 FROM Conversation c
                 INNER JOIN ConversationParticipant cp ON c.id = cp.conversationId
                 WHERE cp.userId = ?1 AND cp.status = ?2 AND c.status = ?2
                 ORDER BY c.updatedAt DESC, c.id ASC",
            )
            .bind(user_id.to_string())
            .bind(true),
        )?
        .decode()
    }

    pub fn conversation_participants(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Participant>, StorageError> {
        self.execute(
            &Statement::new(
                "SELECT u.id AS id, u.name AS name, u.lastName AS lastName, u.avatar AS avatar
                 FROM ConversationParticipant cp
                 INNER JOIN User u ON cp.userId = u.id
                 WHERE cp.conversationId = ?1 AND cp.status = ?2
                 ORDER BY cp.rowid ASC",
            )
            .bind(conversation_id.to_string())
            .bind(true),
        )?
        .decode()
    }

    // -- Messages --

    /// Persist a message together with the sender's unread receipt. Both rows
    /// share the message timestamp; neither is written if either insert fails.
    pub fn insert_message(&self, message: &Message, status_id: &str) -> Result<(), StorageError> {
        let created_at = format_timestamp(message.created_at);
        let updated_at = format_timestamp(message.updated_at);

        let insert_message = Statement::new(
            "INSERT INTO Message (id, conversationId, senderId, content, messageType, attachmentUrl, createdAt, updatedAt, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(message.id.clone())
        .bind(message.conversation_id.clone())
        .bind(message.sender_id.clone())
        .bind(message.content.clone())
        .bind(message.message_type.clone())
        .bind(message.attachment_url.clone())
        .bind(created_at.clone())
        .bind(updated_at)
        .bind(message.status);

        let insert_status = Statement::new(
            "INSERT INTO MessageStatus (id, messageId, userId, isRead, readAt, createdAt, updatedAt)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
        )
        .bind(status_id.to_string())
        .bind(message.id.clone())
        .bind(message.sender_id.clone())
        .bind(false)
        .bind(created_at);

        self.batch(&[insert_message, insert_status])?;
        Ok(())
    }

    /// Active messages of a conversation joined with their read receipts, oldest first.
    pub fn conversation_messages(
        &self,
        conversation_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HistoryRow>, StorageError> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS}
             FROM Message m
             INNER JOIN MessageStatus ms ON m.id = ms.messageId
             WHERE m.conversationId = ?1 AND m.status = ?2
             ORDER BY m.createdAt ASC, m.rowid ASC
             LIMIT ?3 OFFSET ?4"
        );

        self.execute(
            &Statement::new(sql)
                .bind(conversation_id.to_string())
                .bind(true)
                .bind(limit)
                .bind(offset),
        )?
        .decode()
    }
}
