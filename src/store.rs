//! SQLite-backed message store: single source of truth for chats and
//! messages.
//!
//! Two tables: `chats` keyed by JID with denormalized last-message fields for
//! fast listing, and `messages` keyed by `(id, chat_jid)`. Inserts are
//! idempotent; each write either fully commits (including the denormalization
//! update) or not at all. WAL mode so the MCP loop and the event listener can
//! read concurrently with writes.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{truncate_preview, Chat, MessageContext, MessageRecord};

const PREVIEW_CHARS: usize = 120;

// Limit and page arrive unchecked from tool arguments. SQLite treats a
// negative LIMIT as unbounded, so both values are clamped before the cast
// and the offset multiply saturates instead of overflowing.
fn to_limit(limit: usize) -> i64 {
    limit.min(i64::MAX as usize) as i64
}

fn to_offset(limit: usize, page: usize) -> i64 {
    page.saturating_mul(limit).min(i64::MAX as usize) as i64
}

// ── Schema ───────────────────────────────────────────────────────────────

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS chats (
    jid TEXT PRIMARY KEY,
    name TEXT,
    last_message_time INTEGER,
    last_message TEXT,
    last_sender TEXT,
    last_is_from_me INTEGER
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT NOT NULL,
    chat_jid TEXT NOT NULL,
    sender TEXT,
    content TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    is_from_me INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (id, chat_jid),
    FOREIGN KEY (chat_jid) REFERENCES chats(jid)
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_time ON messages(chat_jid, timestamp);
CREATE INDEX IF NOT EXISTS idx_messages_id ON messages(id);
CREATE INDEX IF NOT EXISTS idx_chats_last_time ON chats(last_message_time);
";

/// Human-readable schema summary, served as the `whatsapp://schema` MCP
/// resource and by the `schema` subcommand.
pub(crate) const SCHEMA_DESCRIPTION: &str = "\
WhatsApp message store (SQLite)

chats
  jid                TEXT PRIMARY KEY  -- canonical address; @s.whatsapp.net = individual, @g.us = group
  name               TEXT              -- last-known display name (nullable)
  last_message_time  INTEGER           -- ms epoch of newest stored message (nullable)
  last_message       TEXT              -- preview of newest message (nullable)
  last_sender        TEXT              -- sender JID of newest message (nullable)
  last_is_from_me    INTEGER           -- 1 if newest message was sent by this account

messages
  id                 TEXT              -- message id, unique per chat
  chat_jid           TEXT              -- owning chat (FK chats.jid)
  sender             TEXT              -- sender JID; NULL = from me in an individual chat
  content            TEXT              -- normalized text; media as [type] placeholder + caption
  timestamp          INTEGER           -- ms epoch
  is_from_me         INTEGER           -- 1 if sent by this account
  PRIMARY KEY (id, chat_jid)
";

// ── Chat sort order ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChatSort {
    LastActive,
    Name,
}

impl ChatSort {
    pub(crate) fn parse(s: &str) -> Result<Self, String> {
        match s {
            "last_active" => Ok(Self::LastActive),
            "name" => Ok(Self::Name),
            other => Err(format!(
                "sort_by must be 'last_active' or 'name', got '{other}'"
            )),
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            // nulls last, newest first
            Self::LastActive => "last_message_time IS NULL, last_message_time DESC, jid ASC",
            Self::Name => "LOWER(COALESCE(NULLIF(name, ''), jid)) ASC, jid ASC",
        }
    }
}

// ── MessageStore ─────────────────────────────────────────────────────────

pub(crate) struct MessageStore {
    conn: Mutex<Connection>,
}

impl MessageStore {
    pub(crate) fn open_or_create(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, String> {
        self.conn.lock().map_err(|_| "store mutex poisoned".to_string())
    }

    // ── Write path ───────────────────────────────────────────────────

    /// Create or update a chat row. The display name is only overwritten by a
    /// non-empty name; `last_message_time` only moves when the caller supplies
    /// one (event data is passed through as-is).
    pub(crate) fn upsert_chat(
        &self,
        jid: &str,
        name: Option<&str>,
        last_message_time: Option<i64>,
    ) -> Result<(), String> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chats (jid, name, last_message_time) VALUES (?1, ?2, ?3)
             ON CONFLICT(jid) DO UPDATE SET
                 name = COALESCE(excluded.name, chats.name),
                 last_message_time = COALESCE(excluded.last_message_time, chats.last_message_time)",
            params![jid, name, last_message_time],
        )
        .map_err(|e| format!("upsert_chat({jid}): {e}"))?;
        Ok(())
    }

    /// Idempotent insert keyed by `(id, chat_jid)`; last-write-wins on
    /// conflicting fields. The owning chat is created implicitly, and its
    /// denormalized last-message fields are refreshed in the same transaction
    /// when this message heads the chat's listing order.
    pub(crate) fn insert_message(&self, msg: &MessageRecord) -> Result<(), String> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| format!("insert_message begin: {e}"))?;

        let result = (|| -> Result<(), String> {
            conn.execute(
                "INSERT INTO chats (jid) VALUES (?1) ON CONFLICT(jid) DO NOTHING",
                params![msg.chat_jid],
            )
            .map_err(|e| format!("ensure chat: {e}"))?;

            conn.execute(
                "INSERT INTO messages (id, chat_jid, sender, content, timestamp, is_from_me)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id, chat_jid) DO UPDATE SET
                     sender = excluded.sender,
                     content = excluded.content,
                     timestamp = excluded.timestamp,
                     is_from_me = excluded.is_from_me",
                params![
                    msg.id,
                    msg.chat_jid,
                    msg.sender,
                    msg.content,
                    msg.timestamp,
                    msg.is_from_me as i64,
                ],
            )
            .map_err(|e| format!("insert message: {e}"))?;

            // Refresh the denormalized fields only when this message heads
            // the chat in the same (timestamp, id) order list_messages uses,
            // so the preview always agrees with the top of the listing.
            let top_id: String = conn
                .query_row(
                    "SELECT id FROM messages WHERE chat_jid = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT 1",
                    params![msg.chat_jid],
                    |row| row.get(0),
                )
                .map_err(|e| format!("find chat top message: {e}"))?;
            if top_id == msg.id {
                conn.execute(
                    "UPDATE chats SET
                         last_message_time = ?2,
                         last_message = ?3,
                         last_sender = ?4,
                         last_is_from_me = ?5
                     WHERE jid = ?1",
                    params![
                        msg.chat_jid,
                        msg.timestamp,
                        truncate_preview(&msg.content, PREVIEW_CHARS),
                        msg.sender,
                        msg.is_from_me as i64,
                    ],
                )
                .map_err(|e| format!("refresh chat denorm: {e}"))?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => conn
                .execute_batch("COMMIT")
                .map_err(|e| format!("insert_message commit: {e}")),
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(format!("insert_message({}, {}): {e}", msg.id, msg.chat_jid))
            }
        }
    }

    // ── Read path ────────────────────────────────────────────────────

    /// Messages for one chat, newest first (page 0 = most recent `limit`),
    /// stable `(timestamp, id)` ordering.
    pub(crate) fn list_messages(
        &self,
        chat_jid: &str,
        limit: usize,
        page: usize,
    ) -> Result<Vec<MessageRecord>, String> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, chat_jid, sender, content, timestamp, is_from_me
                 FROM messages WHERE chat_jid = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| format!("list_messages prepare: {e}"))?;
        let rows = stmt
            .query_map(
                params![chat_jid, to_limit(limit), to_offset(limit, page)],
                Self::row_to_message,
            )
            .map_err(|e| format!("list_messages query: {e}"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("list_messages row: {e}"))
    }

    pub(crate) fn list_chats(
        &self,
        limit: usize,
        page: usize,
        sort: ChatSort,
        filter: Option<&str>,
    ) -> Result<Vec<Chat>, String> {
        let conn = self.lock()?;
        let mut sql = String::from(
            "SELECT jid, name, last_message_time, last_message, last_sender, last_is_from_me
             FROM chats",
        );
        let mut bind: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
            bind.push(Box::new(format!("%{}%", filter.to_lowercase())));
            sql.push_str(
                " WHERE (LOWER(jid) LIKE ?1 OR LOWER(COALESCE(name, '')) LIKE ?1)",
            );
        }
        sql.push_str(&format!(" ORDER BY {}", sort.order_clause()));
        bind.push(Box::new(to_limit(limit)));
        sql.push_str(&format!(" LIMIT ?{}", bind.len()));
        bind.push(Box::new(to_offset(limit, page)));
        sql.push_str(&format!(" OFFSET ?{}", bind.len()));

        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            bind.iter().map(|b| b.as_ref()).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| format!("list_chats prepare: {e}"))?;
        let rows = stmt
            .query_map(bind_refs.as_slice(), Self::row_to_chat)
            .map_err(|e| format!("list_chats query: {e}"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("list_chats row: {e}"))
    }

    pub(crate) fn get_chat(&self, jid: &str) -> Result<Option<Chat>, String> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT jid, name, last_message_time, last_message, last_sender, last_is_from_me
             FROM chats WHERE jid = ?1",
            params![jid],
            Self::row_to_chat,
        );
        match result {
            Ok(chat) => Ok(Some(chat)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(format!("get_chat({jid}): {e}")),
        }
    }

    /// Locate a message by id (first match across chats in deterministic
    /// `(timestamp, chat_jid)` order) and return up to `before` preceding and
    /// `after` following messages from the same chat, chronological.
    pub(crate) fn get_messages_around(
        &self,
        message_id: &str,
        before: usize,
        after: usize,
    ) -> Result<Option<MessageContext>, String> {
        let conn = self.lock()?;
        let target = match conn.query_row(
            "SELECT id, chat_jid, sender, content, timestamp, is_from_me
             FROM messages WHERE id = ?1
             ORDER BY timestamp ASC, chat_jid ASC LIMIT 1",
            params![message_id],
            Self::row_to_message,
        ) {
            Ok(m) => m,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(format!("get_messages_around({message_id}): {e}")),
        };

        let mut preceding = {
            let mut stmt = conn
                .prepare(
                    "SELECT id, chat_jid, sender, content, timestamp, is_from_me
                     FROM messages
                     WHERE chat_jid = ?1
                       AND (timestamp < ?2 OR (timestamp = ?2 AND id < ?3))
                     ORDER BY timestamp DESC, id DESC LIMIT ?4",
                )
                .map_err(|e| format!("context before prepare: {e}"))?;
            let rows = stmt
                .query_map(
                    params![target.chat_jid, target.timestamp, target.id, before as i64],
                    Self::row_to_message,
                )
                .map_err(|e| format!("context before query: {e}"))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("context before row: {e}"))?
        };
        preceding.reverse();

        let following = {
            let mut stmt = conn
                .prepare(
                    "SELECT id, chat_jid, sender, content, timestamp, is_from_me
                     FROM messages
                     WHERE chat_jid = ?1
                       AND (timestamp > ?2 OR (timestamp = ?2 AND id > ?3))
                     ORDER BY timestamp ASC, id ASC LIMIT ?4",
                )
                .map_err(|e| format!("context after prepare: {e}"))?;
            let rows = stmt
                .query_map(
                    params![target.chat_jid, target.timestamp, target.id, after as i64],
                    Self::row_to_message,
                )
                .map_err(|e| format!("context after query: {e}"))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("context after row: {e}"))?
        };

        Ok(Some(MessageContext {
            target,
            before: preceding,
            after: following,
        }))
    }

    /// Case-insensitive substring search on content, optionally scoped to one
    /// chat, paginated like `list_messages`.
    pub(crate) fn search_messages(
        &self,
        query: &str,
        chat_jid: Option<&str>,
        limit: usize,
        page: usize,
    ) -> Result<Vec<MessageRecord>, String> {
        let conn = self.lock()?;
        let pattern = format!("%{}%", query.to_lowercase());
        let mut sql = String::from(
            "SELECT id, chat_jid, sender, content, timestamp, is_from_me
             FROM messages WHERE LOWER(content) LIKE ?1",
        );
        let mut bind: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(pattern)];
        if let Some(chat) = chat_jid {
            bind.push(Box::new(chat.to_string()));
            sql.push_str(&format!(" AND chat_jid = ?{}", bind.len()));
        }
        sql.push_str(" ORDER BY timestamp DESC, id DESC");
        bind.push(Box::new(to_limit(limit)));
        sql.push_str(&format!(" LIMIT ?{}", bind.len()));
        bind.push(Box::new(to_offset(limit, page)));
        sql.push_str(&format!(" OFFSET ?{}", bind.len()));

        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            bind.iter().map(|b| b.as_ref()).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| format!("search_messages prepare: {e}"))?;
        let rows = stmt
            .query_map(bind_refs.as_slice(), Self::row_to_message)
            .map_err(|e| format!("search_messages query: {e}"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("search_messages row: {e}"))
    }

    /// Chats (individual or group) whose name or JID matches the substring,
    /// most recently active first.
    pub(crate) fn search_contacts(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Chat>, String> {
        let conn = self.lock()?;
        let pattern = format!("%{}%", query.to_lowercase());
        let mut stmt = conn
            .prepare(
                "SELECT jid, name, last_message_time, last_message, last_sender, last_is_from_me
                 FROM chats
                 WHERE LOWER(COALESCE(name, '')) LIKE ?1 OR LOWER(jid) LIKE ?1
                 ORDER BY last_message_time IS NULL, last_message_time DESC, jid ASC
                 LIMIT ?2",
            )
            .map_err(|e| format!("search_contacts prepare: {e}"))?;
        let rows = stmt
            .query_map(params![pattern, to_limit(limit)], Self::row_to_chat)
            .map_err(|e| format!("search_contacts query: {e}"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("search_contacts row: {e}"))
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn row_to_message(row: &rusqlite::Row) -> Result<MessageRecord, rusqlite::Error> {
        Ok(MessageRecord {
            id: row.get(0)?,
            chat_jid: row.get(1)?,
            sender: row.get(2)?,
            content: row.get(3)?,
            timestamp: row.get(4)?,
            is_from_me: row.get::<_, i64>(5)? != 0,
        })
    }

    fn row_to_chat(row: &rusqlite::Row) -> Result<Chat, rusqlite::Error> {
        Ok(Chat {
            jid: row.get(0)?,
            name: row.get(1)?,
            last_message_time: row.get(2)?,
            last_message: row.get(3)?,
            last_sender: row.get(4)?,
            last_is_from_me: row.get::<_, Option<i64>>(5)?.map(|v| v != 0),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
