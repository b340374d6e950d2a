use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::message::{
    CreateMessage, Message, MessagePriority, MessageQuery, MessageStats, MessageStatus, Pagination,
};
use crate::services::requests;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Persist a new message. Priority defaults to NORMAL, status starts UNREAD.
/// The stored row is read back with its request detail (customer and
/// technician embedded) when one is linked.
pub async fn create_message(pool: &SqlitePool, input: CreateMessage) -> Result<Message, StoreError> {
    let id = Uuid::new_v4().to_string();
    let priority = input.priority.unwrap_or(MessagePriority::Normal);

    sqlx::query(
        "INSERT INTO messages \
         (id, request_id, type, sender_name, sender_phone, sender_email, subject, content, \
          status, priority, audio_url, photo_url, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.request_id)
    .bind(input.kind)
    .bind(&input.sender_name)
    .bind(&input.sender_phone)
    .bind(&input.sender_email)
    .bind(&input.subject)
    .bind(&input.content)
    .bind(MessageStatus::Unread)
    .bind(priority)
    .bind(&input.audio_url)
    .bind(&input.photo_url)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    info!("Message created: {id}");
    get_message(pool, &id).await
}

pub async fn get_message(pool: &SqlitePool, id: &str) -> Result<Message, StoreError> {
    let message: Option<Message> = sqlx::query_as("SELECT * FROM messages WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let mut message = message.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    attach_request_details(pool, std::slice::from_mut(&mut message)).await?;
    Ok(message)
}

/// Paginated, filtered, searched inbox listing, newest first.
///
/// Filters are conjunctive; the search term is a case-insensitive substring
/// match OR-ed over sender name, sender phone, subject and content.
pub async fn get_messages(
    pool: &SqlitePool,
    query: &MessageQuery,
) -> Result<(Vec<Message>, Pagination), StoreError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);
    let offset = (page as i64 - 1) * limit as i64;

    let pattern = query
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(like_pattern);

    let mut count_qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM messages WHERE 1=1");
    push_filters(&mut count_qb, query, &pattern);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM messages WHERE 1=1");
    push_filters(&mut qb, query, &pattern);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit as i64)
        .push(" OFFSET ")
        .push_bind(offset);
    let mut messages: Vec<Message> = qb.build_query_as().fetch_all(pool).await?;

    attach_request_details(pool, &mut messages).await?;

    let total = total.max(0) as u64;
    let pagination = Pagination {
        page,
        limit,
        total,
        pages: total.div_ceil(limit as u64),
    };
    Ok((messages, pagination))
}

/// Unconditional single-record status write. Any status may overwrite any
/// other; only an unknown id is an error.
pub async fn update_message_status(
    pool: &SqlitePool,
    id: &str,
    status: MessageStatus,
) -> Result<Message, StoreError> {
    let result = sqlx::query("UPDATE messages SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    get_message(pool, id).await
}

pub async fn mark_as_read(pool: &SqlitePool, id: &str) -> Result<Message, StoreError> {
    update_message_status(pool, id, MessageStatus::Read).await
}

pub async fn archive_message(pool: &SqlitePool, id: &str) -> Result<Message, StoreError> {
    update_message_status(pool, id, MessageStatus::Archived).await
}

pub async fn delete_message(pool: &SqlitePool, id: &str) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    info!("Message deleted: {id}");
    Ok(())
}

/// One bulk write for the whole id set. Ids not present in the store are
/// silently skipped; the affected-row count is returned.
pub async fn update_multiple_status(
    pool: &SqlitePool,
    ids: &[String],
    status: MessageStatus,
) -> Result<u64, StoreError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE messages SET status = ");
    qb.push_bind(status);
    qb.push(" WHERE id IN (");
    {
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id.as_str());
        }
    }
    qb.push(")");
    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn mark_multiple_as_read(pool: &SqlitePool, ids: &[String]) -> Result<u64, StoreError> {
    update_multiple_status(pool, ids, MessageStatus::Read).await
}

pub async fn archive_multiple(pool: &SqlitePool, ids: &[String]) -> Result<u64, StoreError> {
    update_multiple_status(pool, ids, MessageStatus::Archived).await
}

/// Dashboard counts: total, one count per status, and groupings by type and
/// priority. The queries run concurrently with no transaction around them,
/// so counts may skew if messages change mid-computation.
pub async fn get_message_stats(pool: &SqlitePool) -> Result<MessageStats, StoreError> {
    let (total, unread, read, archived, in_progress, completed, urgent, by_type, by_priority) =
        tokio::try_join!(
            count_all(pool),
            count_by_status(pool, MessageStatus::Unread),
            count_by_status(pool, MessageStatus::Read),
            count_by_status(pool, MessageStatus::Archived),
            count_by_status(pool, MessageStatus::InProgress),
            count_by_status(pool, MessageStatus::Completed),
            count_by_status(pool, MessageStatus::Urgent),
            group_counts(pool, "type"),
            group_counts(pool, "priority"),
        )?;

    Ok(MessageStats {
        total,
        unread,
        read,
        archived,
        in_progress,
        completed,
        urgent,
        by_type,
        by_priority,
    })
}

/* --------------------------- internals --------------------------- */

async fn count_all(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await
}

async fn count_by_status(pool: &SqlitePool, status: MessageStatus) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await
}

async fn group_counts(
    pool: &SqlitePool,
    column: &str,
) -> Result<std::collections::HashMap<String, i64>, sqlx::Error> {
    // `column` is only ever a literal from get_message_stats.
    let rows: Vec<(String, i64)> =
        sqlx::query_as(&format!("SELECT {column}, COUNT(*) FROM messages GROUP BY {column}"))
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Substring LIKE pattern with `%`, `_` and `\` escaped so a literal search
/// term cannot act as a wildcard.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters<'a>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    query: &'a MessageQuery,
    pattern: &'a Option<String>,
) {
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(kind) = query.kind {
        qb.push(" AND type = ").push_bind(kind);
    }
    if let Some(priority) = query.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(pattern) = pattern {
        qb.push(" AND (sender_name LIKE ")
            .push_bind(pattern.as_str())
            .push(" ESCAPE '\\' OR sender_phone LIKE ")
            .push_bind(pattern.as_str())
            .push(" ESCAPE '\\' OR subject LIKE ")
            .push_bind(pattern.as_str())
            .push(" ESCAPE '\\' OR content LIKE ")
            .push_bind(pattern.as_str())
            .push(" ESCAPE '\\')");
    }
}

async fn attach_request_details(
    pool: &SqlitePool,
    messages: &mut [Message],
) -> Result<(), StoreError> {
    let ids: Vec<String> = messages
        .iter()
        .filter_map(|m| m.request_id.clone())
        .collect();
    if ids.is_empty() {
        return Ok(());
    }
    let details = requests::get_request_details_by_ids(pool, &ids).await?;
    for message in messages.iter_mut() {
        if let Some(request_id) = &message.request_id {
            message.request = details.get(request_id).cloned();
        }
    }
    Ok(())
}
