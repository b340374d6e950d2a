use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Idempotent schema bootstrap, run once at startup. Enum-valued columns are
/// TEXT holding the SCREAMING_SNAKE_CASE variant names the API exposes.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS customers (
        id           TEXT PRIMARY KEY,
        name         TEXT NOT NULL,
        phone        TEXT NOT NULL UNIQUE,
        neighborhood TEXT,
        city         TEXT NOT NULL,
        latitude     REAL,
        longitude    REAL,
        created_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS technicians (
        id    TEXT PRIMARY KEY,
        name  TEXT NOT NULL,
        phone TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS requests (
        id            TEXT PRIMARY KEY,
        customer_id   TEXT NOT NULL REFERENCES customers(id),
        technician_id TEXT REFERENCES technicians(id),
        type          TEXT NOT NULL,
        description   TEXT,
        transcription TEXT,
        audio_url     TEXT,
        photo_url     TEXT,
        status        TEXT NOT NULL DEFAULT 'NEW',
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id           TEXT PRIMARY KEY,
        request_id   TEXT REFERENCES requests(id),
        type         TEXT NOT NULL,
        sender_name  TEXT NOT NULL,
        sender_phone TEXT NOT NULL,
        sender_email TEXT,
        subject      TEXT NOT NULL,
        content      TEXT NOT NULL,
        status       TEXT NOT NULL DEFAULT 'UNREAD',
        priority     TEXT NOT NULL DEFAULT 'NORMAL',
        audio_url    TEXT,
        photo_url    TEXT,
        created_at   TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_messages_status ON messages(status)",
    "CREATE INDEX IF NOT EXISTS idx_requests_customer ON requests(customer_id)",
];

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
