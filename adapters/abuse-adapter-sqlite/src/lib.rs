//! SQLite-backed abuse adapter.
//!
//! One pool serves both traits: `captcha_state` holds the per-device risk
//! rows, `comments` is the append-only comment log the rate windows are
//! counted from. All timestamps are stored as unix epoch seconds.

use std::{fmt::Debug, path::Path};

use async_trait::async_trait;
use sqlx::{
	sqlite::{self, SqlitePool, SqliteRow},
	Row,
};

use gatepost::{
	abuse_adapter::AbuseAdapter,
	comment_adapter::{CommentAdapter, CreateComment},
	prelude::*,
	types::CaptchaState,
};

// Helper functions
//******************

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> GpResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

fn opt_ts(row: &SqliteRow, idx: &str) -> Result<Option<Timestamp>, sqlx::Error> {
	Ok(row.try_get::<Option<i64>, _>(idx)?.map(Timestamp))
}

#[derive(Debug)]
pub struct AbuseAdapterSqlite {
	db: SqlitePool,
}

impl AbuseAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> GpResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl AbuseAdapter for AbuseAdapterSqlite {
	async fn read_captcha_state(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
	) -> GpResult<Option<CaptchaState>> {
		let res = sqlx::query(
			"SELECT trigger_count, verified_until, blocked_until FROM captcha_state
			WHERE identity_hash = ?1 AND device_id = ?2",
		)
		.bind(identity_hash.as_str())
		.bind(device_id)
		.fetch_one(&self.db)
		.await;

		match map_res(res, |row| {
			Ok(CaptchaState {
				trigger_count: row.try_get::<i64, _>("trigger_count")? as u32,
				verified_until: opt_ts(&row, "verified_until")?,
				blocked_until: opt_ts(&row, "blocked_until")?,
			})
		}) {
			Ok(state) => Ok(Some(state)),
			Err(Error::NotFound) => Ok(None),
			Err(err) => Err(err),
		}
	}

	async fn register_failure(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
	) -> GpResult<u32> {
		// Single statement, so two racing failures both land.
		let res = sqlx::query(
			"INSERT INTO captcha_state (identity_hash, device_id, trigger_count)
			VALUES (?1, ?2, 1)
			ON CONFLICT (identity_hash, device_id)
			DO UPDATE SET trigger_count = trigger_count + 1
			RETURNING trigger_count",
		)
		.bind(identity_hash.as_str())
		.bind(device_id)
		.fetch_one(&self.db)
		.await;

		map_res(res, |row| Ok(row.try_get::<i64, _>("trigger_count")? as u32))
	}

	async fn set_blocked_until(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
		expected_count: u32,
		blocked_until: Timestamp,
	) -> GpResult<()> {
		// Guarded by the observed count; a miss means a racing request
		// escalated further and its block stands.
		sqlx::query(
			"UPDATE captcha_state SET blocked_until = ?4
			WHERE identity_hash = ?1 AND device_id = ?2 AND trigger_count = ?3",
		)
		.bind(identity_hash.as_str())
		.bind(device_id)
		.bind(i64::from(expected_count))
		.bind(blocked_until.0)
		.execute(&self.db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

		Ok(())
	}

	async fn mark_verified(
		&self,
		identity_hash: &IdentityHash,
		device_id: &str,
		verified_until: Timestamp,
	) -> GpResult<()> {
		sqlx::query(
			"INSERT INTO captcha_state (identity_hash, device_id, trigger_count, verified_until)
			VALUES (?1, ?2, 0, ?3)
			ON CONFLICT (identity_hash, device_id)
			DO UPDATE SET trigger_count = 0, verified_until = ?3, blocked_until = NULL",
		)
		.bind(identity_hash.as_str())
		.bind(device_id)
		.bind(verified_until.0)
		.execute(&self.db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

		Ok(())
	}
}

#[async_trait]
impl CommentAdapter for AbuseAdapterSqlite {
	async fn count_since(&self, identity_hash: &IdentityHash, since: Timestamp) -> GpResult<u32> {
		let res = sqlx::query(
			"SELECT COUNT(*) AS cnt FROM comments
			WHERE identity_hash = ?1 AND created_at >= ?2",
		)
		.bind(identity_hash.as_str())
		.bind(since.0)
		.fetch_one(&self.db)
		.await;

		map_res(res, |row| Ok(row.try_get::<i64, _>("cnt")? as u32))
	}

	async fn create_comment(&self, data: &CreateComment<'_>) -> GpResult<i64> {
		let res = sqlx::query(
			"INSERT INTO comments (identity_hash, device_id, post_id, author, content, created_at)
			VALUES (?1, ?2, ?3, ?4, ?5, ?6)
			RETURNING comment_id",
		)
		.bind(data.identity_hash.as_str())
		.bind(data.device_id)
		.bind(data.post_id)
		.bind(data.author)
		.bind(data.content)
		.bind(data.created_at.0)
		.fetch_one(&self.db)
		.await;

		map_res(res, |row| row.try_get::<i64, _>("comment_id"))
	}
}

async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS captcha_state (
		identity_hash text NOT NULL,
		device_id text NOT NULL,
		trigger_count integer NOT NULL DEFAULT 0,
		verified_until integer,
		blocked_until integer,
		PRIMARY KEY(identity_hash, device_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS comments (
		comment_id integer NOT NULL,
		identity_hash text NOT NULL,
		device_id text NOT NULL,
		post_id text NOT NULL,
		author text,
		content text NOT NULL,
		created_at integer NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(comment_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_comments_hash_created ON comments(identity_hash, created_at)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
