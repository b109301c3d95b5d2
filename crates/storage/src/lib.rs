use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{
    ChatMessage, ChatMessageId, ChatSender, ConversationId, PartRequest, PartRequestId,
    ShopProfile, ShopProfileId, UserId,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewPartRequest {
    pub mechanic_id: UserId,
    pub vin: Option<String>,
    pub part_description: String,
    pub urgency: Option<String>,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
}

#[derive(Debug, Clone)]
pub struct NewShopProfile {
    pub user_id: UserId,
    pub delivery_options: Option<Vec<String>>,
    pub inventory_specialties: Option<Vec<String>>,
    pub primary_contact_person: String,
    pub shop_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageSummary {
    pub part_requests: i64,
    pub shop_profiles: i64,
    pub chat_messages: i64,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_part_request(&self, request: &NewPartRequest) -> Result<PartRequestId> {
        let id = PartRequestId::new();
        sqlx::query(
            "INSERT INTO part_requests (id, mechanic_id, vin, part_description, urgency, vehicle_make, vehicle_model, vehicle_year, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0)
        .bind(request.mechanic_id.0)
        .bind(request.vin.as_deref())
        .bind(&request.part_description)
        .bind(request.urgency.as_deref())
        .bind(&request.vehicle_make)
        .bind(&request.vehicle_model)
        .bind(request.vehicle_year)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to insert part request")?;
        Ok(id)
    }

    /// Newest first.
    pub async fn list_part_requests_for_mechanic(
        &self,
        mechanic_id: UserId,
    ) -> Result<Vec<PartRequest>> {
        let rows = sqlx::query(
            "SELECT id, vin, created_at, part_description, urgency, vehicle_make, vehicle_model, vehicle_year
             FROM part_requests
             WHERE mechanic_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(mechanic_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PartRequest {
                id: PartRequestId(r.get::<Uuid, _>(0)),
                vin: r.get::<Option<String>, _>(1),
                created_at: r.get::<DateTime<Utc>, _>(2),
                part_description: r.get::<String, _>(3),
                urgency: r.get::<Option<String>, _>(4),
                vehicle_make: r.get::<String, _>(5),
                vehicle_model: r.get::<String, _>(6),
                vehicle_year: r.get::<i32, _>(7),
            })
            .collect())
    }

    pub async fn insert_shop_profile(&self, profile: &NewShopProfile) -> Result<ShopProfileId> {
        let id = ShopProfileId::new();
        sqlx::query(
            "INSERT INTO shop_profiles (id, user_id, delivery_options, inventory_specialties, primary_contact_person, shop_name)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0)
        .bind(profile.user_id.0)
        .bind(encode_list(profile.delivery_options.as_deref())?)
        .bind(encode_list(profile.inventory_specialties.as_deref())?)
        .bind(&profile.primary_contact_person)
        .bind(&profile.shop_name)
        .execute(&self.pool)
        .await
        .context("failed to insert shop profile")?;
        Ok(id)
    }

    /// In insertion order.
    pub async fn list_shop_profiles(&self) -> Result<Vec<ShopProfile>> {
        let rows = sqlx::query(
            "SELECT id, user_id, delivery_options, inventory_specialties, primary_contact_person, shop_name
             FROM shop_profiles
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| shop_profile_from_row(&r)).collect()
    }

    pub async fn append_chat_message(&self, message: &ChatMessage) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, conversation_id, sender, body, sent_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.0)
        .bind(message.conversation_id.0)
        .bind(message.sender.as_str())
        .bind(&message.text)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await
        .context("failed to append chat message")?;
        Ok(())
    }

    pub async fn list_chat_messages(&self, conversation_id: ConversationId) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender, body, sent_at
             FROM chat_messages
             WHERE conversation_id = ?
             ORDER BY sent_at ASC, rowid ASC",
        )
        .bind(conversation_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| chat_message_from_row(&r)).collect()
    }

    pub async fn summary(&self) -> Result<StorageSummary> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM part_requests),
                (SELECT COUNT(*) FROM shop_profiles),
                (SELECT COUNT(*) FROM chat_messages)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StorageSummary {
            part_requests: row.get::<i64, _>(0),
            shop_profiles: row.get::<i64, _>(1),
            chat_messages: row.get::<i64, _>(2),
        })
    }
}

fn shop_profile_from_row(r: &SqliteRow) -> Result<ShopProfile> {
    Ok(ShopProfile {
        id: ShopProfileId(r.get::<Uuid, _>(0)),
        user_id: UserId(r.get::<Uuid, _>(1)),
        delivery_options: decode_list(r.get::<Option<String>, _>(2))
            .context("corrupt delivery_options column")?,
        inventory_specialties: decode_list(r.get::<Option<String>, _>(3))
            .context("corrupt inventory_specialties column")?,
        primary_contact_person: r.get::<String, _>(4),
        shop_name: r.get::<String, _>(5),
    })
}

fn chat_message_from_row(r: &SqliteRow) -> Result<ChatMessage> {
    let sender = match r.get::<String, _>(2).as_str() {
        "user" => ChatSender::User,
        "assistant" => ChatSender::Assistant,
        other => bail!("corrupt sender column: {other:?}"),
    };
    Ok(ChatMessage {
        id: ChatMessageId(r.get::<Uuid, _>(0)),
        conversation_id: ConversationId(r.get::<Uuid, _>(1)),
        sender,
        text: r.get::<String, _>(3),
        sent_at: r.get::<DateTime<Utc>, _>(4),
    })
}

// NULL means absent; `[]` is an explicitly empty list.
fn encode_list(list: Option<&[String]>) -> Result<Option<String>> {
    list.map(serde_json::to_string)
        .transpose()
        .context("failed to encode string list")
}

fn decode_list(raw: Option<String>) -> Result<Option<Vec<String>>> {
    raw.map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(Into::into)
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
