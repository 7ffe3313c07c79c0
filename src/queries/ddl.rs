use sea_query::{ColumnDef, SqliteQueryBuilder, Table};

use crate::schema::{MeditationAudio, MeditationHaptic, Meditations};

/// CREATE TABLE IF NOT EXISTS meditations (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     meditation_id TEXT NOT NULL UNIQUE,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL,
///     script TEXT NOT NULL,
///     duration_ms INTEGER NOT NULL,
///     timeline TEXT NOT NULL,
///     status TEXT NOT NULL,
///     error_message TEXT NOT NULL,
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// )
pub fn create_meditations_table() -> String {
    Table::create()
        .table(Meditations::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Meditations::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(
            ColumnDef::new(Meditations::MeditationId)
                .string()
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Meditations::Title).string().not_null())
        .col(ColumnDef::new(Meditations::Description).string().not_null())
        .col(ColumnDef::new(Meditations::Script).string().not_null())
        .col(
            ColumnDef::new(Meditations::DurationMs)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Meditations::Timeline).string().not_null())
        .col(ColumnDef::new(Meditations::Status).string().not_null())
        .col(
            ColumnDef::new(Meditations::ErrorMessage)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(Meditations::CreatedAt).string().not_null())
        .col(ColumnDef::new(Meditations::UpdatedAt).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS meditation_audio (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     audio_key TEXT NOT NULL UNIQUE,
///     file TEXT NOT NULL,
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// )
pub fn create_meditation_audio_table() -> String {
    Table::create()
        .table(MeditationAudio::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(MeditationAudio::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(
            ColumnDef::new(MeditationAudio::AudioKey)
                .string()
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(MeditationAudio::File).string().not_null())
        .col(
            ColumnDef::new(MeditationAudio::CreatedAt)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(MeditationAudio::UpdatedAt)
                .string()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS meditation_haptic (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     haptic_key TEXT NOT NULL UNIQUE,
///     file TEXT NOT NULL,
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// )
pub fn create_meditation_haptic_table() -> String {
    Table::create()
        .table(MeditationHaptic::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(MeditationHaptic::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(
            ColumnDef::new(MeditationHaptic::HapticKey)
                .string()
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(MeditationHaptic::File).string().not_null())
        .col(
            ColumnDef::new(MeditationHaptic::CreatedAt)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(MeditationHaptic::UpdatedAt)
                .string()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}
