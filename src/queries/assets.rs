use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use crate::schema::{MeditationAudio, MeditationHaptic};

/// INSERT INTO meditation_audio ... ON CONFLICT (audio_key) DO NOTHING
///
/// The conflict clause makes the get-or-create step idempotent: a retried
/// generation run must not fail on the unique key or create a duplicate.
pub fn insert_audio_ignore(audio_key: &str, now: &str) -> String {
    Query::insert()
        .into_table(MeditationAudio::Table)
        .columns([
            MeditationAudio::AudioKey,
            MeditationAudio::File,
            MeditationAudio::CreatedAt,
            MeditationAudio::UpdatedAt,
        ])
        .values_panic([audio_key.into(), "".into(), now.into(), now.into()])
        .on_conflict(
            OnConflict::column(MeditationAudio::AudioKey)
                .do_nothing()
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT id, audio_key, file FROM meditation_audio WHERE audio_key = ?
pub fn select_audio_by_key(audio_key: &str) -> String {
    Query::select()
        .columns([
            MeditationAudio::Id,
            MeditationAudio::AudioKey,
            MeditationAudio::File,
        ])
        .from(MeditationAudio::Table)
        .and_where(Expr::col(MeditationAudio::AudioKey).eq(audio_key))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE meditation_audio SET file = ?, updated_at = ? WHERE id = ?
pub fn update_audio_file(pk: i64, file: &str, now: &str) -> String {
    Query::update()
        .table(MeditationAudio::Table)
        .values([
            (MeditationAudio::File, file.into()),
            (MeditationAudio::UpdatedAt, now.into()),
        ])
        .and_where(Expr::col(MeditationAudio::Id).eq(pk))
        .to_string(SqliteQueryBuilder)
}

/// SELECT id, haptic_key, file FROM meditation_haptic WHERE haptic_key = ?
pub fn select_haptic_by_key(haptic_key: &str) -> String {
    Query::select()
        .columns([
            MeditationHaptic::Id,
            MeditationHaptic::HapticKey,
            MeditationHaptic::File,
        ])
        .from(MeditationHaptic::Table)
        .and_where(Expr::col(MeditationHaptic::HapticKey).eq(haptic_key))
        .to_string(SqliteQueryBuilder)
}
