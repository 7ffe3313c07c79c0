use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::schema::Meditations;

const SELECT_COLUMNS: [Meditations; 11] = [
    Meditations::Id,
    Meditations::MeditationId,
    Meditations::Title,
    Meditations::Description,
    Meditations::Script,
    Meditations::DurationMs,
    Meditations::Timeline,
    Meditations::Status,
    Meditations::ErrorMessage,
    Meditations::CreatedAt,
    Meditations::UpdatedAt,
];

/// INSERT a fresh pending meditation with empty script/timeline
pub fn insert_pending(meditation_id: &str, title: &str, description: &str, now: &str) -> String {
    Query::insert()
        .into_table(Meditations::Table)
        .columns([
            Meditations::MeditationId,
            Meditations::Title,
            Meditations::Description,
            Meditations::Script,
            Meditations::DurationMs,
            Meditations::Timeline,
            Meditations::Status,
            Meditations::ErrorMessage,
            Meditations::CreatedAt,
            Meditations::UpdatedAt,
        ])
        .values_panic([
            meditation_id.into(),
            title.into(),
            description.into(),
            "".into(),
            0i64.into(),
            "[]".into(),
            "pending".into(),
            "".into(),
            now.into(),
            now.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT all meditations ordered by title, then meditation_id
pub fn select_all() -> String {
    Query::select()
        .columns(SELECT_COLUMNS)
        .from(Meditations::Table)
        .order_by(Meditations::Title, Order::Asc)
        .order_by(Meditations::MeditationId, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT one meditation by its public slug
pub fn select_by_meditation_id(meditation_id: &str) -> String {
    Query::select()
        .columns(SELECT_COLUMNS)
        .from(Meditations::Table)
        .and_where(Expr::col(Meditations::MeditationId).eq(meditation_id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT one meditation by its internal scheduling id
pub fn select_by_pk(pk: i64) -> String {
    Query::select()
        .columns(SELECT_COLUMNS)
        .from(Meditations::Table)
        .and_where(Expr::col(Meditations::Id).eq(pk))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE status and error message in one statement (used for the
/// processing and failed transitions)
pub fn update_status(pk: i64, status: &str, error_message: &str, now: &str) -> String {
    Query::update()
        .table(Meditations::Table)
        .values([
            (Meditations::Status, status.into()),
            (Meditations::ErrorMessage, error_message.into()),
            (Meditations::UpdatedAt, now.into()),
        ])
        .and_where(Expr::col(Meditations::Id).eq(pk))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE all generated fields atomically and mark the meditation ready
pub fn finalize_ready(
    pk: i64,
    script: &str,
    duration_ms: i64,
    timeline_json: &str,
    now: &str,
) -> String {
    Query::update()
        .table(Meditations::Table)
        .values([
            (Meditations::Script, script.into()),
            (Meditations::DurationMs, duration_ms.into()),
            (Meditations::Timeline, timeline_json.into()),
            (Meditations::Status, "ready".into()),
            (Meditations::ErrorMessage, "".into()),
            (Meditations::UpdatedAt, now.into()),
        ])
        .and_where(Expr::col(Meditations::Id).eq(pk))
        .to_string(SqliteQueryBuilder)
}
