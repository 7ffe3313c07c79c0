use sea_query::Iden;

/// Meditations table - one row per generation/playback unit
#[derive(Iden)]
pub enum Meditations {
    Table,
    Id,
    MeditationId,
    Title,
    Description,
    Script,
    DurationMs,
    Timeline,
    Status,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

/// Meditation audio assets table - category-scoped binary file records
#[derive(Iden)]
pub enum MeditationAudio {
    Table,
    Id,
    AudioKey,
    File,
    CreatedAt,
    UpdatedAt,
}

/// Meditation haptic (AHAP) assets table
#[derive(Iden)]
pub enum MeditationHaptic {
    Table,
    Id,
    HapticKey,
    File,
    CreatedAt,
    UpdatedAt,
}
