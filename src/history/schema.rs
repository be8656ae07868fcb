use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};
use rusqlite::Connection;

/// V 0
const HISTORY_TABLE_V_0: Table = Table {
    name: "history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("timestamp", &SqlType::Integer, non_null = true),
        sqlite_column!("mood_pred", &SqlType::Text, non_null = true),
        sqlite_column!("confidence", &SqlType::Real, non_null = true),
        sqlite_column!("track_path", &SqlType::Text, non_null = true),
        sqlite_column!("image_path", &SqlType::Text, non_null = true),
        sqlite_column!("rating", &SqlType::Integer),
    ],
    indices: &[("idx_history_timestamp", "timestamp")],
};

/// V 1: user corrections of the predicted mood
const HISTORY_TABLE_V_1: Table = Table {
    name: "history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("timestamp", &SqlType::Integer, non_null = true),
        sqlite_column!("mood_pred", &SqlType::Text, non_null = true),
        sqlite_column!("confidence", &SqlType::Real, non_null = true),
        sqlite_column!("track_path", &SqlType::Text, non_null = true),
        sqlite_column!("image_path", &SqlType::Text, non_null = true),
        sqlite_column!("rating", &SqlType::Integer),
        sqlite_column!("relabel", &SqlType::Text),
    ],
    indices: &[("idx_history_timestamp", "timestamp")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[HISTORY_TABLE_V_0],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[HISTORY_TABLE_V_1],
        migration: Some(|conn: &Connection| {
            conn.execute("ALTER TABLE history ADD COLUMN relabel TEXT", [])?;
            Ok(())
        }),
    },
];
