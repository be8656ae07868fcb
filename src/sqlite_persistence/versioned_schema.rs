use anyhow::{bail, Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use tracing::info;

/// Offset added to every schema version stored in `PRAGMA user_version`,
/// so that databases created by other tools are never mistaken for ours.
pub const BASE_DB_VERSION: usize = 77000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn parse(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            "BLOB" => Some(&SqlType::Blob),
            _ => None,
        }
    }
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<S>,
}

impl<S: AsRef<str>> Column<'_, S> {
    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name.as_ref(), self.sql_type.as_sql());
        if self.is_primary_key {
            sql += " PRIMARY KEY";
        }
        if self.non_null {
            sql += " NOT NULL";
        }
        if let Some(default_value) = &self.default_value {
            sql += " DEFAULT ";
            sql += default_value.as_ref();
        }
        sql
    }

    /// First attribute that differs from `expected`, if any.
    fn mismatch<E: AsRef<str>>(&self, expected: &Column<'_, E>) -> Option<String> {
        let unwrap_default = |value: Option<&str>| {
            value.map(|v| {
                v.strip_prefix('(')
                    .and_then(|v| v.strip_suffix(')'))
                    .unwrap_or(v)
                    .to_string()
            })
        };
        let expected_name = expected.name.as_ref();
        if self.name.as_ref() != expected_name {
            return Some(format!(
                "column name mismatch: expected {}, got {}",
                expected_name,
                self.name.as_ref()
            ));
        }
        let aspects = [
            (
                "type",
                format!("{:?}", expected.sql_type),
                format!("{:?}", self.sql_type),
            ),
            (
                "non-null",
                expected.non_null.to_string(),
                self.non_null.to_string(),
            ),
            (
                "default value",
                format!("{:?}", unwrap_default(expected.default_value.as_ref().map(AsRef::as_ref))),
                format!("{:?}", unwrap_default(self.default_value.as_ref().map(AsRef::as_ref))),
            ),
            (
                "primary key",
                expected.is_primary_key.to_string(),
                self.is_primary_key.to_string(),
            ),
        ];
        aspects
            .into_iter()
            .find(|(_, want, got)| want != got)
            .map(|(aspect, want, got)| {
                format!(
                    "column {} {} mismatch: expected {}, got {}",
                    expected_name, aspect, want, got
                )
            })
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let definitions: Vec<String> = self.columns.iter().map(Column::definition).collect();
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, definitions.join(", ")),
            [],
        )
        .with_context(|| format!("Failed to create table {}", self.name))?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, column_name),
                [],
            )?;
        }
        Ok(())
    }

    fn live_columns(&self, conn: &Connection) -> Result<Vec<Column<'static, String>>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let columns = stmt
            .query_map([], |row| {
                let type_name: String = row.get(2)?;
                let sql_type = SqlType::parse(&type_name)
                    .ok_or(rusqlite::Error::InvalidColumnType(2, type_name, Type::Text))?;
                Ok(Column {
                    name: row.get(1)?,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read columns of table {}", self.name))?;
        Ok(columns)
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let live = self.live_columns(conn)?;
        if live.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found column names: {}, expected: {}",
                self.name,
                live.len(),
                self.columns.len(),
                live.iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        if let Some(problem) = live
            .iter()
            .zip(self.columns)
            .find_map(|(actual, expected)| actual.mismatch(expected))
        {
            bail!("Table {} {}", self.name, problem);
        }

        for (index_name, _) in self.indices {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |row| row.get(0),
                )
                .optional()?;
            if found.is_none() {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        set_user_version(conn, self.version)
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

fn set_user_version(conn: &Connection, version: usize) -> Result<()> {
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + version),
        [],
    )?;
    Ok(())
}

/// Reads the schema version recorded in the database, relative to [`BASE_DB_VERSION`].
pub fn read_schema_version(conn: &Connection) -> Result<i64> {
    let raw = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
        .context("Failed to read database version")?;
    Ok(raw - BASE_DB_VERSION as i64)
}

/// Validates an existing database against its recorded schema version and
/// runs every pending migration up to the latest entry of `schemas`.
pub fn validate_and_migrate(conn: &Connection, schemas: &[VersionedSchema]) -> Result<usize> {
    let db_version = read_schema_version(conn)?;
    if db_version < 0 {
        bail!(
            "Database version {} is too old, does not contain base db version {}",
            db_version,
            BASE_DB_VERSION
        );
    }
    if db_version >= schemas.len() as i64 {
        bail!("Database version {} is too new", db_version);
    }
    let version = db_version as usize;
    schemas
        .get(version)
        .context("Failed to get schema")?
        .validate(conn)?;

    let mut latest_from = version;
    for schema in schemas.iter().skip(version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating db from version {} to {}",
                latest_from, schema.version
            );
            migration_fn(conn)?;
        }
        latest_from = schema.version;
    }
    set_user_version(conn, latest_from)?;
    Ok(latest_from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKETCH_TABLE_V_0: Table = Table {
        name: "sketch",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("path", &SqlType::Text, non_null = true),
        ],
        indices: &[("idx_sketch_path", "path")],
    };

    const SKETCH_TABLE_V_1: Table = Table {
        name: "sketch",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("path", &SqlType::Text, non_null = true),
            sqlite_column!("score", &SqlType::Real, default_value = Some("0.0")),
        ],
        indices: &[("idx_sketch_path", "path")],
    };

    const SCHEMAS: &[VersionedSchema] = &[
        VersionedSchema {
            version: 0,
            tables: &[SKETCH_TABLE_V_0],
            migration: None,
        },
        VersionedSchema {
            version: 1,
            tables: &[SKETCH_TABLE_V_1],
            migration: Some(|conn: &Connection| {
                conn.execute("ALTER TABLE sketch ADD COLUMN score REAL DEFAULT 0.0", [])?;
                Ok(())
            }),
        },
    ];

    #[test]
    fn created_schema_validates() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS[1].create(&conn).unwrap();

        SCHEMAS[1].validate(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE sketch (id INTEGER PRIMARY KEY, path TEXT NOT NULL)",
            [],
        )
        .unwrap();

        let err = SCHEMAS[0].validate(&conn).unwrap_err().to_string();
        assert!(err.contains("missing index"));
        assert!(err.contains("idx_sketch_path"));
    }

    #[test]
    fn validate_detects_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE sketch (id INTEGER PRIMARY KEY, path INTEGER NOT NULL)",
            [],
        )
        .unwrap();

        let err = SCHEMAS[0].validate(&conn).unwrap_err().to_string();
        assert!(err.contains("type mismatch"));
    }

    #[test]
    fn validate_detects_extra_column() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS[1].create(&conn).unwrap();

        let err = SCHEMAS[0].validate(&conn).unwrap_err().to_string();
        assert!(err.contains("has 3 columns, expected 2"));
    }

    #[test]
    fn migrates_old_database_forward() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS[0].create(&conn).unwrap();
        conn.execute("INSERT INTO sketch (path) VALUES ('a.png')", [])
            .unwrap();

        let version = validate_and_migrate(&conn, SCHEMAS).unwrap();

        assert_eq!(version, 1);
        assert_eq!(read_schema_version(&conn).unwrap(), 1);
        SCHEMAS[1].validate(&conn).unwrap();
        let score: f64 = conn
            .query_row("SELECT score FROM sketch WHERE path = 'a.png'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn rejects_too_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        SCHEMAS[1].create(&conn).unwrap();
        set_user_version(&conn, 7).unwrap();

        let err = validate_and_migrate(&conn, SCHEMAS)
            .unwrap_err()
            .to_string();
        assert!(err.contains("too new"));
    }

    #[test]
    fn rejects_foreign_database() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE other (id INTEGER)", []).unwrap();

        let err = validate_and_migrate(&conn, SCHEMAS)
            .unwrap_err()
            .to_string();
        assert!(err.contains("too old"));
    }
}
