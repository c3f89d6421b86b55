use super::{OfficeDirectory, PersistenceResult};
use crate::office::{OfficeCalendarConfig, OfficeId};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

/// Offices stored as one JSON document per row.
pub struct SqliteOfficeDirectory {
    connection: Mutex<Connection>,
}

impl SqliteOfficeDirectory {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS offices (
                office_id TEXT PRIMARY KEY,
                calendar_year INTEGER NOT NULL,
                config_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl OfficeDirectory for SqliteOfficeDirectory {
    fn get(&self, office_id: &OfficeId) -> PersistenceResult<Option<OfficeCalendarConfig>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT config_json FROM offices WHERE office_id = ?1")?;
        let json: Option<String> = stmt
            .query_row(params![office_id.as_str()], |row| row.get(0))
            .optional()?;

        let Some(json) = json else {
            return Ok(None);
        };
        let office: OfficeCalendarConfig = serde_json::from_str(&json)?;
        super::validate_office(&office)?;
        Ok(Some(office))
    }

    fn put(&self, office: &OfficeCalendarConfig) -> PersistenceResult<()> {
        super::validate_office(office)?;
        let json = serde_json::to_string(office)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO offices (office_id, calendar_year, config_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(office_id) DO UPDATE SET
                calendar_year = excluded.calendar_year,
                config_json = excluded.config_json",
            params![office.office_id.as_str(), office.calendar.year, json],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_ids(&self) -> PersistenceResult<Vec<OfficeId>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT office_id FROM offices ORDER BY office_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for id in rows {
            ids.push(OfficeId::from(id?));
        }
        Ok(ids)
    }
}
