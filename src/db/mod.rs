mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::host::{AccessControl, CourseModuleViewed, EventSink, RecordStore};
use crate::models::*;

/// Length of the session key embedded in action links.
const SESSKEY_LEN: usize = 10;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "ogte")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("ogte.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Course structure
    // ============================================================

    pub fn create_course(&self, input: CreateCourseInput) -> Result<Course> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO course (fullname, shortname) VALUES (?, ?)",
            (&input.fullname, &input.shortname),
        )?;

        Ok(Course {
            id: conn.last_insert_rowid(),
            fullname: input.fullname,
            shortname: input.shortname,
        })
    }

    pub fn create_course_section(
        &self,
        course: i64,
        section: i64,
        name: Option<String>,
    ) -> Result<CourseSection> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO course_sections (course, section, name) VALUES (?, ?, ?)",
            (course, section, &name),
        )?;

        Ok(CourseSection {
            id: conn.last_insert_rowid(),
            course,
            section,
            name,
        })
    }

    pub fn create_activity(&self, input: CreateActivityInput) -> Result<Activity> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO ogte (course, name, intro, mode, preventry) VALUES (?, ?, ?, ?, ?)",
            (
                input.course,
                &input.name,
                &input.intro,
                input.mode.as_i64(),
                input.preventry,
            ),
        )?;

        Ok(Activity {
            id: conn.last_insert_rowid(),
            course: input.course,
            name: input.name,
            intro: input.intro,
            mode: input.mode,
            preventry: input.preventry,
        })
    }

    pub fn create_course_module(&self, input: CreateCourseModuleInput) -> Result<CourseModule> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO course_modules (course, instance, section) VALUES (?, ?, ?)",
            (input.course, input.instance, input.section),
        )?;

        Ok(CourseModule {
            id: conn.last_insert_rowid(),
            course: input.course,
            instance: input.instance,
            section: input.section,
        })
    }

    // ============================================================
    // List operations
    // ============================================================

    pub fn get_lists_by_module(&self, moduleid: i64) -> Result<Vec<List>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, courseid, moduleid, name, description, status, props
             FROM ogte_lists WHERE moduleid = ? ORDER BY name",
        )?;

        let lists = stmt
            .query_map([moduleid], row_to_list)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lists)
    }

    pub fn get_list(&self, id: i64) -> Result<Option<List>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let list = conn
            .query_row(
                "SELECT id, courseid, moduleid, name, description, status, props
                 FROM ogte_lists WHERE id = ?",
                [id],
                row_to_list,
            )
            .optional()?;
        Ok(list)
    }

    /// Insert a list from validated form data. The form's `id` is ignored.
    pub fn create_list(&self, data: ListFormData) -> Result<List> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO ogte_lists (courseid, moduleid, name, description, status, props)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                data.courseid,
                data.moduleid,
                &data.name,
                &data.description,
                data.status.as_i64(),
                &data.props,
            ),
        )?;

        Ok(List {
            id: conn.last_insert_rowid(),
            courseid: data.courseid,
            moduleid: data.moduleid,
            name: data.name,
            description: data.description,
            status: data.status,
            props: data.props,
        })
    }

    /// Overwrite list `id` with validated form data. Returns `None` if it does not exist.
    pub fn update_list(&self, id: i64, data: ListFormData) -> Result<Option<List>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE ogte_lists SET courseid = ?, moduleid = ?, name = ?, description = ?, status = ?, props = ?
             WHERE id = ?",
            (
                data.courseid,
                data.moduleid,
                &data.name,
                &data.description,
                data.status.as_i64(),
                &data.props,
                id,
            ),
        )?;

        if rows == 0 {
            return Ok(None);
        }

        Ok(Some(List {
            id,
            courseid: data.courseid,
            moduleid: data.moduleid,
            name: data.name,
            description: data.description,
            status: data.status,
            props: data.props,
        }))
    }

    pub fn create_level(&self, listid: i64, input: CreateLevelInput) -> Result<Level> {
        let list = self
            .get_list(listid)?
            .ok_or_else(|| anyhow::anyhow!("List not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO ogte_levels (listid, label) VALUES (?, ?)",
            (listid, &input.label),
        )?;

        Ok(Level {
            id: conn.last_insert_rowid(),
            listid,
            label: input.label,
            listname: list.name,
        })
    }

    // ============================================================
    // Entry operations
    // ============================================================

    pub fn create_entry(&self, input: CreateEntryInput) -> Result<Entry> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();

        conn.execute(
            "INSERT INTO ogte_entries (ogte, userid, listid, levelid, text, timecreated, timemodified)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                input.ogte,
                input.userid,
                input.listid,
                input.levelid,
                &input.text,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Entry {
            id: conn.last_insert_rowid(),
            ogte: input.ogte,
            userid: input.userid,
            listid: input.listid,
            levelid: input.levelid,
            text: input.text,
            timecreated: now,
            timemodified: now,
        })
    }

    // ============================================================
    // Sessions and capabilities
    // ============================================================

    pub fn create_session(&self, userid: i64) -> Result<Session> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let token = Uuid::new_v4().to_string();
        let sesskey: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SESSKEY_LEN)
            .collect();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO sessions (token, userid, sesskey, created_at) VALUES (?, ?, ?, ?)",
            (&token, userid, &sesskey, now.to_rfc3339()),
        )?;

        Ok(Session {
            token,
            userid,
            sesskey,
            created_at: now,
        })
    }

    pub fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let session = conn
            .query_row(
                "SELECT token, userid, sesskey, created_at FROM sessions WHERE token = ?",
                [token],
                |row| {
                    Ok(Session {
                        token: row.get(0)?,
                        userid: row.get(1)?,
                        sesskey: row.get(2)?,
                        created_at: parse_datetime(row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    pub fn grant_capability(&self, userid: i64, cmid: i64, capability: Capability) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO role_capabilities (userid, cmid, capability) VALUES (?, ?, ?)",
            (userid, cmid, capability.as_str()),
        )?;
        Ok(())
    }

    // ============================================================
    // Tracking
    // ============================================================

    pub fn is_module_viewed(&self, cmid: i64, userid: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM course_modules_viewed WHERE cmid = ? AND userid = ?",
            (cmid, userid),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Events logged in the context of course module `cmid`, oldest first.
    pub fn get_events_for_module(&self, cmid: i64) -> Result<Vec<CourseModuleViewed>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT objectid, contextinstanceid, userid, snapshots
             FROM logstore_events WHERE contextinstanceid = ? AND eventname = ? ORDER BY id",
        )?;

        let events = stmt
            .query_map((cmid, CourseModuleViewed::NAME), |row| {
                let snapshots_json: String = row.get(3)?;
                let snapshots = serde_json::from_str(&snapshots_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(CourseModuleViewed {
                    objectid: row.get(0)?,
                    contextinstanceid: row.get(1)?,
                    userid: row.get(2)?,
                    snapshots,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }
}

impl RecordStore for Database {
    fn get_course_module(&self, cmid: i64) -> Result<Option<CourseModule>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let cm = conn
            .query_row(
                "SELECT id, course, instance, section FROM course_modules WHERE id = ?",
                [cmid],
                |row| {
                    Ok(CourseModule {
                        id: row.get(0)?,
                        course: row.get(1)?,
                        instance: row.get(2)?,
                        section: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(cm)
    }

    fn get_course(&self, id: i64) -> Result<Option<Course>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let course = conn
            .query_row(
                "SELECT id, fullname, shortname FROM course WHERE id = ?",
                [id],
                |row| {
                    Ok(Course {
                        id: row.get(0)?,
                        fullname: row.get(1)?,
                        shortname: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(course)
    }

    fn get_course_section(&self, id: i64) -> Result<Option<CourseSection>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let section = conn
            .query_row(
                "SELECT id, course, section, name FROM course_sections WHERE id = ?",
                [id],
                |row| {
                    Ok(CourseSection {
                        id: row.get(0)?,
                        course: row.get(1)?,
                        section: row.get(2)?,
                        name: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(section)
    }

    fn get_activity(&self, id: i64) -> Result<Option<Activity>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let activity = conn
            .query_row(
                "SELECT id, course, name, intro, mode, preventry FROM ogte WHERE id = ?",
                [id],
                |row| {
                    Ok(Activity {
                        id: row.get(0)?,
                        course: row.get(1)?,
                        name: row.get(2)?,
                        intro: row.get(3)?,
                        mode: ActivityMode::from_i64(row.get(4)?),
                        preventry: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(activity)
    }

    fn get_levels_for_list(&self, listid: i64) -> Result<Vec<Level>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT lv.id, lv.listid, lv.label, li.name
             FROM ogte_levels lv JOIN ogte_lists li ON li.id = lv.listid
             WHERE lv.listid = ? ORDER BY lv.id",
        )?;

        let levels = stmt
            .query_map([listid], |row| {
                Ok(Level {
                    id: row.get(0)?,
                    listid: row.get(1)?,
                    label: row.get(2)?,
                    listname: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(levels)
    }

    fn get_user_entries(&self, userid: i64, ogte: i64) -> Result<Vec<Entry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, ogte, userid, listid, levelid, text, timecreated, timemodified
             FROM ogte_entries WHERE userid = ? AND ogte = ? ORDER BY id",
        )?;

        let entries = stmt
            .query_map((userid, ogte), |row| {
                Ok(Entry {
                    id: row.get(0)?,
                    ogte: row.get(1)?,
                    userid: row.get(2)?,
                    listid: row.get(3)?,
                    levelid: row.get(4)?,
                    text: row.get(5)?,
                    timecreated: parse_datetime(row.get::<_, String>(6)?),
                    timemodified: parse_datetime(row.get::<_, String>(7)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

impl AccessControl for Database {
    fn has_capability(&self, userid: i64, capability: Capability, cmid: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM role_capabilities WHERE userid = ? AND cmid = ? AND capability = ?",
            (userid, cmid, capability.as_str()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl EventSink for Database {
    fn set_module_viewed(&self, cmid: i64, userid: i64) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO course_modules_viewed (cmid, userid, timecreated) VALUES (?, ?, ?)",
            (cmid, userid, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    fn trigger(&self, event: &CourseModuleViewed) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO logstore_events (eventname, objectid, contextinstanceid, userid, snapshots, timecreated)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                CourseModuleViewed::NAME,
                event.objectid,
                event.contextinstanceid,
                event.userid,
                serde_json::to_string(&event.snapshots)?,
                Utc::now().to_rfc3339(),
            ),
        )?;
        tracing::debug!(
            objectid = event.objectid,
            cmid = event.contextinstanceid,
            "Logged {}",
            CourseModuleViewed::NAME
        );
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn row_to_list(row: &rusqlite::Row<'_>) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get(0)?,
        courseid: row.get(1)?,
        moduleid: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        status: ListStatus::from_i64(row.get(5)?).unwrap_or_default(),
        props: row.get(6)?,
    })
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
