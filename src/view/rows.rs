//! Turning stored entries into rows for the view page.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Entry, Level};
use crate::url::PageUrl;

/// Levels by list id, then by level id.
pub type LevelLookup = HashMap<i64, HashMap<i64, Level>>;

/// What a link to the entry editor asks it to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    Edit,
    Download,
    ConfirmDelete,
}

impl EntryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Download => "download",
            Self::ConfirmDelete => "confirmdelete",
        }
    }
}

/// Builds entry editor links for one activity and session.
#[derive(Debug, Clone, Copy)]
pub struct EntryLinks<'a> {
    pub wwwroot: &'a str,
    pub cmid: i64,
    pub sesskey: &'a str,
}

impl EntryLinks<'_> {
    pub fn url(&self, entryid: i64, action: EntryAction) -> PageUrl {
        PageUrl::module_page(self.wwwroot, "edit.php")
            .param("id", self.cmid)
            .param("entryid", entryid)
            .param("sesskey", self.sesskey)
            .param("action", action.as_str())
    }
}

/// An entry as the view page template sees it.
#[derive(Debug, Clone, Serialize)]
pub struct EntryRow {
    #[serde(flatten)]
    pub entry: Entry,
    /// 1-based position in the order the store returned the entries.
    pub index: usize,
    /// "listname - label", or empty when the level cannot be found.
    pub listinfo: String,
    pub editurl: PageUrl,
    pub downloadurl: PageUrl,
    pub deleteurl: PageUrl,
}

/// Group levels by list and level id.
pub fn level_lookup(levels: impl IntoIterator<Item = Level>) -> LevelLookup {
    let mut lookup: LevelLookup = HashMap::new();
    for level in levels {
        lookup
            .entry(level.listid)
            .or_default()
            .insert(level.id, level);
    }
    lookup
}

pub fn listinfo(levels: &LevelLookup, entry: &Entry) -> String {
    levels
        .get(&entry.listid)
        .and_then(|list| list.get(&entry.levelid))
        .map(Level::display_label)
        .unwrap_or_default()
}

/// Number the entries and attach their display label and action links.
/// The input order is kept as is.
pub fn build_entry_rows(
    entries: Vec<Entry>,
    levels: &LevelLookup,
    links: &EntryLinks<'_>,
) -> Vec<EntryRow> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| EntryRow {
            index: i + 1,
            listinfo: listinfo(levels, &entry),
            editurl: links.url(entry.id, EntryAction::Edit),
            downloadurl: links.url(entry.id, EntryAction::Download),
            deleteurl: links.url(entry.id, EntryAction::ConfirmDelete),
            entry,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: i64, listid: i64, levelid: i64) -> Entry {
        Entry {
            id,
            ogte: 1,
            userid: 2,
            listid,
            levelid,
            text: format!("entry {}", id),
            timecreated: Utc::now(),
            timemodified: Utc::now(),
        }
    }

    fn level(id: i64, listid: i64, listname: &str, label: &str) -> Level {
        Level {
            id,
            listid,
            label: label.to_string(),
            listname: listname.to_string(),
        }
    }

    const LINKS: EntryLinks<'static> = EntryLinks {
        wwwroot: "http://example.com",
        cmid: 5,
        sesskey: "abc123",
    };

    #[test]
    fn indexes_follow_input_order() {
        let lookup = LevelLookup::new();
        let rows = build_entry_rows(vec![entry(30, 1, 1), entry(10, 1, 1), entry(20, 1, 1)], &lookup, &LINKS);

        let ids: Vec<i64> = rows.iter().map(|r| r.entry.id).collect();
        let indexes: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(indexes, vec![1, 2, 3]);
    }

    #[test]
    fn listinfo_joins_list_name_and_label() {
        let lookup = level_lookup(vec![level(7, 1, "NGSL", "Level 2"), level(8, 2, "AWL", "Band A")]);
        let rows = build_entry_rows(vec![entry(1, 1, 7), entry(2, 2, 8)], &lookup, &LINKS);

        assert_eq!(rows[0].listinfo, "NGSL - Level 2");
        assert_eq!(rows[1].listinfo, "AWL - Band A");
    }

    #[test]
    fn unresolved_levels_give_an_empty_label() {
        // Level 7 exists, but in a different list than the entry claims.
        let lookup = level_lookup(vec![level(7, 1, "NGSL", "Level 2")]);
        let rows = build_entry_rows(vec![entry(1, 2, 7), entry(2, 1, 99)], &lookup, &LINKS);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].listinfo, "");
        assert_eq!(rows[1].listinfo, "");
    }

    #[test]
    fn action_links_point_at_the_entry_editor() {
        let rows = build_entry_rows(vec![entry(42, 1, 1)], &LevelLookup::new(), &LINKS);
        let row = &rows[0];

        assert_eq!(
            row.editurl.to_string(),
            "http://example.com/mod/ogte/edit.php?id=5&entryid=42&sesskey=abc123&action=edit"
        );
        assert_eq!(row.downloadurl.get_param("action"), Some("download"));
        assert_eq!(row.deleteurl.get_param("action"), Some("confirmdelete"));
    }

    #[test]
    fn rows_serialize_flat() {
        let rows = build_entry_rows(vec![entry(3, 1, 1)], &LevelLookup::new(), &LINKS);
        let value = serde_json::to_value(&rows[0]).unwrap();

        assert_eq!(value["id"], 3);
        assert_eq!(value["index"], 1);
        assert_eq!(value["text"], "entry 3");
        assert!(value["editurl"].as_str().unwrap().contains("action=edit"));
    }
}
