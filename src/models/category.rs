//! Category model
//!
//! Oil categories form a tree through `parent_id`. Paths are rendered root
//! first, e.g. `Crude-Medium`.

use std::collections::HashSet;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Separator between category names in a rendered path
pub const PATH_SEPARATOR: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            parent_id: row.get("parent_id")?,
        })
    }

    pub fn create(conn: &Connection, name: &str, parent_id: Option<i64>) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
            params![name, parent_id],
        )?;
        Ok(Self {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            parent_id,
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM categories WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set the parent of a category
    pub fn set_parent(conn: &Connection, id: i64, parent_id: Option<i64>) -> DbResult<()> {
        conn.execute(
            "UPDATE categories SET parent_id = ?1 WHERE id = ?2",
            params![parent_id, id],
        )?;
        Ok(())
    }

    fn find_child(conn: &Connection, name: &str, parent_id: Option<i64>) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM categories WHERE name = ?1 AND parent_id IS ?2")?;

        let result = stmt.query_row(params![name, parent_id], Self::from_row);
        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a path like `Crude-Medium`, creating missing nodes; returns the leaf
    pub fn get_or_create_path(conn: &Connection, path: &str) -> DbResult<Self> {
        let mut parent: Option<Self> = None;

        for name in path.split(PATH_SEPARATOR).map(str::trim).filter(|n| !n.is_empty()) {
            let parent_id = parent.as_ref().map(|p| p.id);
            let node = match Self::find_child(conn, name, parent_id)? {
                Some(existing) => existing,
                None => Self::create(conn, name, parent_id)?,
            };
            parent = Some(node);
        }

        parent.ok_or_else(|| {
            DbError::Sqlite(rusqlite::Error::InvalidParameterName(format!(
                "Empty category path: '{}'",
                path
            )))
        })
    }

    /// The category and its ancestors, root first
    ///
    /// Fails with [`DbError::CategoryCycle`] when the parent chain revisits a
    /// category.
    pub fn ancestors(conn: &Connection, id: i64) -> DbResult<Vec<Self>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if !visited.insert(current) {
                return Err(DbError::CategoryCycle(current));
            }

            let Some(category) = Self::get_by_id(conn, current)? else {
                break;
            };
            next = category.parent_id;
            chain.push(category);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Rendered path of a category, root first
    pub fn path(conn: &Connection, id: i64) -> DbResult<String> {
        let names: Vec<String> = Self::ancestors(conn, id)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        Ok(names.join(PATH_SEPARATOR))
    }

    /// Rendered paths of every category linked to an imported record
    pub fn paths_for_imported(conn: &Connection, imported_record_id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT category_id FROM imported_record_categories
             WHERE imported_record_id = ?1 ORDER BY category_id",
        )?;
        let ids = stmt
            .query_map([imported_record_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        ids.into_iter().map(|id| Self::path(conn, id)).collect()
    }
}
