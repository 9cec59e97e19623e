use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::organization::Organization;

/// Path segments are fixed-width base-36, so lexicographic order on `path`
/// is tree order and a prefix match is an ancestry test.
const STEPLEN: usize = 4;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_SEGMENT: u64 = 36u64.pow(STEPLEN as u32) - 1;

fn encode_segment(value: u64) -> AppResult<String> {
    if value == 0 || value > MAX_SEGMENT {
        return Err(AppError::internal(format!("path segment out of range: {value}")));
    }
    let mut chars = [b'0'; STEPLEN];
    let mut rest = value;
    for slot in chars.iter_mut().rev() {
        *slot = ALPHABET[(rest % 36) as usize];
        rest /= 36;
    }
    Ok(String::from_utf8_lossy(&chars).into_owned())
}

fn decode_segment(segment: &str) -> AppResult<u64> {
    let mut value = 0u64;
    for byte in segment.bytes() {
        let digit = ALPHABET
            .iter()
            .position(|c| *c == byte)
            .ok_or_else(|| AppError::internal(format!("invalid path segment: {segment}")))?;
        value = value * 36 + digit as u64;
    }
    Ok(value)
}

/// Strict ancestor paths of `path`, shortest (root) first.
fn ancestor_paths(path: &str) -> Vec<String> {
    (1..path.len() / STEPLEN)
        .map(|segments| path[..segments * STEPLEN].to_string())
        .collect()
}

/// The segment following `max_sibling_path`'s last segment, or the first
/// segment when there is no sibling yet.
fn next_child_segment(max_sibling_path: Option<&str>) -> AppResult<String> {
    match max_sibling_path {
        Some(path) if path.len() >= STEPLEN => {
            let last = &path[path.len() - STEPLEN..];
            encode_segment(decode_segment(last)? + 1)
        }
        _ => encode_segment(1),
    }
}

/// Materialized-path operations over the `organizations` table.
///
/// Reads need no coordination; structural writes share one async mutex so a
/// concurrent `add_child`/`move_to`/`rebuild` can never interleave and
/// corrupt paths for every other component.
#[derive(Clone)]
pub struct OrgTree {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl OrgTree {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, title, parent_id, path, depth, numchild, created FROM organizations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    pub async fn require(&self, id: Uuid) -> AppResult<Organization> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found("organization not found"))
    }

    /// Root-to-parent chain, excluding `org` itself.
    pub async fn ancestors(&self, org: &Organization) -> AppResult<Vec<Organization>> {
        let paths = ancestor_paths(&org.path);
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = std::iter::repeat("?")
            .take(paths.len())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT id, title, parent_id, path, depth, numchild, created \
             FROM organizations WHERE path IN ({}) ORDER BY depth ASC",
            placeholders
        );

        let mut query = sqlx::query_as::<_, Organization>(&sql);
        for path in &paths {
            query = query.bind(path);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Every node below `org`, excluding `org` itself, in path order.
    pub async fn descendants(&self, org: &Organization) -> AppResult<Vec<Organization>> {
        let rows = sqlx::query_as::<_, Organization>(
            "SELECT id, title, parent_id, path, depth, numchild, created \
             FROM organizations WHERE path LIKE ? AND id != ? ORDER BY path ASC",
        )
        .bind(format!("{}%", org.path))
        .bind(org.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn parent(&self, org: &Organization) -> AppResult<Option<Organization>> {
        match org.parent_id {
            Some(parent_id) => self.get(parent_id).await,
            None => Ok(None),
        }
    }

    pub async fn children(&self, org: &Organization) -> AppResult<Vec<Organization>> {
        let rows = sqlx::query_as::<_, Organization>(
            "SELECT id, title, parent_id, path, depth, numchild, created \
             FROM organizations WHERE parent_id = ? ORDER BY path ASC",
        )
        .bind(org.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn add_root(&self, title: &str) -> AppResult<Organization> {
        let _guard = self.write_lock.lock().await;

        let max_path = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(path) FROM organizations WHERE depth = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        let path = next_child_segment(max_path.as_deref())?;

        let org = Organization {
            id: Uuid::new_v4(),
            title: title.to_string(),
            parent_id: None,
            path,
            depth: 1,
            numchild: 0,
            created: Utc::now(),
        };
        self.insert(&org).await?;
        Ok(org)
    }

    pub async fn add_child(&self, parent_id: Uuid, title: &str) -> AppResult<Organization> {
        let _guard = self.write_lock.lock().await;
        let parent = self.require(parent_id).await?;

        let max_path = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(path) FROM organizations WHERE path LIKE ? AND depth = ?",
        )
        .bind(format!("{}%", parent.path))
        .bind(parent.depth + 1)
        .fetch_one(&self.pool)
        .await?;
        let segment = next_child_segment(max_path.as_deref())?;

        let org = Organization {
            id: Uuid::new_v4(),
            title: title.to_string(),
            parent_id: Some(parent.id),
            path: format!("{}{}", parent.path, segment),
            depth: parent.depth + 1,
            numchild: 0,
            created: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO organizations (id, title, parent_id, path, depth, numchild, created) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(org.id)
        .bind(&org.title)
        .bind(org.parent_id)
        .bind(&org.path)
        .bind(org.depth)
        .bind(org.numchild)
        .bind(org.created)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE organizations SET numchild = numchild + 1 WHERE id = ?")
            .bind(parent.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(org)
    }

    /// Re-attach `org` (and its whole subtree) under `new_parent`, or as a
    /// root when `new_parent` is `None`.
    pub async fn move_to(&self, org_id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<Organization> {
        let _guard = self.write_lock.lock().await;
        let org = self.require(org_id).await?;

        let (new_path, new_depth, new_parent) = match new_parent_id {
            Some(parent_id) => {
                if parent_id == org.id {
                    return Err(AppError::bad_request("cannot move an organization under itself"));
                }
                let parent = self.require(parent_id).await?;
                if parent.path.starts_with(&org.path) {
                    return Err(AppError::bad_request(
                        "cannot move an organization under its own descendant",
                    ));
                }
                let max_path = sqlx::query_scalar::<_, Option<String>>(
                    "SELECT MAX(path) FROM organizations WHERE path LIKE ? AND depth = ? AND path NOT LIKE ?",
                )
                .bind(format!("{}%", parent.path))
                .bind(parent.depth + 1)
                .bind(format!("{}%", org.path))
                .fetch_one(&self.pool)
                .await?;
                let segment = next_child_segment(max_path.as_deref())?;
                (format!("{}{}", parent.path, segment), parent.depth + 1, Some(parent))
            }
            None => {
                let max_path = sqlx::query_scalar::<_, Option<String>>(
                    "SELECT MAX(path) FROM organizations WHERE depth = 1 AND path NOT LIKE ?",
                )
                .bind(format!("{}%", org.path))
                .fetch_one(&self.pool)
                .await?;
                (next_child_segment(max_path.as_deref())?, 1, None)
            }
        };

        let depth_delta = new_depth - org.depth;
        let mut tx = self.pool.begin().await?;

        // Rewrite the subtree: swap the old prefix for the new one and shift
        // depths; substr is 1-indexed, so this keeps each node's tail intact.
        sqlx::query(
            "UPDATE organizations SET path = ? || substr(path, ?), depth = depth + ? WHERE path LIKE ?",
        )
        .bind(&new_path)
        .bind(org.path.len() as i64 + 1)
        .bind(depth_delta)
        .bind(format!("{}%", org.path))
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE organizations SET parent_id = ? WHERE id = ?")
            .bind(new_parent.as_ref().map(|p| p.id))
            .bind(org.id)
            .execute(&mut *tx)
            .await?;

        if let Some(old_parent_id) = org.parent_id {
            sqlx::query("UPDATE organizations SET numchild = numchild - 1 WHERE id = ?")
                .bind(old_parent_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(parent) = &new_parent {
            sqlx::query("UPDATE organizations SET numchild = numchild + 1 WHERE id = ?")
                .bind(parent.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.require(org.id).await
    }

    /// Recompute `path`, `depth` and `numchild` for every row from the parent
    /// pointers. Idempotent; required after any bulk write that did not go
    /// through `add_root`/`add_child`.
    pub async fn rebuild(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let rows = sqlx::query_as::<_, RebuildRow>(
            "SELECT id, parent_id, path, depth, numchild, created FROM organizations",
        )
        .fetch_all(&self.pool)
        .await?;

        let known: HashMap<Uuid, &RebuildRow> = rows.iter().map(|row| (row.id, row)).collect();
        let mut children: HashMap<Option<Uuid>, Vec<&RebuildRow>> = HashMap::new();
        for row in &rows {
            // A dangling parent pointer re-roots the subtree rather than
            // losing it.
            let key = match row.parent_id {
                Some(parent) if known.contains_key(&parent) => Some(parent),
                Some(parent) => {
                    tracing::warn!(org_id = %row.id, parent_id = %parent, "dangling parent pointer, treating as root");
                    None
                }
                None => None,
            };
            children.entry(key).or_default().push(row);
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|row| (row.created, row.id));
        }

        // Depth-first assignment; sibling order is (created, id).
        let mut computed: Vec<(Uuid, String, i64, i64)> = Vec::with_capacity(rows.len());
        let mut stack: Vec<(Uuid, String, i64)> = Vec::new();
        if let Some(roots) = children.get(&None) {
            for (index, root) in roots.iter().enumerate().rev() {
                stack.push((root.id, encode_segment(index as u64 + 1)?, 1));
            }
        }
        while let Some((id, path, depth)) = stack.pop() {
            let kids = children.get(&Some(id)).map(Vec::as_slice).unwrap_or(&[]);
            computed.push((id, path.clone(), depth, kids.len() as i64));
            for (index, kid) in kids.iter().enumerate().rev() {
                let segment = encode_segment(index as u64 + 1)?;
                stack.push((kid.id, format!("{path}{segment}"), depth + 1));
            }
        }

        let mut tx = self.pool.begin().await?;
        for (id, path, depth, numchild) in computed {
            let current = known.get(&id);
            let unchanged = current.is_some_and(|row| {
                row.path == path && row.depth == depth && row.numchild == numchild
            });
            if unchanged {
                continue;
            }
            sqlx::query("UPDATE organizations SET path = ?, depth = ?, numchild = ? WHERE id = ?")
                .bind(&path)
                .bind(depth)
                .bind(numchild)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn insert(&self, org: &Organization) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, title, parent_id, path, depth, numchild, created) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(org.id)
        .bind(&org.title)
        .bind(org.parent_id)
        .bind(&org.path)
        .bind(org.depth)
        .bind(org.numchild)
        .bind(org.created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RebuildRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    path: String,
    depth: i64,
    numchild: i64,
    created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_round_trip() {
        assert_eq!(encode_segment(1).unwrap(), "0001");
        assert_eq!(encode_segment(36).unwrap(), "0010");
        assert_eq!(decode_segment("0001").unwrap(), 1);
        assert_eq!(decode_segment("000Z").unwrap(), 35);
        assert_eq!(decode_segment(&encode_segment(1234).unwrap()).unwrap(), 1234);
    }

    #[test]
    fn segment_zero_and_overflow_are_rejected() {
        assert!(encode_segment(0).is_err());
        assert!(encode_segment(MAX_SEGMENT + 1).is_err());
    }

    #[test]
    fn ancestor_paths_are_strict_prefixes() {
        assert!(ancestor_paths("0001").is_empty());
        assert_eq!(ancestor_paths("000100020003"), vec!["0001", "00010002"]);
    }

    #[test]
    fn next_child_segment_increments_the_last_segment() {
        assert_eq!(next_child_segment(None).unwrap(), "0001");
        assert_eq!(next_child_segment(Some("0001")).unwrap(), "0002");
        assert_eq!(next_child_segment(Some("00010009")).unwrap(), "000A");
    }
}
