mod common;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use atvira::orgs::OrgTree;

use common::setup_pool;

#[tokio::test]
async fn roots_and_children_get_sequential_paths() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let tree = OrgTree::new(pool);

    let ministry = tree.add_root("Ministry").await?;
    let agency = tree.add_root("Agency").await?;
    assert_eq!(ministry.path, "0001");
    assert_eq!(ministry.depth, 1);
    assert_eq!(agency.path, "0002");

    let department = tree.add_child(ministry.id, "Department").await?;
    let unit = tree.add_child(ministry.id, "Unit").await?;
    assert_eq!(department.path, "00010001");
    assert_eq!(department.depth, 2);
    assert_eq!(unit.path, "00010002");

    let ministry = tree.require(ministry.id).await?;
    assert_eq!(ministry.numchild, 2);

    let children = tree.children(&ministry).await?;
    let titles: Vec<&str> = children.iter().map(|org| org.title.as_str()).collect();
    assert_eq!(titles, vec!["Department", "Unit"]);

    Ok(())
}

#[tokio::test]
async fn ancestors_and_descendants_follow_path_prefixes() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let tree = OrgTree::new(pool);

    let root = tree.add_root("Root").await?;
    let middle = tree.add_child(root.id, "Middle").await?;
    let leaf = tree.add_child(middle.id, "Leaf").await?;

    let ancestors = tree.ancestors(&leaf).await?;
    let titles: Vec<&str> = ancestors.iter().map(|org| org.title.as_str()).collect();
    assert_eq!(titles, vec!["Root", "Middle"]);

    let descendants = tree.descendants(&root).await?;
    let titles: Vec<&str> = descendants.iter().map(|org| org.title.as_str()).collect();
    assert_eq!(titles, vec!["Middle", "Leaf"]);

    assert!(tree.ancestors(&root).await?.is_empty());
    assert!(tree.descendants(&leaf).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn move_rewrites_the_whole_subtree() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let tree = OrgTree::new(pool);

    let first = tree.add_root("First").await?;
    let second = tree.add_root("Second").await?;
    let branch = tree.add_child(first.id, "Branch").await?;
    let leaf = tree.add_child(branch.id, "Leaf").await?;

    let moved = tree.move_to(branch.id, Some(second.id)).await?;
    assert_eq!(moved.path, "00020001");
    assert_eq!(moved.depth, 2);
    assert_eq!(moved.parent_id, Some(second.id));

    // The leaf keeps its tail segment under the new prefix.
    let leaf = tree.require(leaf.id).await?;
    assert_eq!(leaf.path, "000200010001");
    assert_eq!(leaf.depth, 3);

    let first = tree.require(first.id).await?;
    let second = tree.require(second.id).await?;
    assert_eq!(first.numchild, 0);
    assert_eq!(second.numchild, 1);

    Ok(())
}

#[tokio::test]
async fn move_under_own_subtree_is_rejected() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let tree = OrgTree::new(pool);

    let root = tree.add_root("Root").await?;
    let child = tree.add_child(root.id, "Child").await?;

    assert!(tree.move_to(root.id, Some(root.id)).await.is_err());
    assert!(tree.move_to(root.id, Some(child.id)).await.is_err());

    Ok(())
}

#[tokio::test]
async fn rebuild_recomputes_paths_from_parent_pointers() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let tree = OrgTree::new(pool.clone());

    // Bulk-inserted rows with garbage paths, the way an import leaves them.
    let root_id = Uuid::new_v4();
    let child_a = Uuid::new_v4();
    let child_b = Uuid::new_v4();
    let base = Utc::now();
    for (id, parent, title, offset) in [
        (root_id, None, "Root", 0),
        (child_a, Some(root_id), "Older", 1),
        (child_b, Some(root_id), "Younger", 2),
    ] {
        sqlx::query(
            "INSERT INTO organizations (id, title, parent_id, path, depth, numchild, created) \
             VALUES (?, ?, ?, '', 0, 0, ?)",
        )
        .bind(id)
        .bind(title)
        .bind(parent)
        .bind(base + chrono::Duration::seconds(offset))
        .execute(&pool)
        .await?;
    }

    tree.rebuild().await?;

    let root = tree.require(root_id).await?;
    assert_eq!(root.path, "0001");
    assert_eq!(root.depth, 1);
    assert_eq!(root.numchild, 2);

    // Siblings are ordered by creation time.
    assert_eq!(tree.require(child_a).await?.path, "00010001");
    assert_eq!(tree.require(child_b).await?.path, "00010002");

    // A second run changes nothing.
    tree.rebuild().await?;
    assert_eq!(tree.require(child_a).await?.path, "00010001");

    Ok(())
}
