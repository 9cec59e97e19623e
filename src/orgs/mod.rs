//! Organization hierarchy.
//!
//! Organizations form a materialized-path tree: each row stores its parent
//! pointer plus derived `path` / `depth` / `numchild` columns. All structural
//! writes go through [`OrgTree`], which serializes them behind a single lock;
//! bulk imports that bypass it must call [`OrgTree::rebuild`] before the next
//! structural read.

mod tree;

pub use tree::OrgTree;
