//! Product category taxonomy
//!
//! The ERP hands categories back as a flat list where each record points at
//! its parent. The dashboard wants a nested forest, and products want to know
//! every ancestor of their category so a filter on a parent also matches
//! children.

pub mod tree;

use serde::{Deserialize, Serialize};

pub use tree::{build_category_tree, category_paths};

/// Flat category as read from the ERP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl CategoryRecord {
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }
}

/// Nested category as sent to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Total number of nodes in this subtree, including self
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }
}
