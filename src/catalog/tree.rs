//! Parent-pointer to forest conversion
//!
//! Placement rules:
//! - a record whose parent is present in the input nests under that parent
//! - a record with no parent, or whose parent is missing from the input, is a root
//! - siblings keep their input order
//! - when an id repeats, the last record with that id wins and earlier copies are dropped
//!
//! Cycles are not broken. Records on a parent cycle are never reachable from a
//! root and therefore do not appear in the output.

use std::collections::{HashMap, HashSet};

use super::{CategoryNode, CategoryRecord};

/// Build the category forest from flat records.
pub fn build_category_tree(records: &[CategoryRecord]) -> Vec<CategoryNode> {
    let mut slots: HashMap<i64, usize> = HashMap::with_capacity(records.len());
    for (pos, record) in records.iter().enumerate() {
        slots.insert(record.id, pos);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();

    for (pos, record) in records.iter().enumerate() {
        if slots.get(&record.id) != Some(&pos) {
            continue;
        }

        match record.parent_id.and_then(|parent| slots.get(&parent)) {
            Some(&parent_pos) => children[parent_pos].push(pos),
            None => roots.push(pos),
        }
    }

    roots
        .into_iter()
        .map(|pos| materialize(records, &children, pos))
        .collect()
}

fn materialize(records: &[CategoryRecord], children: &[Vec<usize>], pos: usize) -> CategoryNode {
    let record = &records[pos];

    CategoryNode {
        id: record.id,
        name: record.name.clone(),
        children: children[pos]
            .iter()
            .map(|&child| materialize(records, children, child))
            .collect(),
    }
}

/// Ancestor chain for every category, outermost ancestor first and the
/// category itself last.
///
/// The walk stops at a parent missing from the input or at the first id
/// already on the chain, so cyclic data still yields a finite path.
pub fn category_paths(records: &[CategoryRecord]) -> HashMap<i64, Vec<i64>> {
    let parents: HashMap<i64, Option<i64>> = records
        .iter()
        .map(|record| (record.id, record.parent_id))
        .collect();

    parents
        .keys()
        .map(|&id| {
            let mut path = vec![id];
            let mut seen = HashSet::from([id]);
            let mut current = parents.get(&id).copied().flatten();

            while let Some(parent) = current {
                if !parents.contains_key(&parent) || !seen.insert(parent) {
                    break;
                }
                path.push(parent);
                current = parents.get(&parent).copied().flatten();
            }

            path.reverse();
            (id, path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, name: &str, parent: Option<i64>) -> CategoryRecord {
        CategoryRecord::new(id, name, parent)
    }

    fn leaf(id: i64, name: &str) -> CategoryNode {
        CategoryNode {
            id,
            name: name.to_string(),
            children: vec![],
        }
    }

    #[test]
    fn test_orphan_promoted_to_root() {
        let records = vec![
            rec(1, "A", None),
            rec(2, "B", Some(1)),
            rec(3, "C", Some(99)),
        ];

        let forest = build_category_tree(&records);

        assert_eq!(
            forest,
            vec![
                CategoryNode {
                    id: 1,
                    name: "A".to_string(),
                    children: vec![leaf(2, "B")],
                },
                leaf(3, "C"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(build_category_tree(&[]).is_empty());
    }

    #[test]
    fn test_child_before_parent_in_input() {
        let records = vec![rec(2, "B", Some(1)), rec(1, "A", None)];

        let forest = build_category_tree(&records);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, 1);
        assert_eq!(forest[0].children, vec![leaf(2, "B")]);
    }

    #[test]
    fn test_mutual_cycle_is_omitted() {
        let records = vec![rec(1, "A", Some(2)), rec(2, "B", Some(1))];
        assert!(build_category_tree(&records).is_empty());
    }

    #[test]
    fn test_self_parent_is_omitted() {
        let records = vec![rec(1, "Root", None), rec(5, "Loop", Some(5))];

        let forest = build_category_tree(&records);

        assert_eq!(forest, vec![leaf(1, "Root")]);
    }

    #[test]
    fn test_duplicate_id_last_wins() {
        let records = vec![
            rec(1, "Root", None),
            rec(2, "Old", None),
            rec(2, "New", Some(1)),
        ];

        let forest = build_category_tree(&records);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children, vec![leaf(2, "New")]);
        assert_eq!(forest[0].size(), 2);
    }

    #[test]
    fn test_paths_follow_ancestors() {
        let records = vec![
            rec(1, "All", None),
            rec(2, "Furniture", Some(1)),
            rec(3, "Chairs", Some(2)),
            rec(4, "Stray", Some(42)),
        ];

        let paths = category_paths(&records);

        assert_eq!(paths[&1], vec![1]);
        assert_eq!(paths[&3], vec![1, 2, 3]);
        assert_eq!(paths[&4], vec![4]);
    }

    #[test]
    fn test_paths_terminate_on_cycle() {
        let records = vec![rec(1, "A", Some(2)), rec(2, "B", Some(1))];

        let paths = category_paths(&records);

        assert_eq!(paths[&1], vec![2, 1]);
        assert_eq!(paths[&2], vec![1, 2]);
    }
}
