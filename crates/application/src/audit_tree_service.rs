//! Read side of the audit trail: one entry with all of its descendants.

use std::collections::HashMap;
use std::sync::Arc;

use rewind_core::AuditLogId;

use crate::AuditTrailError;
use crate::audit_ports::{AuditLogEntry, AuditLogStore};

/// One audit entry and its nested descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTree {
    /// Entry at this node.
    pub entry: AuditLogEntry,
    /// Direct children in creation order.
    pub children: Vec<AuditTree>,
}

impl AuditTree {
    /// Returns the number of entries in this tree, root included.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(AuditTree::size).sum::<usize>()
    }

    /// Returns the entries in pre-order together with their depth.
    #[must_use]
    pub fn flatten(&self) -> Vec<(usize, &AuditLogEntry)> {
        let mut flattened = Vec::with_capacity(self.size());
        let mut stack = vec![(0_usize, self)];
        while let Some((depth, node)) = stack.pop() {
            flattened.push((depth, &node.entry));
            stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        }
        flattened
    }
}

/// Loads audit subtrees for inspection.
#[derive(Clone)]
pub struct AuditTreeService {
    audit_log_store: Arc<dyn AuditLogStore>,
}

impl AuditTreeService {
    /// Creates a new service.
    #[must_use]
    pub fn new(audit_log_store: Arc<dyn AuditLogStore>) -> Self {
        Self { audit_log_store }
    }

    /// Loads the entry and every descendant.
    pub async fn load_tree(&self, id: &AuditLogId) -> Result<AuditTree, AuditTrailError> {
        let root = self
            .audit_log_store
            .find(id)
            .await?
            .ok_or_else(|| AuditTrailError::AuditEntryNotFound(id.clone()))?;

        let mut children_by_parent: HashMap<AuditLogId, Vec<AuditLogEntry>> = HashMap::new();
        for descendant_id in self.audit_log_store.recursive_child_ids(id).await? {
            let descendant = self
                .audit_log_store
                .find(&descendant_id)
                .await?
                .ok_or(AuditTrailError::AuditEntryNotFound(descendant_id))?;
            if let Some(parent_id) = descendant.parent_id.clone() {
                children_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(descendant);
            }
        }

        Ok(assemble(root, &mut children_by_parent))
    }
}

fn assemble(
    entry: AuditLogEntry,
    children_by_parent: &mut HashMap<AuditLogId, Vec<AuditLogEntry>>,
) -> AuditTree {
    let children = children_by_parent
        .remove(&entry.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, children_by_parent))
        .collect();

    AuditTree { entry, children }
}
