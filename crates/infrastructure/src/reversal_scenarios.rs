//! End-to-end reversals over the in-memory directory.

use rewind_application::{
    AssignmentSubject, AuditLogEntry, EntityUseCases, RevertActionsService,
};
use rewind_core::AuditLogId;
use rewind_domain::{AuditAction, AuditLogTarget, EntityType, Label, Privilege, User};

use crate::InMemoryDirectory;

fn service(directory: &InMemoryDirectory) -> RevertActionsService {
    directory
        .revert_actions_service()
        .unwrap_or_else(|_| unreachable!())
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn user(id: &str, username: &str) -> User {
    User::new(id, username).unwrap_or_else(|_| unreachable!())
}

fn privilege(id: &str) -> Privilege {
    Privilege::new(id, format!("privilege {id}")).unwrap_or_else(|_| unreachable!())
}

async fn entries_after(directory: &InMemoryDirectory, count: usize) -> Vec<AuditLogEntry> {
    directory
        .audit_log_store
        .entries()
        .await
        .into_iter()
        .skip(count)
        .collect()
}

#[tokio::test]
async fn reverting_role_assignment_unassigns_exactly_those_roles() {
    let directory = InMemoryDirectory::new();
    let subject = AssignmentSubject::new(EntityType::User, "123");
    let assigned = directory
        .user_roles
        .assign_with_audit(std::slice::from_ref(&subject), &ids(&["101", "102"]), None)
        .await;
    let Ok(Some(assignment_id)) = assigned else {
        panic!("expected an assignment entry");
    };

    let result = service(&directory).revert(&[assignment_id], None).await;

    assert!(result.is_ok());
    assert!(directory.user_roles.related(&subject).await.is_empty());
    let compensation = entries_after(&directory, 1).await;
    assert_eq!(compensation.len(), 1);
    assert_eq!(compensation[0].action, AuditAction::UnassignRoles);
    assert_eq!(
        compensation[0].backward_data.as_deref(),
        Some(r#"["101","102"]"#)
    );
}

#[tokio::test]
async fn reverting_assignment_keeps_roles_held_beforehand() {
    let directory = InMemoryDirectory::new();
    let subject = AssignmentSubject::new(EntityType::User, "123");
    assert!(
        directory
            .user_roles
            .assign_with_audit(std::slice::from_ref(&subject), &ids(&["101"]), None)
            .await
            .is_ok()
    );
    let assigned = directory
        .user_roles
        .assign_with_audit(std::slice::from_ref(&subject), &ids(&["101", "102"]), None)
        .await;
    let Ok(Some(assignment_id)) = assigned else {
        panic!("expected an assignment entry");
    };
    let entry = entries_after(&directory, 1).await.remove(0);
    assert_eq!(entry.id, assignment_id);
    assert_eq!(entry.backward_data.as_deref(), Some(r#"["102"]"#));

    let result = service(&directory).revert(&[assignment_id], None).await;

    assert!(result.is_ok());
    assert_eq!(directory.user_roles.related(&subject).await, ids(&["101"]));
    let compensation = entries_after(&directory, 2).await;
    assert_eq!(compensation.len(), 1);
    assert_eq!(compensation[0].action, AuditAction::UnassignRoles);
    assert_eq!(compensation[0].backward_data.as_deref(), Some(r#"["102"]"#));
}

#[tokio::test]
async fn restore_after_remove_reproduces_snapshot_once() {
    let directory = InMemoryDirectory::new();
    let original = user("123", "bob").with_email("bob@example.com");
    assert!(directory.users.create(original.clone(), None).await.is_ok());
    let removed = directory
        .users
        .remove_with_audit(&ids(&["123"]), None)
        .await;
    let Ok(Some(removal_id)) = removed else {
        panic!("expected a removal entry");
    };
    assert_eq!(directory.users.get("123").await, None);

    let service = service(&directory);
    assert!(service.revert(std::slice::from_ref(&removal_id), None).await.is_ok());
    assert_eq!(directory.users.get("123").await, Some(original));
    let after_first = directory.audit_log_store.entries().await.len();
    assert_eq!(after_first, 3);

    assert!(service.revert(&[removal_id], None).await.is_ok());
    assert_eq!(directory.audit_log_store.entries().await.len(), after_first);
}

#[tokio::test]
async fn reverting_update_restores_previous_version() {
    let directory = InMemoryDirectory::new();
    let original = user("123", "bob");
    assert!(directory.users.create(original.clone(), None).await.is_ok());

    let updated = directory
        .users
        .update(user("123", "robert").with_email("robert@example.com"), None)
        .await;
    assert!(updated.is_ok());
    let update_id = directory.audit_log_store.entries().await[1].id.clone();

    let parent = directory
        .users
        .create(user("999", "auditor"), None)
        .await
        .unwrap_or_else(|_| unreachable!());
    let result = service(&directory).revert(&[update_id], Some(parent.clone())).await;

    assert!(result.is_ok());
    assert_eq!(directory.users.get("123").await, Some(original));
    let compensation = entries_after(&directory, 3).await;
    assert_eq!(compensation.len(), 1);
    assert_eq!(compensation[0].action, AuditAction::Update);
    assert_eq!(compensation[0].parent_id, Some(parent));
}

#[tokio::test]
async fn reverting_create_removes_entity_without_new_entries() {
    let directory = InMemoryDirectory::new();
    let label = Label::new("l-1", "urgent").unwrap_or_else(|_| unreachable!());
    let created = directory.labels.create(label, None).await;
    let Ok(create_id) = created else {
        panic!("expected a create entry");
    };

    let result = service(&directory).revert(&[create_id], None).await;

    assert!(result.is_ok());
    assert_eq!(directory.labels.get("l-1").await, None);
    assert_eq!(directory.audit_log_store.entries().await.len(), 1);
}

#[tokio::test]
async fn reverting_batch_removal_rebuilds_mirrored_tree() {
    let directory = InMemoryDirectory::new();
    for id in ["p-1", "p-2", "p-3"] {
        assert!(directory.privileges.create(privilege(id), None).await.is_ok());
    }
    let removed = directory
        .privileges
        .remove_with_audit(&ids(&["p-1", "p-2", "p-3"]), None)
        .await;
    let Ok(Some(marker_id)) = removed else {
        panic!("expected a batch marker");
    };

    let result = service(&directory).revert(&[marker_id], None).await;

    assert!(result.is_ok());
    assert_eq!(
        directory.privileges.list().await,
        vec![privilege("p-1"), privilege("p-2"), privilege("p-3")]
    );

    let revert_marker = entries_after(&directory, 7).await.remove(0);
    assert_eq!(revert_marker.action, AuditAction::RevertBatchRemove);
    assert_eq!(revert_marker.parent_id, None);

    let tree = directory
        .audit_tree_service()
        .load_tree(&revert_marker.id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(tree.children.len(), 3);
    assert!(tree.children.iter().all(|child| {
        child.entry.action == AuditAction::Restore && child.children.is_empty()
    }));
    let restored: Vec<_> = tree
        .children
        .iter()
        .filter_map(|child| child.entry.target.entity_id())
        .collect();
    assert_eq!(restored, vec!["p-1", "p-2", "p-3"]);
}

#[tokio::test]
async fn reverting_label_batch_unlabels_every_subject() {
    let directory = InMemoryDirectory::new();
    let subjects = [
        AssignmentSubject::new(EntityType::User, "u-1"),
        AssignmentSubject::new(EntityType::Role, "r-1"),
    ];
    let labelled = directory
        .entity_labels
        .assign_with_audit(&subjects, &ids(&["l-1", "l-2"]), None)
        .await;
    let Ok(Some(marker_id)) = labelled else {
        panic!("expected a batch marker");
    };

    let result = service(&directory).revert(&[marker_id], None).await;

    assert!(result.is_ok());
    for subject in &subjects {
        assert!(directory.entity_labels.related(subject).await.is_empty());
    }
    let compensation = entries_after(&directory, 3).await;
    assert_eq!(compensation.len(), 3);
    assert_eq!(compensation[0].target, AuditLogTarget::batch(None));
    assert_eq!(compensation[0].action, AuditAction::RevertBatchAssignLabels);
}

#[tokio::test]
async fn reverting_several_entries_nests_everything_under_one_root() {
    let directory = InMemoryDirectory::new();
    let subject = AssignmentSubject::new(EntityType::User, "123");
    let assignment_id = directory
        .user_roles
        .assign_with_audit(std::slice::from_ref(&subject), &ids(&["101"]), None)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    for id in ["p-1", "p-2"] {
        assert!(directory.privileges.create(privilege(id), None).await.is_ok());
    }
    let marker_id = directory
        .privileges
        .remove_with_audit(&ids(&["p-1", "p-2"]), None)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    let before = directory.audit_log_store.entries().await.len();

    let result = service(&directory)
        .revert(&[assignment_id, marker_id], None)
        .await;

    assert!(result.is_ok());
    let root: AuditLogId = entries_after(&directory, before).await.remove(0).id;
    let tree = directory
        .audit_tree_service()
        .load_tree(&root)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(tree.entry.action, AuditAction::RevertBatch);
    let shape: Vec<(usize, AuditAction)> = tree
        .flatten()
        .into_iter()
        .map(|(depth, entry)| (depth, entry.action))
        .collect();
    assert_eq!(
        shape,
        vec![
            (0, AuditAction::RevertBatch),
            (1, AuditAction::UnassignRoles),
            (1, AuditAction::RevertBatchRemove),
            (2, AuditAction::Restore),
            (2, AuditAction::Restore),
        ]
    );
}

#[tokio::test]
async fn revert_with_unknown_entry_leaves_directory_untouched() {
    let directory = InMemoryDirectory::new();
    let missing = AuditLogId::new("42").unwrap_or_else(|_| unreachable!());

    let result = service(&directory).revert(&[missing], None).await;

    assert!(result.is_err());
    assert!(directory.audit_log_store.entries().await.is_empty());
}
