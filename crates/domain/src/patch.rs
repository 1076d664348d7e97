//! JSON merge patches (RFC 7386) used as backward data of `UPDATE` entries.
//!
//! A merge patch cannot express "set this member to `null`", so documents are
//! expected to omit absent optional members instead of storing `null`.

use serde_json::{Map, Value};

/// Applies `patch` to `target` and returns the patched document.
#[must_use]
pub fn apply_merge_patch(target: &Value, patch: &Value) -> Value {
    let Value::Object(patch_members) = patch else {
        return patch.clone();
    };

    let mut patched = match target {
        Value::Object(members) => members.clone(),
        _ => Map::new(),
    };

    for (key, patch_value) in patch_members {
        if patch_value.is_null() {
            patched.remove(key);
            continue;
        }

        let current = patched.get(key).cloned().unwrap_or(Value::Null);
        patched.insert(key.clone(), apply_merge_patch(&current, patch_value));
    }

    Value::Object(patched)
}

/// Computes the merge patch that turns `after` back into `before`.
///
/// Forward callers record the result as backward data of an `UPDATE` entry.
#[must_use]
pub fn reverse_merge_patch(before: &Value, after: &Value) -> Value {
    let (Value::Object(before_members), Value::Object(after_members)) = (before, after) else {
        return before.clone();
    };

    let mut patch = Map::new();

    for key in after_members.keys() {
        if !before_members.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }

    for (key, before_value) in before_members {
        match after_members.get(key) {
            Some(after_value) if after_value == before_value => {}
            Some(after_value) if before_value.is_object() && after_value.is_object() => {
                patch.insert(key.clone(), reverse_merge_patch(before_value, after_value));
            }
            _ => {
                patch.insert(key.clone(), before_value.clone());
            }
        }
    }

    Value::Object(patch)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{Map, Value, json};

    use super::{apply_merge_patch, reverse_merge_patch};

    #[test]
    fn null_member_removes_key() {
        let patched = apply_merge_patch(
            &json!({"name": "ops", "description": "old"}),
            &json!({"description": null}),
        );
        assert_eq!(patched, json!({"name": "ops"}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let patched = apply_merge_patch(
            &json!({"profile": {"city": "Oslo", "zip": "0150"}}),
            &json!({"profile": {"city": "Bergen"}}),
        );
        assert_eq!(patched, json!({"profile": {"city": "Bergen", "zip": "0150"}}));
    }

    #[test]
    fn non_object_patch_replaces_target() {
        let patched = apply_merge_patch(&json!({"a": 1}), &json!(["x"]));
        assert_eq!(patched, json!(["x"]));
    }

    #[test]
    fn reverse_patch_restores_previous_version() {
        let before = json!({"username": "bob", "enabled": true});
        let after = json!({"username": "robert", "enabled": true, "email": "r@example.com"});

        let patch = reverse_merge_patch(&before, &after);

        assert_eq!(patch, json!({"username": "bob", "email": null}));
        assert_eq!(apply_merge_patch(&after, &patch), before);
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|number| json!(number)),
            "[a-z]{0,8}".prop_map(Value::String),
        ]
    }

    fn document() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|members| Value::Object(members.into_iter().collect::<Map<_, _>>()))
        })
    }

    fn object_document() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-e]", document(), 0..5)
            .prop_map(|members| Value::Object(members.into_iter().collect::<Map<_, _>>()))
    }

    proptest! {
        #[test]
        fn reverse_patch_always_inverts_update(
            before in object_document(),
            after in object_document(),
        ) {
            let patch = reverse_merge_patch(&before, &after);
            prop_assert_eq!(apply_merge_patch(&after, &patch), before);
        }

        #[test]
        fn empty_patch_is_identity(document in object_document()) {
            prop_assert_eq!(apply_merge_patch(&document, &json!({})), document);
        }
    }
}
