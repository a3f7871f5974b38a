use crate::domain::operation::{Operation, OperationKey};

/// Insertion-ordered set of operations keyed by [`OperationKey`].
///
/// Bounded by the number of changes in one request, so lookups are linear.
#[derive(Debug, Default)]
pub struct PendingOperations {
    operations: Vec<Operation>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn contains(&self, key: &OperationKey) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &OperationKey) -> Option<&Operation> {
        self.position(key).map(|ix| &self.operations[ix])
    }

    /// Adds `operation` unless its key is already present; returns whether it was added.
    pub fn insert(&mut self, operation: Operation) -> bool {
        if self.contains(&operation.key()) {
            return false;
        }
        self.operations.push(operation);
        true
    }

    /// Drops any operation with the same key and appends `operation` at the end.
    pub fn replace(&mut self, operation: Operation) {
        self.remove(&operation.key());
        self.operations.push(operation);
    }

    pub fn remove(&mut self, key: &OperationKey) -> Option<Operation> {
        self.position(key).map(|ix| self.operations.remove(ix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn keys(&self) -> Vec<OperationKey> {
        self.operations.iter().map(Operation::key).collect()
    }

    pub fn into_vec(self) -> Vec<Operation> {
        self.operations
    }

    fn position(&self, key: &OperationKey) -> Option<usize> {
        self.operations.iter().position(|op| &op.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Action, Context, Instance};
    use crate::domain::ports::{BackendOperations, Related};
    use crate::utils::error::Result;
    use std::sync::Arc;

    struct NoopBackend;

    impl BackendOperations for NoopBackend {
        fn name(&self) -> &str {
            "noop"
        }

        fn is_main(&self, _instance: &Instance) -> bool {
            true
        }

        fn get_related(&self, _instance: &Instance) -> Related {
            Related::None
        }

        fn ignore_fields(&self) -> &[String] {
            &[]
        }

        fn render(&self, _action: Action, _instance: &Instance, _context: &Context) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn op(pk: i64, action: Action, name: &str) -> Operation {
        let instance = Instance::new("users.User", pk).with_field("name", name);
        Operation::new(Arc::new(NoopBackend), instance, action)
    }

    #[test]
    fn test_insert_keeps_first() {
        let mut pending = PendingOperations::new();
        assert!(pending.insert(op(1, Action::Delete, "first")));
        assert!(!pending.insert(op(1, Action::Delete, "second")));

        assert_eq!(pending.len(), 1);
        let kept = pending.get(&op(1, Action::Delete, "").key()).unwrap();
        assert_eq!(kept.instance.get("name"), Some(serde_json::json!("first")));
    }

    #[test]
    fn test_replace_moves_to_end() {
        let mut pending = PendingOperations::new();
        pending.insert(op(1, Action::Save, "old"));
        pending.insert(op(2, Action::Save, "other"));
        pending.replace(op(1, Action::Save, "new"));

        let pks: Vec<i64> = pending.iter().map(|o| o.instance.pk).collect();
        assert_eq!(pks, vec![2, 1]);
        let latest = pending.get(&op(1, Action::Save, "").key()).unwrap();
        assert_eq!(latest.instance.get("name"), Some(serde_json::json!("new")));
    }

    #[test]
    fn test_save_and_delete_are_distinct_keys() {
        let mut pending = PendingOperations::new();
        pending.insert(op(1, Action::Save, "a"));
        pending.insert(op(1, Action::Delete, "a"));
        assert_eq!(pending.len(), 2);

        assert!(pending.remove(&op(1, Action::Save, "").key()).is_some());
        assert!(pending.remove(&op(1, Action::Save, "").key()).is_none());
        assert_eq!(pending.keys()[0].action, Action::Delete);
    }
}
