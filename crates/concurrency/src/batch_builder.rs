//! Fluent batch-transaction builder: queues create/update/delete
//! operations, then executes them inside one transaction — semantically
//! equivalent to an explicit begin → ops → commit, but without the caller
//! holding a `Transaction` across the calls.

use kgraph_core::{Entity, Relation};
use kgraph_storage::AppendOnlyStore;

use crate::transaction::{CommitReport, TransactionManager};

enum Operation {
    CreateEntity(Entity),
    UpdateEntity(String, Box<dyn FnOnce(&mut Entity) + Send>),
    DeleteEntity(String),
    CreateRelation(Relation),
    DeleteRelation(String, String, String),
}

/// Builds a sequence of operations to run atomically: either every one
/// applies, or none are persisted.
#[derive(Default)]
pub struct BatchBuilder {
    operations: Vec<Operation>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        BatchBuilder::default()
    }

    pub fn create_entity(mut self, entity: Entity) -> Self {
        self.operations.push(Operation::CreateEntity(entity));
        self
    }

    pub fn update_entity(mut self, name: impl Into<String>, mutate: impl FnOnce(&mut Entity) + Send + 'static) -> Self {
        self.operations.push(Operation::UpdateEntity(name.into(), Box::new(mutate)));
        self
    }

    pub fn delete_entity(mut self, name: impl Into<String>) -> Self {
        self.operations.push(Operation::DeleteEntity(name.into()));
        self
    }

    pub fn create_relation(mut self, relation: Relation) -> Self {
        self.operations.push(Operation::CreateRelation(relation));
        self
    }

    pub fn delete_relation(mut self, from: impl Into<String>, to: impl Into<String>, relation_type: impl Into<String>) -> Self {
        self.operations.push(Operation::DeleteRelation(from.into(), to.into(), relation_type.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Runs every queued operation inside one transaction against `store`.
    /// A failure partway through rolls back the whole batch (the
    /// transaction is dropped without committing).
    pub fn commit(self, manager: &TransactionManager<'_>) -> CommitReport {
        let mut txn = manager.begin();
        for op in self.operations {
            let result = match op {
                Operation::CreateEntity(e) => txn.create_entity(e).map(|_| ()),
                Operation::UpdateEntity(name, mutate) => txn.update_entity(&name, mutate).map(|_| ()),
                Operation::DeleteEntity(name) => txn.delete_entity(&name).map(|_| ()),
                Operation::CreateRelation(r) => txn.create_relation(r).map(|_| ()),
                Operation::DeleteRelation(from, to, relation_type) => {
                    txn.delete_relation(&from, &to, &relation_type).map(|_| ())
                }
            };
            if let Err(e) = result {
                return CommitReport { success: false, operations_executed: 0, error: Some(e.to_string()) };
            }
        }
        txn.commit()
    }

    /// Convenience for a store with no event bus wired in.
    pub fn commit_to(self, store: &AppendOnlyStore) -> CommitReport {
        self.commit(&TransactionManager::new(store))
    }
}
