//! Aggregation storage
//!
//! The storage of an aggregation is a shared cell so a forwarded
//! aggregation on another object can point at the very same collection.

use std::cell::RefCell;
use std::rc::Rc;

use super::ManagedObject;
use crate::value::Value;

/// Children of one aggregation
#[derive(Clone)]
pub enum AggregationStorage {
    /// 0..1 aggregation
    Single(Rc<RefCell<Option<ManagedObject>>>),
    /// 0..n aggregation
    Multiple(Rc<RefCell<Vec<ManagedObject>>>),
}

impl AggregationStorage {
    /// Empty storage for an aggregation of the given multiplicity
    pub fn new(multiple: bool) -> Self {
        if multiple {
            AggregationStorage::Multiple(Rc::new(RefCell::new(Vec::new())))
        } else {
            AggregationStorage::Single(Rc::new(RefCell::new(None)))
        }
    }

    /// Whether both handles refer to the same collection
    pub fn ptr_eq(&self, other: &AggregationStorage) -> bool {
        match (self, other) {
            (AggregationStorage::Single(a), AggregationStorage::Single(b)) => Rc::ptr_eq(a, b),
            (AggregationStorage::Multiple(a), AggregationStorage::Multiple(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether no child is stored
    pub fn is_empty(&self) -> bool {
        match self {
            AggregationStorage::Single(cell) => cell.borrow().is_none(),
            AggregationStorage::Multiple(list) => list.borrow().is_empty(),
        }
    }

    /// Number of children
    pub fn len(&self) -> usize {
        match self {
            AggregationStorage::Single(cell) => usize::from(cell.borrow().is_some()),
            AggregationStorage::Multiple(list) => list.borrow().len(),
        }
    }

    /// Snapshot of the children
    pub fn children(&self) -> Vec<ManagedObject> {
        match self {
            AggregationStorage::Single(cell) => cell.borrow().iter().cloned().collect(),
            AggregationStorage::Multiple(list) => list.borrow().clone(),
        }
    }

    /// Content as a dynamic value: a list, an object or undefined
    pub fn to_value(&self) -> Value {
        match self {
            AggregationStorage::Single(cell) => cell.borrow().clone().into(),
            AggregationStorage::Multiple(list) => Value::Objects(list.borrow().clone()),
        }
    }

    /// Position of a child, by identity
    pub fn position(&self, child: &ManagedObject) -> Option<usize> {
        match self {
            AggregationStorage::Single(cell) => {
                cell.borrow().as_ref().filter(|c| *c == child).map(|_| 0)
            }
            AggregationStorage::Multiple(list) => list.borrow().iter().position(|c| c == child),
        }
    }

    /// Append a child; replaces the content of single storage
    pub(crate) fn push(&self, child: ManagedObject) {
        match self {
            AggregationStorage::Single(cell) => *cell.borrow_mut() = Some(child),
            AggregationStorage::Multiple(list) => list.borrow_mut().push(child),
        }
    }

    /// Insert a child at `index`, clamped to the current bounds
    pub(crate) fn insert(&self, index: i64, child: ManagedObject) {
        match self {
            AggregationStorage::Single(cell) => *cell.borrow_mut() = Some(child),
            AggregationStorage::Multiple(list) => {
                let mut list = list.borrow_mut();
                let index = usize::try_from(index.max(0)).unwrap_or(0).min(list.len());
                list.insert(index, child);
            }
        }
    }

    /// Remove the child at `index`
    pub(crate) fn remove_at(&self, index: usize) -> Option<ManagedObject> {
        match self {
            AggregationStorage::Single(cell) => {
                if index == 0 {
                    cell.borrow_mut().take()
                } else {
                    None
                }
            }
            AggregationStorage::Multiple(list) => {
                let mut list = list.borrow_mut();
                (index < list.len()).then(|| list.remove(index))
            }
        }
    }

    /// Remove a child by identity
    pub(crate) fn remove(&self, child: &ManagedObject) -> Option<ManagedObject> {
        self.position(child).and_then(|index| self.remove_at(index))
    }

    /// Take all children, leaving the shared collection empty
    pub(crate) fn drain(&self) -> Vec<ManagedObject> {
        match self {
            AggregationStorage::Single(cell) => cell.borrow_mut().take().into_iter().collect(),
            AggregationStorage::Multiple(list) => list.borrow_mut().drain(..).collect(),
        }
    }
}

impl std::fmt::Debug for AggregationStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.children().iter().map(|c| c.id().to_string()).collect();
        match self {
            AggregationStorage::Single(_) => f.debug_tuple("Single").field(&ids.first()).finish(),
            AggregationStorage::Multiple(_) => f.debug_tuple("Multiple").field(&ids).finish(),
        }
    }
}
