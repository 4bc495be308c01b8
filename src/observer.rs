use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::debug;

use crate::resource::Resource;

/// Something that wants to hear about changes to a resource.
pub trait Observer {
    fn on_changed(&self, resource: &Resource);
}

/// Observers keyed by the resource they watch. Only weak references are
/// held, so an observer stops receiving notifications once it is dropped.
#[derive(Default)]
pub struct ObserverRegistry {
    entries: RefCell<Vec<(Resource, Weak<dyn Observer>)>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, resource: Resource, observer: Rc<dyn Observer>) {
        self.prune();
        self.entries
            .borrow_mut()
            .push((resource, Rc::downgrade(&observer)));
    }

    /// Number of live registrations.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.prune();
        self.entries.borrow().len()
    }

    /// Call every live observer whose resource overlaps `changed`.
    pub fn notify(&self, changed: &Resource) {
        self.prune();

        // Collect first: an observer may register again while being notified.
        let targets: Vec<Rc<dyn Observer>> = self
            .entries
            .borrow()
            .iter()
            .filter(|(watched, _)| watched.overlaps(changed))
            .filter_map(|(_, observer)| observer.upgrade())
            .collect();

        debug!("{} changed, notifying {} observer(s)", changed, targets.len());
        for observer in targets {
            observer.on_changed(changed);
        }
    }

    fn prune(&self) {
        self.entries
            .borrow_mut()
            .retain(|(_, observer)| observer.strong_count() > 0);
    }
}

/// A flag flipped by any change notification. Cursors hold one to know
/// when their rows are out of date.
#[derive(Debug, Default)]
pub struct ChangeFlag {
    changed: Cell<bool>,
}

impl ChangeFlag {
    pub fn is_set(&self) -> bool {
        self.changed.get()
    }

    pub fn clear(&self) {
        self.changed.set(false);
    }
}

impl Observer for ChangeFlag {
    fn on_changed(&self, _resource: &Resource) {
        self.changed.set(true);
    }
}
