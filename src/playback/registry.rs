//! Devices declared by a capture.

use std::collections::HashMap;

use crate::core::DeviceHandle;

/// Driver identity given to every device created by playback.
pub const REPLAY_DRIVER: &str = "replay";

#[derive(Debug)]
struct Entry {
    handle: DeviceHandle,
    registered: bool,
}

/// Name-keyed device registry for one playback session.
///
/// A handle is constructed the first time a name is seen and fetched on
/// every later lookup, so a device declared twice is never duplicated. Only
/// registered devices (configuration accepted by the pipeline) resolve for
/// event dispatch.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: HashMap<String, Entry>,
    next_id: u32,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the handle for `name`, constructing it if needed.
    pub fn fetch_or_create(&mut self, name: &str) -> DeviceHandle {
        if let Some(entry) = self.entries.get(name) {
            return entry.handle.clone();
        }
        let handle = DeviceHandle::new(self.next_id, name, REPLAY_DRIVER);
        self.next_id += 1;
        self.entries.insert(
            name.to_string(),
            Entry {
                handle: handle.clone(),
                registered: false,
            },
        );
        handle
    }

    /// Mark `name` as registered.
    ///
    /// Returns `true` only the first time; unknown names are ignored.
    pub fn register(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) if !entry.registered => {
                entry.registered = true;
                true
            }
            _ => false,
        }
    }

    /// Registered device named `name`.
    pub fn get(&self, name: &str) -> Option<&DeviceHandle> {
        self.entries
            .get(name)
            .filter(|entry| entry.registered)
            .map(|entry| &entry.handle)
    }

    /// Registered devices ordered by id.
    pub fn devices(&self) -> Vec<&DeviceHandle> {
        let mut devices: Vec<&DeviceHandle> = self
            .entries
            .values()
            .filter(|entry| entry.registered)
            .map(|entry| &entry.handle)
            .collect();
        devices.sort_by_key(|device| device.id);
        devices
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|entry| entry.registered).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
