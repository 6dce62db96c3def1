//! In-memory port implementations shared by the service tests.
//!
//! Every operation yields to the scheduler first so concurrently joined futures
//! interleave the way they would against a real store.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use homelink_domain::data::Data;
use homelink_domain::device::Device;
use homelink_domain::error::{HomeLinkError, PersistenceError};
use homelink_domain::id::{DataId, DeviceId, LocationId, ModuleId};
use homelink_domain::location::Location;
use homelink_domain::module::Module;

use crate::ports::{
    DataRepository, DeviceRepository, LocationRepository, MessagePublisher, ModuleRepository,
};

#[derive(Default)]
struct State {
    locations: BTreeMap<LocationId, Location>,
    devices: BTreeMap<DeviceId, Device>,
    data: Vec<Data>,
    next_location: i64,
    next_module: i64,
}

impl State {
    fn hydrate(&self, device: &Device) -> Device {
        let mut device = device.clone();
        if let Some(location) = device.location.id.and_then(|id| self.locations.get(&id)) {
            device.location = location.clone();
        }
        device
    }

    fn modules(&mut self) -> impl Iterator<Item = &mut Module> {
        self.devices
            .values_mut()
            .flat_map(|device| device.modules.iter_mut())
    }
}

/// Shared in-memory store implementing every repository port.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn location_count(&self) -> usize {
        self.state.lock().unwrap().locations.len()
    }

    pub fn device_count(&self) -> usize {
        self.state.lock().unwrap().devices.len()
    }

    pub fn data(&self) -> Vec<Data> {
        self.state.lock().unwrap().data.clone()
    }
}

fn with_state<T, F>(
    state: &Arc<Mutex<State>>,
    op: F,
) -> impl Future<Output = Result<T, HomeLinkError>> + Send + use<T, F>
where
    T: Send + 'static,
    F: FnOnce(&mut State) -> Result<T, HomeLinkError> + Send + 'static,
{
    let state = Arc::clone(state);
    async move {
        tokio::task::yield_now().await;
        let mut guard = state.lock().unwrap();
        op(&mut guard)
    }
}

impl LocationRepository for MemoryStore {
    fn create(
        &self,
        mut location: Location,
    ) -> impl Future<Output = Result<Location, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            let taken_name = state.locations.values().any(|l| l.name == location.name);
            let taken_id = location
                .id
                .is_some_and(|id| state.locations.contains_key(&id));
            if taken_name || taken_id {
                return Err(PersistenceError::Conflict {
                    entity: "Location",
                    key: location.name.clone(),
                }
                .into());
            }
            let id = location.id.unwrap_or_else(|| {
                state.next_location = state
                    .locations
                    .keys()
                    .next_back()
                    .map_or(0, |id| id.get())
                    .max(state.next_location)
                    + 1;
                LocationId::new(state.next_location)
            });
            location.id = Some(id);
            state.locations.insert(id, location.clone());
            Ok(location)
        })
    }

    fn get_by_id(
        &self,
        id: LocationId,
    ) -> impl Future<Output = Result<Option<Location>, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            Ok(state.locations.get(&id).cloned())
        })
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Location>, HomeLinkError>> + Send {
        let name = name.to_string();
        with_state(&self.state, move |state| {
            Ok(state.locations.values().find(|l| l.name == name).cloned())
        })
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Location>, HomeLinkError>> + Send {
        with_state(&self.state, |state| {
            Ok(state.locations.values().cloned().collect())
        })
    }

    fn update(
        &self,
        location: Location,
    ) -> impl Future<Output = Result<Location, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            let id = location.id.ok_or(PersistenceError::NoRowsAffected {
                operation: "update location",
            })?;
            if state
                .locations
                .values()
                .any(|l| l.name == location.name && l.id != location.id)
            {
                return Err(PersistenceError::Conflict {
                    entity: "Location",
                    key: location.name.clone(),
                }
                .into());
            }
            let slot = state
                .locations
                .get_mut(&id)
                .ok_or(PersistenceError::NoRowsAffected {
                    operation: "update location",
                })?;
            *slot = location.clone();
            Ok(location)
        })
    }

    fn delete(&self, id: LocationId) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            state
                .locations
                .remove(&id)
                .map(drop)
                .ok_or_else(|| {
                    PersistenceError::NoRowsAffected {
                        operation: "delete location",
                    }
                    .into()
                })
        })
    }
}

impl DeviceRepository for MemoryStore {
    fn create(
        &self,
        mut device: Device,
    ) -> impl Future<Output = Result<Device, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            if state.devices.contains_key(&device.id) {
                return Err(PersistenceError::Conflict {
                    entity: "Device",
                    key: device.id.to_string(),
                }
                .into());
            }
            for module in &mut device.modules {
                state.next_module += 1;
                module.id = Some(ModuleId::new(state.next_module));
            }
            state.devices.insert(device.id.clone(), device.clone());
            Ok(device)
        })
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HomeLinkError>> + Send {
        let id = id.clone();
        with_state(&self.state, move |state| {
            Ok(state.devices.get(&id).map(|d| state.hydrate(d)))
        })
    }

    fn get_by_location_id(
        &self,
        location_id: LocationId,
    ) -> impl Future<Output = Result<Vec<Device>, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            Ok(state
                .devices
                .values()
                .filter(|d| d.location.id == Some(location_id))
                .map(|d| state.hydrate(d))
                .collect())
        })
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HomeLinkError>> + Send {
        with_state(&self.state, |state| {
            Ok(state.devices.values().map(|d| state.hydrate(d)).collect())
        })
    }

    fn update_location(
        &self,
        id: &DeviceId,
        location_id: LocationId,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let id = id.clone();
        with_state(&self.state, move |state| {
            let location = state.locations.get(&location_id).cloned();
            let device = state
                .devices
                .get_mut(&id)
                .ok_or(PersistenceError::NoRowsAffected {
                    operation: "update device location",
                })?;
            device.location = location.ok_or(PersistenceError::NoRowsAffected {
                operation: "update device location",
            })?;
            Ok(())
        })
    }

    fn count_by_location(
        &self,
        location_id: LocationId,
    ) -> impl Future<Output = Result<u64, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            Ok(state
                .devices
                .values()
                .filter(|d| d.location.id == Some(location_id))
                .count() as u64)
        })
    }
}

impl ModuleRepository for MemoryStore {
    fn get_by_id(
        &self,
        id: ModuleId,
    ) -> impl Future<Output = Result<Option<Module>, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            Ok(state.modules().find(|m| m.id == Some(id)).map(|m| m.clone()))
        })
    }

    fn update_value(
        &self,
        id: ModuleId,
        value: &str,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let value = value.to_string();
        with_state(&self.state, move |state| {
            let module = state
                .modules()
                .find(|m| m.id == Some(id))
                .ok_or(PersistenceError::NoRowsAffected {
                    operation: "update module value",
                })?;
            module.value = value;
            Ok(())
        })
    }
}

impl DataRepository for MemoryStore {
    fn insert(&self, mut data: Data) -> impl Future<Output = Result<Data, HomeLinkError>> + Send {
        with_state(&self.state, move |state| {
            data.id = Some(DataId::new(state.data.len() as i64 + 1));
            state.data.push(data.clone());
            Ok(data)
        })
    }

    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Data>, HomeLinkError>> + Send {
        let device_id = device_id.clone();
        with_state(&self.state, move |state| {
            Ok(state
                .data
                .iter()
                .rev()
                .filter(|d| d.device_id == device_id)
                .take(limit)
                .cloned()
                .collect())
        })
    }
}

/// Publisher that records every message instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingPublisher {
    /// A publisher whose every call fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessagePublisher for RecordingPublisher {
    fn publish(
        &self,
        topic: String,
        payload: String,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        let result = if self.fail {
            Err(HomeLinkError::Transport("broker unreachable".into()))
        } else {
            self.sent.lock().unwrap().push((topic, payload));
            Ok(())
        };
        async move { result }
    }
}
