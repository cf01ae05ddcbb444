//! Device registry and lifecycle engine.
//!
//! Devices are declared as descriptors carrying a unique name, an
//! optional default configuration image, and the four lifecycle hooks.
//! Applications resolve devices by name through [`get`], which brings
//! the driver up on first acquisition and reference-counts every
//! subsequent one; [`put`] tears the driver down when the last
//! reference goes away.
//!
//! The registry is a fixed table of `MAX_DEVICES` entries guarded by a
//! spin lock; an acquired handle carries its registry index back to
//! [`put`], so release never searches.

use alloc::vec::Vec;
use heapless::Vec as BoundedVec;
use spin::Mutex;

use strata_osal::error::{record_error, report_error};
use strata_osal::status::{Result, Status};

use crate::config::{MAX_DEVICES, MAX_REF_COUNT};
use crate::iface::{DeviceIface, DeviceState};

/// Context passed to a driver's init hook: the device identity plus
/// its active configuration image.
pub struct DeviceContext<'a> {
    pub name: &'static str,
    pub config: Option<&'a [u8]>,
}

/// Lifecycle hooks supplied by the driver.
#[derive(Clone, Copy, Default)]
pub struct DeviceHooks {
    /// Bring the device up and return its interface. A descriptor
    /// without an init hook cannot be acquired.
    pub init: Option<fn(&DeviceContext) -> Result<DeviceIface>>,
    pub deinit: Option<fn(&DeviceIface) -> Result<()>>,
    pub suspend: Option<fn(&DeviceIface) -> Result<()>>,
    pub resume: Option<fn(&DeviceIface) -> Result<()>>,
}

/// Static description of a device.
#[derive(Clone, Copy)]
pub struct DeviceDescriptor {
    /// Unique registry key.
    pub name: &'static str,
    /// Default configuration image, copied into the runtime buffer at
    /// first init.
    pub default_config: Option<&'static [u8]>,
    /// Size of the runtime configuration buffer; zero disables the
    /// configuration machinery for this device.
    pub config_size: usize,
    pub hooks: DeviceHooks,
}

struct DeviceEntry {
    desc: DeviceDescriptor,
    runtime_config: Option<Vec<u8>>,
    initialized: bool,
    state: DeviceState,
    ref_count: u8,
    init_result: Status,
    iface: Option<DeviceIface>,
}

impl DeviceEntry {
    fn new(desc: DeviceDescriptor) -> Self {
        Self {
            desc,
            runtime_config: None,
            initialized: false,
            state: DeviceState::Uninitialized,
            ref_count: 0,
            init_result: Status::Ok,
            iface: None,
        }
    }

    /// Call the init hook against the current runtime configuration.
    fn run_init(&mut self) -> Result<()> {
        let init = self.desc.hooks.init.ok_or(Status::NotSupported)?;
        let context = DeviceContext {
            name: self.desc.name,
            config: self.runtime_config.as_deref(),
        };
        match init(&context) {
            Ok(iface) => {
                self.iface = Some(iface);
                self.initialized = true;
                self.state = DeviceState::Running;
                self.init_result = Status::Ok;
                Ok(())
            }
            Err(status) => {
                self.init_result = status;
                Err(status)
            }
        }
    }

    /// Refresh the runtime configuration from the default image, then
    /// init.
    fn init_from_default(&mut self) -> Result<()> {
        if self.desc.config_size > 0 {
            if let Some(default) = self.desc.default_config {
                let take = default.len().min(self.desc.config_size);
                self.runtime_config = Some(default[..take].to_vec());
            }
        }
        self.run_init()
    }

    /// Call the deinit hook and clear the interface binding.
    fn run_deinit(&mut self) -> Result<()> {
        if let (Some(deinit), Some(iface)) = (self.desc.hooks.deinit, self.iface.clone()) {
            deinit(&iface)?;
        }
        self.iface = None;
        self.initialized = false;
        self.state = DeviceState::Uninitialized;
        Ok(())
    }
}

/// Observational snapshot of one registry entry.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub name: &'static str,
    pub state: DeviceState,
    pub ref_count: u8,
    pub initialized: bool,
    pub init_result: Status,
}

impl DeviceInfo {
    fn of(entry: &DeviceEntry) -> Self {
        Self {
            name: entry.desc.name,
            state: entry.state,
            ref_count: entry.ref_count,
            initialized: entry.initialized,
            init_result: entry.init_result,
        }
    }
}

/// Acquired device reference: the capability interface plus the
/// registry index [`put`] releases against.
#[derive(Clone)]
pub struct DeviceHandle {
    index: usize,
    iface: DeviceIface,
}

impl DeviceHandle {
    pub fn iface(&self) -> &DeviceIface {
        &self.iface
    }
}

static REGISTRY: Mutex<BoundedVec<DeviceEntry, MAX_DEVICES>> = Mutex::new(BoundedVec::new());

/// Register a device descriptor.
///
/// Fails with `InvalidParam` for an empty name, `AlreadyInitialized`
/// for a duplicate, and `NoResource` when the table is full.
pub fn register(desc: DeviceDescriptor) -> Result<()> {
    if desc.name.is_empty() {
        return Err(Status::InvalidParam);
    }
    let mut registry = REGISTRY.lock();
    if registry.iter().any(|e| e.desc.name == desc.name) {
        return Err(Status::AlreadyInitialized);
    }
    let name = desc.name;
    registry
        .push(DeviceEntry::new(desc))
        .map_err(|_| Status::NoResource)?;
    log::debug!("device: registered '{}'", name);
    Ok(())
}

/// Remove a descriptor. Refused while any reference is live.
pub fn unregister(name: &str) -> Result<()> {
    let mut registry = REGISTRY.lock();
    let index = registry
        .iter()
        .position(|e| e.desc.name == name)
        .ok_or(Status::NotFound)?;
    if registry[index].ref_count > 0 {
        return Err(Status::ResourceBusy);
    }
    registry.remove(index);
    log::debug!("device: unregistered '{}'", name);
    Ok(())
}

/// Acquire a device by name, initializing it on first acquisition.
///
/// An unknown name goes through the global error callback; a driver
/// that fails to come up only lands in the last-error slot, since the
/// caller handles that outcome through the returned status.
pub fn get(name: &str) -> Result<DeviceHandle> {
    {
        let mut registry = REGISTRY.lock();
        if let Some(index) = registry.iter().position(|e| e.desc.name == name) {
            let entry = &mut registry[index];
            if entry.ref_count >= MAX_REF_COUNT {
                return Err(Status::NoResource);
            }
            if !entry.initialized {
                if let Err(status) = entry.init_from_default() {
                    record_error(status, index);
                    return Err(status);
                }
            }
            return match entry.iface.clone() {
                Some(iface) => {
                    entry.ref_count += 1;
                    Ok(DeviceHandle { index, iface })
                }
                None => {
                    record_error(Status::InvalidState, index);
                    Err(Status::InvalidState)
                }
            };
        }
    }
    // Callback after the registry lock drops: it runs user code.
    record_error(Status::NotFound, 0);
    report_error(Status::NotFound, "device", "acquire of unknown device");
    Err(Status::NotFound)
}

/// Release an acquired device. The last release deinitializes the
/// driver; a deinit failure restores the reference and surfaces the
/// error.
pub fn put(handle: DeviceHandle) -> Result<()> {
    let mut registry = REGISTRY.lock();
    let entry = registry.get_mut(handle.index).ok_or(Status::NotFound)?;
    if entry.ref_count == 0 {
        return Err(Status::InvalidState);
    }
    entry.ref_count -= 1;
    if entry.ref_count == 0 && entry.initialized {
        if let Err(status) = entry.run_deinit() {
            entry.ref_count += 1;
            return Err(status);
        }
        log::debug!("device: '{}' deinitialized", entry.desc.name);
    }
    Ok(())
}

/// Reinitialize a device with a new configuration image (or fall back
/// to the default), preserving its reference count.
///
/// The device is torn down, reconfigured, and brought back up. When
/// the fresh init fails the device is left uninitialized with no
/// references, and the error comes back.
pub fn reinit(name: &str, new_config: Option<&[u8]>) -> Result<()> {
    let mut registry = REGISTRY.lock();
    let index = registry
        .iter()
        .position(|e| e.desc.name == name)
        .ok_or(Status::NotFound)?;
    let entry = &mut registry[index];

    if let Some(config) = new_config {
        if entry.desc.config_size == 0 || config.len() > entry.desc.config_size {
            return Err(Status::InvalidSize);
        }
    }

    let saved_refs = entry.ref_count;
    if entry.initialized {
        entry.run_deinit()?;
        entry.ref_count = 0;
    }

    let refreshed = match new_config {
        Some(config) => {
            entry.runtime_config = Some(config.to_vec());
            entry.run_init()
        }
        None => entry.init_from_default(),
    };

    match refreshed {
        Ok(()) => {
            entry.ref_count = saved_refs;
            log::info!("device: '{}' reinitialized", entry.desc.name);
            Ok(())
        }
        Err(status) => {
            record_error(status, index);
            Err(status)
        }
    }
}

/// Suspend an initialized device through its descriptor hook.
pub fn suspend(name: &str) -> Result<()> {
    let mut registry = REGISTRY.lock();
    let entry = registry
        .iter_mut()
        .find(|e| e.desc.name == name)
        .ok_or(Status::NotFound)?;
    if !entry.initialized {
        return Err(Status::NotInitialized);
    }
    if entry.state == DeviceState::Suspended {
        return Err(Status::Suspended);
    }
    if let (Some(hook), Some(iface)) = (entry.desc.hooks.suspend, entry.iface.clone()) {
        hook(&iface)?;
    }
    entry.state = DeviceState::Suspended;
    Ok(())
}

/// Resume a suspended device.
pub fn resume(name: &str) -> Result<()> {
    let mut registry = REGISTRY.lock();
    let entry = registry
        .iter_mut()
        .find(|e| e.desc.name == name)
        .ok_or(Status::NotFound)?;
    if entry.state != DeviceState::Suspended {
        return Err(Status::InvalidState);
    }
    if let (Some(hook), Some(iface)) = (entry.desc.hooks.resume, entry.iface.clone()) {
        hook(&iface)?;
    }
    entry.state = DeviceState::Running;
    Ok(())
}

/// Initialize every registered device in declaration order. Failures
/// are recorded per device and do not stop the sweep; the worst status
/// comes back.
pub fn init_all() -> Result<()> {
    let mut registry = REGISTRY.lock();
    let mut worst = Status::Ok;
    for entry in registry.iter_mut() {
        if entry.initialized || entry.desc.hooks.init.is_none() {
            continue;
        }
        if let Err(status) = entry.init_from_default() {
            log::error!("device: init of '{}' failed: {}", entry.desc.name, status);
            if status.code() > worst.code() {
                worst = status;
            }
        }
    }
    if worst.is_error() {
        Err(worst)
    } else {
        Ok(())
    }
}

/// Deinitialize every device in reverse declaration order, dropping
/// any outstanding references. Shutdown path.
pub fn deinit_all() -> Result<()> {
    let mut registry = REGISTRY.lock();
    let mut worst = Status::Ok;
    for entry in registry.iter_mut().rev() {
        if !entry.initialized {
            continue;
        }
        match entry.run_deinit() {
            Ok(()) => entry.ref_count = 0,
            Err(status) => {
                log::error!("device: deinit of '{}' failed: {}", entry.desc.name, status);
                if status.code() > worst.code() {
                    worst = status;
                }
            }
        }
    }
    if worst.is_error() {
        Err(worst)
    } else {
        Ok(())
    }
}

/// Number of registered devices.
pub fn count() -> usize {
    REGISTRY.lock().len()
}

/// Snapshot one device's registry state.
pub fn info(name: &str) -> Result<DeviceInfo> {
    let registry = REGISTRY.lock();
    registry
        .iter()
        .find(|e| e.desc.name == name)
        .map(DeviceInfo::of)
        .ok_or(Status::NotFound)
}

/// Visit every registered device in declaration order.
pub fn for_each(mut visit: impl FnMut(&DeviceInfo)) {
    let registry = REGISTRY.lock();
    for entry in registry.iter() {
        visit(&DeviceInfo::of(entry));
    }
}
