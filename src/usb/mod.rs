//! USB HID host driver boundary.
//!
//! The vendor USB host stack is an external collaborator: this crate
//! never implements enumeration or transfers itself. What lives here is
//! the seam the stack plugs into - typed driver events, the small `Copy`
//! handles passed to the driver at install/open time (so its C-style
//! callbacks reach the bridge without any file-scope singleton), and the
//! [`HostStack`] trait the bridge controller drives.

#[cfg(feature = "embedded")]
pub mod worker;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::bridge::ingress::ReportIngress;
use crate::config::DRIVER_EVENT_QUEUE_DEPTH;
use crate::error::Error;

/// Opaque per-device token chosen by the driver (typically its handle
/// pointer). The bridge only ever passes it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceHandle(pub usize);

/// Boot-interface protocol reported at enumeration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceProtocol {
    None,
    Keyboard,
    Mouse,
}

/// Parameters the HID host driver reports for a connected device.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceParams {
    /// Device claims the boot-interface subclass.
    pub boot_interface: bool,
    /// Boot protocol of the interface.
    pub protocol: InterfaceProtocol,
}

/// Driver-level notification forwarded from the HID host callback.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverEvent {
    Connected(DeviceHandle),
    Disconnected(DeviceHandle),
}

/// Queue carrying driver notifications to the worker task.
///
/// Driver callbacks must never open/start devices themselves - those
/// calls block for milliseconds and would stall the driver's internal
/// thread - so connect/disconnect is deferred through this queue.
pub struct DriverEventQueue {
    channel: Channel<CriticalSectionRawMutex, DriverEvent, DRIVER_EVENT_QUEUE_DEPTH>,
}

impl DriverEventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Handle given to the driver at install time.
    pub fn sink(&'static self) -> DriverEventSink {
        DriverEventSink {
            tx: self.channel.sender(),
        }
    }

    pub(crate) fn receiver(
        &'static self,
    ) -> Receiver<'static, CriticalSectionRawMutex, DriverEvent, DRIVER_EVENT_QUEUE_DEPTH> {
        self.channel.receiver()
    }

    /// Non-blocking pop for tests.
    pub fn try_next(&self) -> Option<DriverEvent> {
        self.channel.try_receive().ok()
    }
}

impl Default for DriverEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap `Copy` adapter the driver calls from its connect/disconnect
/// callback. Non-blocking; a full queue drops the notification (the
/// worker re-learns device state from the next one).
#[derive(Clone, Copy)]
pub struct DriverEventSink {
    tx: Sender<'static, CriticalSectionRawMutex, DriverEvent, DRIVER_EVENT_QUEUE_DEPTH>,
}

impl DriverEventSink {
    pub fn notify(&self, event: DriverEvent) {
        let _ = self.tx.try_send(event);
    }
}

/// The opaque vendor USB/HID host stack, as the bridge sees it.
///
/// All methods take `&self`: the underlying stack is shared state with
/// its own internal synchronisation, reached concurrently from the
/// events task, the worker task and the controller.
///
/// Every error out of these is fatal while the bridge is starting up;
/// after startup, a failed attach only costs that one device.
#[allow(async_fn_in_trait)]
pub trait HostStack {
    /// Install the low-level USB host stack.
    async fn install_host(&self) -> Result<(), Error>;

    /// Process one batch of host-stack events. The events task calls
    /// this in a loop forever.
    async fn pump_events(&self) -> Result<(), Error>;

    /// Install the HID host driver. `events` is where its device
    /// connect/disconnect callback lands.
    async fn install_hid(&self, events: DriverEventSink) -> Result<(), Error>;

    /// Fetch subclass/protocol parameters for a connected device.
    async fn device_params(&self, dev: DeviceHandle) -> Result<DeviceParams, Error>;

    /// Open the device; `ingress` receives its raw input reports from
    /// the driver's per-interface callback.
    async fn open(&self, dev: DeviceHandle, ingress: ReportIngress) -> Result<(), Error>;

    /// Put a boot-capable interface into boot protocol.
    async fn set_boot_protocol(&self, dev: DeviceHandle) -> Result<(), Error>;

    /// Disable idle reports so only state changes are delivered.
    async fn set_idle_zero(&self, dev: DeviceHandle) -> Result<(), Error>;

    /// Start the device interface; reports begin flowing after this.
    async fn start(&self, dev: DeviceHandle) -> Result<(), Error>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_forwards_events_in_order() {
        let q: &'static DriverEventQueue = Box::leak(Box::new(DriverEventQueue::new()));
        let sink = q.sink();
        sink.notify(DriverEvent::Connected(DeviceHandle(7)));
        sink.notify(DriverEvent::Disconnected(DeviceHandle(7)));
        assert!(matches!(
            q.try_next(),
            Some(DriverEvent::Connected(DeviceHandle(7)))
        ));
        assert!(matches!(
            q.try_next(),
            Some(DriverEvent::Disconnected(DeviceHandle(7)))
        ));
        assert!(q.try_next().is_none());
    }

    #[test]
    fn overflowing_notifications_are_dropped() {
        let q: &'static DriverEventQueue = Box::leak(Box::new(DriverEventQueue::new()));
        let sink = q.sink();
        for i in 0..DRIVER_EVENT_QUEUE_DEPTH + 3 {
            sink.notify(DriverEvent::Connected(DeviceHandle(i)));
        }
        let mut count = 0;
        while let Some(DriverEvent::Connected(DeviceHandle(i))) = q.try_next() {
            assert_eq!(i, count, "kept notifications stay FIFO");
            count += 1;
        }
        assert_eq!(count, DRIVER_EVENT_QUEUE_DEPTH);
    }
}
