//! USB host-stack events task and HID device worker.
//!
//! Two of the bridge's three run-forever loops live here. Task functions
//! are plain `async fn`s; the board binary decides which executor (and
//! priority) each one runs on so the latency-sensitive transmit path can
//! stay clear of USB housekeeping.

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use crate::bridge::ingress::ReportIngress;
use crate::bridge::queue::KeyEventQueue;
use crate::config::WORKER_RECV_TIMEOUT_MS;
use crate::error::Error;
use crate::statuslog::StatusLog;
use crate::usb::{DeviceHandle, DriverEvent, DriverEventQueue, HostStack, InterfaceProtocol};

/// Signals that the USB host stack finished installing.
pub type HostReady = Signal<CriticalSectionRawMutex, ()>;

/// Install the USB host stack, signal readiness, then pump its events
/// forever.
///
/// An install or pump failure ends the loop with the error; the caller
/// treats that as fatal to the bridge.
pub async fn usb_events_task<D: HostStack>(
    driver: &D,
    ready: &HostReady,
    log: &'static StatusLog,
) -> Error {
    if let Err(e) = driver.install_host().await {
        warn!("USB host install failed");
        log.log("USB: install FAILED");
        return e;
    }
    ready.signal(());
    info!("USB host stack installed");

    loop {
        if let Err(e) = driver.pump_events().await {
            warn!("USB host event pump failed");
            log.log("USB: event pump FAILED");
            return e;
        }
    }
}

/// Drain the driver-event queue and bring devices up.
///
/// The receive is bounded (50 ms) rather than indefinite so periodic
/// housekeeping can be slotted in here later without a redesign.
pub async fn hid_worker_task<D: HostStack>(
    driver: &D,
    driver_events: &'static DriverEventQueue,
    key_events: &'static KeyEventQueue,
    log: &'static StatusLog,
) -> ! {
    let rx = driver_events.receiver();
    loop {
        match with_timeout(Duration::from_millis(WORKER_RECV_TIMEOUT_MS), rx.receive()).await {
            Ok(DriverEvent::Connected(dev)) => {
                if attach_device(driver, dev, key_events, log).await.is_err() {
                    // Steady-state attach failure costs one device, not
                    // the bridge.
                    warn!("device attach failed");
                    log.log("HID: attach FAILED");
                }
            }
            Ok(DriverEvent::Disconnected(_dev)) => {
                info!("HID device disconnected");
                log.log("HID: disconnected");
            }
            Err(_timeout) => {
                // Housekeeping slot - nothing to do yet.
            }
        }
    }
}

/// Open + configure + start one newly connected device.
///
/// These calls block for whole milliseconds, which is exactly why they
/// run here and not in the driver's callback context.
async fn attach_device<D: HostStack>(
    driver: &D,
    dev: DeviceHandle,
    key_events: &'static KeyEventQueue,
    log: &'static StatusLog,
) -> Result<(), Error> {
    let params = driver.device_params(dev).await?;
    info!("HID device connected: {}", params);
    log.log_fmt(format_args!("HID: connected {:?}", params.protocol));

    driver.open(dev, ReportIngress::new(key_events, log)).await?;

    if params.boot_interface {
        driver.set_boot_protocol(dev).await?;
        if params.protocol == InterfaceProtocol::Keyboard {
            driver.set_idle_zero(dev).await?;
        }
    }

    driver.start(dev).await?;
    Ok(())
}
