//! Bridge lifecycle - ordered startup and the composed run loop.
//!
//! Startup order matters and is fixed:
//!
//! 1. queues exist before any driver is installed (they are `const`
//!    constructed statics, so creation itself cannot fail),
//! 2. the USB host stack installs on its own loop and must signal
//!    readiness within a bounded wait,
//! 3. the HID host driver installs with the driver-event sink - its
//!    callback context never opens devices itself,
//! 4. exactly one worker loop and one transmit loop run from then on.
//!
//! Any failure before step 4 aborts startup and returns the error with
//! nothing left running; the caller halts or retries.

use defmt::info;
use embassy_futures::select::{select3, Either3};
use embassy_time::{with_timeout, Duration};

use crate::ble::KeySink;
use crate::bridge::queue::KeyEventQueue;
use crate::bridge::transmit::transmit_task;
use crate::config::HOST_READY_TIMEOUT_MS;
use crate::error::Error;
use crate::statuslog::StatusLog;
use crate::usb::worker::{hid_worker_task, usb_events_task, HostReady};
use crate::usb::{DriverEventQueue, HostStack};

/// The statics the bridge runs on. The board binary owns one:
///
/// ```ignore
/// static QUEUES: BridgeQueues = BridgeQueues::new();
/// static STATUS: StatusLog = StatusLog::new();
/// ```
pub struct BridgeQueues {
    pub key_events: KeyEventQueue,
    pub driver_events: DriverEventQueue,
}

impl BridgeQueues {
    pub const fn new() -> Self {
        Self {
            key_events: KeyEventQueue::new(),
            driver_events: DriverEventQueue::new(),
        }
    }
}

impl Default for BridgeQueues {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the whole bridge on one executor.
///
/// Composes the three loops with `select3`; the first fatal error wins
/// and is returned. Boards that want the transmit path on its own
/// higher-priority executor spawn `usb_events_task`, `hid_worker_task`
/// and `transmit_task` separately instead and sequence the ready wait
/// and `install_hid` themselves, in this order.
pub async fn run_bridge<D: HostStack, S: KeySink>(
    driver: &D,
    sink: &mut S,
    queues: &'static BridgeQueues,
    log: &'static StatusLog,
) -> Error {
    let ready = HostReady::new();

    let usb_events = usb_events_task(driver, &ready, log);

    let worker = async {
        // Bounded wait for the host stack; a hung install must not wedge
        // startup forever.
        if with_timeout(Duration::from_millis(HOST_READY_TIMEOUT_MS), ready.wait())
            .await
            .is_err()
        {
            log.log("USB: host not ready");
            return Error::HostNotReady;
        }

        if let Err(e) = driver.install_hid(queues.driver_events.sink()).await {
            log.log("HID: install FAILED");
            return e;
        }
        info!("HID host driver installed");
        log.log("SETUP DONE: PLUG KEYBOARD");

        hid_worker_task(driver, &queues.driver_events, &queues.key_events, log).await
    };

    let transmit = transmit_task(&queues.key_events, sink, log);

    match select3(usb_events, worker, transmit).await {
        Either3::First(e) => e,
        Either3::Second(e) => e,
        Either3::Third(never) => never,
    }
}
