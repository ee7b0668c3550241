//! BLE HID keyboard on the Nordic SoftDevice S140, Peripheral role.
//!
//! This is the concrete BLE output behind the [`KeySink`] seam:
//!
//! 1. **GATT services** - HID-over-GATT (HID Info, Report Map, Control
//!    Point, Protocol Mode, Input/Output Reports) registered through the
//!    `ServiceBuilder`, plus the standard Battery Service.
//! 2. **Advertising** - connectable, keyboard appearance, bonded with
//!    Just-Works security.
//! 3. **[`BleKeyboard`]** - key state + notify plumbing driven by the
//!    transmit task.
//!
//! A failed notify is swallowed: a key action racing a disconnect is an
//! expected, frequent event and the bridge never retries it.

use core::cell::RefCell;

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Timer;
use heapless::Vec;
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload,
    ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{
    peripheral, Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode, Uuid,
};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

use crate::ble::layout::keycode_for;
use crate::ble::report::InputReport;
use crate::ble::{KeySink, SinkKey};
use crate::config::{BLE_DEVICE_NAME, BLE_INITIAL_BATTERY_LEVEL};
use crate::hid::usage::Control;
use crate::statuslog::StatusLog;

/// Maximum peers we keep bond keys for (oldest evicted first).
const MAX_BONDS: usize = 4;

/// USB HID Report Map for a standard boot-layout keyboard:
/// 8 modifier bits, 1 reserved byte, 5 LED output bits, 6 key slots.
const BOOT_KEYBOARD_REPORT_MAP: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Modifier keys (8 bits) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Reserved byte -
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) - padding
    //
    //   - LED output (5 bits + 3 padding) -
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant) - padding
    //
    //   - Key codes (6 bytes) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x00, //   Input (Data, Array)
    //
    0xC0, // End Collection
];

/// HID-over-GATT service, registered handle by handle so the Report
/// Reference descriptors can be attached (the derive macro cannot
/// express those).
pub struct HidService {
    input_report: u16,
    output_report: u16,
    protocol_mode: u16,
}

impl HidService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(0x1812))?;

        // HID Information: version 1.1, no country code, remote wake +
        // normally connectable.
        sb.add_characteristic(
            Uuid::new_16(0x2a4a),
            Attribute::new([0x11u8, 0x01, 0x00, 0x03]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        sb.add_characteristic(
            Uuid::new_16(0x2a4b),
            Attribute::new(BOOT_KEYBOARD_REPORT_MAP).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        sb.add_characteristic(
            Uuid::new_16(0x2a4c),
            Attribute::new([0u8]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().write_without_response()),
        )?
        .build();

        // Protocol Mode: 1 = Report Protocol (our only mode; hosts may
        // still write 0 and we log it).
        let protocol_mode = sb
            .add_characteristic(
                Uuid::new_16(0x2a4e),
                Attribute::new([1u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        let mut input = sb.add_characteristic(
            Uuid::new_16(0x2a4d),
            Attribute::new([0u8; 8]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().notify()),
        )?;
        // Report Reference: report ID 0 (none in the map), type 1 = input.
        input.add_descriptor(
            Uuid::new_16(0x2908),
            Attribute::new([0u8, 1u8]).security(SecurityMode::JustWorks),
        )?;
        let input_report = input.build();

        let mut output = sb.add_characteristic(
            Uuid::new_16(0x2a4d),
            Attribute::new([0u8]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().write().write_without_response()),
        )?;
        // Report Reference: report ID 0, type 2 = output (LED states).
        output.add_descriptor(
            Uuid::new_16(0x2908),
            Attribute::new([0u8, 2u8]).security(SecurityMode::JustWorks),
        )?;
        let output_report = output.build();

        let _service = sb.build();

        Ok(Self {
            input_report: input_report.value_handle,
            output_report: output_report.value_handle,
            protocol_mode: protocol_mode.value_handle,
        })
    }

    fn on_write(&self, handle: u16, data: &[u8]) {
        if handle == self.output_report && !data.is_empty() {
            // Host LED state (caps/num lock). Nothing to mirror back to
            // the wired keyboard yet.
            debug!("HID output report: {:02x}", data[0]);
        }
        if handle == self.protocol_mode && !data.is_empty() {
            info!("host requested protocol mode {}", data[0]);
        }
    }
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    battery_level: u8,
}

/// All GATT services of the keyboard.
pub struct Server {
    pub hid: HidService,
    pub battery: BatteryService,
}

impl Server {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let battery = BatteryService::new(sd)?;
        let hid = HidService::new(sd)?;
        Ok(Self { hid, battery })
    }

    /// Push a fresh gauge reading; notifies when a link is up, otherwise
    /// just stores the value for the next read.
    pub fn set_battery_level(&self, slot: &ConnectionSlot, percent: u8) {
        match slot.current() {
            Some(conn) => {
                if self.battery.battery_level_notify(&conn, &percent).is_err() {
                    let _ = self.battery.battery_level_set(&percent);
                }
            }
            None => {
                let _ = self.battery.battery_level_set(&percent);
            }
        }
    }
}

impl gatt_server::Server for Server {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        self.hid.on_write(handle, data);
        None
    }
}

/// The single active link, shared between the connection task (writer)
/// and the transmit/battery paths (readers).
pub struct ConnectionSlot {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>>,
}

impl ConnectionSlot {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    fn set(&self, conn: Option<Connection>) {
        self.inner.lock(|slot| *slot.borrow_mut() = conn);
    }

    pub fn current(&self) -> Option<Connection> {
        self.inner.lock(|slot| slot.borrow().clone())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock(|slot| slot.borrow().is_some())
    }
}

impl Default for ConnectionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Key state + notify plumbing; the concrete [`KeySink`] the transmit
/// task drives. Owns the outgoing report exclusively.
pub struct BleKeyboard {
    report: InputReport,
    input_handle: u16,
    slot: &'static ConnectionSlot,
}

impl BleKeyboard {
    pub fn new(server: &Server, slot: &'static ConnectionSlot) -> Self {
        Self {
            report: InputReport::empty(),
            input_handle: server.hid.input_report,
            slot,
        }
    }

    /// Resolve a sink key to (usage, needs-shift).
    fn resolve(key: SinkKey) -> Option<(u8, bool)> {
        match key {
            SinkKey::Char(c) => keycode_for(c),
            SinkKey::Control(c) => Some((c.usage(), false)),
        }
    }

    fn notify(&self) {
        if let Some(conn) = self.slot.current() {
            // Failure here means the link raced away mid-action; the
            // event is simply lost, by design.
            let _ = gatt_server::notify_value(&conn, self.input_handle, &self.report.as_bytes());
        }
    }

    fn press_resolved(&mut self, usage: u8, shift: bool) {
        if shift {
            self.report.press_usage(Control::LeftShift.usage());
        }
        self.report.press_usage(usage);
        self.notify();
    }

    fn release_resolved(&mut self, usage: u8, shift: bool) {
        self.report.release_usage(usage);
        if shift {
            self.report.release_usage(Control::LeftShift.usage());
        }
        self.notify();
    }
}

impl KeySink for BleKeyboard {
    fn is_connected(&self) -> bool {
        self.slot.is_connected()
    }

    fn press(&mut self, key: SinkKey) {
        if let Some((usage, shift)) = Self::resolve(key) {
            self.press_resolved(usage, shift);
        }
    }

    fn release(&mut self, key: SinkKey) {
        if let Some((usage, shift)) = Self::resolve(key) {
            self.release_resolved(usage, shift);
        }
    }

    fn write(&mut self, key: SinkKey) {
        if let Some((usage, shift)) = Self::resolve(key) {
            self.press_resolved(usage, shift);
            self.release_resolved(usage, shift);
        }
    }
}

// Advertising

fn advertisement_data() -> LegacyAdvertisementPayload {
    LegacyAdvertisementBuilder::new()
        .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
        .services_16(
            ServiceList::Incomplete,
            &[ServiceUuid16::BATTERY, ServiceUuid16::HUMAN_INTERFACE_DEVICE],
        )
        .full_name(BLE_DEVICE_NAME)
        // Keyboard appearance so hosts show the right icon.
        .raw(AdvertisementDataType::APPEARANCE, &[0xC1, 0x03])
        .build()
}

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(
        ServiceList::Complete,
        &[ServiceUuid16::BATTERY, ServiceUuid16::HUMAN_INTERFACE_DEVICE],
    )
    .build();

// Bonding

struct PeerBond {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
}

/// RAM-only Just-Works bond store; oldest bond evicted when full.
pub struct Bonder {
    peers: RefCell<Vec<PeerBond, MAX_BONDS>>,
}

impl Bonder {
    fn new() -> Self {
        Self {
            peers: RefCell::new(Vec::new()),
        }
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::None
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        true
    }

    fn on_bonded(
        &self,
        _conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        let mut peers = self.peers.borrow_mut();
        if let Some(existing) = peers.iter_mut().find(|p| p.master_id == master_id) {
            existing.key = key;
            existing.peer_id = peer_id;
            return;
        }

        if peers.is_full() {
            peers.remove(0);
        }

        let _ = peers.push(PeerBond {
            master_id,
            key,
            peer_id,
        });
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.peers
            .borrow()
            .iter()
            .find_map(|p| (p.master_id == master_id).then_some(p.key))
    }

    fn get_peripheral_key(&self, conn: &Connection) -> Option<(MasterId, EncryptionInfo)> {
        self.peers.borrow().iter().find_map(|p| {
            p.peer_id
                .is_match(conn.peer_address())
                .then_some((p.master_id, p.key))
        })
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("BLE security mode updated: {}", mode);
    }
}

pub fn bonder() -> &'static Bonder {
    static BONDER: StaticCell<Bonder> = StaticCell::new();
    BONDER.init(Bonder::new())
}

/// Advertise, hold the link while it lasts, repeat. This is the BLE
/// collaborator's `begin()` made into a run-forever loop.
pub async fn ble_task(
    sd: &'static Softdevice,
    server: &'static Server,
    slot: &'static ConnectionSlot,
    bonder: &'static Bonder,
    log: &'static StatusLog,
) -> ! {
    let _ = server.battery.battery_level_set(&BLE_INITIAL_BATTERY_LEVEL);
    let adv_data = advertisement_data();

    loop {
        info!("BLE advertising as {}", BLE_DEVICE_NAME);
        log.log("BLE: ADVERTISING");

        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data,
            scan_data: &SCAN_DATA,
        };

        let conn =
            match peripheral::advertise_pairable(sd, adv, &peripheral::Config::default(), bonder)
                .await
            {
                Ok(conn) => conn,
                Err(_) => {
                    warn!("BLE advertise failed, retrying");
                    Timer::after_millis(200).await;
                    continue;
                }
            };

        slot.set(Some(conn.clone()));
        info!("BLE host connected");
        log.log("BLE: CONNECTED");

        // Serve GATT until the link drops.
        let _ = gatt_server::run(&conn, server, |_| {}).await;

        slot.set(None);
        info!("BLE host disconnected");
        log.log("BLE: DISCONNECTED");
    }
}
