use std::future::Future;
use std::time::Duration;
use btleplug::api::{BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use log::{debug, info, warn};
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use crate::config::types::DeviceConfig;
use crate::device::constants::{DISCONNECT_DEADLINE, SCAN_POLL_DELAY};
use crate::error::DeviceError;

/// A connected gamepad and the characteristic that carries its reports.
#[derive(Clone)]
pub struct Connection {
    pub peripheral: Peripheral,
    pub characteristic: Characteristic,
}

impl Connection {
    /// Unsubscribes (when `subscribed`) and disconnects. Each step is bounded by
    /// DISCONNECT_DEADLINE; failures are only logged.
    pub async fn disconnect(&self, subscribed: bool) {
        let deadline = Duration::from_millis(DISCONNECT_DEADLINE);

        if subscribed {
            within_deadline("unsubscribe from the gamepad", deadline, self.peripheral.unsubscribe(&self.characteristic)).await;
        }

        if within_deadline("disconnect the gamepad", deadline, self.peripheral.disconnect()).await.is_some() {
            info!("Disconnected from the gamepad");
        }
    }
}

async fn within_deadline<T>(
    what: &str,
    deadline: Duration,
    fut: impl Future<Output = Result<T, btleplug::Error>>,
) -> Option<T> {
    tokio::select! {
        _ = sleep(deadline) => {
            warn!("Trying to {} took too long", what);
            None
        }
        result = fut => match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Failed to {}: {}", what, err);
                None
            },
        }
    }
}

fn parse_address(address: &str) -> Result<BDAddr, DeviceError> {
    address.trim().parse::<BDAddr>()
        .map_err(|_| DeviceError::InvalidAddress { address: address.to_string() })
}

/// Scan control of a single adapter.
trait Scanner {
    fn start(&self) -> impl Future<Output = Result<(), DeviceError>>;
    fn stop(&self) -> impl Future<Output = Result<(), DeviceError>>;
}

impl Scanner for Adapter {
    async fn start(&self) -> Result<(), DeviceError> {
        info!("Scanning using adapter {}...", self.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
        self.start_scan(ScanFilter::default()).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.stop_scan().await?;
        Ok(())
    }
}

/// Starts every scanner. If one fails, the ones already started are stopped again.
async fn start_all<S: Scanner>(scanners: &[S]) -> Result<(), DeviceError> {
    for (started, scanner) in scanners.iter().enumerate() {
        if let Err(err) = scanner.start().await {
            stop_all(&scanners[..started]).await;
            return Err(err);
        }
    }

    Ok(())
}

async fn stop_all<S: Scanner>(scanners: &[S]) {
    for scanner in scanners {
        if let Err(err) = scanner.stop().await {
            warn!("Failed to stop scanning: {}", err);
        }
    }
}

async fn start_scanning(manager: &Manager) -> Result<Vec<Adapter>, DeviceError> {
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(DeviceError::NoAdapter);
    }

    start_all(&adapters).await?;
    Ok(adapters)
}

async fn find_peripheral(adapters: &[Adapter], address: BDAddr) -> Option<Peripheral> {
    for adapter in adapters {
        let peripherals = match adapter.peripherals().await {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to query BLE adapter for peripherals: {}", err);
                continue;
            },
        };

        if let Some(peripheral) = peripherals.into_iter().find(|p| p.address() == address) {
            return Some(peripheral);
        }
    }

    None
}

async fn scan_for(manager: &Manager, address: BDAddr, deadline: Duration) -> Result<Peripheral, DeviceError> {
    let adapters = start_scanning(manager).await?;
    let give_up_at = Instant::now() + deadline;

    let found = loop {
        if let Some(peripheral) = find_peripheral(&adapters, address).await {
            break Some(peripheral);
        }

        if Instant::now() >= give_up_at {
            break None;
        }

        debug!("Peripheral {} not seen yet", address);
        sleep(Duration::from_millis(SCAN_POLL_DELAY)).await;
    };

    stop_all(&adapters).await;
    found.ok_or(DeviceError::PeripheralNotFound { address: address.to_string() })
}

fn find_characteristic(peripheral: &Peripheral, uuid: Uuid) -> Result<Characteristic, DeviceError> {
    peripheral.characteristics()
        .into_iter()
        .find(|characteristic| characteristic.uuid == uuid)
        .ok_or(DeviceError::MissingCharacteristic)
}

/// Finds the gamepad by address and connects to it. Any failure here is final, there is no
/// retry.
pub async fn connect(config: &DeviceConfig, characteristic_uuid: Uuid) -> Result<Connection, DeviceError> {
    let address = parse_address(&config.address)?;
    let manager = Manager::new().await?;

    info!("Looking for peripheral {}...", address);
    let peripheral = scan_for(&manager, address, Duration::from_millis(config.scan_timeout_ms)).await?;

    info!("Connecting to peripheral {}...", address);
    peripheral.connect().await?;

    info!("Connected; Discovering services...");
    peripheral.discover_services().await?;

    let characteristic = find_characteristic(&peripheral, characteristic_uuid)?;
    info!("Using characteristic {} ({:?})", characteristic.uuid, characteristic.properties);

    Ok(Connection { peripheral, characteristic })
}
