use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use btleplug::api::{Characteristic, Peripheral as _, ValueNotification};
use btleplug::platform::Peripheral;
use futures::{Stream, StreamExt};
use log::trace;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::error::DeviceError;

/// Something that hands out raw gamepad reports, one at a time.
pub trait SampleSource {
    fn next_payload(&mut self) -> impl Future<Output = Result<Vec<u8>, DeviceError>> + Send;
}

/// Reads the characteristic every time a payload is asked for.
pub struct CharacteristicReader {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

impl CharacteristicReader {
    pub fn new(peripheral: Peripheral, characteristic: Characteristic) -> Self {
        CharacteristicReader { peripheral, characteristic }
    }
}

impl SampleSource for CharacteristicReader {
    async fn next_payload(&mut self) -> Result<Vec<u8>, DeviceError> {
        let value = self.peripheral.read(&self.characteristic).await?;
        trace!("Read {:02x?}", value);
        Ok(value)
    }
}

/// Limits another source to one payload per interval. A failed read still waits for the next
/// tick, so errors never spin.
pub struct Paced<S> {
    source: S,
    ticker: Interval,
}

impl<S: SampleSource + Send> Paced<S> {
    /// Must be called within a tokio runtime.
    pub fn new(source: S, period: Duration) -> Self {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Paced { source, ticker }
    }
}

impl<S: SampleSource + Send> SampleSource for Paced<S> {
    async fn next_payload(&mut self) -> Result<Vec<u8>, DeviceError> {
        self.ticker.tick().await;
        self.source.next_payload().await
    }
}

/// Yields the value of every notification for the subscribed characteristic.
pub struct NotifiedSource {
    characteristic: Characteristic,
    notifications: Pin<Box<dyn Stream<Item = ValueNotification> + Send>>,
}

impl NotifiedSource {
    pub async fn subscribe(peripheral: &Peripheral, characteristic: Characteristic) -> Result<Self, DeviceError> {
        // open the stream first so that no notification is missed
        let notifications = peripheral.notifications().await?;
        peripheral.subscribe(&characteristic).await?;

        Ok(NotifiedSource { characteristic, notifications })
    }
}

impl SampleSource for NotifiedSource {
    async fn next_payload(&mut self) -> Result<Vec<u8>, DeviceError> {
        loop {
            match self.notifications.next().await {
                None => return Err(DeviceError::NotificationsEnded),
                Some(notification) if notification.uuid == self.characteristic.uuid => {
                    trace!("Notified {:02x?}", notification.value);
                    return Ok(notification.value);
                },
                Some(_) => continue,
            }
        }
    }
}
