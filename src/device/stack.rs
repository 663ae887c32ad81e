//! The bluetooth stack as seen by the mug session.
//!
//! [`BtleplugStack`] is the real implementation; tests substitute their own.

use std::future::Future;
use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::device::constants::{MUG_SERVICE, POLL_DELAY, READ_BUFFER_LEN};
use crate::device::types::MugAddress;
use crate::error::MugError;

#[async_trait]
pub trait BleStack: Send + Sync {
    type Device: BleDevice;

    /// Make the adapter ready for use. Calling this more than once is harmless.
    async fn enable(&self) -> Result<(), MugError>;

    async fn connect(&self, address: &MugAddress) -> Result<Self::Device, MugError>;
}

#[async_trait]
pub trait BleDevice: Send + Sync {
    type Characteristic: Clone + Send + Sync;

    /// Returns false if the device does not expose `service`.
    async fn discover_service(&self, service: Uuid) -> Result<bool, MugError>;

    async fn discover_characteristic(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Option<Self::Characteristic>, MugError>;

    async fn read(&self, characteristic: &Self::Characteristic) -> Result<Vec<u8>, MugError>;

    async fn write_without_response(&self, characteristic: &Self::Characteristic, value: &[u8]) -> Result<(), MugError>;

    async fn disconnect(&self) -> Result<(), MugError>;
}

/// Starting and stopping a scan for advertising mugs.
#[async_trait]
pub(crate) trait ScanControl: Clone + Send + Sync + 'static {
    async fn start_scan(&self) -> Result<(), btleplug::Error>;

    async fn stop_scan(&self) -> Result<(), btleplug::Error>;
}

#[async_trait]
impl ScanControl for Adapter {
    async fn start_scan(&self) -> Result<(), btleplug::Error> {
        Central::start_scan(self, ScanFilter { services: vec![MUG_SERVICE] }).await
    }

    async fn stop_scan(&self) -> Result<(), btleplug::Error> {
        Central::stop_scan(self).await
    }
}

/// A running scan. It is stopped by [`ScanGuard::stop`], or in the background
/// when the guard is dropped early (e.g. because a connect deadline expired).
pub(crate) struct ScanGuard<A: ScanControl> {
    scanner: Option<A>,
}

impl<A: ScanControl> ScanGuard<A> {
    pub(crate) async fn start(scanner: A) -> Result<Self, btleplug::Error> {
        scanner.start_scan().await?;
        Ok(ScanGuard { scanner: Some(scanner) })
    }

    pub(crate) async fn stop(mut self) {
        if let Some(scanner) = self.scanner.take() {
            if let Err(err) = scanner.stop_scan().await {
                warn!("Failed to stop scanning: {:?}", err);
            }
        }
    }
}

impl<A: ScanControl> Drop for ScanGuard<A> {
    fn drop(&mut self) {
        let Some(scanner) = self.scanner.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = scanner.stop_scan().await {
                        warn!("Failed to stop scanning: {:?}", err);
                    }
                });
            },
            Err(_) => warn!("No runtime left to stop scanning on"),
        }
    }
}

/// Calls `poll` until it finds something, then stops the scan. The scan is
/// stopped on every exit, including errors and the future being dropped.
pub(crate) async fn poll_until_found<A, T, F, Fut>(scan: ScanGuard<A>, mut poll: F) -> Result<T, MugError>
where
    A: ScanControl,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, MugError>>,
{
    let result = loop {
        match poll().await {
            Ok(Some(found)) => break Ok(found),
            Ok(None) => sleep(Duration::from_millis(POLL_DELAY)).await,
            Err(err) => break Err(err),
        }
    };
    scan.stop().await;
    result
}

#[derive(Default)]
pub struct BtleplugStack {
    adapter: OnceCell<Adapter>,
}

impl BtleplugStack {
    pub fn new() -> Self {
        Self::default()
    }

    async fn adapter(&self) -> Result<&Adapter, MugError> {
        self.adapter.get_or_try_init::<MugError, _, _>(|| async {
            let manager = Manager::new().await?;
            let adapter = manager.adapters().await?.into_iter().next().ok_or(MugError::NoAdapter)?;
            info!("Using adapter {}", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
            Ok(adapter)
        }).await
    }

    async fn find_peripheral(adapter: &Adapter, address: &MugAddress) -> Result<Option<Peripheral>, MugError> {
        for peripheral in adapter.peripherals().await? {
            if peripheral.address() == address.bdaddr() {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl BleStack for BtleplugStack {
    type Device = BtleplugDevice;

    async fn enable(&self) -> Result<(), MugError> {
        self.adapter().await.map(|_| ())
    }

    async fn connect(&self, address: &MugAddress) -> Result<BtleplugDevice, MugError> {
        let adapter = self.adapter().await?;
        let connection_error = |source| MugError::Connection { address: address.to_string(), source };

        // The peripheral may already be known to the OS; otherwise wait until it
        // advertises. The caller bounds how long this may take.
        let peripheral = match Self::find_peripheral(adapter, address).await? {
            Some(peripheral) => peripheral,
            None => {
                debug!("Mug {} not known yet, waiting for it to advertise", address);
                let scan = ScanGuard::start(adapter.clone()).await.map_err(connection_error)?;
                poll_until_found(scan, || Self::find_peripheral(adapter, address)).await?
            },
        };

        info!("Connecting to mug {}...", address);
        peripheral.connect().await.map_err(connection_error)?;
        Ok(BtleplugDevice { peripheral })
    }
}

pub struct BtleplugDevice {
    peripheral: Peripheral,
}

#[async_trait]
impl BleDevice for BtleplugDevice {
    type Characteristic = Characteristic;

    async fn discover_service(&self, service: Uuid) -> Result<bool, MugError> {
        self.peripheral.discover_services().await?;
        Ok(self.peripheral.services().iter().any(|s| s.uuid == service))
    }

    async fn discover_characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<Option<Characteristic>, MugError> {
        let found = self.peripheral
            .services()
            .into_iter()
            .filter(|s| s.uuid == service)
            .flat_map(|s| s.characteristics.into_iter())
            .find(|c| c.uuid == characteristic);
        Ok(found)
    }

    async fn read(&self, characteristic: &Characteristic) -> Result<Vec<u8>, MugError> {
        let mut value = self.peripheral.read(characteristic).await?;
        value.truncate(READ_BUFFER_LEN);
        Ok(value)
    }

    async fn write_without_response(&self, characteristic: &Characteristic, value: &[u8]) -> Result<(), MugError> {
        self.peripheral.write(characteristic, value, WriteType::WithoutResponse).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), MugError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::timeout;

    #[derive(Clone, Default)]
    struct CountingScanner {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl CountingScanner {
        fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        fn stops(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }

        // stopping after a drop happens on a spawned task
        async fn wait_for_stops(&self, expected: usize) {
            for _ in 0..50 {
                if self.stops() >= expected {
                    return;
                }
                sleep(Duration::from_millis(5)).await;
            }
        }
    }

    #[async_trait]
    impl ScanControl for CountingScanner {
        async fn start_scan(&self) -> Result<(), btleplug::Error> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop_scan(&self) -> Result<(), btleplug::Error> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn scan_stops_once_found() {
        let scanner = CountingScanner::default();
        let scan = ScanGuard::start(scanner.clone()).await.unwrap();

        let mut polls = 0;
        let found = poll_until_found(scan, || {
            polls += 1;
            let result = if polls < 3 { None } else { Some(polls) };
            async move { Ok(result) }
        }).await.unwrap();

        assert_eq!(found, 3);
        scanner.wait_for_stops(1).await;
        assert_eq!((scanner.starts(), scanner.stops()), (1, 1));
    }

    #[tokio::test]
    async fn scan_stops_when_polling_fails() {
        let scanner = CountingScanner::default();
        let scan = ScanGuard::start(scanner.clone()).await.unwrap();

        let result = poll_until_found(scan, || async {
            Err::<Option<()>, MugError>(MugError::Btle { source: btleplug::Error::NotConnected })
        }).await;

        assert!(matches!(result, Err(MugError::Btle { .. })));
        scanner.wait_for_stops(1).await;
        assert_eq!((scanner.starts(), scanner.stops()), (1, 1));
    }

    #[tokio::test]
    async fn scan_stops_when_waiting_is_abandoned() {
        let scanner = CountingScanner::default();
        let scan = ScanGuard::start(scanner.clone()).await.unwrap();

        let waiting = poll_until_found(scan, || async { Ok::<Option<()>, MugError>(None) });
        assert!(timeout(Duration::from_millis(50), waiting).await.is_err());

        scanner.wait_for_stops(1).await;
        assert_eq!((scanner.starts(), scanner.stops()), (1, 1));
    }
}
