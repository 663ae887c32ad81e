use std::future::Future;
use std::sync::Arc;
use indexmap::IndexMap;
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::device::constants::{Attribute, CONNECT_DEADLINE, DISCOVERY_DEADLINE, IO_DEADLINE, MUG_SERVICE};
use crate::device::stack::{BleDevice, BleStack, BtleplugStack};
use crate::device::types::MugAddress;
use crate::error::MugError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Enabling the adapter and connecting to the mug.
    pub connect_deadline: Duration,
    /// Discovering the service and all characteristics.
    pub discovery_deadline: Duration,
    /// A single characteristic read or write, and disconnecting.
    pub io_deadline: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            connect_deadline: Duration::from_millis(CONNECT_DEADLINE),
            discovery_deadline: Duration::from_millis(DISCOVERY_DEADLINE),
            io_deadline: Duration::from_millis(IO_DEADLINE),
        }
    }
}

/// A connected mug with all of its characteristics discovered.
pub struct Connection<D: BleDevice> {
    address: MugAddress,
    device: D,
    characteristics: IndexMap<Uuid, D::Characteristic>,
}

impl<D: BleDevice> Connection<D> {
    pub fn address(&self) -> &MugAddress {
        &self.address
    }

    fn characteristic(&self, uuid: Uuid) -> Result<&D::Characteristic, MugError> {
        self.characteristics
            .get(&uuid)
            .ok_or(MugError::CharacteristicNotCached { characteristic: uuid })
    }

    // Unguarded: callers go through MugSession, which applies deadlines and cancellation.
    pub(crate) async fn read(&self, uuid: Uuid) -> Result<Vec<u8>, MugError> {
        let characteristic = self.characteristic(uuid)?;
        self.device.read(characteristic).await
    }

    pub(crate) async fn write(&self, uuid: Uuid, value: &[u8]) -> Result<(), MugError> {
        let characteristic = self.characteristic(uuid)?;
        self.device.write_without_response(characteristic, value).await
    }
}

/// Owns the (at most one) connection to a mug.
///
/// Every operation names the mug it is meant for. If that is not the mug the
/// session is connected to, the old connection is dropped and a new one is
/// established first. Establishing and tearing down connections happens under
/// a single lock, so concurrent callers never open two connections at once.
pub struct MugSession<S: BleStack = BtleplugStack> {
    stack: S,
    options: SessionOptions,
    cancel: CancellationToken,
    current: Mutex<Option<Arc<Connection<S::Device>>>>,
}

impl MugSession<BtleplugStack> {
    pub fn new(options: SessionOptions) -> Self {
        MugSession::with_stack(BtleplugStack::new(), options)
    }
}

impl<S: BleStack> MugSession<S> {
    pub fn with_stack(stack: S, options: SessionOptions) -> Self {
        MugSession {
            stack,
            options,
            cancel: CancellationToken::new(),
            current: Mutex::new(None),
        }
    }

    /// Cancelling this token aborts every pending and future bluetooth operation of the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Address of the mug the session is currently connected to, if any.
    pub async fn connected_address(&self) -> Option<MugAddress> {
        self.current.lock().await.as_ref().map(|connection| connection.address)
    }

    /// Returns a connection to `address`, reusing the cached one when it
    /// belongs to the same mug.
    pub async fn resolve(&self, address: &MugAddress) -> Result<Arc<Connection<S::Device>>, MugError> {
        let mut current = self.current.lock().await;

        if let Some(connection) = current.as_ref() {
            if connection.address == *address {
                return Ok(connection.clone());
            }
        }

        if let Some(previous) = current.take() {
            info!("Switching from mug {} to mug {}", previous.address, address);
            self.disconnect(&previous.device).await;
        }

        let connection = Arc::new(self.establish(address).await?);
        *current = Some(connection.clone());
        Ok(connection)
    }

    /// Disconnects from the current mug, if any.
    pub async fn close(&self) {
        if let Some(previous) = self.current.lock().await.take() {
            info!("Disconnecting from mug {}", previous.address);
            self.disconnect(&previous.device).await;
        }
    }

    pub(crate) async fn read(&self, address: &MugAddress, attribute: Attribute) -> Result<Vec<u8>, MugError> {
        let connection = self.resolve(address).await?;
        self.guarded("read", self.options.io_deadline, connection.read(attribute.uuid())).await
    }

    pub(crate) async fn write(&self, address: &MugAddress, attribute: Attribute, value: &[u8]) -> Result<(), MugError> {
        let connection = self.resolve(address).await?;
        self.guarded("write", self.options.io_deadline, connection.write(attribute.uuid(), value)).await
    }

    async fn establish(&self, address: &MugAddress) -> Result<Connection<S::Device>, MugError> {
        let deadline = self.options.connect_deadline;
        self.guarded("enable adapter", deadline, self.stack.enable()).await?;
        let device = self.guarded("connect", deadline, self.stack.connect(address)).await?;

        let discovered = self.guarded(
            "discover",
            self.options.discovery_deadline,
            Self::discover(&device),
        ).await;

        match discovered {
            Ok(characteristics) => {
                info!("Connected to mug {}", address);
                Ok(Connection { address: *address, device, characteristics })
            },
            Err(err) => {
                warn!("Discovery on mug {} failed: {}", address, err);
                self.disconnect(&device).await;
                Err(err)
            },
        }
    }

    async fn discover(device: &S::Device) -> Result<IndexMap<Uuid, <S::Device as BleDevice>::Characteristic>, MugError> {
        debug!("Discovering service {}", MUG_SERVICE);
        if !device.discover_service(MUG_SERVICE).await? {
            return Err(MugError::ServiceNotFound { service: MUG_SERVICE });
        }

        let mut characteristics = IndexMap::with_capacity(Attribute::ALL.len());
        for attribute in Attribute::ALL {
            let uuid = attribute.uuid();
            match device.discover_characteristic(MUG_SERVICE, uuid).await? {
                Some(characteristic) => {
                    debug!("Found characteristic {} ({})", uuid, attribute);
                    characteristics.insert(uuid, characteristic);
                },
                None => return Err(MugError::CharacteristicNotFound { characteristic: uuid }),
            }
        }
        Ok(characteristics)
    }

    // Not raced against the cancellation token: a cancelled session still has to let go of the mug.
    async fn disconnect(&self, device: &S::Device) {
        match timeout(self.options.io_deadline, device.disconnect()).await {
            Ok(Ok(())) => {},
            Ok(Err(err)) => warn!("Failed to disconnect: {}", err),
            Err(_) => warn!("Disconnecting took too long"),
        }
    }

    async fn guarded<T, F>(&self, operation: &'static str, deadline: Duration, fut: F) -> Result<T, MugError>
    where
        F: Future<Output = Result<T, MugError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MugError::Cancelled { operation }),
            result = timeout(deadline, fut) => match result {
                Ok(result) => result,
                Err(_) => Err(MugError::Timeout { operation, deadline }),
            },
        }
    }
}
