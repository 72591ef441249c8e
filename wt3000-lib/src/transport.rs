//! Byte-level transport to the analyzer.
//!
//! The command layer only needs two capabilities: send a block of bytes, and
//! receive up to a caller-bounded number of bytes. [`UsbTransport`] provides
//! them over the WT3000's bulk endpoints; tests substitute a scripted mock.

use crate::error::{Result, WTError};
use crate::settings::UsbSettings;
use bytes::Bytes;
use nusb::{Interface, transfer::RequestBuffer};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Bytes delivered by one receive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Received {
    /// At most the requested capacity
    pub data: Bytes,
    /// The instrument had more data than the capacity allowed
    pub truncated: bool,
}

/// Synchronous, fallible byte transport.
pub trait Transport: Send {
    /// Sends one program message, blocking until it is on the wire.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receives at most `capacity` bytes of one response.
    fn receive(&mut self, capacity: usize) -> Result<Received>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data)
    }

    fn receive(&mut self, capacity: usize) -> Result<Received> {
        (**self).receive(capacity)
    }
}

/// Bulk-endpoint transport to a WT3000 over USB.
///
/// Transfers are driven to completion on a private current-thread runtime so
/// each call blocks, bounded by [`UsbSettings::timeout`].
pub struct UsbTransport {
    interface: Interface,
    runtime: Runtime,
    settings: UsbSettings,
}

impl UsbTransport {
    pub fn open(settings: UsbSettings) -> Result<Self> {
        info!(
            "Searching for WT3000 (VID: {:#06x}, PID: {:#06x})...",
            settings.vendor_id, settings.product_id
        );
        let device_info = nusb::list_devices()?
            .find(|d| {
                d.vendor_id() == settings.vendor_id
                    && d.product_id() == settings.product_id
                    && settings
                        .serial_number
                        .as_deref()
                        .is_none_or(|serial| d.serial_number() == Some(serial))
            })
            .ok_or(WTError::DeviceNotFound)?;

        info!(
            "Found device on bus {} addr {}",
            device_info.bus_number(),
            device_info.device_address()
        );

        let device = device_info.open()?;
        let interface = device.detach_and_claim_interface(settings.interface)?;
        info!("Interface {} claimed successfully.", settings.interface);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| WTError::Transport(format!("failed to start transfer runtime: {e}")))?;

        Ok(Self {
            interface,
            runtime,
            settings,
        })
    }

    /// Bulk IN request length: one byte past `capacity`, so that a longer
    /// response is observable, rounded up to whole packets.
    fn request_length(&self, capacity: usize) -> usize {
        let packet = self.settings.max_packet_size.max(1);
        (capacity + 1).next_multiple_of(packet)
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        debug!(bytes = hex::encode(data), "USB Write");
        let transfer = self.interface.bulk_out(self.settings.endpoint_out, data.to_vec());
        let completion = self
            .runtime
            .block_on(tokio::time::timeout(self.settings.timeout, transfer))?;
        let written = completion.into_result()?.actual_length();
        if written != data.len() {
            return Err(WTError::Transport(format!(
                "short write: {written} of {} bytes",
                data.len()
            )));
        }
        Ok(())
    }

    fn receive(&mut self, capacity: usize) -> Result<Received> {
        let buffer = RequestBuffer::new(self.request_length(capacity));
        let transfer = self.interface.bulk_in(self.settings.endpoint_in, buffer);
        let completion = self
            .runtime
            .block_on(tokio::time::timeout(self.settings.timeout, transfer))?;
        let data = completion.into_result()?;
        debug!(bytes = hex::encode(&data), "USB Read");

        let mut data = Bytes::from(data);
        let truncated = data.len() > capacity;
        if truncated {
            warn!(
                "Response of {} bytes exceeds receive capacity of {} bytes",
                data.len(),
                capacity
            );
            data.truncate(capacity);
        }
        Ok(Received { data, truncated })
    }
}
