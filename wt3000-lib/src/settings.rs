use crate::constants::{
    DEFAULT_TERMINATOR, DEFAULT_TIMEOUT, ENDPOINT_IN, ENDPOINT_OUT, INTERFACE, MAX_PACKET_SIZE,
    NUMERIC_RESPONSE_CAPACITY, PID, TEXT_RESPONSE_CAPACITY, VID,
};
use std::time::Duration;

/// Selects and drives the physical USB channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbSettings {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Pick one analyzer when several are attached
    pub serial_number: Option<String>,
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,
    pub max_packet_size: usize,
    pub timeout: Duration,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            vendor_id: VID,
            product_id: PID,
            serial_number: None,
            interface: INTERFACE,
            endpoint_out: ENDPOINT_OUT,
            endpoint_in: ENDPOINT_IN,
            max_packet_size: MAX_PACKET_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Framing and buffer sizes used by the command/response layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSettings {
    /// Appended to each program message, stripped from text responses
    pub terminator: Vec<u8>,
    pub text_capacity: usize,
    pub numeric_capacity: usize,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            terminator: DEFAULT_TERMINATOR.to_vec(),
            text_capacity: TEXT_RESPONSE_CAPACITY,
            numeric_capacity: NUMERIC_RESPONSE_CAPACITY,
        }
    }
}
