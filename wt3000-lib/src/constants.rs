// Protocol constants for the Yokogawa WT3000

use std::time::Duration;

/// Yokogawa USB vendor ID
pub const VID: u16 = 0x0B21;

/// WT3000 USB product ID
pub const PID: u16 = 0x0025;

/// Host to device, bulk transfer
pub const ENDPOINT_OUT: u8 = 0x01;

/// Device to host, bulk transfer
pub const ENDPOINT_IN: u8 = 0x83;

/// USB interface carrying the command channel
pub const INTERFACE: u8 = 0;

/// Bulk max packet size on a high-speed link
pub const MAX_PACKET_SIZE: usize = 512;

/// Default timeout for a single USB transfer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Program message terminator appended to every command and stripped from text responses
pub const DEFAULT_TERMINATOR: &[u8] = b"\n";

/// Receive capacity for identification and module queries
pub const TEXT_RESPONSE_CAPACITY: usize = 1024;

/// Receive capacity for `:NUMeric:VALue?` (up to 255 items)
pub const NUMERIC_RESPONSE_CAPACITY: usize = 16 * 1024;

/// Highest input element number (`:INPut:MODUle<n>`)
pub const MAX_INPUT_ELEMENT: u8 = 4;

/// Highest transition filter number (`:STATus:FILTer<n>`)
pub const MAX_STATUS_FILTER: u8 = 16;

/// Separator between values of an ASCII numeric response
pub const NUMERIC_SEPARATOR: char = ',';
