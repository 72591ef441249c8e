use nusb::transfer::TransferError;
use thiserror::Error;

/// The primary error type for the `wt3000-lib` library.
#[derive(Error, Debug)]
pub enum WTError {
    #[error("USB device not found. Is the WT3000 connected?")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("USB transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Timeout during USB operation: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response truncated: buffer holds {capacity} bytes, received {received} with more pending")]
    Truncated { capacity: usize, received: usize },

    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed numeric response: {0}")]
    MalformedNumericResponse(String),
}

impl WTError {
    /// True for failures at the byte layer (USB, transfer, timeout, adapter).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WTError::DeviceNotFound
                | WTError::Usb(_)
                | WTError::Transfer(_)
                | WTError::Timeout(_)
                | WTError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WTError>;
