pub mod command;
pub mod constants;
pub mod device;
pub mod error;
pub mod response;
pub mod settings;
pub mod state;
pub mod transport;


// Re-export the WT3000 struct for easy access
pub use device::WT3000;
pub use error::{Result, WTError};
