//! hubble-usb - USB transport for Exynos download mode
//!
//! Finds a ROM in download mode (VID:04e8 PID:1234), reads its identity
//! strings and claims interface 0 for bulk writes on endpoint 0x02.
//!
//! # Example
//!
//! ```no_run
//! use hubble_core::device::{DeviceProbe, DownloadDevice, Transport};
//! use hubble_usb::UsbProbe;
//!
//! let mut probe = UsbProbe::default();
//! if let Some(mut device) = probe.probe()? {
//!     let identity = device.identify()?;
//!     println!("SoC: {}", identity.soc_name());
//!     let port = device.open_for_transfer()?;
//!     port.close()?;
//! }
//! # Ok::<(), hubble_core::Error>(())
//! ```

mod device;
mod error;
pub mod protocol;

pub use device::{list_devices, ClaimedPort, ExynosDevice, UsbConfig, UsbProbe};
pub use error::{Result, UsbError};
