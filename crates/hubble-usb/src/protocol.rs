//! Exynos download-mode USB constants

use std::time::Duration;

/// Samsung vendor ID
pub const DOWNLOAD_USB_VENDOR: u16 = 0x04E8;
/// Product ID every Exynos ROM reports in download mode
pub const DOWNLOAD_USB_PRODUCT: u16 = 0x1234;

/// Interface carrying the bulk endpoints
pub const DOWNLOAD_INTERFACE: u8 = 0;
/// Bulk OUT endpoint the ROM reads blocks from
pub const BULK_OUT_EP: u8 = 0x02;

/// Bulk writes can take a while for the larger boot stages
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(50_000);
/// Timeout for string descriptor control reads
pub const DESCRIPTOR_TIMEOUT: Duration = Duration::from_secs(1);
/// Time to wait for a cancelled transfer to come back
pub const CANCEL_TIMEOUT: Duration = Duration::from_secs(1);

/// Fallback when the device lists no string languages
pub const LANGUAGE_US_ENGLISH: u16 = 0x0409;
