//! Error types for the download-mode transport

use std::fmt;

use crate::protocol::{DOWNLOAD_USB_PRODUCT, DOWNLOAD_USB_VENDOR};

/// Result type for USB operations
pub type Result<T> = std::result::Result<T, UsbError>;

/// Errors from enumerating, identifying or writing to a download-mode device
#[derive(Debug)]
pub enum UsbError {
    /// No download-mode device attached
    DeviceNotFound,
    /// Listing USB devices failed
    EnumerateFailed(String),
    /// Failed to open the device
    OpenFailed(String),
    /// A string descriptor could not be read
    DescriptorFailed(String),
    /// Failed to claim the interface or its endpoint
    ClaimFailed(String),
    /// Bulk transfer completed with an error
    TransferFailed(String),
    /// Bulk transfer did not complete in time
    Timeout(usize),
}

impl fmt::Display for UsbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbError::DeviceNotFound => write!(
                f,
                "No download mode device found (VID:{:04x} PID:{:04x})",
                DOWNLOAD_USB_VENDOR, DOWNLOAD_USB_PRODUCT
            ),
            UsbError::EnumerateFailed(msg) => write!(f, "Failed to list USB devices: {}", msg),
            UsbError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            UsbError::DescriptorFailed(msg) => {
                write!(f, "Failed to read string descriptor: {}", msg)
            }
            UsbError::ClaimFailed(msg) => write!(f, "Failed to claim interface: {}", msg),
            UsbError::TransferFailed(msg) => write!(f, "USB transfer failed: {}", msg),
            UsbError::Timeout(len) => write!(f, "Timeout writing {} bytes", len),
        }
    }
}

impl std::error::Error for UsbError {}

impl From<nusb::Error> for UsbError {
    fn from(e: nusb::Error) -> Self {
        UsbError::TransferFailed(e.to_string())
    }
}

impl From<UsbError> for hubble_core::Error {
    fn from(e: UsbError) -> Self {
        match e {
            UsbError::DeviceNotFound => hubble_core::Error::DeviceNotFound,
            other => hubble_core::Error::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_stays_transient() {
        let err: hubble_core::Error = UsbError::DeviceNotFound.into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_transport_errors_are_fatal() {
        let err: hubble_core::Error = UsbError::Timeout(0x2000 + 10).into();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("8202"));
    }

    #[test]
    fn test_not_found_names_ids() {
        assert_eq!(
            UsbError::DeviceNotFound.to_string(),
            "No download mode device found (VID:04e8 PID:1234)"
        );
    }
}
