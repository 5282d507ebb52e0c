//! Device-side abstractions
//!
//! The transfer logic never talks to USB directly. A transport crate provides
//! a [`DeviceProbe`] that finds download-mode devices, the found
//! [`DownloadDevice`] reports its identity and hands out a claimed
//! [`Transport`] for the bulk writes.

use crate::error::Result;

/// Strings a download-mode ROM reports about itself
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceIdentity {
    /// iProduct string, verbatim (some ROMs NUL-pad it)
    pub product: String,
    /// iSerialNumber string (SoC ID followed by chip ID)
    pub serial: String,
    /// iInterface string of the default interface (carries the USB booting version)
    pub interface: String,
}

impl DeviceIdentity {
    /// SoC name with NUL padding removed, for display
    pub fn soc_name(&self) -> &str {
        self.product.trim_end_matches('\0')
    }

    /// SoC ID portion of the serial string
    pub fn soc_id(&self) -> String {
        char_range(&self.serial, 0, 15)
    }

    /// Chip ID portion of the serial string
    pub fn chip_id(&self) -> String {
        char_range(&self.serial, 15, 31)
    }

    /// USB booting version portion of the interface string
    pub fn booting_version(&self) -> String {
        char_range(&self.interface, 12, 16)
    }
}

fn char_range(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end - start).collect()
}

/// A claimed channel to the device's bulk OUT endpoint
///
/// Dropping the transport releases the interface; [`Transport::close`] does the
/// same but reports failures.
pub trait Transport {
    /// Issue one bulk write, returning how many bytes the device accepted
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Release the interface and transport resources
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// A discovered device in download mode
pub trait DownloadDevice {
    /// Transport returned by [`DownloadDevice::open_for_transfer`]
    type Port: Transport;

    /// Read the product, serial and interface strings
    fn identify(&mut self) -> Result<DeviceIdentity>;

    /// Claim the communication interface for writing
    fn open_for_transfer(&mut self) -> Result<Self::Port>;
}

/// One enumeration pass looking for a download-mode device
pub trait DeviceProbe {
    /// Device type found by this probe
    type Device: DownloadDevice;

    /// Return the first matching device, or `None` if nothing is attached yet
    fn probe(&mut self) -> Result<Option<Self::Device>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fields() {
        let identity = DeviceIdentity {
            product: "Exynos9830\0".into(),
            serial: "0123456789ABCDE0000111122223333".into(),
            interface: "Exynos9830: 0200".into(),
        };

        assert_eq!(identity.soc_name(), "Exynos9830");
        assert_eq!(identity.soc_id(), "0123456789ABCDE");
        assert_eq!(identity.chip_id(), "0000111122223333");
        assert_eq!(identity.booting_version(), "0200");
    }

    #[test]
    fn test_identity_short_strings() {
        let identity = DeviceIdentity {
            product: "X".into(),
            serial: "ABC".into(),
            interface: String::new(),
        };

        assert_eq!(identity.soc_id(), "ABC");
        assert_eq!(identity.chip_id(), "");
        assert_eq!(identity.booting_version(), "");
    }
}
