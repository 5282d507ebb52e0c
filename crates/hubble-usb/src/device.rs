//! Download-mode device discovery and bulk transport

use std::num::NonZeroU8;

use hubble_core::device::{DeviceIdentity, DeviceProbe, DownloadDevice, Transport};
use nusb::transfer::{Buffer, Bulk, Out};
use nusb::{Device, DeviceInfo, Endpoint, Interface, MaybeFuture};

use crate::error::{Result, UsbError};
use crate::protocol::*;

/// Transport options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbConfig {
    /// Detach a bound kernel driver before claiming the interface
    pub detach_kernel_driver: bool,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            detach_kernel_driver: !cfg!(windows),
        }
    }
}

fn is_download_mode(info: &DeviceInfo) -> bool {
    info.vendor_id() == DOWNLOAD_USB_VENDOR && info.product_id() == DOWNLOAD_USB_PRODUCT
}

/// List attached download-mode devices
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let devices = nusb::list_devices()
        .wait()
        .map_err(|e| UsbError::EnumerateFailed(e.to_string()))?
        .filter(is_download_mode)
        .collect();
    Ok(devices)
}

/// One-shot enumeration for a download-mode device
#[derive(Debug, Clone, Default)]
pub struct UsbProbe {
    config: UsbConfig,
}

impl UsbProbe {
    /// Create a probe with the given options
    pub fn new(config: UsbConfig) -> Self {
        Self { config }
    }

    /// Open the first attached download-mode device
    pub fn find(&self) -> Result<ExynosDevice> {
        let info = list_devices()?
            .into_iter()
            .next()
            .ok_or(UsbError::DeviceNotFound)?;
        ExynosDevice::open(&info, self.config)
    }
}

impl DeviceProbe for UsbProbe {
    type Device = ExynosDevice;

    fn probe(&mut self) -> hubble_core::Result<Option<ExynosDevice>> {
        match self.find() {
            Ok(device) => Ok(Some(device)),
            Err(UsbError::DeviceNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// An opened Exynos ROM in download mode
pub struct ExynosDevice {
    device: Device,
    config: UsbConfig,
}

impl ExynosDevice {
    /// Open the device described by `info`
    pub fn open(info: &DeviceInfo, config: UsbConfig) -> Result<Self> {
        log::info!(
            "Opening download mode device on bus {} address {}",
            info.bus_id(),
            info.device_address()
        );

        let device = info
            .open()
            .wait()
            .map_err(|e| UsbError::OpenFailed(e.to_string()))?;

        Ok(Self { device, config })
    }

    fn language(&self) -> u16 {
        match self
            .device
            .get_string_descriptor_supported_languages(DESCRIPTOR_TIMEOUT)
            .wait()
        {
            Ok(mut langs) => langs.next().unwrap_or(LANGUAGE_US_ENGLISH),
            Err(e) => {
                log::debug!("No language table ({}), assuming US English", e);
                LANGUAGE_US_ENGLISH
            }
        }
    }

    fn read_string(&self, index: Option<NonZeroU8>, language: u16) -> Result<String> {
        let Some(index) = index else {
            return Ok(String::new());
        };
        self.device
            .get_string_descriptor(index, language, DESCRIPTOR_TIMEOUT)
            .wait()
            .map_err(|e| UsbError::DescriptorFailed(format!("index {}: {}", index, e)))
    }

    fn interface_string_index(&self) -> Option<NonZeroU8> {
        let config = match self.device.active_configuration() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("No active configuration: {}", e);
                return None;
            }
        };
        let index = config
            .interface_alt_settings()
            .find(|alt| {
                alt.interface_number() == DOWNLOAD_INTERFACE && alt.alternate_setting() == 0
            })
            .and_then(|alt| alt.string_index());
        index
    }
}

impl DownloadDevice for ExynosDevice {
    type Port = ClaimedPort;

    fn identify(&mut self) -> hubble_core::Result<DeviceIdentity> {
        let descriptor = self.device.device_descriptor();
        let language = self.language();

        let product_index = descriptor
            .product_string_index()
            .ok_or_else(|| UsbError::DescriptorFailed("device has no product string".into()))?;

        let identity = DeviceIdentity {
            product: self.read_string(Some(product_index), language)?,
            serial: diagnostic_string(
                "serial",
                self.read_string(descriptor.serial_number_string_index(), language),
            ),
            interface: diagnostic_string(
                "interface",
                self.read_string(self.interface_string_index(), language),
            ),
        };

        log::debug!("Identity: {:?}", identity);
        Ok(identity)
    }

    fn open_for_transfer(&mut self) -> hubble_core::Result<ClaimedPort> {
        Ok(ClaimedPort::claim(&self.device, self.config)?)
    }
}

/// Serial and interface strings are display-only; a failed read leaves them empty
fn diagnostic_string(what: &str, read: Result<String>) -> String {
    read.unwrap_or_else(|e| {
        log::debug!("Could not read {} string: {}", what, e);
        String::new()
    })
}

/// Claimed download interface with its bulk OUT endpoint
///
/// The claim is released when the port is dropped.
pub struct ClaimedPort {
    out_ep: Endpoint<Bulk, Out>,
    _interface: Interface,
}

impl ClaimedPort {
    fn claim(device: &Device, config: UsbConfig) -> Result<Self> {
        let interface = if config.detach_kernel_driver {
            device.detach_and_claim_interface(DOWNLOAD_INTERFACE).wait()
        } else {
            device.claim_interface(DOWNLOAD_INTERFACE).wait()
        }
        .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Bulk, Out>(BULK_OUT_EP)
            .map_err(|e| UsbError::ClaimFailed(e.to_string()))?;

        log::debug!("Claimed interface {}", DOWNLOAD_INTERFACE);
        Ok(Self {
            out_ep,
            _interface: interface,
        })
    }

    /// Cancel anything still in flight and reap the completions
    fn drain_pending(&mut self) {
        if self.out_ep.pending() == 0 {
            return;
        }
        self.out_ep.cancel_all();
        while self.out_ep.pending() > 0 {
            if self.out_ep.wait_next_complete(CANCEL_TIMEOUT).is_none() {
                log::warn!("Cancelled transfer did not complete");
                break;
            }
        }
    }

    /// Write `data` as a single bulk transfer
    pub fn bulk_write(&mut self, data: &[u8]) -> Result<usize> {
        self.out_ep.submit(Buffer::from(data.to_vec()));

        let Some(completion) = self.out_ep.wait_next_complete(WRITE_TIMEOUT) else {
            self.drain_pending();
            return Err(UsbError::Timeout(data.len()));
        };
        completion
            .status
            .map_err(|e| UsbError::TransferFailed(e.to_string()))?;

        log::trace!("USB write {} of {} bytes", completion.actual_len, data.len());
        Ok(completion.actual_len)
    }
}

impl Transport for ClaimedPort {
    fn write(&mut self, data: &[u8]) -> hubble_core::Result<usize> {
        Ok(self.bulk_write(data)?)
    }

    fn close(mut self) -> hubble_core::Result<()> {
        self.drain_pending();
        log::debug!("Released interface {}", DOWNLOAD_INTERFACE);
        Ok(())
    }
}

impl Drop for ClaimedPort {
    fn drop(&mut self) {
        self.drain_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_default_follows_platform() {
        assert_eq!(UsbConfig::default().detach_kernel_driver, !cfg!(windows));
    }

    #[test]
    fn test_diagnostic_string_failure_is_empty() {
        let failed = Err(UsbError::DescriptorFailed("index 3: stall".into()));
        assert_eq!(diagnostic_string("serial", failed), "");
        assert_eq!(
            diagnostic_string("interface", Ok("Exynos9830: 0200".into())),
            "Exynos9830: 0200"
        );
    }

    #[test]
    fn test_probe_carries_config() {
        let config = UsbConfig {
            detach_kernel_driver: false,
        };
        assert_eq!(UsbProbe::new(config).config, config);
    }
}
