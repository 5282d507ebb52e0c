//! Console rendering of session progress

use std::time::Duration;

use hubble_core::block::Block;
use hubble_core::device::DeviceIdentity;
use hubble_core::poll::PollEvent;
use hubble_core::transfer::{Stage, TransferProgress};
use hubble_core::Error;
use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(120);

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(TICK);
    pb
}

/// Prints stage labels and shows a spinner while waiting on the device
#[derive(Default)]
pub struct ConsoleProgress {
    current: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn abandon(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.abandon();
        }
    }
}

impl TransferProgress for ConsoleProgress {
    fn stage(&mut self, stage: Stage) {
        match stage {
            Stage::Discovering => {
                self.current = Some(spinner(stage.to_string()));
            }
            Stage::Identifying => self.finish("Found device."),
            Stage::Staging => {
                println!("{}...", stage);
            }
            Stage::SendingRegions => {
                println!();
                println!("Starting USB booting...");
                println!();
            }
            Stage::Cleanup => {
                println!("{}...", stage);
            }
            Stage::Aborted => self.abandon(),
            Stage::Idle | Stage::SendingFlashFiles | Stage::Done => {}
        }
    }

    fn poll(&mut self, event: PollEvent) {
        let Some(pb) = &self.current else {
            return;
        };
        match event {
            PollEvent::Miss(misses) => {
                pb.set_message(format!("Waiting for device ({} attempts)", misses));
            }
            PollEvent::Hint => {
                pb.println("Tip: Plug in your device with the power button pressed.");
            }
        }
    }

    fn identified(&mut self, identity: &DeviceIdentity) {
        println!();
        println!("======== Device Information ========");
        println!("         SoC: {}", identity.soc_name());
        println!("         SoC ID: {}", identity.soc_id());
        println!("         Chip ID: {}", identity.chip_id());
        println!("         USB Booting Version: {}", identity.booting_version());
        println!();
    }

    fn sending(&mut self, label: &str, block: &Block) {
        self.current = Some(spinner(format!(
            "{}: {} bytes to 0x{:08X}, checksum {:04X}",
            label,
            block.len(),
            block.address(),
            block.checksum()
        )));
    }

    fn sent(&mut self, label: &str, written: usize) {
        self.finish(&format!("{}: {} bytes written", label, written));
    }

    fn cleanup_failed(&mut self, error: &Error) {
        eprintln!("Warning: {}", error);
    }
}
