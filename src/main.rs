//! hubble - USB recovery tool for Exynos devices
//!
//! Boots a device with a wiped bootloader back into download mode by sending
//! the stock boot stages over the ROM's USB download protocol:
//!
//! 1. wait for a download-mode device (VID:04e8 PID:1234) to enumerate
//! 2. read its product string and match a SoC profile
//! 3. stage the profile's members out of the BL tar
//! 4. send the boot image regions, then the flash files
//! 5. delete the staged files
//!
//! The device side lives in `hubble-usb`, the archive side in
//! `hubble-staging`; `hubble-core` drives the session.

mod cli;
mod progress;

use std::fs;
use std::path::Path;

use clap::Parser;
use cli::Cli;
use hubble_core::poll::ThreadSleeper;
use hubble_core::profile::ProfileRegistry;
use hubble_core::session::Session;
use hubble_staging::TarStager;
use hubble_usb::UsbProbe;
use progress::ConsoleProgress;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let registry = match load_registry(cli.profiles.as_deref()) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to load SoC profiles: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("Loaded {} SoC profiles", registry.len());

    if cli.list_socs {
        list_socs(&registry);
        return Ok(());
    }

    print_banner();

    let Some(bl_tar) = cli.bl_tar else {
        eprintln!("Error: no BL tar given (use -b/--bl-tar)");
        std::process::exit(1);
    };
    if !bl_tar.is_file() {
        eprintln!(
            "Error: The file {} does not exist or is not a valid file.",
            bl_tar.display()
        );
        std::process::exit(1);
    }
    println!("Using file: {}", bl_tar.display());

    fs::create_dir_all(&cli.work_dir)?;

    let mut probe = UsbProbe::default();
    let mut stager = TarStager::new(bl_tar, cli.work_dir);
    let mut progress = ConsoleProgress::new();
    let mut session = Session::new(&registry);

    match session.run(&mut probe, &mut stager, &mut ThreadSleeper, &mut progress) {
        Ok(report) => {
            log::info!(
                "Sent {} blocks ({} bytes) to {}",
                report.stats.blocks,
                report.stats.bytes,
                report.identity.soc_name()
            );
            if !report.cleanup_errors.is_empty() {
                println!(
                    "{} staged file(s) could not be deleted",
                    report.cleanup_errors.len()
                );
            }
            println!();
            println!(
                "You should be in download mode now, please reflash the stock firmware \
                 as the bootloader will still be wiped."
            );
            Ok(())
        }
        Err(e) => {
            let stage = session.failed_stage().unwrap_or(session.stage());
            eprintln!("{} failed: {}", stage, e);
            eprintln!("Re-enter download mode and run again.");
            std::process::exit(1);
        }
    }
}

/// Built-in profiles, plus the user's file if one was given
fn load_registry(extra: Option<&Path>) -> hubble_core::Result<ProfileRegistry> {
    let mut registry = ProfileRegistry::builtin()?.clone();
    if let Some(path) = extra {
        let added = registry.load_file(path)?;
        log::info!("Loaded {} extra SoC profiles from {}", added, path.display());
    }
    Ok(registry)
}

fn list_socs(registry: &ProfileRegistry) {
    println!("Supported SoCs:");
    for profile in registry.iter() {
        println!(
            "  {:<12} {} regions from {}, {} flash file(s)",
            profile.display_name(),
            profile.regions.len(),
            profile.boot_image,
            profile.flash_files.len()
        );
    }
}

fn print_banner() {
    println!("USB Recovery Tool");
    println!("Version {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Notice: This program and its source code is licensed under GPL 2.0.");
    println!();
    println!("Notice: If you have paid for this, you have been scammed!");
    println!("Please issue a refund and get the official program from");
    println!("https://github.com/halal-beef/hubble-usb-recovery-tool");
    println!();
}
