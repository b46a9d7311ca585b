//! ntfsalvage - NTFS deleted file recovery
//!
//! Drives one scan/recovery pass over a device, partition image, or
//! isolated `$MFT` file and prints a per-file status line plus a final
//! summary. See `ntfsalvage::application::ScanUseCase` for the core.

use anyhow::{Context, Result};
use clap::Parser;
use ntfsalvage::application::dto::{Config, FileEvent, ScanSummary};
use ntfsalvage::application::ScanUseCase;
use ntfsalvage::domain::repositories::{BlockDeviceReader, RecoveredFileWriter};
use ntfsalvage::infrastructure::block_device::{LinuxBlockDevice, MmapBlockDevice};
use ntfsalvage::infrastructure::mime::load_mime_types;
use ntfsalvage::infrastructure::persistence::LocalFileWriter;
use ntfsalvage::presentation::cli::{Cli, ScanProgressBar, StatusLineObserver};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level())).init();

    let mut config = cli.to_config();
    if let Some(path) = &cli.mime_types_path {
        config.mime_types = load_mime_types(path)
            .with_context(|| format!("failed to load MIME types from {}", path.display()))?;
    }

    let writer = Arc::new(
        LocalFileWriter::new(config.target_dir.clone())
            .with_context(|| format!("failed to prepare target directory {}", config.target_dir.display()))?,
    );

    let summary = if cli.mmap {
        let device = Arc::new(
            MmapBlockDevice::open(&cli.device)
                .with_context(|| format!("failed to map device {}", cli.device))?,
        );
        run_scan(&cli, &config, device, writer)?
    } else {
        let device = Arc::new(
            LinuxBlockDevice::open(&cli.device)
                .with_context(|| format!("failed to open device {}", cli.device))?,
        );
        run_scan(&cli, &config, device, writer)?
    };

    print_summary(&summary, &config);

    Ok(())
}

/// Opens the status-line observer and progress bar around one
/// [`ScanUseCase::execute`] call, generic over which
/// [`BlockDeviceReader`] backs `device`.
fn run_scan<R, W>(cli: &Cli, config: &Config, device: Arc<R>, writer: Arc<W>) -> Result<ScanSummary>
where
    R: BlockDeviceReader + 'static,
    W: RecoveredFileWriter + 'static,
{
    log::info!(
        "scanning {} ({} bytes), recover={}, target={}",
        cli.device,
        device.size(),
        config.recover,
        config.target_dir.display()
    );

    let observer = StatusLineObserver::new(config.show_all);
    let sector_size = device.device_info()?.sector_size.max(1) as u64;
    let progress = ScanProgressBar::new(device.size() / sector_size);
    let progress_for_callback = progress.clone();
    let confirm_anomalies = config.confirm_anomalies;
    let callback: Arc<dyn Fn(&FileEvent) + Send + Sync> = Arc::new(move |event| {
        progress_for_callback.update(event);
        if let Some(line) = observer.line_for(event) {
            progress_for_callback.println(&line);
        }
        if confirm_anomalies && StatusLineObserver::is_anomaly(event.state) {
            progress_for_callback.println("press enter to continue, or ctrl-c to stop...");
            let mut discard = String::new();
            let _ = std::io::stdin().read_line(&mut discard);
        }
    });

    let summary = ScanUseCase::new().execute(device, writer, config, Some(callback))?;
    progress.finish();
    Ok(summary)
}

fn print_summary(summary: &ntfsalvage::application::dto::ScanSummary, config: &Config) {
    println!();
    println!("records scanned:       {}", summary.records_scanned);
    println!("directories seen:      {}", summary.directories_seen);
    println!("files recovered:       {}", summary.files_recovered);
    println!("already present:       {}", summary.files_already_existing);
    println!("skipped (deleted):     {}", summary.files_skipped_deleted);
    println!("skipped (filtered):    {}", summary.files_skipped_filtered);
    println!("skipped (recycle bin): {}", summary.files_skipped_recycle_bin);
    println!("corrupt records:       {}", summary.files_corrupt);
    println!("bytes written:         {}", summary.bytes_written);
    println!("elapsed:               {:.2?}", summary.duration);
    if !config.recover {
        println!("\n(dry run: pass -R to perform recovery)");
    }
}
