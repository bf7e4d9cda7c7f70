//! CLI entry point for rust-scope.
//!
//! Wires the core library together into a small demonstration: it loads the
//! configuration, initializes tracing, then runs a simulated acquisition
//! that feeds synthetic camera frames through the tagged-image decoder into
//! the store while the status panel consumes the matching display events.
//!
//! # Usage
//!
//! ```bash
//! rust_scope --config config/scope.toml --frames 20
//! ```

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use rust_scope::config::{AcquisitionConfig, ScopeConfig};
use rust_scope::data::tagged::{tags, TaggedImage};
use rust_scope::data::{Image, ImageStore, PixelBuffer, PixelType};
use rust_scope::display::StatusPanel;
use rust_scope::events::{DisplayEvent, EventBus};
use rust_scope::tracing_setup;
use serde_json::Map;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "rust-scope")]
#[command(about = "Microscopy data & display core with a simulated acquisition", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config/scope.toml")]
    config: PathBuf,

    /// Override the number of frames to acquire
    #[arg(long)]
    frames: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("🔬 rust-scope: microscopy data & display core");
    println!();

    let cli = Cli::parse();
    let mut config = ScopeConfig::load_from(&cli.config)?;
    if let Some(frames) = cli.frames {
        config.acquisition.frames = frames;
    }
    config.validate()?;
    tracing_setup::init_from_config(&config)?;

    info!(
        camera = %config.acquisition.camera,
        frames = config.acquisition.frames,
        "starting simulated acquisition"
    );

    let store = Arc::new(RwLock::new(ImageStore::new()));
    let bus = EventBus::new(config.display.event_capacity);
    let (panel_task, mut labels) = StatusPanel::spawn(Arc::clone(&store), &bus);

    // Echo label changes the way a rendering frontend would.
    let echo_task = tokio::spawn(async move {
        while labels.changed().await.is_ok() {
            let snapshot = labels.borrow_and_update().clone();
            info!(
                pixel = %snapshot.pixel_info,
                fps = %snapshot.fps,
                countdown = %snapshot.countdown,
                status = %snapshot.status,
                "display labels"
            );
        }
    });

    bus.publish(DisplayEvent::Status("Acquisition running".to_string()));
    let interval = Duration::from_millis(config.acquisition.interval_ms);
    let started = Instant::now();

    for frame in 0..config.acquisition.frames {
        let tagged = mock_tagged_frame(&config.acquisition, frame)?;
        let image = Image::from_tagged(&tagged)?;
        let stored = store.write().await.put_image(image)?;

        bus.publish(DisplayEvent::DisplayPosition(stored.coords().clone()));
        bus.publish(DisplayEvent::NewImage(Arc::clone(&stored)));
        bus.publish(DisplayEvent::MouseMoved {
            x: i64::from(config.acquisition.width / 2),
            y: i64::from(config.acquisition.height / 2),
        });

        let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
        bus.publish(DisplayEvent::FpsUpdate {
            data_fps: (frame + 1) as f64 / elapsed,
            display_fps: (frame + 1) as f64 / elapsed,
        });
        if config.display.countdown_enabled {
            bus.publish(DisplayEvent::Countdown {
                seconds_remaining: interval.as_secs_f64(),
            });
        }

        tokio::time::sleep(interval).await;
    }

    store.write().await.freeze();
    bus.publish(DisplayEvent::Countdown {
        seconds_remaining: 0.0,
    });
    bus.publish(DisplayEvent::Status("Acquisition finished".to_string()));

    // Dropping the bus closes the broadcast channel once the panel has
    // drained it, letting the panel task finish cleanly.
    drop(bus);
    panel_task.await?;
    echo_task.await?;

    let frames_stored = store.read().await.len();
    println!();
    println!("✅ Acquisition complete: {frames_stored} frames stored");
    Ok(())
}

/// Synthesize one hardware-style tagged frame: a diagonal gradient that
/// drifts with the frame index, plus a little noise.
fn mock_tagged_frame(acquisition: &AcquisitionConfig, frame: usize) -> Result<TaggedImage> {
    let pixel_type = PixelType::from_tag_name(&acquisition.pixel_type)?;
    let (width, height) = (acquisition.width, acquisition.height);
    let mut rng = rand::thread_rng();

    let gradient =
        |x: u32, y: u32| -> u64 { (u64::from(x) + u64::from(y) + frame as u64) % 256 };

    let pixels: PixelBuffer = match pixel_type {
        PixelType::Gray8 => {
            let mut data = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    let noise: u8 = rng.gen_range(0..8);
                    data.push((gradient(x, y) as u8).saturating_add(noise));
                }
            }
            data.into()
        }
        PixelType::Gray16 => {
            let mut data = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    let noise: u16 = rng.gen_range(0..2048);
                    data.push((gradient(x, y) as u16 * 257).saturating_add(noise));
                }
            }
            data.into()
        }
        PixelType::Rgb32 => {
            let mut data = Vec::with_capacity((width * height * 4) as usize);
            for y in 0..height {
                for x in 0..width {
                    let base = gradient(x, y) as u8;
                    data.extend_from_slice(&[base, base / 2, 255 - base, 0]);
                }
            }
            data.into()
        }
    };

    let bit_depth = match pixel_type {
        PixelType::Gray16 => 16,
        PixelType::Gray8 | PixelType::Rgb32 => 8,
    };

    let mut tag_map = Map::new();
    tag_map.insert(tags::WIDTH.into(), width.into());
    tag_map.insert(tags::HEIGHT.into(), height.into());
    tag_map.insert(tags::PIXEL_TYPE.into(), pixel_type.tag_name().into());
    tag_map.insert(tags::FRAME_INDEX.into(), (frame as u64).into());
    tag_map.insert(tags::CHANNEL_INDEX.into(), 0u64.into());
    tag_map.insert(tags::CAMERA.into(), acquisition.camera.as_str().into());
    tag_map.insert(tags::BIT_DEPTH.into(), bit_depth.into());
    tag_map.insert(
        tags::EXPOSURE_MS.into(),
        (acquisition.interval_ms as f64).into(),
    );
    tag_map.insert(
        tags::RECEIVED_TIME.into(),
        chrono::Utc::now().to_rfc3339().into(),
    );

    Ok(TaggedImage {
        pixels,
        tags: tag_map,
    })
}
