//! Live textual status for an image display.
//!
//! The panel maintains four label texts (pixel intensity under the cursor,
//! frames per second, countdown to the next frame, and a free-text status
//! line) and keeps them current by consuming [`DisplayEvent`]s on a single
//! task. Event handling never propagates errors: a failed store lookup or an
//! out-of-bounds cursor is logged and leaves the affected label blank, so a
//! misbehaving acquisition cannot take the display down with it.

use crate::data::coords::{self, Coords};
use crate::data::store::ImageStore;
use crate::events::{DisplayEvent, EventBus};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// The four label texts rendered atop an image display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelLabels {
    /// `x=…, y=…, value=…` for the pixel under the cursor.
    pub pixel_info: String,
    /// Data/display frame-rate summary.
    pub fps: String,
    /// Countdown to the next scheduled frame.
    pub countdown: String,
    /// Free-text status line.
    pub status: String,
}

/// Event-driven status panel for one image display.
pub struct StatusPanel {
    store: Arc<RwLock<ImageStore>>,
    events: broadcast::Receiver<DisplayEvent>,
    labels: watch::Sender<PanelLabels>,
    // Last known mouse position, in image pixels.
    mouse_x: i64,
    mouse_y: i64,
    // Coords of the image currently shown by the display.
    display_position: Coords,
}

impl StatusPanel {
    /// Create a panel subscribed to `bus`, returning it alongside the label
    /// watch handle a frontend renders from.
    pub fn new(
        store: Arc<RwLock<ImageStore>>,
        bus: &EventBus,
    ) -> (Self, watch::Receiver<PanelLabels>) {
        let (labels, labels_rx) = watch::channel(PanelLabels::default());
        let panel = Self {
            store,
            events: bus.subscribe(),
            labels,
            mouse_x: 0,
            mouse_y: 0,
            display_position: Coords::default(),
        };
        (panel, labels_rx)
    }

    /// Create a panel and spawn its event loop.
    pub fn spawn(
        store: Arc<RwLock<ImageStore>>,
        bus: &EventBus,
    ) -> (JoinHandle<()>, watch::Receiver<PanelLabels>) {
        let (panel, labels_rx) = Self::new(store, bus);
        (tokio::spawn(panel.run()), labels_rx)
    }

    /// Consume events until the bus closes.
    ///
    /// A lagged receiver (the panel fell behind the bus capacity) is logged
    /// and skipped over; the next refresh repairs the labels.
    pub async fn run(mut self) {
        loop {
            match self.events.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "status panel lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("status panel event loop finished");
    }

    /// Apply one event to the label state.
    pub async fn handle_event(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::MouseMoved { x, y } => {
                self.mouse_x = x;
                self.mouse_y = y;
                self.refresh_pixel_info().await;
            }
            DisplayEvent::NewImage(image) => {
                // Only worth refreshing when the remembered cursor position
                // actually lies within the arriving image.
                if self.mouse_x >= 0
                    && (self.mouse_x as u64) < u64::from(image.width())
                    && self.mouse_y >= 0
                    && (self.mouse_y as u64) < u64::from(image.height())
                {
                    self.refresh_pixel_info().await;
                }
            }
            DisplayEvent::DisplayPosition(position) => {
                self.display_position = position;
                self.refresh_pixel_info().await;
            }
            DisplayEvent::FpsUpdate {
                data_fps,
                display_fps,
            } => {
                let text = if data_fps != 0.0 {
                    format!("FPS: {data_fps:.1} (display {display_fps:.1})")
                } else if display_fps != 0.0 {
                    format!("Display FPS: {display_fps:.1}")
                } else {
                    String::new()
                };
                self.labels.send_modify(|labels| labels.fps = text);
            }
            DisplayEvent::Countdown { seconds_remaining } => {
                let text = if seconds_remaining > 0.0 {
                    format!("Next image: {}", elapsed_time_display_string(seconds_remaining))
                } else {
                    String::new()
                };
                self.labels.send_modify(|labels| labels.countdown = text);
            }
            DisplayEvent::Status(text) => {
                self.labels.send_modify(|labels| labels.status = text);
            }
        }
    }

    async fn refresh_pixel_info(&mut self) {
        let value = self.intensity_string(self.mouse_x, self.mouse_y).await;
        let text = format!("x={}, y={}, value={}", self.mouse_x, self.mouse_y, value);
        self.labels.send_modify(|labels| labels.pixel_info = text);
    }

    /// Intensity text for the pixel under the cursor.
    ///
    /// With more than one channel in the store, each channel's intensity is
    /// rendered between brackets, slash-separated; a channel whose image has
    /// not arrived yet contributes an empty segment. Lookup failures are
    /// logged and yield an empty string.
    pub async fn intensity_string(&self, x: i64, y: i64) -> String {
        let (px, py) = match (u32::try_from(x), u32::try_from(y)) {
            (Ok(px), Ok(py)) => (px, py),
            _ => {
                debug!(x, y, "cursor outside the canvas");
                return String::new();
            }
        };
        let store = self.store.read().await;
        let num_channels = store.axis_length(coords::CHANNEL);
        if num_channels > 1 {
            let mut parts = Vec::with_capacity(num_channels);
            for channel in 0..num_channels {
                let at = self
                    .display_position
                    .copy_builder()
                    .channel(channel)
                    .build();
                // The image can be missing if not all channels for this
                // imaging event have arrived yet.
                let part = match store.get_image(&at) {
                    Some(image) => match image.intensity_string_at(px, py) {
                        Ok(text) => text,
                        Err(err) => {
                            error!(%err, "Failed to get image pixel info");
                            String::new()
                        }
                    },
                    None => String::new(),
                };
                parts.push(part);
            }
            format!("[{}]", parts.join("/"))
        } else {
            let Some(image) = store.get_image(&self.display_position) else {
                return String::new();
            };
            match image.intensity_string_at(px, py) {
                Ok(text) => text,
                Err(err) => {
                    error!(%err, "Invalid pixel coordinates {px}, {py}");
                    String::new()
                }
            }
        }
    }
}

/// Render an elapsed or remaining time in seconds for a label.
///
/// Uses `"12.34s"` up to a minute, `"12m 34.56s"` up to an hour, and
/// `"1h 23m 45s"` beyond that; fractional seconds are dropped once hours are
/// involved or when they round below a hundredth.
pub fn elapsed_time_display_string(seconds: f64) -> String {
    let whole_seconds = seconds.max(0.0).floor() as u64;
    let fraction = seconds.max(0.0) - whole_seconds as f64;

    let hours = whole_seconds / 3600;
    let minutes = (whole_seconds % 3600) / 60;
    let secs = whole_seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    if hours == 0 && fraction > 0.01 {
        out.push_str(&format!("{:.2}s", secs as f64 + fraction));
    } else {
        out.push_str(&format!("{secs}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::image::{gray8, Image};
    use crate::data::metadata::Metadata;
    use tracing_test::traced_test;

    fn panel_with_store(store: ImageStore) -> (StatusPanel, watch::Receiver<PanelLabels>) {
        let bus = EventBus::new(8);
        StatusPanel::new(Arc::new(RwLock::new(store)), &bus)
    }

    fn single_channel_store() -> ImageStore {
        let mut store = ImageStore::new();
        let image = gray8(2, 2, vec![10, 20, 30, 40])
            .copy_at_coords(Coords::builder().time(0).build());
        store.put_image(image).unwrap();
        store
    }

    #[tokio::test]
    async fn mouse_move_formats_pixel_info() {
        let (mut panel, labels) = panel_with_store(single_channel_store());
        panel.display_position = Coords::builder().time(0).build();
        panel
            .handle_event(DisplayEvent::MouseMoved { x: 1, y: 0 })
            .await;
        assert_eq!(labels.borrow().pixel_info, "x=1, y=0, value=20");
    }

    #[tokio::test]
    #[traced_test]
    async fn out_of_bounds_cursor_leaves_value_blank() {
        let (mut panel, labels) = panel_with_store(single_channel_store());
        panel.display_position = Coords::builder().time(0).build();
        panel
            .handle_event(DisplayEvent::MouseMoved { x: 5, y: 5 })
            .await;
        assert_eq!(labels.borrow().pixel_info, "x=5, y=5, value=");
        // The failure is logged, never propagated.
        assert!(logs_contain("Invalid pixel coordinates"));
    }

    #[tokio::test]
    async fn missing_image_yields_empty_value() {
        let (mut panel, labels) = panel_with_store(ImageStore::new());
        panel
            .handle_event(DisplayEvent::MouseMoved { x: 0, y: 0 })
            .await;
        assert_eq!(labels.borrow().pixel_info, "x=0, y=0, value=");
    }

    #[tokio::test]
    async fn multi_channel_intensities_are_bracketed() {
        let mut store = ImageStore::new();
        for (channel, base) in [(0u8, 10u8), (1, 50)] {
            let image = gray8(2, 1, vec![base, base + 1]).copy_at_coords(
                Coords::builder().time(0).channel(channel as usize).build(),
            );
            store.put_image(image).unwrap();
        }
        let (mut panel, labels) = panel_with_store(store);
        panel.display_position = Coords::builder().time(0).channel(0).build();
        panel
            .handle_event(DisplayEvent::MouseMoved { x: 1, y: 0 })
            .await;
        assert_eq!(labels.borrow().pixel_info, "x=1, y=0, value=[11/51]");
    }

    #[tokio::test]
    async fn channels_not_yet_arrived_contribute_empty_segments() {
        let mut store = ImageStore::new();
        // Channel 2 exists, channels 0 and 1 have not arrived.
        let image = gray8(1, 1, vec![77])
            .copy_at_coords(Coords::builder().time(0).channel(2).build());
        store.put_image(image).unwrap();
        let (mut panel, labels) = panel_with_store(store);
        panel.display_position = Coords::builder().time(0).channel(0).build();
        panel
            .handle_event(DisplayEvent::MouseMoved { x: 0, y: 0 })
            .await;
        assert_eq!(labels.borrow().pixel_info, "x=0, y=0, value=[//77]");
    }

    #[tokio::test]
    async fn new_image_refreshes_only_when_cursor_in_bounds() {
        let (mut panel, labels) = panel_with_store(single_channel_store());
        panel.display_position = Coords::builder().time(0).build();
        panel.mouse_x = 1;
        panel.mouse_y = 1;
        let image = Arc::new(
            Image::new(
                vec![1u8, 2, 3, 4],
                2,
                2,
                1,
                1,
                Coords::builder().time(1).build(),
                Metadata::default(),
            )
            .unwrap(),
        );
        panel
            .handle_event(DisplayEvent::NewImage(Arc::clone(&image)))
            .await;
        assert_eq!(labels.borrow().pixel_info, "x=1, y=1, value=40");

        // Cursor outside the arriving image: no refresh.
        panel.mouse_x = 10;
        panel.handle_event(DisplayEvent::NewImage(image)).await;
        assert_eq!(labels.borrow().pixel_info, "x=1, y=1, value=40");
    }

    #[tokio::test]
    async fn fps_label_follows_event_contents() {
        let (mut panel, labels) = panel_with_store(ImageStore::new());
        panel
            .handle_event(DisplayEvent::FpsUpdate {
                data_fps: 30.25,
                display_fps: 14.9,
            })
            .await;
        assert_eq!(labels.borrow().fps, "FPS: 30.2 (display 14.9)");

        panel
            .handle_event(DisplayEvent::FpsUpdate {
                data_fps: 0.0,
                display_fps: 14.9,
            })
            .await;
        assert_eq!(labels.borrow().fps, "Display FPS: 14.9");

        panel
            .handle_event(DisplayEvent::FpsUpdate {
                data_fps: 0.0,
                display_fps: 0.0,
            })
            .await;
        assert_eq!(labels.borrow().fps, "");
    }

    #[tokio::test]
    async fn countdown_and_status_labels() {
        let (mut panel, labels) = panel_with_store(ImageStore::new());
        panel
            .handle_event(DisplayEvent::Countdown {
                seconds_remaining: 2.5,
            })
            .await;
        assert_eq!(labels.borrow().countdown, "Next image: 2.50s");
        panel
            .handle_event(DisplayEvent::Countdown {
                seconds_remaining: 0.0,
            })
            .await;
        assert_eq!(labels.borrow().countdown, "");

        panel
            .handle_event(DisplayEvent::Status("Acquisition running".into()))
            .await;
        assert_eq!(labels.borrow().status, "Acquisition running");
    }

    #[test]
    fn elapsed_time_formats() {
        assert_eq!(elapsed_time_display_string(12.34), "12.34s");
        assert_eq!(elapsed_time_display_string(59.0), "59s");
        assert_eq!(elapsed_time_display_string(754.56), "12m 34.56s");
        assert_eq!(elapsed_time_display_string(5025.0), "1h 23m 45s");
        assert_eq!(elapsed_time_display_string(0.0), "0s");
    }
}
