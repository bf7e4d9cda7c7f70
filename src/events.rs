//! Application-wide display events.
//!
//! The acquisition side and input layer publish events onto a broadcast
//! channel; each display component runs a single consumer task that applies
//! them in arrival order. This replaces implicit UI-thread affinity with an
//! explicit queue per component: senders never block on slow consumers, and
//! a consumer that falls behind observes a lag notification rather than
//! corrupting shared state.

use crate::data::coords::Coords;
use crate::data::image::Image;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Events consumed by display components.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    /// A new image has been made available in the store.
    NewImage(Arc<Image>),
    /// The cursor moved over the display canvas. Coordinates are signed:
    /// the cursor can sit outside the image area.
    MouseMoved {
        /// Cursor column, in image pixels.
        x: i64,
        /// Cursor row, in image pixels.
        y: i64,
    },
    /// The displayed position within the acquisition changed.
    DisplayPosition(Coords),
    /// Fresh frames-per-second figures.
    FpsUpdate {
        /// Rate at which data arrives from the hardware.
        data_fps: f64,
        /// Rate at which the display repaints.
        display_fps: f64,
    },
    /// Time remaining until the next scheduled frame.
    Countdown {
        /// Seconds until the next frame; zero or less clears the label.
        seconds_remaining: f64,
    },
    /// Free-text status line.
    Status(String),
}

/// Broadcast fan-out for [`DisplayEvent`]s.
///
/// Cloning the bus clones the sending side; every call to
/// [`subscribe`](EventBus::subscribe) produces an independent receiver that
/// sees all events published after the call.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DisplayEvent>,
}

impl EventBus {
    /// Create a bus whose per-subscriber queue holds `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers the event reached. Publishing with
    /// no subscribers is not an error; events simply have no audience yet.
    pub fn publish(&self, event: DisplayEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("display event dropped: no subscribers");
                0
            }
        }
    }

    /// Register a new consumer.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(DisplayEvent::Status("armed".into())), 1);
        match rx.recv().await {
            Ok(DisplayEvent::Status(text)) => assert_eq!(text, "armed"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(DisplayEvent::MouseMoved { x: 1, y: 2 }), 0);
    }

    #[tokio::test]
    async fn each_subscriber_sees_every_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(DisplayEvent::FpsUpdate {
            data_fps: 30.0,
            display_fps: 15.0,
        });
        for rx in [&mut a, &mut b] {
            assert!(matches!(
                rx.recv().await,
                Ok(DisplayEvent::FpsUpdate { .. })
            ));
        }
    }
}
