//! Synthetic cursor overlay.
//!
//! One overlay per page. The overlay is created lazily by the first action
//! that needs it and destroyed on cancellation. Its position persists between
//! actions until the next explicit move.

use std::sync::Arc;

use pagepilot_core_types::Point;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::HostError;
use crate::host::PageHost;

/// Fixed styling of the overlay element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub size_px: u32,
    pub idle_color: String,
    pub pressed_color: String,
    pub pulse_color: String,
    pub border: String,
    pub shadow: String,
    pub z_index: u32,
    pub transition: String,
    pub pressed_scale: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            size_px: 20,
            idle_color: "rgba(255, 0, 0, 0.7)".to_string(),
            pressed_color: "rgba(0, 255, 0, 0.8)".to_string(),
            pulse_color: "blue".to_string(),
            border: "2px solid white".to_string(),
            shadow: "0 0 10px rgba(0,0,0,0.5)".to_string(),
            z_index: 999_999,
            transition: "all 0.3s ease-out".to_string(),
            pressed_scale: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorVisual {
    #[default]
    Idle,
    Pressed,
    /// Secondary-click colour pulse
    Pulse,
}

/// Everything a host needs to draw the overlay in its current state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayFrame {
    /// `None` until the first explicit move
    pub position: Option<Point>,
    pub color: String,
    pub scale: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorState {
    pub position: Option<Point>,
    pub visual: CursorVisual,
    pub label: Option<String>,
    pub exists: bool,
}

pub struct CursorOverlay {
    host: Arc<dyn PageHost>,
    style: OverlayStyle,
    state: Mutex<CursorState>,
}

impl CursorOverlay {
    pub fn new(host: Arc<dyn PageHost>, style: OverlayStyle) -> Self {
        Self {
            host,
            style,
            state: Mutex::new(CursorState::default()),
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn state(&self) -> CursorState {
        self.state.lock().clone()
    }

    /// Current pointer position; an overlay that was never moved sits at the
    /// origin.
    pub fn position(&self) -> Point {
        self.state.lock().position.unwrap_or_default()
    }

    /// Create the overlay if it does not exist yet.
    pub async fn ensure(&self) -> Result<(), HostError> {
        {
            let mut state = self.state.lock();
            if state.exists {
                return Ok(());
            }
            state.exists = true;
        }

        debug!("mounting cursor overlay");
        if let Err(err) = self.host.mount_overlay(&self.style).await {
            self.state.lock().exists = false;
            return Err(err);
        }
        self.render().await
    }

    pub async fn move_to(&self, point: Point) -> Result<(), HostError> {
        self.ensure().await?;
        self.state.lock().position = Some(point);
        self.render().await
    }

    /// Tag the cursor with an identifier for observability
    pub async fn set_label(&self, label: Option<String>) -> Result<(), HostError> {
        self.ensure().await?;
        self.state.lock().label = label;
        self.render().await
    }

    pub async fn set_pressed(&self, pressed: bool) -> Result<(), HostError> {
        if pressed {
            self.set_visual(CursorVisual::Pressed).await
        } else {
            self.restore_idle().await
        }
    }

    pub async fn set_pulse(&self, on: bool) -> Result<(), HostError> {
        if on {
            self.set_visual(CursorVisual::Pulse).await
        } else {
            self.restore_idle().await
        }
    }

    /// Return to the idle visual. A destroyed overlay stays destroyed.
    pub async fn restore_idle(&self) -> Result<(), HostError> {
        {
            let mut state = self.state.lock();
            if !state.exists {
                return Ok(());
            }
            state.visual = CursorVisual::Idle;
        }
        self.render().await
    }

    /// Remove the overlay and forget its state. Returns whether an overlay
    /// was actually removed.
    pub async fn destroy(&self) -> Result<bool, HostError> {
        let existed = {
            let mut state = self.state.lock();
            let existed = state.exists;
            *state = CursorState::default();
            existed
        };

        if existed {
            debug!("removing cursor overlay");
            self.host.unmount_overlay().await?;
        }
        Ok(existed)
    }

    async fn set_visual(&self, visual: CursorVisual) -> Result<(), HostError> {
        self.ensure().await?;
        self.state.lock().visual = visual;
        self.render().await
    }

    fn frame(&self) -> Option<OverlayFrame> {
        let state = self.state.lock();
        if !state.exists {
            return None;
        }
        let (color, scale) = match state.visual {
            CursorVisual::Idle => (&self.style.idle_color, 1.0),
            CursorVisual::Pressed => (&self.style.pressed_color, self.style.pressed_scale),
            CursorVisual::Pulse => (&self.style.pulse_color, 1.0),
        };
        Some(OverlayFrame {
            position: state.position,
            color: color.clone(),
            scale,
            label: state.label.clone(),
        })
    }

    async fn render(&self) -> Result<(), HostError> {
        match self.frame() {
            Some(frame) => self.host.render_overlay(&frame).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryPage, PageEffect};

    fn overlay() -> (Arc<MemoryPage>, CursorOverlay) {
        let page = Arc::new(MemoryPage::default());
        let overlay = CursorOverlay::new(page.clone(), OverlayStyle::default());
        (page, overlay)
    }

    #[tokio::test]
    async fn ensure_mounts_once() {
        let (page, overlay) = overlay();
        overlay.ensure().await.unwrap();
        overlay.ensure().await.unwrap();
        let mounts = page
            .journal()
            .iter()
            .filter(|e| matches!(e, PageEffect::OverlayMounted))
            .count();
        assert_eq!(mounts, 1);
        assert!(overlay.state().exists);
    }

    #[tokio::test]
    async fn position_persists_until_next_move() {
        let (page, overlay) = overlay();
        overlay.move_to(Point::new(40.0, 60.0)).await.unwrap();
        overlay.set_pressed(true).await.unwrap();
        overlay.set_pressed(false).await.unwrap();
        assert_eq!(overlay.position(), Point::new(40.0, 60.0));
        assert_eq!(
            page.overlay().and_then(|frame| frame.position),
            Some(Point::new(40.0, 60.0))
        );
    }

    #[tokio::test]
    async fn pressed_frame_uses_pressed_style() {
        let (page, overlay) = overlay();
        overlay.set_pressed(true).await.unwrap();
        let frame = page.overlay().unwrap();
        assert_eq!(frame.color, OverlayStyle::default().pressed_color);
        assert_eq!(frame.scale, 0.8);
    }

    #[tokio::test]
    async fn revert_after_destroy_does_not_remount() {
        let (page, overlay) = overlay();
        overlay.set_pressed(true).await.unwrap();
        assert!(overlay.destroy().await.unwrap());

        overlay.restore_idle().await.unwrap();
        overlay.set_pulse(false).await.unwrap();

        assert!(page.overlay().is_none());
        assert!(!overlay.state().exists);
        let mounts = page
            .journal()
            .iter()
            .filter(|e| matches!(e, PageEffect::OverlayMounted))
            .count();
        assert_eq!(mounts, 1);
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let (page, overlay) = overlay();
        assert!(!overlay.destroy().await.unwrap());
        overlay.move_to(Point::new(1.0, 1.0)).await.unwrap();
        assert!(overlay.destroy().await.unwrap());
        assert!(!overlay.destroy().await.unwrap());
        assert!(page.overlay().is_none());
        assert_eq!(overlay.state(), CursorState::default());
        assert_eq!(overlay.position(), Point::default());
    }
}
