//! The page seam.
//!
//! [`PageHost`] lists every effect the interpreter can have on a page. Hosts
//! apply effects only; sequencing, delays and error absorption live in the
//! interpreter.

use async_trait::async_trait;
use pagepilot_core_types::{Point, Viewport};
use serde::{Deserialize, Serialize};

use crate::errors::HostError;
use crate::overlay::{OverlayFrame, OverlayStyle};
use crate::types::{ScrollBehavior, Toast};

/// Opaque reference to a page element handed out by a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyboard event phases, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    KeyDown,
    KeyPress,
    KeyUp,
}

impl KeyPhase {
    pub const TRIAD: [KeyPhase; 3] = [KeyPhase::KeyDown, KeyPhase::KeyPress, KeyPhase::KeyUp];

    pub fn event_type(&self) -> &'static str {
        match self {
            KeyPhase::KeyDown => "keydown",
            KeyPhase::KeyPress => "keypress",
            KeyPhase::KeyUp => "keyup",
        }
    }
}

#[async_trait]
pub trait PageHost: Send + Sync {
    /// Size of the visible viewport in CSS pixels
    async fn viewport(&self) -> Result<Viewport, HostError>;

    /// Create the cursor overlay element
    async fn mount_overlay(&self, style: &OverlayStyle) -> Result<(), HostError>;

    /// Apply the current cursor visuals to the overlay element
    async fn render_overlay(&self, frame: &OverlayFrame) -> Result<(), HostError>;

    /// Remove the overlay element
    async fn unmount_overlay(&self) -> Result<(), HostError>;

    /// Topmost element at a viewport point, excluding the overlay itself
    async fn element_at(&self, point: Point) -> Result<Option<ElementRef>, HostError>;

    /// Activate (click) then focus an element
    async fn activate(&self, element: &ElementRef) -> Result<(), HostError>;

    /// The focused element, when it accepts text input
    async fn focused_text_field(&self) -> Result<Option<ElementRef>, HostError>;

    async fn field_value(&self, field: &ElementRef) -> Result<String, HostError>;

    async fn set_field_value(&self, field: &ElementRef, value: &str) -> Result<(), HostError>;

    /// Dispatch a bubbling keyboard event carrying `key`
    async fn dispatch_key(
        &self,
        field: &ElementRef,
        phase: KeyPhase,
        key: &str,
    ) -> Result<(), HostError>;

    /// Dispatch a bubbling `input` event so page scripts observe a change
    async fn dispatch_input(&self, field: &ElementRef) -> Result<(), HostError>;

    /// Scroll the viewport vertically by `dy` pixels
    async fn scroll_by(&self, dy: i64, behavior: ScrollBehavior) -> Result<(), HostError>;

    /// Replace the current page location
    async fn navigate(&self, url: &str) -> Result<(), HostError>;

    /// Show a transient notification; removal is scheduled by the host
    async fn show_toast(&self, toast: &Toast) -> Result<(), HostError>;
}
