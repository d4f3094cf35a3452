//! Core data types for page actions

use chrono::{DateTime, Utc};
use pagepilot_core_types::Point;
use serde::{Deserialize, Serialize};

use crate::errors::ActionError;

/// Action kinds understood by the engine, named by their wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MouseMove,
    LeftClick,
    RightClick,
    SendKey,
    ScrollUp,
    ScrollDown,
    NavigateToLink,
    SwitchTab,
    CloseTab,
    NewTab,
    Wait,
    Notification,
}

impl ActionKind {
    pub const ALL: [ActionKind; 12] = [
        ActionKind::MouseMove,
        ActionKind::LeftClick,
        ActionKind::RightClick,
        ActionKind::SendKey,
        ActionKind::ScrollUp,
        ActionKind::ScrollDown,
        ActionKind::NavigateToLink,
        ActionKind::SwitchTab,
        ActionKind::CloseTab,
        ActionKind::NewTab,
        ActionKind::Wait,
        ActionKind::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::MouseMove => "mouse_move",
            ActionKind::LeftClick => "left_click",
            ActionKind::RightClick => "right_click",
            ActionKind::SendKey => "send_key",
            ActionKind::ScrollUp => "scroll_up",
            ActionKind::ScrollDown => "scroll_down",
            ActionKind::NavigateToLink => "navigate_to_link",
            ActionKind::SwitchTab => "switch_tab",
            ActionKind::CloseTab => "close_tab",
            ActionKind::NewTab => "new_tab",
            ActionKind::Wait => "wait",
            ActionKind::Notification => "notification",
        }
    }

    /// Resolve a wire tag. Tags are matched exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

/// Key input for `send_key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "text", rename_all = "snake_case")]
pub enum KeyInput {
    /// Synthesizes the keydown/keypress/keyup triad
    Enter,
    /// Removes the last character of the field value
    Backspace,
    /// Appended verbatim to the field value
    Text(String),
}

impl KeyInput {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Enter" => KeyInput::Enter,
            "Backspace" => KeyInput::Backspace,
            other => KeyInput::Text(other.to_string()),
        }
    }

    /// Literal text as received, used for the fallback notification
    pub fn literal(&self) -> &str {
        match self {
            KeyInput::Enter => "Enter",
            KeyInput::Backspace => "Backspace",
            KeyInput::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn sign(&self) -> i64 {
        match self {
            ScrollDirection::Up => -1,
            ScrollDirection::Down => 1,
        }
    }
}

/// Scroll behavior (smooth vs instant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBehavior {
    /// Smooth animated scroll
    #[default]
    Smooth,

    /// Instant jump to position
    Instant,
}

impl ScrollBehavior {
    pub fn as_css(&self) -> &'static str {
        match self {
            ScrollBehavior::Smooth => "smooth",
            ScrollBehavior::Instant => "auto",
        }
    }
}

/// Tab-level operations that cannot be performed from inside a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabOp {
    Switch,
    Close,
    New,
}

impl TabOp {
    pub fn kind(&self) -> ActionKind {
        match self {
            TabOp::Switch => ActionKind::SwitchTab,
            TabOp::Close => ActionKind::CloseTab,
            TabOp::New => ActionKind::NewTab,
        }
    }
}

/// Canonical form of one action record.
///
/// Optional payload fields carry "parameter missing" through to the handler,
/// which decides whether that makes the action a partial or full no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageAction {
    MovePointer {
        point: Option<Point>,
        box_id: Option<String>,
    },
    PrimaryClick,
    SecondaryClick,
    SendKeys {
        input: Option<KeyInput>,
    },
    Scroll {
        direction: ScrollDirection,
        lines: Option<u32>,
    },
    Navigate {
        url: Option<String>,
    },
    Tab {
        op: TabOp,
    },
    Wait {
        ms: Option<u64>,
    },
    Notify {
        text: Option<String>,
    },
    /// Record whose kind is missing or not supported
    Unsupported {
        tag: Option<String>,
    },
}

impl PageAction {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            PageAction::MovePointer { .. } => Some(ActionKind::MouseMove),
            PageAction::PrimaryClick => Some(ActionKind::LeftClick),
            PageAction::SecondaryClick => Some(ActionKind::RightClick),
            PageAction::SendKeys { .. } => Some(ActionKind::SendKey),
            PageAction::Scroll {
                direction: ScrollDirection::Up,
                ..
            } => Some(ActionKind::ScrollUp),
            PageAction::Scroll {
                direction: ScrollDirection::Down,
                ..
            } => Some(ActionKind::ScrollDown),
            PageAction::Navigate { .. } => Some(ActionKind::NavigateToLink),
            PageAction::Tab { op } => Some(op.kind()),
            PageAction::Wait { .. } => Some(ActionKind::Wait),
            PageAction::Notify { .. } => Some(ActionKind::Notification),
            PageAction::Unsupported { .. } => None,
        }
    }

    /// Label used in logs and reports
    pub fn label(&self) -> String {
        match (self.kind(), self) {
            (Some(kind), _) => kind.as_str().to_string(),
            (None, PageAction::Unsupported { tag: Some(tag) }) => format!("unsupported:{}", tag),
            (None, _) => "unsupported".to_string(),
        }
    }
}

/// A transient on-page notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub text: String,

    /// Time the toast stays fully visible
    pub lifetime_ms: u64,

    /// Duration of the fade in and of the fade out
    pub fade_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// The effect was applied
    Performed,

    /// Nothing to do (missing parameters, no target, unsupported kind)
    Skipped,

    /// The host failed; the failure was absorbed
    Failed,
}

/// Result of performing one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    /// Wire tag (or `unsupported:<tag>`)
    pub kind: String,

    pub status: ActionStatus,

    /// Why the action was skipped or failed
    pub detail: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,
}

impl ActionReport {
    pub fn performed(kind: String, started_at: DateTime<Utc>, latency_ms: u64) -> Self {
        Self {
            kind,
            status: ActionStatus::Performed,
            detail: None,
            started_at,
            finished_at: Utc::now(),
            latency_ms,
        }
    }

    pub fn skipped(
        kind: String,
        started_at: DateTime<Utc>,
        latency_ms: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: ActionStatus::Skipped,
            detail: Some(reason.into()),
            ..Self::performed(kind, started_at, latency_ms)
        }
    }

    pub fn failure(
        kind: String,
        started_at: DateTime<Utc>,
        latency_ms: u64,
        error: &ActionError,
    ) -> Self {
        Self {
            status: ActionStatus::Failed,
            detail: Some(error.to_string()),
            ..Self::performed(kind, started_at, latency_ms)
        }
    }

    pub fn is_performed(&self) -> bool {
        self.status == ActionStatus::Performed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::from_tag("teleport"), None);
        assert_eq!(ActionKind::from_tag("Mouse_Move"), None);
    }

    #[test]
    fn key_input_is_case_sensitive() {
        assert_eq!(KeyInput::parse("Enter"), KeyInput::Enter);
        assert_eq!(KeyInput::parse("Backspace"), KeyInput::Backspace);
        assert_eq!(KeyInput::parse("enter"), KeyInput::Text("enter".into()));
    }

    #[test]
    fn scroll_kind_follows_direction() {
        let up = PageAction::Scroll {
            direction: ScrollDirection::Up,
            lines: None,
        };
        assert_eq!(up.kind(), Some(ActionKind::ScrollUp));
        assert_eq!(up.label(), "scroll_up");
    }

    #[test]
    fn unsupported_label_names_tag() {
        let action = PageAction::Unsupported {
            tag: Some("teleport".into()),
        };
        assert_eq!(action.label(), "unsupported:teleport");
        assert_eq!(PageAction::Unsupported { tag: None }.label(), "unsupported");
    }
}
