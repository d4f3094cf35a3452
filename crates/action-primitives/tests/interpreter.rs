//! Behaviour of each action kind against the in-memory page.

use std::sync::Arc;
use std::time::Duration;

use action_primitives::memory::{PageEffect, Rect};
use action_primitives::{
    decode_action, ActionInterpreter, ActionPerformer, ActionStatus, BoxFallback, ElementRef,
    InterpreterConfig, KeyPhase, MemoryPage, PageAction, ScrollBehavior,
};
use pagepilot_core_types::{Point, Viewport};
use serde_json::json;
use tokio::time::Instant;

fn setup() -> (Arc<MemoryPage>, ActionInterpreter) {
    setup_with(InterpreterConfig::default())
}

fn setup_with(config: InterpreterConfig) -> (Arc<MemoryPage>, ActionInterpreter) {
    let page = Arc::new(MemoryPage::new(Viewport::new(1000.0, 800.0)));
    let interpreter = ActionInterpreter::new(page.clone(), config);
    (page, interpreter)
}

async fn perform(interpreter: &ActionInterpreter, record: serde_json::Value) -> ActionStatus {
    interpreter.perform(&decode_action(&record)).await.status
}

/// Paused-clock elapsed time, allowing for timer tick rounding
fn assert_elapsed(started: Instant, ms: u64) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(ms) && elapsed < Duration::from_millis(ms + 2),
        "expected ~{}ms, got {:?}",
        ms,
        elapsed
    );
}

fn focused_field(page: &MemoryPage, value: &str) -> ElementRef {
    let field = page.add_element("q", "input", Rect::new(0.0, 0.0, 200.0, 30.0));
    page.set_value(&field, value);
    page.focus(Some(&field));
    field
}

#[tokio::test]
async fn both_payload_shapes_move_cursor_identically() {
    let (nested_page, nested) = setup();
    let (flat_page, flat) = setup();

    perform(&nested, json!({"type": "mouse_move", "parameters": {"x": 5, "y": 5}})).await;
    perform(&flat, json!({"action": "mouse_move", "x": 5, "y": 5})).await;

    assert_eq!(nested.overlay().state(), flat.overlay().state());
    assert_eq!(nested_page.journal(), flat_page.journal());
    assert_eq!(nested.overlay().position(), Point::new(5.0, 5.0));
}

#[tokio::test]
async fn move_without_coordinates_keeps_position() {
    let (_page, interpreter) = setup();
    perform(&interpreter, json!({"action": "mouse_move", "x": 30, "y": 40})).await;
    let status = perform(&interpreter, json!({"action": "mouse_move"})).await;

    assert_eq!(status, ActionStatus::Skipped);
    assert_eq!(interpreter.overlay().position(), Point::new(30.0, 40.0));
}

#[tokio::test]
async fn box_identifier_falls_back_to_viewport_center() {
    let (page, interpreter) = setup();
    perform(&interpreter, json!({"action": "mouse_move", "box_number": 4})).await;

    let frame = page.overlay().unwrap();
    assert_eq!(frame.position, Some(Point::new(500.0, 400.0)));
    assert_eq!(frame.label.as_deref(), Some("Box 4"));
}

#[tokio::test]
async fn box_fallback_can_be_disabled() {
    let config = InterpreterConfig {
        box_fallback: BoxFallback::Ignore,
        ..InterpreterConfig::default()
    };
    let (page, interpreter) = setup_with(config);
    let status = perform(&interpreter, json!({"action": "mouse_move", "box_number": 4})).await;

    assert_eq!(status, ActionStatus::Skipped);
    let frame = page.overlay().unwrap();
    assert_eq!(frame.position, None);
    assert_eq!(frame.label.as_deref(), Some("Box 4"));
}

#[tokio::test(start_paused = true)]
async fn click_activates_and_focuses_element_under_cursor() {
    let (page, interpreter) = setup();
    let link = page.add_element("link", "a", Rect::new(100.0, 100.0, 80.0, 20.0));

    perform(&interpreter, json!({"action": "mouse_move", "x": 120, "y": 110})).await;
    let started = Instant::now();
    let status = perform(&interpreter, json!({"action": "left_click"})).await;

    assert_eq!(status, ActionStatus::Performed);
    assert_elapsed(started, 200);
    assert_eq!(
        page.page_effects(),
        vec![PageEffect::Activated {
            element: link.clone()
        }]
    );
    assert_eq!(page.focused(), Some(link));

    let frame = page.overlay().unwrap();
    assert_eq!(frame.color, interpreter.config().overlay_style.idle_color);
    assert_eq!(frame.scale, 1.0);
}

#[tokio::test(start_paused = true)]
async fn click_on_empty_space_is_silent() {
    let (page, interpreter) = setup();
    let status = perform(&interpreter, json!({"action": "left_click"})).await;

    assert_eq!(status, ActionStatus::Skipped);
    assert!(page.page_effects().is_empty());
    assert!(page.overlay().is_some());
}

#[tokio::test(start_paused = true)]
async fn click_reverts_visual_state_even_when_activation_fails() {
    let (page, interpreter) = setup();
    page.add_element("b", "button", Rect::new(0.0, 0.0, 50.0, 50.0));
    page.fail_operation("activate");

    let status = perform(&interpreter, json!({"action": "left_click"})).await;
    assert_eq!(status, ActionStatus::Failed);
    assert_eq!(page.overlay().unwrap().scale, 1.0);
}

#[tokio::test(start_paused = true)]
async fn secondary_click_is_visual_only() {
    let (page, interpreter) = setup();
    page.add_element("b", "button", Rect::new(0.0, 0.0, 50.0, 50.0));

    let status = perform(&interpreter, json!({"action": "right_click"})).await;
    assert_eq!(status, ActionStatus::Performed);
    assert!(page.page_effects().is_empty());

    let pulses = page
        .journal()
        .iter()
        .filter(|effect| matches!(effect, PageEffect::OverlayRendered { frame } if frame.color == "blue"))
        .count();
    assert_eq!(pulses, 1);
}

#[tokio::test]
async fn backspace_truncates_and_notifies_once() {
    let (page, interpreter) = setup();
    let field = focused_field(&page, "abc");

    perform(&interpreter, json!({"action": "send_key", "key_name": "Backspace"})).await;

    assert_eq!(page.value(&field).as_deref(), Some("ab"));
    let inputs = page
        .journal()
        .iter()
        .filter(|effect| matches!(effect, PageEffect::Input { .. }))
        .count();
    assert_eq!(inputs, 1);
}

#[tokio::test]
async fn enter_dispatches_key_triad_then_input() {
    let (page, interpreter) = setup();
    let field = focused_field(&page, "query");

    perform(&interpreter, json!({"type": "send_key", "parameters": {"keys": "Enter"}})).await;

    let key = |phase| PageEffect::Key {
        element: field.clone(),
        phase,
        key: "Enter".to_string(),
    };
    assert_eq!(
        page.page_effects(),
        vec![
            key(KeyPhase::KeyDown),
            key(KeyPhase::KeyPress),
            key(KeyPhase::KeyUp),
            PageEffect::Input {
                element: field.clone()
            },
        ]
    );
    assert_eq!(page.value(&field).as_deref(), Some("query"));
}

#[tokio::test]
async fn text_is_appended_verbatim() {
    let (page, interpreter) = setup();
    let field = focused_field(&page, "hello");

    perform(&interpreter, json!({"action": "send_key", "keys": " world"})).await;
    assert_eq!(page.value(&field).as_deref(), Some("hello world"));
}

#[tokio::test]
async fn keys_without_focused_field_become_notification() {
    let (page, interpreter) = setup();
    page.add_element("b", "button", Rect::new(0.0, 0.0, 50.0, 50.0));
    page.focus(Some(&ElementRef("b".into())));

    let status = perform(&interpreter, json!({"action": "send_key", "keys": "hi"})).await;
    assert_eq!(status, ActionStatus::Performed);

    let toasts = page.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].text, "Type: \"hi\"");
    assert_eq!(toasts[0].lifetime_ms, 3000);
    assert_eq!(toasts[0].fade_ms, 500);
}

#[tokio::test]
async fn oversized_scroll_saturates() {
    let (page, interpreter) = setup_with(InterpreterConfig {
        scroll_px_per_line: i64::MAX / 2,
        ..InterpreterConfig::default()
    });

    let status = perform(&interpreter, json!({"action": "scroll_down", "lines": 10})).await;
    assert_eq!(status, ActionStatus::Performed);
    assert_eq!(page.scroll_y(), i64::MAX);

    perform(&interpreter, json!({"action": "scroll_up", "lines": 4294967296u64})).await;
    assert_eq!(page.scroll_y(), 0);
}

#[tokio::test]
async fn scroll_uses_lines_times_twenty() {
    let (page, interpreter) = setup();

    perform(&interpreter, json!({"action": "scroll_down", "lines": 3})).await;
    assert_eq!(page.scroll_y(), 60);

    perform(&interpreter, json!({"action": "scroll_up"})).await;
    assert_eq!(page.scroll_y(), -140);
    assert_eq!(
        page.page_effects(),
        vec![
            PageEffect::Scrolled {
                dy: 60,
                behavior: ScrollBehavior::Smooth
            },
            PageEffect::Scrolled {
                dy: -200,
                behavior: ScrollBehavior::Smooth
            },
        ]
    );
}

#[tokio::test]
async fn navigate_requires_url() {
    let (page, interpreter) = setup();

    let status = perform(&interpreter, json!({"action": "navigate_to_link"})).await;
    assert_eq!(status, ActionStatus::Skipped);
    assert_eq!(page.location(), "about:blank");

    perform(
        &interpreter,
        json!({"action": "navigate_to_link", "url": "https://example.com"}),
    )
    .await;
    assert_eq!(page.location(), "https://example.com");
}

#[tokio::test]
async fn tab_actions_only_notify() {
    let (page, interpreter) = setup();
    for kind in ["switch_tab", "close_tab", "new_tab"] {
        let status = perform(&interpreter, json!({ "action": kind })).await;
        assert_eq!(status, ActionStatus::Performed);
    }
    let texts: Vec<String> = page.toasts().into_iter().map(|t| t.text).collect();
    assert_eq!(
        texts,
        vec!["Action: switch_tab", "Action: close_tab", "Action: new_tab"]
    );
}

#[tokio::test]
async fn notification_shows_text() {
    let (page, interpreter) = setup();
    perform(&interpreter, json!({"action": "notification", "text": "Done"})).await;
    let status = perform(&interpreter, json!({"action": "notification"})).await;

    assert_eq!(status, ActionStatus::Skipped);
    assert_eq!(page.toasts().len(), 1);
    assert_eq!(page.toasts()[0].text, "Done");
}

#[tokio::test(start_paused = true)]
async fn wait_suspends_for_requested_duration() {
    let (_page, interpreter) = setup();

    let started = Instant::now();
    perform(&interpreter, json!({"action": "wait", "ms": 250})).await;
    assert_elapsed(started, 250);

    let started = Instant::now();
    perform(&interpreter, json!({"action": "wait"})).await;
    assert_elapsed(started, 1000);
}

#[tokio::test]
async fn unknown_kind_has_no_effect() {
    let (page, interpreter) = setup();
    let report = interpreter
        .perform(&decode_action(&json!({"type": "teleport", "x": 1, "y": 2})))
        .await;

    assert_eq!(report.status, ActionStatus::Skipped);
    assert_eq!(report.kind, "unsupported:teleport");
    assert!(page.journal().is_empty());
}

#[tokio::test]
async fn host_failures_are_reported_not_raised() {
    let (page, interpreter) = setup();
    page.fail_operation("navigate");

    let report = interpreter
        .perform(&PageAction::Navigate {
            url: Some("https://example.com".into()),
        })
        .await;
    assert_eq!(report.status, ActionStatus::Failed);
    assert_eq!(
        report.detail.as_deref(),
        Some("Script evaluation failed: navigate failed")
    );
}

#[tokio::test]
async fn teardown_removes_overlay_once() {
    let (page, interpreter) = setup();
    perform(&interpreter, json!({"action": "mouse_move", "x": 1, "y": 1})).await;

    assert!(interpreter.teardown().await);
    assert!(!interpreter.teardown().await);
    assert!(page.overlay().is_none());
}
