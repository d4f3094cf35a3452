//! Script-driven page host.
//!
//! Every effect is rendered as a self-contained JavaScript expression and
//! handed to a [`ScriptEvaluator`] (a DevTools session, an extension content
//! script bridge, ...). Arguments are embedded as JSON literals. Each script
//! returns an object so evaluators never have to deal with `undefined`.
//!
//! Elements are referenced across calls through a `data-pagepilot-ref`
//! attribute stamped on them the first time they are resolved.

use std::sync::Arc;

use async_trait::async_trait;
use pagepilot_core_types::{Point, Viewport};
use serde::Serialize;
use serde_json::Value;

use crate::errors::HostError;
use crate::host::{ElementRef, KeyPhase, PageHost};
use crate::overlay::{OverlayFrame, OverlayStyle};
use crate::types::{ScrollBehavior, Toast};

const OVERLAY_ID: &str = "__pagepilot_cursor";
const REF_ATTR: &str = "data-pagepilot-ref";

#[async_trait]
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluate an expression in the page and return its JSON value
    async fn evaluate(&self, script: &str) -> Result<Value, HostError>;
}

pub struct ScriptPage {
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl ScriptPage {
    pub fn new(evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self { evaluator }
    }

    async fn run(&self, script: String) -> Result<Value, HostError> {
        let value = self.evaluator.evaluate(&script).await?;
        match value.get("status").and_then(Value::as_str) {
            Some("missing") => Err(HostError::StaleElement(
                value
                    .get("ref")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            )),
            _ => Ok(value),
        }
    }

    async fn resolve_ref(&self, script: String) -> Result<Option<ElementRef>, HostError> {
        let value = self.run(script).await?;
        match value.get("ref") {
            Some(Value::String(id)) => Ok(Some(ElementRef(id.clone()))),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(HostError::Protocol(format!(
                "element reference is not a string: {}",
                other
            ))),
        }
    }
}

fn literal<T: Serialize + ?Sized>(value: &T) -> Result<String, HostError> {
    serde_json::to_string(value)
        .map_err(|err| HostError::Protocol(format!("failed to encode script argument: {}", err)))
}

/// Snippet that stamps `el` with a stable reference and returns it
fn stamp_ref() -> String {
    format!(
        "let id = el.getAttribute('{attr}');\n\
         if (!id) {{\n\
             window.__pagepilotRefSeq = (window.__pagepilotRefSeq || 0) + 1;\n\
             id = 'pp-' + window.__pagepilotRefSeq;\n\
             el.setAttribute('{attr}', id);\n\
         }}\n\
         return {{ ref: id }};",
        attr = REF_ATTR
    )
}

/// Wrap `body` in a function that binds `el` to the referenced element
fn with_element(element: &ElementRef, body: &str) -> Result<String, HostError> {
    let id = literal(&element.0)?;
    Ok(format!(
        "(() => {{\n\
             const id = {id};\n\
             const el = Array.from(document.querySelectorAll('[{attr}]'))\n\
                 .find((node) => node.getAttribute('{attr}') === id);\n\
             if (!el) {{ return {{ status: 'missing', ref: id }}; }}\n\
             {body}\n\
         }})()",
        id = id,
        attr = REF_ATTR,
        body = body
    ))
}

#[async_trait]
impl PageHost for ScriptPage {
    async fn viewport(&self) -> Result<Viewport, HostError> {
        let value = self
            .run("(() => ({ width: window.innerWidth, height: window.innerHeight }))()".to_string())
            .await?;
        let width = value.get("width").and_then(Value::as_f64);
        let height = value.get("height").and_then(Value::as_f64);
        match (width, height) {
            (Some(width), Some(height)) => Ok(Viewport::new(width, height)),
            _ => Err(HostError::Protocol(format!("bad viewport: {}", value))),
        }
    }

    async fn mount_overlay(&self, style: &OverlayStyle) -> Result<(), HostError> {
        let size = format!("{}px", style.size_px);
        let script = format!(
            "(() => {{\n\
                 let cursor = document.getElementById({id});\n\
                 if (!cursor) {{\n\
                     cursor = document.createElement('div');\n\
                     cursor.id = {id};\n\
                     document.body.appendChild(cursor);\n\
                 }}\n\
                 Object.assign(cursor.style, {{\n\
                     position: 'fixed', width: {size}, height: {size}, borderRadius: '50%',\n\
                     backgroundColor: {color}, border: {border}, zIndex: {z},\n\
                     pointerEvents: 'none', transition: {transition},\n\
                     transform: 'translate(-50%, -50%)', boxShadow: {shadow},\n\
                 }});\n\
                 return {{ status: 'ok' }};\n\
             }})()",
            id = literal(OVERLAY_ID)?,
            size = literal(&size)?,
            color = literal(&style.idle_color)?,
            border = literal(&style.border)?,
            z = literal(&style.z_index.to_string())?,
            transition = literal(&style.transition)?,
            shadow = literal(&style.shadow)?,
        );
        self.run(script).await.map(|_| ())
    }

    async fn render_overlay(&self, frame: &OverlayFrame) -> Result<(), HostError> {
        let position = match frame.position {
            Some(point) => format!(
                "cursor.style.left = '{}px'; cursor.style.top = '{}px';",
                point.x, point.y
            ),
            None => String::new(),
        };
        let script = format!(
            "(() => {{\n\
                 const cursor = document.getElementById({id});\n\
                 if (!cursor) {{ return {{ status: 'missing', ref: {id} }}; }}\n\
                 {position}\n\
                 cursor.style.backgroundColor = {color};\n\
                 cursor.style.transform = 'translate(-50%, -50%) scale({scale})';\n\
                 cursor.title = {label};\n\
                 return {{ status: 'ok' }};\n\
             }})()",
            id = literal(OVERLAY_ID)?,
            position = position,
            color = literal(&frame.color)?,
            scale = frame.scale,
            label = literal(frame.label.as_deref().unwrap_or(""))?,
        );
        self.run(script).await.map(|_| ())
    }

    async fn unmount_overlay(&self) -> Result<(), HostError> {
        let script = format!(
            "(() => {{\n\
                 const cursor = document.getElementById({id});\n\
                 if (cursor) {{ cursor.remove(); }}\n\
                 return {{ status: 'ok' }};\n\
             }})()",
            id = literal(OVERLAY_ID)?
        );
        self.run(script).await.map(|_| ())
    }

    async fn element_at(&self, point: Point) -> Result<Option<ElementRef>, HostError> {
        let (x, y) = point.to_pixel();
        let script = format!(
            "(() => {{\n\
                 const el = document.elementFromPoint({x}, {y});\n\
                 if (!el || el.id === {overlay}) {{ return {{ ref: null }}; }}\n\
                 {stamp}\n\
             }})()",
            x = x,
            y = y,
            overlay = literal(OVERLAY_ID)?,
            stamp = stamp_ref(),
        );
        self.resolve_ref(script).await
    }

    async fn activate(&self, element: &ElementRef) -> Result<(), HostError> {
        let script = with_element(
            element,
            "el.click();\n\
             if (typeof el.focus === 'function') { el.focus(); }\n\
             return { status: 'ok' };",
        )?;
        self.run(script).await.map(|_| ())
    }

    async fn focused_text_field(&self) -> Result<Option<ElementRef>, HostError> {
        let script = format!(
            "(() => {{\n\
                 const el = document.activeElement;\n\
                 if (!el || (el.tagName !== 'INPUT' && el.tagName !== 'TEXTAREA')) {{\n\
                     return {{ ref: null }};\n\
                 }}\n\
                 {stamp}\n\
             }})()",
            stamp = stamp_ref(),
        );
        self.resolve_ref(script).await
    }

    async fn field_value(&self, field: &ElementRef) -> Result<String, HostError> {
        let script = with_element(field, "return { value: String(el.value ?? '') };")?;
        let value = self.run(script).await?;
        value
            .get("value")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HostError::Protocol(format!("bad field value: {}", value)))
    }

    async fn set_field_value(&self, field: &ElementRef, value: &str) -> Result<(), HostError> {
        let body = format!(
            "el.value = {value};\nreturn {{ status: 'ok' }};",
            value = literal(value)?
        );
        self.run(with_element(field, &body)?).await.map(|_| ())
    }

    async fn dispatch_key(
        &self,
        field: &ElementRef,
        phase: KeyPhase,
        key: &str,
    ) -> Result<(), HostError> {
        let body = format!(
            "el.dispatchEvent(new KeyboardEvent({event}, {{ key: {key}, bubbles: true }}));\n\
             return {{ status: 'ok' }};",
            event = literal(phase.event_type())?,
            key = literal(key)?,
        );
        self.run(with_element(field, &body)?).await.map(|_| ())
    }

    async fn dispatch_input(&self, field: &ElementRef) -> Result<(), HostError> {
        let script = with_element(
            field,
            "el.dispatchEvent(new Event('input', { bubbles: true }));\n\
             return { status: 'ok' };",
        )?;
        self.run(script).await.map(|_| ())
    }

    async fn scroll_by(&self, dy: i64, behavior: ScrollBehavior) -> Result<(), HostError> {
        let script = format!(
            "(() => {{ window.scrollBy({{ top: {dy}, behavior: '{behavior}' }}); return {{ status: 'ok' }}; }})()",
            dy = dy,
            behavior = behavior.as_css(),
        );
        self.run(script).await.map(|_| ())
    }

    async fn navigate(&self, url: &str) -> Result<(), HostError> {
        let script = format!(
            "(() => {{ window.location.href = {url}; return {{ status: 'ok' }}; }})()",
            url = literal(url)?
        );
        self.run(script).await.map(|_| ())
    }

    async fn show_toast(&self, toast: &Toast) -> Result<(), HostError> {
        let script = format!(
            "(() => {{\n\
                 const toast = document.createElement('div');\n\
                 toast.textContent = {text};\n\
                 Object.assign(toast.style, {{\n\
                     position: 'fixed', bottom: '20px', left: '50%', transform: 'translateX(-50%)',\n\
                     backgroundColor: '#333', color: '#fff', padding: '10px 20px',\n\
                     borderRadius: '5px', zIndex: '1000000', opacity: '0',\n\
                     transition: 'opacity {fade}ms',\n\
                 }});\n\
                 document.body.appendChild(toast);\n\
                 requestAnimationFrame(() => {{ toast.style.opacity = '1'; }});\n\
                 setTimeout(() => {{\n\
                     toast.style.opacity = '0';\n\
                     setTimeout(() => toast.remove(), {fade});\n\
                 }}, {lifetime});\n\
                 return {{ status: 'ok' }};\n\
             }})()",
            text = literal(&toast.text)?,
            fade = toast.fade_ms,
            lifetime = toast.lifetime_ms,
        );
        self.run(script).await.map(|_| ())
    }
}
