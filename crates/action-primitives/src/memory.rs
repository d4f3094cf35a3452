//! In-memory page model.
//!
//! `MemoryPage` keeps just enough of a page to observe every effect the
//! interpreter can have: element boxes for hit-testing, focus, field values,
//! scroll offset, location, toasts and the overlay. Every applied effect is
//! appended to an ordered journal. Used for dry runs and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use pagepilot_core_types::{Point, Viewport};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::HostError;
use crate::host::{ElementRef, KeyPhase, PageHost};
use crate::overlay::{OverlayFrame, OverlayStyle};
use crate::types::{ScrollBehavior, Toast};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryElement {
    pub id: ElementRef,
    /// Upper-case tag name, as the DOM reports it
    pub tag: String,
    pub rect: Rect,
    pub value: String,
}

impl MemoryElement {
    fn accepts_text(&self) -> bool {
        matches!(self.tag.as_str(), "INPUT" | "TEXTAREA")
    }
}

/// One applied effect, in application order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum PageEffect {
    OverlayMounted,
    OverlayRendered { frame: OverlayFrame },
    OverlayUnmounted,
    Activated { element: ElementRef },
    ValueSet { element: ElementRef, value: String },
    Key { element: ElementRef, phase: KeyPhase, key: String },
    Input { element: ElementRef },
    Scrolled { dy: i64, behavior: ScrollBehavior },
    Navigated { url: String },
    Toast { text: String },
}

impl PageEffect {
    /// Overlay bookkeeping, as opposed to effects page scripts can observe
    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            PageEffect::OverlayMounted
                | PageEffect::OverlayRendered { .. }
                | PageEffect::OverlayUnmounted
        )
    }
}

#[derive(Debug)]
struct PageState {
    viewport: Viewport,
    elements: Vec<MemoryElement>,
    focused: Option<ElementRef>,
    scroll_y: i64,
    location: String,
    overlay: Option<OverlayFrame>,
    overlay_mounted: bool,
    toasts: Vec<Toast>,
    journal: Vec<PageEffect>,
    failing: HashSet<&'static str>,
}

pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl MemoryPage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Mutex::new(PageState {
                viewport,
                elements: Vec::new(),
                focused: None,
                scroll_y: 0,
                location: "about:blank".to_string(),
                overlay: None,
                overlay_mounted: false,
                toasts: Vec::new(),
                journal: Vec::new(),
                failing: HashSet::new(),
            }),
        }
    }

    /// Add an element on top of every element added before it.
    pub fn add_element(&self, id: &str, tag: &str, rect: Rect) -> ElementRef {
        let element = ElementRef(id.to_string());
        self.state.lock().elements.push(MemoryElement {
            id: element.clone(),
            tag: tag.to_ascii_uppercase(),
            rect,
            value: String::new(),
        });
        element
    }

    pub fn set_value(&self, element: &ElementRef, value: &str) {
        let mut state = self.state.lock();
        if let Some(el) = state.elements.iter_mut().find(|el| &el.id == element) {
            el.value = value.to_string();
        }
    }

    pub fn focus(&self, element: Option<&ElementRef>) {
        self.state.lock().focused = element.cloned();
    }

    /// Make every call of the named host operation fail (e.g. `"navigate"`).
    pub fn fail_operation(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn value(&self, element: &ElementRef) -> Option<String> {
        self.state
            .lock()
            .elements
            .iter()
            .find(|el| &el.id == element)
            .map(|el| el.value.clone())
    }

    pub fn focused(&self) -> Option<ElementRef> {
        self.state.lock().focused.clone()
    }

    pub fn scroll_y(&self) -> i64 {
        self.state.lock().scroll_y
    }

    pub fn location(&self) -> String {
        self.state.lock().location.clone()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.state.lock().toasts.clone()
    }

    /// Current overlay visuals, `None` when no overlay is mounted
    pub fn overlay(&self) -> Option<OverlayFrame> {
        let state = self.state.lock();
        if state.overlay_mounted {
            state.overlay.clone()
        } else {
            None
        }
    }

    pub fn journal(&self) -> Vec<PageEffect> {
        self.state.lock().journal.clone()
    }

    /// Journal without overlay bookkeeping
    pub fn page_effects(&self) -> Vec<PageEffect> {
        self.journal()
            .into_iter()
            .filter(|effect| !effect.is_overlay())
            .collect()
    }

    fn check(state: &PageState, operation: &'static str) -> Result<(), HostError> {
        if state.failing.contains(operation) {
            return Err(HostError::Script(format!("{} failed", operation)));
        }
        Ok(())
    }

    fn with_element<T>(
        state: &mut PageState,
        element: &ElementRef,
        f: impl FnOnce(&mut MemoryElement) -> T,
    ) -> Result<T, HostError> {
        state
            .elements
            .iter_mut()
            .find(|el| &el.id == element)
            .map(f)
            .ok_or_else(|| HostError::StaleElement(element.0.clone()))
    }
}

#[async_trait]
impl PageHost for MemoryPage {
    async fn viewport(&self) -> Result<Viewport, HostError> {
        let state = self.state.lock();
        Self::check(&state, "viewport")?;
        Ok(state.viewport)
    }

    async fn mount_overlay(&self, _style: &OverlayStyle) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "mount_overlay")?;
        state.overlay_mounted = true;
        state.journal.push(PageEffect::OverlayMounted);
        Ok(())
    }

    async fn render_overlay(&self, frame: &OverlayFrame) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "render_overlay")?;
        if !state.overlay_mounted {
            return Err(HostError::StaleElement("cursor overlay".to_string()));
        }
        state.overlay = Some(frame.clone());
        state.journal.push(PageEffect::OverlayRendered {
            frame: frame.clone(),
        });
        Ok(())
    }

    async fn unmount_overlay(&self) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "unmount_overlay")?;
        state.overlay_mounted = false;
        state.overlay = None;
        state.journal.push(PageEffect::OverlayUnmounted);
        Ok(())
    }

    async fn element_at(&self, point: Point) -> Result<Option<ElementRef>, HostError> {
        let state = self.state.lock();
        Self::check(&state, "element_at")?;
        let (x, y) = point.to_pixel();
        let pixel = Point::new(x as f64, y as f64);
        Ok(state
            .elements
            .iter()
            .rev()
            .find(|el| el.rect.contains(pixel))
            .map(|el| el.id.clone()))
    }

    async fn activate(&self, element: &ElementRef) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "activate")?;
        Self::with_element(&mut state, element, |_| ())?;
        state.journal.push(PageEffect::Activated {
            element: element.clone(),
        });
        state.focused = Some(element.clone());
        Ok(())
    }

    async fn focused_text_field(&self) -> Result<Option<ElementRef>, HostError> {
        let state = self.state.lock();
        Self::check(&state, "focused_text_field")?;
        let Some(focused) = &state.focused else {
            return Ok(None);
        };
        Ok(state
            .elements
            .iter()
            .find(|el| &el.id == focused && el.accepts_text())
            .map(|el| el.id.clone()))
    }

    async fn field_value(&self, field: &ElementRef) -> Result<String, HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "field_value")?;
        Self::with_element(&mut state, field, |el| el.value.clone())
    }

    async fn set_field_value(&self, field: &ElementRef, value: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "set_field_value")?;
        Self::with_element(&mut state, field, |el| el.value = value.to_string())?;
        state.journal.push(PageEffect::ValueSet {
            element: field.clone(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn dispatch_key(
        &self,
        field: &ElementRef,
        phase: KeyPhase,
        key: &str,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "dispatch_key")?;
        state.journal.push(PageEffect::Key {
            element: field.clone(),
            phase,
            key: key.to_string(),
        });
        Ok(())
    }

    async fn dispatch_input(&self, field: &ElementRef) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "dispatch_input")?;
        state.journal.push(PageEffect::Input {
            element: field.clone(),
        });
        Ok(())
    }

    async fn scroll_by(&self, dy: i64, behavior: ScrollBehavior) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "scroll_by")?;
        state.scroll_y = state.scroll_y.saturating_add(dy);
        state.journal.push(PageEffect::Scrolled { dy, behavior });
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "navigate")?;
        state.location = url.to_string();
        state.journal.push(PageEffect::Navigated {
            url: url.to_string(),
        });
        Ok(())
    }

    async fn show_toast(&self, toast: &Toast) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check(&state, "show_toast")?;
        state.toasts.push(toast.clone());
        state.journal.push(PageEffect::Toast {
            text: toast.text.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topmost_element_wins_hit_test() {
        let page = MemoryPage::default();
        page.add_element("body", "div", Rect::new(0.0, 0.0, 1280.0, 720.0));
        let button = page.add_element("submit", "button", Rect::new(10.0, 10.0, 50.0, 20.0));

        let hit = tokio_test::block_on(page.element_at(Point::new(20.5, 15.0))).unwrap();
        assert_eq!(hit, Some(button));

        let hit = tokio_test::block_on(page.element_at(Point::new(500.0, 500.0))).unwrap();
        assert_eq!(hit, Some(ElementRef("body".into())));
    }

    #[test]
    fn only_inputs_count_as_text_fields() {
        let page = MemoryPage::default();
        let button = page.add_element("b", "button", Rect::new(0.0, 0.0, 10.0, 10.0));
        let area = page.add_element("t", "textarea", Rect::new(0.0, 20.0, 10.0, 10.0));

        page.focus(Some(&button));
        assert_eq!(tokio_test::block_on(page.focused_text_field()).unwrap(), None);

        page.focus(Some(&area));
        assert_eq!(
            tokio_test::block_on(page.focused_text_field()).unwrap(),
            Some(area)
        );
    }

    #[test]
    fn failing_operation_reports_error() {
        let page = MemoryPage::default();
        page.fail_operation("navigate");
        let err = tokio_test::block_on(page.navigate("https://example.com")).unwrap_err();
        assert_eq!(err, HostError::Script("navigate failed".into()));
        assert_eq!(page.location(), "about:blank");
    }
}
