//! The manipulation state machine.
//!
//! [`CanvasEditor`] owns the project being edited, the selection and the
//! active [`Gesture`]. Pointer handlers take client-space positions and return
//! the [`Action`]s the host must apply: every drag or resize step emits the
//! whole project with a fresh `updated_at`, there is no separate commit.
//!
//! Hit-testing walks the design list back to front, so the element painted
//! last is the one that receives the pointer.

use super::input::{Cursor, Gesture};
use super::preview::PreviewSettings;
use super::render::RenderRequest;
use crate::geometry::{
    Point, Size, Viewport, hit_delete_hotspot, hit_test_handle, resize_from_handle,
    to_canvas_coordinates,
};
use crate::types::MockupProject;
use tracing::debug;

/// Side effects requested by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The project changed; hand it to the persistence sink.
    ProjectUpdated(MockupProject),
    SelectionChanged(Option<String>),
    SetCursor(Cursor),
}

#[derive(Debug, Clone)]
pub struct CanvasEditor {
    project: MockupProject,
    selected: Option<String>,
    gesture: Gesture,
    cursor: Cursor,
    canvas: Size,
    pub preview: PreviewSettings,
    pub aspect_locked: bool,
    pub viewport: Viewport,
}

impl CanvasEditor {
    /// Editor for `project` on a logical canvas of `canvas`, shown at 1:1.
    pub fn new(project: MockupProject, canvas: Size) -> Self {
        Self {
            project,
            selected: None,
            gesture: Gesture::Idle,
            cursor: Cursor::Default,
            canvas,
            preview: PreviewSettings::default(),
            aspect_locked: true,
            viewport: Viewport::identity(canvas),
        }
    }

    pub fn project(&self) -> &MockupProject {
        &self.project
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Adopt a project changed elsewhere (manual edits, a design added from
    /// the library). A selection whose element disappeared is dropped.
    pub fn replace_project(&mut self, project: MockupProject) {
        self.project = project;
        let still_there = self
            .selected
            .as_deref()
            .is_some_and(|id| self.project.designs.iter().any(|d| d.id == id));
        if !still_there {
            self.selected = None;
            self.gesture = Gesture::Idle;
        }
    }

    /// Select from outside the canvas (e.g. a layer list).
    pub fn select(&mut self, id: Option<String>) {
        self.selected = id.filter(|id| self.project.designs.iter().any(|d| &d.id == id));
    }

    /// Switching to a decorative preview abandons any gesture in flight.
    pub fn set_preview(&mut self, preview: PreviewSettings) {
        self.preview = preview;
        if !preview.is_interactive() {
            self.gesture = Gesture::Idle;
        }
    }

    /// Request for the live frame.
    pub fn render_request(&self) -> RenderRequest<'_> {
        RenderRequest::interactive(&self.project, self.preview, self.canvas, self.selected.as_deref())
    }

    pub fn on_pointer_down(&mut self, client: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.preview.is_interactive() {
            return actions;
        }
        let p = to_canvas_coordinates(client, &self.viewport);

        for index in (0..self.project.designs.len()).rev() {
            let element = &self.project.designs[index];
            let bounds = element.bounds();
            let is_selected = self.selected.as_deref() == Some(element.id.as_str());

            if is_selected && hit_delete_hotspot(p, bounds) {
                let id = element.id.clone();
                self.project.remove_design(&id);
                debug!(element = %id, "deleted from canvas");
                self.gesture = Gesture::Idle;
                self.selected = None;
                actions.push(Action::ProjectUpdated(self.project.clone()));
                actions.push(Action::SelectionChanged(None));
                self.set_cursor(Cursor::Default, &mut actions);
                return actions;
            }

            if element.contains(p.x, p.y) {
                let id = element.id.clone();
                self.gesture = match hit_test_handle(p, bounds).filter(|_| is_selected) {
                    Some(handle) => Gesture::Resizing {
                        id: id.clone(),
                        handle,
                        origin: p,
                        start: bounds,
                    },
                    None => Gesture::Dragging {
                        id: id.clone(),
                        offset: p - bounds.origin(),
                    },
                };
                if !is_selected {
                    self.selected = Some(id.clone());
                    actions.push(Action::SelectionChanged(Some(id)));
                }
                return actions;
            }
        }

        if self.selected.take().is_some() {
            actions.push(Action::SelectionChanged(None));
        }
        actions
    }

    pub fn on_pointer_move(&mut self, client: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.preview.is_interactive() {
            return actions;
        }
        let p = to_canvas_coordinates(client, &self.viewport);

        match self.gesture.clone() {
            Gesture::Idle => {
                let cursor = self.hover_cursor(p);
                self.set_cursor(cursor, &mut actions);
            }
            Gesture::Dragging { id, offset } => {
                let Some(element) = self.project.design_mut(&id) else {
                    self.gesture = Gesture::Idle;
                    return actions;
                };
                let to = p - offset;
                element.x = to.x;
                element.y = to.y;
                self.project.touch();
                actions.push(Action::ProjectUpdated(self.project.clone()));
            }
            Gesture::Resizing {
                id,
                handle,
                origin,
                start,
            } => {
                let aspect_locked = self.aspect_locked;
                let Some(element) = self.project.design_mut(&id) else {
                    self.gesture = Gesture::Idle;
                    return actions;
                };
                element.set_bounds(resize_from_handle(start, handle, p - origin, aspect_locked));
                self.project.touch();
                actions.push(Action::ProjectUpdated(self.project.clone()));
            }
        }
        actions
    }

    /// Ends any gesture; the selection survives.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        self.gesture = Gesture::Idle;
        Vec::new()
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.on_pointer_up()
    }

    fn hover_cursor(&self, p: Point) -> Cursor {
        let Some(hovered) = self.project.designs.iter().rev().find(|d| d.contains(p.x, p.y)) else {
            return Cursor::Default;
        };
        if self.selected.as_deref() == Some(hovered.id.as_str())
            && let Some(handle) = hit_test_handle(p, hovered.bounds())
        {
            return Cursor::Resize(handle);
        }
        Cursor::Move
    }

    fn set_cursor(&mut self, cursor: Cursor, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor;
            actions.push(Action::SetCursor(cursor));
        }
    }
}
