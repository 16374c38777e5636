//! Project-level operations: creating projects, adding and removing design
//! elements, and manual property edits from the properties panel.
//!
//! Every mutating method bumps `updated_at`; callers hand the whole project
//! to the persistence sink afterwards.

use crate::geometry::MIN_ELEMENT_SIZE;
use crate::types::{DesignElement, MockupProject, UploadedImage, generate_id};
use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;

/// Where a freshly added design lands.
pub const DEFAULT_POSITION: (f64, f64) = (200.0, 200.0);

/// Longest side of a freshly added design.
pub const MAX_DISPLAY_SIZE: f64 = 300.0;

/// Size used for an axis whose natural size is unknown.
pub const FALLBACK_DISPLAY_SIZE: f64 = 150.0;

#[derive(Error, Debug, PartialEq)]
pub enum EditError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no design element with id {0}")]
    UnknownElement(String),
    #[error("inconsistent project: {0}")]
    Inconsistent(String),
}

/// A single edit from the properties panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DesignEdit {
    X(f64),
    Y(f64),
    Width(f64),
    Height(f64),
    Rotation(f64),
    Opacity(f64),
}

impl DesignEdit {
    /// Parse a `field`/`value` pair as typed into a form.
    pub fn parse(field: &str, value: &str) -> Result<Self, EditError> {
        let number: f64 = value
            .trim()
            .parse()
            .map_err(|_| EditError::InvalidInput(format!("{field}: not a number: {value:?}")))?;
        let edit = match field {
            "x" => DesignEdit::X(number),
            "y" => DesignEdit::Y(number),
            "width" => DesignEdit::Width(number),
            "height" => DesignEdit::Height(number),
            "rotation" => DesignEdit::Rotation(number),
            "opacity" => DesignEdit::Opacity(number),
            other => return Err(EditError::InvalidInput(format!("unknown field: {other}"))),
        };
        Ok(edit)
    }

    fn value(self) -> f64 {
        match self {
            DesignEdit::X(v)
            | DesignEdit::Y(v)
            | DesignEdit::Width(v)
            | DesignEdit::Height(v)
            | DesignEdit::Rotation(v)
            | DesignEdit::Opacity(v) => v,
        }
    }
}

/// Initial display size for an image of natural size `width × height`.
///
/// Unknown axes fall back to 150. If either side exceeds 300 the longer side
/// is capped at 300 and the other follows the aspect ratio. Both sides are
/// then raised to the 20px element minimum.
pub fn initial_display_size(width: Option<u32>, height: Option<u32>) -> (f64, f64) {
    let w = width.filter(|&w| w > 0).map_or(FALLBACK_DISPLAY_SIZE, f64::from);
    let h = height.filter(|&h| h > 0).map_or(FALLBACK_DISPLAY_SIZE, f64::from);
    let (w, h) = if w <= MAX_DISPLAY_SIZE && h <= MAX_DISPLAY_SIZE {
        (w, h)
    } else if w > h {
        (MAX_DISPLAY_SIZE, MAX_DISPLAY_SIZE * h / w)
    } else {
        (MAX_DISPLAY_SIZE * w / h, MAX_DISPLAY_SIZE)
    };
    (w.max(MIN_ELEMENT_SIZE), h.max(MIN_ELEMENT_SIZE))
}

impl MockupProject {
    /// An empty project over `blank_id`.
    pub fn new(name: impl Into<String>, blank_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: name.into(),
            blank_id: blank_id.into(),
            designs: Vec::new(),
            created_at: now,
            updated_at: now,
            thumbnail: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn design(&self, id: &str) -> Option<&DesignElement> {
        self.designs.iter().find(|d| d.id == id)
    }

    pub fn design_mut(&mut self, id: &str) -> Option<&mut DesignElement> {
        self.designs.iter_mut().find(|d| d.id == id)
    }

    /// Place `image` on top of the stack at the default position.
    pub fn add_design(&mut self, image: &UploadedImage) -> &DesignElement {
        let (width, height) = initial_display_size(image.original_width, image.original_height);
        let element = DesignElement {
            id: generate_id(),
            image_id: image.id.clone(),
            x: DEFAULT_POSITION.0,
            y: DEFAULT_POSITION.1,
            width,
            height,
            rotation: 0.0,
            z_index: self.designs.len() as u32,
            original_width: image.original_width.map(f64::from),
            original_height: image.original_height.map(f64::from),
            opacity: Some(100.0),
        };
        self.designs.push(element);
        self.touch();
        &self.designs[self.designs.len() - 1]
    }

    /// Remove the element with `id`, returning it if it existed.
    pub fn remove_design(&mut self, id: &str) -> Option<DesignElement> {
        let index = self.designs.iter().position(|d| d.id == id)?;
        let removed = self.designs.remove(index);
        self.touch();
        Some(removed)
    }

    /// Number of elements that referenced `image_id` and were removed.
    pub fn remove_designs_of_image(&mut self, image_id: &str) -> usize {
        let before = self.designs.len();
        self.designs.retain(|d| d.image_id != image_id);
        let removed = before - self.designs.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn swap_blank(&mut self, blank_id: impl Into<String>) {
        self.blank_id = blank_id.into();
        self.touch();
    }

    /// Apply a manual property edit to one element.
    ///
    /// Sizes are floored at the element minimum and opacity is clamped to
    /// 0–100. With `aspect_locked`, a width or height edit carries the other
    /// dimension along at the element's current ratio.
    pub fn apply_edit(&mut self, element_id: &str, edit: DesignEdit, aspect_locked: bool) -> Result<(), EditError> {
        let value = edit.value();
        if !value.is_finite() {
            return Err(EditError::InvalidInput(format!("{edit:?} is not a finite number")));
        }
        let element = self
            .design_mut(element_id)
            .ok_or_else(|| EditError::UnknownElement(element_id.to_string()))?;
        let aspect = element.width / element.height;
        let proportional = aspect_locked && aspect.is_finite() && aspect > 0.0;

        match edit {
            DesignEdit::X(x) => element.x = x,
            DesignEdit::Y(y) => element.y = y,
            DesignEdit::Width(w) => {
                element.width = w.max(MIN_ELEMENT_SIZE);
                if proportional {
                    element.height = (element.width / aspect).max(MIN_ELEMENT_SIZE);
                }
            }
            DesignEdit::Height(h) => {
                element.height = h.max(MIN_ELEMENT_SIZE);
                if proportional {
                    element.width = (element.height * aspect).max(MIN_ELEMENT_SIZE);
                }
            }
            DesignEdit::Rotation(r) => element.rotation = r,
            DesignEdit::Opacity(o) => element.opacity = Some(o.clamp(0.0, 100.0)),
        }
        self.touch();
        Ok(())
    }

    /// Check a project read back from storage.
    pub fn validate(&self) -> Result<(), EditError> {
        let mut seen = HashSet::new();
        for element in &self.designs {
            if !seen.insert(element.id.as_str()) {
                return Err(EditError::Inconsistent(format!("duplicate element id {}", element.id)));
            }
            if element.width < MIN_ELEMENT_SIZE || element.height < MIN_ELEMENT_SIZE {
                return Err(EditError::Inconsistent(format!(
                    "element {} is smaller than {MIN_ELEMENT_SIZE}px",
                    element.id
                )));
            }
            if let Some(opacity) = element.opacity
                && !(0.0..=100.0).contains(&opacity)
            {
                return Err(EditError::Inconsistent(format!(
                    "element {} has opacity {opacity} outside 0-100",
                    element.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{design_image, element, project_with};

    #[test]
    fn new_project_is_empty() {
        let project = MockupProject::new("Tee", "blank-1");
        assert!(project.designs.is_empty());
        assert_eq!(project.created_at, project.updated_at);
        assert_eq!(project.blank_id, "blank-1");
    }

    #[test]
    fn initial_size_keeps_small_images() {
        assert_eq!(initial_display_size(Some(120), Some(80)), (120.0, 80.0));
    }

    #[test]
    fn initial_size_caps_longer_side() {
        assert_eq!(initial_display_size(Some(1200), Some(600)), (300.0, 150.0));
        assert_eq!(initial_display_size(Some(500), Some(1000)), (150.0, 300.0));
        assert_eq!(initial_display_size(Some(900), Some(900)), (300.0, 300.0));
    }

    #[test]
    fn initial_size_never_drops_below_minimum() {
        assert_eq!(initial_display_size(Some(1000), Some(10)), (300.0, 20.0));
        assert_eq!(initial_display_size(Some(8), Some(8)), (20.0, 20.0));
        assert_eq!(initial_display_size(Some(10), Some(1000)), (20.0, 300.0));
    }

    #[test]
    fn banner_and_tiny_designs_keep_the_project_valid() {
        let mut project = MockupProject::new("Tee", "blank");
        project.add_design(&design_image("banner", 1000, 10));
        project.add_design(&design_image("tiny", 8, 8));
        let sizes: Vec<(f64, f64)> = project.designs.iter().map(|d| (d.width, d.height)).collect();
        assert_eq!(sizes, vec![(300.0, 20.0), (20.0, 20.0)]);
        assert_eq!(project.validate(), Ok(()));
    }

    #[test]
    fn initial_size_falls_back_per_axis() {
        assert_eq!(initial_display_size(None, None), (150.0, 150.0));
        assert_eq!(initial_display_size(Some(600), None), (300.0, 75.0));
    }

    #[test]
    fn add_design_uses_defaults() {
        let mut project = project_with(vec![element("e0", "red", 0.0, 0.0, 50.0, 50.0)]);
        let image = design_image("logo", 1000, 500);
        let added = project.add_design(&image).clone();
        assert_eq!((added.x, added.y), DEFAULT_POSITION);
        assert_eq!((added.width, added.height), (300.0, 150.0));
        assert_eq!(added.z_index, 1);
        assert_eq!(added.opacity, Some(100.0));
        assert_eq!(added.original_width, Some(1000.0));
        assert_eq!(project.designs.last().map(|d| d.id.as_str()), Some(added.id.as_str()));
    }

    #[test]
    fn remove_design_only_touches_that_element() {
        let mut project = project_with(vec![
            element("a", "red", 0.0, 0.0, 50.0, 50.0),
            element("b", "red", 0.0, 0.0, 50.0, 50.0),
        ]);
        let removed = project.remove_design("a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(project.designs.len(), 1);
        assert!(project.remove_design("a").is_none());
    }

    #[test]
    fn removing_an_image_drops_its_elements() {
        let mut project = project_with(vec![
            element("a", "red", 0.0, 0.0, 50.0, 50.0),
            element("b", "blue", 0.0, 0.0, 50.0, 50.0),
            element("c", "red", 0.0, 0.0, 50.0, 50.0),
        ]);
        assert_eq!(project.remove_designs_of_image("red"), 2);
        assert_eq!(project.designs[0].id, "b");
    }

    #[test]
    fn rename_and_swap_blank_bump_updated_at() {
        let mut project = project_with(vec![]);
        let before = project.updated_at;
        project.rename("Hoodie");
        project.swap_blank("blank-2");
        assert_eq!(project.name, "Hoodie");
        assert_eq!(project.blank_id, "blank-2");
        assert!(project.updated_at >= before);
    }

    #[test]
    fn proportional_width_edit() {
        let mut project = project_with(vec![element("e", "red", 0.0, 0.0, 200.0, 100.0)]);
        project.apply_edit("e", DesignEdit::Width(300.0), true).unwrap();
        let e = project.design("e").unwrap();
        assert_eq!((e.width, e.height), (300.0, 150.0));

        project.apply_edit("e", DesignEdit::Height(50.0), false).unwrap();
        let e = project.design("e").unwrap();
        assert_eq!((e.width, e.height), (300.0, 50.0));
    }

    #[test]
    fn edits_are_clamped() {
        let mut project = project_with(vec![element("e", "red", 0.0, 0.0, 200.0, 100.0)]);
        project.apply_edit("e", DesignEdit::Width(1.0), false).unwrap();
        project.apply_edit("e", DesignEdit::Opacity(140.0), false).unwrap();
        let e = project.design("e").unwrap();
        assert_eq!(e.width, MIN_ELEMENT_SIZE);
        assert_eq!(e.opacity, Some(100.0));
        project.apply_edit("e", DesignEdit::Opacity(-3.0), false).unwrap();
        assert_eq!(project.design("e").unwrap().opacity, Some(0.0));
    }

    #[test]
    fn non_finite_and_unknown_edits_are_rejected() {
        let mut project = project_with(vec![element("e", "red", 0.0, 0.0, 200.0, 100.0)]);
        let before = project.clone();
        assert!(matches!(
            project.apply_edit("e", DesignEdit::X(f64::NAN), false),
            Err(EditError::InvalidInput(_))
        ));
        assert_eq!(
            project.apply_edit("zz", DesignEdit::X(1.0), false),
            Err(EditError::UnknownElement("zz".into()))
        );
        assert_eq!(project, before);
    }

    #[test]
    fn parse_form_values() {
        assert_eq!(DesignEdit::parse("rotation", " -45 ").unwrap(), DesignEdit::Rotation(-45.0));
        assert!(matches!(DesignEdit::parse("x", "abc"), Err(EditError::InvalidInput(_))));
        assert!(matches!(DesignEdit::parse("skew", "1"), Err(EditError::InvalidInput(_))));
    }

    #[test]
    fn validate_catches_duplicates_and_undersized() {
        let ok = project_with(vec![element("a", "red", 0.0, 0.0, 50.0, 50.0)]);
        assert!(ok.validate().is_ok());

        let dup = project_with(vec![
            element("a", "red", 0.0, 0.0, 50.0, 50.0),
            element("a", "red", 0.0, 0.0, 50.0, 50.0),
        ]);
        assert!(dup.validate().is_err());

        let small = project_with(vec![element("a", "red", 0.0, 0.0, 5.0, 50.0)]);
        assert!(small.validate().is_err());
    }
}
