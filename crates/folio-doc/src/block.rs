//! Positionable text box attributes.
//!
//! A text box is a block node with absolute geometry. All geometry changes go
//! through [`TextBoxAttrs::merged`], which validates the complete result
//! before anything is written, so a node never holds a half-applied patch.

use std::fmt::Write;

/// Default left offset in layout units.
pub const DEFAULT_X: f64 = 40.0;
/// Default top offset in layout units.
pub const DEFAULT_Y: f64 = 40.0;
/// Default width in layout units.
pub const DEFAULT_WIDTH: f64 = 260.0;
/// Default height in layout units.
pub const DEFAULT_HEIGHT: f64 = 140.0;
/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
/// Default border color (slate gray).
pub const DEFAULT_BORDER_COLOR: &str = "#94a3b8";

/// Attributes of a positionable text box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextBoxAttrs {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Label rendered above the content.
    pub title: Option<String>,
    /// Text flows top-to-bottom, columns right-to-left.
    pub vertical: bool,
    pub background: String,
    pub border_color: String,
    /// Grid used to round geometry during drag and resize.
    pub snap_increment: Option<f64>,
}

impl Default for TextBoxAttrs {
    fn default() -> Self {
        Self {
            x: DEFAULT_X,
            y: DEFAULT_Y,
            w: DEFAULT_WIDTH,
            h: DEFAULT_HEIGHT,
            title: None,
            vertical: false,
            background: DEFAULT_BACKGROUND.to_owned(),
            border_color: DEFAULT_BORDER_COLOR.to_owned(),
            snap_increment: None,
        }
    }
}

/// Partial attribute update.
///
/// `None` leaves a field untouched. The nested options on `title` and
/// `snap_increment` distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub title: Option<Option<String>>,
    pub vertical: Option<bool>,
    pub background: Option<String>,
    pub border_color: Option<String>,
    pub snap_increment: Option<Option<f64>>,
}

impl AttrPatch {
    /// Patch that moves the origin.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that sets the full rectangle.
    #[must_use]
    pub fn geometry(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    #[must_use]
    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = Some(vertical);
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_border_color(mut self, color: impl Into<String>) -> Self {
        self.border_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_snap(mut self, increment: f64) -> Self {
        self.snap_increment = Some(Some(increment));
        self
    }

    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Rejected geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// NaN or infinite coordinate.
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    /// Zero or negative width/height.
    #[error("{field} must be greater than 0 (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    /// Zero, negative or non-finite snap grid.
    #[error("snap increment must be a positive number (got {0})")]
    InvalidSnap(f64),
}

/// Policy for programmatic geometry updates that leave the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CanvasPolicy {
    /// Store coordinates as given; the renderer clips.
    #[default]
    Allow,
    /// Clamp the box so it stays inside a canvas of this size.
    Clamp { width: f64, height: f64 },
}

impl CanvasPolicy {
    /// Apply the policy to validated attributes.
    #[must_use]
    pub fn apply(self, mut attrs: TextBoxAttrs) -> TextBoxAttrs {
        if let Self::Clamp { width, height } = self {
            attrs.w = attrs.w.min(width);
            attrs.h = attrs.h.min(height);
            attrs.x = attrs.x.clamp(0.0, (width - attrs.w).max(0.0));
            attrs.y = attrs.y.clamp(0.0, (height - attrs.h).max(0.0));
        }
        attrs
    }
}

impl TextBoxAttrs {
    /// Defaults with `patch` merged over them.
    pub fn from_patch(patch: &AttrPatch) -> Result<Self, GeometryError> {
        Self::default().merged(patch)
    }

    /// Return a copy with `patch` applied, or an error if the result is invalid.
    ///
    /// `self` is never modified, so callers can swap the result in with a
    /// single assignment.
    pub fn merged(&self, patch: &AttrPatch) -> Result<Self, GeometryError> {
        let mut next = self.clone();
        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(w) = patch.w {
            next.w = w;
        }
        if let Some(h) = patch.h {
            next.h = h;
        }
        if let Some(title) = &patch.title {
            next.title.clone_from(title);
        }
        if let Some(vertical) = patch.vertical {
            next.vertical = vertical;
        }
        if let Some(background) = &patch.background {
            next.background.clone_from(background);
        }
        if let Some(border) = &patch.border_color {
            next.border_color.clone_from(border);
        }
        if let Some(snap) = patch.snap_increment {
            next.snap_increment = snap;
        }
        next.validate()?;
        Ok(next)
    }

    /// Check the geometry invariants.
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (field, value) in [("x", self.x), ("y", self.y), ("w", self.w), ("h", self.h)] {
            if !value.is_finite() {
                return Err(GeometryError::NotFinite { field });
            }
        }
        if self.w <= 0.0 {
            return Err(GeometryError::NonPositive {
                field: "w",
                value: self.w,
            });
        }
        if self.h <= 0.0 {
            return Err(GeometryError::NonPositive {
                field: "h",
                value: self.h,
            });
        }
        if let Some(snap) = self.snap_increment
            && !(snap.is_finite() && snap > 0.0)
        {
            return Err(GeometryError::InvalidSnap(snap));
        }
        Ok(())
    }

    /// Round a coordinate to the snap grid (identity without a grid).
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        match self.snap_increment {
            Some(inc) => (value / inc).round() * inc,
            None => value,
        }
    }

    /// Round a length to the snap grid, never below one grid step.
    #[must_use]
    pub fn snap_length(&self, value: f64) -> f64 {
        match self.snap_increment {
            Some(inc) => self.snap(value).max(inc),
            None => value,
        }
    }

    /// Inline CSS for the outer container.
    #[must_use]
    pub fn container_style(&self) -> String {
        let mut style = String::with_capacity(160);
        write!(
            style,
            "position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;",
            self.x, self.y, self.w, self.h
        )
        .unwrap();
        write!(
            style,
            "background:{};border:1px solid {};box-sizing:border-box;",
            self.background, self.border_color
        )
        .unwrap();
        style
    }

    /// Inline CSS for the scrollable content region.
    #[must_use]
    pub fn content_style(&self) -> &'static str {
        if self.vertical {
            "overflow:auto;writing-mode:vertical-rl;text-orientation:mixed;"
        } else {
            "overflow:auto;"
        }
    }
}
