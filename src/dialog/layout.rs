//! Dialog geometry: size limits, placement and the resize policy

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn saturating_add(self, other: Size) -> Size {
        Size::new(
            self.width.saturating_add(other.width),
            self.height.saturating_add(other.height),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Area a dialog must stay inside
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Height reserved at the top, e.g. by a fixed menu bar
    #[serde(default)]
    pub top_offset: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            top_offset: 0,
        }
    }

    pub fn with_top_offset(mut self, top_offset: u32) -> Self {
        self.top_offset = top_offset;
        self
    }

    /// Top-left corner of the usable area
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y.saturating_add(to_i32(self.top_offset)))
    }

    /// Size of the usable area
    pub fn usable_size(&self) -> Size {
        Size::new(self.width, self.height.saturating_sub(self.top_offset))
    }
}

/// Minimum and maximum dialog size; `max` is never below `min`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    min: Size,
    max: Size,
}

impl SizeLimits {
    pub fn new(min: Size, max: Size) -> Self {
        Self {
            min,
            max: Size::new(max.width.max(min.width), max.height.max(min.height)),
        }
    }

    pub fn unbounded(min: Size) -> Self {
        Self::new(min, Size::new(u32::MAX, u32::MAX))
    }

    /// Cap the maximum by the usable area of `viewport`
    pub fn within(self, viewport: Option<&Viewport>) -> Self {
        match viewport {
            Some(viewport) => {
                let area = viewport.usable_size();
                Self::new(
                    self.min,
                    Size::new(self.max.width.min(area.width), self.max.height.min(area.height)),
                )
            }
            None => self,
        }
    }

    pub fn min(&self) -> Size {
        self.min
    }

    pub fn max(&self) -> Size {
        self.max
    }

    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            size.width.clamp(self.min.width, self.max.width),
            size.height.clamp(self.min.height, self.max.height),
        )
    }
}

/// Initial placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Position {
    #[default]
    Center,
    /// Centered, then moved by the offset
    Offset { x: i32, y: i32 },
    /// Top-left corner at the given point
    At { x: i32, y: i32 },
}

/// Top-left corner for a dialog of `size`.
///
/// Inside a viewport the result is moved back so the dialog does not cross
/// its edges; a dialog larger than the viewport sticks to its origin.
pub fn place(size: Size, position: &Position, within: Option<&Viewport>) -> Point {
    let Some(viewport) = within else {
        return match *position {
            Position::Center => Point::default(),
            Position::Offset { x, y } | Position::At { x, y } => Point::new(x, y),
        };
    };

    let origin = viewport.origin();
    let area = viewport.usable_size();
    let centered = Point::new(
        origin.x.saturating_add((to_i32(area.width) - to_i32(size.width)) / 2),
        origin.y.saturating_add((to_i32(area.height) - to_i32(size.height)) / 2),
    );

    let wanted = match *position {
        Position::Center => centered,
        Position::Offset { x, y } => Point::new(centered.x.saturating_add(x), centered.y.saturating_add(y)),
        Position::At { x, y } => Point::new(x, y),
    };

    Point::new(
        fit_axis(wanted.x, origin.x, area.width, size.width),
        fit_axis(wanted.y, origin.y, area.height, size.height),
    )
}

fn fit_axis(wanted: i32, origin: i32, area: u32, size: u32) -> i32 {
    let far = origin.saturating_add((to_i32(area) - to_i32(size)).max(0));
    wanted.clamp(origin, far)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Auto,
    Px(u32),
}

/// Minimum height of the frame inside the dialog body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMinHeight {
    /// Follows the overlay so a shrinking dialog keeps its loader visible
    TrackOverlay,
    Px(u32),
}

/// Geometry a toolkit applies on resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub size: Size,
    pub width: Dimension,
    pub frame_min_height: FrameMinHeight,
    pub body_max_height: Option<u32>,
}

/// Resize to `requested`, clamped to `limits`
pub fn plan_resize(requested: Size, limits: &SizeLimits, shrink: bool, frame_height: u32) -> ResizePlan {
    let size = limits.clamp(requested);

    if shrink {
        ResizePlan {
            size,
            width: Dimension::Auto,
            frame_min_height: FrameMinHeight::TrackOverlay,
            body_max_height: None,
        }
    } else {
        ResizePlan {
            size,
            width: Dimension::Px(size.width),
            frame_min_height: FrameMinHeight::Px(frame_height),
            body_max_height: None,
        }
    }
}

/// Resize to fit measured `content` plus the dialog `chrome` around it
pub fn plan_fit(content: Size, chrome: Size, limits: &SizeLimits, shrink: bool) -> ResizePlan {
    let size = limits.clamp(content.saturating_add(chrome));
    let body_max_height = size.height.saturating_sub(chrome.height);

    ResizePlan {
        size,
        width: if shrink {
            Dimension::Auto
        } else {
            Dimension::Px(size.width)
        },
        frame_min_height: if shrink {
            FrameMinHeight::TrackOverlay
        } else {
            FrameMinHeight::Px(content.height.min(body_max_height))
        },
        body_max_height: Some(body_max_height),
    }
}
