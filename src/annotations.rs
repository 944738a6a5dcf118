//! Annotation model: the four renderable entity kinds and their options.
//!
//! This module defines the entities mirrored by the controller (`Symbol`,
//! `Line`, `Circle`, `Fill`), one all-optional options record per kind, and
//! the sparse-merge rules used everywhere an options record is combined with
//! another: a present field in the change set wins, an absent field keeps the
//! base value, and nothing is ever cleared.
//!
//! Identifiers are assigned by the remote renderer when an entity is created
//! and never change afterwards. Entities are value-like: updating one means
//! replacing the stored record with a merged copy, not mutating it in place.

#[cfg(test)]
#[path = "annotations_test.rs"]
mod annotations_test;

use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// The kind of a map annotation. Used for registry routing and error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Symbol,
    Line,
    Circle,
    Fill,
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Symbol => "symbol",
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Fill => "fill",
        };
        f.write_str(name)
    }
}

// =============================================================================
// SYMBOL
// =============================================================================

/// A point annotation rendered as an icon and/or a text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    id: String,
    pub options: SymbolOptions,
}

impl Symbol {
    pub(crate) fn new(id: String, options: SymbolOptions) -> Self {
        Self { id, options }
    }

    /// Renderer-assigned identifier, stable for the entity's lifetime.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Style and geometry options for a [`Symbol`]. All fields are optional;
/// absent fields keep their previous (or default) value when merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<LngLat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_rotate: Option<f64>,
    /// Icon offset in ems, `[right, down]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_offset: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Text offset in ems, `[right, down]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_offset: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_anchor: Option<String>,
    /// Stacking order among symbols; higher draws on top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

impl SymbolOptions {
    /// The base record merged under caller options on every add.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            geometry: Some(LngLat::default()),
            icon_image: None,
            icon_size: Some(1.0),
            icon_rotate: Some(0.0),
            icon_offset: Some([0.0, 0.0]),
            icon_anchor: Some("center".to_owned()),
            icon_opacity: Some(1.0),
            text_field: None,
            text_size: Some(16.0),
            text_color: Some("#000000".to_owned()),
            text_offset: Some([0.0, 0.0]),
            text_anchor: Some("center".to_owned()),
            z_index: Some(0),
            draggable: Some(false),
        }
    }

    /// Overlay `changes` on `self`: present fields win, absent fields keep
    /// the base value.
    #[must_use]
    pub fn merged(&self, changes: &Self) -> Self {
        Self {
            geometry: changes.geometry.or(self.geometry),
            icon_image: changes.icon_image.clone().or_else(|| self.icon_image.clone()),
            icon_size: changes.icon_size.or(self.icon_size),
            icon_rotate: changes.icon_rotate.or(self.icon_rotate),
            icon_offset: changes.icon_offset.or(self.icon_offset),
            icon_anchor: changes.icon_anchor.clone().or_else(|| self.icon_anchor.clone()),
            icon_opacity: changes.icon_opacity.or(self.icon_opacity),
            text_field: changes.text_field.clone().or_else(|| self.text_field.clone()),
            text_size: changes.text_size.or(self.text_size),
            text_color: changes.text_color.clone().or_else(|| self.text_color.clone()),
            text_offset: changes.text_offset.or(self.text_offset),
            text_anchor: changes.text_anchor.clone().or_else(|| self.text_anchor.clone()),
            z_index: changes.z_index.or(self.z_index),
            draggable: changes.draggable.or(self.draggable),
        }
    }
}

// =============================================================================
// LINE
// =============================================================================

/// A polyline annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    id: String,
    pub options: LineOptions,
}

impl Line {
    pub(crate) fn new(id: String, options: LineOptions) -> Self {
        Self { id, options }
    }

    /// Renderer-assigned identifier, stable for the entity's lifetime.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Style and geometry options for a [`Line`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineOptions {
    /// Vertices in draw order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<LngLat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_join: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

impl LineOptions {
    /// The base record merged under caller options on every add.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            geometry: Some(Vec::new()),
            line_join: Some("miter".to_owned()),
            line_color: Some("#000000".to_owned()),
            line_width: Some(1.0),
            line_opacity: Some(1.0),
            line_offset: Some(0.0),
            line_blur: Some(0.0),
            draggable: Some(false),
        }
    }

    /// Overlay `changes` on `self`: present fields win, absent fields keep
    /// the base value.
    #[must_use]
    pub fn merged(&self, changes: &Self) -> Self {
        Self {
            geometry: changes.geometry.clone().or_else(|| self.geometry.clone()),
            line_join: changes.line_join.clone().or_else(|| self.line_join.clone()),
            line_color: changes.line_color.clone().or_else(|| self.line_color.clone()),
            line_width: changes.line_width.or(self.line_width),
            line_opacity: changes.line_opacity.or(self.line_opacity),
            line_offset: changes.line_offset.or(self.line_offset),
            line_blur: changes.line_blur.or(self.line_blur),
            draggable: changes.draggable.or(self.draggable),
        }
    }
}

// =============================================================================
// CIRCLE
// =============================================================================

/// A circle annotation with a pixel radius anchored at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    id: String,
    pub options: CircleOptions,
}

impl Circle {
    pub(crate) fn new(id: String, options: CircleOptions) -> Self {
        Self { id, options }
    }

    /// Renderer-assigned identifier, stable for the entity's lifetime.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Style and geometry options for a [`Circle`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<LngLat>,
    /// Radius in logical pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_stroke_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

impl CircleOptions {
    /// The base record merged under caller options on every add.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            geometry: Some(LngLat::default()),
            circle_radius: Some(5.0),
            circle_color: Some("#000000".to_owned()),
            circle_blur: Some(0.0),
            circle_opacity: Some(1.0),
            circle_stroke_color: Some("#000000".to_owned()),
            circle_stroke_width: Some(0.0),
            circle_stroke_opacity: Some(1.0),
            draggable: Some(false),
        }
    }

    /// Overlay `changes` on `self`: present fields win, absent fields keep
    /// the base value.
    #[must_use]
    pub fn merged(&self, changes: &Self) -> Self {
        Self {
            geometry: changes.geometry.or(self.geometry),
            circle_radius: changes.circle_radius.or(self.circle_radius),
            circle_color: changes.circle_color.clone().or_else(|| self.circle_color.clone()),
            circle_blur: changes.circle_blur.or(self.circle_blur),
            circle_opacity: changes.circle_opacity.or(self.circle_opacity),
            circle_stroke_color: changes
                .circle_stroke_color
                .clone()
                .or_else(|| self.circle_stroke_color.clone()),
            circle_stroke_width: changes.circle_stroke_width.or(self.circle_stroke_width),
            circle_stroke_opacity: changes.circle_stroke_opacity.or(self.circle_stroke_opacity),
            draggable: changes.draggable.or(self.draggable),
        }
    }
}

// =============================================================================
// FILL
// =============================================================================

/// A filled polygon annotation. Geometry is a list of rings: the first ring
/// is the outer boundary, any further rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    id: String,
    pub options: FillOptions,
}

impl Fill {
    pub(crate) fn new(id: String, options: FillOptions) -> Self {
        Self { id, options }
    }

    /// Renderer-assigned identifier, stable for the entity's lifetime.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Style and geometry options for a [`Fill`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillOptions {
    /// Polygon rings; outer boundary first, holes after.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Vec<LngLat>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_outline_color: Option<String>,
    /// Name of an image registered with the renderer, tiled over the fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

impl FillOptions {
    /// The base record merged under caller options on every add.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            geometry: Some(Vec::new()),
            fill_opacity: Some(1.0),
            fill_color: Some("#000000".to_owned()),
            fill_outline_color: Some("#000000".to_owned()),
            fill_pattern: None,
            draggable: Some(false),
        }
    }

    /// Overlay `changes` on `self`: present fields win, absent fields keep
    /// the base value.
    #[must_use]
    pub fn merged(&self, changes: &Self) -> Self {
        Self {
            geometry: changes.geometry.clone().or_else(|| self.geometry.clone()),
            fill_opacity: changes.fill_opacity.or(self.fill_opacity),
            fill_color: changes.fill_color.clone().or_else(|| self.fill_color.clone()),
            fill_outline_color: changes
                .fill_outline_color
                .clone()
                .or_else(|| self.fill_outline_color.clone()),
            fill_pattern: changes.fill_pattern.clone().or_else(|| self.fill_pattern.clone()),
            draggable: changes.draggable.or(self.draggable),
        }
    }
}
