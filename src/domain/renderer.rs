//! Renderer - Layer Renderer Descriptors
//!
//! Plain data handed to the map surface, which swaps a layer's renderer
//! atomically.

use serde::{Deserialize, Serialize};

/// Symbol drawn for each feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Symbol {
    SimpleLine {
        color: String,
        width: f64,
    },
    SimpleMarker {
        /// RGBA fill
        color: [u8; 4],
        outline_color: String,
        outline_width: f64,
        size: f64,
    },
}

/// Visual parameter at a stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopParam {
    Size(f64),
    Opacity(f64),
    Color(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub value: f64,
    pub param: StopParam,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Stop {
    pub fn size(value: f64, size: f64) -> Self {
        Self {
            value,
            param: StopParam::Size(size),
            label: None,
        }
    }

    pub fn opacity(value: f64, opacity: f64) -> Self {
        Self {
            value,
            param: StopParam::Opacity(opacity),
            label: None,
        }
    }

    pub fn color(value: f64, color: impl Into<String>) -> Self {
        Self {
            value,
            param: StopParam::Color(color.into()),
            label: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Size,
    Opacity,
    Color,
}

/// One data-driven visual channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualVariable {
    pub channel: Channel,
    pub field: String,
    pub stops: Vec<Stop>,
}

/// Complete renderer for one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererDescriptor {
    pub symbol: Symbol,
    pub visual_variables: Vec<VisualVariable>,
}

impl RendererDescriptor {
    /// First visual variable on a channel
    pub fn channel(&self, channel: Channel) -> Option<&VisualVariable> {
        self.visual_variables.iter().find(|v| v.channel == channel)
    }

    /// Re-point every visual variable at a new field
    pub fn with_field(mut self, field: &str) -> Self {
        for variable in &mut self.visual_variables {
            variable.field = field.to_string();
        }
        self
    }
}
