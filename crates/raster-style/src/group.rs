//! Group styles: ordered (layer, style) bindings from a `StyledLayerDescriptor`.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use raster_common::{RasterError, RasterResult};

use crate::xml::{QuickXmlProvider, XmlElement, XmlTreeProvider};

/// Style name that is valid for every layer without a catalog lookup.
pub const DEFAULT_STYLE: &str = "default";

/// Lookup of known layers and their styles, used to validate group styles.
pub trait StyleCatalog {
    fn has_layer(&self, layer: &str) -> bool;
    fn has_style(&self, layer: &str, style: &str) -> bool;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryStyleCatalog {
    layers: HashMap<String, HashSet<String>>,
}

impl MemoryStyleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: impl Into<String>) {
        self.layers.entry(layer.into()).or_default();
    }

    pub fn add_style(&mut self, layer: impl Into<String>, style: impl Into<String>) {
        self.layers.entry(layer.into()).or_default().insert(style.into());
    }
}

impl StyleCatalog for MemoryStyleCatalog {
    fn has_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    fn has_style(&self, layer: &str, style: &str) -> bool {
        self.layers
            .get(layer)
            .map_or(false, |styles| styles.contains(style))
    }
}

/// One `NamedLayer` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedLayerRef {
    pub layer: String,
    pub style: String,
    pub valid_layer: bool,
    pub valid_style: bool,
}

impl NamedLayerRef {
    pub fn is_valid(&self) -> bool {
        self.valid_layer && self.valid_style
    }
}

/// A named collection of layer/style bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStyle {
    name: String,
    title: Option<String>,
    abstract_text: Option<String>,
    entries: Vec<NamedLayerRef>,
    valid: bool,
}

impl GroupStyle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn entries(&self) -> &[NamedLayerRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&NamedLayerRef> {
        self.entries.get(index)
    }

    /// Aggregate validity; false until [`GroupStyle::validate`] has run.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Fill the per-entry validity flags from a catalog.
    pub fn validate(&mut self, catalog: &dyn StyleCatalog) {
        for entry in &mut self.entries {
            entry.valid_layer = catalog.has_layer(&entry.layer);
            entry.valid_style = entry.style == DEFAULT_STYLE
                || (entry.valid_layer && catalog.has_style(&entry.layer, &entry.style));
        }
        self.valid = self.entries.iter().all(NamedLayerRef::is_valid);
        debug!(group = %self.name, valid = self.valid, "Validated group style");
    }

    /// Parse a serialized document with the quick-xml tree provider.
    pub fn from_xml_str(xml: &str, name: Option<&str>) -> RasterResult<Self> {
        let root = QuickXmlProvider.parse_str(xml)?;
        parse_group_style(&root, name, None, None)
    }
}

/// Parse a `StyledLayerDescriptor` into a group style.
///
/// `NamedLayer` entries without a `Name` are dropped. A missing
/// `NamedStyle/Name` binds the layer's default style.
pub fn parse_group_style(
    root: &XmlElement,
    name: Option<&str>,
    title: Option<&str>,
    abstract_text: Option<&str>,
) -> RasterResult<GroupStyle> {
    if root.name != "StyledLayerDescriptor" {
        return Err(RasterError::malformed(format!(
            "expected StyledLayerDescriptor, found {}",
            root.name
        )));
    }

    let name = name
        .map(str::to_string)
        .or_else(|| root.child_text("Name"))
        .unwrap_or_default();
    let description = root.child("Description");
    let title = title
        .map(str::to_string)
        .or_else(|| description.and_then(|d| d.child_text("Title")));
    let abstract_text = abstract_text
        .map(str::to_string)
        .or_else(|| description.and_then(|d| d.child_text("Abstract")));

    let mut entries = Vec::new();
    for layer in root.children_named("NamedLayer") {
        let layer_name = match layer.child_text("Name") {
            Some(n) if !n.is_empty() => n,
            _ => {
                warn!(group = %name, "Dropping NamedLayer without a Name");
                continue;
            }
        };
        let style = layer
            .child("NamedStyle")
            .and_then(|s| s.child_text("Name"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());

        entries.push(NamedLayerRef {
            layer: layer_name,
            style,
            valid_layer: false,
            valid_style: false,
        });
    }

    if entries.is_empty() {
        return Err(RasterError::malformed("group style has no named layers"));
    }

    Ok(GroupStyle {
        name,
        title,
        abstract_text,
        entries,
        valid: false,
    })
}
