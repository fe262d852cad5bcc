//! XHTML → [`Document`] loading.
//!
//! Pages are parsed with `roxmltree`, so markup must be well-formed XML (no
//! DOCTYPE, no HTML-only entities). Two attributes get extra treatment:
//! `class` fills the class list and `style` fills the inline style map.
//! `data-height` is kept as an attribute and also sets the element's
//! intrinsic content height.

use super::{Document, DomError, NodeId};

/// Parse a complete page. Its root element becomes the only child of the
/// document root.
pub fn parse_document(xml: &str) -> Result<Document, DomError> {
    let mut doc = Document::new();
    let root = doc.root();
    doc.insert_markup(root, xml)?;
    Ok(doc)
}

impl Document {
    /// Parse a fragment and append it under `parent`, returning the new
    /// element. The fragment must have a single root element.
    pub fn insert_markup(&mut self, parent: NodeId, xml: &str) -> Result<NodeId, DomError> {
        let parsed = roxmltree::Document::parse(xml)?;
        let node = self.build(parsed.root_element());
        self.append_child(parent, node);
        Ok(node)
    }

    fn build(&mut self, source: roxmltree::Node<'_, '_>) -> NodeId {
        let node = self.create_element(source.tag_name().name());

        for attr in source.attributes() {
            match attr.name() {
                "class" => {
                    for class in attr.value().split_whitespace() {
                        self.add_class(node, class);
                    }
                }
                "style" => {
                    for (property, value) in parse_inline_style(attr.value()) {
                        self.set_style(node, property, value);
                    }
                }
                name => {
                    if name == "data-height" {
                        if let Ok(height) = attr.value().trim().parse::<f64>() {
                            self.set_intrinsic_height(node, height);
                        }
                    }
                    self.set_attribute(node, name, attr.value());
                }
            }
        }

        let mut text = Vec::new();
        for child in source.children() {
            if child.is_element() {
                let built = self.build(child);
                self.append_child(node, built);
            } else if child.is_text() {
                if let Some(t) = child.text() {
                    let t = t.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !t.is_empty() {
                        text.push(t);
                    }
                }
            }
        }
        self.set_text(node, &text.join(" "));

        node
    }
}

fn parse_inline_style(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        let (property, value) = (property.trim(), value.trim());
        (!property.is_empty() && !value.is_empty()).then_some((property, value))
    })
}
