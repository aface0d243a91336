use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::descriptor::FontDescriptor;
use crate::error::{FontPackerError, Result};

/// Output format of the font descriptor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
    /// BMFont XML (`.fnt`).
    #[default]
    Xml,
    /// `FontDescriptor` as JSON.
    Json,
}

impl DescriptorFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xml => "fnt",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => f.write_str("xml"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for DescriptorFormat {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" | "fnt" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// A named XML element with ordered attributes and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Render as a UTF-8 document with an XML declaration, four-space indented.
    pub fn to_document(&self) -> String {
        let mut s = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_into(&mut s, 0);
        s
    }

    fn write_into(&self, s: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        s.push_str(&indent);
        s.push('<');
        s.push_str(&self.name);
        for (k, v) in &self.attributes {
            s.push_str(&format!(" {}=\"{}\"", k, xml_escape(v)));
        }
        if self.children.is_empty() {
            s.push_str("/>\n");
            return;
        }
        s.push_str(">\n");
        for c in &self.children {
            c.write_into(s, depth + 1);
        }
        s.push_str(&format!("{}</{}>\n", indent, self.name));
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Build the `<font>` tree: `<pages>` with one `<page id file/>` per page and
/// `<chars count>` with one `<char/>` per glyph.
pub fn to_fnt_tree(desc: &FontDescriptor) -> XmlElement {
    let pages = desc.pages.iter().fold(XmlElement::new("pages"), |el, p| {
        el.child(XmlElement::new("page").attr("id", p.id).attr("file", &p.file))
    });
    let chars = desc
        .chars
        .iter()
        .fold(XmlElement::new("chars").attr("count", desc.count()), |el, c| {
            el.child(
                XmlElement::new("char")
                    .attr("id", &c.id)
                    .attr("x", c.x)
                    .attr("y", c.y)
                    .attr("width", c.width)
                    .attr("height", c.height)
                    .attr("xoffset", c.xoffset)
                    .attr("yoffset", c.yoffset)
                    .attr("xadvance", c.xadvance)
                    .attr("page", c.page)
                    .attr("chnl", c.chnl),
            )
        });
    XmlElement::new("font").child(pages).child(chars)
}

/// BMFont-style XML text of `desc`.
pub fn to_fnt_xml(desc: &FontDescriptor) -> String {
    to_fnt_tree(desc).to_document()
}

/// `{ pages, chars, count }`.
pub fn to_json(desc: &FontDescriptor) -> Value {
    json!({
        "pages": &desc.pages,
        "chars": &desc.chars,
        "count": desc.count(),
    })
}

/// `<output_base>.<ext>`; the extension is appended, never substituted.
pub fn descriptor_path(output_base: &Path, format: DescriptorFormat) -> PathBuf {
    let mut s: OsString = output_base.as_os_str().to_owned();
    s.push(".");
    s.push(format.extension());
    PathBuf::from(s)
}

/// Serialize `desc` and write it next to the pages. Returns the written path.
pub fn write_descriptor(
    desc: &FontDescriptor,
    output_base: &Path,
    format: DescriptorFormat,
) -> Result<PathBuf> {
    let path = descriptor_path(output_base, format);
    let text = match format {
        DescriptorFormat::Xml => to_fnt_xml(desc),
        DescriptorFormat::Json => serde_json::to_string_pretty(&to_json(desc))
            .map_err(|e| FontPackerError::DescriptorWrite(e.to_string()))?,
    };
    std::fs::write(&path, text).map_err(|e| {
        FontPackerError::DescriptorWrite(format!("{}: {}", path.display(), e))
    })?;
    info!(?path, glyphs = desc.count(), pages = desc.pages.len(), "descriptor written");
    Ok(path)
}
