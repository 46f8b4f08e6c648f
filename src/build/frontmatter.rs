//! JSON frontmatter embedded in a leading template comment.
//!
//! A page may start with a Tera comment holding a single JSON object:
//!
//! ```text
//! {#
//! { "title": "About us", "tags": ["company"] }
//! #}
//! {% block content %}...{% endblock content %}
//! ```
//!
//! The object becomes the template context for that page. Because the block
//! is a regular comment, the page stays a valid template either way.

use serde_json::{Map, Value};

/// Opens the frontmatter block. Must appear at byte offset zero.
pub const OPEN_DELIMITER: &str = "{#";
/// Closes the frontmatter block.
pub const CLOSE_DELIMITER: &str = "#}";

#[derive(thiserror::Error, Debug)]
pub enum FrontmatterError {
    #[error("invalid JSON frontmatter: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of splitting a page into frontmatter and template body.
#[derive(Debug, PartialEq)]
pub struct Extracted<'a> {
    /// The template body, everything after the closing delimiter
    pub body: &'a str,
    /// The decoded frontmatter, `None` if the page has none
    pub data: Option<Map<String, Value>>,
}

/// Split raw page content into its template body and frontmatter data.
///
/// Content that does not start with [`OPEN_DELIMITER`], or that opens but
/// never closes it, has no frontmatter and is returned whole. A block that
/// is present but not a JSON object is an error; no body is returned in that
/// case.
pub fn extract(raw: &str) -> Result<Extracted<'_>, FrontmatterError> {
    let no_frontmatter = Extracted {
        body: raw,
        data: None,
    };

    let Some(after_open) = raw.strip_prefix(OPEN_DELIMITER) else {
        return Ok(no_frontmatter);
    };
    let Some(close) = after_open.find(CLOSE_DELIMITER) else {
        return Ok(no_frontmatter);
    };

    let json = after_open[..close].trim();
    let data: Map<String, Value> = serde_json::from_str(json)?;
    let body = &after_open[close + CLOSE_DELIMITER.len()..];

    Ok(Extracted {
        body,
        data: Some(data),
    })
}

/// Prepend `data` to `body` as a frontmatter block.
#[cfg(test)]
pub fn embed(data: &Map<String, Value>, body: &str) -> Result<String, FrontmatterError> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(format!("{OPEN_DELIMITER}\n{json}\n{CLOSE_DELIMITER}{body}"))
}
