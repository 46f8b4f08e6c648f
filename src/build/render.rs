use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tera::{Context, Value};

use super::frontmatter::{self, FrontmatterError};
use super::layouts::LayoutRegistry;
use super::site::Page;

/// Block a page body is placed into when it does not define any blocks.
pub const CONTENT_BLOCK: &str = "content";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("layout {layout} not found for page {path}")]
    LayoutNotFound { layout: String, path: PathBuf },

    #[error("failed to read page file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to extract frontmatter from {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },

    #[error("failed to create output directory {dir} for page {path}: {source}")]
    CreateDir {
        path: PathBuf,
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create output file {output} for page {path}: {source}")]
    CreateFile {
        path: PathBuf,
        output: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render page {path}: {}", describe(.source))]
    Template { path: PathBuf, source: tera::Error },

    #[error("failed to write output file {output} for page {path}: {source}")]
    Write {
        path: PathBuf,
        output: PathBuf,
        source: std::io::Error,
    },
}

/// Render one page through its layout into its output file.
///
/// The layout's templates are cloned before the page body is added, so a
/// page can override blocks without affecting other pages that share the
/// layout.
pub fn render_page(page: &Page, layouts: &LayoutRegistry) -> Result<(), RenderError> {
    let path = &page.input_path;
    let template_err = |source| RenderError::Template {
        path: path.clone(),
        source,
    };

    let layout = layouts
        .get(&page.layout)
        .ok_or_else(|| RenderError::LayoutNotFound {
            layout: page.layout.clone(),
            path: path.clone(),
        })?;

    let raw = std::fs::read_to_string(path).map_err(|source| RenderError::Read {
        path: path.clone(),
        source,
    })?;
    let extracted = frontmatter::extract(&raw).map_err(|source| RenderError::Frontmatter {
        path: path.clone(),
        source,
    })?;

    let mut tera = layout.clone();
    tera.add_raw_template(&page.name, &page_template(&page.layout, extracted.body))
        .map_err(template_err)?;

    if let Some(dir) = page.output_path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::CreateDir {
            path: path.clone(),
            dir: dir.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(&page.output_path).map_err(|source| RenderError::CreateFile {
        path: path.clone(),
        output: page.output_path.clone(),
        source,
    })?;

    let data = extracted.data.unwrap_or_default();
    let context = Context::from_value(Value::Object(data)).map_err(template_err)?;

    let mut writer = BufWriter::new(file);
    tera.render_to(&page.name, &context, &mut writer)
        .map_err(template_err)?;
    writer.flush().map_err(|source| RenderError::Write {
        path: path.clone(),
        output: page.output_path.clone(),
        source,
    })?;

    Ok(())
}

/// Render every page, stopping at the first failure.
pub fn render_site(pages: &[Page], layouts: &LayoutRegistry) -> Result<usize, RenderError> {
    for page in pages {
        render_page(page, layouts)?;
        tracing::debug!(page = %page.name, layout = %page.layout, "rendered page");
    }
    Ok(pages.len())
}

/// Template source for a page: the body extends its layout. A body without
/// blocks of its own becomes the content block.
fn page_template(layout: &str, body: &str) -> String {
    if defines_blocks(body) {
        format!("{{% extends \"{layout}\" %}}{body}")
    } else {
        format!(
            "{{% extends \"{layout}\" %}}{{% block {CONTENT_BLOCK} %}}{body}{{% endblock {CONTENT_BLOCK} %}}"
        )
    }
}

fn defines_blocks(body: &str) -> bool {
    body.match_indices("{%").any(|(start, _)| {
        let tag = body[start + 2..].trim_start_matches('-').trim_start();
        tag.strip_prefix("block")
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

/// Tera reports the interesting part (the template line, the missing
/// variable) in nested sources, so flatten the chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
