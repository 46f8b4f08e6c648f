mod builder;
mod clean;
mod frontmatter;
mod layouts;
mod paths;
mod render;
mod site;
mod walk;
mod watch;

pub use builder::Builder;
pub use watch::{FileInfo, FileWatcher};
