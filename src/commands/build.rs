use crate::{Args, build::Builder, config::WebsiteConfig};

pub fn run(args: &Args) -> Result<(), anyhow::Error> {
    let config = WebsiteConfig::from_root(&args.root_dir())?;
    let result = Builder::new(config).build()?;

    tracing::info!(
        pages = result.pages,
        removed = result.removed,
        output = %result.site.output_dir.display(),
        "build finished"
    );

    Ok(())
}
