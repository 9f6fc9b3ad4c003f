//! Build command implementation

use crate::build::{Build, BuildContext};
use crate::cli::commands::buildpack_dir;
use crate::cli::BuildArgs;
use crate::config::Environment;
use crate::error::BuildpackResult;
use std::path::PathBuf;
use tracing::{debug, info};

/// Execute the build command
pub async fn execute(args: BuildArgs, buildpack: Option<PathBuf>) -> BuildpackResult<()> {
    let buildpack_dir = buildpack_dir(buildpack)?;
    debug!("Buildpack directory: {}", buildpack_dir.display());
    debug!("Buildpack plan: {}", args.plan_path.display());

    let context = BuildContext::load(
        buildpack_dir,
        args.layers_dir,
        &args.platform_dir,
        args.stack_id,
        Environment::from_process(),
    )
    .await?;

    let result = Build.build(&context)?;
    let layers = result.apply(&context.layers_dir).await?;
    info!("Contributed {} layer(s)", layers.len());
    Ok(())
}
