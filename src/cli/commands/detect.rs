//! Detect command implementation

use crate::cli::DetectArgs;
use crate::detect::Detect;
use crate::error::BuildpackResult;

/// Execute the detect command
pub async fn execute(args: DetectArgs) -> BuildpackResult<()> {
    Detect.detect(&args.platform_dir, &args.plan_path).await
}
