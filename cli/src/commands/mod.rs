pub mod analyze;
pub mod geocode;
pub mod join;
pub mod normalize;

use anyhow::Result;
use parcelvote::Pipeline;

/// Build a pipeline from the shared run arguments.
pub(crate) fn pipeline(args: &crate::cli::RunArgs) -> Result<Pipeline> {
    Ok(Pipeline::from_config_file(&args.config)?.with_voter_limit(args.limit))
}
