use anyhow::Result;
use parcelvote::{party_value_stats, value_summary};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ResumeArgs) -> Result<()> {
    let pipeline = super::pipeline(&args.run)?;
    let combined = match &args.from {
        Some(dir) => pipeline.join_from(dir)?,
        None => pipeline.join()?,
    };

    println!("Combined dataset: {} voters", combined.len());
    if let Some(summary) = value_summary(&combined) {
        println!("Voters with a property value: {}", summary.count);
        for (party, s) in party_value_stats(&combined, &pipeline.config().fields.party) {
            println!("  {}: n={} mean={:.2} median={:.2}", party.to_str(), s.count, s.mean, s.median);
        }
    }
    println!("Outputs written to {}", pipeline.config().output_dir.display());
    Ok(())
}
