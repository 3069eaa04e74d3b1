use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let pipeline = super::pipeline(args)?;
    for (county, result) in pipeline.geocode()? {
        println!(
            "{county}: matched {} of {} active voters ({:.1}%)",
            result.matched, result.active, result.match_rate()
        );
    }
    println!("Outputs written to {}", pipeline.config().output_dir.display());
    Ok(())
}
