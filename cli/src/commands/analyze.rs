use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ResumeArgs) -> Result<()> {
    let pipeline = super::pipeline(&args.run)?;
    let layer = match &args.from {
        Some(combined) => pipeline.analyze_from(combined)?,
        None => pipeline.analyze()?,
    };

    let report = pipeline.config().output_dir.join("spatial_analysis_summary_report.txt");
    println!("Analyzed {} voters; summary report at {}", layer.len(), report.display());
    Ok(())
}
