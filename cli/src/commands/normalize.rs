use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::NormalizeArgs) -> Result<()> {
    for address in &args.addresses {
        println!("{}", parcelvote::normalize(Some(address)));
    }
    Ok(())
}
