use crate::config;
use crate::error::CliResult;

pub fn run(force: bool) -> CliResult<()> {
    let dir = std::env::current_dir()?;
    let path = config::init_config(&dir, force)?;
    println!("Wrote {}", path.display());
    Ok(())
}
