use std::path::Path;

use crate::config::Config;
use crate::error::Result;

/// Print the effective configuration with secrets masked
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    match config_path {
        Some(path) => println!("# Configuration file: {}", path.display()),
        None => {
            let path = Config::config_file_path()?;
            let marker = if path.exists() { "" } else { " (not found, using defaults)" };
            println!("# Configuration file: {}{}", path.display(), marker);
        }
    }
    print!("{}", config.redacted().to_yaml()?);

    if let Err(e) = config.validate() {
        eprintln!("warning: {}", e);
    }
    Ok(())
}
