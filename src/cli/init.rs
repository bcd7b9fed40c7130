//! Initialize the data layout and config file

use anyhow::{bail, Result};

use kudos::config::Config;
use kudos::paths;
use kudos::profile::RULE_CATEGORIES;

pub fn init_command(force: bool) -> Result<()> {
    let config_path = paths::config_path();
    if config_path.exists() && !force {
        bail!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    let config = Config::default();
    config.save_to_file(&config_path)?;
    println!("Created {}", config_path.display());

    // Seed the expected layout so rule documents can just be dropped in.
    for category in RULE_CATEGORIES {
        std::fs::create_dir_all(config.rules_dir().join(category))?;
    }
    std::fs::create_dir_all(config.state_dir())?;
    println!("Rules dir: {}", config.rules_dir().display());
    println!("State dir: {}", config.state_dir().display());
    Ok(())
}
