//! Read-only progression commands: xp, level, badges

use anyhow::Result;
use kudos::config::Config;
use kudos::profile::ProfileSession;

pub fn xp_command() -> Result<()> {
    let config = Config::load()?;
    let session = ProfileSession::open(&config)?;

    let xp = session.xp()?;
    if xp < 0 {
        println!("No XP rules loaded");
    } else {
        println!("{xp}");
    }
    Ok(())
}

pub fn level_command() -> Result<()> {
    let config = Config::load()?;
    let session = ProfileSession::open(&config)?;

    let standing = session.level()?;
    if standing.level < 0 {
        println!("No level yet");
    } else {
        println!(
            "Level {} ({:.0}% to next)",
            standing.level,
            standing.progress * 100.0
        );
    }
    Ok(())
}

pub fn badges_command(achieved_only: bool) -> Result<()> {
    let config = Config::load()?;
    let session = ProfileSession::open(&config)?;

    let snapshot = session.badges()?;
    let mut achieved = 0usize;
    for (category, subcategory, item, state) in snapshot.iter() {
        if state.achieved {
            achieved += 1;
        } else if achieved_only {
            continue;
        }
        let marker = if state.achieved { "x" } else { " " };
        println!("[{marker}] {category}:{subcategory}:{item}");
    }
    println!("{achieved}/{} achieved", snapshot.len());
    Ok(())
}
