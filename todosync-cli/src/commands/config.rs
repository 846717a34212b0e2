use anyhow::Result;
use owo_colors::OwoColorize;
use todosync_core::SyncConfig;

pub fn run() -> Result<()> {
    let config_path = SyncConfig::config_path()?;
    let config = SyncConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:    {}", config_path.display());
    println!("  Vault:     {}", config.vault_path().display());

    println!("{}", "Sync".bold());
    println!("  Window:    {} weeks back", config.fetch_weeks_ago);
    println!("  Status:    {} wins", config.status_authority);
    println!("  Timezone:  {}", config.timezone);
    match &config.remote {
        Some(remote) => println!(
            "  Provider:  {} ({})",
            remote.provider.name(),
            remote.provider.binary_name()
        ),
        None => println!("  Provider:  {}", "not configured".yellow()),
    }

    Ok(())
}
