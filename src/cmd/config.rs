//! Configuration view and validation commands: `aether config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use aether::config::{AetherConfig, AetherToml, CONFIG_DIR, CONFIG_FILE};

    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            let config = AetherConfig::new(project_dir.to_path_buf())?;
            let toml = &config.toml;

            println!();
            println!("Aether Configuration");
            println!("====================");
            println!();
            println!("Source: {}", config.source);
            println!("Effective values (with env overrides):");
            println!();

            println!("[api]");
            println!("  base_url = \"{}\"", toml.api.base_url);
            println!("  timeout_secs = {}", toml.api.timeout_secs);
            println!(
                "  generation_timeout_secs = {}",
                toml.api.generation_timeout_secs
            );
            println!();

            println!("[board]");
            println!("  org_id = \"{}\"", toml.board.org_id);
            println!("  include_done = {}", toml.board.include_done);
            println!("  notice_ttl_ms = {}", toml.board.notice_ttl_ms);
            println!();

            println!("[user]");
            match toml.user.id {
                Some(id) => println!("  id = {}", id),
                None => println!("  id = (not set)"),
            }
            if let Some(name) = &toml.user.name {
                println!("  name = \"{}\"", name);
            }
            println!("  role = \"{}\"", toml.user.role);
            println!();

            println!("[ai]");
            println!("  language = \"{}\"", toml.ai.language);
            println!("  depth = \"{}\"", toml.ai.depth);
            println!("  progress_interval_ms = {}", toml.ai.progress_interval_ms);
            println!();

            println!("[export]");
            println!("  output_dir = \"{}\"", toml.export.output_dir.display());
            if let Some(author) = &toml.export.author {
                println!("  author = \"{}\"", author);
            }
            println!();

            println!("[server]");
            println!("  host = \"{}\"", toml.server.host);
            println!("  port = {}", toml.server.port);
            println!("  cors = {}", toml.server.cors);
            println!("  seed_demo = {}", toml.server.seed_demo);
            println!();

            if !config_path.exists() {
                println!(
                    "Run 'aether config init' to create {}.",
                    config_path.display()
                );
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = AetherConfig::new(project_dir.to_path_buf())?;
            let warnings = config.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("aether.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            AetherToml::default().save(&config_path)?;

            println!("Created aether.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] base_url and timeouts");
            println!("  - [board] org_id, [user] id and role");
            println!("  - [ai] language and depth, [export] output_dir");
            println!();
        }
    }

    Ok(())
}
