//! Config command handlers

use crate::config::Config;

pub fn cmd_config_init() -> anyhow::Result<()> {
    let path = Config::default_config_path();
    if Config::create_default_if_missing()? {
        println!("Created {}", path.display());
        println!();
        println!("Fill in the [supabase] section or set SUPABASE_URL and SUPABASE_ANON_KEY.");
    } else {
        println!("{} already exists, leaving it untouched.", path.display());
    }
    Ok(())
}

pub fn cmd_config_check(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let key_kind = if config
        .supabase
        .service_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty())
    {
        "service key"
    } else {
        "anon key"
    };

    println!("Configuration OK");
    println!("{:-<50}", "");
    println!(
        "Listen:        {}:{}",
        config.server.bind_address, config.server.port
    );
    println!("Supabase:      {} ({key_kind})", config.supabase.url);
    println!("Bucket:        {}", config.supabase.storage_bucket);
    if config.bunny.enabled {
        println!("Video host:    Bunny Stream, library {}", config.bunny.library_id);
    } else {
        println!("Video host:    storage bucket");
    }
    println!("Upload limit:  {} MB", config.uploads.max_upload_mb);
    println!(
        "Metrics:       {}",
        if config.observability.metrics_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    if config.supabase.uses_placeholder_credentials() {
        println!();
        println!("Warning: placeholder Supabase credentials are in use.");
    }

    Ok(())
}
