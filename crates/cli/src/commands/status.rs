//! `aisha status` — Show the effective configuration and check its health.

use aisha_config::AppConfig;
use aisha_core::persona::PERSONA_FILE;
use aisha_providers::router::build_from_config;

/// Result of probing the default provider's endpoint.
#[derive(Debug, PartialEq)]
enum ProviderHealth {
    Reachable,
    Unhealthy,
    Unregistered,
    Failed(String),
}

/// Build the configured providers and ask the default one whether its
/// endpoint answers. Also returns the registered provider names, sorted.
async fn check_provider(config: &AppConfig) -> (Vec<String>, ProviderHealth) {
    let router = build_from_config(config);
    let mut names: Vec<String> = router.list().into_iter().map(String::from).collect();
    names.sort();

    let health = match router.default() {
        None => ProviderHealth::Unregistered,
        Some(provider) => match provider.health_check().await {
            Ok(true) => ProviderHealth::Reachable,
            Ok(false) => ProviderHealth::Unhealthy,
            Err(e) => ProviderHealth::Failed(e.to_string()),
        },
    };
    (names, health)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let persona = config.persona.resolve();
    let g = &config.generation;

    println!("AI-ша Status");
    println!("============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.active_model());
    println!(
        "  Sampling:     temperature={} top_p={} top_k={} max_tokens={}",
        g.temperature, g.top_p, g.top_k, g.max_output_tokens
    );
    println!("  History TTL:  {} s", config.history.ttl_secs);
    println!(
        "  Blank input:  {}",
        if config.chat.reject_blank_messages { "rejected" } else { "passed through" }
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  CORS:         {}", config.gateway.allow_origins.join(", "));
    println!();
    for line in persona.diagnostic_summary().lines() {
        println!("  {line}");
    }

    let mut issues = 0;
    println!();

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — run `aisha onboard` first");
        issues += 1;
    }

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set AISHA_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    let (registered, health) = check_provider(&config).await;
    println!("  Registered:   {}", registered.join(", "));
    match health {
        ProviderHealth::Reachable => println!("  ✅ Provider {} is reachable", config.default_provider),
        ProviderHealth::Unhealthy => {
            println!("  ⚠️  Provider {} answered with an error status", config.default_provider);
            issues += 1;
        }
        ProviderHealth::Unregistered => {
            println!("  ⚠️  No provider registered under '{}'", config.default_provider);
            issues += 1;
        }
        ProviderHealth::Failed(reason) => {
            println!("  ⚠️  Provider check failed: {reason}");
            issues += 1;
        }
    }

    if persona.source.is_some() {
        println!("  ✅ Persona loaded from {}", persona.source.as_deref().unwrap_or(PERSONA_FILE));
    } else {
        println!("  ℹ️  Using the built-in persona");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
