//! `aisha onboard` — First-time setup.

use aisha_config::AppConfig;
use aisha_core::persona::{PERSONA_FILE, Persona};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let persona_path = config_dir.join(PERSONA_FILE);

    println!("AI-ша — First-Time Setup");
    println!("========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if persona_path.exists() {
        println!("  Persona file exists: {}", persona_path.display());
    } else {
        std::fs::write(&persona_path, Persona::builtin().prompt)?;
        println!("✅ Created {PERSONA_FILE} (edit it to change the character)");
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set GEMINI_API_KEY or add api_key to {}", config_path.display());
        println!("   2. Run: aisha chat");
        println!("   3. Or serve the web page: aisha serve\n");
    }

    Ok(())
}
