//! `aisha chat` — Single-message or interactive chat from the terminal.

use aisha_config::AppConfig;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    AISHA_API_KEY    (generic, highest priority)");
        eprintln!("    GEMINI_API_KEY   (Google Gemini)");
        eprintln!("    OPENAI_API_KEY   (OpenAI-compatible endpoints)");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let chat = aisha_gateway::build_chat_service(&config)?;
    let ai_label = chat.persona().ai_label.clone();

    if let Some(msg) = message {
        eprint!("  ...");
        let reply = chat.reply(&msg).await;
        eprint!("\r     \r");
        println!("{}", reply?);
        return Ok(());
    }

    println!();
    println!("  {} — interactive mode", chat.persona().name);
    println!();
    println!("  Provider:  {}", chat.provider_name());
    println!("  Model:     {}", chat.model());
    println!("  History:   {} s", chat.history().ttl().as_secs());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        match chat.reply(line).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for text in reply.lines() {
                    println!("  {ai_label} > {text}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {}", e.public_detail());
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    Ok(())
}
