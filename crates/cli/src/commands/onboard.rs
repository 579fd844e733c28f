//! `hoprag onboard` — First-time setup.

use hoprag_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("🔗 HopRAG — First-Time Setup");
    println!("============================\n");

    if AppConfig::write_default(&config_path)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!("      (or export DEEPSEEK_API_KEY)");
        println!("   2. Run: hoprag kb setup");
        println!("   3. Run: hoprag ask \"张三参与了哪个项目？\"\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    }

    println!("  Data directory: {}", config_dir.display());
    println!("🎉 Setup complete! Run `hoprag chat` to start asking questions.\n");

    Ok(())
}
