use tracing_subscriber::EnvFilter;
use yatube::{
    config::Config,
    data_seeder::{seed_sample_data, SAMPLE_PASSWORD},
    error::AppResult,
    infrastructure::sqlite_database::SqliteDatabase,
};

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    println!("🚀 Generating sample data for Yatube");
    println!("Initializing database at {}", config.database.url);
    let database = SqliteDatabase::connect(&config.database.url).await?;

    let summary = seed_sample_data(&database).await?;

    println!("\n🎯 Sample data generation complete!");
    println!("📊 Statistics:");
    println!("  - Users created: {}", summary.users);
    println!("  - Groups created: {}", summary.groups);
    println!("  - Posts created: {}", summary.posts);
    println!("  - Comments created: {}", summary.comments);
    println!("  - Follows created: {}", summary.follows);
    println!("  - Password for every sample user: {}", SAMPLE_PASSWORD);

    println!("\n✅ Ready to start the web server!");
    println!("   Run: cargo run --bin yatube");
    println!("   URL: http://localhost:{}", config.server.port);

    Ok(())
}
