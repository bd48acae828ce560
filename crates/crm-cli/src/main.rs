use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crm_db::{PgStore, Store};
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "crm")]
#[command(about = "Pet-travel CRM operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> environment overlay ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Quote commands
    Quote {
        #[command(subcommand)]
        cmd: QuoteCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity and schema presence
    Status,
    /// Apply embedded SQL migrations
    Migrate,
}

#[derive(Subcommand)]
enum QuoteCmd {
    /// Mark a quote accepted and create its order if none is linked yet
    Promote {
        /// Quote id
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = open_pool().await?;
            match cmd {
                DbCmd::Status => {
                    let s = crm_db::status(&pool).await?;
                    println!("db_ok={} has_quotes_table={}", s.ok, s.has_quotes_table);
                }
                DbCmd::Migrate => {
                    crm_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = crm_config::load_layered_yaml(&path_refs)?;
            // Shape and semantic checks, so a hash is never printed for a
            // config the daemon would refuse.
            loaded.settings()?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Quote { cmd } => match cmd {
            QuoteCmd::Promote { id } => {
                let store = PgStore::new(open_pool().await?);
                let out = store
                    .promote_quote(id)
                    .await
                    .with_context(|| format!("promote quote {id} failed"))?
                    .with_context(|| format!("quote {id} not found"))?;

                println!("quote_id={}", out.quote.id);
                println!("status={}", out.quote.status);
                println!(
                    "order_id={}",
                    out.quote
                        .order_id
                        .map(|o| o.to_string())
                        .unwrap_or_else(|| "none".to_string())
                );
                println!("decision={}", serde_json::to_string(&out.decision)?);
                if let Some(order) = out.order {
                    println!("order_created={}", order.order_number);
                }
            }
        },
    }

    Ok(())
}

/// Pool per the storage settings in `CRM_CONFIG` (defaults if unset).
async fn open_pool() -> Result<PgPool> {
    let cfg = crm_config::load_from_env()?.settings()?;
    crm_db::connect_from_env(&cfg.storage.database_url_env, cfg.storage.max_connections).await
}
