//! Bootstrap seed script.
//!
//! Run with:
//! ```
//! cargo run -p seed-data --bin seed -- dev
//! ```

use clap::{Parser, Subcommand};
use directory::Database;
use seed_data::builders::BootstrapBuilder;
use seed_data::config::SeedConfig;
use seed_data::db::{RootOutcome, Seeder};
use seed_data::generators::UserGenerator;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

/// Seed a fresh directory database with credentials and an admin identity
#[derive(Parser)]
#[command(name = "seed", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Connection string of a login allowed to create users [default: $MONGO_URI]
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Database receiving the documents and the primary credential [default: $MONGO_DBNAME]
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the primary credential and insert the admin identity documents
    Dev {
        /// Do not create the primary credential
        #[arg(long)]
        skip_credential: bool,

        /// Hash this password for the admin instead of using the precomputed hash
        /// [default: $ADMIN_PASSWORD]
        #[arg(long)]
        admin_password: Option<String>,

        /// Also ensure the root user exists
        #[arg(long)]
        with_root: bool,

        /// Print the documents instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Create the credential used by test runs on its own database
    Test,

    /// Create the root user if it does not exist yet
    Root,

    /// Replace the password of an existing root user
    RootPassword {
        /// New root password [default: $ROOT_PASSWORD]
        #[arg(long)]
        password: Option<String>,
    },

    /// Show document counts and credentials
    Status,

    /// Drop the seeded collections
    Clear {
        /// Confirm dropping users, groups, memberships and OAuth clients
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SeedConfig::from_env()?;
    if let Some(uri) = cli.uri {
        config.mongo_uri = uri;
    }
    if let Some(database) = cli.database.as_deref() {
        config = config.with_database(database);
    }
    config.validate()?;

    if let Commands::Dev {
        skip_credential,
        admin_password,
        with_root,
        dry_run: true,
    } = &cli.command
    {
        let mut builder = BootstrapBuilder::dev(config)
            .with_credential(!skip_credential)
            .with_root_user(*with_root);
        if let Some(password) = admin_password {
            builder = builder.with_admin_password(password.clone());
        }
        let data = builder.build_data()?;
        println!("{}", serde_json::to_string_pretty(&data.to_json()?)?);
        return Ok(());
    }

    let db = Database::connect(&config.mongo_uri, &config.database).await?;
    tracing::info!("Connected to database {}", db.name());
    let seeder = Seeder::new(db);

    match cli.command {
        Commands::Dev {
            skip_credential,
            admin_password,
            with_root,
            ..
        } => {
            let mut builder = BootstrapBuilder::dev(config)
                .with_credential(!skip_credential)
                .with_root_user(with_root)
                .with_metrics(true);
            if let Some(password) = admin_password {
                builder = builder.with_admin_password(password);
            }
            let result = builder.build(&seeder).await?;

            tracing::info!("Seed completed!");
            if let Some(credential) = &result.credential {
                tracing::info!("  Credential: {credential}");
            }
            if let Some(admin) = &result.admin {
                tracing::info!("  Admin user: {}", admin.user_id);
                tracing::info!("  Admin group: {}", admin.group_id);
                tracing::info!("  Membership: {}", admin.membership_id);
                tracing::info!("  OAuth client: {}", admin.oauth_client_id);
            }
            if let Some(metrics) = &result.metrics {
                tracing::info!(
                    "  {} documents in {} ms",
                    metrics.documents_inserted,
                    metrics.seeding_time_ms
                );
            }
        }
        Commands::Test => {
            let result = BootstrapBuilder::test(config).build(&seeder).await?;
            if let Some(credential) = &result.credential {
                tracing::info!("Test credential created: {credential}");
            }
        }
        Commands::Root => {
            let root = UserGenerator::new(config.password_rounds)
                .root(&config.root, OffsetDateTime::now_utc())?;
            match seeder.ensure_root_user(&root).await? {
                RootOutcome::Created => tracing::info!("Root user added successfully!"),
                RootOutcome::AlreadyPresent => tracing::info!("Root user already in db, aborting."),
            }
        }
        Commands::RootPassword { password } => {
            let password = password.unwrap_or(config.root.password);
            let hash = UserGenerator::new(config.password_rounds).password_hash(&password)?;
            seeder
                .set_root_password(&hash, OffsetDateTime::now_utc())
                .await?;
        }
        Commands::Status => {
            let status = seeder
                .status(&[&config.credential, &config.test_credential])
                .await?;
            tracing::info!("Database {}", status.database);
            for (resource, count) in &status.counts {
                tracing::info!("  {}: {count}", resource.as_str());
            }
            for (login, roles) in &status.credentials {
                match roles {
                    Some(roles) => {
                        let granted: Vec<String> =
                            roles.iter().map(|r| format!("{}@{}", r.role, r.db)).collect();
                        tracing::info!("  credential {login}: {}", granted.join(", "));
                    }
                    None => tracing::info!("  credential {login}: missing"),
                }
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to drop collections without --yes");
            }
            seeder.clear_all().await?;
        }
    }

    Ok(())
}
