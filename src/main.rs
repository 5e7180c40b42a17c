use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use ebad::app_context::AppContext;
use ebad::common;
use ebad::config::AppConfig;
use ebad::database::connection::{
    establish_connection, get_database_url, migrate_database, setup_database, MigrateDirection,
};
use ebad::database::seed_data::{seed_sample_lesson, SAMPLE_LESSON_ID};
use ebad::export::ExportFormat;
use ebad::mindmap::ForestNode;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// YAML configuration file
    #[clap(short, long, global = true)]
    config: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    #[cfg(feature = "server")]
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        #[clap(long)]
        host: Option<String>,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        cors_origin: Option<String>,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Print a lesson's mind map as a tree
    Tree {
        #[clap(short = 'L', long)]
        lesson: String,
        #[clap(short, long)]
        database: Option<String>,
        /// Only show published nodes
        #[clap(long)]
        published_only: bool,
    },
    /// Export a lesson as json, csv or mermaid
    Export {
        #[clap(short = 'L', long)]
        lesson: String,
        #[clap(short, long, default_value = "json")]
        format: String,
        #[clap(long, default_value = "en")]
        lang: String,
        /// Output file; stdout when absent
        #[clap(short, long)]
        output: Option<String>,
        #[clap(short, long)]
        database: Option<String>,
    },
    /// Write the default configuration to a file
    InitConfig {
        #[clap(short, long, default_value = "ebad.yaml")]
        output: String,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create the database and apply every migration
    Init {
        #[clap(short, long)]
        database: Option<String>,
    },
    Migrate {
        #[clap(subcommand)]
        direction: MigrateDirection,
        #[clap(short, long)]
        database: Option<String>,
    },
    /// Load a sample lesson
    Seed {
        #[clap(short, long)]
        database: Option<String>,
        #[clap(short = 'L', long, default_value = SAMPLE_LESSON_ID)]
        lesson: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;

    setup_logging(&args.log_level.clone().or_else(|| Some(config.log_level.clone())));

    match args.command {
        #[cfg(feature = "server")]
        Commands::Serve {
            port,
            host,
            database,
            cors_origin,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(database) = database {
                config.database.path = database;
            }
            if cors_origin.is_some() {
                config.server.cors_origin = cors_origin;
            }
            info!("Starting server on port {}", config.server.port);
            ebad::server::start_server(&config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                let path = database.unwrap_or(config.database.path);
                info!("Initializing database: {}", path);
                let db = establish_connection(&get_database_url(Some(&path))).await?;
                setup_database(&db).await?;
                info!("Database initialized successfully");
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                let path = database.unwrap_or(config.database.path);
                migrate_database(&path, direction).await?;
            }
            DbCommands::Seed { database, lesson } => {
                config.database.path = database.unwrap_or(config.database.path);
                let ctx = open_context(&config).await?;
                let snapshot = seed_sample_lesson(&ctx, &lesson).await?;
                println!(
                    "{} {} nodes, {} relationship(s) in lesson {}",
                    "Seeded".green().bold(),
                    snapshot.nodes.len(),
                    snapshot.relationships.len(),
                    lesson
                );
            }
        },
        Commands::Tree {
            lesson,
            database,
            published_only,
        } => {
            config.database.path = database.unwrap_or(config.database.path);
            let ctx = open_context(&config).await?;
            let forest = ctx.tree_service().assemble(&lesson).await?;

            if forest.roots.is_empty() {
                println!("{}", format!("Lesson {} has no nodes", lesson).yellow());
            }
            for root in &forest.roots {
                print_tree(root, 0, published_only);
            }
            if !forest.orphans.is_empty() {
                println!("{} {}", "orphans:".yellow(), forest.orphans.join(", "));
            }
            if !forest.cyclic.is_empty() {
                println!("{} {}", "cyclic:".red(), forest.cyclic.join(", "));
            }
            println!(
                "{}",
                format!(
                    "{} node(s), {} relationship(s)",
                    forest.node_count(),
                    forest.relationships.len()
                )
                .dimmed()
            );
        }
        Commands::Export {
            lesson,
            format,
            lang,
            output,
            database,
        } => {
            let format = format.parse::<ExportFormat>().map_err(|e| anyhow!(e))?;
            config.database.path = database.unwrap_or(config.database.path);
            let ctx = open_context(&config).await?;
            let rendered = ctx.tree_service().export(&lesson, format, &lang).await?;

            match output {
                Some(path) => {
                    common::write_string_to_file(&path, &rendered)?;
                    info!("Exported lesson {} as {} to {}", lesson, format, path);
                }
                None => println!("{}", rendered),
            }
        }
        Commands::InitConfig { output } => {
            info!("Writing default configuration to {}", output);
            common::write_string_to_file(&output, &AppConfig::default().to_yaml()?)?;
        }
    }

    Ok(())
}

async fn open_context(config: &AppConfig) -> Result<AppContext> {
    let db = establish_connection(&get_database_url(Some(&config.database.path))).await?;
    setup_database(&db).await?;
    Ok(AppContext::with_settings(
        db,
        config.layout,
        config.cache_ttl(),
    ))
}

fn print_tree(node: &ForestNode, depth: usize, published_only: bool) {
    if published_only && !node.node.is_published {
        return;
    }

    let indent = "  ".repeat(depth);
    let title = if node.node.is_published {
        node.node.title_en.bold()
    } else {
        node.node.title_en.dimmed()
    };
    println!(
        "{}{} {} {}",
        indent,
        title,
        node.node.title_ar,
        format!("[{}]", node.node.node_type).cyan()
    );
    for child in &node.children {
        print_tree(child, depth + 1, published_only);
    }
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "handlebars=off,sqlx=warn,{}",
            log_level
        )))
        .without_time()
        .init();
}
