//! # Composer
//!
//! Command-line entry point.

use clap::Parser;
use composer_cli::{
    apply_script, create_project, load_project, recover_project, summarize, CliArgs, CliConfig,
    Command,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,composer_core=debug,composer_sync=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(&args);
    tracing::debug!("Data directory: {}", config.data_dir.display());

    match args.command {
        Command::New {
            name,
            aspect_ratio,
            scenes,
        } => {
            let document = create_project(&config, &name, aspect_ratio, scenes).await?;
            print!("{}", summarize(&document));
        }
        Command::Apply { name, script } => {
            let report = apply_script(&config, &name, &script).await?;
            println!("{report}");
        }
        Command::Inspect { name, json } => {
            let document = load_project(&config, &name).await?;
            if json {
                println!("{}", document.to_json()?);
            } else {
                print!("{}", summarize(&document));
            }
        }
        Command::Recover { name } => {
            let document = recover_project(&config, &name).await?;
            print!("{}", summarize(&document));
        }
    }
    Ok(())
}
