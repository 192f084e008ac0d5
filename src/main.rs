use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use testforge::cli::{Cli, Commands, ConfigAction, Display, OutputFormat};
use testforge::config::{ForgeConfig, CONFIG_FILE_NAME};
use testforge::driver::Driver;
use testforge::error::Result;
use testforge::gateway::HttpGateway;
use testforge::output::OutputWriter;
use testforge::verification::ProcessSandbox;

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    writer: &'a OutputWriter,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("testforge=debug")
    } else {
        EnvFilter::new("testforge=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

fn config_path(cli_override: &Option<PathBuf>) -> PathBuf {
    cli_override
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let writer = OutputWriter::new(cli.output);
    let out = OutputContext {
        display: &display,
        writer: &writer,
    };
    let config_path = config_path(&cli.config);

    match cli.command {
        Commands::Init => cmd_init(&out, &config_path).await,
        Commands::Generate {
            path,
            output_dir,
            verify,
        } => cmd_generate(&out, &config_path, &path, output_dir, verify).await,
        Commands::Config { action } => cmd_config(&out, &config_path, action).await,
    }
}

async fn cmd_init(out: &OutputContext<'_>, config_path: &PathBuf) -> Result<()> {
    if config_path.exists() {
        if out.writer.format() == OutputFormat::Text {
            out.display
                .print_warning("testforge is already initialized here.");
        }
        return Ok(());
    }

    let config = ForgeConfig::default();
    config.save(config_path).await?;

    if out.writer.format() == OutputFormat::Text {
        out.display.print_success("Initialized testforge.");
        out.display
            .print_info(&format!("Configuration: {}", config_path.display()));
    } else {
        out.writer.emit_message("Initialized testforge");
    }

    Ok(())
}

async fn cmd_generate(
    out: &OutputContext<'_>,
    config_path: &PathBuf,
    path: &PathBuf,
    output_dir: Option<PathBuf>,
    verify: bool,
) -> Result<()> {
    let mut config = ForgeConfig::load(config_path).await?;
    if let Some(dir) = output_dir {
        config.output.dir = dir.display().to_string();
    }

    let gateway = Arc::new(HttpGateway::from_config(&config.gateway)?);

    let mut driver = Driver::new(config.clone(), gateway);
    if verify {
        driver = driver.with_sandbox(Arc::new(ProcessSandbox::new(config.verification.clone())));
    }

    let spinner = if out.writer.format() == OutputFormat::Text {
        Some(out.display.create_spinner("Generating tests..."))
    } else {
        None
    };

    let result = driver.run(path).await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let summary = result?;

    match out.writer.format() {
        OutputFormat::Text => out.display.print_run_summary(&summary),
        OutputFormat::Json | OutputFormat::Stream => out.writer.emit_summary(&summary),
    }

    Ok(())
}

async fn cmd_config(
    out: &OutputContext<'_>,
    config_path: &PathBuf,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ForgeConfig::load(config_path).await?;
            match out.writer.format() {
                OutputFormat::Text => {
                    let toml = toml::to_string_pretty(&config)
                        .map_err(|e| testforge::ForgeError::Config(e.to_string()))?;
                    println!("{}", toml);
                }
                OutputFormat::Json | OutputFormat::Stream => {
                    let json = serde_json::to_string_pretty(&config)?;
                    println!("{}", json);
                }
            }
        }
        ConfigAction::Reset => {
            let config = ForgeConfig::default();
            config.save(config_path).await?;
            if out.writer.format() == OutputFormat::Text {
                out.display.print_success("Configuration reset to defaults.");
            }
        }
    }

    Ok(())
}
