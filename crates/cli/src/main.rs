use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ares")]
#[command(about = "ARES service-request bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config with the default client/equipment registry, empty ticket store).
    Init {
        /// Config file path (default: ARES_CONFIG_PATH or ~/.ares/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the gateway (WhatsApp webhook + classify/tickets API).
    Gateway {
        /// Config file path (default: ARES_CONFIG_PATH or ~/.ares/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 15151)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Classify a message offline and print the replies it would produce. Nothing is stored or sent.
    Classify {
        /// Message text
        text: String,

        /// Sender phone number
        #[arg(long, default_value = "")]
        phone: String,

        /// Ticket number to show in the rendered replies
        #[arg(long, value_name = "NUMBER")]
        ticket: Option<String>,

        /// Config file path (default: ARES_CONFIG_PATH or ~/.ares/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// List the most recent stored tickets.
    Tickets {
        /// Config file path (default: ARES_CONFIG_PATH or ~/.ares/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Maximum number of tickets to show
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("ares {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Classify {
            text,
            phone,
            ticket,
            config,
        }) => {
            if let Err(e) = run_classify(config, &text, &phone, ticket) {
                log::error!("classify failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Tickets { config, limit }) => {
            if let Err(e) = run_tickets(config, limit).await {
                log::error!("tickets failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    lib::gateway::run_gateway(config, path).await
}

fn run_classify(
    config_path: Option<std::path::PathBuf>,
    text: &str,
    phone: &str,
    ticket: Option<String>,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let classifier = lib::classifier::MessageClassifier::from_config(&config.registry);
    let composer = lib::compose::ResponseComposer::from_config(&config.notify);

    let result = classifier.classify(text, phone);
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.is_service_request {
        return Ok(());
    }

    let ticket_number =
        ticket.unwrap_or_else(|| lib::tickets::PREVIEW_TICKET_NUMBER.to_string());
    let details = lib::tickets::TicketDetails::from_classification(&result, phone);
    println!("\n--- group ---");
    println!("{}", composer.render_group_response(&ticket_number, &details));
    println!("\n--- technician ---");
    println!(
        "{}",
        composer.render_technician_notification(&ticket_number, &details)
    );
    Ok(())
}

async fn run_tickets(config_path: Option<std::path::PathBuf>, limit: usize) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    let tickets_path = lib::config::resolve_tickets_path(&config, &path);
    let store = lib::tickets::TicketStore::load(&tickets_path).await?;
    let tickets = store.list(limit).await;
    if tickets.is_empty() {
        println!("no tickets in {}", tickets_path.display());
        return Ok(());
    }
    for t in tickets {
        println!(
            "{}  {}  {:<8}  {}  {}",
            t.ticket_number,
            t.created_at.format("%Y-%m-%d %H:%M"),
            t.details.prioridad.map(|p| p.label()).unwrap_or("-"),
            t.details.cliente.as_deref().unwrap_or("-"),
            t.details.problema.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
