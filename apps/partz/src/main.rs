use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    generative::DEFAULT_MODEL, AssistantSession, ExampleConnector, GenerativeClient,
    GenerativeConfig, InMemoryTranscript, PartRequestForm, QueryRef, ShopProfileForm,
    TranscriptStore,
};
use futures::StreamExt;
use shared::{
    domain::{ConversationId, UserId},
    protocol::{GetPartRequestsByMechanic, GetPartRequestsByMechanicVariables},
};
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "partz", about = "Partz Finda command line client")]
struct Cli {
    #[arg(long, env = "PARTZ_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a part request on behalf of a mechanic.
    SubmitRequest(SubmitRequestArgs),
    /// List a mechanic's part requests, newest first.
    Requests {
        #[arg(long)]
        mechanic_id: UserId,
        /// Keep polling and print the list whenever it changes.
        #[arg(long)]
        watch: bool,
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
    },
    /// Register a supplier shop.
    CreateShop(CreateShopArgs),
    /// List registered supplier shops.
    Shops,
    /// Describe the part you need to the request assistant.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct SubmitRequestArgs {
    #[arg(long)]
    mechanic_id: UserId,
    #[arg(long)]
    make: String,
    #[arg(long)]
    model: String,
    #[arg(long)]
    year: String,
    #[arg(long)]
    description: String,
    #[arg(long, default_value = "")]
    vin: String,
    #[arg(long, default_value = "")]
    urgency: String,
}

#[derive(Args, Debug)]
struct CreateShopArgs {
    #[arg(long)]
    user_id: UserId,
    #[arg(long)]
    shop_name: String,
    #[arg(long)]
    contact: String,
    /// Comma separated.
    #[arg(long, default_value = "")]
    delivery_options: String,
    /// Comma separated.
    #[arg(long, default_value = "")]
    specialties: String,
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, env = "GENERATIVE_API_KEY", hide_env_values = true)]
    api_key: String,
    #[arg(long, env = "GENERATIVE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, env = "GENERATIVE_BASE_URL")]
    base_url: Option<String>,
    /// Persist the conversation in this database instead of memory.
    #[arg(long)]
    database_url: Option<String>,
    /// Continue an earlier conversation stored in `--database-url`.
    #[arg(long, requires = "database_url")]
    conversation_id: Option<ConversationId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::SubmitRequest(args) => submit_request(&connect(&cli.server_url)?, args).await,
        Command::Requests {
            mechanic_id,
            watch,
            interval_secs,
        } => {
            let connector = connect(&cli.server_url)?;
            let query = connector.query_ref::<GetPartRequestsByMechanic>(
                GetPartRequestsByMechanicVariables { mechanic_id },
            );
            if watch {
                watch_requests(query, Duration::from_secs(interval_secs.max(1))).await
            } else {
                let data = query.execute().await?;
                println!("{}", serde_json::to_string_pretty(&data.part_requests)?);
                Ok(())
            }
        }
        Command::CreateShop(args) => create_shop(&connect(&cli.server_url)?, args).await,
        Command::Shops => {
            let profiles = connect(&cli.server_url)?.list_shop_profiles().await?;
            println!("{}", serde_json::to_string_pretty(&profiles)?);
            Ok(())
        }
        Command::Chat(args) => chat(args).await,
    }
}

fn connect(server_url: &str) -> Result<ExampleConnector> {
    ExampleConnector::connect(server_url)
        .with_context(|| format!("invalid server url {server_url}"))
}

async fn submit_request(connector: &ExampleConnector, args: SubmitRequestArgs) -> Result<()> {
    let variables = PartRequestForm {
        vehicle_make: args.make,
        vehicle_model: args.model,
        vehicle_year: args.year,
        part_description: args.description,
        vin: args.vin,
        urgency: args.urgency,
    }
    .into_variables(args.mechanic_id)?;
    let id = connector.insert_part_request(variables).await?;
    println!("submitted part_request_id={id}");
    Ok(())
}

async fn watch_requests(
    query: QueryRef<GetPartRequestsByMechanic>,
    period: Duration,
) -> Result<()> {
    let mut updates = query.subscribe(period)?;
    while let Some(update) = updates.next().await {
        match update {
            Ok(data) => println!("{}", serde_json::to_string_pretty(&data.part_requests)?),
            Err(error) => warn!(%error, "refresh failed"),
        }
    }
    Ok(())
}

async fn create_shop(connector: &ExampleConnector, args: CreateShopArgs) -> Result<()> {
    let variables = ShopProfileForm {
        shop_name: args.shop_name,
        primary_contact_person: args.contact,
        delivery_options: args.delivery_options,
        inventory_specialties: args.specialties,
    }
    .into_variables(args.user_id)?;
    let id = connector.create_shop_profile(variables).await?;
    println!("created shop_profile_id={id}");
    Ok(())
}

async fn chat(args: ChatArgs) -> Result<()> {
    let mut config = GenerativeConfig::new(args.api_key);
    config.model = args.model;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let generator = Arc::new(GenerativeClient::new(config)?);

    let transcript: Arc<dyn TranscriptStore> = match &args.database_url {
        Some(url) => Arc::new(Storage::new(url).await?),
        None => Arc::new(InMemoryTranscript::default()),
    };
    let mut session = match args.conversation_id {
        Some(id) => AssistantSession::resume(id, generator, transcript).await?,
        None => AssistantSession::new(generator, transcript),
    };

    for message in session.messages() {
        println!("[{}] {}", message.sender.as_str(), message.text);
    }
    info!(conversation_id = %session.conversation_id(), "chat session started");
    println!("(conversation {}; empty line to skip, ctrl-d to quit)", session.conversation_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(reply) = session.send(&line).await {
            println!("[{}] {}", reply.sender.as_str(), reply.text);
        }
    }
    Ok(())
}
