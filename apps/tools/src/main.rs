use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::UserId;
use storage::{NewPartRequest, NewShopProfile, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/partz.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and apply migrations.
    Migrate,
    /// Insert the demo shops and part requests shown on the dashboards.
    SeedDemo {
        #[arg(long)]
        mechanic_id: Option<UserId>,
    },
    /// Print row counts.
    Dump,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Migrate => {
            println!("database ready at {}", cli.database_url);
        }
        Command::SeedDemo { mechanic_id } => {
            let mechanic_id = mechanic_id.unwrap_or_default();
            seed_demo(&storage, mechanic_id).await?;
            println!("seeded demo data for mechanic_id={mechanic_id}");
        }
        Command::Dump => {
            let summary = storage.summary().await?;
            println!(
                "part_requests={} shop_profiles={} chat_messages={}",
                summary.part_requests, summary.shop_profiles, summary.chat_messages
            );
        }
    }

    Ok(())
}

async fn seed_demo(storage: &Storage, mechanic_id: UserId) -> Result<()> {
    for (shop_name, contact, delivery, specialties) in [
        (
            "AutoParts Plus",
            "Maria Lopez",
            vec!["same-day", "pickup"],
            vec!["brakes", "filters"],
        ),
        (
            "Parts Warehouse",
            "Sam Carter",
            vec!["next-day"],
            vec!["electrical", "engine"],
        ),
    ] {
        storage
            .insert_shop_profile(&NewShopProfile {
                user_id: UserId::new(),
                delivery_options: Some(delivery.into_iter().map(str::to_string).collect()),
                inventory_specialties: Some(specialties.into_iter().map(str::to_string).collect()),
                primary_contact_person: contact.to_string(),
                shop_name: shop_name.to_string(),
            })
            .await?;
    }

    for (make, model, year, description, urgency) in [
        ("Toyota", "Camry", 2018, "Front brake pads", Some("high")),
        ("Honda", "Civic", 2020, "Oil filter", None),
        ("Ford", "F-150", 2016, "Alternator", Some("medium")),
    ] {
        storage
            .insert_part_request(&NewPartRequest {
                mechanic_id,
                vin: None,
                part_description: description.to_string(),
                urgency: urgency.map(str::to_string),
                vehicle_make: make.to_string(),
                vehicle_model: model.to_string(),
                vehicle_year: year,
            })
            .await?;
    }

    Ok(())
}
