use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use reservations_core::{
    AbortController, ApiClient, ClientConfig, Reservation, ReservationStatus, Table,
};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Parser, Clone)]
#[command(name = "reservations", about = "Talk to the restaurant reservations backend")]
pub struct Config {
    #[arg(long, env = "API_BASE_URL", default_value = reservations_core::config::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Fail on non-2xx responses even when they carry no error message.
    #[arg(long, env = "API_STRICT_STATUS")]
    pub strict_status: bool,

    /// Abort the request after this many seconds and print the fallback.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// List reservations, optionally for one date.
    List {
        #[arg(long)]
        date: Option<String>,
        /// Extra query parameter as key=value; may be repeated.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Find reservations by (part of) a phone number.
    Search { mobile_number: String },
    /// Create a reservation from a JSON record.
    Create { json: String },
    Read { reservation_id: i64 },
    /// Replace a reservation with a JSON record carrying its reservation_id.
    Update { json: String },
    Status {
        reservation_id: i64,
        status: ReservationStatus,
    },
    Tables,
    CreateTable { json: String },
    Seat { table_id: i64, reservation_id: i64 },
    /// Free a table and finish its reservation.
    Finish { table_id: i64 },
    /// Show the table a reservation is seated at.
    Seated { reservation_id: i64 },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got {s}"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_record<T: serde::de::DeserializeOwned>(json: &str) -> anyhow::Result<T> {
    serde_json::from_str(json).context("record is not valid JSON")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    let client = ApiClient::new(
        ClientConfig::new(&config.base_url).with_strict_status(config.strict_status),
    );

    let controller = AbortController::new();
    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, aborting request");
                controller.abort();
            }
        });
    }
    if let Some(secs) = config.timeout_secs {
        let controller = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(secs, "timed out, aborting request");
            controller.abort();
        });
    }

    let output = execute(&client, config.command, &controller).await?;
    if controller.is_aborted() {
        info!("request aborted, printing fallback");
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute(
    client: &ApiClient,
    command: Command,
    controller: &AbortController,
) -> anyhow::Result<Value> {
    let signal = controller.signal();
    let signal = Some(&signal);

    let output = match command {
        Command::List { date, mut params } => {
            if let Some(date) = date {
                params.insert(0, ("date".to_string(), date));
            }
            serde_json::to_value(client.list_reservations(&params, signal).await?)?
        }
        Command::Search { mobile_number } => {
            serde_json::to_value(client.search_reservations(&mobile_number, signal).await?)?
        }
        Command::Create { json } => {
            let reservation: Reservation = parse_record(&json)?;
            serde_json::to_value(client.create_reservation(&reservation, signal).await?)?
        }
        Command::Read { reservation_id } => {
            serde_json::to_value(client.read_reservation(reservation_id, signal).await?)?
        }
        Command::Update { json } => {
            let reservation: Reservation = parse_record(&json)?;
            if reservation.reservation_id.is_none() {
                bail!("update needs a record with reservation_id");
            }
            serde_json::to_value(client.update_reservation(&reservation, signal).await?)?
        }
        Command::Status { reservation_id, status } => {
            let updated = client
                .update_reservation_status(reservation_id, status, signal)
                .await?;
            serde_json::to_value(updated)?
        }
        Command::Tables => serde_json::to_value(client.list_tables(signal).await?)?,
        Command::CreateTable { json } => {
            let table: Table = parse_record(&json)?;
            serde_json::to_value(client.create_table(&table, signal).await?)?
        }
        Command::Seat { table_id, reservation_id } => {
            serde_json::to_value(client.seat_reservation(table_id, reservation_id, signal).await?)?
        }
        Command::Finish { table_id } => {
            serde_json::to_value(client.finish_table(table_id, signal).await?)?
        }
        Command::Seated { reservation_id } => {
            serde_json::to_value(client.read_table_by_reservation(reservation_id, signal).await?)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_splits_on_first_equals() {
        assert_eq!(
            parse_param("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_param("date").is_err());
    }

    #[test]
    fn list_accepts_date_and_params() {
        let config = Config::try_parse_from([
            "reservations",
            "--base-url",
            "http://example.test",
            "list",
            "--date",
            "2023-01-01",
            "--param",
            "mobile_number=555",
        ])
        .unwrap();
        assert_eq!(config.base_url, "http://example.test");
        match config.command {
            Command::List { date, params } => {
                assert_eq!(date.as_deref(), Some("2023-01-01"));
                assert_eq!(params, vec![("mobile_number".to_string(), "555".to_string())]);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn status_parses_known_values_only() {
        let config = Config::try_parse_from(["reservations", "status", "4", "seated"]).unwrap();
        assert!(matches!(
            config.command,
            Command::Status {
                reservation_id: 4,
                status: ReservationStatus::Seated
            }
        ));
        assert!(Config::try_parse_from(["reservations", "status", "4", "closed"]).is_err());
    }

    #[test]
    fn subcommands_are_kebab_case() {
        let config = Config::try_parse_from([
            "reservations",
            "create-table",
            r#"{"table_name":"Patio","capacity":8}"#,
        ])
        .unwrap();
        let Command::CreateTable { json } = config.command else {
            panic!("expected create-table");
        };
        let table: Table = parse_record(&json).unwrap();
        assert_eq!(table.capacity, 8);
    }
}
