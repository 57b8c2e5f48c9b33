//! Relgraph CLI: dataset generation, bulk ingestion and relationship queries
//!
//! Talks to the store named by the config (`GRAPH_URI`); without one it runs
//! against an in-process store, optionally preloaded from a dataset directory.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use relgraph::model::{
    SortOrder, TransactionListParams, TransactionSortField, TransactionSummary, UserListParams, UserSortField,
    UserSummary,
};
use relgraph::{
    BulkIngestor, Config, Dataset, EmbeddedClient, Generator, GeneratorConfig, GraphClient, IngestContext,
    RelationshipService, RemoteClient, Repository,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "relgraph", version, about = "Relgraph relationship engine CLI")]
struct Cli {
    /// YAML config file
    #[arg(long, global = true, env = "RELGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Dataset to load into the in-process store before running the command
    #[arg(long, global = true)]
    preload: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic dataset
    Datagen {
        #[arg(long, default_value = "./seed-data")]
        out: PathBuf,
        #[arg(long, default_value_t = 10_000)]
        users: usize,
        #[arg(long, default_value_t = 100_000)]
        transactions: usize,
        /// Zero picks a time-based seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 0.35)]
        shared_attribute_chance: f64,
        #[arg(long, default_value_t = 0.25)]
        payment_method_share_chance: f64,
        #[arg(long, default_value_t = 0.25)]
        ip_share_chance: f64,
        #[arg(long, default_value_t = 0.3)]
        device_share_chance: f64,
    },
    /// Ingest users, then transactions, from JSON files
    Ingest {
        #[arg(long, default_value = "./seed-data")]
        dataset_dir: PathBuf,
        /// Users file; defaults to users.json in the dataset dir
        #[arg(long)]
        users: Option<PathBuf>,
        /// Transactions file; defaults to transactions.json in the dataset dir
        #[arg(long)]
        transactions: Option<PathBuf>,
        /// Worker count; defaults to the configured value
        #[arg(long)]
        workers: Option<usize>,
        /// Abort the run after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Relationships around a user
    User { id: String },
    /// Relationships around a transaction
    Tx { id: String },
    /// Shortest connection between two users
    Path { from: String, to: String },
    /// List users
    Users {
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        kyc_status: String,
        #[arg(long)]
        risk_min: Option<f64>,
        #[arg(long)]
        risk_max: Option<f64>,
        #[arg(long, default_value = "")]
        country: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        email_domain: String,
        #[arg(long, default_value = "userId")]
        sort: String,
        #[arg(long)]
        order: Option<String>,
    },
    /// List transactions
    Transactions {
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        user_id: String,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long = "type", default_value = "")]
        tx_type: String,
        #[arg(long, default_value = "")]
        channel: String,
        #[arg(long)]
        min_amount: Option<f64>,
        #[arg(long)]
        max_amount: Option<f64>,
        /// RFC 3339
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// RFC 3339
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long, default_value = "timestamp")]
        sort: String,
        #[arg(long)]
        order: Option<String>,
    },
    /// Export every user or transaction summary
    Export {
        #[arg(value_enum)]
        entity: ExportEntity,
    },
    /// Check store connectivity
    Ping,
}

#[derive(Clone, clap::ValueEnum)]
enum ExportEntity {
    Users,
    Transactions,
}

struct Engine {
    client: Arc<dyn GraphClient>,
    service: Arc<RelationshipService>,
    workers: usize,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    relgraph::logging::init(&config.logging);

    if let Commands::Datagen {
        out,
        users,
        transactions,
        seed,
        shared_attribute_chance,
        payment_method_share_chance,
        ip_share_chance,
        device_share_chance,
    } = &cli.command
    {
        let generator_config = GeneratorConfig {
            num_users: *users,
            num_transactions: *transactions,
            shared_attribute_chance: *shared_attribute_chance,
            payment_method_share_chance: *payment_method_share_chance,
            ip_share_chance: *ip_share_chance,
            device_share_chance: *device_share_chance,
            seed: *seed,
        };
        return run_datagen(generator_config, out);
    }

    let engine = connect(&config)?;
    if let Some(dir) = &cli.preload {
        if config.graph.is_remote() {
            bail!("--preload only applies to the in-process store");
        }
        ingest_dataset(&engine, Dataset::load_from_dir(dir)?, None).await?;
    }

    let result = dispatch(&engine, cli.command, &cli.format).await;
    engine.client.close().await.context("closing graph client")?;
    result
}

fn connect(config: &Config) -> Result<Engine> {
    let client: Arc<dyn GraphClient> = if config.graph.is_remote() {
        Arc::new(RemoteClient::new(config.graph.remote_options()).context("creating remote client")?)
    } else {
        Arc::new(EmbeddedClient::new())
    };
    let repository = Repository::new(client.clone());
    let service = Arc::new(RelationshipService::new(Arc::new(repository)));
    Ok(Engine {
        client,
        service,
        workers: config.ingest.workers,
    })
}

async fn dispatch(engine: &Engine, command: Commands, format: &OutputFormat) -> Result<()> {
    match command {
        Commands::Datagen { .. } => Ok(()),
        Commands::Ingest {
            dataset_dir,
            users,
            transactions,
            workers,
            timeout_secs,
        } => {
            let users = users.unwrap_or_else(|| dataset_dir.join(relgraph::generator::USERS_FILE));
            let transactions =
                transactions.unwrap_or_else(|| dataset_dir.join(relgraph::generator::TRANSACTIONS_FILE));
            let dataset = Dataset {
                users: relgraph::generator::read_json(&users)?,
                transactions: relgraph::generator::read_json(&transactions)?,
            };
            engine
                .client
                .verify_connectivity()
                .await
                .context("graph store unreachable")?;
            let engine = Engine {
                client: engine.client.clone(),
                service: engine.service.clone(),
                workers: workers.unwrap_or(engine.workers),
            };
            ingest_dataset(&engine, dataset, timeout_secs.map(Duration::from_secs)).await
        }
        Commands::User { id } => {
            let view = engine.service.user_relationships(&id).await?;
            match format {
                OutputFormat::Table => {
                    let mut table = new_table(&["user", "link", "direction", "transaction", "amount", "currency"]);
                    for link in &view.direct_links {
                        table.add_row(vec![
                            link.user_id.clone(),
                            link.link_type.clone(),
                            link.direction.clone(),
                            link.transaction_id.clone(),
                            format!("{:.2}", link.amount),
                            link.currency.clone(),
                        ]);
                    }
                    println!("{}", table);

                    let mut shared = new_table(&["attribute", "hash", "users"]);
                    for attr in &view.shared_attributes {
                        shared.add_row(vec![
                            attr.attribute_type.clone(),
                            attr.attribute_hash.clone(),
                            attr.user_ids.join(" "),
                        ]);
                    }
                    println!("{}", shared);
                    println!(
                        "{} direct link(s), {} transaction(s), {} shared attribute(s)",
                        view.direct_links.len(),
                        view.transactions.len(),
                        view.shared_attributes.len()
                    );
                    Ok(())
                }
                _ => print_json(&view),
            }
        }
        Commands::Tx { id } => {
            let view = engine.service.transaction_relationships(&id).await?;
            match format {
                OutputFormat::Table => {
                    let mut users = new_table(&["user", "role", "direction", "amount", "currency"]);
                    for user in &view.users {
                        users.add_row(vec![
                            user.user_id.clone(),
                            user.role.clone(),
                            user.direction.clone(),
                            format!("{:.2}", user.amount),
                            user.currency.clone(),
                        ]);
                    }
                    println!("{}", users);

                    let mut linked = new_table(&["transaction", "link", "hash", "score", "updated"]);
                    for tx in &view.linked_transactions {
                        linked.add_row(vec![
                            tx.transaction_id.clone(),
                            tx.link_type.clone(),
                            tx.attribute_hash.clone(),
                            format!("{:.2}", tx.score),
                            format_time(tx.last_updated),
                        ]);
                    }
                    println!("{}", linked);
                    Ok(())
                }
                _ => print_json(&view),
            }
        }
        Commands::Path { from, to } => {
            let path = engine.service.shortest_path(&from, &to).await?;
            match format {
                OutputFormat::Table => {
                    if path.is_empty() {
                        println!("(no path within bound)");
                        return Ok(());
                    }
                    let steps: Vec<String> = path.nodes.iter().map(|n| format!("({}:{})", n.node_type, n.label)).collect();
                    println!("{}", steps.join(" - "));
                    println!("{} hop(s)", path.hops.unwrap_or(0));
                    Ok(())
                }
                _ => print_json(&path),
            }
        }
        Commands::Users {
            page,
            page_size,
            search,
            kyc_status,
            risk_min,
            risk_max,
            country,
            city,
            email_domain,
            sort,
            order,
        } => {
            let params = UserListParams {
                page,
                page_size,
                search,
                kyc_status,
                risk_min,
                risk_max,
                country,
                city,
                email_domain,
                sort_field: UserSortField::from_name(&sort),
                sort_order: parse_order(order.as_deref())?,
            };
            let page = engine.service.list_users(&params).await?;
            match format {
                OutputFormat::Json => print_json(&page),
                _ => {
                    print_users(&page.items, format);
                    println!(
                        "page {}/{} ({} total)",
                        page.pagination.page, page.pagination.total_pages, page.pagination.total_items
                    );
                    Ok(())
                }
            }
        }
        Commands::Transactions {
            page,
            page_size,
            search,
            user_id,
            status,
            tx_type,
            channel,
            min_amount,
            max_amount,
            start,
            end,
            sort,
            order,
        } => {
            let params = TransactionListParams {
                page,
                page_size,
                search,
                user_id,
                status,
                tx_type,
                min_amount,
                max_amount,
                start_time: start,
                end_time: end,
                channel,
                sort_field: TransactionSortField::from_name(&sort),
                sort_order: parse_order(order.as_deref())?,
            };
            let page = engine.service.list_transactions(&params).await?;
            match format {
                OutputFormat::Json => print_json(&page),
                _ => {
                    print_transactions(&page.items, format);
                    println!(
                        "page {}/{} ({} total)",
                        page.pagination.page, page.pagination.total_pages, page.pagination.total_items
                    );
                    Ok(())
                }
            }
        }
        Commands::Export { entity } => match entity {
            ExportEntity::Users => {
                let users = engine.service.export_users().await?;
                match format {
                    OutputFormat::Json => print_json(&users),
                    _ => {
                        print_users(&users, format);
                        Ok(())
                    }
                }
            }
            ExportEntity::Transactions => {
                let transactions = engine.service.export_transactions().await?;
                match format {
                    OutputFormat::Json => print_json(&transactions),
                    _ => {
                        print_transactions(&transactions, format);
                        Ok(())
                    }
                }
            }
        },
        Commands::Ping => {
            let start = Instant::now();
            engine.client.verify_connectivity().await?;
            println!("PONG ({} ms)", start.elapsed().as_millis());
            Ok(())
        }
    }
}

fn run_datagen(config: GeneratorConfig, out: &Path) -> Result<()> {
    let start = Instant::now();
    let dataset = Generator::new(config).generate();
    dataset
        .write_to_dir(out)
        .with_context(|| format!("writing dataset to {}", out.display()))?;
    info!(
        users = dataset.users.len(),
        transactions = dataset.transactions.len(),
        dir = %out.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "dataset written"
    );
    println!(
        "wrote {} users and {} transactions to {}",
        dataset.users.len(),
        dataset.transactions.len(),
        out.display()
    );
    Ok(())
}

/// Users must be fully ingested before the transactions that reference them
async fn ingest_dataset(engine: &Engine, dataset: Dataset, timeout: Option<Duration>) -> Result<()> {
    let ingestor = BulkIngestor::new(engine.service.clone(), engine.workers);
    let ctx = match timeout {
        Some(timeout) => IngestContext::new().with_timeout(timeout),
        None => IngestContext::new(),
    };

    let start = Instant::now();
    let user_count = dataset.users.len();
    let tx_count = dataset.transactions.len();
    ingestor
        .ingest_users(&ctx, dataset.users)
        .await
        .context("ingesting users")?;
    ingestor
        .ingest_transactions(&ctx, dataset.transactions)
        .await
        .context("ingesting transactions")?;

    info!(
        users = user_count,
        transactions = tx_count,
        workers = ingestor.workers(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "ingestion complete"
    );
    Ok(())
}

fn parse_order(order: Option<&str>) -> Result<Option<SortOrder>> {
    match order {
        None => Ok(None),
        Some(name) => match SortOrder::from_name(name) {
            Some(order) => Ok(Some(order)),
            None => bail!("invalid sort order {:?}, expected asc or desc", name),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn print_rows(header: &[&str], rows: Vec<Vec<String>>, format: &OutputFormat) {
    match format {
        OutputFormat::Csv => {
            println!("{}", header.join(","));
            for row in rows {
                let cells: Vec<String> = row.iter().map(|c| format_csv_value(c)).collect();
                println!("{}", cells.join(","));
            }
        }
        _ => {
            if rows.is_empty() {
                println!("(no results)");
                return;
            }
            let mut table = new_table(header);
            let count = rows.len();
            for row in rows {
                table.add_row(row);
            }
            println!("{}", table);
            println!("{} row(s)", count);
        }
    }
}

fn print_users(users: &[UserSummary], format: &OutputFormat) {
    let rows = users
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.full_name.clone(),
                u.email.clone(),
                u.phone.clone(),
                u.kyc_status.clone(),
                format!("{:.3}", u.risk_score),
                format_time(u.created_at),
            ]
        })
        .collect();
    print_rows(&["id", "name", "email", "phone", "kyc", "risk", "created"], rows, format);
}

fn print_transactions(transactions: &[TransactionSummary], format: &OutputFormat) {
    let rows = transactions
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.sender_user_id.clone(),
                t.receiver_user_id.clone(),
                format!("{:.2}", t.amount),
                t.currency.clone(),
                t.tx_type.clone(),
                t.status.clone(),
                t.channel.clone(),
                format_time(t.timestamp),
            ]
        })
        .collect();
    print_rows(
        &["id", "sender", "receiver", "amount", "currency", "type", "status", "channel", "timestamp"],
        rows,
        format,
    );
}

fn format_time(t: Option<DateTime<Utc>>) -> String {
    relgraph::model::format_time(t.as_ref())
}

fn format_csv_value(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
