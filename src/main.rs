use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payflow::application::engine::PaymentEngine;
use payflow::config::Config;
use payflow::domain::ports::{AccountStoreRef, EventLogRef, TransactionStoreRef};
use payflow::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryEventLog, InMemoryTransactionStore,
};
#[cfg(feature = "storage-rocksdb")]
use payflow::infrastructure::rocksdb::RocksDBStore;
use payflow::interfaces::csv::command_reader::{Command, CommandReader, CommandType};
use payflow::interfaces::csv::report_writer::ReportWriter;
use payflow::logging::init_logging;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command script (CSV)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write every transaction record to this CSV file
    #[arg(long)]
    transactions: Option<PathBuf>,

    /// Log filter, e.g. `info` or `payflow=debug`
    #[arg(long, env = "PAYFLOW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

type Stores = (AccountStoreRef, TransactionStoreRef, EventLogRef);

fn in_memory_stores() -> Stores {
    (
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryTransactionStore::new()),
        Arc::new(InMemoryEventLog::new()),
    )
}

fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = Arc::new(RocksDBStore::open(path).into_diagnostic()?);
            let accounts: AccountStoreRef = store.clone();
            let transactions: TransactionStoreRef = store.clone();
            let events: EventLogRef = store;
            Ok((accounts, transactions, events))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

/// Runs script commands against the engine.
///
/// Callbacks name their transaction by the idempotency key used to create
/// it, since generated transaction ids are not known when writing a script.
struct ScriptRunner {
    engine: PaymentEngine,
    transactions_by_key: HashMap<String, String>,
}

impl ScriptRunner {
    async fn run(&mut self, command: Command) -> payflow::error::Result<()> {
        match command.r#type {
            CommandType::Open => {
                let id = command.require(command.account.as_deref(), "account")?;
                let balance = command.require(command.amount.as_ref(), "amount")?;
                self.engine.open_account(id, *balance).await?;
            }
            CommandType::Transfer => {
                let payer = command.require(command.account.as_deref(), "account")?;
                let receiver = command.require(command.counterparty.as_deref(), "counterparty")?;
                let amount = command.require(command.amount.as_ref(), "amount")?;
                let key = command.require(command.reference.as_deref(), "reference")?;

                let receipt = self
                    .engine
                    .initiate_transfer(payer, receiver, *amount, key)
                    .await?;
                self.transactions_by_key
                    .insert(key.to_string(), receipt.transaction_id);
            }
            CommandType::Callback => {
                let reference = command.require(command.reference.as_deref(), "reference")?;
                let amount = command.require(command.amount.as_ref(), "amount")?;
                let status = command.require(command.status.as_ref(), "status")?;
                let transaction_id = self
                    .transactions_by_key
                    .get(reference)
                    .cloned()
                    .unwrap_or_else(|| reference.to_string());
                let payload = serde_json::to_value(&command)?;

                self.engine
                    .reconcile_gateway_callback(&transaction_id, *status, *amount, payload)
                    .await?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).into_diagnostic()?,
        None => Config::default(),
    };
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    config.log.json |= cli.log_json;
    init_logging(&config.log);

    let (accounts, transactions, events) = open_stores(cli.db_path)?;
    let engine = PaymentEngine::new(accounts, transactions, events, config.engine);
    let mut runner = ScriptRunner {
        engine: engine.clone(),
        transactions_by_key: HashMap::new(),
    };

    // Process commands
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = runner.run(command).await {
                    eprintln!("Error processing command: {}: {}", e.error_code(), e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    // Output final state
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer
        .write_accounts(engine.accounts().await.into_diagnostic()?)
        .into_diagnostic()?;

    if let Some(path) = cli.transactions {
        let file = File::create(path).into_diagnostic()?;
        ReportWriter::new(file)
            .write_transactions(engine.transactions().await.into_diagnostic()?)
            .into_diagnostic()?;
    }

    Ok(())
}
