//! funding-allocator CLI
//!
//! Allocate payments across a portfolio from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Allocate one transaction
//! funding-allocator optimise --portfolio alex.json --amount 240 --category hotel
//!
//! # Foreign currency, JSON output
//! funding-allocator optimise --portfolio alex.json --amount 300 --currency USD --format json
//!
//! # Replay several transactions in order
//! funding-allocator batch --portfolio alex.json --transactions week.json
//!
//! # Generate a random portfolio for testing
//! funding-allocator generate --credit 3 --debit 2 --backup 1
//! ```

use chrono::NaiveDate;
use funding_allocator::config::EngineConfig;
use funding_allocator::core::category::{AllocationMode, SpendCategory};
use funding_allocator::core::currency::CurrencyCode;
use funding_allocator::core::portfolio::Portfolio;
use funding_allocator::core::transaction::TransactionRequest;
use funding_allocator::optimization::allocator::StrategyKind;
use funding_allocator::optimization::engine::AllocationEngine;
use funding_allocator::optimization::liquidity::LiquiditySummary;
use funding_allocator::simulation::batch::replay;
use funding_allocator::simulation::stress_test::{generate_random_portfolio, PortfolioConfig};
use rust_decimal::Decimal;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"funding-allocator — split a payment across funding sources to maximise end-of-month cash

USAGE:
    funding-allocator <COMMAND> [OPTIONS]

COMMANDS:
    optimise    Allocate a single transaction
    batch       Replay a list of transactions in order against one portfolio
    generate    Generate a random portfolio (for testing)
    help        Show this message

OPTIONS (optimise):
    --portfolio <FILE>    Path to JSON portfolio snapshot
    --amount <N>          Transaction amount
    --currency <CODE>     Transaction currency (default: GBP)
    --category <NAME>     Spend category (default: other)
    --mode <MODE>         balanced or interest_only (default: from category)
    --description <TEXT>  Free-text label

OPTIONS (optimise, batch):
    --today <YYYY-MM-DD>  Evaluation date (default: today)
    --config <FILE>       Engine config JSON
    --strategy <NAME>     exact (default) or heuristic
    --format <FORMAT>     Output format: text (default) or json

OPTIONS (batch):
    --transactions <FILE> JSON file with a "transactions" array

OPTIONS (generate):
    --credit <N>          Number of credit cards (default: 3)
    --debit <N>           Number of debit accounts (default: 2)
    --backup <N>          Number of backup cards (default: 1)
    --output <FILE>       Write to file instead of stdout

EXAMPLES:
    funding-allocator optimise --portfolio alex.json --amount 240 --category hotel
    funding-allocator optimise --portfolio alex.json --amount 300 --currency USD --format json
    funding-allocator batch --portfolio alex.json --transactions week.json --today 2026-03-10
    funding-allocator generate --credit 4 --output random.json"#
    );
}

#[derive(serde::Deserialize)]
struct TransactionsFile {
    transactions: Vec<TransactionRequest>,
}

/// Options shared by `optimise` and `batch`.
struct EngineOptions {
    today: Option<NaiveDate>,
    config_path: Option<String>,
    strategy: Option<StrategyKind>,
    format: String,
}

impl EngineOptions {
    fn new() -> Self {
        Self {
            today: None,
            config_path: None,
            strategy: None,
            format: "text".to_string(),
        }
    }

    /// Consume a shared option at `args[*i]`. Returns false if not recognised.
    fn parse(&mut self, args: &[String], i: &mut usize) -> bool {
        match args[*i].as_str() {
            "--today" => {
                *i += 1;
                self.today = Some(
                    args.get(*i)
                        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                        .unwrap_or_else(|| fail("--today requires a date as YYYY-MM-DD")),
                );
            }
            "--config" => {
                *i += 1;
                self.config_path = Some(require(args, *i, "--config requires a file path"));
            }
            "--strategy" => {
                *i += 1;
                self.strategy = Some(
                    args.get(*i)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or_else(|| fail("--strategy requires 'exact' or 'heuristic'")),
                );
            }
            "--format" => {
                *i += 1;
                self.format = require(args, *i, "--format requires 'text' or 'json'");
            }
            _ => return false,
        }
        true
    }

    fn engine(&self) -> AllocationEngine {
        let mut config = match &self.config_path {
            Some(path) => EngineConfig::from_json_file(path).unwrap_or_else(|e| fail(&e.to_string())),
            None => EngineConfig::default(),
        };
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        AllocationEngine::new(config)
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn json(&self) -> bool {
        self.format == "json"
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn require(args: &[String], i: usize, message: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| fail(message))
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| fail(&format!("Error serialising output: {}", e)));
    println!("{}", json);
}

fn load_portfolio(path: &str) -> Portfolio {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        fail(&format!("Error reading file '{}': {}", path, e));
    });

    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing portfolio JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(r#"{{
  "user_id": "usr_001",
  "name": "Alex",
  "credit_cards": [
    {{ "id": "amex", "name": "Amex Gold", "credit_limit": 5000, "current_balance": 0,
       "cashback_rates": {{ "hotel": 0.05, "other": 0.01 }} }}
  ],
  "debit_accounts": [
    {{ "id": "current", "name": "Current", "balance": 1500, "savings_rate_annual": 0.01, "is_primary": true }}
  ]
}}"#);
        process::exit(1);
    })
}

fn cmd_optimise(args: &[String]) {
    let mut options = EngineOptions::new();
    let mut portfolio_path = None;
    let mut amount: Option<Decimal> = None;
    let mut currency = CurrencyCode::default();
    let mut category = SpendCategory::default();
    let mut mode: Option<AllocationMode> = None;
    let mut description: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        if options.parse(args, &mut i) {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--portfolio" => {
                i += 1;
                portfolio_path = Some(require(args, i, "--portfolio requires a file path"));
            }
            "--amount" => {
                i += 1;
                amount = Some(
                    args.get(i)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or_else(|| fail("--amount requires a number")),
                );
            }
            "--currency" => {
                i += 1;
                currency = CurrencyCode::new(require(args, i, "--currency requires a code"));
            }
            "--category" => {
                i += 1;
                category = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--category requires a known category"));
            }
            "--mode" => {
                i += 1;
                mode = Some(
                    args.get(i)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or_else(|| fail("--mode requires 'balanced' or 'interest_only'")),
                );
            }
            "--description" => {
                i += 1;
                description = Some(require(args, i, "--description requires text"));
            }
            _ => fail(&format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let path = portfolio_path.unwrap_or_else(|| fail("Error: --portfolio <FILE> is required"));
    let amount = amount.unwrap_or_else(|| fail("Error: --amount <N> is required"));
    if amount <= Decimal::ZERO {
        fail("Error: --amount must be positive");
    }

    let portfolio = load_portfolio(&path);
    let mut request = TransactionRequest::new(amount, currency, category);
    if let Some(mode) = mode {
        request = request.with_mode(mode);
    }
    if let Some(description) = description {
        request = request.with_description(description);
    }

    let engine = options.engine();
    let today = options.today();
    match engine.optimise(&request, &portfolio, today) {
        Ok(result) => {
            if options.json() {
                print_json(&result);
            } else {
                println!("{}", result);
            }
        }
        Err(err) => {
            eprintln!("Allocation failed: {}", err);
            if err.is_liquidity_failure() {
                if let Ok((amount_home, slots)) = engine.evaluate(&request, &portfolio, today) {
                    eprintln!("{}", LiquiditySummary::from_slots(&slots, amount_home));
                }
            }
            process::exit(2);
        }
    }
}

fn cmd_batch(args: &[String]) {
    let mut options = EngineOptions::new();
    let mut portfolio_path = None;
    let mut transactions_path = None;
    let mut i = 0;
    while i < args.len() {
        if options.parse(args, &mut i) {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "--portfolio" => {
                i += 1;
                portfolio_path = Some(require(args, i, "--portfolio requires a file path"));
            }
            "--transactions" => {
                i += 1;
                transactions_path = Some(require(args, i, "--transactions requires a file path"));
            }
            _ => fail(&format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let portfolio_path =
        portfolio_path.unwrap_or_else(|| fail("Error: --portfolio <FILE> is required"));
    let transactions_path =
        transactions_path.unwrap_or_else(|| fail("Error: --transactions <FILE> is required"));

    let portfolio = load_portfolio(&portfolio_path);
    let content = fs::read_to_string(&transactions_path).unwrap_or_else(|e| {
        fail(&format!("Error reading file '{}': {}", transactions_path, e));
    });
    let file: TransactionsFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing transactions JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(r#"{{
  "transactions": [
    {{ "amount": 45.60, "currency": "GBP", "category": "grocery", "description": "Weekly shop" }}
  ]
}}"#);
        process::exit(1);
    });
    if let Some(bad) = file.transactions.iter().find(|t| t.amount <= Decimal::ZERO) {
        fail(&format!("Transaction amount must be positive, got {}", bad.amount));
    }

    let report = replay(&options.engine(), &portfolio, &file.transactions, options.today());
    if options.json() {
        print_json(&report);
    } else {
        println!("{}", report);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = PortfolioConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--credit" => {
                i += 1;
                config.credit_count = count(args, i, "--credit requires a number");
            }
            "--debit" => {
                i += 1;
                config.debit_count = count(args, i, "--debit requires a number");
            }
            "--backup" => {
                i += 1;
                config.backup_count = count(args, i, "--backup requires a number");
            }
            "--output" => {
                i += 1;
                output_path = Some(require(args, i, "--output requires a file path"));
            }
            _ => fail(&format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let portfolio = generate_random_portfolio(&config);
    let json = serde_json::to_string_pretty(&portfolio)
        .unwrap_or_else(|e| fail(&format!("Error serialising portfolio: {}", e)));

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            fail(&format!("Error writing to '{}': {}", path, e));
        });
        eprintln!(
            "Generated portfolio with {} sources → {}",
            portfolio.source_count(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn count(args: &[String], i: usize, message: &str) -> usize {
    args.get(i)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| fail(message))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "optimise" | "optimize" => cmd_optimise(rest),
        "batch" => cmd_batch(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
