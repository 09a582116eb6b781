//! switchrpc CLI — exercise failover across RPC endpoints from the terminal.
//!
//! Usage:
//! ```bash
//! # Probe the chain head, failing over across the given endpoints in order
//! switchrpc test --url https://rpc-a.example.com --url https://rpc-b.example.com
//!
//! # Send a raw JSON-RPC call through the failover client
//! switchrpc call --url https://cloudflare-eth.com --method eth_blockNumber
//! ```

use std::env;
use std::process;
use std::time::Duration;

use switchrpc_client::{ClientConfig, SwitchRpcClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "test" => cmd_test(&args[2..]).await,
        "call" => cmd_call(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("switchrpc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("switchrpc {}", env!("CARGO_PKG_VERSION"));
    println!("Failover JSON-RPC client for blockchain endpoints\n");
    println!("USAGE:");
    println!("    switchrpc <COMMAND>\n");
    println!("COMMANDS:");
    println!("    test       Probe the chain head with failover (latency, block number)");
    println!("    call       Send a raw JSON-RPC call with failover");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("FLAGS:");
    println!("    --url <URL>        Endpoint URL; repeat for failover order  [required]");
    println!("    --method <NAME>    JSON-RPC method (call only)              [required]");
    println!("    --retries <N>      Retries per endpoint                     [default: 3]");
    println!("    --backoff-ms <MS>  Delay between attempts                   [default: 25]");
}

fn build_client(args: &[String]) -> Result<SwitchRpcClient, String> {
    let urls = parse_repeated_flag(args, "--url");
    if urls.is_empty() {
        return Err("at least one --url is required".into());
    }

    let mut config = ClientConfig::new(urls);
    if let Some(retries) = parse_flag(args, "--retries") {
        config.rpc_retries = retries.parse().map_err(|_| "--retries must be a positive integer")?;
    }
    if let Some(backoff) = parse_flag(args, "--backoff-ms") {
        let ms: u64 = backoff.parse().map_err(|_| "--backoff-ms must be an integer")?;
        config.rpc_retry_timeout = Duration::from_millis(ms);
    }
    config.on_endpoint_change = Some(std::sync::Arc::new(|ev| {
        eprintln!("  switched endpoint: {} -> {}", ev.from, ev.to);
    }));

    SwitchRpcClient::new(config).map_err(|e| e.to_string())
}

async fn cmd_test(args: &[String]) -> Result<(), String> {
    let client = build_client(args)?;

    println!("Probing {} endpoint(s)...", client.urls().len());

    let start = std::time::Instant::now();
    let block: String = client
        .call("eth_blockNumber", vec![])
        .await
        .map_err(|e| e.to_string())?;
    let latency = start.elapsed();

    let block_num = u64::from_str_radix(block.trim_start_matches("0x"), 16).unwrap_or(0);

    println!("  Status:       OK");
    println!("  Block number: {block_num} ({block})");
    println!("  Latency:      {}ms", latency.as_millis());
    println!("  Endpoint:     {}", client.current_url());

    Ok(())
}

async fn cmd_call(args: &[String]) -> Result<(), String> {
    let method = parse_flag(args, "--method").ok_or("--method is required")?;
    let client = build_client(args)?;

    let result: serde_json::Value = client
        .call(&method, vec![])
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn parse_repeated_flag(args: &[String], flag: &str) -> Vec<String> {
    args.iter()
        .enumerate()
        .filter(|(_, a)| a.as_str() == flag)
        .filter_map(|(i, _)| args.get(i + 1).cloned())
        .collect()
}
