use callcenter_pipeline::cli::{args::Args, commands};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

/// Exit code used when the run was interrupted with CTRL+C
const EXIT_CANCELLED: i32 = 130;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // CTRL+C stops ingestion at the next chunk boundary; the command
        // still reports what it processed up to that point
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, stopping after the current chunk...");
                signal_token.cancel();
            }
        });

        commands::run(args, cancellation_token).await
    });

    match result {
        Ok(stats) if stats.cancelled => process::exit(EXIT_CANCELLED),
        Ok(_stats) => {
            // Success - the report has already been printed by the command
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Call-Center Pipeline - Operator Ranking from Call Exports");
    println!("=========================================================");
    println!();
    println!("Ingest call-center exports (CSV, TSV or spreadsheets), validate every row");
    println!("and rank the operators who handled the calls.");
    println!();
    println!("USAGE:");
    println!("    callcenter-pipeline <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    analyze     Ingest exports and print metrics and the operator ranking");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Rank operators from one export:");
    println!("    callcenter-pipeline analyze calls.csv");
    println!();
    println!("    # Combine a spreadsheet and a CSV, show the top 10 as JSON:");
    println!("    callcenter-pipeline analyze january.xlsx february.csv --top 10 \\");
    println!("                                --output-format json");
    println!();
    println!("    # Smaller batches with debug logging:");
    println!("    callcenter-pipeline analyze calls.csv --batch-size 200 -vv");
    println!();
    println!("For detailed help on any command, use:");
    println!("    callcenter-pipeline <COMMAND> --help");
}
