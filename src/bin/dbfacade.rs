use dbfacade::config::load_settings;
use dbfacade::{Database, Record, Value};
use std::process::ExitCode;
use tracing::info;

const USAGE: &str = "Usage: dbfacade <config.toml> <sql> [params...]";

/// Interprets a command-line argument as a query parameter.
fn parse_param(arg: &str) -> Value {
    match arg {
        "null" | "NULL" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => other
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::from(other)),
    }
}

fn run(config_path: &str, sql: &str, params: &[Value]) -> dbfacade::Result<String> {
    let settings = load_settings(config_path)?;
    let db = Database::from_settings(settings);
    let rows: Vec<Record> = db.fetch_all_object(sql, params)?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    }

    let params: Vec<Value> = args[3..].iter().map(|arg| parse_param(arg)).collect();
    info!("Running query with {} params", params.len());

    match run(&args[1], &args[2], &params) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("dbfacade: {}", e);
            ExitCode::FAILURE
        }
    }
}
