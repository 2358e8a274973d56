use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use server_api::{
    create_counter, fetch_counter, get_counter_value, get_or_create_counter, increment_counter,
    reset_counter, update_counter, CounterContext,
};
use shared::{
    domain::{Counter, CounterUpdate, NewCounter, DEFAULT_COUNTER_NAME},
    error::{ApiError, ApiException},
};
use storage::Storage;

#[derive(Parser, Debug)]
#[command(name = "counterctl", about = "Inspect and change persisted counters")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/counter.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Get {
        #[arg(default_value = DEFAULT_COUNTER_NAME)]
        name: String,
    },
    Create {
        name: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        count: i64,
    },
    GetOrCreate {
        #[arg(default_value = DEFAULT_COUNTER_NAME)]
        name: String,
    },
    Increment {
        #[arg(default_value = DEFAULT_COUNTER_NAME)]
        name: String,
    },
    /// Overwrite the count; leaving --count off re-saves the row unchanged.
    Update {
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        count: Option<i64>,
    },
    Reset {
        #[arg(default_value = DEFAULT_COUNTER_NAME)]
        name: String,
    },
    Value {
        #[arg(default_value = DEFAULT_COUNTER_NAME)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;
    let ctx = CounterContext::new(storage);

    match cli.command {
        Command::Get { name } => {
            print_optional(&name, fetch_counter(&ctx, &name).await.map_err(fail)?)
        }
        Command::Create { name, count } => {
            let counter = create_counter(&ctx, NewCounter::new(name, count))
                .await
                .map_err(fail)?;
            print_counter(&counter);
        }
        Command::GetOrCreate { name } => {
            print_counter(&get_or_create_counter(&ctx, &name).await.map_err(fail)?)
        }
        Command::Increment { name } => {
            print_counter(&increment_counter(&ctx, &name).await.map_err(fail)?)
        }
        Command::Update { name, count } => {
            let update = CounterUpdate { count };
            print_optional(&name, update_counter(&ctx, &name, update).await.map_err(fail)?)
        }
        Command::Reset { name } => {
            print_optional(&name, reset_counter(&ctx, &name).await.map_err(fail)?)
        }
        Command::Value { name } => {
            println!("{}", get_counter_value(&ctx, &name).await.map_err(fail)?);
        }
    }

    ctx.storage.pool().close().await;
    Ok(())
}

fn print_counter(counter: &Counter) {
    println!(
        "id={} name={} count={}",
        counter.id.0, counter.name, counter.count
    );
}

fn print_optional(name: &str, counter: Option<Counter>) {
    match counter {
        Some(counter) => print_counter(&counter),
        None => println!("counter '{name}' not found"),
    }
}

fn fail(err: ApiError) -> anyhow::Error {
    anyhow!(ApiException::from(err))
}
