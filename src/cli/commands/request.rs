//! Request commands - issue one request and print its emissions

use crate::cli::args::{FindArgs, OutputFormat, ReadArgs, RequestFlags, WriteArgs};
use crate::client::{Emission, RequestStream, Restify};
use crate::config::Config;
use crate::error::RestifyResult;
use console::style;
use futures_util::StreamExt;
use serde_json::{json, Map};
use tracing::debug;

pub async fn get(args: ReadArgs, config: &Config) -> RestifyResult<()> {
    let mut client = prepare(config, &args.flags).await?;
    print_stream(client.get(&args.path), args.flags.format).await
}

pub async fn delete(args: ReadArgs, config: &Config) -> RestifyResult<()> {
    let mut client = prepare(config, &args.flags).await?;
    print_stream(client.delete(&args.path), args.flags.format).await
}

pub async fn post(args: WriteArgs, config: &Config) -> RestifyResult<()> {
    let mut client = prepare(config, &args.flags).await?;
    print_stream(client.post(&args.path, args.data), args.flags.format).await
}

pub async fn put(args: WriteArgs, config: &Config) -> RestifyResult<()> {
    let mut client = prepare(config, &args.flags).await?;
    print_stream(client.put(&args.path, args.data), args.flags.format).await
}

pub async fn find(args: FindArgs, config: &Config) -> RestifyResult<()> {
    let mut client = prepare(config, &args.flags).await?;
    for filter in args.filters {
        client.filter(filter.field, filter.operator, filter.value);
    }

    let stream = if args.one {
        client.find_one(Map::new(), &args.path)
    } else {
        client.find(Map::new(), &args.path)
    };
    print_stream(stream, args.flags.format).await
}

async fn prepare(config: &Config, flags: &RequestFlags) -> RestifyResult<Restify> {
    let mut client = Restify::from_config(config).await?;
    client.options(flags.to_options());
    Ok(client)
}

/// Print each emission as it arrives; an error ends the command
async fn print_stream(mut stream: RequestStream, format: OutputFormat) -> RestifyResult<()> {
    let mut count = 0;

    while let Some(item) = stream.next().await {
        let emission = item?;
        print_emission(&emission, format)?;
        count += 1;
    }

    if count == 0 {
        debug!("Request completed without emissions");
    }
    Ok(())
}

fn print_emission(emission: &Emission, format: OutputFormat) -> RestifyResult<()> {
    match format {
        OutputFormat::Json => {
            let line = json!({
                "origin": emission.origin,
                "response": emission.response,
            });
            println!("{}", serde_json::to_string(&line)?);
        }
        OutputFormat::Pretty => {
            println!("{}", style(format!("[{}]", emission.origin)).cyan().bold());
            println!("{}", serde_json::to_string_pretty(&emission.response.data)?);
        }
    }
    Ok(())
}
