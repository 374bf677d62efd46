mod arg_parser;
mod client_cli;

use arg_parser::{ArgParser, SubCommand};
use client_cli::ClientCli;

use clap::Parser;
use std::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn error::Error>> {
    let args = ArgParser::parse();
    let mut client = ClientCli::connect(&args.user, &args.server).await?;

    match args.sub_command {
        SubCommand::Stream {
            source_url,
            destination_base,
            stream_key,
        } => {
            client
                .start_stream(&source_url, &destination_base, &stream_key)
                .await?;
        }
        SubCommand::Stop => {
            client.stop_stream().await?;
        }
        SubCommand::Status => {
            client.query_status().await?;
        }
        SubCommand::Send { text } => {
            client.send_command(&text.join(" ")).await?;
        }
    }

    Ok(())
}
