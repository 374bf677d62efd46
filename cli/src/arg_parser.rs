use clap::{Parser, Subcommand};

/// Control your stream relay on a gRPC relay server
#[derive(Debug, Parser)]
pub struct ArgParser {
    /// The address of the server
    #[clap(short = 's', long = "server", env = "RELAY_SERVER", default_value = "127.0.0.1:50051")]
    pub server: String,
    /// The user to act as
    #[clap(short = 'u', long = "user", env = "RELAY_USER")]
    pub user: String,
    /// The sub-command to use
    #[clap(subcommand)]
    pub sub_command: SubCommand,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Subcommand)]
pub enum SubCommand {
    /// relay an m3u8 source to an rtmp endpoint
    Stream {
        /// m3u8 playlist url to read from
        source_url: String,

        /// rtmp url to publish to, without the stream key
        destination_base: String,

        /// stream key appended to the rtmp url
        stream_key: String,
    },
    /// stop your stream
    Stop,
    /// show what your stream is doing
    Status,
    /// send a chat-style command, e.g. `send /stream <m3u8_url> <rtmp_url> <stream_key>`
    Send {
        #[clap(required = true, multiple_values = true, allow_hyphen_values = true)]
        /// the command text, words are joined with spaces
        text: Vec<String>,
    },
}
