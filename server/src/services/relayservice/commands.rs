//! Parsing of chat-style commands, e.g. `/stream <m3u8_url> <rtmp_url> <stream_key>`.

pub const HELP: &str = "Hi! I am a streaming bot. Use /stream <m3u8_url> <rtmp_url> <stream_key> to start streaming.\n\
Example: /stream http://example.com/playlist.m3u8 rtmp://your-rtmp-server/live your_stream_key\n\
Use /stop to stop the current stream and /status to see what is running.";

pub const USAGE: &str = "Usage: /stream <m3u8_url> <rtmp_url> <stream_key>\n\
Example: /stream http://example.com/playlist.m3u8 rtmp://your-rtmp-server/live your_stream_key";

pub const UNKNOWN: &str = "Unknown command. Use /start to see what I can do.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand<'a> {
    Help,
    Stream {
        source_url: &'a str,
        destination_base: &'a str,
        stream_key: &'a str,
    },
    Stop,
    Status,
}

/// Why a message could not be turned into a command. Each maps to a fixed reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    Usage,
    Unknown,
}

impl ParseError {
    pub fn reply(self) -> &'static str {
        match self {
            ParseError::Usage => USAGE,
            ParseError::Unknown => UNKNOWN,
        }
    }
}

pub fn parse(text: &str) -> Result<BotCommand<'_>, ParseError> {
    let mut words = text.split_whitespace();
    let command = words
        .next()
        .and_then(|word| word.strip_prefix('/'))
        .ok_or(ParseError::Unknown)?;
    // group chats address a bot as /stream@bot_name
    let command = command
        .split_once('@')
        .map(|(name, _)| name)
        .unwrap_or(command);
    let args: Vec<&str> = words.collect();

    match command {
        "start" | "help" => Ok(BotCommand::Help),
        "stream" => match args.as_slice() {
            &[source_url, destination_base, stream_key] => Ok(BotCommand::Stream {
                source_url,
                destination_base,
                stream_key,
            }),
            _ => Err(ParseError::Usage),
        },
        "stop" => Ok(BotCommand::Stop),
        "status" => Ok(BotCommand::Status),
        _ => Err(ParseError::Unknown),
    }
}
