use crate::types::{Args, Program};

/// Transcoder used when the host does not point at a specific binary.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

// video: codec, preset, target/max bitrate, buffer, pixel format, keyframe interval
const VIDEO_ARGS: &[&str] = &[
    "-c:v", "libx264", "-preset", "veryfast", "-b:v", "3500k", "-maxrate", "3500k", "-bufsize",
    "7000k", "-pix_fmt", "yuv420p", "-g", "50",
];

// audio: codec, bitrate, channels, sample rate
const AUDIO_ARGS: &[&str] = &["-c:a", "aac", "-b:a", "160k", "-ac", "2", "-ar", "44100"];

const OUTPUT_FORMAT: &str = "flv";

/// The immutable invocation of one relay job: which program to run and the exact argument list.
///
/// Built once by [`CommandSpec::build`]. Nothing is validated here, a malformed url is handed to the
/// transcoder as-is and it reports the failure itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    program: Program,
    args: Args,
    source: String,
    destination: String,
}

impl CommandSpec {
    /// Build the argument list that relays `source_url` to `destination_base/stream_key`.
    pub fn build(source_url: &str, destination_base: &str, stream_key: &str) -> Self {
        let destination = format!("{}/{}", destination_base, stream_key);

        let mut args: Args = Vec::with_capacity(VIDEO_ARGS.len() + AUDIO_ARGS.len() + 7);
        // read the input at its native rate, this is a live relay
        args.extend(["-re", "-i", source_url].map(String::from));
        args.extend(VIDEO_ARGS.iter().map(|arg| arg.to_string()));
        args.extend(AUDIO_ARGS.iter().map(|arg| arg.to_string()));
        args.extend(["-f", OUTPUT_FORMAT].map(String::from));
        args.push(destination.clone());

        Self {
            program: DEFAULT_PROGRAM.into(),
            args,
            source: source_url.into(),
            destination,
        }
    }

    /// Run a different executable with the same arguments.
    pub fn with_program(mut self, program: impl Into<Program>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The resolved endpoint, `destination_base/stream_key`.
    pub fn destination(&self) -> &str {
        &self.destination
    }
}
