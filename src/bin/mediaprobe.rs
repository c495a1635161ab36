use anyhow::Context;
use clap::Parser;
use mediaprobe::{ProbeConfig, ProbeResult, StreamKind, StreamNode};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Describe the streams, tags and duration of a media resource")]
struct Args {
    /// File path or file:// URI
    uri: String,

    /// Analysis timeout in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u32>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output as JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Single-line JSON
    #[arg(long, requires = "json")]
    compact: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ProbeConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if args.compact {
        config.pretty = false;
    }
    config.validate()?;

    init_tracing(&config, args.verbose);

    let result = mediaprobe::probe(&args.uri, config.timeout_secs)?
        .outcome()
        .await
        .with_context(|| format!("probing {}", args.uri))?;

    if args.json {
        let out = if config.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{}", out);
    } else {
        print_human(&args.uri, &result);
    }
    Ok(())
}

fn init_tracing(config: &ProbeConfig, verbose: u8) {
    let default = match verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_human(uri: &str, result: &ProbeResult) {
    println!("URI:      {}", uri);
    println!("Duration: {}", result.duration);
    println!("Seekable: {}", if result.seekable { "yes" } else { "no" });
    println!("Live:     {}", if result.live { "yes" } else { "no" });

    if let Some(tags) = &result.tags {
        println!("Tags:");
        for (name, value) in tags.iter() {
            println!("  {}: {}", name, value);
        }
    }

    println!("Streams:");
    result.topology.walk(&mut |node, depth| {
        let indent = "  ".repeat(depth + 1);
        println!("{}{}", indent, describe(node));
        if let Some(tags) = &node.tags
            && node.kind != StreamKind::Container
        {
            for (name, value) in tags.iter() {
                println!("{}    {}: {}", indent, name, value);
            }
        }
    });
}

fn describe(node: &StreamNode) -> String {
    let kind = match node.kind {
        StreamKind::Container => "container",
        StreamKind::Audio => "audio",
        StreamKind::Video => "video",
        StreamKind::Subtitle => "subtitles",
        StreamKind::Unknown => "unknown",
    };
    let mut line = kind.to_string();
    if let Some(id) = &node.stream_id {
        line.push_str(&format!(" #{}", id));
    }
    if let Some(mime) = &node.mime_type {
        line.push_str(&format!(": {}", mime));
    }
    if let Some(v) = &node.video {
        line.push_str(&format!(
            " {}x{} @ {}/{} fps",
            v.width, v.height, v.frame_rate.num, v.frame_rate.denom
        ));
    }
    if let Some(a) = &node.audio {
        line.push_str(&format!(" {} ch, {} Hz", a.channels, a.sample_rate));
    }
    let language = node
        .audio
        .as_ref()
        .and_then(|a| a.language.as_deref())
        .or(node.subtitle.as_ref().and_then(|s| s.language.as_deref()));
    if let Some(lang) = language {
        line.push_str(&format!(" [{}]", lang));
    }
    line
}
