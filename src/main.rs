use aacstream::SessionOptions;
use aacstream::audio::{AdtsSummary, PcmSource, RawPcmInput, ThreadedFileSink, WavInput};
use aacstream::codec::fdk::FdkBackend;
use aacstream::config::Config;
use aacstream::services::EncoderHandle;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: aacstream <input.wav|input.pcm|-> <output.aac>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let (input_path, output_path) = parse_args()?;

    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    let (mut source, params) = open_input(&input_path, &config)?;
    tracing::info!(
        "Encoding {} -> {:?} ({} Hz, {} channel(s), {} bps)",
        input_path,
        output_path,
        params.sample_rate,
        params.channels,
        params.bit_rate
    );

    let mut options = SessionOptions::default();
    options.output_capacity = config.output_capacity;

    let sink = ThreadedFileSink::new(output_path.clone())?;
    let encoder = EncoderHandle::spawn(FdkBackend, params, sink, options).await?;

    while let Some(chunk) = source.read_chunk(config.read_chunk_bytes)? {
        encoder.encode(chunk).await?;
    }

    let finished = encoder.close().await?;
    let outcome = finished.check();
    let stats = finished.stats;
    let mut sink = finished.sink;
    let written = sink.finalize().await?;

    tracing::info!(
        "Encoded {} frame(s), {} degraded, {} failed call(s), {} byte(s) written, {} byte(s) of trailing PCM dropped",
        stats.frames_encoded,
        stats.degraded_frames,
        stats.failed_calls,
        written,
        stats.dropped_tail_bytes
    );

    report(&output_path)?;
    outcome.with_context(|| format!("Output {:?} is incomplete", output_path))
}

fn parse_args() -> Result<(String, PathBuf)> {
    let mut args = std::env::args().skip(1);
    let input = args.next().context(USAGE)?;
    let output = args.next().context(USAGE)?;
    if args.next().is_some() {
        return Err(anyhow::anyhow!(USAGE));
    }
    Ok((input, PathBuf::from(output)))
}

/// WAV input supplies its own format; anything else is headerless PCM in the
/// configured format.
fn open_input(
    input: &str,
    config: &Config,
) -> Result<(Box<dyn PcmSource + Send>, aacstream::EncoderParams)> {
    if input == "-" {
        return Ok((Box::new(RawPcmInput::new(std::io::stdin())), config.params()));
    }

    let path = Path::new(input);
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        let wav = WavInput::open(path)?;
        let params = wav.params(config.bit_rate);
        return Ok((Box::new(wav), params));
    }

    let file = File::open(path).with_context(|| format!("Failed to open input: {:?}", path))?;
    Ok((
        Box::new(RawPcmInput::new(BufReader::new(file))),
        config.params(),
    ))
}

fn report(output_path: &Path) -> Result<()> {
    let data = std::fs::read(output_path)
        .with_context(|| format!("Failed to read back output: {:?}", output_path))?;
    let summary = AdtsSummary::scan(&data);

    tracing::info!(
        "{:?}: {} ADTS frame(s), {:.2} s, {:.0} bps average",
        output_path,
        summary.frames,
        summary.duration_secs(),
        summary.avg_bitrate()
    );
    if summary.unparsed_bytes > 0 {
        tracing::warn!(
            "{} trailing byte(s) do not form a complete ADTS frame",
            summary.unparsed_bytes
        );
    }
    Ok(())
}
