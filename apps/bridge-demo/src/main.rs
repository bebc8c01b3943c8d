use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use can_bridge::{AdapterConfig, CanAdapter, ControllerKind};
use can_transport as can;
use can_transport::{MockPeripheral, MockSpi};

#[derive(Parser, Debug)]
#[command(
    name = "bridge-demo",
    version,
    about = "Drive the CAN bridge against in-process loopback controllers"
)]
struct Cli {
    /// YAML adapter config; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Controller family to drive
    #[arg(long, value_enum)]
    kind: Option<Kind>,

    /// Chip-select line of the SPI controller
    #[arg(long)]
    chip_select: Option<u8>,

    /// Bit rate in bits/s, or a baud code 0-13
    #[arg(long)]
    baud: Option<u32>,

    /// Identifier to send (hex, 0x prefix optional)
    #[arg(long, default_value = "0x123")]
    id: String,

    /// Payload bytes in hex
    #[arg(long, num_args = 0..=8, default_values = ["DE", "AD"])]
    data: Vec<String>,

    /// Number of frames to send
    #[arg(long, default_value_t = 3)]
    frames: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Kind {
    Peripheral,
    ExternalSpi,
}

impl From<Kind> for ControllerKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Peripheral => ControllerKind::Peripheral,
            Kind::ExternalSpi => ControllerKind::ExternalSpi,
        }
    }
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    info!(?config, "adapter config");

    let mut adapter: CanAdapter<MockPeripheral, MockSpi> = CanAdapter::from_config(&config);
    adapter.initialize(config.baud)?;
    if let Some(code) = adapter.resolved_baud_code() {
        info!(code, "SPI baud code");
    }

    let id = parse_id(&cli.id).ok_or_else(|| anyhow::anyhow!("invalid CAN id: {}", cli.id))?;
    let bytes = parse_hex_bytes(&cli.data)?;
    let frame = can::CanFrame::new(id, &bytes).ok_or(can::TransportError::InvalidFrame("len"))?;

    for _ in 0..cli.frames {
        adapter.transmit(&frame)?;
    }

    let mut received = 0usize;
    let mut out = can::CanFrame::default();
    while adapter.pending()? {
        adapter.receive(&mut out)?;
        print_frame(&out);
        received += 1;
    }
    info!(sent = cli.frames, received, "loopback complete");
    Ok(())
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn resolve_config(cli: &Cli) -> Result<AdapterConfig> {
    let mut config = match &cli.config {
        Some(path) => can_bridge::load_adapter_config(path)?,
        None => AdapterConfig::default(),
    };
    if let Some(kind) = cli.kind {
        config.kind = kind.into();
    }
    if cli.chip_select.is_some() {
        config.chip_select = cli.chip_select;
    }
    if let Some(baud) = cli.baud {
        config.baud = baud;
    }
    config.validate()?;
    Ok(config)
}

fn parse_id(s: &str) -> Option<can::CanId> {
    let s_trim = s.trim();
    let no_prefix = s_trim.strip_prefix("0x").unwrap_or(s_trim);
    let parsed = u32::from_str_radix(no_prefix, 16).ok()?;
    if parsed <= can::MAX_STANDARD_ID {
        can::CanId::standard(parsed as u16)
    } else {
        can::CanId::extended(parsed)
    }
}

fn parse_hex_bytes(items: &[String]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(items.len());
    for s in items {
        let t = s.trim();
        let no_prefix = t.strip_prefix("0x").unwrap_or(t);
        let b = u8::from_str_radix(no_prefix, 16)
            .map_err(|e| anyhow::anyhow!("invalid hex byte '{t}': {e}"))?;
        out.push(b);
    }
    Ok(out)
}

fn print_frame(f: &can::CanFrame) {
    let ts = f
        .timestamp
        .map(|t| {
            t.0.format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into())
        })
        .unwrap_or_else(|| "".into());
    let kind = if f.id.is_extended() { "ext" } else { "std" };
    println!("{f}\t{kind}\t{ts}");
}
