//! Razer Laptop Control CLI
//!
//! Command-line interface for the embedded controller of Razer Blade laptops.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use razer_laptop_control::device::{KeyMatrix, RazerLaptop, Rgb};
use razer_laptop_control::protocol::{KEYS_PER_ROW, capabilities};
use razer_laptop_control::storage;
use razer_laptop_control::utils::parsing::{
    parse_fan_rpm, parse_hex_color, parse_power_mode, parse_product_id,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Razer Blade laptop control tool
#[derive(Parser, Debug)]
#[command(name = "razer-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Product id to open, in hex (e.g. 0x0233). Overrides the config file.
    #[arg(long, global = true)]
    product: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List connected Razer laptops
    List,

    /// Show what the controller reports
    Status {
        /// Print host-side state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set fan speed
    Fan {
        /// RPM value, or "auto" to let the EC decide
        rpm: String,
    },

    /// Set power mode
    Power {
        /// normal, gaming, creator, or custom
        mode: String,
    },

    /// Set CPU and GPU boost levels, then switch to Custom mode
    Boost {
        /// CPU boost (0-3)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=3))]
        cpu: u8,

        /// GPU boost (0-2)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=2))]
        gpu: u8,
    },

    /// Read or set keyboard backlight brightness
    Brightness {
        /// Brightness (0-255); omit to read
        value: Option<u32>,
    },

    /// Set the whole keyboard to one colour
    Colour {
        /// Hex colour (#RRGGBB)
        hex: String,
    },

    /// Set one keyboard row
    Row {
        /// Row index (0-5)
        row: usize,

        /// One colour for the whole row, or 15 colours, one per key
        #[arg(required = true, num_args = 1..=15)]
        colours: Vec<String>,
    },

    /// Apply a preset, or list presets when no name is given
    Preset { name: Option<String> },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Write an example config if none exists
    Init,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let product = args.product.as_deref();
    match args.command {
        Command::List => cmd_list(),
        Command::Status { json } => cmd_status(product, json),
        Command::Fan { rpm } => cmd_fan(product, &rpm),
        Command::Power { mode } => cmd_power(product, &mode),
        Command::Boost { cpu, gpu } => cmd_boost(product, cpu, gpu),
        Command::Brightness { value } => cmd_brightness(product, value),
        Command::Colour { hex } => cmd_colour(product, &hex),
        Command::Row { row, colours } => cmd_row(product, row, &colours),
        Command::Preset { name } => cmd_preset(product, name.as_deref()),
        Command::Config { action } => cmd_config(action),
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// =============================================================================
// Helpers
// =============================================================================

fn open_laptop(product: Option<&str>) -> Result<RazerLaptop> {
    let config = storage::load_config().context("Failed to load config")?;

    let product_id = match product {
        Some(value) => Some(parse_product_id(value)?),
        None => config.product_id,
    };

    let laptop = match product_id {
        Some(pid) => RazerLaptop::open_product(pid),
        None => RazerLaptop::open(),
    }
    .context("Failed to open Razer laptop")?;

    let laptop = match config.brightness_path {
        Some(path) => laptop.with_brightness_path(path),
        None => laptop,
    };

    // Each invocation opens a fresh handle; pick up what the EC is running
    if let Err(err) = laptop.sync_from_device() {
        tracing::warn!("Could not read controller state, assuming defaults: {}", err);
    }
    Ok(laptop)
}

fn report_faults(laptop: &RazerLaptop) {
    let faults = laptop.last_faults();
    if faults.is_empty() {
        return;
    }
    println!("⚠️  {} step(s) reported a fault:", faults.len());
    for fault in faults {
        println!("   - {}", fault);
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_list() -> Result<()> {
    let devices = razer_laptop_control::device::HidTransport::list_devices()
        .context("Failed to enumerate devices")?;

    if devices.is_empty() {
        println!("❌ No supported Razer laptops found.");
        return Ok(());
    }

    println!("🔍 Found {} device(s):\n", devices.len());
    for (i, (path, product_id, name)) in devices.iter().enumerate() {
        println!(
            "  {}. {} (0x{:04X})",
            i + 1,
            name.as_deref().unwrap_or("Razer laptop"),
            product_id
        );
        println!("     Path: {}", path);
        println!(
            "     Fan range: {}-{} RPM | Creator: {} | CPU boost 3: {}",
            capabilities::FAN_RPM_FLOOR,
            capabilities::max_fan_rpm(*product_id),
            yes_no(capabilities::creator_mode_allowed(*product_id)),
            yes_no(capabilities::boost_mode_level3_allowed(*product_id)),
        );
    }

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn cmd_status(product: Option<&str>, json: bool) -> Result<()> {
    let laptop = open_laptop(product)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&laptop.get_state())?);
        return Ok(());
    }

    let (mode, manual) = laptop
        .query_power_mode()
        .context("Failed to read power mode")?;
    let rpm = laptop.query_fan_rpm().context("Failed to read fan speed")?;
    let brightness = laptop
        .get_brightness()
        .context("Failed to read brightness")?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("💻 Product:    0x{:04X}", laptop.product_id());
    println!("⚡ Power mode: {}", mode);
    if manual {
        println!("🌀 Fan:        {} RPM (manual)", rpm);
    } else {
        println!("🌀 Fan:        {} RPM (auto)", rpm);
    }
    println!("💡 Backlight:  {}/255", brightness);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    Ok(())
}

fn cmd_fan(product: Option<&str>, value: &str) -> Result<()> {
    let rpm = parse_fan_rpm(value)?;
    let laptop = open_laptop(product)?;

    laptop.set_fan_rpm(rpm).context("Failed to set fan speed")?;
    report_faults(&laptop);

    match laptop.get_state().fan_rpm {
        0 => println!("✅ Fan returned to automatic control"),
        applied => println!("✅ Fan set to {} RPM", applied),
    }
    Ok(())
}

fn cmd_power(product: Option<&str>, value: &str) -> Result<()> {
    let mode = parse_power_mode(value)?;
    let laptop = open_laptop(product)?;

    laptop
        .set_power_mode(mode)
        .context("Failed to set power mode")?;
    report_faults(&laptop);

    let applied = laptop.get_state().power_mode;
    if applied != mode {
        println!("ℹ️  {} is not available on this model", mode);
    }
    println!("✅ Power mode set to {}", applied);
    Ok(())
}

fn cmd_boost(product: Option<&str>, cpu: u8, gpu: u8) -> Result<()> {
    let laptop = open_laptop(product)?;

    laptop
        .set_custom_boost(cpu, gpu)
        .context("Failed to store boost levels")?;
    laptop
        .set_power_mode(razer_laptop_control::PowerMode::Custom)
        .context("Failed to switch to Custom mode")?;
    report_faults(&laptop);

    let state = laptop.get_state();
    println!(
        "✅ Custom mode: CPU boost {}, GPU boost {}",
        state.cpu_boost, state.gpu_boost
    );
    Ok(())
}

fn cmd_brightness(product: Option<&str>, value: Option<u32>) -> Result<()> {
    let laptop = open_laptop(product)?;

    match value {
        Some(value) => {
            laptop
                .set_brightness(value)
                .context("Failed to set brightness")?;
            report_faults(&laptop);
            println!("✅ Backlight brightness set to {}", value);
        }
        None => {
            let brightness = laptop
                .get_brightness()
                .context("Failed to read brightness")?;
            println!("💡 Backlight brightness: {}", brightness);
        }
    }
    Ok(())
}

fn cmd_colour(product: Option<&str>, hex: &str) -> Result<()> {
    let colour = parse_hex_color(hex)?;
    let laptop = open_laptop(product)?;

    laptop
        .set_matrix(&KeyMatrix::filled(colour))
        .context("Failed to set keyboard colour")?;
    report_faults(&laptop);

    println!("✅ Keyboard set to {}", colour);
    Ok(())
}

fn cmd_row(product: Option<&str>, row: usize, values: &[String]) -> Result<()> {
    let parsed = values
        .iter()
        .map(|value| parse_hex_color(value))
        .collect::<std::result::Result<Vec<Rgb>, _>>()?;

    let colours: [Rgb; KEYS_PER_ROW] = match parsed.as_slice() {
        [single] => [*single; KEYS_PER_ROW],
        keys => keys.try_into().map_err(|_| {
            anyhow::anyhow!(
                "Give 1 or {} colours, got {}",
                KEYS_PER_ROW,
                keys.len()
            )
        })?,
    };

    let laptop = open_laptop(product)?;
    laptop
        .program_row(row, &colours)
        .context("Failed to program row")?;
    laptop
        .display_matrix()
        .context("Failed to display matrix")?;
    report_faults(&laptop);

    println!("✅ Row {} programmed", row);
    Ok(())
}

fn cmd_preset(product: Option<&str>, name: Option<&str>) -> Result<()> {
    let config = storage::load_config().context("Failed to load config")?;

    let Some(name) = name else {
        println!("📋 Presets:");
        for name in config.preset_names() {
            println!("   - {}", name);
        }
        return Ok(());
    };

    let preset = config.preset(name)?;
    let laptop = open_laptop(product)?;
    preset
        .apply(&laptop)
        .with_context(|| format!("Failed to apply preset '{}'", name))?;
    report_faults(&laptop);

    println!("✅ Applied preset '{}': {}", name, laptop.get_state());
    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = storage::get_config_path()?;
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let (path, created) = storage::ensure_config_exists()?;
            if created {
                println!("✅ Created {}", path.display());
            } else {
                bail!("Config already exists at {}", path.display());
            }
        }
    }
    Ok(())
}
