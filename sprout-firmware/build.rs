//! Build script for sprout-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time
//! - Generates `board_config.rs` with the board constants and pin macros

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sprout_hal::{PinId, Port};

const CHANNEL_COUNT: usize = 3;

fn main() {
    setup_linker();
    let board = validate_config();
    generate_board_config(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// A pin as written in board.toml, e.g. "PB6"
type Pin = PinId;

/// Embassy peripheral field name
fn peripheral_name(pin: &Pin) -> String {
    format!("P{:?}{}", pin.port, pin.index)
}

/// `PinId` constructor expression
fn pin_expr(pin: &Pin) -> String {
    format!("PinId::new(Port::{:?}, {})", pin.port, pin.index)
}

/// Validated board description
struct Board {
    debounce_ms: u32,
    channels: Vec<Pin>,
    i2c_instance: u8,
    i2c_frequency: u32,
    scl: Pin,
    sda: Pin,
    remap: bool,
    display_address: u8,
    refresh_interval_ms: u32,
    chunk_timeout_ms: u32,
    final_timeout_ms: u32,
    led: Pin,
    led_inverted: bool,
}

/// Validate board.toml configuration at compile time
fn validate_config() -> Board {
    // Re-run if board.toml changes
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    // Check if config file exists
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml description file.            ║\n\
            ║  Please create one in the sprout-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    // Read the config file
    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    for section in ["counter", "i2c", "display", "status_led"] {
        if !matches!(config.get(section), Some(toml::Value::Table(_))) {
            errors.push(format!("Missing [{}] section", section));
        }
    }
    report("Missing required sections in board.toml", &errors);

    let (debounce_ms, channels) = validate_counter(&config, &mut errors);
    let (i2c_instance, i2c_frequency, scl, sda, remap) = validate_i2c(&config, &mut errors);
    let (display_address, refresh_interval_ms, chunk_timeout_ms, final_timeout_ms) =
        validate_display(&config, &mut errors);
    let (led, led_inverted) = validate_led(&config, &channels, &mut errors);
    report("Invalid board configuration", &errors);

    println!("cargo:warning=board.toml validated successfully");

    Board {
        debounce_ms,
        channels,
        i2c_instance,
        i2c_frequency,
        scl,
        sda,
        remap,
        display_address,
        refresh_interval_ms,
        chunk_timeout_ms,
        final_timeout_ms,
        led,
        led_inverted,
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build with every collected error
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn section<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|v| v.as_table())
}

/// Read an integer field and check its range
fn int_field(
    table: Option<&toml::value::Table>,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match table.and_then(|t| t.get(key)) {
        Some(toml::Value::Integer(v)) if range.contains(v) => *v,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            *range.start()
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            *range.start()
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            *range.start()
        }
    }
}

/// Read a pin field such as `scl = "PB6"`
fn pin_field(
    table: Option<&toml::value::Table>,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Pin {
    let fallback = PinId::new(Port::A, 0);
    match table.and_then(|t| t.get(key)) {
        Some(toml::Value::String(s)) => PinId::parse(s).unwrap_or_else(|| {
            errors.push(format!("[{}] {} '{}' is not a pin (PA0-PD15)", section, key, s));
            fallback
        }),
        Some(_) => {
            errors.push(format!("[{}] {} must be a string", section, key));
            fallback
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            fallback
        }
    }
}

fn bool_field(
    table: Option<&toml::value::Table>,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> bool {
    match table.and_then(|t| t.get(key)) {
        Some(toml::Value::Boolean(b)) => *b,
        None => false,
        Some(_) => {
            errors.push(format!("[{}] {} must be true or false", section, key));
            false
        }
    }
}

/// Validate the counter section
fn validate_counter(config: &toml::Value, errors: &mut Vec<String>) -> (u32, Vec<Pin>) {
    let counter = section(config, "counter");
    let debounce_ms = int_field(counter, "counter", "debounce_ms", 0..=1000, errors) as u32;

    let mut channels = Vec::new();
    match counter.and_then(|t| t.get("channels")) {
        Some(toml::Value::Array(pins)) => {
            if pins.len() != CHANNEL_COUNT {
                errors.push(format!(
                    "[counter] channels must list exactly {} pins",
                    CHANNEL_COUNT
                ));
            }
            for (i, pin) in pins.iter().enumerate() {
                match pin.as_str().and_then(PinId::parse) {
                    Some(p) => {
                        // EXTI lines are shared across ports
                        if channels.iter().any(|c: &Pin| c.index == p.index) {
                            errors.push(format!(
                                "[counter] channel {} reuses EXTI line {}",
                                i, p.index
                            ));
                        }
                        channels.push(p);
                    }
                    None => errors.push(format!("[counter] channel {} is not a pin", i)),
                }
            }
        }
        Some(_) => errors.push("[counter] channels must be an array".to_string()),
        None => errors.push("[counter] missing 'channels'".to_string()),
    }

    (debounce_ms, channels)
}

/// Validate the I2C section against the STM32F1 pin map
fn validate_i2c(
    config: &toml::Value,
    errors: &mut Vec<String>,
) -> (u8, u32, Pin, Pin, bool) {
    let i2c = section(config, "i2c");
    let instance = int_field(i2c, "i2c", "instance", 1..=2, errors) as u8;
    let frequency = int_field(i2c, "i2c", "frequency", 0..=400_000, errors) as u32;
    let scl = pin_field(i2c, "i2c", "scl", errors);
    let sda = pin_field(i2c, "i2c", "sda", errors);
    let remap = bool_field(i2c, "i2c", "remap", errors);

    if frequency != 0 && frequency < 10_000 {
        errors.push("[i2c] frequency must be 0 or 10000-400000".to_string());
    }

    let expected = match (instance, remap) {
        (1, false) => Some(("PB6", "PB7")),
        (1, true) => Some(("PB8", "PB9")),
        (2, false) => Some(("PB10", "PB11")),
        (2, true) => {
            errors.push("[i2c] I2C2 has no remap".to_string());
            None
        }
        _ => None,
    };
    if let Some((want_scl, want_sda)) = expected {
        if Some(scl) != PinId::parse(want_scl) || Some(sda) != PinId::parse(want_sda) {
            errors.push(format!(
                "[i2c] I2C{} needs scl = \"{}\", sda = \"{}\"",
                instance, want_scl, want_sda
            ));
        }
    }

    (instance, frequency, scl, sda, remap)
}

/// Validate the display section
fn validate_display(config: &toml::Value, errors: &mut Vec<String>) -> (u8, u32, u32, u32) {
    let display = section(config, "display");
    let address = int_field(display, "display", "address", 0x3C..=0x3D, errors) as u8;
    let refresh = int_field(display, "display", "refresh_interval_ms", 50..=60_000, errors) as u32;
    let chunk = int_field(display, "display", "chunk_timeout_ms", 1..=1000, errors) as u32;
    let last = int_field(display, "display", "final_timeout_ms", 1..=1000, errors) as u32;
    (address, refresh, chunk, last)
}

/// Validate the status LED section
fn validate_led(config: &toml::Value, channels: &[Pin], errors: &mut Vec<String>) -> (Pin, bool) {
    let led = section(config, "status_led");
    let pin = pin_field(led, "status_led", "pin", errors);
    let inverted = bool_field(led, "status_led", "inverted", errors);
    if channels.contains(&pin) {
        errors.push("[status_led] pin is also a sensor channel".to_string());
    }
    (pin, inverted)
}

/// Write the board constants and pin macros consumed by `src/board.rs`
fn generate_board_config(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("board_config.rs")).unwrap();

    let pins: Vec<String> = board.channels.iter().map(pin_expr).collect();
    let lines: Vec<String> = board.channels.iter().map(|p| p.index.to_string()).collect();
    let inputs: Vec<String> = board
        .channels
        .iter()
        .map(|p| {
            format!(
                "::embassy_stm32::gpio::Input::new($p.{}, ::embassy_stm32::gpio::Pull::Up)",
                peripheral_name(p)
            )
        })
        .collect();
    // LED starts off
    let led_level = if board.led_inverted { "High" } else { "Low" };

    let generated = format!(
        "// Generated by build.rs from board.toml. Do not edit.

pub const DEBOUNCE_MS: u32 = {debounce};
pub const SENSOR_PINS: [PinId; {n}] = [{pins}];
pub const SENSOR_LINES: [u8; {n}] = [{lines}];

pub const I2C: I2cConfig = I2cConfig {{
    instance: {instance},
    frequency: {frequency},
    scl: {scl},
    sda: {sda},
    remap: {remap},
}};

pub const DISPLAY_ADDRESS: u8 = {address:#04x};
pub const REFRESH_INTERVAL_MS: u32 = {refresh};
pub const CHUNK_TIMEOUT_MS: u32 = {chunk};
pub const FINAL_TIMEOUT_MS: u32 = {last};

pub const STATUS_LED: PinId = {led};
pub const STATUS_LED_INVERTED: bool = {inverted};

macro_rules! sensor_inputs {{
    ($p:ident) => {{
        [{inputs}]
    }};
}}

macro_rules! i2c_bus {{
    ($p:ident, $cfg:expr) => {{
        ::embassy_stm32::i2c::I2c::new_blocking($p.I2C{instance}, $p.{scl_field}, $p.{sda_field}, $cfg)
    }};
}}

macro_rules! status_led {{
    ($p:ident) => {{
        ::embassy_stm32::gpio::Output::new(
            $p.{led_field},
            ::embassy_stm32::gpio::Level::{led_level},
            ::embassy_stm32::gpio::Speed::Low,
        )
    }};
}}
",
        debounce = board.debounce_ms,
        n = board.channels.len(),
        pins = pins.join(", "),
        lines = lines.join(", "),
        instance = board.i2c_instance,
        frequency = board.i2c_frequency,
        scl = pin_expr(&board.scl),
        sda = pin_expr(&board.sda),
        remap = board.remap,
        address = board.display_address,
        refresh = board.refresh_interval_ms,
        chunk = board.chunk_timeout_ms,
        last = board.final_timeout_ms,
        led = pin_expr(&board.led),
        inverted = board.led_inverted,
        inputs = inputs.join(", "),
        scl_field = peripheral_name(&board.scl),
        sda_field = peripheral_name(&board.sda),
        led_field = peripheral_name(&board.led),
        led_level = led_level,
    );

    f.write_all(generated.as_bytes()).unwrap();
}
