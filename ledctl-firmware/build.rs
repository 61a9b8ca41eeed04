//! Build script for ledctl-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates topology.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Devices the controller registers; later sections are ignored at boot
const MAX_DEVICES: usize = 8;

/// RP2040 user GPIOs
const GPIO_COUNT: u32 = 30;

/// GPIO0/GPIO1 carry the command link
const RESERVED_PINS: [u32; 2] = [0, 1];

fn main() {
    setup_linker();
    validate_topology();
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
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate topology.toml at compile time
///
/// The firmware parses the same file at boot; catching mistakes here keeps
/// a typo from turning into a board with no LEDs.
fn validate_topology() {
    println!("cargo:rerun-if-changed=topology.toml");

    let path = Path::new("topology.toml");
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read topology.toml", &[e.to_string()]),
    };

    let topology: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in topology.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let leds = match topology.get("led") {
        Some(toml::Value::Table(leds)) if !leds.is_empty() => leds,
        _ => fail(
            "Missing [led.*] section in topology.toml",
            &["At least one LED is required".to_string()],
        ),
    };

    let mut errors = Vec::new();
    let mut used_pins: Vec<(u32, String)> = Vec::new();

    for (name, led) in leds {
        let led = match led {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[led.{}] must be a table", name));
                continue;
            }
        };

        for key in led.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                errors.push(format!("[led.{}] unknown key '{}'", name, key));
            }
        }

        match led.get("pin") {
            Some(toml::Value::String(pin)) => match parse_pin(pin) {
                Ok(number) => claim_pin(&mut used_pins, &mut errors, name, "pin", number),
                Err(e) => errors.push(format!("[led.{}] pin: {}", name, e)),
            },
            Some(_) => errors.push(format!("[led.{}] pin must be a string", name)),
            None => errors.push(format!("[led.{}] missing 'pin'", name)),
        }

        match led.get("trigger") {
            Some(toml::Value::String(pin)) => match parse_pin(pin) {
                Ok(number) => claim_pin(&mut used_pins, &mut errors, name, "trigger", number),
                Err(e) => errors.push(format!("[led.{}] trigger: {}", name, e)),
            },
            Some(_) => errors.push(format!("[led.{}] trigger must be a string", name)),
            None => {}
        }

        for key in ["pwm", "rising", "falling", "auto_throttle"] {
            if let Some(value) = led.get(key) {
                if !value.is_bool() {
                    errors.push(format!("[led.{}] {} must be true or false", name, key));
                }
            }
        }

        check_int(&mut errors, name, led, "debounce_ms", 0, i64::from(u32::MAX));
        check_int(&mut errors, name, led, "threshold", i64::from(i16::MIN), i64::from(i16::MAX));
        check_int(&mut errors, name, led, "hysteresis", 0, i64::from(i16::MAX));
    }

    if !errors.is_empty() {
        fail("Invalid LED entries in topology.toml", &errors);
    }

    if leds.len() > MAX_DEVICES {
        println!(
            "cargo:warning=topology.toml lists {} LEDs, only the first {} are registered",
            leds.len(),
            MAX_DEVICES
        );
    }
    println!("cargo:warning=topology.toml validated successfully");
}

const KNOWN_KEYS: &[&str] = &[
    "pin",
    "pwm",
    "trigger",
    "rising",
    "falling",
    "debounce_ms",
    "threshold",
    "hysteresis",
    "auto_throttle",
];

/// Parse `gpioN` with optional `!` and `^` prefixes
fn parse_pin(value: &str) -> Result<u32, String> {
    let number = value
        .trim_start_matches(['!', '^'])
        .strip_prefix("gpio")
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| format!("'{}' is not of the form gpioN", value))?;

    if number >= GPIO_COUNT {
        return Err(format!("gpio{} does not exist on the RP2040", number));
    }
    if RESERVED_PINS.contains(&number) {
        return Err(format!("gpio{} is reserved for the command link", number));
    }
    Ok(number)
}

fn claim_pin(
    used: &mut Vec<(u32, String)>,
    errors: &mut Vec<String>,
    name: &str,
    key: &str,
    number: u32,
) {
    match used.iter().find(|(pin, _)| *pin == number) {
        Some((_, owner)) => errors.push(format!(
            "[led.{}] {}: gpio{} already used by {}",
            name, key, number, owner
        )),
        None => used.push((number, format!("[led.{}] {}", name, key))),
    }
}

fn check_int(
    errors: &mut Vec<String>,
    name: &str,
    led: &toml::Table,
    key: &str,
    min: i64,
    max: i64,
) {
    match led.get(key) {
        Some(toml::Value::Integer(value)) if (min..=max).contains(value) => {}
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[led.{}] {} must be {}..={}", name, key, min, max))
        }
        Some(_) => errors.push(format!("[led.{}] {} must be an integer", name, key)),
        None => {}
    }
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| format!("║  • {:<62} ║", line))
            .collect::<Vec<_>>()
            .join("\n")
    );
}
