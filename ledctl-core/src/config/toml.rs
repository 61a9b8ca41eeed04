//! Topology parser for a small TOML subset
//!
//! ```toml
//! [led.status]
//! pin = "gpio25"          # "!gpio25" for active low
//! pwm = false
//! trigger = "^gpio15"     # "^" enables the input pull-up
//! rising = true
//! falling = false
//! debounce_ms = 20
//! threshold = 80
//! hysteresis = 5
//! auto_throttle = true
//! ```
//!
//! Only `[led.<name>]` sections, `key = value` pairs, quoted or bare
//! strings, integers, booleans and `#` comments are understood. Sections
//! past [`MAX_TOPOLOGY_ENTRIES`] are checked, then dropped with a warning.

use heapless::String;

use super::{LedSpec, PinConfig, Topology, MAX_TOPOLOGY_ENTRIES};

/// What went wrong while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Section header other than `[led.<name>]`, or a key outside a section
    InvalidSection,
    UnknownKey,
    InvalidValue,
    /// Pin string not of the form `gpioN`
    InvalidPin,
    /// Section without a `pin` key
    MissingPin,
    DuplicateName,
}

/// Parse failure with the 1-based line it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Section being filled in
struct Entry {
    line: usize,
    spec: LedSpec,
    has_pin: bool,
    rising: Option<bool>,
    falling: Option<bool>,
}

/// Parse a topology description
pub fn parse_topology(input: &str) -> Result<Topology, ParseError> {
    let mut topology = Topology::new();
    let mut current: Option<Entry> = None;

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let at = |kind| ParseError {
            line: line_no,
            kind,
        };
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if let Some(entry) = current.take() {
                finish(&mut topology, entry)?;
            }
            let name = header
                .trim()
                .strip_prefix("led.")
                .filter(|name| !name.is_empty())
                .ok_or(at(ParseErrorKind::InvalidSection))?;
            let name = String::try_from(name).map_err(|_| at(ParseErrorKind::InvalidValue))?;

            let mut spec = LedSpec::new(PinConfig::default());
            spec.name = name;
            current = Some(Entry {
                line: line_no,
                spec,
                has_pin: false,
                rising: None,
                falling: None,
            });
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or(at(ParseErrorKind::InvalidValue))?;
        let entry = current
            .as_mut()
            .ok_or(at(ParseErrorKind::InvalidSection))?;
        apply(entry, key.trim(), value.trim()).map_err(at)?;
    }

    if let Some(entry) = current.take() {
        finish(&mut topology, entry)?;
    }
    debug!("topology: {} entries", topology.leds.len());
    Ok(topology)
}

fn apply(entry: &mut Entry, key: &str, value: &str) -> Result<(), ParseErrorKind> {
    let spec = &mut entry.spec;
    match key {
        "pin" => {
            spec.pin = parse_pin(value)?;
            entry.has_pin = true;
        }
        "pwm" => spec.pwm = parse_bool(value)?,
        "trigger" => {
            let pin = parse_pin(value)?;
            spec.trigger.line = Some(pin.line());
            spec.trigger_pull_up = pin.pull_up;
        }
        "rising" => entry.rising = Some(parse_bool(value)?),
        "falling" => entry.falling = Some(parse_bool(value)?),
        "debounce_ms" => spec.trigger.debounce_ms = parse_int(value)?,
        "threshold" => spec.thermal.threshold_c = parse_int(value)?,
        "hysteresis" => {
            let hysteresis: i16 = parse_int(value)?;
            if hysteresis < 0 {
                return Err(ParseErrorKind::InvalidValue);
            }
            spec.thermal.hysteresis_c = hysteresis;
        }
        "auto_throttle" => spec.thermal.auto_throttle = parse_bool(value)?,
        _ => return Err(ParseErrorKind::UnknownKey),
    }
    Ok(())
}

fn finish(topology: &mut Topology, entry: Entry) -> Result<(), ParseError> {
    let at = |kind| ParseError {
        line: entry.line,
        kind,
    };
    if !entry.has_pin {
        return Err(at(ParseErrorKind::MissingPin));
    }
    if topology.find(&entry.spec.name).is_some() {
        return Err(at(ParseErrorKind::DuplicateName));
    }

    let mut spec = entry.spec;
    if spec.trigger.line.is_some() {
        spec.trigger.rising_edge = entry.rising.unwrap_or(true);
        spec.trigger.falling_edge = entry.falling.unwrap_or(false);
    }
    if topology.leds.push(spec).is_err() {
        warn!(
            "topology holds {} LEDs, ignoring section on line {}",
            MAX_TOPOLOGY_ENTRIES,
            entry.line
        );
    }
    Ok(())
}

/// Drop a trailing `#` comment that is not inside a quoted string
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    value.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseErrorKind> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

/// Parse `gpioN` with optional `!` (active low) and `^` (pull-up) prefixes
fn parse_pin(value: &str) -> Result<PinConfig, ParseErrorKind> {
    let mut rest = unquote(value);
    let mut pin = PinConfig::default();
    loop {
        if let Some(r) = rest.strip_prefix('!') {
            pin.inverted = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('^') {
            pin.pull_up = true;
            rest = r;
        } else {
            break;
        }
    }
    pin.pin = rest
        .strip_prefix("gpio")
        .and_then(|n| n.parse().ok())
        .ok_or(ParseErrorKind::InvalidPin)?;
    Ok(pin)
}
