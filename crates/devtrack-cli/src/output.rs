//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use devtrack_core::DeviceRecord;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    /// Print a single device
    pub fn print_device(&self, device: &DeviceRecord) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", device.device_id);
                println!("Name:      {}", device.display_name);
                if !device.nickname.is_empty() {
                    println!("Nickname:  {}", device.nickname);
                }
                if !device.color.is_empty() {
                    println!("Color:     {}", device.color);
                }
                println!("Position:  {}", format_position(device));
                println!("Altitude:  {:.1} m", device.altitude);
                println!("Heading:   {:.0}°", device.angle);
                if device.is_hidden {
                    println!("Hidden:    yes");
                }
            }
            OutputFormat::Json => self.print_json(device),
            OutputFormat::Quiet => println!("{}", device.device_id),
        }
    }

    /// Print a list of devices
    pub fn print_devices(&self, devices: &[DeviceRecord]) {
        match self.format {
            OutputFormat::Human => {
                if devices.is_empty() {
                    println!("No devices found.");
                    return;
                }
                for device in devices {
                    println!("{}", device_line(device));
                }
                println!("\n{} device(s)", devices.len());
            }
            OutputFormat::Json => self.print_json(devices),
            OutputFormat::Quiet => {
                for device in devices {
                    println!("{}", device.device_id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", msg);
        }
    }
}

/// One-line summary used in device listings
fn device_line(device: &DeviceRecord) -> String {
    let mut line = format!(
        "{} | {} | {}",
        pad(&truncate(&device.device_id, 12), 12),
        pad(&truncate(device.label(), 28), 28),
        format_position(device)
    );
    if !device.color.is_empty() {
        line.push_str(&format!(" | {}", device.color));
    }
    if device.is_hidden {
        line.push_str(" (hidden)");
    }
    line
}

fn format_position(device: &DeviceRecord) -> String {
    format!("{:.5}, {:.5}", device.latitude, device.longitude)
}

/// Left-align to a fixed width, counting characters rather than bytes
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
