use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use brickline_session::{ButtonSet, ChangeSnapshot, Port};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    event: &'static str,
    timestamp: String,
    #[serde(flatten)]
    snapshot: &'a ChangeSnapshot,
}

pub fn print_snapshot(snapshot: &ChangeSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SnapshotOutput {
                event: "changed",
                timestamp: now_unix_seconds(),
                snapshot,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => println!("{}", snapshot_table(snapshot)),
        OutputFormat::Pretty => {
            for port in &snapshot.ports {
                println!("{}", pretty_port(port));
            }
            println!("buttons: {}", pressed_buttons(&snapshot.buttons));
        }
    }
}

fn snapshot_table(snapshot: &ChangeSnapshot) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["PORT", "DEVICE", "MODE", "SI", "RAW", "PERCENT"]);
    for port in &snapshot.ports {
        table.add_row(vec![
            port.port.name().to_string(),
            format!("{:?}", port.device_type),
            port.mode.to_string(),
            format_si(port.si_value),
            port.raw_value.to_string(),
            port.percent_value.to_string(),
        ]);
    }
    table.add_row(vec![
        "buttons".to_string(),
        pressed_buttons(&snapshot.buttons),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]);
    table
}

fn pretty_port(port: &Port) -> String {
    format!(
        "port={} device={:?} mode={} si={} raw={} percent={}",
        port.port.name(),
        port.device_type,
        port.mode,
        format_si(port.si_value),
        port.raw_value,
        port.percent_value
    )
}

fn pressed_buttons(buttons: &ButtonSet) -> String {
    let names = [
        (buttons.back, "back"),
        (buttons.left, "left"),
        (buttons.up, "up"),
        (buttons.right, "right"),
        (buttons.down, "down"),
        (buttons.enter, "enter"),
    ];
    let pressed: Vec<_> = names
        .iter()
        .filter(|(down, _)| *down)
        .map(|(_, name)| *name)
        .collect();
    if pressed.is_empty() {
        "none".to_string()
    } else {
        pressed.join(",")
    }
}

fn format_si(value: f32) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.2}")
    }
}

/// Result of a one-shot brick operation.
#[derive(Serialize)]
pub struct OperationOutput {
    pub operation: &'static str,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    pub ok: bool,
}

pub fn print_operation(out: &OperationOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPERATION", "TARGET", "BYTES", "OK"])
                .add_row(vec![
                    out.operation.to_string(),
                    out.target.clone(),
                    out.bytes.map(|b| b.to_string()).unwrap_or_default(),
                    out.ok.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match out.bytes {
            Some(bytes) => println!("{} {} ({bytes} bytes): ok", out.operation, out.target),
            None => println!("{} {}: ok", out.operation, out.target),
        },
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use brickline_session::DeviceState;

    use super::*;

    #[test]
    fn pressed_buttons_lists_names_in_reply_order() {
        let buttons = ButtonSet {
            enter: true,
            left: true,
            ..ButtonSet::default()
        };
        assert_eq!(pressed_buttons(&buttons), "left,enter");
        assert_eq!(pressed_buttons(&ButtonSet::default()), "none");
    }

    #[test]
    fn snapshot_json_flattens_state() {
        let snapshot = ChangeSnapshot::from(&DeviceState::default());
        let out = SnapshotOutput {
            event: "changed",
            timestamp: "0".to_string(),
            snapshot: &snapshot,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["event"], "changed");
        assert_eq!(json["ports"].as_array().unwrap().len(), 8);
        assert_eq!(json["buttons"]["back"], false);
    }

    #[test]
    fn snapshot_table_has_row_per_port_plus_buttons() {
        let snapshot = ChangeSnapshot::from(&DeviceState::default());
        let rendered = snapshot_table(&snapshot).to_string();
        assert!(rendered.contains("PERCENT"));
        assert!(rendered.contains("Unknown"));
        assert!(rendered.contains("buttons"));
    }

    #[test]
    fn nan_si_is_rendered_as_missing() {
        assert_eq!(format_si(f32::NAN), "n/a");
        assert_eq!(format_si(21.456), "21.46");
    }
}
