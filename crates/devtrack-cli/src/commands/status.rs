//! Status command handler

use anyhow::Result;

use devtrack_core::{SessionOracle, Tracker};

use crate::output::{Output, OutputFormat};

/// Show status information
///
/// Backend failures are reported in the output rather than failing the
/// command.
pub async fn show(tracker: &Tracker, output: &Output) -> Result<()> {
    let config = tracker.config();
    let authenticated = tracker.session().is_authenticated();

    let profile_error = tracker.lifecycle().restore().await.err();
    let fetch_error = tracker.engine().fetch_devices().await.err();

    let directory = tracker.directory();
    let last_report = tracker.engine().last_report();
    let status = tracker.engine().status();

    match output.format {
        OutputFormat::Json => {
            output.print_json(&serde_json::json!({
                "backend_url": config.backend_url,
                "session": {
                    "authenticated": authenticated,
                    "username": tracker.session().username(),
                    "error": profile_error.as_ref().map(|e| e.to_string())
                },
                "sync": {
                    "status": status,
                    "last_report": last_report,
                    "error": fetch_error.as_ref().map(|e| e.to_string())
                },
                "devices": {
                    "total": directory.len(),
                    "visible": directory.visible().len()
                }
            }));
        }
        OutputFormat::Quiet => {
            println!("{}", directory.len());
        }
        OutputFormat::Human => {
            println!("devtrack Status");
            println!("===============");
            println!();
            println!("Backend:");
            println!("  URL: {}", config.backend_url);
            println!();
            println!("Session:");
            match (tracker.session().username(), &profile_error) {
                (Some(username), _) => println!("  Logged in as {}", username),
                (None, Some(e)) => println!("  Token present, profile unavailable: {}", e),
                (None, None) if authenticated => println!("  Token present"),
                (None, None) => println!("  Anonymous"),
            }
            println!();
            println!("Sync:");
            println!("  Status: {:?}", status);
            if let Some(report) = &last_report {
                println!(
                    "  Last sync: {} ({:?} feed)",
                    report
                        .fetched_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S"),
                    report.source
                );
            }
            if let Some(e) = &fetch_error {
                println!("  Error: {}", e);
                if let Some(hint) = e.recovery_suggestion() {
                    println!("  {}", hint);
                }
            }
            println!();
            println!("Devices:");
            println!("  Total:   {}", directory.len());
            println!("  Visible: {}", directory.visible().len());
        }
    }

    Ok(())
}
