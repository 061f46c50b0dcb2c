use std::collections::HashSet;

use misrad::native::companion::CompanionClient;
use misrad::store::persist::load_snapshot;
use misrad::sync::remote::RemoteClient;

#[tokio::main]
async fn main() {
    systemd_journal_logger::JournalLog::new()
        .unwrap()
        .with_syslog_identifier("misrad-companion-check".to_string())
        .install()
        .unwrap();
    log::set_max_level(log::LevelFilter::Info);

    let config = misrad::config::MisradConfig::load();
    misrad::set_debug_logging(config.debug_logging);
    if config.debug_logging {
        log::set_max_level(log::LevelFilter::Debug);
    }

    println!("=== Companion & Remote Diagnostics ===\n");

    // Load local snapshot
    let store_path = config.store_path();
    let snapshot = match load_snapshot(&store_path) {
        Ok(s) => s,
        Err(e) => {
            println!("Failed to load snapshot from {}: {}", store_path.display(), e);
            return;
        }
    };
    println!(
        "Local: {} projects, {} tasks, {} contacts, {} time entries\n",
        snapshot.projects.len(),
        snapshot.tasks.len(),
        snapshot.contacts.len(),
        snapshot.time_entries.len()
    );

    // Probe the desktop companion
    println!("--- Companion: port {} ---", config.companion_port);
    let companion = CompanionClient::new(config.companion_port);
    if companion.check_connection().await {
        println!("  Reachable at {}", companion.base_url());

        let folders: Vec<&str> = snapshot
            .projects
            .iter()
            .filter_map(|p| p.folder_path.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        println!("  Checking {} project folders...", folders.len());
        let mut missing = Vec::new();
        for path in folders {
            if !companion.validate_folder(path).await {
                missing.push(path);
            }
        }
        if missing.is_empty() {
            println!("  All project folders exist");
        } else {
            println!("\n  MISSING FOLDERS ({}):", missing.len());
            for path in &missing {
                println!("    {}", path);
            }
        }
    } else {
        println!("  Not reachable at {}", companion.base_url());
    }

    // Compare against the remote, if configured
    let Some(ref remote_cfg) = config.remote else {
        println!("\nNo remote configured.");
        return;
    };

    println!("\n--- Remote: {} ---", remote_cfg.base_url);
    let client = match RemoteClient::new(remote_cfg) {
        Ok(c) => c,
        Err(e) => {
            println!("  Client error: {}", e);
            return;
        }
    };

    match client.fetch_all().await {
        Ok(remote) => {
            println!(
                "  Remote: {} projects, {} tasks, {} contacts, {} time entries",
                remote.projects.len(),
                remote.tasks.len(),
                remote.contacts.len(),
                remote.time_entries.len()
            );

            let remote_ids: HashSet<_> = remote.projects.iter().map(|p| p.id).collect();
            let local_ids: HashSet<_> = snapshot.projects.iter().map(|p| p.id).collect();

            let local_only: Vec<_> = snapshot
                .projects
                .iter()
                .filter(|p| !remote_ids.contains(&p.id))
                .collect();
            let remote_only: Vec<_> = remote
                .projects
                .iter()
                .filter(|p| !local_ids.contains(&p.id))
                .collect();

            if !local_only.is_empty() {
                println!("\n  LOCAL ONLY ({}):", local_only.len());
                for p in &local_only {
                    println!("    [{}] {}", p.status.as_label(), p.name);
                }
            }
            if !remote_only.is_empty() {
                println!("\n  ON SERVER ONLY ({}):", remote_only.len());
                for p in &remote_only {
                    println!("    [{}] {}", p.status, p.title);
                }
            }
            if local_only.is_empty() && remote_only.is_empty() {
                println!("  All projects in sync!");
            }
        }
        Err(e) => println!("  Error fetching remote rows: {}", e),
    }

    println!("\n=== Done ===");
}
