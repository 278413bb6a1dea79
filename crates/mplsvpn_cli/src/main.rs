//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `mplsvpn_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("mplsvpn_core version={}", mplsvpn_core::core_version());

    match mplsvpn_core::open_db_in_memory() {
        Ok(_conn) => {
            println!(
                "mplsvpn_core schema_version={}",
                mplsvpn_core::db::migrations::latest_version()
            );
        }
        Err(err) => {
            eprintln!("mplsvpn_core open failed: {err}");
            std::process::exit(1);
        }
    }
}
