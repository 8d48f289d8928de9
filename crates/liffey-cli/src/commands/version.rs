//! `liffey version` command implementation.

/// Print version information.
pub fn run(json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "name": "liffey",
                "version": env!("CARGO_PKG_VERSION"),
            })
        );
    } else {
        println!("liffey {}", env!("CARGO_PKG_VERSION"));
    }
}
