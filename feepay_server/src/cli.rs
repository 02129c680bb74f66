use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 16] = [
        "RUST_LOG",
        "FPG_HOST",
        "FPG_PORT",
        "FPG_DATABASE_URL",
        "FPG_USE_X_FORWARDED_FOR",
        "FPG_USE_FORWARDED",
        "FPG_PRICE_MARGIN",
        "FPG_IDEMPOTENCY_WINDOW_HOURS",
        "FPG_DIGIFLAZZ_USERNAME",
        "FPG_DIGIFLAZZ_BASE_URL",
        "FPG_SUPPLIER_CALLBACK_WHITELIST",
        "FPG_MIDTRANS_CLIENT_KEY",
        "FPG_MIDTRANS_PRODUCTION",
        "FPG_MAIL_API_URL",
        "FPG_MAIL_FROM",
        "FPG_TELEGRAM_CHAT_ID",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
