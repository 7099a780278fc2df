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
    // No secrets in this list
    const DISPLAY_ENVS: [&str; 21] = [
        "RUST_LOG",
        "SPG_HOST",
        "SPG_PORT",
        "SPG_DATABASE_URL",
        "SPG_RUN_MIGRATIONS",
        "SPG_CURRENCY",
        "SPG_RETURN_URL",
        "SPG_NOTIFY_URL",
        "SPG_VERIFY_ATTEMPTS",
        "SPG_VERIFY_BACKOFF_SECS",
        "SPG_WEBHOOK_CHECKS",
        "SPG_EVENT_BUFFER_SIZE",
        "SPG_GATEWAY_URL",
        "SPG_GATEWAY_API_VERSION",
        "SPG_EMAIL_API_URL",
        "SPG_EMAIL_FROM",
        "SPG_OPERATOR_EMAIL",
        "SPG_WHATSAPP_API_VERSION",
        "SPG_WHATSAPP_PHONE_NUMBER_ID",
        "SPG_WHATSAPP_OPERATOR_PHONE",
        "SPG_WHATSAPP_TEMPLATE",
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
