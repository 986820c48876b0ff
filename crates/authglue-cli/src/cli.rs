//! Command-line parsing.

use anyhow::{anyhow, bail, Result};
use authglue_core::cookie::parse_same_site;
use authglue_core::CookieOptions;

pub const USAGE: &str = "\
Usage: authglue <command>

Commands:
  login <username>                 Log in (prompts for password) and store the profile
  whoami                           Show the stored profile
  init                             Check whether a usable profile is stored
  fetch <METHOD> <URL> [JSON]      Send an authenticated request
  update-profile <JSON>            Merge username/email/bio/avatarUrl into the profile
  cookie get <name>                Print a cookie value
  cookie set <name> <value> [--path P] [--max-age N] [--domain D] [--secure] [--same-site S]
  logout                           End the session and clear the profile";

#[derive(Debug, PartialEq)]
pub enum Command {
    Login { username: String },
    WhoAmI,
    Init,
    Fetch { method: String, url: String, body: Option<String> },
    UpdateProfile { json: String },
    CookieGet { name: String },
    CookieSet { name: String, value: String, options: CookieOptions },
    Logout,
    Help,
}

pub fn parse(args: &[String]) -> Result<Command> {
    let mut args = args.iter().map(String::as_str);
    let command = match args.next() {
        None | Some("help") | Some("--help") | Some("-h") => return Ok(Command::Help),
        Some(command) => command,
    };
    let rest: Vec<&str> = args.collect();

    match (command, rest.as_slice()) {
        ("login", [username]) => Ok(Command::Login {
            username: username.to_string(),
        }),
        ("whoami", []) => Ok(Command::WhoAmI),
        ("init", []) => Ok(Command::Init),
        ("fetch", [method, url]) => Ok(Command::Fetch {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            body: None,
        }),
        ("fetch", [method, url, body]) => Ok(Command::Fetch {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            body: Some(body.to_string()),
        }),
        ("update-profile", [json]) => Ok(Command::UpdateProfile {
            json: json.to_string(),
        }),
        ("cookie", ["get", name]) => Ok(Command::CookieGet {
            name: name.to_string(),
        }),
        ("cookie", ["set", name, value, flags @ ..]) => Ok(Command::CookieSet {
            name: name.to_string(),
            value: value.to_string(),
            options: parse_cookie_flags(flags)?,
        }),
        ("logout", []) => Ok(Command::Logout),
        _ => bail!("Unrecognized command: {}\n\n{}", command, USAGE),
    }
}

fn parse_cookie_flags(flags: &[&str]) -> Result<CookieOptions> {
    let mut options = CookieOptions::new();
    let mut flags = flags.iter();

    while let Some(flag) = flags.next() {
        let mut value = || {
            flags
                .next()
                .copied()
                .ok_or_else(|| anyhow!("{} needs a value", flag))
        };
        options = match *flag {
            "--path" => options.path(value()?),
            "--domain" => options.domain(value()?),
            "--max-age" => {
                let raw = value()?;
                options.max_age(raw.parse().map_err(|_| anyhow!("Invalid --max-age: {}", raw))?)
            }
            "--same-site" => {
                let raw = value()?;
                options.same_site(parse_same_site(raw).ok_or_else(|| anyhow!("Invalid --same-site: {}", raw))?)
            }
            "--secure" => options.secure(),
            other => bail!("Unknown cookie option: {}", other),
        };
    }
    Ok(options)
}
