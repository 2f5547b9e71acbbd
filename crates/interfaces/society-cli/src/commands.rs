use std::time::Duration;

use anyhow::{bail, Result};
use camino::Utf8PathBuf;
use indicatif::{ProgressBar, ProgressStyle};
use society_app_core::{
    ActionFamily, ConsoleApp, ConsoleSettings, SessionPhase, SettingsFile, SliceState, Status,
};
use society_core::routes::menu_group;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Waits on `family` behind a spinner.
async fn wait_for(app: &mut ConsoleApp, family: ActionFamily, message: &str) -> Result<()> {
    let pb = spinner(message);
    let res = app.settle(family).await;
    pb.finish_and_clear();
    res
}

fn slice_error<D>(slice: &SliceState<D>) -> Option<String> {
    match slice.status {
        Status::Failed => Some(slice.error.clone().unwrap_or_else(|| "Request failed".into())),
        _ => None,
    }
}

pub async fn cmd_login(app: &mut ConsoleApp, phone: &str, building: Option<&str>) -> Result<()> {
    let tenant = crate::tenant_arg(building)?;
    app.request_otp(phone, tenant)?;
    wait_for(app, ActionFamily::SendOtp, "Requesting OTP...").await?;

    let state = app.state();
    if let Some(err) = slice_error(&state.send_otp) {
        bail!("{err}");
    }
    match state.session.pending_otp() {
        Some((phone, _)) => {
            println!(":: OTP sent to {}", phone.masked());
            println!("   Run `society-admin verify <code>` to finish signing in.");
        }
        None => bail!("OTP request did not complete"),
    }
    Ok(())
}

/// Returns the screen the console lands on.
pub async fn cmd_verify(app: &mut ConsoleApp, code: &str) -> Result<String> {
    app.submit_otp(code)?;
    wait_for(app, ActionFamily::VerifyOtp, "Verifying OTP...").await?;

    if let Some(err) = slice_error(&app.state().verify_otp) {
        bail!("{err}");
    }
    let Some(user) = app.current_user() else {
        bail!("Sign-in did not complete");
    };
    let landing = app.mount()?.unwrap_or_else(|| "/".into());
    println!(":: Signed in as {} ({})", user.name, user.id);
    println!("   Landing on {landing}");
    Ok(landing)
}

pub async fn cmd_resend(app: &mut ConsoleApp) -> Result<()> {
    app.resend_otp()?;
    wait_for(app, ActionFamily::SendOtp, "Resending OTP...").await?;
    if let Some(err) = slice_error(&app.state().send_otp) {
        bail!("{err}");
    }
    println!(":: OTP sent again");
    Ok(())
}

pub fn cmd_logout(app: &mut ConsoleApp) -> Result<()> {
    let was_signed_in = app.is_authenticated();
    app.logout()?;
    if was_signed_in {
        println!(":: Signed out");
    } else {
        println!(":: Cleared local console state");
    }
    Ok(())
}

pub fn cmd_whoami(app: &ConsoleApp) -> Result<()> {
    match app.current_user() {
        Some(user) => {
            println!(":: {} ({})", user.name, user.id);
            let roles: Vec<&str> = user.roles.iter().map(|r| r.as_str()).collect();
            println!("   Roles:    {}", roles.join(", "));
            match &user.building_id {
                Some(id) => println!("   Building: {id}"),
                None => println!("   Building: (all)"),
            }
        }
        None => println!(":: Not signed in"),
    }
    Ok(())
}

/// Returns the path that actually renders after the guard ran.
pub fn cmd_open(app: &mut ConsoleApp, path: &str) -> Result<String> {
    // The first private screen after sign-in is picked by the restore.
    if let Some(restored) = app.mount()? {
        tracing::debug!("restored {restored} before opening {path}");
    }
    let rendered = app.navigate(path)?;
    if rendered != path {
        println!(":: {path} -> {rendered}");
    } else {
        println!(":: {rendered}");
    }
    Ok(rendered)
}

pub fn cmd_menu(app: &mut ConsoleApp, path: &str) -> Result<()> {
    let group = menu_group(path).unwrap_or(path);
    let open = app.toggle_menu(group)?;
    println!(":: {group} {}", if open { "expanded" } else { "collapsed" });
    Ok(())
}

pub fn cmd_status(app: &ConsoleApp) -> Result<()> {
    let state = app.state();
    let phase = match &state.session.phase {
        SessionPhase::Anonymous => "signed out".to_string(),
        SessionPhase::OtpPending { phone, .. } => format!("waiting for OTP ({})", phone.masked()),
        SessionPhase::Authenticated => "signed in".to_string(),
    };
    println!(":: Session:   {phase}");
    println!("   Send OTP:  {:?}", state.send_otp.status);
    println!("   Verify:    {:?}", state.verify_otp.status);
    let remaining = app.resend_remaining();
    if !remaining.is_zero() {
        println!("   Resend in: {}s", remaining.as_secs());
    }
    println!(
        "   Screen:    {}",
        state.navigation.active_path.as_deref().unwrap_or("-")
    );
    let open: Vec<&str> = state
        .navigation
        .expanded_menus
        .iter()
        .filter(|(_, open)| **open)
        .map(|(group, _)| group.as_str())
        .collect();
    if !open.is_empty() {
        println!("   Menus:     {}", open.join(", "));
    }
    Ok(())
}

/// Changes to `settings.json` requested by `society-admin config`.
#[derive(Debug, Default)]
pub struct ConfigChange {
    pub api_url: Option<String>,
    pub store: Option<Utf8PathBuf>,
    pub clear_store: bool,
}

/// Applies `change` to the settings file and returns what is now stored.
/// Without changes the file is only printed.
pub fn cmd_config(file: &SettingsFile, change: ConfigChange) -> Result<ConsoleSettings> {
    let mut settings = file.read()?;
    let before = settings.clone();

    if let Some(url) = change.api_url {
        let url = url.trim();
        if url.is_empty() {
            bail!("API URL must not be empty");
        }
        settings.api_base_url = url.to_string();
    }
    if change.clear_store {
        settings.storage_path = None;
    } else if let Some(path) = change.store {
        settings.storage_path = Some(path);
    }

    if settings != before {
        file.save(&settings)?;
        println!(":: Saved {}", file.path().display());
    } else {
        println!(":: {}", file.path().display());
    }
    println!("   API:   {}", settings.api_base_url);
    match &settings.storage_path {
        Some(path) => println!("   Store: {path}"),
        None => match settings.store_path() {
            Ok(path) => println!("   Store: {path} (default)"),
            Err(e) => println!("   Store: default ({e})"),
        },
    }
    Ok(settings)
}
