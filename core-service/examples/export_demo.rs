//! Exports the metadata in a `.info.json` file the way a panel would.
//!
//! ```text
//! cargo run -p core-service --example export_demo -- clip.info.json [json|txt] [out-dir]
//! ```

use anyhow::{bail, Context};
use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{bootstrap_desktop, Action, DownloadContext, JobToken};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let mut args = std::env::args().skip(1);
    let Some(info_json) = args.next() else {
        bail!("usage: export_demo <file.info.json> [json|txt] [out-dir]");
    };
    let format = args.next().unwrap_or_else(|| "json".to_string());

    let service = bootstrap_desktop()?;
    let out_dir = match args.next() {
        Some(dir) => dir,
        None => service.config().export_dir.to_string_lossy().into_owned(),
    };

    let name = Path::new(&info_json)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.trim_end_matches(".info.json").to_string())
        .context("info.json path has no file name")?;

    let token = JobToken::generate();
    let channel = service.channel();
    let mut updates = channel.stream().for_job(token.clone()).updates();

    let session = service.open_session_with_token(
        token.clone(),
        DownloadContext::new(name)
            .with_source(info_json)
            .with_location(out_dir),
    );

    channel.send(
        &token,
        Action::Convert {
            format: Some(format),
            save_path: None,
            selected_fields: vec![
                "title".to_string(),
                "uploader".to_string(),
                "duration".to_string(),
                "views".to_string(),
                "tags".to_string(),
            ],
        },
    );

    loop {
        let envelope = updates.recv().await?;
        match envelope.action {
            Action::UpdateProgress { percent, phase } => println!("{:>3}% {}", percent, phase),
            Action::ShowSuccessPopup { save_path, format } => {
                println!("Saved {} to {}", format, save_path)
            }
            Action::EnableConvertButton => break,
            _ => {}
        }
    }

    session.cancel();
    session.join().await;
    Ok(())
}
