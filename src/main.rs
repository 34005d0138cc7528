mod cli;

use bdstream::report::DiscReport;
use bdstream_core::{format_ticks, NavConfig};
use bdstream_nav::scripted::ScriptedProvider;
use bdstream_nav::{BdBuffer, BdHandle, StillDuration, WaitReason};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "bdstream=trace,bdstream_nav=trace,bdstream_core=debug".to_string()
        } else {
            "bdstream=info,bdstream_nav=info,bdstream_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { disc, json } => info(&disc, cli.config.as_deref(), json),
        Commands::Dump {
            disc,
            title,
            output,
            skip_stills,
        } => dump(&disc, cli.config.as_deref(), title, &output, skip_stills),
        Commands::Snapshot {
            disc,
            title,
            chapter,
        } => snapshot(&disc, cli.config.as_deref(), title, chapter),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("bdstream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_disc(disc: &Path, config_path: Option<&Path>) -> Result<BdBuffer> {
    if !disc.exists() {
        anyhow::bail!("Disc does not exist: {:?}", disc);
    }
    let config = NavConfig::load_or_default(config_path);
    let retries = config.open.retries;
    let buffer = BdBuffer::open(disc, retries, &ScriptedProvider::default(), config)
        .with_context(|| format!("Failed to open disc {}", disc.display()))?;
    Ok(buffer)
}

/// Put the session on `title`, or on the main title when none is given.
fn position_on_title(buffer: &mut BdBuffer, title: Option<u32>) -> Result<u32> {
    let title = title.unwrap_or_else(|| buffer.main_title());
    if buffer.current_title() != Some(title) || buffer.is_in_menu() {
        buffer.switch_title(title)?;
    }
    Ok(title)
}

fn info(disc: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let mut buffer = open_disc(disc, config_path)?;
    let report = DiscReport::collect(&mut buffer);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

fn dump(
    disc: &Path,
    config_path: Option<&Path>,
    title: Option<u32>,
    output: &Path,
    skip_stills: bool,
) -> Result<()> {
    let mut buffer = open_disc(disc, config_path)?;
    let title = position_on_title(&mut buffer, title)?;
    tracing::info!(title, "Dumping title to {}", output.display());

    let done = Arc::new(AtomicBool::new(false));
    let skipper = spawn_wait_skipper(buffer.handle(), Arc::clone(&done), skip_stills);

    let result = copy_title(&mut buffer, output);
    done.store(true, Ordering::SeqCst);
    skipper
        .join()
        .map_err(|_| anyhow::anyhow!("wait skipper thread panicked"))?;

    let written = result?;
    println!(
        "Wrote {} bytes of title {} ({}) to {}",
        written,
        title,
        format_ticks(buffer.total_time_of_title()),
        output.display()
    );
    Ok(())
}

fn copy_title(buffer: &mut BdBuffer, output: &Path) -> Result<u64> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;

    loop {
        let n = buffer.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        written += n as u64;
    }
    writer.flush()?;
    Ok(written)
}

/// Headless playback has nobody to press "skip", so indefinite stills and
/// player drains are released here. Timed stills are waited out unless
/// `skip_stills` is set.
fn spawn_wait_skipper(
    handle: BdHandle,
    done: Arc<AtomicBool>,
    skip_stills: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !done.load(Ordering::SeqCst) && !handle.is_closed() {
            let release = match handle.wait_reason() {
                Some(WaitReason::StillFrame(StillDuration::Infinite)) => true,
                Some(WaitReason::StillFrame(StillDuration::Seconds(_))) => skip_stills,
                Some(WaitReason::PlayerDrain) => true,
                None => false,
            };
            if release {
                tracing::debug!("Releasing wait: {}", handle.describe_position());
                handle.skip_wait();
            }
            thread::sleep(Duration::from_millis(10));
        }
    })
}

fn snapshot(
    disc: &Path,
    config_path: Option<&Path>,
    title: Option<u32>,
    chapter: Option<u32>,
) -> Result<()> {
    let mut buffer = open_disc(disc, config_path)?;
    position_on_title(&mut buffer, title)?;

    if let Some(chapter) = chapter {
        if chapter == 0 {
            anyhow::bail!("Chapters are numbered from 1");
        }
        buffer.seek_chapter(chapter - 1)?;
    }

    tracing::info!("Snapshot at {}", buffer.describe_position());
    println!("{}", buffer.snapshot()?);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?;
            let config = NavConfig::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            NavConfig::default()
        }
    };

    println!("  Open retries: {}", config.open.retries);
    println!("  Try menus: {}", config.navigation.try_menus);
    println!(
        "  Minimum title length: {}s",
        config.navigation.min_title_length_secs
    );
    println!("  Ignore wait states: {}", config.navigation.ignore_wait_states);
    println!(
        "  Player: audio={} subtitles={} menus={} region={}",
        config.player.audio_language,
        config.player.subtitle_language,
        config.player.menu_language,
        config.player.region
    );

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}
