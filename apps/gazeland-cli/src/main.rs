use clap::{Parser, Subcommand};
use gazeland_config::SceneConfig;
use gazeland_interact::Session;
use gazeland_kernel::Scene;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gazeland-cli", about = "CLI tool for gaze-dwell scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load and validate a scene file
    Check {
        /// Scene YAML file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Play a scene's gaze script through the dwell timer
    Simulate {
        /// Scene YAML file
        #[arg(short, long)]
        config: PathBuf,
        /// Simulated frames per second
        #[arg(short, long, default_value = "60")]
        fps: u32,
        /// Override the movement menu choice ("Free" or "Teleport")
        #[arg(long)]
        movement: Option<String>,
        /// Override the speed menu choice ("Slow", "Medium" or "Fast")
        #[arg(long)]
        speed: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("gazeland-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: frame={}", Scene::new().frame());
            println!("dwell: {}", gazeland_dwell::crate_info());
            println!("progress: {}", gazeland_progress::crate_info());
            println!("config: {}", gazeland_config::crate_info());
            println!("interact: {}", gazeland_interact::crate_info());
        }
        Commands::Check { config } => {
            let scene = SceneConfig::load(&config)?;
            println!("{}: OK", config.display());
            println!(
                "gaze targets: {} ({} counted)",
                scene.gaze_targets.len(),
                scene.counted_targets()
            );
            println!("teleport targets: {}", scene.teleport_targets.len());
            println!("unlocks: {}", scene.unlocks.len());
            if let Some(answer) = &scene.answer {
                println!("answer: {answer}");
            }
            println!("script steps: {}", scene.script.len());
        }
        Commands::Simulate {
            config,
            fps,
            movement,
            speed,
        } => simulate(config, fps, movement, speed)?,
    }

    Ok(())
}

fn simulate(
    path: PathBuf,
    fps: u32,
    movement: Option<String>,
    speed: Option<String>,
) -> anyhow::Result<()> {
    let mut config = SceneConfig::load(&path)?;
    if let Some(name) = movement {
        config.settings.select_movement(&name)?;
    }
    if let Some(name) = speed {
        config.settings.select_speed(&name)?;
    }
    if fps == 0 {
        anyhow::bail!("fps must be positive");
    }
    let frame_dt = 1.0 / fps as f32;

    let mut session = Session::from_config(&config);
    println!(
        "Simulating {} at {fps} fps: {}",
        path.display(),
        session.tracker().borrow().status()
    );

    let mut last_status = session.tracker().borrow().status();
    let mut last_answer = None;
    for (index, step) in config.script.iter().enumerate() {
        let reports = session.play(step, frame_dt)?;
        if let Some(fault) = session.blocking_fault() {
            anyhow::bail!("step {index}: {fault}");
        }
        let peak = reports.iter().map(|r| r.fill).fold(0.0_f32, f32::max);
        println!("step {index}: {step:?} (frames={}, peak fill={peak:.2})", reports.len());

        for report in &reports {
            if let Some(done) = report.completion {
                let holder = done
                    .holder
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  frame {}: {} dwell complete after {:.2}s (holder {holder})",
                    report.frame, done.mode, done.threshold
                );
            }
            if report.status != last_status {
                println!("  frame {}: {}", report.frame, report.status);
                last_status = report.status;
            }
        }
        let now = session.tracker().borrow().status();
        if now != last_status {
            println!("  {now}");
            last_status = now;
        }
        let answer = session.answer_status();
        if answer != last_answer {
            if let Some(verdict) = &answer {
                println!("  {verdict}");
            }
            last_answer = answer;
        }
        for event in session.drain_pointer_events() {
            tracing::debug!(phase = ?event.phase, object = %event.target, "pointer");
        }
    }

    let scene = session.scene().borrow();
    let replayed = Scene::replay(scene.events());
    let visible = scene.objects().values().filter(|obj| obj.active).count();
    println!(
        "Done: frame={}, objects={} ({visible} visible), {}",
        scene.frame(),
        scene.object_count(),
        last_status
    );
    println!(
        "Replay: {}",
        if replayed.object_count() == scene.object_count() && replayed.frame() == scene.frame() {
            "OK"
        } else {
            "MISMATCH"
        }
    );
    Ok(())
}
