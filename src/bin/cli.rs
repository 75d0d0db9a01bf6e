//! Desktop Agent - AI-powered desktop automation
//!
//! This is the CLI entry point for the desktop-agent tool.
//! Run with: cargo run --bin desktop-agent -- "your task"

use desktop_agent::config::{load_task_script, RuntimeConfig};
use desktop_agent::{
    ActionHandler, AppSettings, ConsoleOperator, DesktopAgent, InputDevice, ModelClient,
    SessionEnd,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// What the command line asked for.
enum Mode {
    Check,
    InitConfig,
    Tasks(Vec<String>),
    Interactive,
}

fn parse_args(args: &[String]) -> anyhow::Result<Mode> {
    match args.first().map(String::as_str) {
        Some("--check") => Ok(Mode::Check),
        Some("--init-config") => Ok(Mode::InitConfig),
        Some("--tasks") => {
            let path = args
                .get(1)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow::anyhow!("--tasks requires a file path"))?;
            let tasks = load_task_script(&path).map_err(anyhow::Error::msg)?;
            if tasks.is_empty() {
                anyhow::bail!("Task script {} contains no tasks", path.display());
            }
            Ok(Mode::Tasks(tasks))
        }
        Some(_) => Ok(Mode::Tasks(vec![args.join(" ")])),
        None => Ok(Mode::Interactive),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mode = parse_args(&args)?;

    if let Mode::InitConfig = mode {
        let path = AppSettings::default().save().map_err(anyhow::Error::msg)?;
        println!("Wrote default settings to {}", path.display());
        return Ok(());
    }

    let settings = AppSettings::load();
    let config = RuntimeConfig::from_env(&settings)?;

    println!("🖥️  Desktop Agent - AI-powered Desktop Automation");
    println!("================================================");
    println!("Model: {} @ {}", config.model_name, config.base_url);
    println!("Input backend: {}", config.input_backend);
    println!(
        "Display: {}x{} (scale {:.2})",
        config.display_width, config.display_height, config.coordinate_scale
    );
    println!("Images kept in history: {}", config.keep_images);
    if let Some(limit) = config.max_steps {
        println!("Step limit: {}", limit);
    }
    println!("================================================\n");

    match mode {
        Mode::Check => run_check(&config).await,
        Mode::Tasks(tasks) => run_tasks(&config, &tasks).await,
        Mode::Interactive => {
            print!("📝 Task: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            let task = line.trim();
            if task.is_empty() || task.eq_ignore_ascii_case("quit") || task.eq_ignore_ascii_case("exit") {
                println!("Goodbye! 👋");
                return Ok(());
            }
            run_tasks(&config, &[task.to_string()]).await
        }
        Mode::InitConfig => Ok(()),
    }
}

/// Read the cursor and take one screenshot through the selected backend.
async fn run_check(config: &RuntimeConfig) -> anyhow::Result<()> {
    let device = config.input_backend.create(config.command_runner());
    println!("🔍 Checking {} backend...", device.name());

    let mut failed = false;
    match device.cursor_position().await {
        Ok((x, y)) => println!("✅ Cursor position: ({}, {})", x, y),
        Err(e) => {
            println!("❌ Cursor position failed: {}", e);
            failed = true;
        }
    }
    match capture_check(device.as_ref(), config).await {
        Ok((width, height)) => println!("✅ Screenshot captured: {}x{}", width, height),
        Err(e) => {
            println!("❌ Screenshot failed: {}", e);
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("{} backend check failed", device.name());
    }
    println!("Check complete.");
    Ok(())
}

async fn capture_check(
    device: &dyn InputDevice,
    config: &RuntimeConfig,
) -> anyhow::Result<(u32, u32)> {
    let raw = device.capture_screenshot().await?;
    let shot = desktop_agent::desktop::compress_screenshot(&raw, config.jpeg_quality)?;
    Ok((shot.width, shot.height))
}

/// Run each task as its own session. A service failure ends only that task.
async fn run_tasks(config: &RuntimeConfig, tasks: &[String]) -> anyhow::Result<()> {
    for (index, task) in tasks.iter().enumerate() {
        if tasks.len() > 1 {
            println!("\n📋 Task {}/{}", index + 1, tasks.len());
        }
        println!("📝 Task: {}\n", task);

        let model = ModelClient::new(config.model_config())?;
        let device = config.input_backend.create(config.command_runner());
        let handler = ActionHandler::new(device, config.executor_config());
        let operator = ConsoleOperator::new(io::stdin().lock(), io::stdout());

        let mut agent = DesktopAgent::new(model, operator, handler, config.agent_config(task));
        match agent.run().await {
            SessionEnd::OperatorExit => println!("\n✅ Session finished"),
            SessionEnd::ServiceFailed(e) => eprintln!("\n❌ Session aborted: {}", e),
            SessionEnd::StepLimit(limit) => {
                println!("\n⚠️  Stopped after reaching the step limit of {}", limit)
            }
        }
    }

    println!("Goodbye! 👋");
    Ok(())
}
