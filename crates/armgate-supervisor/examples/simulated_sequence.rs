//! 在模拟控制器上执行关节序列
//!
//! ```bash
//! # 内置的八点录制序列
//! cargo run -p armgate-supervisor --example simulated_sequence
//!
//! # 第 3 条命令返回错误码 11
//! cargo run -p armgate-supervisor --example simulated_sequence -- --fail-at 3 --code 11
//!
//! # 第 4 条命令执行期间控制器报错
//! RUST_LOG=debug cargo run -p armgate-supervisor --example simulated_sequence -- --fault-at 4
//! ```

use anyhow::{Context, Result};
use armgate_controller::mock::{MoveScript, SimulatedController};
use armgate_supervisor::{MotionSequence, MotionSupervisor, RunOutcome, SupervisorConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "simulated_sequence")]
#[command(about = "Run a joint sequence against a simulated arm controller", long_about = None)]
struct Args {
    /// 序列文件（JSON），缺省为内置录制序列
    #[arg(long)]
    sequence: Option<PathBuf>,

    /// 配置文件（TOML）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 第 N 条命令（从 1 开始）返回 `--code`
    #[arg(long, value_name = "N")]
    fail_at: Option<usize>,

    /// `--fail-at` 使用的返回码
    #[arg(long, default_value_t = 1)]
    code: i32,

    /// 第 N 条命令（从 1 开始）执行期间控制器报错
    #[arg(long, value_name = "N")]
    fault_at: Option<usize>,
}

fn main() -> Result<()> {
    armgate_supervisor::init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SupervisorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SupervisorConfig::default(),
    };

    let sequence = match &args.sequence {
        Some(path) => MotionSequence::load(path)
            .with_context(|| format!("loading sequence {}", path.display()))?,
        None => MotionSequence::recorded(),
    };

    let controller = Arc::new(SimulatedController::new());
    if let Some(n) = args.fail_at.filter(|n| *n > 0) {
        controller.script_move(n - 1, MoveScript::Code(args.code));
    }
    if let Some(n) = args.fault_at.filter(|n| *n > 0) {
        controller.script_move(n - 1, MoveScript::FaultDuring { error_code: 5 });
    }

    let supervisor = MotionSupervisor::new(Arc::clone(&controller), config)
        .context("initializing supervisor")?;
    let report = supervisor.run(&sequence);

    println!("sequence : {}", sequence.name);
    println!("issued   : {}/{}", report.issued, report.total);
    match &report.outcome {
        RunOutcome::Completed => println!("outcome  : completed"),
        RunOutcome::NotAlive { index } => {
            println!("outcome  : not alive before step {}", index + 1)
        },
        RunOutcome::CheckFailed { index, code } => {
            println!("outcome  : check failed at step {} (code {})", index + 1, code)
        },
        RunOutcome::Error { index, message } => {
            println!("outcome  : exception at step {}: {}", index + 1, message)
        },
    }
    if let Some(reason) = &report.trip_reason {
        println!("stopped  : {}", reason);
    }
    println!("released : {} subscription(s)", controller.release_calls().len());

    Ok(())
}
