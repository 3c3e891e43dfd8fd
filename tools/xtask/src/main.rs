//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 transition-fx 覆盖率
//! - `defaults`: 以 JSON 输出内置默认参数表
//! - `simulate`: 在内存宿主上挂载一次效果，输出安装的时间轴

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use tracing::info;
use transition_fx::host::memory::MemoryHost;
use transition_fx::{
    AnimationParams, DiscoveryConfig, EffectName, MemoryStore, NavigationKey, Size, TimelineSlot,
    TransitionExtension,
};
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "transition-fx 开发辅助工具")]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 运行 transition-fx 覆盖率报告
    CovCore,

    /// 输出内置默认参数表
    Defaults,

    /// 在内存宿主上挂载一次效果并输出时间轴
    Simulate {
        /// 效果名（标识符或显示名）
        #[arg(short, long, default_value = "Default")]
        effect: String,

        /// 挂载前的方向键输入
        #[arg(short, long)]
        key: Option<Key>,

        /// 开启滑动缩放补偿
        #[arg(long)]
        slide_zoom: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Key {
    Left,
    Right,
    Up,
    Down,
}

impl From<Key> for NavigationKey {
    fn from(key: Key) -> Self {
        match key {
            Key::Left => NavigationKey::Left,
            Key::Right => NavigationKey::Right,
            Key::Up => NavigationKey::Up,
            Key::Down => NavigationKey::Down,
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::CheckAll => check_all(),
        Commands::CovCore => cov_core(),
        Commands::Defaults => print_json(&defaults_table()),
        Commands::Simulate {
            effect,
            key,
            slide_zoom,
        } => {
            let effect = EffectName::parse(&effect)
                .with_context(|| format!("未知效果: {effect}"))?;
            print_json(&simulate(effect, key.map(Into::into), slide_zoom)?)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//=============================================================================
// 门禁
//=============================================================================

fn check_all() -> anyhow::Result<()> {
    let sh = Shell::new()?;

    eprintln!("\n==> cargo fmt --all -- --check");
    cmd!(sh, "cargo fmt --all -- --check").run()?;

    eprintln!("\n==> cargo clippy --workspace --all-targets");
    cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

    eprintln!("\n==> cargo test --workspace");
    cmd!(sh, "cargo test --workspace").run()?;

    Ok(())
}

fn cov_core() -> anyhow::Result<()> {
    let sh = Shell::new()?;
    if cmd!(sh, "cargo llvm-cov --version")
        .quiet()
        .ignore_stdout()
        .run()
        .is_err()
    {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }

    eprintln!("\n==> cargo llvm-cov -p transition-fx --html");
    cmd!(sh, "cargo llvm-cov -p transition-fx --html").run()?;
    eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
    Ok(())
}

//=============================================================================
// defaults / simulate
//=============================================================================

/// 效果标识符 → 默认参数
fn defaults_table() -> Value {
    let table: Map<String, Value> = EffectName::ALL
        .iter()
        .map(|&effect| {
            let params = serde_json::to_value(AnimationParams::defaults_for(effect))
                .unwrap_or(Value::Null);
            (effect.ident().to_string(), params)
        })
        .collect();
    Value::Object(table)
}

/// 构造一个主窗口 + 一个过渡元素的内存宿主，走完整的启动流程后挂载所选效果
fn simulate(
    effect: EffectName,
    key: Option<NavigationKey>,
    slide_zoom: bool,
) -> anyhow::Result<Value> {
    let mut host = MemoryHost::new();
    let window = host.add_window("Playnite.FullscreenApp.Windows.MainWindow");
    let image = host.add_transition_element(window);
    host.set_size(image, Size::new(1280.0, 720.0));

    let mut ext =
        TransitionExtension::new(Box::new(MemoryStore::new()), DiscoveryConfig::default());
    ext.on_started(&mut host);
    let status = ext.on_retry_tick(&mut host);
    info!(?status, "bootstrap finished");

    if let Some(key) = key {
        host.press(key);
        for event in host.drain_events() {
            ext.handle_event(&mut host, event);
        }
    }
    if slide_zoom {
        ext.update_params(&mut host, effect, |p| p.slide_zoom = true);
    }
    let outcome = ext.select_effect(&mut host, effect);
    info!(?outcome, "effect applied");

    // 尺寸已知时缩放补偿立即生效，这里只需把排队的事件交还给扩展
    for event in host.drain_events() {
        ext.handle_event(&mut host, event);
    }

    let mut slots = Map::new();
    for slot in TimelineSlot::ALL {
        if let Some(timeline) = host.installed(image, slot) {
            slots.insert(format!("{slot:?}"), serde_json::to_value(timeline)?);
        }
    }
    Ok(serde_json::json!({
        "effect": effect.display_name(),
        "element": image.value(),
        "timelines": slots,
    }))
}
