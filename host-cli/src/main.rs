//! # Reveal CLI
//!
//! 在终端里运行揭示引擎：加载页面文档，按滚动脚本逐帧模拟，输出事件流。
//!
//! ## 用法
//!
//! ```bash
//! # 运行演示页面
//! cargo run -p host-cli -- run --page demos/site.json --scroll demos/scroll.json --loading
//! cargo run -p host-cli -- run --page demos/site.json --config demos/reveal.json --dump
//!
//! # 查看单个数值的计数帧
//! cargo run -p host-cli -- frames "£65M+" --steps 10
//!
//! # 校验并试提交联系表单（不发送网络请求）
//! cargo run -p host-cli -- submit --form demos/form.json
//!
//! # 检查或生成配置
//! cargo run -p host-cli -- config --config demos/reveal.json
//! cargo run -p host-cli -- config --write reveal.json
//! ```

mod scroll;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use reveal_runtime::config::CounterSettings;
use reveal_runtime::contact::{ContactForm, FormBackend, Submission, submit_contact_form};
use reveal_runtime::{
    AnimationController, CancelToken, CounterRun, DisplayValue, ElementId, EngineConfig, Page,
    SubmitError, Surface,
};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "reveal")]
#[command(about = "滚动揭示动画与数字计数引擎 - 终端宿主")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 日志详细程度（-v info，-vv debug，-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 按滚动脚本运行页面
    Run {
        /// 页面文档 (JSON)
        #[arg(short, long)]
        page: PathBuf,

        /// 引擎配置 (JSON)，不存在时使用默认配置
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 滚动脚本 (JSON)，不指定时所有目标在 0 时刻完全可见
        #[arg(short, long)]
        scroll: Option<PathBuf>,

        /// 帧间隔（毫秒）
        #[arg(long, default_value = "16", value_parser = clap::value_parser!(u64).range(1..))]
        frame_ms: u64,

        /// 模拟总时长（毫秒）
        #[arg(long, default_value = "12000")]
        duration_ms: u64,

        /// 先运行加载进度模拟与首屏入场
        #[arg(long)]
        loading: bool,

        /// 结束时输出最终页面文档
        #[arg(long)]
        dump: bool,
    },

    /// 输出单个展示值的计数帧
    Frames {
        /// 展示文本，如 "£65M+"、"98%"
        raw: String,

        /// 步数
        #[arg(long, default_value = "60")]
        steps: u32,

        /// 总时长（毫秒）
        #[arg(long, default_value = "2000")]
        duration_ms: u64,
    },

    /// 校验并试提交联系表单
    Submit {
        /// 表单数据 (JSON)
        #[arg(short, long)]
        form: PathBuf,

        /// 引擎配置 (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 检查配置，或写出默认配置
    Config {
        /// 要检查的配置文件
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 把默认配置写到该路径
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            page,
            config,
            scroll,
            frame_ms,
            duration_ms,
            loading,
            dump,
        } => run_page(
            &page,
            config.as_deref(),
            scroll.as_deref(),
            frame_ms,
            duration_ms,
            loading,
            dump,
        ),
        Commands::Frames {
            raw,
            steps,
            duration_ms,
        } => print_frames(&raw, steps, duration_ms),
        Commands::Submit { form, config } => submit_form(&form, config.as_deref()),
        Commands::Config { config, write } => check_config(config.as_deref(), write.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::default(),
    };
    config.validate().context("配置无效")?;
    Ok(config)
}

fn load_page(path: &Path) -> Result<Page> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取页面文档: {}", path.display()))?;
    Page::from_json(&content).with_context(|| format!("页面文档格式错误: {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// 运行页面模拟
fn run_page(
    page_path: &Path,
    config_path: Option<&Path>,
    scroll_path: Option<&Path>,
    frame_ms: u64,
    duration_ms: u64,
    loading: bool,
    dump: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut page = load_page(page_path)?;
    let mut controller = AnimationController::try_new(config).context("配置无效")?;

    let registered = controller.discover(&mut page);
    info!(registered, page = %page_path.display(), "页面已加载");

    let steps = match scroll_path {
        Some(path) => scroll::load_script(path)?,
        None => page
            .scan()
            .into_iter()
            .map(|(element, _)| scroll::ScrollStep {
                at_ms: 0,
                element,
                fraction: 1.0,
            })
            .collect(),
    };

    if loading {
        controller.start_loading(&mut page);
    }

    let log = scroll::simulate(&mut controller, &mut page, &steps, frame_ms, duration_ms);
    for event in &log {
        print_json(event)?;
    }
    info!(
        events = log.len(),
        now_ms = controller.now_ms(),
        idle = controller.is_idle(),
        "模拟结束"
    );

    if dump {
        println!("{}", serde_json::to_string_pretty(&page.to_document())?);
    }

    controller.teardown();
    Ok(())
}

/// 输出计数帧
fn print_frames(raw: &str, steps: u32, duration_ms: u64) -> Result<()> {
    let target = DisplayValue::parse(raw).with_context(|| format!("'{}' 不可动画", raw))?;
    if target.is_zero() {
        bail!("'{}' 的目标值为零，不做计数动画", raw);
    }

    let settings = CounterSettings { steps, duration_ms };
    let element = ElementId::new("counter");
    let mut run = CounterRun::new(
        element.clone(),
        element,
        target,
        &settings,
        CancelToken::new(),
    );

    println!(
        "# {} -> {:?}，{} 步，每步 {} 毫秒",
        raw,
        run.target().suffix_pattern(),
        run.total_steps(),
        run.step_duration_ms()
    );
    println!("{:>6}  {}", 0, run.current_text());
    while !run.is_finished() {
        let text = run.step();
        println!("{:>6}  {}", run.elapsed_ms(), text);
    }
    Ok(())
}

/// 打印提交内容而不发送的后端
struct DryRunBackend;

impl FormBackend for DryRunBackend {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmitError> {
        let json = serde_json::to_string_pretty(submission).map_err(|e| SubmitError::Rejected {
            message: e.to_string(),
        })?;
        println!("{}", json);
        Ok(())
    }
}

/// 校验并试提交表单
fn submit_form(form_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let content = fs::read_to_string(form_path)
        .with_context(|| format!("无法读取表单数据: {}", form_path.display()))?;
    let mut form: ContactForm = serde_json::from_str(&content)
        .with_context(|| format!("表单数据格式错误: {}", form_path.display()))?;

    let mut controller = AnimationController::try_new(config.clone()).context("配置无效")?;
    let result = submit_contact_form(
        &mut form,
        &config.contact,
        &mut DryRunBackend,
        controller.notifications_mut(),
    );

    for notification in controller.notifications().active() {
        print_json(notification)?;
    }
    result.context("表单提交失败")
}

/// 检查配置或写出默认配置
fn check_config(config_path: Option<&Path>, write: Option<&Path>) -> Result<()> {
    if let Some(path) = write {
        EngineConfig::default()
            .save(path)
            .with_context(|| format!("无法写入配置: {}", path.display()))?;
        println!("已写出默认配置: {}", path.display());
        return Ok(());
    }

    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
