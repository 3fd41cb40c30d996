use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use homework_grader::grading::{Grader, Locale, ScoringPolicy, UnparsablePolicy};
use homework_grader::utils::logging;
use homework_grader::{App, Config, GradeRequest};

/// 作业图片自动评分
#[derive(Debug, Parser)]
#[command(name = "homework_grader", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 评分单张作业图片，输出 JSON
    Grade {
        /// 作业图片地址
        image_url: String,
        /// 改用大模型直接看图评分
        #[arg(long)]
        model: bool,
    },
    /// 离线评分一段文本（不调用任何外部服务）
    Eval {
        /// 待评分文本，多行可用逗号、分号或换行分隔
        text: String,
        /// 无法解析的行也计入平均分
        #[arg(long)]
        include_unparsable: bool,
        /// 评语语言：zh / en
        #[arg(long)]
        locale: Option<Locale>,
    },
    /// 批量评分目录下所有 TOML 作业文件（默认）
    Batch {
        /// 作业目录，默认读取 SUBMISSIONS_FOLDER
        #[arg(long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::try_from_env().context("配置加载失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    match cli.command.unwrap_or(Command::Batch { folder: None }) {
        Command::Grade { image_url, model } => {
            let app = App::initialize(config)?;
            let request = GradeRequest::new(image_url).with_model(model);
            let outcome = app.grade_one(&request).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Eval {
            text,
            include_unparsable,
            locale,
        } => {
            let unparsable = if include_unparsable {
                UnparsablePolicy::Include
            } else {
                config.scoring_policy().unparsable
            };
            let locale = locale.unwrap_or(config.grading_locale);
            let result = Grader::new(ScoringPolicy::new(unparsable, locale)).grade(&text);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Batch { folder } => {
            if let Some(folder) = folder {
                config.submissions_folder = folder;
            }
            App::initialize(config)?.run().await?;
        }
    }

    Ok(())
}
