use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use image_text_crypt::{
    CodecError, Decoder, Encoder, ErrorKind,
    config::{Config, create_config_file, delete_config_file, get_default_config_path, load_config},
    file_ops::{
        determine_frame_output_path, determine_output_path, read_frame_text, read_image_payload,
        write_decoded_image, write_frame_text,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{env, path::PathBuf, process::ExitCode};

#[derive(Parser)]
#[command(name = "image_text_crypt", version, about = "画像を暗号化テキストに変換・復元するツール")]
struct Cli {
    /// 設定ファイルのパス
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 詳細出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 画像ファイルを暗号化テキストに変換
    Encrypt {
        /// 入力画像ファイル
        input: PathBuf,
        /// 出力先（省略時は encrypted-image-<日付>.txt、`-` で標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// 暗号化テキストを画像ファイルに復元
    Decrypt {
        /// 暗号化テキストのファイル（`-` で標準入力）
        input: PathBuf,
        /// 出力画像ファイル（省略時は decrypted-image-<日付>.<拡張子>）
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// 設定ファイルの管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct PasswordArgs {
    /// パスワード
    #[arg(short, long, conflicts_with = "password_env")]
    password: Option<String>,
    /// パスワードを読み込む環境変数名
    #[arg(long)]
    password_env: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// デフォルト設定ファイルを作成
    Init {
        /// 既存のファイルを上書き
        #[arg(long)]
        force: bool,
    },
    /// 現在の設定を表示
    Show,
    /// 設定ファイルのパスを表示
    Path,
    /// 設定ファイルを削除
    Delete,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e.downcast_ref::<CodecError>().map(CodecError::kind);
            eprintln!("エラー: {e:#}");
            match kind {
                Some(ErrorKind::PasswordRequired) => {
                    eprintln!("-p または --password-env でパスワードを指定してください");
                    ExitCode::from(2)
                }
                Some(ErrorKind::IncorrectPassword) => ExitCode::from(3),
                Some(ErrorKind::CorruptedData) => ExitCode::from(4),
                Some(ErrorKind::UnexpectedFailure) | None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_logger(cli.verbose || config.default_verbose);

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            password,
        } => {
            let secret = config.load_base_secret()?;
            let password = resolve_password(&password, &config)?;
            let payload = read_image_payload(&input, &config)?;

            let progress = chunk_progress_bar()?;
            let text = Encoder::new(&secret)
                .with_chunk_size(config.chunk_size)
                .encode_with_progress(&payload, password.as_deref(), |done, total| {
                    progress.set_length(total as u64);
                    progress.set_position(done as u64);
                })?;
            progress.finish_and_clear();

            let output_path =
                determine_frame_output_path(output.as_deref(), Local::now().date_naive());
            write_frame_text(output_path.as_deref(), &text)?;
            if let Some(path) = &output_path {
                eprintln!(
                    "暗号化完了: {} → {} ({} 文字)",
                    input.display(),
                    path.display(),
                    text.len()
                );
            }
        }
        Commands::Decrypt {
            input,
            output,
            password,
        } => {
            let secret = config.load_base_secret()?;
            let password = resolve_password(&password, &config)?;
            let text = read_frame_text(&input)?;

            let progress = chunk_progress_bar()?;
            let image = Decoder::new(&secret).decode_with_progress(
                &text,
                password.as_deref(),
                |done, total| {
                    progress.set_length(total as u64);
                    progress.set_position(done as u64);
                },
            );
            progress.finish_and_clear();
            let image = image?;

            let output_path =
                determine_output_path(output.as_deref(), &image, Local::now().date_naive());
            let written = write_decoded_image(&output_path, &image)?;
            eprintln!(
                "復号化完了: {} ({}, {} バイト)",
                output_path.display(),
                image.mime_type(),
                written
            );
        }
        Commands::Config { action } => {
            let path = match cli.config {
                Some(path) => path,
                None => get_default_config_path()?,
            };
            match action {
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        return Err(anyhow!(
                            "設定ファイルは既に存在します（--force で上書き）: {}",
                            path.display()
                        ));
                    }
                    create_config_file(&path)?;
                    println!("設定ファイルを作成しました: {}", path.display());
                }
                ConfigAction::Show => {
                    let content = toml::to_string_pretty(&config)
                        .context("設定の表示に失敗しました")?;
                    println!("{content}");
                }
                ConfigAction::Path => println!("{}", path.display()),
                ConfigAction::Delete => {
                    delete_config_file(&path)?;
                    println!("設定ファイルを削除しました: {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// パスワードの取得（引数 → 指定の環境変数 → 設定のデフォルト環境変数）
fn resolve_password(args: &PasswordArgs, config: &Config) -> Result<Option<String>> {
    if let Some(password) = &args.password {
        return Ok(Some(password.clone()));
    }

    if let Some(name) = &args.password_env {
        let password =
            env::var(name).with_context(|| format!("環境変数 {name} が見つかりません"))?;
        return Ok(Some(password));
    }

    Ok(config
        .default_password_env
        .as_deref()
        .and_then(|name| env::var(name).ok()))
}

fn chunk_progress_bar() -> Result<ProgressBar> {
    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} チャンク")
            .context("プログレスバーの設定に失敗")?
            .progress_chars("#>-"),
    );
    Ok(progress)
}
