use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

/// 暗号化前のチャンクサイズ（50KB）
pub const DEFAULT_CHUNK_SIZE: usize = 50 * 1024;
/// 大きなファイルとして警告するサイズ（5MB）
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// 設定ファイルの構造
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,
    /// 詳細出力をデフォルトで有効にするか
    pub default_verbose: bool,
    /// 暗号化前のチャンクサイズ（文字数）
    pub chunk_size: usize,
    /// これを超える画像は警告を出した上で処理する（バイト）
    pub large_file_threshold: u64,
    /// ベースシークレットを読み込む環境変数名
    pub base_secret_env: String,
    /// デフォルトのパスワード環境変数名
    pub default_password_env: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "3.0".to_string(),
            default_verbose: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            base_secret_env: "IMAGE_TEXT_SECRET".to_string(),
            default_password_env: Some("IMAGE_TEXT_PASSWORD".to_string()),
        }
    }
}

impl Config {
    /// ベースシークレットを環境変数から読み込む
    pub fn load_base_secret(&self) -> Result<BaseSecret> {
        let value = env::var(&self.base_secret_env).with_context(|| {
            format!(
                "環境変数 {} からベースシークレットを読み込めません",
                self.base_secret_env
            )
        })?;
        BaseSecret::new(value)
    }

    /// 設定値の妥当性チェック
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(anyhow!("chunk_size は1以上である必要があります"));
        }
        if self.large_file_threshold == 0 {
            return Err(anyhow!("large_file_threshold は1以上である必要があります"));
        }
        Ok(())
    }
}

/// プロセス全体で共有する固定のベースシークレット
///
/// 起動時に一度だけ読み込み、以後は変更しない。ログには出力しない。
#[derive(Clone, PartialEq, Eq)]
pub struct BaseSecret(String);

impl BaseSecret {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(anyhow!("ベースシークレットが空です"));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BaseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BaseSecret(***)")
    }
}

/// 設定ファイルを読み込み
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_default_config_path()?,
    };

    if !path.exists() {
        log::debug!("設定ファイルがないためデフォルト設定を使用: {}", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("設定ファイルの読み取りに失敗: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("設定ファイルの解析に失敗: {}", path.display()))?;
    config.validate()?;

    Ok(config)
}

/// デフォルトの設定ファイルパスを取得
pub fn get_default_config_path() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("設定ディレクトリが見つかりません"))?;

    Ok(config_dir.join("image-text-crypt").join("config.toml"))
}

/// 設定ファイルを作成
pub fn create_config_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("設定ディレクトリの作成に失敗: {}", parent.display()))?;
    }

    let toml_content =
        toml::to_string_pretty(&Config::default()).context("設定ファイルの生成に失敗しました")?;

    fs::write(path, toml_content)
        .with_context(|| format!("設定ファイルの書き込みに失敗: {}", path.display()))?;

    Ok(())
}

/// 設定ファイルを削除
pub fn delete_config_file(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("設定ファイルの削除に失敗: {}", path.display()))?;
    }
    Ok(())
}
