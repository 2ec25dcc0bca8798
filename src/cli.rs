use clap::{Args, Parser, Subcommand};
use petcare_common::{ClientStatus, EntityId, PetStatus};

#[derive(Parser)]
#[command(name = "petcare")]
#[command(about = "ペットケア施設 管理ダッシュボード CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ログイン（パスワードは対話入力）
    Login {
        /// メールアドレス（省略時は対話入力）
        #[arg(short, long)]
        email: Option<String>,
    },

    /// 管理者アカウントを登録
    Register,

    /// ログアウト
    Logout,

    /// ログイン中のユーザーを表示
    Whoami,

    /// 飼い主の管理
    Clients {
        #[command(subcommand)]
        action: ClientCommand,
    },

    /// ペットの管理
    Pets {
        #[command(subcommand)]
        action: PetCommand,
    },

    /// 品種リストを表示（キャッシュ有効）
    Breeds {
        /// 種類 (dog/cat など)
        #[arg(required = true)]
        species: String,

        /// キャッシュを破棄して取り直す
        #[arg(long)]
        refresh: bool,
    },

    /// 設定管理
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 一覧表示のオプション
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// ページ番号
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// 1ページの件数（検索中は10件固定）
    #[arg(long)]
    pub per_page: Option<u32>,

    /// 検索語（全件を取得して絞り込む）
    #[arg(short, long)]
    pub search: Option<String>,

    /// 並べ替えるカラム
    #[arg(long)]
    pub sort: Option<String>,

    /// 降順で並べ替える
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

#[derive(Subcommand)]
pub enum ClientCommand {
    /// 一覧
    List(ListArgs),

    /// 詳細
    Show { id: EntityId },

    /// 新規登録
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: Option<String>,
        /// 状態 (active/inactive)
        #[arg(long, default_value = "active")]
        status: ClientStatus,
    },

    /// 更新（指定した項目のみ）
    Update {
        id: EntityId,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// 住所を消す
        #[arg(long, conflicts_with = "address")]
        clear_address: bool,
        #[arg(long)]
        status: Option<ClientStatus>,
    },

    /// 削除
    Delete {
        id: EntityId,
        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PetCommand {
    /// 一覧
    List(ListArgs),

    /// 詳細（ワクチン記録を含む）
    Show { id: EntityId },

    /// 新規登録
    Create {
        /// 飼い主ID
        #[arg(long)]
        client_id: EntityId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        species: String,
        #[arg(long)]
        breed: Option<String>,
        /// 生年月日 (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<chrono::NaiveDate>,
        /// 体重 (kg)
        #[arg(long)]
        weight: Option<f64>,
        /// 状態 (active/deceased/transferred)
        #[arg(long, default_value = "active")]
        status: PetStatus,
    },

    /// 更新（指定した項目のみ）
    Update {
        id: EntityId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, conflicts_with = "breed")]
        clear_breed: bool,
        #[arg(long)]
        birth_date: Option<chrono::NaiveDate>,
        #[arg(long, conflicts_with = "birth_date")]
        clear_birth_date: bool,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long, conflicts_with = "weight")]
        clear_weight: bool,
        #[arg(long)]
        status: Option<PetStatus>,
    },

    /// 削除
    Delete {
        id: EntityId,
        #[arg(short, long)]
        yes: bool,
    },
}
