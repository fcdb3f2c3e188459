use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Engine, MoneyCents};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub username: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "divvy_admin")]
#[command(about = "Admin utilities for Divvy (bootstrap users/categories/buckets)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./divvy.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run pending migrations and exit.
    Migrate,
    User(User),
    Category(Category),
    Budget(Budget),
    Goal(Goal),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Budget {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    Create(BudgetCreateArgs),
}

#[derive(Args, Debug)]
struct BudgetCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    /// Budget total, e.g. "250.00".
    #[arg(long, value_parser = parse_money)]
    total: MoneyCents,
}

#[derive(Args, Debug)]
struct Goal {
    #[command(subcommand)]
    command: GoalCommand,
}

#[derive(Subcommand, Debug)]
enum GoalCommand {
    Create(GoalCreateArgs),
}

#[derive(Args, Debug)]
struct GoalCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    /// Goal target, e.g. "1500.00".
    #[arg(long, value_parser = parse_money)]
    target: MoneyCents,
    /// Optional RFC 3339 deadline, e.g. "2026-12-31T00:00:00Z".
    #[arg(long, value_parser = parse_deadline)]
    deadline: Option<DateTime<Utc>>,
}

fn parse_money(raw: &str) -> Result<MoneyCents, String> {
    raw.parse::<MoneyCents>().map_err(|err| err.to_string())
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| err.to_string())
}

async fn connect(database_url: &str) -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "divvy_admin=info,engine=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let db = connect(&cli.database_url).await?;

    match cli.command {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::User(user) => match user.command {
            UserCommand::Create(args) => {
                let model = users::ActiveModel {
                    id: Set(args.id.clone()),
                    username: Set(args.username),
                };
                users::Entity::insert(model).exec(&db).await?;
                println!("created user {}", args.id);
            }
        },
        Command::Category(category) => match category.command {
            CategoryCommand::Create(args) => {
                let engine = Engine::builder().database(db.clone()).build();
                let id = engine.new_category(&args.name).await?;
                println!("created category {id}");
            }
        },
        Command::Budget(budget) => match budget.command {
            BudgetCommand::Create(args) => {
                let engine = Engine::builder().database(db.clone()).build();
                let budget = engine
                    .new_budget(&args.name, args.total.cents(), None, &args.owner)
                    .await?;
                println!("created budget {} ({})", budget.id, args.total);
            }
        },
        Command::Goal(goal) => match goal.command {
            GoalCommand::Create(args) => {
                let engine = Engine::builder().database(db.clone()).build();
                let goal = engine
                    .new_savings_goal(&args.name, args.target.cents(), args.deadline, &args.owner)
                    .await?;
                println!("created savings goal {} ({})", goal.id, args.target);
            }
        },
    }

    Ok(())
}
