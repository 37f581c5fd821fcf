use clap::{Parser, Subcommand};
use kalog::error::{AppError, AppResult, run_with_error_handler};
use kalog::model::entity::{
    ExerciseLog, ExerciseLogCreate, FacilityUser, FacilityUserCreateUpdate, SettingValue,
    Settings, VideoFile, VideoFileCreate, VideoLog, VideoLogCreate,
};
use kalog::model::{CrudRepository, ModelManager, PaginatableRepository, sync};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for learner progress logs, the video queue and settings", long_about = None)]
pub struct Cli {
    /// Read ./config.toml instead of the per-user config
    #[arg(long, global = true, default_value_t = false)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage facility users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Video watch progress
    Video {
        #[command(subcommand)]
        action: VideoCommands,
    },

    /// Exercise mastery progress
    Exercise {
        #[command(subcommand)]
        action: ExerciseCommands,
    },

    /// Total points of a user across videos and exercises
    Points {
        #[arg(long)]
        user: String,
    },

    /// Typed key/value settings
    Setting {
        #[command(subcommand)]
        action: SettingCommands,
    },

    /// Video download queue
    File {
        #[command(subcommand)]
        action: FileCommands,
    },

    /// Record kinds taking part in sync
    SyncModels,
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
    },
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum VideoCommands {
    /// Report playback progress for a user
    Report {
        /// Username or user id
        #[arg(long)]
        user: String,
        #[arg(long)]
        youtube_id: String,
        #[arg(long)]
        seconds_watched: i64,
        #[arg(long, default_value_t = 0)]
        points: i64,
        #[arg(long, default_value_t = false)]
        complete: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExerciseCommands {
    /// Report exercise progress for a user
    Report {
        /// Username or user id
        #[arg(long)]
        user: String,
        #[arg(long)]
        exercise_id: String,
        #[arg(long)]
        streak_progress: i64,
        #[arg(long)]
        attempts: i64,
        #[arg(long, default_value_t = 0)]
        points: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingCommands {
    Get {
        #[arg(long)]
        name: String,
    },
    /// Store a value; integers and floats keep their type
    Set {
        #[arg(long)]
        name: String,
        #[arg(long)]
        value: String,
        /// Store the value as text even if it looks numeric
        #[arg(long, default_value_t = false)]
        text: bool,
    },
    Delete {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    Add {
        #[arg(long)]
        youtube_id: String,
        #[arg(long, default_value_t = 0)]
        priority: i64,
        #[arg(long, default_value_t = false)]
        flag: bool,
    },
    /// Flag or unflag a video for download
    Flag {
        #[arg(long)]
        youtube_id: String,
        #[arg(long, default_value_t = false)]
        unset: bool,
    },
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Only videos flagged for download
        #[arg(long, default_value_t = false)]
        flagged: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{}", out);
    Ok(())
}

async fn resolve_user(mm: &ModelManager, user: &str) -> AppResult<FacilityUser> {
    let found = match user.parse::<Uuid>() {
        Ok(id) => FacilityUser::find_by_id(mm, id).await?,
        Err(_) => FacilityUser::find_by_username(mm, user).await?,
    };

    found.ok_or_else(|| AppError::NotFound(format!("user `{}`", user)))
}

async fn execute(args: &Cli) -> AppResult<()> {
    let mm = kalog::build_model_manager(args.local).await?;

    match &args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username } => {
                let user = FacilityUser::create(
                    &mm,
                    FacilityUserCreateUpdate {
                        username: username.clone(),
                    },
                )
                .await?;
                print_json(&user)?;
            }
            UserCommands::List { limit, offset } => {
                let page = FacilityUser::page(&mm, *limit, *offset).await?;
                print_json(&page)?;
            }
        },

        Commands::Video { action } => match action {
            VideoCommands::Report {
                user,
                youtube_id,
                seconds_watched,
                points,
                complete,
            } => {
                let user = resolve_user(&mm, user).await?;
                let log = VideoLog::save(
                    &mm,
                    VideoLogCreate {
                        user_id: Some(user.id()),
                        youtube_id: youtube_id.clone(),
                        total_seconds_watched: *seconds_watched,
                        points: *points,
                        complete: *complete,
                    },
                )
                .await?;
                print_json(&log)?;
            }
        },

        Commands::Exercise { action } => match action {
            ExerciseCommands::Report {
                user,
                exercise_id,
                streak_progress,
                attempts,
                points,
            } => {
                let user = resolve_user(&mm, user).await?;
                let log = ExerciseLog::save(
                    &mm,
                    ExerciseLogCreate {
                        user_id: Some(user.id()),
                        exercise_id: exercise_id.clone(),
                        streak_progress: *streak_progress,
                        attempts: *attempts,
                        points: *points,
                    },
                )
                .await?;
                tracing::debug!("exercise status: {:?}", log.status());
                print_json(&log)?;
            }
        },

        Commands::Points { user } => {
            let user = resolve_user(&mm, user).await?;
            let (videos, exercises) = tokio::try_join!(
                VideoLog::get_points_for_user(&mm, user.id()),
                ExerciseLog::get_points_for_user(&mm, user.id()),
            )?;
            print_json(&serde_json::json!({
                "username": user.username(),
                "video_points": videos,
                "exercise_points": exercises,
                "total": videos + exercises,
            }))?;
        }

        Commands::Setting { action } => match action {
            SettingCommands::Get { name } => {
                println!("{}", Settings::get(&mm, name).await?);
            }
            SettingCommands::Set { name, value, text } => {
                let value = if *text {
                    SettingValue::Text(value.clone())
                } else {
                    SettingValue::infer(value)
                };
                let setting = Settings::set(&mm, name, value).await?;
                print_json(&setting)?;
            }
            SettingCommands::Delete { name } => {
                if !Settings::delete(&mm, name).await? {
                    return Err(AppError::NotFound(format!("setting `{}`", name)));
                }
            }
        },

        Commands::File { action } => match action {
            FileCommands::Add {
                youtube_id,
                priority,
                flag,
            } => {
                let file = VideoFile::create(
                    &mm,
                    VideoFileCreate {
                        priority: *priority,
                        flagged_for_download: *flag,
                        ..VideoFileCreate::new(youtube_id.clone())
                    },
                )
                .await?;
                print_json(&file)?;
            }
            FileCommands::Flag { youtube_id, unset } => {
                let file = VideoFile::find_by_id(&mm, youtube_id.clone())
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("video file `{}`", youtube_id)))?;

                let data = VideoFileCreate {
                    flagged_for_download: !*unset,
                    ..VideoFileCreate::from(file.clone())
                };
                let file = file.update(&mm, data).await?;
                print_json(&file)?;
            }
            FileCommands::List {
                limit,
                offset,
                flagged,
            } => {
                if *flagged {
                    print_json(&VideoFile::list_flagged(&mm).await?)?;
                } else {
                    print_json(&VideoFile::page(&mm, *limit, *offset).await?)?;
                }
            }
        },

        Commands::SyncModels => {
            for model in sync::syncing_models() {
                println!("{}", model);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    kalog::setup_trace();
    let args = Cli::parse();

    run_with_error_handler(async || execute(&args).await).await;
}
