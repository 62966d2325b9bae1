//! Lablane CLI
//!
//! Entry point for the `lablane` command-line tool. The acting identity
//! (admin, branch, or lab) and the data-file path come from `lablane.toml`;
//! every subcommand runs as that identity against the shared snapshot file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lablane::config::{Config, DataConfig, Identity, DEFAULT_CONFIG_PATH};
use lablane::watch::{FileWatcher, WatcherConfig};
use lablane::{
    Actor, BulkTransitionReport, FileStore, Job, JobDraft, JobStatus, JobStore, NewAccount,
    Priority, Role, Tracker,
};

#[derive(Parser)]
#[command(name = "lablane")]
#[command(about = "Optical-lab order tracking", version)]
struct Cli {
    /// Path to config file (default: lablane.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config, the data file, and the admin account
    Init {
        /// Admin username
        #[arg(long)]
        admin: String,

        /// Admin password
        #[arg(long)]
        password: String,

        /// Data file path
        #[arg(long, default_value = "lablane-data.json")]
        data: PathBuf,
    },

    /// Job management commands
    Job {
        #[command(subcommand)]
        action: JobCommands,
    },

    /// Account management commands (admin identity required)
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Announcement commands
    Announce {
        #[command(subcommand)]
        action: AnnounceCommands,
    },

    /// Watch the data file and report changes until Ctrl-C
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Open a new job
    Create {
        /// Job number
        id: String,

        /// Work description
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Branch id (defaults to the acting identity's branch)
        #[arg(long)]
        branch_id: Option<String>,

        /// Branch display name (defaults to the acting identity's branch)
        #[arg(long)]
        branch_name: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List jobs visible to the acting identity
    List {
        /// Show finished jobs instead of the active board
        #[arg(long)]
        historical: bool,

        /// Filter by a case-insensitive search term
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one job
    Show {
        /// Job number
        id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the status history of one job
    History {
        /// Job number
        id: String,
    },

    /// Transition one job to a new status
    SetStatus {
        /// Job number
        id: String,

        /// Target status (e.g. sent-to-lab)
        status: JobStatus,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Transition many jobs, reporting per-job outcomes
    BulkSetStatus {
        /// Target status
        status: JobStatus,

        /// Job numbers
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Set priority and message on one job
    SetPriority {
        /// Job number
        id: String,

        /// Priority (normal, urgent, repetition)
        priority: Priority,

        /// Annotation shown with a non-normal priority
        #[arg(long, short = 'm', default_value = "")]
        message: String,
    },

    /// Delete a job (admin identity required)
    Delete {
        /// Job number
        id: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create an account
    Add {
        /// Username
        username: String,

        /// Initial password
        #[arg(long)]
        password: String,

        /// Role (admin, branch, lab)
        #[arg(long)]
        role: Role,

        /// Branch id, for branch accounts
        #[arg(long)]
        branch_id: Option<String>,

        /// Branch display name, for branch accounts
        #[arg(long)]
        branch_name: Option<String>,
    },

    /// Replace a password
    Passwd {
        /// Username
        username: String,

        /// New password
        #[arg(long)]
        password: String,
    },

    /// Delete an account
    Remove {
        /// Username
        username: String,
    },

    /// List accounts
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AnnounceCommands {
    /// Post an announcement
    Post {
        /// Notice text
        message: String,
    },

    /// List announcements, newest first
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete an announcement
    Remove {
        /// Announcement id
        id: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    match cli.command {
        Commands::Init {
            admin,
            password,
            data,
        } => cmd_init(&config_path, &admin, &password, data),

        command => {
            let config = Config::load(&config_path)?;
            let store = Arc::new(FileStore::open(&config.data.path)?);
            let tracker = Tracker::new(store);

            match command {
                Commands::Init { .. } => unreachable!("handled above"),
                Commands::Job { action } => cmd_job(&tracker, &config, action),
                Commands::User { action } => cmd_user(&tracker, &config.actor(), action),
                Commands::Announce { action } => cmd_announce(&tracker, &config.actor(), action),
                Commands::Watch { interval } => cmd_watch(&config, interval),
            }
        }
    }
}

fn cmd_init(
    config_path: &std::path::Path,
    admin: &str,
    password: &str,
    data: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() {
        return Err(format!("config already exists: {}", config_path.display()).into());
    }

    let config = Config {
        identity: Identity {
            username: admin.to_string(),
            role: Role::Admin,
            branch_id: None,
            branch_name: None,
        },
        data: DataConfig { path: data },
    };

    let store = Arc::new(FileStore::open(&config.data.path)?);
    let tracker = Tracker::new(store);
    let actor = config.actor();
    tracker.create_account(
        NewAccount {
            username: admin.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            branch_id: None,
            branch_name: None,
        },
        &actor,
    )?;
    config.save(config_path)?;

    println!("initialized {}", config_path.display());
    println!("data file: {}", config.data.path.display());
    Ok(())
}

fn cmd_job<S: lablane::Store>(
    tracker: &Tracker<S>,
    config: &Config,
    action: JobCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let actor = &config.actor();
    match action {
        JobCommands::Create {
            id,
            description,
            branch_id,
            branch_name,
            json,
        } => {
            let branch_id = branch_id
                .or_else(|| config.identity.branch_id.clone())
                .unwrap_or_default();
            let branch_name = branch_name
                .or_else(|| config.identity.branch_name.clone())
                .unwrap_or_default();
            let job = tracker.create_job(
                JobDraft {
                    id,
                    description,
                    branch_id,
                    branch_name,
                },
                actor,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                println!("created job {} ({})", job.id, job.status);
            }
        }

        JobCommands::List {
            historical,
            search,
            json,
        } => {
            let jobs = match (&search, historical) {
                (Some(term), _) => tracker.search(actor, term)?,
                (None, true) => tracker.historical(actor)?,
                (None, false) => tracker.jobs(actor)?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else {
                print_job_lines(&jobs);
            }
        }

        JobCommands::Show { id, json } => {
            let job = tracker.job(actor, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                print_job(&job);
            }
        }

        JobCommands::History { id } => {
            let job = tracker.job(actor, &id)?;
            for entry in job.history.iter() {
                println!(
                    "{}  {}  by {}",
                    entry.timestamp.to_rfc3339(),
                    entry.status,
                    entry.updated_by
                );
            }
        }

        JobCommands::SetStatus { id, status, json } => {
            let job = tracker.transition(&id, status, actor)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                println!("job {} → {}", job.id, job.status);
            }
        }

        JobCommands::BulkSetStatus { status, ids, json } => {
            let report = tracker.bulk_transition(&ids, status, actor);
            print_bulk_report(&report, json)?;
        }

        JobCommands::SetPriority {
            id,
            priority,
            message,
        } => {
            let job = tracker.set_priority(&id, priority, &message, actor)?;
            if job.priority_message.is_empty() {
                println!("job {}: priority {}", job.id, job.priority);
            } else {
                println!(
                    "job {}: priority {} ({})",
                    job.id, job.priority, job.priority_message
                );
            }
        }

        JobCommands::Delete { id } => {
            tracker.delete_job(&id, actor)?;
            println!("deleted job {id}");
        }
    }
    Ok(())
}

fn cmd_user<S: lablane::Store>(
    tracker: &Tracker<S>,
    actor: &Actor,
    action: UserCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserCommands::Add {
            username,
            password,
            role,
            branch_id,
            branch_name,
        } => {
            let user = tracker.create_account(
                NewAccount {
                    username,
                    password,
                    role,
                    branch_id,
                    branch_name,
                },
                actor,
            )?;
            println!("created {} account '{}'", user.role, user.username);
        }

        UserCommands::Passwd { username, password } => {
            tracker.update_password(&username, &password, actor)?;
            println!("password updated for '{username}'");
        }

        UserCommands::Remove { username } => {
            tracker.delete_account(&username, actor)?;
            println!("deleted account '{username}'");
        }

        UserCommands::List { json } => {
            let users = tracker.users(actor)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                for user in users {
                    let role = user.role.to_string();
                    match user.branch_name {
                        Some(branch) => {
                            println!("{:<20} {:<8} {}", user.username, role, branch)
                        }
                        None => println!("{:<20} {}", user.username, role),
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_announce<S: lablane::Store>(
    tracker: &Tracker<S>,
    actor: &Actor,
    action: AnnounceCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AnnounceCommands::Post { message } => {
            let announcement = tracker.post_announcement(&message, actor)?;
            println!("posted announcement {}", announcement.id);
        }

        AnnounceCommands::List { json } => {
            let list = tracker.announcements()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for a in list {
                    println!("{}  [{}]  {}", a.created_at.to_rfc3339(), a.id, a.message);
                }
            }
        }

        AnnounceCommands::Remove { id } => {
            tracker.delete_announcement(&id, actor)?;
            println!("deleted announcement {id}");
        }
    }
    Ok(())
}

fn cmd_watch(config: &Config, interval: u64) -> Result<(), Box<dyn std::error::Error>> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_flag.store(true, Ordering::SeqCst))?;

    let path = config.data.path.clone();
    let mut watcher = FileWatcher::new(
        &path,
        WatcherConfig {
            poll_interval: Duration::from_secs(interval.max(1)),
        },
    );

    println!("watching {} (ctrl-c to stop)", path.display());
    watcher.run_until(&stop, || match FileStore::open(&path) {
        Ok(store) => match store.fetch_jobs() {
            Ok(jobs) => {
                let active = jobs.iter().filter(|j| !j.is_historical()).count();
                println!(
                    "jobs changed: {} total, {} active, {} historical",
                    jobs.len(),
                    active,
                    jobs.len() - active
                );
            }
            Err(e) => eprintln!("re-fetch failed: {e}"),
        },
        Err(e) => eprintln!("re-open failed: {e}"),
    });

    Ok(())
}

fn print_job(job: &Job) {
    println!("job {}", job.id);
    println!("  branch:   {} ({})", job.branch_name, job.branch_id);
    println!("  status:   {}", job.status);
    if job.priority_message.is_empty() {
        println!("  priority: {}", job.priority);
    } else {
        println!("  priority: {} ({})", job.priority, job.priority_message);
    }
    if !job.description.is_empty() {
        println!("  work:     {}", job.description);
    }
    println!("  created:  {}", job.created_at.to_rfc3339());
    println!("  updated:  {}", job.updated_at.to_rfc3339());
}

fn print_job_lines(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("no jobs");
        return;
    }
    for job in jobs {
        let flag = match job.priority {
            Priority::Normal => "",
            Priority::Urgent => " [URGENT]",
            Priority::Repetition => " [REPETITION]",
        };
        println!(
            "{:<12} {:<18} {:<16} {}{}",
            job.id,
            job.status.to_string(),
            job.branch_name,
            job.description,
            flag
        );
    }
}

fn print_bulk_report(
    report: &BulkTransitionReport,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let value = serde_json::json!({
            "outcome": format!("{:?}", report.outcome()),
            "applied": report.applied.iter().map(|j| j.id.clone()).collect::<Vec<_>>(),
            "rejected": report
                .rejected
                .iter()
                .map(|r| serde_json::json!({"id": r.job_id, "reason": r.error.to_string()}))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", report.summary());
        for rejection in &report.rejected {
            eprintln!("  {}: {}", rejection.job_id, rejection.error);
        }
    }
    Ok(())
}
