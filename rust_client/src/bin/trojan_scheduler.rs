//! Trojan Scheduler command-line client
//!
//! # Usage
//!
//! ```bash
//! trojan-scheduler login tommy --password fight-on
//! trojan-scheduler add-course csci-356
//! trojan-scheduler submit --name "Fall plan"
//! ```
//!
//! # Environment Variables
//!
//! - `TROJAN_CONFIG`: configuration file (default: ./trojan.toml)
//! - `TROJAN_PASSWORD`: password for `login` and `signup` when not given as a flag
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trojan_scheduler::api::format::default_formatter;
use trojan_scheduler::api::payloads::{ItemUpdate, ProfileUpdate, ScheduleFilter};
use trojan_scheduler::coursebin::course_code::{self, CourseCodeCheck};
use trojan_scheduler::models::preferences::parse_clock;
use trojan_scheduler::models::{Node, PreferenceEdit, ReservedSlot, SettingEdit};
use trojan_scheduler::naming::{schedule_name, task_name};
use trojan_scheduler::services::{account, coursebin, tasks};
use trojan_scheduler::{
    Action, ClientConfig, ClientError, ReqwestTransport, SchedulerClient, StoreHandle,
};

#[derive(Parser)]
#[command(name = "trojan-scheduler", version, about = "Build a coursebin and generate class schedules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        username: String,
        #[arg(long, env = "TROJAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        username: String,
        #[arg(long, env = "TROJAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Change profile fields
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long, requires = "old_password")]
        new_password: Option<String>,
        #[arg(long)]
        old_password: Option<String>,
    },
    /// Send a new email verification link
    RequestEmailToken,
    VerifyEmail { token: String },
    ForgetPassword { email: String },
    ResetPassword {
        token: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },

    /// Fetch a course into the coursebin
    AddCourse {
        course: String,
        #[arg(long)]
        term: Option<String>,
    },
    /// Refetch courses older than the configured lifetime
    Refresh,
    /// Print the coursebin
    Courses,
    /// Include or exclude a node
    Toggle { node_id: String },
    /// Toggle the penalty exemption of a node
    Penalize { node_id: String },
    /// Set the penalty exemption of a node and everything under it
    Exempt {
        node_id: String,
        #[arg(long)]
        off: bool,
    },
    Remove { course: String },
    IncludeAll,
    ExcludeAll,
    Group {
        node_id: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: u32,
    },
    ResetGroups,
    CompactGroups,
    /// Re-apply the clearance and exemption selectors from the settings
    Filter,
    /// Check how a course code is spelled
    CheckCourse { code: String },

    /// Change a preference, e.g. `pref early_time 09:30`
    Pref { name: String, value: String },
    /// Keep a time window free
    Reserve {
        from: String,
        to: String,
        #[arg(long, default_value = "01:00")]
        wiggle: String,
        #[arg(long, default_value_t = 50)]
        weight: u32,
    },
    Unreserve { keys: Vec<String> },
    /// Change a setting, e.g. `set excludeClosed true`
    Set { name: String, value: String },

    /// Upload the coursebin, preferences and settings to the account
    Save,
    /// Restore the coursebin, preferences and settings from the account
    Load,
    /// Restore the inputs a task (or with --schedule, a schedule) was
    /// generated from
    LoadRequest {
        id: i64,
        #[arg(long)]
        schedule: bool,
    },

    /// Generate schedules from the coursebin
    Submit {
        #[arg(long)]
        name: Option<String>,
    },
    /// Keep waiting on an unfinished task
    Resume,
    Tasks {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Task { id: i64 },
    DeleteTask { id: i64 },
    Schedules {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        saved: bool,
        #[arg(long)]
        public: bool,
    },
    Schedule { id: i64 },
    /// Update a schedule's name, description or flags
    EditSchedule {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        saved: Option<bool>,
        #[arg(long)]
        public: Option<bool>,
    },
    DeleteSchedule { id: i64 },
}

fn print_coursebin(nodes: &[Node]) {
    if nodes.is_empty() {
        println!("The coursebin is empty.");
        return;
    }
    for node in nodes {
        let flags = format!(
            "{}{}",
            if node.exclude() { " [excluded]" } else { "" },
            if node.exempt() { " [exempt]" } else { "" }
        );
        match node {
            Node::Course(c) => println!(
                "{} ({}) group {}{}",
                c.course.to_uppercase(),
                c.node_id,
                c.group.map(|g| g.to_string()).unwrap_or_else(|| "-".into()),
                flags
            ),
            Node::Part(p) => println!("  part {} ({}){}", p.part, p.node_id, flags),
            Node::Component(c) => println!("    {} ({}){}", c.component, c.node_id, flags),
            Node::Section(s) => println!(
                "      {} {} {}-{} {}{}{}",
                s.data.section_id,
                s.data.days.as_deref().unwrap_or("TBA"),
                s.data.start.as_deref().unwrap_or(""),
                s.data.end.as_deref().unwrap_or(""),
                s.data.instructor.as_deref().unwrap_or(""),
                if s.data.closed { " [closed]" } else { "" },
                flags
            ),
        }
    }
}

async fn run(command: Command, client: &SchedulerClient, config: &ClientConfig) -> anyhow::Result<()> {
    let store = client.store();
    match command {
        Command::Login { username, password } => {
            let profile = account::login(client, &username, &password).await?;
            println!("Signed in as {}", profile.name());
        }
        Command::Signup { username, password } => {
            let profile = account::signup(client, &username, &password).await?;
            println!("Welcome, {}", profile.name());
        }
        Command::Logout => account::logout(client).await,
        Command::Whoami => match store.read(|s| s.user.profile.clone()) {
            Some(profile) => println!(
                "{} <{}>",
                profile.name(),
                profile.email.as_deref().unwrap_or("no email")
            ),
            None => bail!(ClientError::NotLoggedIn),
        },
        Command::Profile {
            email,
            display_name,
            new_password,
            old_password,
        } => {
            let update = ProfileUpdate {
                email,
                display_name,
                password: new_password,
                old_password,
            };
            account::update_profile(client, &update).await?;
            println!("Profile updated");
        }
        Command::RequestEmailToken => {
            account::request_email_token(client).await?;
            println!("Verification email sent");
        }
        Command::VerifyEmail { token } => {
            account::verify_email(client, &token).await?;
            println!("Email verified");
        }
        Command::ForgetPassword { email } => {
            account::forget_password(client, &email).await?;
            println!("If the address is registered, a reset link is on its way");
        }
        Command::ResetPassword {
            token,
            password,
            confirm,
        } => {
            account::reset_password(client, &token, &password, &confirm).await?;
            println!("Password reset");
        }

        Command::AddCourse { course, term } => {
            if let Some(suggestion) = course_code::suggest(&course) {
                println!("Did you mean {}?", suggestion);
            }
            let term = term.unwrap_or_else(|| config.coursebin.default_term.clone());
            let payload = coursebin::fetch_course(client, &term, &course).await?;
            println!("Added {} ({} sections)", payload.name.to_uppercase(), payload.sections.len());
        }
        Command::Refresh => {
            let report =
                coursebin::refresh_stale(client, config.course_lifetime(), Utc::now()).await;
            println!("Refreshed {} course(s)", report.refreshed.len());
            for (course, err) in &report.failed {
                println!("Cannot load {}: {}", course.to_uppercase(), default_formatter().format(err));
            }
            if !report.is_complete() {
                bail!("{} course(s) could not be refreshed", report.failed.len());
            }
        }
        Command::Courses => store.read(|s| print_coursebin(&s.course)),
        Command::Toggle { node_id } => store.dispatch(Action::ToggleCourseInclude(node_id)),
        Command::Penalize { node_id } => store.dispatch(Action::ToggleCoursePenalize(node_id)),
        Command::Exempt { node_id, off } => store.dispatch(Action::RecursiveSetPenalize {
            node_id,
            exempt: !off,
        }),
        Command::Remove { course } => store.dispatch(Action::DeleteCourse(course)),
        Command::IncludeAll => store.dispatch(Action::SetIncludeCourse(true)),
        Command::ExcludeAll => store.dispatch(Action::SetIncludeCourse(false)),
        Command::Group { node_id, group } => {
            store.dispatch(Action::SetGroupCourse { node_id, group })
        }
        Command::ResetGroups => store.dispatch(Action::ResetCourseGroup),
        Command::CompactGroups => store.dispatch(Action::StartGroupFromOne),
        Command::Filter => coursebin::apply_filters(store),
        Command::CheckCourse { code } => match course_code::check(&code) {
            CourseCodeCheck::Empty => println!("Type a course code such as CSCI-356"),
            CourseCodeCheck::Canonical => println!("{} looks right", code),
            CourseCodeCheck::Suggest(s) => println!("Did you mean {}?", s),
            CourseCodeCheck::Unrecognized => println!("{} is not a course code", code),
        },

        Command::Pref { name, value } => {
            store.dispatch(Action::EditPreferences(PreferenceEdit::parse(&name, &value)?))
        }
        Command::Reserve {
            from,
            to,
            wiggle,
            weight,
        } => {
            let clock = |t: &str| parse_clock(t).map_err(ClientError::Validation);
            let slot = ReservedSlot::new(clock(&from)?, clock(&to)?, clock(&wiggle)?, weight)?;
            println!("Reserved {}-{} as {}", from, to, slot.key);
            store.dispatch(Action::AddReservedSlot(slot));
        }
        Command::Unreserve { keys } => store.dispatch(Action::RemoveReservedSlot(keys)),
        Command::Set { name, value } => {
            store.dispatch(Action::EditSetting(SettingEdit::parse(&name, &value)?))
        }

        Command::Save => {
            coursebin::save_task_data(client).await?;
            println!("Settings saved");
        }
        Command::Load => {
            coursebin::load_saved_task_data(client).await?;
            println!("Settings loaded");
        }
        Command::LoadRequest { id, schedule } => {
            let (kind, data_id) = if schedule {
                ("schedule", coursebin::load_schedule_inputs(client, id).await?)
            } else {
                ("task", coursebin::load_task_inputs(client, id).await?)
            };
            println!("Loaded the inputs of {} {} (task data {})", kind, id, data_id);
        }

        Command::Submit { name } => {
            let outcome = tasks::submit(client, name.as_deref()).await?;
            println!("{}: {}", task_name(Some(outcome.task()), None), outcome.message());
        }
        Command::Resume => match tasks::resume(client).await? {
            Some(outcome) => {
                println!("{}: {}", task_name(Some(outcome.task()), None), outcome.message())
            }
            None => println!("No task in progress"),
        },
        Command::Tasks { page } => {
            let tasks = client.list_tasks(page).await?;
            println!("{} task(s)", tasks.count);
            for task in &tasks.results {
                println!(
                    "{:>6}  {}  {}  {}",
                    task.id,
                    task.status.code(),
                    task_name(Some(task), None),
                    task.description.as_deref().unwrap_or("")
                );
            }
        }
        Command::Task { id } => {
            let task = client.get_task(id).await?;
            println!("{}: {}", task_name(Some(&task), Some(id)), task.status_message());
            for schedule in task.sorted_schedules() {
                println!(
                    "  {:>6}  {}  score {:.2}",
                    schedule.id,
                    schedule_name(Some(schedule), None),
                    schedule.total_score.unwrap_or_default()
                );
            }
        }
        Command::DeleteTask { id } => client.delete_task(id).await?,
        Command::Schedules { page, saved, public } => {
            let filter = ScheduleFilter {
                page,
                saved_only: saved,
                public_only: public,
            };
            let schedules = client.list_schedules(filter).await?;
            println!("{} schedule(s)", schedules.count);
            let now = Utc::now();
            for schedule in &schedules.results {
                let warning = match schedule.expiry_warning(now) {
                    Some(w) => format!("  ({:?})", w),
                    None => String::new(),
                };
                println!(
                    "{:>6}  {}{}",
                    schedule.id,
                    schedule_name(Some(schedule), None),
                    warning
                );
            }
        }
        Command::Schedule { id } => {
            let schedule = client.get_schedule(id).await?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        Command::EditSchedule {
            id,
            name,
            description,
            saved,
            public,
        } => {
            let update = ItemUpdate {
                name,
                description,
                saved,
                public,
            };
            let schedule = client.update_schedule(id, &update).await?;
            println!("Updated {}", schedule_name(Some(&schedule), Some(id)));
        }
        Command::DeleteSchedule { id } => client.delete_schedule(id).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load().context("Failed to load configuration")?;
    info!("Using backend {}", config.server.base_url);

    let store = StoreHandle::open(&config.storage.state_path);
    let transport = ReqwestTransport::new().context("Failed to create HTTP client")?;
    let client = SchedulerClient::new(&config, Arc::new(transport), store);

    let cancel = client.cancel_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    if let Err(err) = run(cli.command, &client, &config).await {
        if let Some(client_err) = err.downcast_ref::<ClientError>() {
            bail!("{}", default_formatter().format(client_err));
        }
        return Err(err);
    }
    Ok(())
}
