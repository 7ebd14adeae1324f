//! Mentorlink CLI - Command-line client for the mentoring platform
//!
//! Signs in, keeps the session on this device and drives the session-gated
//! features from a terminal.

use clap::{Parser, Subcommand};
use mentorlink_api::{HttpServiceClient, ImageUpload, ServiceApi};
use mentorlink_core::{
    init_logging, AccountStatus, ClientConfig, LoggingConfig, Role, Route, SignupRole,
};
use mentorlink_session::{
    CredentialSubmitter, FeatureState, FileKeyValueStore, FootprintObserver, InactiveReason,
    Navigator, Notice, NoticeBoard, NoticeKind, PosterBanner, ProfileEditor, ProviderError,
    RoleRouter, SaveOutcome, SessionContext, Submission, SubmitOutcome, UserDirectory, UserFilter,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "mentorlink")]
#[command(about = "Command-line client for the Mentorlink mentoring platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        email: String,

        #[arg(short, long)]
        password: String,

        /// student or mentor
        #[arg(long, default_value = "student")]
        role: SignupRole,
    },

    /// Exchange a Google identity token for a session
    GoogleLogin {
        /// ID token issued by Google
        token: String,
    },

    /// Sign out and remove the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show the current announcement poster
    Poster {
        /// Never show this poster again on this device
        #[arg(long)]
        dismiss: bool,

        /// Print the poster's link
        #[arg(long)]
        open: bool,
    },

    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Administer user accounts
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,

    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        bio: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Image file to upload as the profile picture
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum UsersCommand {
    List {
        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        status: Option<AccountStatus>,

        /// Match against name or email
        #[arg(short, long)]
        query: Option<String>,
    },

    SetStatus {
        id: String,
        status: AccountStatus,
    },

    Delete {
        id: String,
    },
}

/// Prints the destination view instead of rendering it
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        println!("➡️  {}", route);
    }
}

struct FootprintLog;

impl FootprintObserver for FootprintLog {
    fn footprint_changed(&self, feature: &str, footprint: u32) {
        debug!(feature, footprint, "Footprint changed");
    }
}

struct App {
    api: Arc<dyn ServiceApi>,
    session: SessionContext,
    notices: NoticeBoard,
}

impl App {
    fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let api = HttpServiceClient::new(config.api.clone().into())?;
        let backend = FileKeyValueStore::open(config.resolve_data_dir())?;
        let session = SessionContext::open(Arc::new(backend))?;

        Ok(Self {
            api: Arc::new(api),
            session,
            notices: NoticeBoard::new(),
        })
    }

    fn submitter(&self) -> CredentialSubmitter {
        CredentialSubmitter::new(
            Arc::clone(&self.api),
            self.session.clone(),
            RoleRouter::new(Arc::new(TerminalNavigator)),
            self.notices.clone(),
        )
    }

    /// Print and clear the pending notice; `true` unless it was an error
    fn flush_notice(&self) -> bool {
        let Some(notice) = self.notices.current() else {
            return true;
        };
        self.notices.clear();
        print_notice(&notice);
        notice.kind != NoticeKind::Error
    }
}

fn print_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Info => println!("ℹ️  {}", notice.message),
        NoticeKind::Success => println!("✅ {}", notice.message),
        NoticeKind::Error => eprintln!("❌ {}", notice.message),
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Mentorlink CLI v{}", env!("CARGO_PKG_VERSION"));

    let command = match cli.command {
        Commands::Config {
            show,
            init,
            validate,
        } => return handle_config(cli.config.as_deref(), show, init, validate),
        command => command,
    };

    let config = ClientConfig::load_or_default(cli.config.as_deref())?;
    let app = App::new(&config)?;

    let ok = match command {
        Commands::Login { email, password } => {
            handle_submission(&app, Submission::SignIn { email, password }).await?
        }
        Commands::Register {
            email,
            password,
            role,
        } => {
            handle_submission(
                &app,
                Submission::SignUp {
                    email,
                    password,
                    role,
                },
            )
            .await?
        }
        Commands::GoogleLogin { token } => handle_google_login(&app, token).await?,
        Commands::Logout => {
            app.session.logout()?;
            println!("👋 Signed out");
            true
        }
        Commands::Whoami => handle_whoami(&app),
        Commands::Poster { dismiss, open } => handle_poster(&app, dismiss, open).await?,
        Commands::Profile { action } => handle_profile(&app, action).await?,
        Commands::Users { action } => handle_users(&app, action).await?,
        Commands::Config { .. } => true,
    };

    Ok(exit_code(ok))
}

async fn handle_submission(app: &App, submission: Submission) -> anyhow::Result<bool> {
    let outcome = app.submitter().submit(submission).await?;
    Ok(report_outcome(app, outcome))
}

async fn handle_google_login(app: &App, token: String) -> anyhow::Result<bool> {
    let provider_result = if token.trim().is_empty() {
        Err(ProviderError::Failed("no token supplied".to_string()))
    } else {
        Ok(token)
    };
    let outcome = app.submitter().submit_identity_token(provider_result).await?;
    Ok(report_outcome(app, outcome))
}

fn report_outcome(app: &App, outcome: SubmitOutcome) -> bool {
    match outcome {
        SubmitOutcome::SignedIn {
            session, identity, ..
        } => {
            let shown = identity
                .and_then(|i| i.email)
                .map(|email| format!(" ({})", email))
                .unwrap_or_default();
            println!(
                "✅ Signed in as {}{} [{}]",
                session.display_name, shown, session.role
            );
            app.flush_notice();
            true
        }
        SubmitOutcome::Rejected(_) => app.flush_notice(),
        SubmitOutcome::Busy => {
            eprintln!("⏳ A sign-in is already in progress");
            false
        }
    }
}

fn handle_whoami(app: &App) -> bool {
    match app.session.read() {
        Some(session) => {
            println!("👤 {} ({})", session.display_name, session.user_id);
            println!("   Role: {}", session.role);
            if let Some(status) = session.status {
                println!("   Status: {}", status);
            }
            println!("   Home: {}", RoleRouter::route_for(&session.role));
            true
        }
        None => {
            println!("Not signed in");
            false
        }
    }
}

async fn handle_poster(app: &App, dismiss: bool, open: bool) -> anyhow::Result<bool> {
    let banner = PosterBanner::poster(Arc::clone(&app.api), app.session.clone(), app.notices.clone())
        .with_observer(Arc::new(FootprintLog));

    let state = banner.mount().await;
    let ok = app.flush_notice();

    let FeatureState::Active(announcement) = state else {
        if ok {
            println!("No announcement to show");
        }
        banner.unmount();
        return Ok(ok);
    };

    println!("📣 {}", announcement.title);
    if !announcement.message.is_empty() {
        println!("   {}", announcement.message);
    }
    if let Some(until) = announcement.poster_until {
        println!("   Until {}", until.format("%Y-%m-%d %H:%M UTC"));
    }
    banner.report_footprint(announcement.message.lines().count() as u32 + 2);

    if let Some(cta) = banner.call_to_action() {
        if open {
            println!("🔗 {}", cta.url);
        } else {
            println!("   [{}] {}", cta.text, cta.url);
        }
    }

    if dismiss && banner.dismiss()? {
        println!("🙈 Poster dismissed on this device");
    }

    banner.unmount();
    Ok(true)
}

/// Failures have already printed their notice
fn profile_unavailable_message(reason: Option<InactiveReason>) -> Option<&'static str> {
    match reason? {
        InactiveReason::NoSession => Some("Not signed in. Run 'mentorlink login' first."),
        InactiveReason::NoContent => Some("No profile found for this account"),
        _ => None,
    }
}

async fn handle_profile(app: &App, action: ProfileCommand) -> anyhow::Result<bool> {
    let editor = ProfileEditor::new(Arc::clone(&app.api), app.session.clone(), app.notices.clone());
    let state = editor.mount().await;
    if !app.flush_notice() {
        return Ok(false);
    }

    let Some(profile) = state.content().cloned() else {
        match profile_unavailable_message(state.inactive_reason()) {
            Some(message) => println!("{}", message),
            None => debug!(reason = ?state.inactive_reason(), "Profile unavailable"),
        }
        return Ok(false);
    };

    match action {
        ProfileCommand::Show => {
            println!("👤 {} <{}>", profile.name, profile.email);
            if let Some(bio) = &profile.bio {
                println!("   Bio: {}", bio);
            }
            if let Some(phone) = &profile.phone {
                println!("   Phone: {}", phone);
            }
            if let Some(image) = &profile.profile_image {
                println!("   Picture: {}", image);
            }
            Ok(true)
        }
        ProfileCommand::Update {
            name,
            bio,
            phone,
            image,
        } => {
            editor.begin_edit()?;
            editor.edit(|draft| {
                if let Some(name) = name {
                    draft.name = name;
                }
                if bio.is_some() {
                    draft.bio = bio;
                }
                if phone.is_some() {
                    draft.phone = phone;
                }
            })?;

            let upload = match image {
                Some(path) => Some(read_image(&path).await?),
                None => None,
            };

            let outcome = editor.save(upload).await?;
            let ok = app.flush_notice();
            if let SaveOutcome::Saved(Some(profile)) = outcome {
                println!("👤 {} <{}>", profile.name, profile.email);
            }
            Ok(ok)
        }
    }
}

async fn read_image(path: &Path) -> anyhow::Result<ImageUpload> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload::from_bytes(file_name, bytes))
}

async fn handle_users(app: &App, action: UsersCommand) -> anyhow::Result<bool> {
    let directory = UserDirectory::new(Arc::clone(&app.api), app.session.clone());

    match action {
        UsersCommand::List {
            role,
            status,
            query,
        } => {
            let filter = UserFilter {
                role: role.as_deref().map(Role::parse),
                status,
                query,
            };
            let users = directory.list(&filter).await?;
            if users.is_empty() {
                println!("No users found");
            }
            for user in users {
                println!(
                    "{:<26} {:<24} {:<30} {:<11} {}",
                    user.id,
                    user.name,
                    user.email,
                    user.role,
                    user.status.map(|s| s.to_string()).unwrap_or_default()
                );
            }
        }
        UsersCommand::SetStatus { id, status } => {
            let ack = directory.set_status(&id, status).await?;
            println!(
                "✅ {}",
                ack.message
                    .unwrap_or_else(|| format!("User {} is now {}", id, status))
            );
        }
        UsersCommand::Delete { id } => {
            let ack = directory.delete(&id).await?;
            println!(
                "✅ {}",
                ack.message.unwrap_or_else(|| format!("User {} deleted", id))
            );
        }
    }
    Ok(true)
}

fn handle_config(
    path: Option<&Path>,
    show: bool,
    init: bool,
    validate: bool,
) -> anyhow::Result<ExitCode> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(ClientConfig::default_path);

    if init {
        ClientConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {}", path.display());
    }

    let mut config = if path.exists() {
        ClientConfig::from_file(&path)?
    } else {
        ClientConfig::default()
    };
    config.apply_env_overrides();

    if show {
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
        println!("# data directory: {}", config.resolve_data_dir().display());
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
