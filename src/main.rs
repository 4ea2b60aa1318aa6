//! CampusEvents command-line client
//!
//! Main application entry point

use std::time::Duration;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use uuid::Uuid;

use campus_events::{
    config::Settings,
    dashboard::{gate, Dashboard, Opened, RegisterOutcome, Route, RouteDecision, TrackerTab},
    models::Role,
    state::{AuthContext, AuthState},
    store::{health_check, migrations, StoreConfig, StoreService},
    utils::{logging, CampusError},
};

#[derive(Parser, Debug)]
#[clap(name = "campus-events", version, about = "Campus event registrations from the command line")]
#[clap(after_help = "Credentials are read from CAMPUS_EMAIL and CAMPUS_PASSWORD.")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
#[clap(rename_all = "kebab_case")]
enum Command {
    /// Show the dashboard for your role
    Dashboard,
    /// Register for an event (students)
    Register {
        /// Id of the event
        event_id: Uuid,
    },
    /// Create an account
    Signup {
        /// student, teacher or committee
        role: Role,
        /// Display name
        #[clap(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// List sign-ups (committee)
    Tracker {
        /// all, student, teacher or committee
        #[clap(default_value = "all")]
        tab: TrackerTab,
    },
    /// Review a registration (teachers, committee)
    Review {
        /// Id of the registration
        registration_id: Uuid,
        #[clap(value_enum)]
        decision: Decision,
    },
    /// Apply the bundled schema migrations
    Migrate,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Decision {
    Approve,
    Reject,
}

fn credentials() -> anyhow::Result<(String, String)> {
    let email = std::env::var("CAMPUS_EMAIL").context("CAMPUS_EMAIL is not set")?;
    let password = std::env::var("CAMPUS_PASSWORD").context("CAMPUS_PASSWORD is not set")?;
    Ok((email, password))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let command = Args::parse().command;

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;
    info!("Starting {}", campus_events::info());

    if let Command::Migrate = command {
        let database = settings
            .database
            .as_ref()
            .ok_or_else(|| CampusError::Config("database.url is required for migrate".to_string()))?;
        migrations::provision(database).await?;
        println!("Migrations applied");
        return Ok(());
    }

    settings.validate()?;
    let store = StoreService::connect(&StoreConfig::from(&settings.service))?;
    if let Err(e) = health_check(&store.client).await {
        warn!(error = %e, "Service health check failed");
    }

    let auth = AuthContext::start(store.clone(), settings.features.clone());
    auth.wait_resolved().await;
    let wait = settings.service.request_timeout() * 2;

    let result = run(&auth, &store, &settings, command, wait).await;
    auth.logout().await;
    auth.shutdown();
    result
}

async fn run(
    auth: &AuthContext,
    store: &StoreService,
    settings: &Settings,
    command: Command,
    wait: Duration,
) -> anyhow::Result<()> {
    let (email, password) = credentials()?;

    if let Command::Signup { role, name } = &command {
        let receipt = auth.register(&email, &password, *role, &name.join(" ")).await?;
        println!("Account created for {} ({})", receipt.profile.display_name(), role);
        if !receipt.session_started {
            println!("Check your inbox to confirm the e-mail address before signing in.");
        }
        return Ok(());
    }

    auth.login(&email, &password).await?;
    let state = tokio::time::timeout(wait, auth.wait_until(AuthState::has_session))
        .await
        .context("Timed out waiting for the session")?;

    match gate(Route::Dashboard, &state) {
        RouteDecision::Render(_) => {}
        decision => bail!("Dashboard unavailable: {:?}", decision),
    }

    let timeout = settings.service.request_timeout();
    let mut dashboard = match Dashboard::open(store, &state, &settings.features, timeout)? {
        Opened::Ready(dashboard) => dashboard,
        Opened::Placeholder(view) => {
            println!("{}", view.notice().unwrap_or_default());
            return Ok(());
        }
    };
    dashboard.load().await?;

    match (command, &mut dashboard) {
        (Command::Dashboard, dashboard) => println!("{}", dashboard.render()),
        (Command::Register { event_id }, Dashboard::Student(student)) => {
            let outcome = student.register(event_id).await?;
            println!("{}", student.render());
            if let RegisterOutcome::Failed(message) = outcome {
                bail!(message);
            }
        }
        (Command::Tracker { tab }, Dashboard::Committee(committee)) => {
            let mut tracker = committee.signup_tracker()?;
            tracker.set_tab(tab);
            tracker.load().await?;
            println!("{}", tracker.render());
        }
        (Command::Review { registration_id, decision }, Dashboard::Teacher(teacher)) => {
            let updated = match decision {
                Decision::Approve => teacher.approve(registration_id).await?,
                Decision::Reject => teacher.reject(registration_id).await?,
            };
            println!("Registration {} is now {}", updated.id, updated.status);
        }
        (Command::Review { registration_id, decision }, Dashboard::Committee(committee)) => {
            let updated = match decision {
                Decision::Approve => committee.approve(registration_id).await?,
                Decision::Reject => committee.reject(registration_id).await?,
            };
            println!("Registration {} is now {}", updated.id, updated.status);
        }
        (command, _) => bail!("{:?} is not available for your role", command),
    }

    dashboard.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_signup_and_review() {
        let args = Args::try_parse_from(["campus-events", "signup", "teacher", "Alan", "Turing"]).unwrap();
        match args.command {
            Command::Signup { role, name } => {
                assert_eq!(role, Role::Teacher);
                assert_eq!(name.join(" "), "Alan Turing");
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let id = Uuid::new_v4().to_string();
        let args = Args::try_parse_from(["campus-events", "review", id.as_str(), "reject"]).unwrap();
        assert!(matches!(args.command, Command::Review { decision: Decision::Reject, .. }));

        assert!(Args::try_parse_from(["campus-events", "review", id.as_str(), "maybe"]).is_err());
        assert!(Args::try_parse_from(["campus-events", "signup", "dean", "Dean"]).is_err());
    }

    #[test]
    fn test_tracker_tab_defaults_to_all() {
        let args = Args::try_parse_from(["campus-events", "tracker"]).unwrap();
        assert!(matches!(args.command, Command::Tracker { tab: TrackerTab::All }));

        let args = Args::try_parse_from(["campus-events", "tracker", "committee"]).unwrap();
        assert!(matches!(args.command, Command::Tracker { tab: TrackerTab::Only(Role::Committee) }));
    }
}
