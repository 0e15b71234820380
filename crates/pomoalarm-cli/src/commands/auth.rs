use clap::Subcommand;
use pomoalarm_core::storage::Database;
use pomoalarm_core::{AuthGateway, AuthOutcome};

use super::{open_store, print_json, timer, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and log in as it
    Register {
        /// Full name
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
}

pub fn run(action: AuthAction) -> CmdResult {
    let db = open_store()?;
    let auth = AuthGateway::new(&db);

    match action {
        AuthAction::Register {
            name,
            email,
            password,
        } => {
            let outcome = auth.register(&name, &email, &password);
            report(&db, outcome)?;
        }
        AuthAction::Login { email, password } => {
            let outcome = auth.login(&email, &password);
            report(&db, outcome)?;
        }
        AuthAction::Logout => {
            auth.logout()?;
            timer::clear_run(&db)?;
            println!("logged out");
        }
        AuthAction::Whoami => match auth.restore()? {
            Some(ctx) => print_json(ctx.user())?,
            None => return Err("not logged in".into()),
        },
    }
    Ok(())
}

/// Print a successful outcome; a failed one becomes the command's error.
fn report(db: &Database, outcome: AuthOutcome) -> CmdResult {
    if !outcome.success {
        return Err(outcome.message.into());
    }
    // A run left by another user is not theirs to continue.
    let user_id = outcome.user.as_ref().map(|u| u.id);
    if let Some(run) = timer::load_run(db)? {
        if Some(run.user_id()) != user_id {
            timer::clear_run(db)?;
        }
    }
    print_json(&outcome)
}
