//! Interactive browsing session.
//!
//! Each line is one user action on the portal. The session tier lives as
//! long as the shell does.

use std::io::{BufRead, Write};

use anyhow::Result;
use portal_session_core::{
    GuardOutcome, HistoryNavigator, LoginForm, Navigator, RedirectReason, Role, SessionState,
    SessionStore,
};
use tracing::debug;

const PROMPT: &str = "portal> ";

const HELP: &str = "\
commands:
  select <role>   pick a role on the login page
  submit          submit the login form
  visit [role]    open a page, guarded for <role> if given
  home            follow the logo link
  whoami          show the stored token
  logout          log out
  history         list visited pages
  quit            end the session";

/// Prints each redirect as it happens
pub struct ConsoleNavigator<W: Write> {
    out: W,
}

impl<W: Write> ConsoleNavigator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Navigator for ConsoleNavigator<W> {
    fn navigate(&mut self, location: &str) {
        if let Err(e) = writeln!(self.out, "-> {location}") {
            debug!(error = %e, "Failed to print redirect");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    store: SessionStore,
    form: LoginForm,
    nav: HistoryNavigator,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(store: SessionStore, form: LoginForm, out: W) -> Self {
        let nav = HistoryNavigator::starting_at(store.routes().login_path());
        Self {
            store,
            form,
            nav,
            out,
        }
    }

    pub fn run(mut self, input: impl BufRead) -> Result<()> {
        write!(self.out, "{PROMPT}")?;
        self.out.flush()?;
        for line in input.lines() {
            if self.handle(&line?)? == Control::Quit {
                break;
            }
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn handle(&mut self, line: &str) -> Result<Control> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Control::Continue);
        };
        let arg = words.next();
        let visited = self.nav.len();

        match command {
            "select" => match arg {
                Some(role) => {
                    self.form.select_role(role);
                    writeln!(self.out, "selected {}", self.form.selected_role())?;
                }
                None => writeln!(self.out, "usage: select <role>")?,
            },
            "submit" => {
                self.form.submit(&self.store, &mut self.nav);
            }
            "visit" => self.visit(arg)?,
            "home" => self.store.navigate_home(&mut self.nav),
            "whoami" => match self.store.state() {
                SessionState::LoggedIn(token) => {
                    writeln!(self.out, "{}", serde_json::to_string(&token)?)?
                }
                SessionState::LoggedOut => writeln!(self.out, "logged out")?,
            },
            "logout" => self.store.logout(&mut self.nav),
            "history" => {
                for location in self.nav.visited() {
                    writeln!(self.out, "  {location}")?;
                }
            }
            "help" => writeln!(self.out, "{HELP}")?,
            "quit" | "exit" => return Ok(Control::Quit),
            other => writeln!(self.out, "unknown command: {other} (try help)")?,
        }

        for location in &self.nav.visited()[visited..] {
            writeln!(self.out, "-> {location}")?;
        }
        Ok(Control::Continue)
    }

    fn visit(&mut self, role: Option<&str>) -> Result<()> {
        let required = match role.map(str::parse::<Role>).transpose() {
            Ok(required) => required,
            Err(e) => {
                writeln!(self.out, "{e}")?;
                return Ok(());
            }
        };
        let page = required
            .map(|r| self.store.routes().home(r).to_string())
            .unwrap_or_else(|| self.store.current_home());
        self.nav.navigate(&page);

        match self.store.guard_page(&mut self.nav, required) {
            GuardOutcome::Allowed(token) => writeln!(self.out, "welcome, {}", token.role)?,
            GuardOutcome::Redirected { reason, .. } => match reason {
                RedirectReason::NotLoggedIn => writeln!(self.out, "not logged in")?,
                RedirectReason::RoleMismatch { required, actual } => {
                    writeln!(self.out, "page is for {required}, you are {actual}")?
                }
                RedirectReason::UnknownRole(role) => writeln!(self.out, "unknown role {role:?}")?,
            },
        }
        Ok(())
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}
