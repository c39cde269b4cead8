//! User identity and the persona that scopes visibility
use std::fmt;

/// A persona decides which status-filtered slice of the record set a user
/// sees and which lifecycle transitions they may invoke. An unknown persona
/// is unrepresentable, so there is no fall-through branch that could leak
/// records to an unrecognised role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Search,
    Approver,
    Analyst,
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Persona::Search => "MaterialSearchUser",
            Persona::Approver => "MaterialApproverUser",
            Persona::Analyst => "AnalystUser",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub persona: Persona,
}

impl User {
    pub fn new(username: &str, display_name: &str, persona: Persona) -> Self {
        Self {
            username: username.to_string(),
            display_name: display_name.to_string(),
            persona,
        }
    }
}

/// The active session. Audit fields fall back to a generic placeholder when
/// nobody is signed in.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current_user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            current_user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn persona(&self) -> Option<Persona> {
        self.current_user.as_ref().map(|u| u.persona)
    }

    pub fn username(&self) -> &str {
        match &self.current_user {
            Some(user) => &user.username,
            None => "user",
        }
    }

    pub fn log_in(&mut self, user: User) {
        self.current_user = Some(user);
    }

    pub fn log_out(&mut self) {
        self.current_user = None;
    }
}

// the static credential table; one user per persona
const USERS: &[(&str, &str, &str, Persona)] = &[
    ("materialsearch", "admin123", "Material Search User", Persona::Search),
    (
        "materialapprover",
        "admin123",
        "Material Approver User",
        Persona::Approver,
    ),
    ("analyst", "admin123", "Analyst User", Persona::Analyst),
];

/// Look a user up in the static credential table.
pub fn login(username: &str, password: &str) -> Option<User> {
    USERS
        .iter()
        .find(|(name, pass, _, _)| *name == username && *pass == password)
        .map(|(name, _, display, persona)| User::new(name, display, *persona))
}
