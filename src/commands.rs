/// Available commands and autocomplete logic
use crate::api::types::Role;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Roles this command is offered to; empty means everyone.
  pub roles: &'static [Role],
}

impl Command {
  pub fn available_to(&self, role: Role) -> bool {
    self.roles.is_empty() || self.roles.contains(&role)
  }
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home"],
    description: "Role dashboard",
    roles: &[],
  },
  Command {
    name: "jobs",
    aliases: &["j", "job", "browse"],
    description: "Browse job listings",
    roles: &[Role::Student, Role::Advisor],
  },
  Command {
    name: "postings",
    aliases: &["p", "posting", "myjobs"],
    description: "Manage my job postings",
    roles: &[Role::Employer],
  },
  Command {
    name: "applications",
    aliases: &["a", "apps", "application"],
    description: "Review applications",
    roles: &[],
  },
  Command {
    name: "interviews",
    aliases: &["iv", "interview"],
    description: "Upcoming and past interviews",
    roles: &[],
  },
  Command {
    name: "notifications",
    aliases: &["n", "notif"],
    description: "Notification inbox",
    roles: &[],
  },
  Command {
    name: "students",
    aliases: &["st", "student", "advisees"],
    description: "Browse advisee students",
    roles: &[Role::Advisor],
  },
  Command {
    name: "profile",
    aliases: &["me", "pr"],
    description: "Edit my profile",
    roles: &[],
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "End the session",
    roles: &[],
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit pathfinder",
    roles: &[],
  },
];

/// Get autocomplete suggestions for a given input, scoped to the viewer's role
pub fn get_suggestions(input: &str, role: Role) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().filter(|c| c.available_to(role)).collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS.iter().filter(|c| c.available_to(role)) {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all_for_role() {
    let suggestions = get_suggestions("", Role::Student);
    assert!(suggestions.iter().any(|c| c.name == "jobs"));
    assert!(!suggestions.iter().any(|c| c.name == "students"));
    assert!(!suggestions.iter().any(|c| c.name == "postings"));
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("interviews", Role::Employer);
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "interviews");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("j", Role::Student);
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "jobs");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("app", Role::Student);
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "applications");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("view", Role::Advisor);
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "interviews");
  }

  #[test]
  fn test_role_scoping() {
    assert!(get_suggestions("students", Role::Student).is_empty());
    assert_eq!(get_suggestions("students", Role::Advisor)[0].name, "students");
    assert_eq!(get_suggestions("postings", Role::Employer)[0].name, "postings");
    assert!(get_suggestions("jobs", Role::Employer).is_empty());
  }
}
