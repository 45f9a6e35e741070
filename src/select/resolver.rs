// SSHE — Node Selection
//
// Narrows the nodes found for an IP down to exactly one. A single candidate
// is taken as-is; several candidates make the operator pick a username, with
// "root" as the default answer.

use crate::store::Node;

use super::{Prompter, SelectError};

/// Username assumed when the operator just presses enter.
pub const DEFAULT_USERNAME: &str = "root";

/// Resolve `candidates` (all found at `ip`) to one node.
pub fn select_node(
    ip: &str,
    mut candidates: Vec<Node>,
    prompter: &mut dyn Prompter,
) -> Result<Node, SelectError> {
    match candidates.len() {
        0 => {
            return Err(SelectError::NotFound { ip: ip.to_string() });
        }
        1 => return Ok(candidates.remove(0)),
        _ => {}
    }

    let mut usernames: Vec<&str> = Vec::with_capacity(candidates.len());
    for node in &candidates {
        if !usernames.contains(&node.username.as_str()) {
            usernames.push(&node.username);
        }
    }
    prompter.notify(&format!(
        "IP {} has multiple user records: {}",
        ip,
        usernames.join(", ")
    ));

    let answer = prompter.ask(&format!(
        "Please select one of them (default: {}): ",
        DEFAULT_USERNAME
    ))?;
    let chosen = if answer.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        answer
    };

    tracing::debug!(ip = %ip, username = %chosen, "Operator selected user");

    candidates
        .into_iter()
        .find(|n| n.username == chosen)
        .ok_or(SelectError::Ambiguous {
            ip: ip.to_string(),
            username: chosen,
        })
}

/// Pick the username for a new node at `ip`. An explicit username is used
/// directly; otherwise the operator is asked (default "root"). Either way it
/// must not already exist at that IP.
pub fn resolve_new_username(
    ip: &str,
    existing: &[String],
    explicit: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<String, SelectError> {
    let username = match explicit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => user.to_string(),
        None => {
            if !existing.is_empty() {
                prompter.notify(&format!(
                    "The IP-recorded usernames are: {}.",
                    existing.join(", ")
                ));
            }
            let answer = prompter.ask(&format!(
                "Input username (default: {}): ",
                DEFAULT_USERNAME
            ))?;
            if answer.is_empty() {
                DEFAULT_USERNAME.to_string()
            } else {
                answer
            }
        }
    };

    if existing.iter().any(|u| *u == username) {
        return Err(SelectError::Duplicate {
            ip: ip.to_string(),
            username,
        });
    }

    Ok(username)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
