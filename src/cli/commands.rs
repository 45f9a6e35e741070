// SSHE — CLI Command Handlers
//
// Each function handles one CLI subcommand. They coordinate the node store,
// the password codec, operator prompts, and the SSH launcher, all reached
// through `Context` so the flows run against in-memory collaborators in
// tests.

use std::io::Write;
use std::net::IpAddr;

use crate::cipher::{codec_for, PasswordCodec};
use crate::config::Config;
use crate::error::{Result, SsheError};
use crate::query::NodeFilter;
use crate::select::{resolve_new_username, select_node, Prompter};
use crate::session::{ShellLauncher, ShellTarget};
use crate::store::{Node, NodeStore, NodeSummary};

use super::{Commands, ListFilter};

/// Everything a command needs for one invocation.
pub struct Context<'a> {
    pub config: &'a Config,
    pub store: &'a mut NodeStore,
    pub prompter: &'a mut dyn Prompter,
    pub launcher: &'a dyn ShellLauncher,
    /// Command output (stdout in the binary).
    pub out: &'a mut dyn Write,
}

impl Context<'_> {
    fn codec(&self) -> Result<Box<dyn PasswordCodec>> {
        Ok(codec_for(&self.config.password_encode)?)
    }
}

/// Execute the parsed CLI command.
pub fn execute(command: Commands, ctx: &mut Context<'_>) -> Result<()> {
    match command {
        Commands::Add { ip, user, tags } => cmd_add(ctx, &ip, user.as_deref(), tags),
        Commands::Delete { ip, user } => cmd_delete(ctx, &ip, user.as_deref()),
        Commands::Get { ip, user } => cmd_get(ctx, &ip, user.as_deref()),
        Commands::List { filter, json } => cmd_list(ctx, filter, json),
        Commands::Link { ip, user, port } => cmd_link(ctx, &ip, user.as_deref(), port),
        Commands::Version => cmd_version(ctx),
    }
}

// ─── Add ─────────────────────────────────────────────────────────────────────

fn cmd_add(ctx: &mut Context<'_>, ip: &str, user: Option<&str>, mut tags: Vec<String>) -> Result<()> {
    let ip = validate_ip(ip)?;

    let existing = ctx.store.usernames_at(ip);
    let username = resolve_new_username(ip, &existing, user, ctx.prompter)?;

    if tags.is_empty() {
        ctx.prompter.notify("Tags can facilitate searching. No tags added.");
    } else {
        ctx.prompter.notify(&format!(
            "Tags can facilitate searching. Current tags: {}",
            hash_tags(&tags)
        ));
    }
    let extra = ctx
        .prompter
        .ask("Add new tags (format: #tag1#tag2, or enter to skip): ")?;
    tags.extend(parse_tag_input(&extra));

    let password = ctx.prompter.ask_secret("Input password: ")?;
    let cipher_text = ctx
        .codec()?
        .encrypt(password.as_bytes(), &ctx.config.secret_key)?;

    ctx.store.add(ip, &username, &cipher_text, &tags)?;

    writeln!(ctx.out, "✓ Node added")?;
    writeln!(ctx.out, "  IP:       {}", ip)?;
    writeln!(ctx.out, "  Username: {}", username)?;
    Ok(())
}

// ─── Delete ──────────────────────────────────────────────────────────────────

fn cmd_delete(ctx: &mut Context<'_>, ip: &str, user: Option<&str>) -> Result<()> {
    let node = lookup(ctx, ip, user)?;
    print_node(ctx.out, &node, None)?;

    let answer = ctx.prompter.ask(&format!(
        "Are you sure to delete the node with IP {} and username {}? [y/N]: ",
        node.ip, node.username
    ))?;
    if answer != "y" && answer != "Y" {
        writeln!(ctx.out, "Deletion cancelled.")?;
        return Ok(());
    }

    if ctx.store.delete(&node.ip, &node.username)? {
        writeln!(ctx.out, "✓ Node {}@{} deleted", node.username, node.ip)?;
    } else {
        writeln!(ctx.out, "Node not found: {}@{}", node.username, node.ip)?;
    }
    Ok(())
}

// ─── Get ─────────────────────────────────────────────────────────────────────

fn cmd_get(ctx: &mut Context<'_>, ip: &str, user: Option<&str>) -> Result<()> {
    let node = lookup(ctx, ip, user)?;
    let password = ctx
        .codec()?
        .decrypt(node.encrypted_password(), &ctx.config.secret_key)?;
    print_node(ctx.out, &node, Some(password.as_str()))
}

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list(ctx: &mut Context<'_>, filter: ListFilter, json: bool) -> Result<()> {
    let filter = NodeFilter::from(filter);
    let matched = filter.filter(ctx.store.nodes());
    tracing::debug!(matches = matched.len(), "Listing nodes");

    if json {
        let summaries: Vec<NodeSummary> = matched.iter().map(|n| NodeSummary::from(*n)).collect();
        let text = serde_json::to_string_pretty(&summaries)
            .map_err(|e| SsheError::Other(format!("Failed to encode JSON: {}", e)))?;
        writeln!(ctx.out, "{}", text)?;
        return Ok(());
    }

    if matched.is_empty() {
        writeln!(ctx.out, "No matching nodes found.")?;
        return Ok(());
    }

    write_table(ctx.out, &matched)?;
    Ok(())
}

// ─── Link ────────────────────────────────────────────────────────────────────

fn cmd_link(ctx: &mut Context<'_>, ip: &str, user: Option<&str>, port: u16) -> Result<()> {
    let node = lookup(ctx, ip, user)?;
    let password = ctx
        .codec()?
        .decrypt(node.encrypted_password(), &ctx.config.secret_key)?;

    let target = ShellTarget {
        host: &node.ip,
        port,
        username: &node.username,
        password: &password,
    };
    ctx.launcher.launch(&target)?;
    Ok(())
}

// ─── Version ─────────────────────────────────────────────────────────────────

fn cmd_version(ctx: &mut Context<'_>) -> Result<()> {
    writeln!(ctx.out, "sshe {}", env!("CARGO_PKG_VERSION"))?;
    if let Some(commit) = option_env!("SSHE_COMMIT") {
        writeln!(ctx.out, "Commit: {}", commit)?;
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Check that `ip` is an IPv4 or IPv6 address and return it trimmed.
fn validate_ip(ip: &str) -> Result<&str> {
    let ip = ip.trim();
    if ip.is_empty() {
        return Err(SsheError::Validation("IP address is empty".to_string()));
    }
    ip.parse::<IpAddr>()
        .map_err(|_| SsheError::Validation(format!("'{}' is not an IPv4 or IPv6 address", ip)))?;
    Ok(ip)
}

/// Validate, look up, and narrow to one node.
fn lookup(ctx: &mut Context<'_>, ip: &str, user: Option<&str>) -> Result<Node> {
    let ip = validate_ip(ip)?;
    let candidates = ctx.store.find(ip, user.map(str::trim).unwrap_or(""));
    Ok(select_node(ip, candidates, ctx.prompter)?)
}

/// Split `#tag1#tag2` into its non-empty parts.
fn parse_tag_input(input: &str) -> Vec<String> {
    input
        .split('#')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn hash_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_node(out: &mut dyn Write, node: &Node, password: Option<&str>) -> Result<()> {
    writeln!(out, "Node details:\n")?;
    writeln!(out, "  IP:       {}", node.ip)?;
    writeln!(out, "  Username: {}", node.username)?;
    if let Some(password) = password {
        writeln!(out, "  Password: {}", password)?;
    }
    if !node.tags.is_empty() {
        writeln!(out, "  Tags:     {}", node.display_tags())?;
    }
    Ok(())
}

fn write_table(out: &mut dyn Write, nodes: &[&Node]) -> Result<()> {
    let tag_cells: Vec<String> = nodes
        .iter()
        .map(|n| {
            if n.tags.is_empty() {
                "No tags".to_string()
            } else {
                n.display_tags()
            }
        })
        .collect();

    let ip_width = nodes.iter().map(|n| n.ip.chars().count()).fold("IP".len(), usize::max);
    let user_width = nodes
        .iter()
        .map(|n| n.username.chars().count())
        .fold("Username".len(), usize::max);

    writeln!(out, "{:<ip_width$} {:<user_width$} Tags", "IP", "Username")?;
    for (node, tags) in nodes.iter().zip(&tag_cells) {
        writeln!(out, "{:<ip_width$} {:<user_width$} {}", node.ip, node.username, tags)?;
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
