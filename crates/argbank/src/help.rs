//! Usage text rendered from a [`Registry`].

use crate::key::display_key;
use crate::registry::{ArgDescriptor, Registry};

fn format_arg_left(key: &str, def: &ArgDescriptor) -> String {
    let mut out = display_key(key);
    if !def.is_flag() {
        out.push_str(&format!(" <{}>", def.value_type()));
    }
    out
}

fn format_arg_help(def: &ArgDescriptor) -> String {
    let mut out = def.description().trim().to_string();
    if def.is_required() {
        if out.is_empty() {
            out.push_str("required");
        } else {
            out.push_str(" (required)");
        }
    }
    // A flag's default never reaches the caller, so it is not advertised.
    if !def.is_flag() && def.has_default() {
        if let Some(default_value) = def.value() {
            if out.is_empty() {
                out.push_str(&format!("[default: {default_value}]"));
            } else {
                out.push_str(&format!(" [default: {default_value}]"));
            }
        }
    }
    out
}

/// Render usage text for `program`.
pub fn render(registry: &Registry, program: &str) -> String {
    render_with_summary(registry, program, "")
}

/// Render usage text with a one-line summary after the program name.
pub fn render_with_summary(registry: &Registry, program: &str, summary: &str) -> String {
    let mut out = String::new();
    if summary.trim().is_empty() {
        out.push_str(program);
        out.push('\n');
    } else {
        out.push_str(&format!("{} - {}\n", program, summary.trim()));
    }

    let mut usage = format!("\nUsage: {program}");
    for (key, def) in registry.iter().filter(|(_, d)| d.is_required()) {
        usage.push(' ');
        usage.push_str(&format_arg_left(key, def));
    }
    usage.push_str(" [OPTIONS]\n");
    out.push_str(&usage);

    let mut rows: Vec<(String, String)> = registry
        .iter()
        .map(|(key, def)| (format_arg_left(key, def), format_arg_help(def)))
        .collect();
    rows.push(("-h, --help".to_string(), "Show help information".to_string()));

    out.push_str("\nOptions:\n");
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {}\n", left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
        }
    }

    out
}
