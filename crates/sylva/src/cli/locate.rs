//! `sylva locate` command implementation.

use std::path::Path;

use colored::Colorize;
use sylva::{Node, Position, SourceFile, ancestors_at};

use super::Settings;

const MAX_EXCERPT_CHARS: usize = 60;

/// Run the locate command.
pub fn run(settings: &Settings, file: &Path, line: u32, column: u32) -> sylva::Result<()> {
    let provider = settings.provider()?;
    let source = SourceFile::read(file)?;
    let mode = settings.config.interactive_mode();
    let tree = provider.get_tree(&source, mode)?;

    let position = Position::new(line, column);
    let chain = ancestors_at(&tree, position);
    let Some((&innermost, outer)) = chain.split_last() else {
        println!(
            "{} at {}:{position}",
            "No node".yellow(),
            file.display()
        );
        return Ok(());
    };

    println!(
        "{} {}:{position} ({mode})",
        "Node at".cyan().bold(),
        file.display()
    );
    for (depth, &id) in outer.iter().enumerate() {
        println!("{}{}", "  ".repeat(depth + 1), describe(tree.node(id)).dimmed());
    }

    let node = tree.node(innermost);
    println!(
        "{}{}",
        "  ".repeat(outer.len() + 1),
        describe(node).green().bold()
    );
    if let Some(text) = node.text(&source.text) {
        println!();
        println!("{}", excerpt(text));
    }

    Ok(())
}

fn describe(node: &Node) -> String {
    match (node.start_position(), node.end_position()) {
        (Some(start), Some(end)) => format!("{} [{start}-{end}]", node.kind),
        _ => format!("{} (line {})", node.kind, node.line),
    }
}

fn excerpt(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let mut excerpt: String = first_line.chars().take(MAX_EXCERPT_CHARS).collect();
    if excerpt.len() < text.len() {
        excerpt.push_str(" …");
    }
    excerpt
}
