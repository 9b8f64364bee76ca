//! Headless line protocol.
//!
//! Every non-empty input line is a `#command`. Output lines are tagged
//! (`[RESULT]`, `[PATH]`, `[HINT]`, `[ERROR]`, ...) so scripts can parse them.
//! The session tracks what the player has discovered; commands that take a
//! discovered list fall back to it when none is given.

use alchemy_core::{base_element_ids, Alchemy, AlchemyError, ElementId, RecipeHint};
use std::collections::HashSet;
use std::io::{self, BufRead, Write};

const HELP: &[&str] = &[
    "  #elements                    - List every known element",
    "  #combine <a> <b>             - Combine two elements by id",
    "  #path <target> [ids...]      - Shortest recipe path to a target",
    "  #hint <target> [ids...]      - Next step toward a target",
    "  #recipe <target> [ids...]    - Hint from recipes that make the target",
    "  #help                        - Show this help",
    "  #quit                        - Exit",
];

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Elements,
    Combine(ElementId, ElementId),
    Path(ElementId, Option<HashSet<ElementId>>),
    Hint(ElementId, Option<HashSet<ElementId>>),
    Recipe(ElementId, Option<HashSet<ElementId>>),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let Some(rest) = line.strip_prefix('#') else {
        return Err("Commands start with '#'. Type #help for help.".to_string());
    };
    let parts: Vec<&str> = rest.split_whitespace().collect();

    match parts.as_slice() {
        ["elements"] => Ok(Command::Elements),
        ["combine", a, b] => Ok(Command::Combine(parse_id(a)?, parse_id(b)?)),
        ["combine", ..] => Err("Usage: #combine <a> <b>".to_string()),
        ["path", target, ids @ ..] => Ok(Command::Path(parse_id(target)?, parse_ids(ids)?)),
        ["hint", target, ids @ ..] => Ok(Command::Hint(parse_id(target)?, parse_ids(ids)?)),
        ["recipe", target, ids @ ..] => Ok(Command::Recipe(parse_id(target)?, parse_ids(ids)?)),
        ["path" | "hint" | "recipe"] => Err("Missing target id".to_string()),
        ["help"] => Ok(Command::Help),
        ["quit"] | ["exit"] => Ok(Command::Quit),
        _ => Err("Unknown command. Type #help for help.".to_string()),
    }
}

fn parse_id(raw: &str) -> Result<ElementId, String> {
    raw.parse().map_err(|_| format!("Not an element id: {raw}"))
}

fn parse_ids(raw: &[&str]) -> Result<Option<HashSet<ElementId>>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.iter().map(|r| parse_id(r)).collect::<Result<_, _>>().map(Some)
}

/// Run the line protocol until `#quit` or end of input.
pub async fn run_headless(alchemy: Alchemy) -> Result<(), AlchemyError> {
    let mut discovered: HashSet<ElementId> = base_element_ids().into_iter().collect();

    println!("=== Alchemy Headless Mode ===");
    println!(
        "Store: {}",
        if alchemy.is_durable() { "durable" } else { "in-memory (not replay-safe)" }
    );
    println!();
    println!("Commands:");
    for line in HELP {
        println!("{line}");
    }
    println!();
    for element in alchemy.elements().await? {
        if element.is_base {
            println!("  [{}] {element}", element.id);
        }
    }
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Quit) => {
                println!("Goodbye!");
                break;
            }
            Ok(command) => {
                if let Err(e) = execute(&alchemy, &mut discovered, command).await {
                    println!("[ERROR] {e}");
                }
            }
            Err(message) => println!("[ERROR] {message}"),
        }
        stdout.flush().ok();
    }

    Ok(())
}

async fn execute(
    alchemy: &Alchemy,
    discovered: &mut HashSet<ElementId>,
    command: Command,
) -> Result<(), AlchemyError> {
    match command {
        Command::Elements => {
            println!("[ELEMENTS]");
            for element in alchemy.elements().await? {
                let mark = if discovered.contains(&element.id) { "*" } else { " " };
                println!(" {mark}[{}] {element}", element.id);
            }
        }
        Command::Combine(a, b) => {
            let result = alchemy.combine(a, b).await?;
            discovered.insert(result.element.id);
            println!("[RESULT] [{}] {}", result.element.id, result.element);
            if result.is_first_discovery {
                println!("[FIRST DISCOVERY] Nobody has made {} before!", result.element.name);
            } else if result.is_new_element {
                println!("[NEW RECIPE]");
            }
            if !result.durable {
                println!("[WARNING] Result is not persisted");
            }
        }
        Command::Path(target, ids) => {
            let known = ids.unwrap_or_else(|| discovered.clone());
            match alchemy.shortest_path(target, &known).await? {
                Some(path) if path.is_empty() => println!("[PATH] Already discovered"),
                Some(path) => {
                    println!("[PATH] {} step(s)", path.len());
                    for (i, step) in path.iter().enumerate() {
                        println!("  {}. {step}", i + 1);
                    }
                }
                None => println!("[PATH] {}", no_path_found(target)),
            }
        }
        Command::Hint(target, ids) => {
            let known = ids.unwrap_or_else(|| discovered.clone());
            match alchemy.next_hint(target, &known).await? {
                Some(step) => println!("[HINT] {step}"),
                None if known.contains(&target) => println!("[HINT] Already discovered"),
                None => println!("[HINT] {}", no_path_found(target)),
            }
        }
        Command::Recipe(target, ids) => {
            let known = ids.unwrap_or_else(|| discovered.clone());
            match alchemy.recipe_hint(target, &known).await? {
                RecipeHint::AlreadyDiscovered => println!("[RECIPE] Already discovered"),
                RecipeHint::NoKnownRecipe => println!("[RECIPE] Nobody has made this yet"),
                RecipeHint::Combine {
                    element_a,
                    element_b,
                } => println!("[RECIPE] Try combining {element_a} with {element_b}"),
                RecipeHint::Missing { elements } => {
                    let names: Vec<String> = elements.iter().map(ToString::to_string).collect();
                    println!("[RECIPE] First discover: {}", names.join(", "));
                }
            }
        }
        Command::Help => {
            println!("[HELP]");
            for line in HELP {
                println!("{line}");
            }
        }
        Command::Quit => {}
    }
    Ok(())
}

/// The hint search only joins elements made along one line of combinations,
/// so a miss does not prove the target is out of reach.
fn no_path_found(target: ElementId) -> String {
    format!("No single line of known recipes leads to {target}; keep experimenting")
}
