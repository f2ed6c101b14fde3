//! Deterministic state-graph tutorials: no model involved

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use super::Workbench;
use crate::console::Console;
use crate::graph::{self, CompiledGraph, GraphError, NodeOutput, State, StateGraph, END, START};
use crate::template::render_value;

fn int(state: &State, key: &str) -> graph::Result<i64> {
    state
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| GraphError::InvalidState {
            channel: key.to_string(),
            message: "expected an integer".to_string(),
        })
}

fn text<'a>(state: &'a State, key: &str) -> graph::Result<&'a str> {
    state
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| GraphError::InvalidState {
            channel: key.to_string(),
            message: "expected a string".to_string(),
        })
}

fn overflow(channel: &str) -> GraphError {
    GraphError::InvalidState {
        channel: channel.to_string(),
        message: "integer overflow".to_string(),
    }
}

fn ints(state: &State, key: &str) -> graph::Result<Vec<i64>> {
    match state.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| GraphError::InvalidState {
            channel: key.to_string(),
            message: e.to_string(),
        }),
    }
}

pub fn compliment_graph() -> graph::Result<CompiledGraph> {
    StateGraph::with_channels(&["name"])
        .add_sync_node("complimenter", |state| {
            let name = text(state, "name")?;
            let compliment = format!("{}, you are doing a great job!", name);
            Ok(NodeOutput::new().with_update("name", compliment))
        })
        .set_entry_point("complimenter")
        .set_finish_point("complimenter")
        .compile()
}

pub async fn compliment(bench: &Workbench, name: &str) -> Result<()> {
    let result = compliment_graph()?
        .invoke(State::from([("name".to_string(), json!(name))]))
        .await?;
    bench.say(text(&result, "name")?);
    Ok(())
}

pub fn calculator_graph() -> graph::Result<CompiledGraph> {
    StateGraph::with_channels(&["name", "values", "operation", "result"])
        .add_sync_node("processor", |state| {
            let values = ints(state, "values")?;
            let answer = if text(state, "operation")? == "+" {
                values.iter().try_fold(0i64, |acc, v| acc.checked_add(*v))
            } else {
                values.iter().try_fold(1i64, |acc, v| acc.checked_mul(*v))
            }
            .ok_or_else(|| overflow("values"))?;
            let result = format!("Hi {}! Your answer is : {}", text(state, "name")?, answer);
            Ok(NodeOutput::new().with_update("result", result))
        })
        .set_entry_point("processor")
        .set_finish_point("processor")
        .compile()
}

pub async fn calculator(
    bench: &Workbench,
    name: &str,
    values: &[i64],
    operation: &str,
) -> Result<()> {
    let result = calculator_graph()?
        .invoke(State::from([
            ("name".to_string(), json!(name)),
            ("values".to_string(), json!(values)),
            ("operation".to_string(), json!(operation)),
        ]))
        .await?;
    bench.say(text(&result, "result")?);
    Ok(())
}

fn format_skills(skills: &[String]) -> String {
    if skills.is_empty() {
        String::new()
    } else {
        format!("{}!", skills.join(", "))
    }
}

/// Three nodes in sequence, each extending `result`
pub fn profile_graph() -> graph::Result<CompiledGraph> {
    StateGraph::with_channels(&["name", "age", "skills", "result"])
        .add_sync_node("name_node", |state| {
            let greeting = format!("Hello, {}, welcome to the system!", text(state, "name")?);
            Ok(NodeOutput::new().with_update("result", greeting))
        })
        .add_sync_node("age_node", |state| {
            let result = format!(
                "{} You are {} years old!",
                text(state, "result")?,
                text(state, "age")?
            );
            Ok(NodeOutput::new().with_update("result", result))
        })
        .add_sync_node("skills_node", |state| {
            let skills: Vec<String> = state
                .get("skills")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| GraphError::InvalidState {
                    channel: "skills".to_string(),
                    message: e.to_string(),
                })?
                .unwrap_or_default();
            let result = format!(
                "{} Your skills are: {}",
                text(state, "result")?,
                format_skills(&skills)
            );
            Ok(NodeOutput::new().with_update("result", result))
        })
        .set_entry_point("name_node")
        .add_edge("name_node", "age_node")
        .add_edge("age_node", "skills_node")
        .set_finish_point("skills_node")
        .compile()
}

pub async fn profile(bench: &Workbench, name: &str, age: &str, skills: &[String]) -> Result<()> {
    let result = profile_graph()?
        .invoke(State::from([
            ("name".to_string(), json!(name)),
            ("age".to_string(), json!(age)),
            ("skills".to_string(), json!(skills)),
        ]))
        .await?;
    bench.say(text(&result, "result")?);
    Ok(())
}

fn binary_node(
    left: &'static str,
    right: &'static str,
    out: &'static str,
    op: fn(i64, i64) -> Option<i64>,
) -> impl Fn(&State) -> graph::Result<NodeOutput> + Send + Sync + 'static {
    move |state: &State| {
        let value = op(int(state, left)?, int(state, right)?).ok_or_else(|| overflow(out))?;
        Ok(NodeOutput::new().with_update(out, value))
    }
}

fn operation_router(
    field: &'static str,
    add: &'static str,
    subtract: &'static str,
) -> impl Fn(&State) -> String + Send + Sync {
    move |state: &State| {
        if state.get(field).and_then(Value::as_str) == Some("+") {
            add.to_string()
        } else {
            subtract.to_string()
        }
    }
}

/// Two routed operations: `number1 op1 number2` then `number3 op2 number4`
pub fn arithmetic_graph() -> graph::Result<CompiledGraph> {
    StateGraph::with_channels(&[
        "number1",
        "number2",
        "operation1",
        "number3",
        "number4",
        "operation2",
        "final_number",
        "final_number2",
    ])
    .add_sync_node(
        "add_node",
        binary_node("number1", "number2", "final_number", i64::checked_add),
    )
    .add_sync_node(
        "subtract_node",
        binary_node("number1", "number2", "final_number", i64::checked_sub),
    )
    .add_sync_node(
        "add_node2",
        binary_node("number3", "number4", "final_number2", i64::checked_add),
    )
    .add_sync_node(
        "subtract_node2",
        binary_node("number3", "number4", "final_number2", i64::checked_sub),
    )
    .add_passthrough("decide_next_node")
    .add_passthrough("decide_next_node2")
    .add_edge(START, "decide_next_node")
    .add_conditional_edges(
        "decide_next_node",
        operation_router("operation1", "addition_operation", "subtraction_operation"),
        [("addition_operation", "add_node"), ("subtraction_operation", "subtract_node")],
    )
    .add_edge("add_node", "decide_next_node2")
    .add_edge("subtract_node", "decide_next_node2")
    .add_conditional_edges(
        "decide_next_node2",
        operation_router("operation2", "addition_2", "subtraction_2"),
        [("addition_2", "add_node2"), ("subtraction_2", "subtract_node2")],
    )
    .add_edge("add_node2", END)
    .add_edge("subtract_node2", END)
    .compile()
}

/// Four integers from a line such as `[1, 2, 3, 4]` or `1 2 3 4`
pub fn parse_numbers(line: &str) -> Result<[i64; 4]> {
    let numbers = line
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().with_context(|| format!("'{}' is not an integer", s)))
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => bail!("expected 4 numbers, got {}", numbers.len()),
    }
}

pub async fn arithmetic(bench: &Workbench) -> Result<()> {
    let Some(line) = bench.read_line("Enter the 4 numbers as input: ").await? else {
        return Ok(());
    };
    let [n1, n2, n3, n4] = parse_numbers(&line)?;
    let result = arithmetic_graph()?
        .invoke(State::from([
            ("number1".to_string(), json!(n1)),
            ("number2".to_string(), json!(n2)),
            ("operation1".to_string(), json!("-")),
            ("number3".to_string(), json!(n3)),
            ("number4".to_string(), json!(n4)),
            ("operation2".to_string(), json!("+")),
            ("final_number".to_string(), json!(0)),
            ("final_number2".to_string(), json!(0)),
        ]))
        .await?;
    let first = int(&result, "final_number")?;
    let second = int(&result, "final_number2")?;
    bench.say(&format!("Final Result after first operation: {}", first));
    bench.say(&format!("\nFinal Result after second operation: {}", second));
    Ok(())
}

pub const GUESS_LOWER: i64 = 1;
pub const GUESS_UPPER: i64 = 20;
pub const MAX_ATTEMPTS: i64 = 7;

/// setup, then process_guess and hint_giver until the checker ends the game
pub fn guessing_game_graph(console: Arc<dyn Console>, rng: StdRng) -> graph::Result<CompiledGraph> {
    let rng = Arc::new(Mutex::new(rng));
    let setup_rng = rng.clone();
    let guess_console = console.clone();
    let hint_console = console.clone();

    StateGraph::with_channels(&[
        "player_name",
        "target",
        "guesses",
        "attempts",
        "hint",
        "lower_bound",
        "upper_bound",
    ])
    .add_sync_node("setup", move |state| {
        let target = setup_rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(GUESS_LOWER..=GUESS_UPPER);
        Ok(NodeOutput::new()
            .with_update("player_name", format!("Welcome, {}!", text(state, "player_name")?))
            .with_update("target", target)
            .with_update("guesses", json!([]))
            .with_update("attempts", 0)
            .with_update(
                "hint",
                "Hi! I'm thinking of a number between 1 and 20. Can you guess it?",
            )
            .with_update("lower_bound", GUESS_LOWER)
            .with_update("upper_bound", GUESS_UPPER))
    })
    .add_sync_node("process_guess", move |state| {
        let mut guesses = ints(state, "guesses")?;
        let (lower, upper) = (int(state, "lower_bound")?, int(state, "upper_bound")?);
        let candidates: Vec<i64> = (lower..=upper).filter(|n| !guesses.contains(n)).collect();

        let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
        let guess = match candidates.choose(&mut *rng) {
            Some(guess) => *guess,
            None if lower <= upper => rng.gen_range(lower..=upper),
            None => lower,
        };
        guesses.push(guess);
        let attempts = int(state, "attempts")? + 1;
        guess_console.say(&format!(
            "Attempt {} : Current guess {} Current bounds: {} - {}",
            attempts, guess, lower, upper
        ));
        Ok(NodeOutput::new()
            .with_update("guesses", json!(guesses))
            .with_update("attempts", attempts))
    })
    .add_sync_node("hint_giver", move |state| {
        let last = ints(state, "guesses")?.last().copied().ok_or_else(|| GraphError::InvalidState {
            channel: "guesses".to_string(),
            message: "no guess made yet".to_string(),
        })?;
        let target = int(state, "target")?;
        let output = if last < target {
            let hint = format!("Your guess of {} is too low.", last);
            hint_console.say(&format!("Hint: {}", hint));
            NodeOutput::new()
                .with_update("hint", hint)
                .with_update("lower_bound", int(state, "lower_bound")?.max(last + 1))
        } else if last > target {
            let hint = format!("Your guess of {} is too high.", last);
            hint_console.say(&format!("Hint: {}", hint));
            NodeOutput::new()
                .with_update("hint", hint)
                .with_update("upper_bound", int(state, "upper_bound")?.min(last - 1))
        } else {
            NodeOutput::new().with_update(
                "hint",
                format!(
                    "Congratulations! You've guessed the number {} in {} attempts!",
                    target,
                    int(state, "attempts")?
                ),
            )
        };
        Ok(output)
    })
    .set_entry_point("setup")
    .add_edge("setup", "process_guess")
    .add_edge("process_guess", "hint_giver")
    .add_conditional_edges(
        "hint_giver",
        move |state: &State| {
            let last = state
                .get("guesses")
                .and_then(Value::as_array)
                .and_then(|g| g.last())
                .and_then(Value::as_i64);
            let attempts = state.get("attempts").and_then(Value::as_i64).unwrap_or(0);
            if last.is_some() && last == state.get("target").and_then(Value::as_i64) {
                console.say("Game Over: Correct guess!");
                END.to_string()
            } else if attempts >= MAX_ATTEMPTS {
                console.say("Game Over: Maximum attempts reached.");
                END.to_string()
            } else {
                "continue".to_string()
            }
        },
        [("continue", "process_guess"), (END, END)],
    )
    .compile()
}

pub async fn guessing_game(bench: &Workbench, player: &str, seed: Option<u64>) -> Result<State> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let result = guessing_game_graph(bench.console.clone(), rng)?
        .with_recursion_limit(bench.config.general.recursion_limit)
        .invoke(State::from([("player_name".to_string(), json!(player))]))
        .await?;

    let mut entries: Vec<_> = result.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        bench.say(&format!("{}: {}", key, render_value(value)));
    }
    Ok(result)
}
