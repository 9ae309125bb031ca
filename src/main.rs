use anyhow::Context;
use drivingschool::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  tabs                 list the tabs
  tab <name>           switch tab (table name or title)
  show                 show the form inputs of the current tab
  set <field> <text>   type into an input
  clear [field]        empty one input, or all of them
  create | read | update | delete
  json                 print the grid as JSON
  help | quit";

fn print_form<B: Backend>(tabs: &TabSet<B>, table: Table) {
    let form = tabs.form(table);
    println!("== {} ==", table.title());
    for input in form.inputs() {
        let text = form.state.get(input.label).unwrap_or_default();
        println!("  {:<18} {}", input.label, text);
    }
    let buttons: Vec<_> = form.buttons().iter().map(|b| b.label()).collect();
    println!("  [{}]", buttons.join("] ["));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("drivingschool=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConnectionConfig::default();
    let conn = ConnectionManager::connect(&config)
        .await
        .with_context(|| format!("failed to connect to {} on {}", config.dbname, config.host))?;

    let mut tabs = TabSet::new(conn);
    let mut current = Table::ALL[0];
    println!("Driving School Management\n{}", HELP);
    print_form(&tabs, current);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        match cmd {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "tabs" => {
                for tab in tabs.tabs() {
                    let marker = if tab.form.table() == current { "*" } else { " " };
                    println!("{} {}", marker, tab.title);
                }
            }
            "tab" => match Table::from_name(rest) {
                Some(table) => {
                    current = table;
                    print_form(&tabs, current);
                }
                None => println!("no such tab: {}", rest),
            },
            "show" => print_form(&tabs, current),
            "set" => {
                let (field, text) = rest.split_once(' ').unwrap_or((rest, ""));
                if let Err(e) = tabs.set_input(current, field, text) {
                    println!("{}", e);
                }
            }
            "clear" if rest.is_empty() => tabs.form_mut(current).state.clear_all(),
            "clear" => {
                if let Err(e) = tabs.form_mut(current).state.clear(rest) {
                    println!("{}", e);
                }
            }
            "json" => println!(
                "{}",
                serde_json::to_string_pretty(&tabs.form(current).grid.to_json())?
            ),
            other => match CrudAction::from_label(other) {
                Some(action) => {
                    if let Some(notice) = tabs.trigger(current, action).await {
                        println!("{}", notice);
                    }
                    println!("{}", tabs.form(current).grid.render());
                }
                None => println!("unknown command: {} (try help)", other),
            },
        }
    }

    tabs.into_backend().close().await?;
    Ok(())
}
